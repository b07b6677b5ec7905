//! Errors shared by the persistence layer.

use thiserror::Error;

/// Storage failures surfaced by `UserStore` and `MessageStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint rejected the write.
    #[error("duplicate value for {0}")]
    Duplicate(String),

    /// A write referenced a row that does not exist.
    #[error("missing referenced row for {0}")]
    MissingReference(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
        {
            return StoreError::Duplicate(db.constraint().unwrap_or("unique").to_string());
        }
        if let sqlx::Error::Database(db) = &e
            && db.is_foreign_key_violation()
        {
            return StoreError::MissingReference(
                db.constraint().unwrap_or("foreign key").to_string(),
            );
        }
        StoreError::Unavailable(e.to_string())
    }
}
