// Helper for generating UUIDv7 (timestamp-sortable UUIDs)
//
// Message ids double as pagination cursors, so they are generated app-side
// as UUIDv7: byte ordering matches creation ordering, both in Rust and in
// PostgreSQL's `uuid` comparison. User ids keep PG's gen_random_uuid() (v4).

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a UUIDv7 strictly greater than `previous`.
///
/// Two ids minted in the same millisecond by different contexts may compare
/// equal or out of order; bumping past `previous` keeps a single writer's
/// sequence strictly increasing.
pub fn uuidv7_after(previous: Option<Uuid>) -> Uuid {
    let id = uuidv7();
    match previous {
        Some(prev) if id <= prev => Uuid::from_u128(prev.as_u128().wrapping_add(1)),
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuidv7_is_valid() {
        let id = uuidv7();
        assert_eq!(id.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn uuidv7_is_monotonic() {
        let a = uuidv7();
        let b = uuidv7();
        assert!(b >= a);
    }

    #[test]
    fn uuidv7_after_is_strictly_greater() {
        let far_future = Uuid::from_u128(u128::MAX - 10);
        let next = uuidv7_after(Some(far_future));
        assert!(next > far_future);

        let mut prev = None;
        for _ in 0..1000 {
            let id = uuidv7_after(prev);
            if let Some(p) = prev {
                assert!(id > p);
            }
            prev = Some(id);
        }
    }
}
