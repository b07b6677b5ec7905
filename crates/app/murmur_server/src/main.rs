//! Murmur chat server binary.
//!
//! Serves the HTTP API and the `/ws` endpoint on one listener.

use clap::Parser;
use murmur_api::AppState;
use murmur_api::config::ApiConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the chat server.
#[derive(Parser, Debug)]
#[command(name = "murmur_server", about = "Murmur real-time chat server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    bind: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/murmur"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep users and messages in memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,murmur_api=debug,murmur_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig {
        bind_addr: args.bind.clone(),
        pg_connection_url: args.database_url.clone(),
        ..ApiConfig::from_env()
    };

    let state = if args.ephemeral {
        warn!("ephemeral mode: users and messages are kept in memory only");
        AppState::in_memory(config.clone())
    } else {
        info!(
            database_url = %args.database_url,
            max_connections = args.max_connections,
            "configuring connection pool"
        );
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&args.database_url)
            .await?;

        info!("running database migrations");
        murmur_api::migrate(&pool).await?;

        AppState::with_pool(config.clone(), pool)
    };

    let app = murmur_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, version = murmur_core::version(), "murmur listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
