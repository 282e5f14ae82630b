//! Payment webhook server
//!
//! Serves the storefront's catalog and checkout, receives payment gateway
//! notifications and posts the sales journals.
//!
//! # Environment Variables
//!
//! * `BOOKS_HOST` - Server host (default: 0.0.0.0)
//! * `BOOKS_PORT` - Server port (default: 8000)
//! * `BOOKS_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `BOOKS_CACHE_TTL_SECS` - Snapshot cache lifetime (default: 60)
//! * `BOOKS_DATABASE_URL` - Books database (default: sqlite://lobster-ledger.db,
//!   `memory` keeps the books in process)
//! * `BOOKS_DATABASE_MAX_CONNECTIONS` - Pool size (default: 5)
//! * `BOOKS_ACCOUNTS__CASH_ACCOUNT` and the other `BOOKS_ACCOUNTS__*` keys - account roles

use lobster_ledger::config::BooksConfig;
use lobster_ledger::server::{create_router, AppState};
use lobster_ledger::utils::{MemoryStorage, SqlStorage};
use lobster_ledger::{Ledger, LedgerStorage};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = BooksConfig::from_env()?;
    init_tracing(&config.log_level);

    tracing::info!(host = %config.host, port = %config.port, "starting webhook server");

    match config.database() {
        Some(database) => {
            let storage = SqlStorage::connect(&database).await?;
            serve(Ledger::with_config(storage, &config), &config).await
        }
        None => {
            tracing::warn!("no books database configured, books are kept in memory");
            serve(Ledger::with_config(MemoryStorage::new(), &config), &config).await
        }
    }
}

async fn serve<S>(mut ledger: Ledger<S>, config: &BooksConfig) -> Result<(), Box<dyn std::error::Error>>
where
    S: LedgerStorage + Clone + 'static,
{
    if ledger.list_accounts().await?.is_empty() {
        let accounts = ledger.setup_storefront_chart().await?;
        tracing::info!(accounts = accounts.len(), "storefront chart seeded");
    }

    let app = create_router(AppState::new(ledger));

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
