//! CypherSafe Backend - zero-knowledge share store
//!
//! Holds encrypted shares and self-destructing notes:
//! - Shares are ciphertext + nonce in RAM; keys never reach the server
//! - View-once shares are consumed atomically on first open
//! - A background sweeper enforces expiry and self-destruct deadlines
//!
//! # Security Properties
//!
//! - No plaintext share content ever touches the server
//! - Caller identities are stored only as SHA-256 hashes
//! - No long-term storage - data is gone on restart

use cyphersafe_backend::{build_router, AppState, Config, Sweeper};
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Initialize structured logging
    init_tracing();

    // Load configuration
    let config = Config::from_env();
    log_startup_info(&config);

    let bind_addr = format!("{}:{}", config.bind_addr, config.port);
    let state = AppState::new(config);

    // Start the authoritative sweeper
    let sweeper = Sweeper::new(&state).start();

    // Build and serve the application
    let app = build_router(state);
    let result = serve(app, &bind_addr).await;

    sweeper.shutdown().await;
    result
}

/// Initialize tracing with environment-based log levels.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cyphersafe_backend=debug,tower_http=info")),
        )
        .init();
}

/// Log startup configuration (no secrets).
fn log_startup_info(config: &Config) {
    info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        storage = "memory",
        max_ciphertext_size = config.max_ciphertext_size,
        max_shares = config.max_shares,
        max_share_ttl_secs = config.max_share_ttl.as_secs(),
        tombstone_ttl_secs = config.tombstone_ttl.as_secs(),
        max_note_size = config.max_note_size,
        max_notes_per_owner = config.max_notes_per_owner,
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Starting CypherSafe backend"
    );
}

/// Bind to address and serve until Ctrl-C.
async fn serve(app: axum::Router, bind_addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    info!(addr = %bind_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}
