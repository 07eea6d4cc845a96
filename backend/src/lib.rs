//! # CypherSafe Backend
//!
//! In-memory store for zero-knowledge note sharing and self-destructing
//! notes.
//!
//! ## Design Principles
//!
//! - **No keys**: Shares arrive as ciphertext + nonce; the key stays in
//!   the link fragment on the client
//! - **Unguessable ids**: 256-bit random share ids, logged by prefix only
//! - **Atomic consume**: A view-once share opens exactly once, even under
//!   concurrent requests
//! - **Store clock decides**: Expiry and self-destruct deadlines are
//!   enforced on this server's clock and reported back as `server_time`
//! - **No long-term storage**: RAM-only, lost on restart
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  ciphertext+nonce  ┌─────────────┐   open(id)   ┌─────────────┐
//! │   Creator   │───────────────────▶│   Backend   │◀─────────────│  Recipient  │
//! └─────────────┘                    └─────────────┘              └─────────────┘
//!                                           │
//!                                    ┌──────┴──────┐
//!                                    │             │
//!                               ShareStore     NoteStore
//!                                    └──Sweeper───┘
//! ```
//!
//! ## API Overview
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/health` | GET | Health check |
//! | `/v1/shares` | POST | Create share |
//! | `/v1/shares/:share_id/open` | POST | Open share |
//! | `/v1/shares/cleanup` | POST | Sweep shares |
//! | `/v1/notes` | GET / POST | List / create notes |
//! | `/v1/notes/search` | GET | Search notes |
//! | `/v1/notes/cleanup` | POST | Delete caller's expired notes |
//! | `/v1/notes/expired` | DELETE | Delete all expired notes |
//! | `/v1/notes/:title` | GET / PUT / DELETE | Read / update / delete note |
//! | `/v1/notes/:title/self-destruct` | POST | Arm self-destruct timer |

pub mod config;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod notes;
pub mod store;
pub mod sweeper;

pub use config::Config;
pub use handlers::AppState;
pub use notes::NoteStore;
pub use store::ShareStore;
pub use sweeper::{Sweeper, SweeperHandle};

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Build the Axum router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_size();

    Router::new()
        // Health check (unauthenticated)
        .route("/health", get(handlers::health))
        // Shares: opening needs only the id
        .route("/v1/shares", post(handlers::create_share))
        .route("/v1/shares/cleanup", post(handlers::cleanup_shares))
        .route("/v1/shares/:share_id/open", post(handlers::open_share))
        // Notes (caller-scoped)
        .route(
            "/v1/notes",
            get(handlers::list_notes).post(handlers::create_note),
        )
        .route("/v1/notes/search", get(handlers::search_notes))
        .route("/v1/notes/cleanup", post(handlers::cleanup_notes))
        .route(
            "/v1/notes/expired",
            axum::routing::delete(handlers::delete_all_expired_notes),
        )
        .route(
            "/v1/notes/:title",
            get(handlers::get_note)
                .put(handlers::update_note)
                .delete(handlers::delete_note),
        )
        .route(
            "/v1/notes/:title/self-destruct",
            post(handlers::set_self_destruct_timer),
        )
        // Middleware stack (order matters: first added = outermost)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
