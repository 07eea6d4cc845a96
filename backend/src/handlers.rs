//! HTTP request handlers for the CypherSafe API.
//!
//! All handlers follow the contract:
//! - Share payloads are opaque ciphertext; keys never arrive here
//! - Note handlers are scoped to the caller's owner key
//! - Expiry is decided on the store clock
//! - Minimal logging (id and owner prefixes only)

use crate::config::Config;
use crate::identity::{caller_from_headers, AuthError};
use crate::models::*;
use crate::notes::{NoteError, NoteStore};
use crate::store::{ShareStore, StoreError};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use cyphersafe_core::api::{self, codes, *};
use cyphersafe_core::{Clock, ExpiryMode, ShareId, ShareNonce, SystemClock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub shares: ShareStore,
    pub notes: NoteStore,
    pub config: Arc<Config>,
    /// Store clock, shared by both stores
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let config = Arc::new(config);
        Self {
            shares: ShareStore::with_clock(config.clone(), clock.clone()),
            notes: NoteStore::with_clock(config.clone(), clock.clone()),
            config,
            clock,
        }
    }
}

// === Health Check ===

/// GET /health - Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        shares: state.shares.len(),
    })
}

// === Shares ===

/// POST /v1/shares - Store an encrypted share
///
/// Exactly one of `view_once` / `expires_at` must be set. The response
/// carries only the new id; the caller builds the link locally.
pub async fn create_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateShareRequest>,
) -> Result<(StatusCode, Json<CreateShareResponse>), ApiError> {
    let caller = caller_from_headers(&headers)?;

    let ciphertext = api::decode_bytes(&req.ciphertext)
        .ok_or(ApiError::InvalidInput("invalid base64 ciphertext".into()))?;
    let nonce = api::decode_bytes(&req.nonce)
        .and_then(|bytes| ShareNonce::from_slice(&bytes))
        .ok_or(ApiError::InvalidInput("nonce must be 12 bytes of base64".into()))?;
    let mode = ExpiryMode::from_wire(req.view_once, req.expires_at)
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let size = ciphertext.len();
    let share_id = state.shares.create(ciphertext, nonce, mode)?;

    info!(
        owner = caller.log_prefix(),
        share = share_id.log_prefix(),
        size,
        view_once = matches!(mode, ExpiryMode::ViewOnce),
        "Share created"
    );

    Ok((StatusCode::CREATED, Json(CreateShareResponse { share_id })))
}

/// POST /v1/shares/:share_id/open - Fetch a share's ciphertext
///
/// POST rather than GET so link previews and prefetchers cannot consume a
/// view-once share. Malformed ids read as not found.
pub async fn open_share(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<OpenShareResponse>, ApiError> {
    let share_id = ShareId::parse(&raw_id).map_err(|_| ApiError::LinkNotFound)?;

    let (ciphertext, nonce) = state.shares.open(&share_id).map_err(|e| {
        debug!(share = share_id.log_prefix(), reason = %e, "Share open refused");
        ApiError::from(e)
    })?;

    debug!(share = share_id.log_prefix(), "Share opened");

    Ok(Json(OpenShareResponse {
        ciphertext: api::encode_bytes(&ciphertext),
        nonce: api::encode_bytes(nonce.as_bytes()),
    }))
}

/// POST /v1/shares/cleanup - Run the share sweep now
pub async fn cleanup_shares(State(state): State<AppState>) -> Json<ShareCleanupResponse> {
    let report = state.shares.sweep();
    Json(ShareCleanupResponse {
        expired: report.expired,
        forgotten: report.forgotten,
    })
}

// === Notes ===

/// GET /v1/notes - List the caller's live notes
pub async fn list_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NoteListResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let notes = state.notes.list(caller.owner());

    Ok(Json(NoteListResponse {
        notes,
        server_time: state.clock.now(),
    }))
}

/// POST /v1/notes - Create a note
pub async fn create_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let caller = caller_from_headers(&headers)?;
    let note = state
        .notes
        .create(caller.owner(), &req.title, &req.content, req.self_destruct_at)?;

    info!(
        owner = caller.log_prefix(),
        size = note.content.len(),
        "Note created"
    );

    Ok((
        StatusCode::CREATED,
        Json(NoteResponse {
            note,
            server_time: state.clock.now(),
        }),
    ))
}

/// GET /v1/notes/search?q= - Search the caller's live notes
pub async fn search_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<Json<NoteListResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let notes = state.notes.search(caller.owner(), &query.q);

    Ok(Json(NoteListResponse {
        notes,
        server_time: state.clock.now(),
    }))
}

/// GET /v1/notes/:title - Fetch one live note
pub async fn get_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(title): Path<String>,
) -> Result<Json<NoteResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let note = state.notes.get(caller.owner(), &title)?;

    Ok(Json(NoteResponse {
        note,
        server_time: state.clock.now(),
    }))
}

/// PUT /v1/notes/:title - Replace a note's content and deadline
pub async fn update_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(title): Path<String>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let note = state
        .notes
        .update(caller.owner(), &title, &req.content, req.self_destruct_at)?;

    debug!(owner = caller.log_prefix(), "Note updated");

    Ok(Json(NoteResponse {
        note,
        server_time: state.clock.now(),
    }))
}

/// DELETE /v1/notes/:title - Delete a note
pub async fn delete_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(title): Path<String>,
) -> Result<StatusCode, ApiError> {
    let caller = caller_from_headers(&headers)?;
    state.notes.delete(caller.owner(), &title)?;

    debug!(owner = caller.log_prefix(), "Note deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/notes/:title/self-destruct - Arm a self-destruct timer
///
/// The deadline is computed on the store clock and returned with it.
pub async fn set_self_destruct_timer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(title): Path<String>,
    Json(req): Json<SelfDestructRequest>,
) -> Result<Json<SelfDestructResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let self_destruct_at =
        state
            .notes
            .set_self_destruct_timer(caller.owner(), &title, req.duration_seconds)?;

    info!(
        owner = caller.log_prefix(),
        duration_secs = req.duration_seconds,
        "Self-destruct timer set"
    );

    Ok(Json(SelfDestructResponse {
        self_destruct_at,
        server_time: state.clock.now(),
    }))
}

/// POST /v1/notes/cleanup - Delete the caller's expired notes
pub async fn cleanup_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NoteCleanupResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let deleted = state.notes.cleanup_owner(caller.owner());

    Ok(Json(NoteCleanupResponse { deleted }))
}

/// DELETE /v1/notes/expired - Delete every owner's expired notes
pub async fn delete_all_expired_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NoteCleanupResponse>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    let deleted = state.notes.delete_all_expired();

    if deleted > 0 {
        info!(owner = caller.log_prefix(), deleted, "Global note sweep requested");
    }

    Ok(Json(NoteCleanupResponse { deleted }))
}

// === Error Handling ===

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    LinkNotFound,
    LinkExpired,
    LinkConsumed,
    NoteNotFound,
    NoteExists,
    PayloadTooLarge,
    /// Store or owner namespace full
    ServerAtCapacity,
    Internal,
    /// Identity error (wraps AuthError)
    Auth(AuthError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::LinkNotFound,
            StoreError::Expired => ApiError::LinkExpired,
            StoreError::AlreadyConsumed => ApiError::LinkConsumed,
            StoreError::PayloadTooLarge => ApiError::PayloadTooLarge,
            StoreError::InvalidPayload(_) | StoreError::InvalidExpiry(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            StoreError::AtCapacity => ApiError::ServerAtCapacity,
            StoreError::Entropy => {
                warn!("Share id generation failed");
                ApiError::Internal
            }
        }
    }
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::NotFound => ApiError::NoteNotFound,
            NoteError::AlreadyExists => ApiError::NoteExists,
            NoteError::Invalid(msg) => ApiError::InvalidInput(msg),
            NoteError::PayloadTooLarge => ApiError::PayloadTooLarge,
            NoteError::AtCapacity => ApiError::ServerAtCapacity,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            ApiError::Auth(auth_err) => return auth_err.into_response(),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, codes::INVALID_INPUT, msg),
            ApiError::LinkNotFound => (
                StatusCode::NOT_FOUND,
                codes::LINK_NOT_FOUND,
                "share link not found".to_string(),
            ),
            ApiError::LinkExpired => (
                StatusCode::GONE,
                codes::LINK_EXPIRED,
                "share link has expired".to_string(),
            ),
            ApiError::LinkConsumed => (
                StatusCode::GONE,
                codes::LINK_CONSUMED,
                "share link has already been viewed".to_string(),
            ),
            ApiError::NoteNotFound => (
                StatusCode::NOT_FOUND,
                codes::NOTE_NOT_FOUND,
                "note not found".to_string(),
            ),
            ApiError::NoteExists => (
                StatusCode::CONFLICT,
                codes::NOTE_EXISTS,
                "a note with this title already exists".to_string(),
            ),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                codes::PAYLOAD_TOO_LARGE,
                "payload exceeds size limit".to_string(),
            ),
            ApiError::ServerAtCapacity => (
                StatusCode::SERVICE_UNAVAILABLE,
                codes::SERVER_AT_CAPACITY,
                "server at capacity, try again later".to_string(),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL_ERROR,
                "internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
