//! Wire models shared by the backend and its clients.
//!
//! Binary fields travel as standard base64 strings. The decryption key has
//! no field anywhere in this module.

use crate::note::Note;
use crate::share::ShareId;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Machine-readable error codes carried in [`ErrorResponse::code`].
pub mod codes {
    /// Malformed or out-of-range input (400)
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    /// No bearer identity (401)
    pub const MISSING_AUTH: &str = "MISSING_AUTH";
    /// Unusable authorization header (400)
    pub const INVALID_AUTH: &str = "INVALID_AUTH";
    /// Unknown or forgotten share (404)
    pub const LINK_NOT_FOUND: &str = "LINK_NOT_FOUND";
    /// Timed share past its deadline (410)
    pub const LINK_EXPIRED: &str = "LINK_EXPIRED";
    /// View-once share already opened (410)
    pub const LINK_CONSUMED: &str = "LINK_CONSUMED";
    /// No live note with that title (404)
    pub const NOTE_NOT_FOUND: &str = "NOTE_NOT_FOUND";
    /// Title already taken by a live note (409)
    pub const NOTE_EXISTS: &str = "NOTE_EXISTS";
    /// Ciphertext or note over the size limit (413)
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    /// Store full (503)
    pub const SERVER_AT_CAPACITY: &str = "SERVER_AT_CAPACITY";
    /// Unexpected server fault (500)
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Encode bytes for a JSON field.
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a JSON bytes field.
pub fn decode_bytes(encoded: &str) -> Option<Vec<u8>> {
    STANDARD.decode(encoded).ok()
}

// === Shares ===

/// Create share request.
///
/// Exactly one of `view_once` / `expires_at` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShareRequest {
    /// Base64-encoded ciphertext (tag included)
    pub ciphertext: String,
    /// Base64-encoded 12-byte nonce
    pub nonce: String,
    /// Deadline of a timed share
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Share opens exactly once
    #[serde(default)]
    pub view_once: bool,
}

/// Create share response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShareResponse {
    /// Capability id for the link path
    pub share_id: ShareId,
}

/// Open share response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenShareResponse {
    /// Base64-encoded ciphertext
    pub ciphertext: String,
    /// Base64-encoded nonce
    pub nonce: String,
}

/// Share sweep response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareCleanupResponse {
    /// Timed shares whose payload was dropped in this sweep
    pub expired: usize,
    /// Tombstones removed after their retention window
    pub forgotten: usize,
}

// === Notes ===

/// Create note request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    /// Unique title within the caller's notes
    pub title: String,
    /// Note text
    pub content: String,
    /// Optional self-destruct deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_destruct_at: Option<DateTime<Utc>>,
}

/// Update note request (title comes from the path)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    /// Replacement text
    pub content: String,
    /// Replacement deadline; `None` clears it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_destruct_at: Option<DateTime<Utc>>,
}

/// Single note response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteResponse {
    /// The note
    pub note: Note,
    /// Store clock at response time
    pub server_time: DateTime<Utc>,
}

/// Note list / search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteListResponse {
    /// Live notes ordered by title
    pub notes: Vec<Note>,
    /// Store clock at response time
    pub server_time: DateTime<Utc>,
}

/// Note search query (query params)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive search term
    pub q: String,
}

/// Set self-destruct timer request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfDestructRequest {
    /// Seconds from store time until deletion
    pub duration_seconds: u64,
}

/// Set self-destruct timer response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfDestructResponse {
    /// Deadline computed on the store clock
    pub self_destruct_at: DateTime<Utc>,
    /// Store clock at response time
    pub server_time: DateTime<Utc>,
}

/// Note sweep response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCleanupResponse {
    /// Notes removed
    pub deleted: usize,
}

// === Errors ===

/// Error body returned with every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// One of [`codes`]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_share_request_defaults() {
        let req: CreateShareRequest =
            serde_json::from_str(r#"{"ciphertext":"AAAA","nonce":"BBBB"}"#).unwrap();
        assert!(!req.view_once);
        assert!(req.expires_at.is_none());

        let json = serde_json::to_string(&CreateShareRequest {
            ciphertext: "AAAA".into(),
            nonce: "BBBB".into(),
            expires_at: None,
            view_once: true,
        })
        .unwrap();
        assert!(!json.contains("expires_at"));
    }

    #[test]
    fn bytes_helpers() {
        assert_eq!(decode_bytes(&encode_bytes(b"abc")).unwrap(), b"abc");
        assert!(decode_bytes("%%%").is_none());
    }
}
