//! Client error taxonomy.
//!
//! Each variant is one class of failure the caller reacts to differently.
//! Nothing is retried automatically; [`Error::is_retryable`] tells the
//! caller when a retry makes sense.

use cyphersafe_core::api::{codes, ErrorResponse};
use reqwest::StatusCode;

/// Client result type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Wrong key, tampered payload, or malformed sizes. Deliberately
    /// carries no detail.
    #[error("decryption failed")]
    DecryptionFailure,

    #[error("share link not found")]
    LinkNotFound,

    #[error("share link has expired")]
    LinkExpired,

    #[error("share link has already been viewed")]
    LinkAlreadyConsumed,

    /// Store unreachable, timed out, or at capacity
    #[error("store unavailable: {0}")]
    TransportUnavailable(String),

    /// Input rejected locally or by the store
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("note not found")]
    NoteNotFound,

    #[error("a note with this title already exists")]
    NoteAlreadyExists,

    /// Share URL without a usable id or key
    #[error("invalid share link: {0}")]
    InvalidLink(String),

    /// Local key or nonce generation failed
    #[error("local crypto failure: {0}")]
    Crypto(String),

    /// Request failed after reaching the store (bad response body, etc.)
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other non-success response
    #[error("store rejected request ({status} {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },
}

impl Error {
    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransportUnavailable(_))
    }

    /// Map a store error response onto the taxonomy.
    pub(crate) fn from_response(status: StatusCode, body: Option<ErrorResponse>) -> Self {
        let (code, message) = match body {
            Some(body) => (body.code, body.error),
            None => (
                String::new(),
                status.canonical_reason().unwrap_or("unknown").to_string(),
            ),
        };

        match code.as_str() {
            codes::LINK_NOT_FOUND => Error::LinkNotFound,
            codes::LINK_EXPIRED => Error::LinkExpired,
            codes::LINK_CONSUMED => Error::LinkAlreadyConsumed,
            codes::NOTE_NOT_FOUND => Error::NoteNotFound,
            codes::NOTE_EXISTS => Error::NoteAlreadyExists,
            codes::INVALID_INPUT => Error::Validation(message),
            _ if status == StatusCode::SERVICE_UNAVAILABLE => Error::TransportUnavailable(message),
            _ => Error::Rejected {
                status: status.as_u16(),
                code,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::TransportUnavailable(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<cyphersafe_core::Error> for Error {
    fn from(err: cyphersafe_core::Error) -> Self {
        use cyphersafe_core::Error as Core;

        match err {
            // Unreadable plaintext is reported like any other failed open
            Core::DecryptionFailure | Core::InvalidUtf8 => Error::DecryptionFailure,
            Core::EncryptionFailed | Core::EntropyUnavailable => Error::Crypto(err.to_string()),
            Core::InvalidKeyEncoding | Core::InvalidShareId | Core::InvalidUrl { .. } => {
                Error::InvalidLink(err.to_string())
            }
            Core::EmptyTitle
            | Core::EmptyContent
            | Core::InvalidDuration { .. }
            | Core::InvalidExpiry { .. } => Error::Validation(err.to_string()),
        }
    }
}
