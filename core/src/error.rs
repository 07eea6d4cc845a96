//! Error types for cyphersafe-core.
//!
//! All errors are explicit and cheap to clone so they can cross the WASM
//! boundary unchanged. `std::error::Error` is implemented by hand.
//!
//! # Error Categories
//!
//! - **Codec errors**: `DecryptionFailure`, `EncryptionFailed`, `EntropyUnavailable`, `InvalidUtf8`
//! - **Key material errors**: `InvalidKeyEncoding`
//! - **Link errors**: `InvalidShareId`, `InvalidUrl`
//! - **Input errors**: `EmptyTitle`, `EmptyContent`, `InvalidDuration`, `InvalidExpiry`

use std::error::Error as StdError;
use std::fmt;

/// Result type alias for cyphersafe-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during cyphersafe-core operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ==================== Codec Errors ====================
    /// Authenticated decryption failed.
    ///
    /// Covers a wrong key, a wrong nonce, tampered ciphertext, and
    /// malformed sizes alike. The variant carries no detail so callers
    /// cannot tell these cases apart.
    DecryptionFailure,

    /// The AEAD refused to encrypt (plaintext beyond the cipher limit).
    EncryptionFailed,

    /// The random source could not produce bytes.
    EntropyUnavailable,

    /// Decrypted bytes are not valid UTF-8.
    ///
    /// Only reported after the integrity tag has verified.
    InvalidUtf8,

    // ==================== Key Material Errors ====================
    /// Key text is not base64 or does not decode to 32 bytes.
    InvalidKeyEncoding,

    // ==================== Link Errors ====================
    /// Share identifier is empty or uses characters outside base64url.
    InvalidShareId,

    /// URL could not be built or parsed.
    InvalidUrl {
        /// What was wrong with it.
        reason: String,
    },

    // ==================== Input Errors ====================
    /// Note title is empty or only whitespace.
    EmptyTitle,

    /// Note content is empty or only whitespace.
    EmptyContent,

    /// Self-destruct duration is zero or out of range.
    InvalidDuration {
        /// Requested duration in seconds.
        seconds: u64,
    },

    /// Share expiry flags describe an impossible combination, or the
    /// deadline is out of range.
    InvalidExpiry {
        /// Description of what's wrong.
        reason: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DecryptionFailure => write!(f, "decryption failed"),
            Error::EncryptionFailed => write!(f, "encryption failed"),
            Error::EntropyUnavailable => write!(f, "random source unavailable"),
            Error::InvalidUtf8 => write!(f, "decrypted content is not valid UTF-8"),
            Error::InvalidKeyEncoding => write!(f, "invalid share key encoding"),
            Error::InvalidShareId => write!(f, "invalid share id"),
            Error::InvalidUrl { reason } => write!(f, "invalid url: {}", reason),
            Error::EmptyTitle => write!(f, "title cannot be empty"),
            Error::EmptyContent => write!(f, "content cannot be empty"),
            Error::InvalidDuration { seconds } => {
                write!(f, "invalid self-destruct duration: {} seconds", seconds)
            }
            Error::InvalidExpiry { reason } => write!(f, "invalid expiry: {}", reason),
        }
    }
}

impl StdError for Error {}
