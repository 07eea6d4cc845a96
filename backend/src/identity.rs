//! Caller identity for the note endpoints.
//!
//! Callers present an opaque identity as `Authorization: Bearer <identity>`.
//! Identity issuance happens elsewhere; this store only namespaces notes
//! by it.
//!
//! # Security Model
//!
//! - The store keeps SHA-256(identity), never the identity itself
//! - Only the first 8 hex chars of the owner key are ever logged
//! - Share endpoints need no identity: holding the link is the capability

use crate::models::OwnerKey;
use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cyphersafe_core::api::{codes, ErrorResponse};
use ring::digest::{digest, SHA256};

/// Longest identity accepted in the header.
pub const MAX_IDENTITY_LEN: usize = 512;

/// Authenticated caller, reduced to its owner key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    owner: OwnerKey,
}

impl Caller {
    /// Caller for a raw identity string
    pub fn from_identity(identity: &str) -> Self {
        Self {
            owner: owner_key(identity),
        }
    }

    pub fn owner(&self) -> &OwnerKey {
        &self.owner
    }

    /// Short prefix safe to log
    pub fn log_prefix(&self) -> &str {
        &self.owner[..8.min(self.owner.len())]
    }
}

/// Hash an identity into its owner key (hex SHA-256)
pub fn owner_key(identity: &str) -> OwnerKey {
    let hash = digest(&SHA256, identity.as_bytes());
    hex::encode(hash.as_ref())
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(authorization: &str) -> Option<&str> {
    authorization
        .strip_prefix("Bearer ")
        .or_else(|| authorization.strip_prefix("bearer "))
}

/// Resolve the caller from request headers.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader)?;

    let identity = extract_bearer_token(value)
        .map(str::trim)
        .ok_or(AuthError::InvalidHeader)?;

    if identity.is_empty() || identity.len() > MAX_IDENTITY_LEN {
        return Err(AuthError::InvalidHeader);
    }

    Ok(Caller::from_identity(identity))
}

/// Identity errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Missing Authorization header
    MissingHeader,
    /// Malformed Authorization header or identity
    InvalidHeader,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingHeader => (
                StatusCode::UNAUTHORIZED,
                codes::MISSING_AUTH,
                "Authorization header required",
            ),
            AuthError::InvalidHeader => (
                StatusCode::BAD_REQUEST,
                codes::INVALID_AUTH,
                "Invalid Authorization header format",
            ),
        };

        let body = Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
