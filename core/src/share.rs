//! Share identifiers and expiry policy.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Random bytes behind a share id (256 bits).
pub const SHARE_ID_BYTES: usize = 32;

/// Longest share id accepted from the outside.
pub const MAX_SHARE_ID_LEN: usize = 128;

/// Characters of a share id that may appear in logs.
const LOG_PREFIX_LEN: usize = 8;

/// Opaque, unguessable share identifier.
///
/// A capability token, not a lookup index: anyone holding it can open the
/// share. Only [`ShareId::log_prefix`] should ever be logged.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareId(String);

impl ShareId {
    /// Encode server-generated random bytes as a share id (base64url, 43 chars).
    pub fn from_random_bytes(bytes: &[u8; SHARE_ID_BYTES]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Validate an id received from a URL or request path.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty()
            || s.len() > MAX_SHARE_ID_LEN
            || !s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(Error::InvalidShareId);
        }
        Ok(Self(s.to_string()))
    }

    /// The full id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe for logs.
    pub fn log_prefix(&self) -> &str {
        &self.0[..LOG_PREFIX_LEN.min(self.0.len())]
    }
}

impl fmt::Debug for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareId({}…)", self.log_prefix())
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShareId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ShareId> for String {
    fn from(id: ShareId) -> Self {
        id.0
    }
}

/// How long a share lives.
///
/// Replaces the `(view_once, expires_at)` pair so that a view-once link
/// with an expiry cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryMode {
    /// Exactly one successful open, then gone.
    ViewOnce,
    /// Any number of opens while `now < deadline`.
    TimedUntil(DateTime<Utc>),
}

impl ExpiryMode {
    /// Timed share lasting `duration` from `now`.
    ///
    /// Fails with [`Error::InvalidExpiry`] when the deadline falls outside
    /// the representable range.
    pub fn timed_for(now: DateTime<Utc>, duration: Duration) -> Result<Self> {
        now.checked_add_signed(duration)
            .map(ExpiryMode::TimedUntil)
            .ok_or(Error::InvalidExpiry {
                reason: "expiry out of range",
            })
    }

    /// Collapse the wire flags into a mode.
    pub fn from_wire(view_once: bool, expires_at: Option<DateTime<Utc>>) -> Result<Self> {
        match (view_once, expires_at) {
            (true, None) => Ok(ExpiryMode::ViewOnce),
            (false, Some(deadline)) => Ok(ExpiryMode::TimedUntil(deadline)),
            (true, Some(_)) => Err(Error::InvalidExpiry {
                reason: "view-once links cannot carry an expiry",
            }),
            (false, None) => Err(Error::InvalidExpiry {
                reason: "timed links need an expiry",
            }),
        }
    }

    /// Split back into `(view_once, expires_at)` for the wire.
    pub fn to_wire(self) -> (bool, Option<DateTime<Utc>>) {
        match self {
            ExpiryMode::ViewOnce => (true, None),
            ExpiryMode::TimedUntil(deadline) => (false, Some(deadline)),
        }
    }

    /// Deadline, if the mode has one.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            ExpiryMode::ViewOnce => None,
            ExpiryMode::TimedUntil(deadline) => Some(*deadline),
        }
    }

    /// Whether a timed share has passed its deadline at `now`.
    ///
    /// View-once shares never expire by time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            ExpiryMode::ViewOnce => false,
            ExpiryMode::TimedUntil(deadline) => now >= *deadline,
        }
    }
}
