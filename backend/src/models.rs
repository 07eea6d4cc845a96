//! Storage models for the CypherSafe store.
//!
//! Shared records hold ciphertext and nonce only. The key that opens them
//! has no field here, and request/response shapes live in
//! `cyphersafe_core::api`.

use chrono::{DateTime, Utc};
use cyphersafe_core::{ExpiryMode, ShareNonce};
use serde::Serialize;

/// Owner namespace key: hex SHA-256 of the caller identity.
pub type OwnerKey = String;

/// Encrypted share as held by the store
#[derive(Debug, Clone)]
pub struct ShareRecord {
    /// Encrypted note (opaque to the store)
    pub ciphertext: Vec<u8>,

    /// Nonce used for `ciphertext`
    pub nonce: ShareNonce,

    /// View-once or timed
    pub mode: ExpiryMode,

    /// When the share was created
    pub created_at: DateTime<Utc>,
}

/// Why a share no longer has a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TombstoneReason {
    /// View-once share that has been opened
    Consumed,
    /// Timed share past its deadline
    Expired,
}

/// Marker left behind after the payload is gone
#[derive(Debug, Clone, Copy)]
pub struct Tombstone {
    pub reason: TombstoneReason,

    /// When the marker itself is swept
    pub forget_at: DateTime<Utc>,
}

/// Slot in the share map
#[derive(Debug, Clone)]
pub enum ShareSlot {
    Live(ShareRecord),
    Tombstone(Tombstone),
}

/// Outcome of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Timed shares turned into tombstones
    pub expired: usize,
    /// Tombstones removed
    pub forgotten: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired == 0 && self.forgotten == 0
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Live shares plus tombstones
    pub shares: usize,
}
