//! In-memory share store with consume-once and expiry semantics.
//!
//! Each share moves through
//!
//! ```text
//! ViewOnce:  Live ──open──▶ Tombstone(Consumed) ──sweep──▶ removed
//! Timed:     Live ──deadline──▶ Tombstone(Expired) ──sweep──▶ removed
//! ```
//!
//! `open` decides and applies the transition while holding the entry's
//! shard lock, so two racing opens of a view-once share cannot both see
//! it live. Tombstones carry no payload; they exist so a late visitor
//! learns *why* the link is dead, and are forgotten after
//! `tombstone_ttl`. No persistence - data is lost on restart.

use crate::config::Config;
use crate::models::*;
use chrono::{DateTime, Duration, Utc};
use cyphersafe_core::share::SHARE_ID_BYTES;
use cyphersafe_core::{Clock, ExpiryMode, ShareId, ShareNonce, SystemClock, TAG_SIZE};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 4;

/// Thread-safe in-memory share store
#[derive(Clone)]
pub struct ShareStore {
    /// Live shares and tombstones by id
    shares: Arc<DashMap<ShareId, ShareSlot>>,

    /// Slots held or reserved; never above `max_shares`
    slots: Arc<AtomicUsize>,

    /// CSPRNG for share ids
    rng: SystemRandom,

    /// Configuration
    config: Arc<Config>,

    /// Authoritative time source
    clock: Arc<dyn Clock>,
}

impl ShareStore {
    /// Create a new empty store on the system clock
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new empty store on a given clock
    pub fn with_clock(config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        Self {
            shares: Arc::new(DashMap::new()),
            slots: Arc::new(AtomicUsize::new(0)),
            rng: SystemRandom::new(),
            config,
            clock,
        }
    }

    /// Number of slots held (live shares and tombstones)
    pub fn len(&self) -> usize {
        self.slots.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store an encrypted share and return its new id.
    pub fn create(
        &self,
        ciphertext: Vec<u8>,
        nonce: ShareNonce,
        mode: ExpiryMode,
    ) -> Result<ShareId, StoreError> {
        if ciphertext.len() < TAG_SIZE {
            return Err(StoreError::InvalidPayload("ciphertext shorter than tag"));
        }
        if ciphertext.len() > self.config.max_ciphertext_size {
            return Err(StoreError::PayloadTooLarge);
        }

        let now = self.clock.now();
        if let ExpiryMode::TimedUntil(deadline) = mode {
            if deadline <= now {
                return Err(StoreError::InvalidExpiry("expiry is in the past"));
            }
            let max_ttl = Duration::from_std(self.config.max_share_ttl)
                .map_err(|_| StoreError::InvalidExpiry("expiry too far in the future"))?;
            if deadline - now > max_ttl {
                return Err(StoreError::InvalidExpiry("expiry too far in the future"));
            }
        }

        if !self.reserve_slot() {
            // Try to make room first
            self.sweep();
            if !self.reserve_slot() {
                warn!("Share rejected: store at capacity");
                return Err(StoreError::AtCapacity);
            }
        }

        let record = ShareRecord {
            ciphertext,
            nonce,
            mode,
            created_at: now,
        };

        let stored = self.insert_record(record);
        if stored.is_err() {
            self.release_slots(1);
        }
        stored
    }

    fn insert_record(&self, record: ShareRecord) -> Result<ShareId, StoreError> {
        let mode = record.mode;
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.generate_id()?;
            if let Entry::Vacant(slot) = self.shares.entry(id.clone()) {
                slot.insert(ShareSlot::Live(record));
                debug!(
                    share = id.log_prefix(),
                    view_once = matches!(mode, ExpiryMode::ViewOnce),
                    "Stored share"
                );
                return Ok(id);
            }
        }

        Err(StoreError::Entropy)
    }

    /// Fetch a share's ciphertext and nonce.
    ///
    /// A view-once share is consumed by the first successful call; a timed
    /// share past its deadline is turned into a tombstone on first sight.
    pub fn open(&self, id: &ShareId) -> Result<(Vec<u8>, ShareNonce), StoreError> {
        let now = self.clock.now();
        let forget_at = self.forget_at(now);

        // The entry guard holds the shard write lock until the end of the match.
        match self.shares.entry(id.clone()) {
            Entry::Vacant(_) => Err(StoreError::NotFound),
            Entry::Occupied(mut occupied) => {
                let mode = match occupied.get() {
                    ShareSlot::Tombstone(tomb) => {
                        let tomb = *tomb;
                        if tomb.forget_at <= now {
                            occupied.remove();
                            self.release_slots(1);
                            return Err(StoreError::NotFound);
                        }
                        return Err(tomb.reason.into());
                    }
                    ShareSlot::Live(record) => record.mode,
                };

                if mode.is_expired_at(now) {
                    occupied.insert(ShareSlot::Tombstone(Tombstone {
                        reason: TombstoneReason::Expired,
                        forget_at,
                    }));
                    debug!(share = id.log_prefix(), "Share expired on open");
                    return Err(StoreError::Expired);
                }

                match mode {
                    ExpiryMode::TimedUntil(_) => match occupied.get() {
                        ShareSlot::Live(record) => Ok((record.ciphertext.clone(), record.nonce)),
                        ShareSlot::Tombstone(_) => Err(StoreError::NotFound),
                    },
                    ExpiryMode::ViewOnce => {
                        let previous = occupied.insert(ShareSlot::Tombstone(Tombstone {
                            reason: TombstoneReason::Consumed,
                            forget_at,
                        }));
                        debug!(share = id.log_prefix(), "View-once share consumed");
                        match previous {
                            ShareSlot::Live(record) => Ok((record.ciphertext, record.nonce)),
                            ShareSlot::Tombstone(_) => Err(StoreError::NotFound),
                        }
                    }
                }
            }
        }
    }

    /// Expire timed shares past their deadline and forget old tombstones.
    ///
    /// Idempotent. Locks one shard at a time, so it runs alongside
    /// `create` and `open`.
    pub fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let forget_at = self.forget_at(now);
        let mut report = SweepReport::default();

        self.shares.retain(|_, slot| {
            let (expire, keep) = match slot {
                ShareSlot::Live(record) => (record.mode.is_expired_at(now), true),
                ShareSlot::Tombstone(tomb) => (false, tomb.forget_at > now),
            };
            if expire {
                *slot = ShareSlot::Tombstone(Tombstone {
                    reason: TombstoneReason::Expired,
                    forget_at,
                });
                report.expired += 1;
            }
            if !keep {
                report.forgotten += 1;
            }
            keep
        });
        self.release_slots(report.forgotten);

        if !report.is_empty() {
            debug!(
                expired = report.expired,
                forgotten = report.forgotten,
                "Swept shares"
            );
        }

        report
    }

    /// Claim one slot if the store is below capacity
    fn reserve_slot(&self) -> bool {
        let max = self.config.max_shares;
        self.slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                (held < max).then_some(held + 1)
            })
            .is_ok()
    }

    fn release_slots(&self, count: usize) {
        if count > 0 {
            self.slots.fetch_sub(count, Ordering::AcqRel);
        }
    }

    fn tombstone_ttl(&self) -> Duration {
        Duration::from_std(self.config.tombstone_ttl).unwrap_or_else(|_| Duration::days(1))
    }

    fn forget_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.tombstone_ttl())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn generate_id(&self) -> Result<ShareId, StoreError> {
        let mut bytes = [0u8; SHARE_ID_BYTES];
        self.rng.fill(&mut bytes).map_err(|_| StoreError::Entropy)?;
        Ok(ShareId::from_random_bytes(&bytes))
    }
}

/// Share store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("share link not found")]
    NotFound,

    #[error("share link has expired")]
    Expired,

    #[error("view-once share link has already been opened")]
    AlreadyConsumed,

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),

    #[error("invalid expiry: {0}")]
    InvalidExpiry(&'static str),

    #[error("share store at capacity")]
    AtCapacity,

    #[error("random source unavailable")]
    Entropy,
}

impl From<TombstoneReason> for StoreError {
    fn from(reason: TombstoneReason) -> Self {
        match reason {
            TombstoneReason::Consumed => StoreError::AlreadyConsumed,
            TombstoneReason::Expired => StoreError::Expired,
        }
    }
}
