//! Time sources.
//!
//! The store's clock decides when a note or share is gone. Clients read
//! the store's time from every note response and run a [`SkewedClock`]
//! that follows it, so countdowns and local filtering agree with the
//! store instead of the local wall clock.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Start at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Jump to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Largest store/local disagreement a [`SkewedClock`] will accept, in seconds.
pub const MAX_CLOCK_SKEW_SECS: i64 = 24 * 60 * 60;

/// Local clock corrected towards the store's clock.
pub struct SkewedClock {
    local: Arc<dyn Clock>,
    /// `store_time - local_time`, in milliseconds.
    offset_ms: AtomicI64,
}

impl SkewedClock {
    /// Follow `local` with no correction until the first observation.
    pub fn new(local: Arc<dyn Clock>) -> Self {
        Self {
            local,
            offset_ms: AtomicI64::new(0),
        }
    }

    /// Record a store timestamp seen in a response.
    ///
    /// Timestamps further than [`MAX_CLOCK_SKEW_SECS`] from the local clock are
    /// ignored and the previous correction stays in place. Returns whether
    /// the observation was applied.
    pub fn observe_store_time(&self, store_time: DateTime<Utc>) -> bool {
        let offset = store_time.signed_duration_since(self.local.now());
        if offset.abs() > Duration::seconds(MAX_CLOCK_SKEW_SECS) {
            return false;
        }
        self.offset_ms
            .store(offset.num_milliseconds(), Ordering::Relaxed);
        true
    }

    /// Current correction applied to the local clock.
    pub fn offset(&self) -> Duration {
        Duration::milliseconds(self.offset_ms.load(Ordering::Relaxed))
    }
}

impl fmt::Debug for SkewedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkewedClock")
            .field("local", &self.local)
            .field("offset_ms", &self.offset_ms.load(Ordering::Relaxed))
            .finish()
    }
}

impl Clock for SkewedClock {
    fn now(&self) -> DateTime<Utc> {
        let local = self.local.now();
        local.checked_add_signed(self.offset()).unwrap_or(local)
    }
}
