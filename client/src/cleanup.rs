//! Best-effort client-side self-destruct.
//!
//! The store deletes expired notes on its own schedule and already hides
//! them from reads. The poller here keeps a view in step between store
//! sweeps: it filters past-deadline notes out, publishes what is left, and
//! asks the store to delete the rest. A delete that finds the note already
//! gone counts as done.

use crate::error::{Error, Result};
use crate::transport::StoreApi;
use chrono::{DateTime, Utc};
use cyphersafe_core::note::partition_expired;
use cyphersafe_core::{Clock, Note, SkewedClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of one cleanup cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    /// Notes still live, ordered as the store listed them
    pub live: Vec<Note>,
    /// Expired notes confirmed gone (deleted now or already absent)
    pub removed: usize,
    /// Deletes that failed and will be retried next cycle
    pub failed: usize,
}

/// Feed a store timestamp into `clock`, logging when it is out of range.
pub(crate) fn follow_store_time(clock: &SkewedClock, server_time: DateTime<Utc>) {
    if !clock.observe_store_time(server_time) {
        warn!(%server_time, "Ignoring implausible store time");
    }
}

/// List notes, drop the expired ones from the view, delete them.
///
/// The store's `server_time` is fed into `clock` first, so the
/// expiry decision uses store time.
pub async fn run_cleanup_cycle<S>(store: &S, clock: &SkewedClock) -> Result<CleanupOutcome>
where
    S: StoreApi + ?Sized,
{
    let listing = store.list_notes().await?;
    follow_store_time(clock, listing.server_time);

    let (live, expired) = partition_expired(listing.notes, clock.now());
    let mut outcome = CleanupOutcome {
        live,
        ..CleanupOutcome::default()
    };

    for title in expired {
        match store.delete_note(&title).await {
            Ok(()) | Err(Error::NoteNotFound) => outcome.removed += 1,
            Err(err) => {
                warn!(error = %err, "Failed to delete expired note");
                outcome.failed += 1;
            }
        }
    }

    if outcome.removed > 0 {
        debug!(removed = outcome.removed, "Removed expired notes");
    }
    Ok(outcome)
}

/// Periodic cleanup task
pub struct SelfDestructPoller {
    store: Arc<dyn StoreApi>,
    clock: Arc<SkewedClock>,
    interval: Duration,
}

impl SelfDestructPoller {
    pub fn new(store: Arc<dyn StoreApi>, clock: Arc<SkewedClock>, interval: Duration) -> Self {
        Self {
            store,
            clock,
            interval,
        }
    }

    /// Start polling. The first cycle runs immediately.
    pub fn start(self) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (notes_tx, notes_rx) = watch::channel(Vec::new());

        let task = tokio::spawn(async move {
            info!(
                interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
                "Started self-destruct poller"
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match run_cleanup_cycle(self.store.as_ref(), &self.clock).await {
                            Ok(outcome) => {
                                notes_tx.send_replace(outcome.live);
                            }
                            Err(err) if err.is_retryable() => {
                                debug!(error = %err, "Store unavailable, retrying next tick");
                            }
                            Err(err) => {
                                warn!(error = %err, "Cleanup cycle failed");
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("Stopped self-destruct poller");
        });

        PollerHandle {
            shutdown: shutdown_tx,
            notes: notes_rx,
            task: Some(task),
        }
    }
}

/// Owner of a running poller. Dropping it stops the task.
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    notes: watch::Receiver<Vec<Note>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Live notes as of the latest successful cycle
    pub fn subscribe(&self) -> watch::Receiver<Vec<Note>> {
        self.notes.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signal the task to stop and wait for it
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
