//! Authoritative expiry sweep.
//!
//! Background task that periodically expires timed shares, forgets old
//! tombstones, and deletes notes past their self-destruct deadline.
//! Reads never depend on it: expired items are already hidden at read
//! time, so the sweep only reclaims memory.

use crate::handlers::AppState;
use crate::models::SweepReport;
use crate::notes::NoteStore;
use crate::store::ShareStore;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Totals of one sweep over both stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepTotals {
    pub shares: SweepReport,
    pub notes_deleted: usize,
}

/// Periodic sweeper over shares and notes
pub struct Sweeper {
    shares: ShareStore,
    notes: NoteStore,
    /// Tick interval (default 10 seconds)
    interval: Duration,
}

impl Sweeper {
    pub fn new(state: &AppState) -> Self {
        Self {
            shares: state.shares.clone(),
            notes: state.notes.clone(),
            interval: state.config.sweep_interval,
        }
    }

    /// Run one pass over both stores
    pub fn run_once(&self) -> SweepTotals {
        let totals = SweepTotals {
            shares: self.shares.sweep(),
            notes_deleted: self.notes.delete_all_expired(),
        };
        if totals.notes_deleted > 0 || !totals.shares.is_empty() {
            debug!(
                shares_expired = totals.shares.expired,
                tombstones_forgotten = totals.shares.forgotten,
                notes_deleted = totals.notes_deleted,
                "Sweep pass"
            );
        }
        totals
    }

    /// Start the background task.
    ///
    /// The task stops on [`SweeperHandle::shutdown`] or when the handle is
    /// dropped.
    pub fn start(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                interval_secs = self.interval.as_secs(),
                "Started expiry sweeper"
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once();
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Stopped expiry sweeper");
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }
}

/// Owner of a running sweeper task
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Signal the task to stop and wait for it
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::{TimeZone, Utc};
    use cyphersafe_core::{Clock, ExpiryMode, ManualClock, ShareNonce};
    use std::sync::Arc;

    fn state_with_clock() -> (AppState, ManualClock) {
        let mut config = Config::from_env();
        config.sweep_interval = Duration::from_millis(20);
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        (AppState::with_clock(config, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn run_once_covers_both_stores() {
        let (state, clock) = state_with_clock();
        let now = clock.now();
        let owner = crate::identity::owner_key("sweeper");

        state
            .shares
            .create(
                vec![7u8; 32],
                ShareNonce::from_bytes([0u8; 12]),
                ExpiryMode::timed_for(now, chrono::Duration::minutes(1)).unwrap(),
            )
            .unwrap();
        state
            .notes
            .create(&owner, "t", "c", Some(now + chrono::Duration::minutes(1)))
            .unwrap();

        let sweeper = Sweeper::new(&state);
        assert_eq!(sweeper.run_once(), SweepTotals::default());

        clock.advance(chrono::Duration::minutes(5));
        let totals = sweeper.run_once();
        assert_eq!(totals.shares.expired, 1);
        assert_eq!(totals.notes_deleted, 1);
    }

    #[tokio::test]
    async fn background_task_sweeps_and_stops() {
        let (state, clock) = state_with_clock();
        let owner = crate::identity::owner_key("sweeper");
        state
            .notes
            .create(&owner, "t", "c", Some(clock.now() + chrono::Duration::seconds(1)))
            .unwrap();
        clock.advance(chrono::Duration::seconds(2));

        let handle = Sweeper::new(&state).start();
        for _ in 0..50 {
            if state.notes.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(state.notes.is_empty());

        handle.shutdown().await;
    }
}
