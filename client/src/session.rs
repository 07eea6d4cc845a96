//! Session context.
//!
//! A [`Session`] carries everything a signed-in view needs: the store
//! transport, the cipher, a clock that follows the store, and the cleanup
//! poller. State that would otherwise be process-wide lives here and dies
//! with the session.

use crate::cleanup::{follow_store_time, PollerHandle, SelfDestructPoller};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::sharing::{self, ShareExpiry, SharedLink};
use crate::transport::{HttpStore, StoreApi};
use chrono::{DateTime, Utc};
use cyphersafe_core::note::countdown_label;
use cyphersafe_core::{Aes256GcmCipher, Clock, Note, ShareCipher, SkewedClock, SystemClock};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

pub struct Session {
    store: Arc<dyn StoreApi>,
    cipher: Arc<dyn ShareCipher>,
    clock: Arc<SkewedClock>,
    config: ClientConfig,
    poller: Option<PollerHandle>,
}

impl Session {
    /// Session against an HTTP store, acting as `identity`.
    pub fn connect(config: ClientConfig, identity: impl Into<String>) -> Result<Self> {
        let store = HttpStore::new(&config, Some(identity.into()))?;
        Ok(Self::with_parts(
            config,
            Arc::new(store),
            Arc::new(Aes256GcmCipher),
            Arc::new(SystemClock),
        ))
    }

    /// Session from explicit parts (tests, alternative transports)
    pub fn with_parts(
        config: ClientConfig,
        store: Arc<dyn StoreApi>,
        cipher: Arc<dyn ShareCipher>,
        local_clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cipher,
            clock: Arc::new(SkewedClock::new(local_clock)),
            config,
            poller: None,
        }
    }

    /// Clock corrected to the store's time
    pub fn clock(&self) -> &SkewedClock {
        &self.clock
    }

    pub fn store(&self) -> &dyn StoreApi {
        self.store.as_ref()
    }

    // === Notes ===

    pub async fn create_note(
        &self,
        title: &str,
        content: &str,
        self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<Note> {
        let response = self.store.create_note(title, content, self_destruct_at).await?;
        follow_store_time(&self.clock, response.server_time);
        Ok(response.note)
    }

    pub async fn update_note(
        &self,
        title: &str,
        content: &str,
        self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<Note> {
        let response = self.store.update_note(title, content, self_destruct_at).await?;
        follow_store_time(&self.clock, response.server_time);
        Ok(response.note)
    }

    pub async fn delete_note(&self, title: &str) -> Result<()> {
        self.store.delete_note(title).await
    }

    pub async fn get_note(&self, title: &str) -> Result<Note> {
        let response = self.store.get_note(title).await?;
        follow_store_time(&self.clock, response.server_time);
        Ok(response.note)
    }

    /// Live notes, filtered again on the store-corrected clock
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let response = self.store.list_notes().await?;
        follow_store_time(&self.clock, response.server_time);
        Ok(self.live_only(response.notes))
    }

    pub async fn search_notes(&self, term: &str) -> Result<Vec<Note>> {
        let response = self.store.search_notes(term).await?;
        follow_store_time(&self.clock, response.server_time);
        Ok(self.live_only(response.notes))
    }

    /// Arm a self-destruct timer; returns the deadline the store computed.
    pub async fn set_self_destruct_timer(
        &self,
        title: &str,
        duration: std::time::Duration,
    ) -> Result<DateTime<Utc>> {
        let response = self
            .store
            .set_self_destruct_timer(title, duration.as_secs())
            .await?;
        follow_store_time(&self.clock, response.server_time);
        Ok(response.self_destruct_at)
    }

    /// Countdown text for a note, on store time
    pub fn countdown(&self, note: &Note) -> Option<String> {
        countdown_label(note, self.clock.now())
    }

    // === Sharing ===

    /// Share a note's content; returns the link to hand out.
    pub async fn share_note(&self, note: &Note, expiry: ShareExpiry) -> Result<SharedLink> {
        let mode = expiry.to_mode(self.clock.now())?;
        sharing::share_note(
            self.store.as_ref(),
            self.cipher.as_ref(),
            &self.config.origin,
            &note.content,
            mode,
        )
        .await
    }

    /// Open a share link and return its text
    pub async fn open_shared(&self, share_url: &str) -> Result<String> {
        sharing::open_shared(self.store.as_ref(), self.cipher.as_ref(), share_url).await
    }

    // === Cleanup ===

    /// Start the self-destruct poller if it is not running.
    ///
    /// Returns a receiver of the live notes after each cycle.
    pub fn start_cleanup(&mut self) -> watch::Receiver<Vec<Note>> {
        if let Some(poller) = self.poller.as_ref().filter(|p| p.is_running()) {
            return poller.subscribe();
        }

        let poller = SelfDestructPoller::new(
            self.store.clone(),
            self.clock.clone(),
            self.config.cleanup_interval,
        )
        .start();
        let notes = poller.subscribe();
        self.poller = Some(poller);
        notes
    }

    /// Stop the poller, waiting for the running cycle to end.
    pub async fn stop_cleanup(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
            debug!("Session cleanup stopped");
        }
    }

    /// Tear the session down
    pub async fn close(mut self) {
        self.stop_cleanup().await;
    }

    fn live_only(&self, notes: Vec<Note>) -> Vec<Note> {
        let now = self.clock.now();
        notes.into_iter().filter(|note| !note.is_expired(now)).collect()
    }
}
