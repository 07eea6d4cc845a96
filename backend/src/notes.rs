//! Per-owner note storage with self-destruct deadlines.
//!
//! Notes are namespaced by owner key and kept ordered by title. A note
//! whose deadline has passed is invisible to every read and update from
//! that instant, even before a sweep physically removes it.

use crate::config::Config;
use crate::models::OwnerKey;
use chrono::{DateTime, Utc};
use cyphersafe_core::note::{deadline_after, validate_note_input};
use cyphersafe_core::{Clock, Note, SystemClock};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Longest accepted title in bytes.
pub const MAX_TITLE_LEN: usize = 256;

/// Thread-safe in-memory note store
#[derive(Clone)]
pub struct NoteStore {
    /// Notes by owner, then by title
    notes: Arc<DashMap<OwnerKey, BTreeMap<String, Note>>>,

    config: Arc<Config>,

    clock: Arc<dyn Clock>,
}

impl NoteStore {
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        Self {
            notes: Arc::new(DashMap::new()),
            config,
            clock,
        }
    }

    /// Current store time
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Total notes held across owners, expired ones included
    pub fn len(&self) -> usize {
        self.notes.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a note. An expired note with the same title is replaced.
    pub fn create(
        &self,
        owner: &OwnerKey,
        title: &str,
        content: &str,
        self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<Note, NoteError> {
        self.validate(title, content)?;
        let now = self.clock.now();
        self.check_deadline(self_destruct_at, now)?;

        let mut owned = self.notes.entry(owner.clone()).or_default();

        match owned.get(title) {
            Some(existing) if !existing.is_expired(now) => return Err(NoteError::AlreadyExists),
            Some(_) => {}
            None if owned.len() >= self.config.max_notes_per_owner => {
                return Err(NoteError::AtCapacity)
            }
            None => {}
        }

        let note = Note {
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            last_modified: now,
            self_destruct_at,
        };
        owned.insert(note.title.clone(), note.clone());

        debug!(
            owner = &owner[..8.min(owner.len())],
            timed = self_destruct_at.is_some(),
            "Created note"
        );
        Ok(note)
    }

    /// Replace a live note's content and deadline.
    pub fn update(
        &self,
        owner: &OwnerKey,
        title: &str,
        content: &str,
        self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<Note, NoteError> {
        self.validate(title, content)?;
        let now = self.clock.now();
        self.check_deadline(self_destruct_at, now)?;

        let mut owned = self.notes.get_mut(owner).ok_or(NoteError::NotFound)?;
        let note = live_mut(&mut owned, title, now)?;

        note.content = content.to_string();
        note.self_destruct_at = self_destruct_at;
        note.last_modified = now;
        Ok(note.clone())
    }

    /// Delete a note. Expired notes not yet swept may still be deleted.
    pub fn delete(&self, owner: &OwnerKey, title: &str) -> Result<(), NoteError> {
        let mut owned = self.notes.get_mut(owner).ok_or(NoteError::NotFound)?;
        owned.remove(title).map(|_| ()).ok_or(NoteError::NotFound)
    }

    /// Fetch a live note
    pub fn get(&self, owner: &OwnerKey, title: &str) -> Result<Note, NoteError> {
        let now = self.clock.now();
        let owned = self.notes.get(owner).ok_or(NoteError::NotFound)?;
        owned
            .get(title)
            .filter(|note| !note.is_expired(now))
            .cloned()
            .ok_or(NoteError::NotFound)
    }

    /// All live notes of an owner, ordered by title
    pub fn list(&self, owner: &OwnerKey) -> Vec<Note> {
        self.filtered(owner, |_| true)
    }

    /// Live notes whose title or content contains `term`, ignoring case
    pub fn search(&self, owner: &OwnerKey, term: &str) -> Vec<Note> {
        let needle = term.to_lowercase();
        self.filtered(owner, |note| {
            note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
        })
    }

    /// Set a deadline `duration_secs` from now on a live note.
    ///
    /// Returns the deadline computed on the store clock.
    pub fn set_self_destruct_timer(
        &self,
        owner: &OwnerKey,
        title: &str,
        duration_secs: u64,
    ) -> Result<DateTime<Utc>, NoteError> {
        let now = self.clock.now();
        let deadline = deadline_after(now, duration_secs, self.config.max_self_destruct.as_secs())?;

        let mut owned = self.notes.get_mut(owner).ok_or(NoteError::NotFound)?;
        let note = live_mut(&mut owned, title, now)?;
        note.self_destruct_at = Some(deadline);
        note.last_modified = now;
        Ok(deadline)
    }

    /// Delete every expired note of every owner. Idempotent.
    pub fn delete_all_expired(&self) -> usize {
        let now = self.clock.now();
        let mut deleted = 0;

        self.notes.retain(|_, owned| {
            let before = owned.len();
            owned.retain(|_, note| !note.is_expired(now));
            deleted += before - owned.len();
            !owned.is_empty()
        });

        if deleted > 0 {
            debug!(deleted, "Swept expired notes");
        }
        deleted
    }

    /// Delete the expired notes of one owner.
    pub fn cleanup_owner(&self, owner: &OwnerKey) -> usize {
        let now = self.clock.now();
        match self.notes.get_mut(owner) {
            Some(mut owned) => {
                let before = owned.len();
                owned.retain(|_, note| !note.is_expired(now));
                before - owned.len()
            }
            None => 0,
        }
    }

    fn filtered(&self, owner: &OwnerKey, keep: impl Fn(&Note) -> bool) -> Vec<Note> {
        let now = self.clock.now();
        match self.notes.get(owner) {
            Some(owned) => owned
                .values()
                .filter(|note| !note.is_expired(now) && keep(note))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    fn validate(&self, title: &str, content: &str) -> Result<(), NoteError> {
        validate_note_input(title, content)?;
        if title.len() > MAX_TITLE_LEN {
            return Err(NoteError::Invalid("title too long".to_string()));
        }
        if content.len() > self.config.max_note_size {
            return Err(NoteError::PayloadTooLarge);
        }
        Ok(())
    }

    fn check_deadline(
        &self,
        deadline: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), NoteError> {
        match deadline {
            Some(at) if at <= now => Err(NoteError::Invalid(
                "self-destruct deadline is in the past".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

fn live_mut<'a>(
    owned: &'a mut BTreeMap<String, Note>,
    title: &str,
    now: DateTime<Utc>,
) -> Result<&'a mut Note, NoteError> {
    owned
        .get_mut(title)
        .filter(|note| !note.is_expired(now))
        .ok_or(NoteError::NotFound)
}

/// Note store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("note not found")]
    NotFound,

    #[error("a note with this title already exists")]
    AlreadyExists,

    #[error("{0}")]
    Invalid(String),

    #[error("note too large")]
    PayloadTooLarge,

    #[error("note limit reached")]
    AtCapacity,
}

impl From<cyphersafe_core::Error> for NoteError {
    fn from(err: cyphersafe_core::Error) -> Self {
        NoteError::Invalid(err.to_string())
    }
}
