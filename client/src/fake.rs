//! In-process [`StoreApi`] for unit tests.

use crate::error::{Error, Result};
use crate::transport::{OpenedShare, StoreApi};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cyphersafe_core::api::*;
use cyphersafe_core::{ExpiryMode, Note, ShareId, ShareNonce};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub(crate) struct FakeStore {
    shares: Mutex<HashMap<String, (OpenedShare, ExpiryMode, bool)>>,
    notes: Mutex<BTreeMap<String, Note>>,
    /// Store clock; `None` follows the wall clock
    server_time: Mutex<Option<DateTime<Utc>>>,
    payloads: Mutex<Vec<Vec<u8>>>,
    deletes: Mutex<Vec<String>>,
    opens: AtomicUsize,
    /// Titles whose delete reports NoteNotFound, as if already swept
    vanished: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn received_payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn open_calls(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn set_server_time(&self, at: DateTime<Utc>) {
        *self.server_time.lock().unwrap() = Some(at);
    }

    pub fn insert_note(&self, note: Note) {
        self.notes.lock().unwrap().insert(note.title.clone(), note);
    }

    /// Make the next delete of `title` report NoteNotFound
    pub fn vanish(&self, title: &str) {
        self.vanished.lock().unwrap().push(title.to_string());
    }

    fn now(&self) -> DateTime<Utc> {
        self.server_time.lock().unwrap().unwrap_or_else(Utc::now)
    }
}

fn unsupported() -> Error {
    Error::Rejected {
        status: 501,
        code: "UNSUPPORTED".to_string(),
        message: "not implemented by the fake store".to_string(),
    }
}

#[async_trait]
impl StoreApi for FakeStore {
    async fn create_share(
        &self,
        ciphertext: &[u8],
        nonce: &ShareNonce,
        mode: ExpiryMode,
    ) -> Result<ShareId> {
        let mut payloads = self.payloads.lock().unwrap();
        payloads.push(ciphertext.to_vec());
        payloads.push(nonce.as_bytes().to_vec());

        let mut shares = self.shares.lock().unwrap();
        let id = ShareId::parse(&format!("fake-{}", shares.len())).unwrap();
        let opened = OpenedShare {
            ciphertext: ciphertext.to_vec(),
            nonce: nonce.as_bytes().to_vec(),
        };
        shares.insert(id.as_str().to_string(), (opened, mode, false));
        Ok(id)
    }

    async fn open_share(&self, share_id: &ShareId) -> Result<OpenedShare> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let now = self.now();
        let mut shares = self.shares.lock().unwrap();
        let (opened, mode, consumed) = shares
            .get_mut(share_id.as_str())
            .ok_or(Error::LinkNotFound)?;

        if *consumed {
            return Err(Error::LinkAlreadyConsumed);
        }
        if mode.is_expired_at(now) {
            return Err(Error::LinkExpired);
        }
        if matches!(mode, ExpiryMode::ViewOnce) {
            *consumed = true;
        }
        Ok(opened.clone())
    }

    async fn cleanup_shares(&self) -> Result<ShareCleanupResponse> {
        Err(unsupported())
    }

    async fn create_note(
        &self,
        title: &str,
        content: &str,
        self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<NoteResponse> {
        let now = self.now();
        let note = Note {
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            last_modified: now,
            self_destruct_at,
        };
        let mut notes = self.notes.lock().unwrap();
        if notes.contains_key(title) {
            return Err(Error::NoteAlreadyExists);
        }
        notes.insert(title.to_string(), note.clone());
        Ok(NoteResponse {
            note,
            server_time: now,
        })
    }

    async fn update_note(
        &self,
        _title: &str,
        _content: &str,
        _self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<NoteResponse> {
        Err(unsupported())
    }

    async fn delete_note(&self, title: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(title.to_string());
        let mut vanished = self.vanished.lock().unwrap();
        if let Some(pos) = vanished.iter().position(|t| t == title) {
            vanished.remove(pos);
            self.notes.lock().unwrap().remove(title);
            return Err(Error::NoteNotFound);
        }
        self.notes
            .lock()
            .unwrap()
            .remove(title)
            .map(|_| ())
            .ok_or(Error::NoteNotFound)
    }

    async fn get_note(&self, title: &str) -> Result<NoteResponse> {
        let note = self
            .notes
            .lock()
            .unwrap()
            .get(title)
            .cloned()
            .ok_or(Error::NoteNotFound)?;
        Ok(NoteResponse {
            note,
            server_time: self.now(),
        })
    }

    /// Returns every note, expired ones included, like a store whose
    /// sweep has not run yet and that does not filter on read.
    async fn list_notes(&self) -> Result<NoteListResponse> {
        Ok(NoteListResponse {
            notes: self.notes.lock().unwrap().values().cloned().collect(),
            server_time: self.now(),
        })
    }

    async fn search_notes(&self, _term: &str) -> Result<NoteListResponse> {
        Err(unsupported())
    }

    async fn set_self_destruct_timer(
        &self,
        _title: &str,
        _duration_seconds: u64,
    ) -> Result<SelfDestructResponse> {
        Err(unsupported())
    }

    async fn cleanup_notes(&self) -> Result<usize> {
        Err(unsupported())
    }

    async fn delete_all_expired_notes(&self) -> Result<usize> {
        Err(unsupported())
    }
}
