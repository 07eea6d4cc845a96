//! Store transport.
//!
//! [`StoreApi`] is the seam between the client flows and the store;
//! [`HttpStore`] implements it over the JSON HTTP API. Share keys never
//! pass through this module: requests carry ciphertext and nonce only.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cyphersafe_core::api::{self, *};
use cyphersafe_core::note::validate_note_input;
use cyphersafe_core::{ExpiryMode, ShareId, ShareNonce};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Payload returned by a successful open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedShare {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Operations offered by a CypherSafe store
#[async_trait]
pub trait StoreApi: Send + Sync {
    // === Shares ===

    async fn create_share(
        &self,
        ciphertext: &[u8],
        nonce: &ShareNonce,
        mode: ExpiryMode,
    ) -> Result<ShareId>;

    async fn open_share(&self, share_id: &ShareId) -> Result<OpenedShare>;

    async fn cleanup_shares(&self) -> Result<ShareCleanupResponse>;

    // === Notes ===

    async fn create_note(
        &self,
        title: &str,
        content: &str,
        self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<NoteResponse>;

    async fn update_note(
        &self,
        title: &str,
        content: &str,
        self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<NoteResponse>;

    async fn delete_note(&self, title: &str) -> Result<()>;

    async fn get_note(&self, title: &str) -> Result<NoteResponse>;

    async fn list_notes(&self) -> Result<NoteListResponse>;

    async fn search_notes(&self, term: &str) -> Result<NoteListResponse>;

    async fn set_self_destruct_timer(
        &self,
        title: &str,
        duration_seconds: u64,
    ) -> Result<SelfDestructResponse>;

    /// Delete the caller's expired notes
    async fn cleanup_notes(&self) -> Result<usize>;

    /// Delete every owner's expired notes
    async fn delete_all_expired_notes(&self) -> Result<usize>;
}

/// [`StoreApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: Url,
    identity: Option<String>,
    client: Client,
}

impl HttpStore {
    /// Store client acting as `identity` (sent as a bearer credential).
    pub fn new(config: &ClientConfig, identity: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("cyphersafe-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            identity,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint URL; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Validation("store URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.identity {
            Some(identity) => request.bearer_auth(identity),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authorized(request).send().await?;
        read(response).await
    }
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let body = response.json::<ErrorResponse>().await.ok();
    debug!(status = status.as_u16(), "Store returned error");
    Err(Error::from_response(status, body))
}

#[async_trait]
impl StoreApi for HttpStore {
    async fn create_share(
        &self,
        ciphertext: &[u8],
        nonce: &ShareNonce,
        mode: ExpiryMode,
    ) -> Result<ShareId> {
        let (view_once, expires_at) = mode.to_wire();
        let body = CreateShareRequest {
            ciphertext: api::encode_bytes(ciphertext),
            nonce: api::encode_bytes(nonce.as_bytes()),
            expires_at,
            view_once,
        };

        let url = self.endpoint(&["v1", "shares"])?;
        let created: CreateShareResponse = self.send(self.client.post(url).json(&body)).await?;
        Ok(created.share_id)
    }

    async fn open_share(&self, share_id: &ShareId) -> Result<OpenedShare> {
        let url = self.endpoint(&["v1", "shares", share_id.as_str(), "open"])?;
        // No identity: opening needs only the id
        let response = self.client.post(url).send().await?;
        let opened: OpenShareResponse = read(response).await?;

        // Undecodable payloads fail the same way a bad key does
        let ciphertext = api::decode_bytes(&opened.ciphertext).ok_or(Error::DecryptionFailure)?;
        let nonce = api::decode_bytes(&opened.nonce).ok_or(Error::DecryptionFailure)?;
        Ok(OpenedShare { ciphertext, nonce })
    }

    async fn cleanup_shares(&self) -> Result<ShareCleanupResponse> {
        let url = self.endpoint(&["v1", "shares", "cleanup"])?;
        self.send(self.client.post(url)).await
    }

    async fn create_note(
        &self,
        title: &str,
        content: &str,
        self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<NoteResponse> {
        validate_note_input(title, content)?;
        let body = CreateNoteRequest {
            title: title.to_string(),
            content: content.to_string(),
            self_destruct_at,
        };

        let url = self.endpoint(&["v1", "notes"])?;
        self.send(self.client.post(url).json(&body)).await
    }

    async fn update_note(
        &self,
        title: &str,
        content: &str,
        self_destruct_at: Option<DateTime<Utc>>,
    ) -> Result<NoteResponse> {
        validate_note_input(title, content)?;
        let body = UpdateNoteRequest {
            content: content.to_string(),
            self_destruct_at,
        };

        let url = self.endpoint(&["v1", "notes", title])?;
        self.send(self.client.put(url).json(&body)).await
    }

    async fn delete_note(&self, title: &str) -> Result<()> {
        let url = self.endpoint(&["v1", "notes", title])?;
        let response = self.authorized(self.client.delete(url)).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.json::<ErrorResponse>().await.ok();
        Err(Error::from_response(status, body))
    }

    async fn get_note(&self, title: &str) -> Result<NoteResponse> {
        let url = self.endpoint(&["v1", "notes", title])?;
        self.send(self.client.get(url)).await
    }

    async fn list_notes(&self) -> Result<NoteListResponse> {
        let url = self.endpoint(&["v1", "notes"])?;
        self.send(self.client.get(url)).await
    }

    async fn search_notes(&self, term: &str) -> Result<NoteListResponse> {
        let url = self.endpoint(&["v1", "notes", "search"])?;
        let query = SearchQuery { q: term.to_string() };
        self.send(self.client.get(url).query(&query)).await
    }

    async fn set_self_destruct_timer(
        &self,
        title: &str,
        duration_seconds: u64,
    ) -> Result<SelfDestructResponse> {
        if duration_seconds == 0 {
            return Err(Error::Validation(
                "self-destruct duration must be positive".to_string(),
            ));
        }
        let url = self.endpoint(&["v1", "notes", title, "self-destruct"])?;
        let body = SelfDestructRequest { duration_seconds };
        self.send(self.client.post(url).json(&body)).await
    }

    async fn cleanup_notes(&self) -> Result<usize> {
        let url = self.endpoint(&["v1", "notes", "cleanup"])?;
        let response: NoteCleanupResponse = self.send(self.client.post(url)).await?;
        Ok(response.deleted)
    }

    async fn delete_all_expired_notes(&self) -> Result<usize> {
        let url = self.endpoint(&["v1", "notes", "expired"])?;
        let response: NoteCleanupResponse = self.send(self.client.delete(url)).await?;
        Ok(response.deleted)
    }
}
