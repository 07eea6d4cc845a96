//! Share and open flows.
//!
//! Creator: encrypt locally, hand ciphertext + nonce to the store, put the
//! returned id and the key into a link. Recipient: take id and key from the
//! link, fetch ciphertext + nonce, decrypt locally. The key never leaves
//! this process except inside the link's fragment.

use crate::error::{Error, Result};
use crate::transport::StoreApi;
use chrono::{DateTime, Duration, Utc};
use cyphersafe_core::{cipher, link, ExpiryMode, ShareCipher, ShareId, KEY_PARAM};
use tracing::{debug, info};
use url::Url;

/// Expiry choices offered when sharing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareExpiry {
    /// Opens exactly once
    ViewOnce,
    /// Opens any number of times for an hour
    OneHour,
    /// Opens any number of times for a day
    OneDay,
    /// Opens any number of times for the given duration
    Custom(Duration),
}

impl ShareExpiry {
    /// Store policy for this choice, with deadlines measured from `now`.
    ///
    /// A custom duration whose deadline cannot be represented is a
    /// [`Error::Validation`].
    pub fn to_mode(self, now: DateTime<Utc>) -> Result<ExpiryMode> {
        let mode = match self {
            ShareExpiry::ViewOnce => ExpiryMode::ViewOnce,
            ShareExpiry::OneHour => ExpiryMode::timed_for(now, Duration::hours(1))?,
            ShareExpiry::OneDay => ExpiryMode::timed_for(now, Duration::hours(24))?,
            ShareExpiry::Custom(duration) => ExpiryMode::timed_for(now, duration)?,
        };
        Ok(mode)
    }
}

/// A created share
#[derive(Debug, Clone)]
pub struct SharedLink {
    /// Full link, key in the fragment
    pub url: Url,
    pub share_id: ShareId,
    pub mode: ExpiryMode,
}

/// Encrypt `content`, store it, and build the share link on `origin`.
pub async fn share_note<S, C>(
    store: &S,
    codec: &C,
    origin: &str,
    content: &str,
    mode: ExpiryMode,
) -> Result<SharedLink>
where
    S: StoreApi + ?Sized,
    C: ShareCipher + ?Sized,
{
    if content.trim().is_empty() {
        return Err(Error::Validation("cannot share an empty note".to_string()));
    }

    let sealed = cipher::encrypt(codec, content.as_bytes())?;
    let share_id = store
        .create_share(&sealed.ciphertext, &sealed.nonce, mode)
        .await?;
    let url = link::build_url(origin, &share_id, &sealed.key)?;

    info!(
        share = share_id.log_prefix(),
        view_once = matches!(mode, ExpiryMode::ViewOnce),
        "Share link created"
    );

    Ok(SharedLink {
        url,
        share_id,
        mode,
    })
}

/// Open a share link and return the decrypted note text.
///
/// The id is read from the path and the key from the fragment; only the id
/// is sent to the store.
pub async fn open_shared<S, C>(store: &S, codec: &C, share_url: &str) -> Result<String>
where
    S: StoreApi + ?Sized,
    C: ShareCipher + ?Sized,
{
    let share_id = link::share_id_from_url(share_url)
        .ok_or_else(|| Error::InvalidLink("missing share id".to_string()))?;
    let key = link::extract_key(share_url, KEY_PARAM)
        .ok_or_else(|| Error::InvalidLink("missing or malformed key".to_string()))?;

    let opened = store.open_share(&share_id).await?;
    let text = cipher::decrypt_text(codec, &opened.ciphertext, &opened.nonce, &key)?;

    debug!(share = share_id.log_prefix(), "Share opened");
    Ok(text)
}
