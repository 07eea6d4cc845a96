//! Share link construction and parsing.
//!
//! ```text
//! https://<origin>/s/<shareId>#k=<percent-encoded base64 key>
//! ```
//!
//! The id lives in the path and is the only part a server ever sees. The
//! key lives in the fragment, which browsers and HTTP clients keep local:
//! it is never part of a request line or header.

use crate::error::{Error, Result};
use crate::key::ShareKey;
use crate::share::ShareId;
use url::{form_urlencoded, Url};
use zeroize::Zeroizing;

/// Path segment that precedes the share id.
pub const SHARE_PATH_PREFIX: &str = "s";

/// Fragment parameter carrying the key.
pub const KEY_PARAM: &str = "k";

/// Build the link a recipient opens.
///
/// `origin` must be an absolute http(s) URL. Any path, query or fragment
/// it carries is replaced.
pub fn build_url(origin: &str, share_id: &ShareId, key: &ShareKey) -> Result<Url> {
    let mut url = Url::parse(origin).map_err(|e| Error::InvalidUrl {
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::InvalidUrl {
            reason: format!("origin must be http(s) with a host, got {}", url.scheme()),
        });
    }

    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| Error::InvalidUrl {
            reason: "origin cannot be a base".to_string(),
        })?
        .clear()
        .push(SHARE_PATH_PREFIX)
        .push(share_id.as_str());

    let encoded_key = Zeroizing::new(key.to_base64());
    let fragment: Zeroizing<String> = Zeroizing::new(
        form_urlencoded::Serializer::new(String::new())
            .append_pair(KEY_PARAM, &encoded_key)
            .finish(),
    );
    url.set_fragment(Some(&fragment));

    Ok(url)
}

/// Read the key out of the fragment of `current_url`.
///
/// Only the fragment is inspected; a key smuggled into the path or query
/// is ignored. Returns `None` when the parameter is missing or does not
/// decode to a 32-byte key.
pub fn extract_key(current_url: &str, param_name: &str) -> Option<ShareKey> {
    let url = Url::parse(current_url).ok()?;
    let fragment = url.fragment()?;

    // A literal '+' is part of the base64 alphabet, not an encoded space.
    let fragment = Zeroizing::new(fragment.replace('+', "%2B"));

    form_urlencoded::parse(fragment.as_bytes())
        .find(|(name, _)| name == param_name)
        .and_then(|(_, value)| {
            let value = Zeroizing::new(value.into_owned());
            ShareKey::from_base64(&value).ok()
        })
}

/// Read the share id from the `/s/<id>` path of a link.
pub fn share_id_from_url(current_url: &str) -> Option<ShareId> {
    let url = Url::parse(current_url).ok()?;
    let mut segments = url.path_segments()?;
    if segments.next()? != SHARE_PATH_PREFIX {
        return None;
    }
    ShareId::parse(segments.next()?).ok()
}
