//! Ephemeral key material for shared notes.
//!
//! A [`ShareKey`] exists only in the creator's memory and in the fragment
//! of the generated link. It is wiped on drop and never printed by `Debug`.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of a share key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag appended to ciphertext.
pub const TAG_SIZE: usize = 16;

/// Length of a base64-encoded key (with padding).
pub const KEY_BASE64_LEN: usize = 44;

/// Symmetric key for one shared note.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ShareKey([u8; KEY_SIZE]);

impl ShareKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, failing unless it is exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| Error::InvalidKeyEncoding)?;
        Ok(Self(arr))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Standard base64 (with padding), the form carried in share links.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse the base64 form produced by [`ShareKey::to_base64`].
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| Error::InvalidKeyEncoding)?,
        );
        Self::from_slice(&decoded)
    }
}

impl fmt::Debug for ShareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShareKey(<redacted>)")
    }
}

/// Single-use AES-GCM nonce.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ShareNonce([u8; NONCE_SIZE]);

impl ShareNonce {
    /// Wrap raw nonce bytes.
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, returning `None` unless it is exactly
    /// [`NONCE_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    /// Raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl fmt::Debug for ShareNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareNonce(")?;
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_is_44_chars() {
        let key = ShareKey::from_bytes([7u8; KEY_SIZE]);
        let encoded = key.to_base64();
        assert_eq!(encoded.len(), KEY_BASE64_LEN);
        assert!(encoded.ends_with('='));
    }

    #[test]
    fn base64_roundtrip() {
        let key = ShareKey::from_bytes(core::array::from_fn(|i| i as u8));
        let parsed = ShareKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(parsed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn from_base64_rejects_wrong_length() {
        // 16 bytes of key material
        let short = STANDARD.encode([1u8; 16]);
        assert_eq!(
            ShareKey::from_base64(&short).unwrap_err(),
            Error::InvalidKeyEncoding
        );
        assert_eq!(
            ShareKey::from_base64("not base64!!").unwrap_err(),
            Error::InvalidKeyEncoding
        );
    }

    #[test]
    fn debug_never_prints_key() {
        let key = ShareKey::from_bytes([0xAB; KEY_SIZE]);
        let debug = format!("{:?}", key);
        assert!(!debug.contains("ab"));
        assert!(!debug.contains(&key.to_base64()));
    }

    #[test]
    fn nonce_from_slice_checks_size() {
        assert!(ShareNonce::from_slice(&[0u8; NONCE_SIZE]).is_some());
        assert!(ShareNonce::from_slice(&[0u8; 11]).is_none());
        assert!(ShareNonce::from_slice(&[0u8; 13]).is_none());
    }
}
