//! Authenticated encryption of note content for sharing.
//!
//! Every call to [`encrypt`] draws a fresh 256-bit key and a fresh 96-bit
//! nonce, seals the plaintext with AES-256-GCM and hands all three back to
//! the caller. Nothing is retained.
//!
//! The primitive sits behind the [`ShareCipher`] trait. Production code
//! uses [`Aes256GcmCipher`] (OS randomness); tests can use
//! [`SeededCipher`], which produces the same sequence of keys and nonces
//! for the same seed.
//!
//! # Wire Format
//!
//! ```text
//! ciphertext = AES-256-GCM(key, nonce, plaintext) || tag (16 bytes)
//! ```

use crate::error::{Error, Result};
use crate::key::{ShareKey, ShareNonce, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Capability interface over the platform AEAD.
pub trait ShareCipher: Send + Sync {
    /// Generate a fresh key.
    fn generate_key(&self) -> Result<ShareKey>;

    /// Generate a fresh nonce.
    fn generate_nonce(&self) -> Result<ShareNonce>;

    /// Encrypt and append the authentication tag.
    fn seal(&self, key: &ShareKey, nonce: &ShareNonce, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Verify the tag and decrypt. Any failure is [`Error::DecryptionFailure`].
    fn open(&self, key: &ShareKey, nonce: &ShareNonce, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// AES-256-GCM with keys and nonces from the operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256GcmCipher;

impl ShareCipher for Aes256GcmCipher {
    fn generate_key(&self) -> Result<ShareKey> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::EntropyUnavailable)?;
        let key = ShareKey::from_bytes(bytes);
        zeroize::Zeroize::zeroize(&mut bytes);
        Ok(key)
    }

    fn generate_nonce(&self) -> Result<ShareNonce> {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::EntropyUnavailable)?;
        Ok(ShareNonce::from_bytes(bytes))
    }

    fn seal(&self, key: &ShareKey, nonce: &ShareNonce, plaintext: &[u8]) -> Result<Vec<u8>> {
        aead_seal(key, nonce, plaintext)
    }

    fn open(&self, key: &ShareKey, nonce: &ShareNonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
        aead_open(key, nonce, ciphertext)
    }
}

/// Deterministic test double.
///
/// Keys and nonces come from a `StdRng` seeded with `seed`. The stream only
/// moves forward, so one instance never hands out the same key or nonce
/// twice; two instances with the same seed hand out the same sequence.
/// Not for production use.
#[derive(Debug)]
pub struct SeededCipher {
    rng: Mutex<StdRng>,
}

impl SeededCipher {
    /// Create a cipher whose randomness is fully determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn fill(&self, dest: &mut [u8]) {
        self.rng.lock().fill_bytes(dest);
    }
}

impl ShareCipher for SeededCipher {
    fn generate_key(&self) -> Result<ShareKey> {
        let mut bytes = [0u8; KEY_SIZE];
        self.fill(&mut bytes);
        Ok(ShareKey::from_bytes(bytes))
    }

    fn generate_nonce(&self) -> Result<ShareNonce> {
        let mut bytes = [0u8; NONCE_SIZE];
        self.fill(&mut bytes);
        Ok(ShareNonce::from_bytes(bytes))
    }

    fn seal(&self, key: &ShareKey, nonce: &ShareNonce, plaintext: &[u8]) -> Result<Vec<u8>> {
        aead_seal(key, nonce, plaintext)
    }

    fn open(&self, key: &ShareKey, nonce: &ShareNonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
        aead_open(key, nonce, ciphertext)
    }
}

fn aead_seal(key: &ShareKey, nonce: &ShareNonce, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| Error::EncryptionFailed)?;
    cipher
        .encrypt(Nonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|_| Error::EncryptionFailed)
}

fn aead_open(key: &ShareKey, nonce: &ShareNonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| Error::DecryptionFailure)?;
    cipher
        .decrypt(Nonce::from_slice(nonce.as_bytes()), ciphertext)
        .map_err(|_| Error::DecryptionFailure)
}

/// Output of [`encrypt`]: everything needed to build a share.
///
/// `ciphertext` and `nonce` go to the store; `key` goes only into the
/// link fragment.
#[derive(Debug, Clone)]
pub struct SealedNote {
    /// Ciphertext with the 16-byte tag appended.
    pub ciphertext: Vec<u8>,
    /// Nonce used for this encryption.
    pub nonce: ShareNonce,
    /// Freshly generated key.
    pub key: ShareKey,
}

/// Encrypt `plaintext` under a fresh key and nonce.
pub fn encrypt<C: ShareCipher + ?Sized>(cipher: &C, plaintext: &[u8]) -> Result<SealedNote> {
    let key = cipher.generate_key()?;
    let nonce = cipher.generate_nonce()?;
    let ciphertext = cipher.seal(&key, &nonce, plaintext)?;
    Ok(SealedNote {
        ciphertext,
        nonce,
        key,
    })
}

/// Decrypt raw parts as received from the store and the link fragment.
///
/// Malformed sizes and failed verification both return
/// [`Error::DecryptionFailure`]; there is no partial output.
pub fn decrypt<C: ShareCipher + ?Sized>(
    cipher: &C,
    ciphertext: &[u8],
    nonce: &[u8],
    key: &[u8],
) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(Error::DecryptionFailure);
    }
    let nonce = ShareNonce::from_slice(nonce).ok_or(Error::DecryptionFailure)?;
    let key = ShareKey::from_slice(key).map_err(|_| Error::DecryptionFailure)?;
    cipher.open(&key, &nonce, ciphertext)
}

/// Decrypt and interpret the result as UTF-8 note text.
pub fn decrypt_text<C: ShareCipher + ?Sized>(
    cipher: &C,
    ciphertext: &[u8],
    nonce: &[u8],
    key: &ShareKey,
) -> Result<String> {
    let plaintext = decrypt(cipher, ciphertext, nonce, key.as_bytes())?;
    String::from_utf8(plaintext).map_err(|_| Error::InvalidUtf8)
}
