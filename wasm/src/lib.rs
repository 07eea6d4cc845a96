//! WebAssembly bindings for the CypherSafe share codec.
//!
//! The browser viewer uses these to encrypt before upload, to build share
//! links, and to decrypt after opening one. Binary values cross the
//! boundary as standard base64 strings, the same encoding the store API
//! uses, so results can go straight into request bodies.
//!
//! Keys only ever travel between these functions and the link fragment.

use cyphersafe_core::api::{decode_bytes, encode_bytes};
use cyphersafe_core::{cipher, link, Aes256GcmCipher, ShareId, ShareKey};
use wasm_bindgen::prelude::*;

/// Output of [`encrypt_note`]
#[wasm_bindgen]
pub struct EncryptedNote {
    ciphertext: String,
    nonce: String,
    key: String,
}

#[wasm_bindgen]
impl EncryptedNote {
    /// Base64 ciphertext with tag, for the store
    #[wasm_bindgen(getter)]
    pub fn ciphertext(&self) -> String {
        self.ciphertext.clone()
    }

    /// Base64 nonce, for the store
    #[wasm_bindgen(getter)]
    pub fn nonce(&self) -> String {
        self.nonce.clone()
    }

    /// Base64 key, for the link only
    #[wasm_bindgen(getter)]
    pub fn key(&self) -> String {
        self.key.clone()
    }
}

// === Encryption ===

/// Encrypt note text under a fresh key and nonce.
#[wasm_bindgen(js_name = encryptNote)]
pub fn encrypt_note(plaintext: &str) -> Result<EncryptedNote, JsError> {
    let sealed = cipher::encrypt(&Aes256GcmCipher, plaintext.as_bytes())
        .map_err(|e| JsError::new(&e.to_string()))?;

    Ok(EncryptedNote {
        ciphertext: encode_bytes(&sealed.ciphertext),
        nonce: encode_bytes(sealed.nonce.as_bytes()),
        key: sealed.key.to_base64(),
    })
}

/// Decrypt an opened share.
///
/// Every failure, including undecodable base64, throws the same
/// "decryption failed" error.
#[wasm_bindgen(js_name = decryptNote)]
pub fn decrypt_note(ciphertext: &str, nonce: &str, key: &str) -> Result<String, JsError> {
    decrypt_parts(ciphertext, nonce, key).ok_or_else(|| {
        JsError::new(&cyphersafe_core::Error::DecryptionFailure.to_string())
    })
}

fn decrypt_parts(ciphertext: &str, nonce: &str, key: &str) -> Option<String> {
    let ciphertext = decode_bytes(ciphertext)?;
    let nonce = decode_bytes(nonce)?;
    let key = ShareKey::from_base64(key).ok()?;
    cipher::decrypt_text(&Aes256GcmCipher, &ciphertext, &nonce, &key).ok()
}

// === Share Links ===

/// Build `<origin>/s/<shareId>#k=<key>`.
#[wasm_bindgen(js_name = buildShareUrl)]
pub fn build_share_url(origin: &str, share_id: &str, key: &str) -> Result<String, JsError> {
    let share_id = ShareId::parse(share_id).map_err(|e| JsError::new(&e.to_string()))?;
    let key = ShareKey::from_base64(key).map_err(|e| JsError::new(&e.to_string()))?;
    link::build_url(origin, &share_id, &key)
        .map(String::from)
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Read the base64 key from a link's fragment, if present and well-formed.
#[wasm_bindgen(js_name = extractShareKey)]
pub fn extract_share_key(current_url: &str, param_name: &str) -> Option<String> {
    link::extract_key(current_url, param_name).map(|key| key.to_base64())
}

/// Read the share id from a link's `/s/<id>` path.
#[wasm_bindgen(js_name = shareIdFromUrl)]
pub fn share_id_from_url(current_url: &str) -> Option<String> {
    link::share_id_from_url(current_url).map(String::from)
}
