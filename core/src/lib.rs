//! CypherSafe Core - primitives for zero-knowledge note sharing.
//!
//! This library provides:
//! - Authenticated encryption of note content (AES-256-GCM, fresh key and
//!   nonce per share)
//! - Share links that carry the key in the URL fragment only
//! - Share identifiers and the view-once / timed expiry policy
//! - Notes with self-destruct deadlines
//! - Clock abstraction, including a clock that follows the store
//! - Wire models for the store API
//!
//! # Security Properties
//!
//! - The store receives ciphertext and nonce, never the key
//! - Every share uses a new key and a new nonce
//! - Decryption either returns verified plaintext or a single,
//!   uninformative error
//! - Key material is zeroized on drop and redacted from `Debug`
//!
//! # Constraints
//!
//! This library intentionally does NOT:
//! - Access the network
//! - Perform file I/O
//! - Log anything
//!
//! # Example: Share and Open a Note
//!
//! ```
//! use cyphersafe_core::{
//!     cipher::{self, SeededCipher},
//!     link::{self, KEY_PARAM},
//!     share::ShareId,
//! };
//!
//! let codec = SeededCipher::new(1);
//!
//! // === Creator ===
//! let sealed = cipher::encrypt(&codec, b"meet at the usual place").unwrap();
//!
//! // ciphertext + nonce go to the store, which answers with an id
//! let share_id = ShareId::parse("q3Vb1X_example").unwrap();
//! let url = link::build_url("https://notes.example.com", &share_id, &sealed.key).unwrap();
//! assert!(url.as_str().starts_with("https://notes.example.com/s/q3Vb1X_example#k="));
//!
//! // === Recipient ===
//! let key = link::extract_key(url.as_str(), KEY_PARAM).unwrap();
//! let id = link::share_id_from_url(url.as_str()).unwrap();
//! assert_eq!(id, share_id);
//!
//! // the store returns ciphertext + nonce for `id`
//! let text = cipher::decrypt_text(&codec, &sealed.ciphertext, sealed.nonce.as_bytes(), &key).unwrap();
//! assert_eq!(text, "meet at the usual place");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod cipher;
pub mod clock;
pub mod error;
pub mod key;
pub mod link;
pub mod note;
pub mod share;

pub use cipher::{decrypt, decrypt_text, encrypt, Aes256GcmCipher, SealedNote, SeededCipher, ShareCipher};
pub use clock::{Clock, ManualClock, SkewedClock, SystemClock, MAX_CLOCK_SKEW_SECS};
pub use error::{Error, Result};
pub use key::{ShareKey, ShareNonce, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use link::{build_url, extract_key, share_id_from_url, KEY_PARAM};
pub use note::Note;
pub use share::{ExpiryMode, ShareId};
