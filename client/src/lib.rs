//! CypherSafe Client - share notes without showing them to the store.
//!
//! This library provides:
//! - [`HttpStore`]: the store API over HTTP, behind the [`StoreApi`] trait
//! - [`sharing`]: encrypt-then-store and fetch-then-decrypt flows
//! - [`SelfDestructPoller`]: best-effort removal of expired notes
//! - [`Session`]: per-user context owning the transport, a clock that
//!   follows the store, and the poller
//!
//! # Example
//!
//! ```no_run
//! use cyphersafe_client::{ClientConfig, Session, ShareExpiry};
//!
//! # async fn run() -> cyphersafe_client::Result<()> {
//! let config = ClientConfig::new("https://api.example.com", "https://notes.example.com")?;
//! let mut session = Session::connect(config, "principal-abc")?;
//!
//! let note = session.create_note("Door code", "4711", None).await?;
//! let link = session.share_note(&note, ShareExpiry::ViewOnce).await?;
//! println!("send this: {}", link.url);
//!
//! let _live_notes = session.start_cleanup();
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod cleanup;
pub mod config;
pub mod error;
pub mod session;
pub mod sharing;
pub mod transport;

#[cfg(test)]
mod fake;

pub use cleanup::{run_cleanup_cycle, CleanupOutcome, PollerHandle, SelfDestructPoller};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use session::Session;
pub use sharing::{open_shared, share_note, ShareExpiry, SharedLink};
pub use transport::{HttpStore, OpenedShare, StoreApi};
