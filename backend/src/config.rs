//! Configuration for the CypherSafe store.
//!
//! All configuration is loaded from environment variables.
//! No secrets are logged.

use crate::notes::MAX_TITLE_LEN;
use std::time::Duration;

/// Longest accepted timed share (7 days)
pub const DEFAULT_MAX_SHARE_TTL_SECS: u64 = 7 * 24 * 3600;

/// Longest accepted self-destruct timer (365 days)
pub const DEFAULT_MAX_SELF_DESTRUCT_SECS: u64 = 365 * 24 * 3600;

/// Worst-case growth of text inside a JSON string (`\u0001`)
const JSON_ESCAPE_FACTOR: usize = 6;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,

    /// Server port
    pub port: u16,

    // === Share Store ===
    /// Maximum ciphertext size in bytes (default: 64KB)
    pub max_ciphertext_size: usize,

    /// Maximum live shares plus tombstones (default: 100,000)
    pub max_shares: usize,

    /// Longest timed share accepted (default: 7 days)
    pub max_share_ttl: Duration,

    /// How long consumed/expired markers are kept (default: 24 hours)
    pub tombstone_ttl: Duration,

    // === Notes ===
    /// Maximum note content size in bytes (default: 64KB)
    pub max_note_size: usize,

    /// Maximum notes per owner (default: 1,000)
    pub max_notes_per_owner: usize,

    /// Longest self-destruct timer accepted (default: 365 days)
    pub max_self_destruct: Duration,

    // === Sweeper ===
    /// Interval of the authoritative sweep (default: 10 seconds)
    pub sweep_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT").unwrap_or(8080),

            max_ciphertext_size: env_parse("MAX_CIPHERTEXT_SIZE").unwrap_or(64 * 1024),
            max_shares: env_parse("MAX_SHARES").unwrap_or(100_000),
            max_share_ttl: Duration::from_secs(
                env_parse("MAX_SHARE_TTL_SECS").unwrap_or(DEFAULT_MAX_SHARE_TTL_SECS),
            ),
            tombstone_ttl: Duration::from_secs(
                env_parse("TOMBSTONE_TTL_SECS").unwrap_or(24 * 3600), // 24 hours
            ),

            max_note_size: env_parse("MAX_NOTE_SIZE").unwrap_or(64 * 1024),
            max_notes_per_owner: env_parse("MAX_NOTES_PER_OWNER").unwrap_or(1_000),
            max_self_destruct: Duration::from_secs(
                env_parse("MAX_SELF_DESTRUCT_SECS").unwrap_or(DEFAULT_MAX_SELF_DESTRUCT_SECS),
            ),

            sweep_interval: Duration::from_secs(env_parse("SWEEP_INTERVAL_SECS").unwrap_or(10)),
        }
    }

    /// Request body limit derived from the payload limits.
    ///
    /// Share ciphertext is base64 (4/3). Note text is a JSON string, where
    /// an escaped control character takes six bytes. The rest is framing.
    /// Exact size limits are enforced by the stores.
    pub fn max_body_size(&self) -> usize {
        let share = self.max_ciphertext_size.div_ceil(3) * 4;
        let note = (self.max_note_size + MAX_TITLE_LEN) * JSON_ESCAPE_FACTOR;
        share.max(note) + 4 * 1024
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_covers_base64_payload() {
        let mut config = Config::from_env();
        config.max_ciphertext_size = 30 * 1024;
        config.max_note_size = 1024;
        assert_eq!(config.max_body_size(), 40 * 1024 + 4 * 1024);
    }

    #[test]
    fn body_limit_covers_escaped_note_text() {
        let mut config = Config::from_env();
        config.max_ciphertext_size = 1024;
        config.max_note_size = 1024;

        let content = "\u{1}".repeat(config.max_note_size);
        let title = "\"".repeat(MAX_TITLE_LEN);
        let body = serde_json::json!({ "title": title, "content": content }).to_string();
        assert!(body.len() <= config.max_body_size());
    }
}
