//! Notes and self-destruct deadlines.
//!
//! A note with a deadline stays fully usable until `now >= deadline`.
//! From that instant it must be treated as gone, whether or not the
//! store's sweep has deleted it yet.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A note as stored for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique within the owner's namespace.
    pub title: String,
    /// Plaintext content.
    pub content: String,
    /// Store time of creation.
    pub created_at: DateTime<Utc>,
    /// Store time of the last update.
    pub last_modified: DateTime<Utc>,
    /// Self-destruct deadline, if one is set.
    #[serde(default)]
    pub self_destruct_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Whether the deadline has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.self_destruct_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    /// Time left before self-destruct, clamped at zero.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self.self_destruct_at {
            Some(deadline) if deadline > now => Some(deadline - now),
            Some(_) => Some(Duration::zero()),
            None => None,
        }
    }
}

/// Reject empty titles and content before anything leaves the process.
pub fn validate_note_input(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::EmptyTitle);
    }
    if content.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(())
}

/// Deadline `duration_secs` after `now`, bounded by `max_secs`.
pub fn deadline_after(now: DateTime<Utc>, duration_secs: u64, max_secs: u64) -> Result<DateTime<Utc>> {
    if duration_secs == 0 || duration_secs > max_secs {
        return Err(Error::InvalidDuration {
            seconds: duration_secs,
        });
    }
    let invalid = Error::InvalidDuration {
        seconds: duration_secs,
    };
    let secs = i64::try_from(duration_secs).map_err(|_| invalid.clone())?;
    Duration::try_seconds(secs)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or(invalid)
}

/// Split notes into those still live at `now` and the titles of those
/// past their deadline.
pub fn partition_expired(notes: Vec<Note>, now: DateTime<Utc>) -> (Vec<Note>, Vec<String>) {
    let mut live = Vec::with_capacity(notes.len());
    let mut expired = Vec::new();
    for note in notes {
        if note.is_expired(now) {
            expired.push(note.title);
        } else {
            live.push(note);
        }
    }
    (live, expired)
}

/// Countdown label for a note's deadline: `Expired`, `2d 3h`, `4h 10m`,
/// `7m` or `42s`. `None` when no deadline is set.
pub fn countdown_label(note: &Note, now: DateTime<Utc>) -> Option<String> {
    let remaining = note.time_remaining(now)?;
    let seconds = remaining.num_seconds();
    if seconds <= 0 {
        return Some("Expired".to_string());
    }

    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    Some(if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str, deadline: Option<DateTime<Utc>>) -> Note {
        let now = Utc::now();
        Note {
            title: title.to_string(),
            content: "body".to_string(),
            created_at: now,
            last_modified: now,
            self_destruct_at: deadline,
        }
    }

    #[test]
    fn readable_until_deadline() {
        let now = Utc::now();
        let n = note("a", Some(now + Duration::seconds(5)));

        assert!(!n.is_expired(now));
        assert!(!n.is_expired(now + Duration::seconds(4)));
        assert!(n.is_expired(now + Duration::seconds(5)));
        assert!(!note("b", None).is_expired(now + Duration::days(10_000)));
    }

    #[test]
    fn time_remaining_clamps() {
        let now = Utc::now();
        let n = note("a", Some(now + Duration::seconds(5)));

        assert_eq!(n.time_remaining(now), Some(Duration::seconds(5)));
        assert_eq!(
            n.time_remaining(now + Duration::seconds(9)),
            Some(Duration::zero())
        );
        assert_eq!(note("b", None).time_remaining(now), None);
    }

    #[test]
    fn validation() {
        assert_eq!(validate_note_input("", "x"), Err(Error::EmptyTitle));
        assert_eq!(validate_note_input("  ", "x"), Err(Error::EmptyTitle));
        assert_eq!(validate_note_input("t", "\n"), Err(Error::EmptyContent));
        assert!(validate_note_input("t", "x").is_ok());
    }

    #[test]
    fn deadline_bounds() {
        let now = Utc::now();
        assert_eq!(
            deadline_after(now, 60, 3600).unwrap(),
            now + Duration::seconds(60)
        );
        assert!(deadline_after(now, 0, 3600).is_err());
        assert!(deadline_after(now, 3601, 3600).is_err());
        assert!(deadline_after(now, u64::MAX, u64::MAX).is_err());
    }

    #[test]
    fn partition_splits_on_deadline() {
        let now = Utc::now();
        let notes = vec![
            note("keep", None),
            note("gone", Some(now - Duration::seconds(1))),
            note("soon", Some(now + Duration::seconds(1))),
        ];

        let (live, expired) = partition_expired(notes, now);
        let titles: Vec<_> = live.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["keep", "soon"]);
        assert_eq!(expired, vec!["gone".to_string()]);
    }

    #[test]
    fn missing_deadline_deserializes_as_none() {
        let json = r#"{"title":"t","content":"c","created_at":"2026-01-01T00:00:00Z","last_modified":"2026-01-01T00:00:00Z"}"#;
        let n: Note = serde_json::from_str(json).unwrap();
        assert_eq!(n.self_destruct_at, None);
    }

    #[test]
    fn countdown_labels() {
        let now = Utc::now();
        let at = |secs: i64| note("n", Some(now + Duration::seconds(secs)));

        assert_eq!(countdown_label(&note("n", None), now), None);
        assert_eq!(countdown_label(&at(0), now).as_deref(), Some("Expired"));
        assert_eq!(countdown_label(&at(42), now).as_deref(), Some("42s"));
        assert_eq!(countdown_label(&at(7 * 60 + 5), now).as_deref(), Some("7m"));
        assert_eq!(countdown_label(&at(4 * 3600 + 600), now).as_deref(), Some("4h 10m"));
        assert_eq!(countdown_label(&at(2 * 86400 + 3 * 3600), now).as_deref(), Some("2d 3h"));
    }
}
