//! Audit timestamps shared by every entity.
//!
//! Timestamps are stored as fixed-width RFC 3339 text with microsecond
//! precision (`2024-01-15T10:30:00.000000Z`), so ordering the text column
//! orders by time.

use std::sync::Mutex;

use chrono::{DateTime, Duration, DurationRound, NaiveDateTime, Utc};
use serde::Serialize;

/// Storage format for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Format a timestamp for storage.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts the storage format (any RFC 3339 string) and SQLite's
/// `datetime('now')` format.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn decode_stored(column: &str, text: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    parse_timestamp(text).ok_or_else(|| {
        sqlx::Error::Decode(format!("invalid timestamp in {column}: {text:?}").into())
    })
}

/// Creation and last-modification instants of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timestamps {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Timestamps for a row persisted at `at`.
    pub(crate) fn created(at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            updated_at: at,
        }
    }

    /// Rebuild timestamps from their stored text form.
    ///
    /// Text that is not a timestamp is a decode error.
    pub(crate) fn from_stored(created_at: &str, updated_at: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            created_at: decode_stored("created_at", created_at)?,
            updated_at: decode_stored("updated_at", updated_at)?,
        })
    }

    /// Stamp a write at `at`, keeping `created_at`.
    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    /// When the row was first persisted. Never changes afterwards.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the row was last written.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Source of audit stamps for one database.
///
/// Every call to [`AuditClock::now`] returns an instant strictly later than
/// the previous one, truncated to the storage precision, so two writes in
/// the same microsecond still get distinct, increasing `updated_at` values.
#[derive(Debug, Default)]
pub struct AuditClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl AuditClock {
    /// Create a new clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next audit stamp.
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now();
        let mut next = wall
            .duration_trunc(Duration::microseconds(1))
            .unwrap_or(wall);

        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(prev) = *last {
            if next <= prev {
                next = prev + Duration::microseconds(1);
            }
        }
        *last = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let formatted = format_timestamp(&whole);
        assert_eq!(formatted, "2024-01-15T10:30:00.000000Z");

        let later = whole + Duration::microseconds(1500);
        assert_eq!(format_timestamp(&later), "2024-01-15T10:30:00.001500Z");
        assert!(format_timestamp(&later) > formatted);
    }

    #[test]
    fn test_parse_round_trip() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::microseconds(42);
        assert_eq!(parse_timestamp(&format_timestamp(&dt)), Some(dt));
    }

    #[test]
    fn test_parse_sqlite_format() {
        let parsed = parse_timestamp("2024-01-15 10:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_from_stored() {
        let ts = Timestamps::from_stored("2024-01-15T10:30:00.000000Z", "2024-01-15 10:31:00")
            .unwrap();
        assert_eq!(
            ts.created_at(),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
        assert_eq!(
            ts.updated_at(),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 31, 0).unwrap()
        );
    }

    #[test]
    fn test_from_stored_rejects_garbage() {
        let err = Timestamps::from_stored("bogus", "2024-01-15 10:30:00").unwrap_err();
        assert!(matches!(err, sqlx::Error::Decode(_)));
        assert!(err.to_string().contains("created_at"));

        let err = Timestamps::from_stored("2024-01-15 10:30:00", "").unwrap_err();
        assert!(err.to_string().contains("updated_at"));
    }

    #[test]
    fn test_clock_strictly_increases() {
        let clock = AuditClock::new();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_created_sets_both_fields() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ts = Timestamps::created(at);
        assert_eq!(ts.created_at(), at);
        assert_eq!(ts.updated_at(), at);
    }
}
