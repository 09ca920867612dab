//! # Temporal Types
//!
//! Millisecond-resolution UTC timestamps. Every time gate in the ledger
//! (sale window end, refund cutoff, close eligibility) is expressed in
//! milliseconds since the Unix epoch, so the timestamp stores exactly that
//! and converts to `chrono` only for presentation and parsing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Milliseconds in one minute. Schedule offsets are given in minutes.
pub const MILLIS_PER_MINUTE: u64 = 60_000;

/// Milliseconds in one hour. The default refund cutoff.
pub const MILLIS_PER_HOUR: u64 = 3_600_000;

/// A UTC instant, in milliseconds since the Unix epoch.
///
/// Serializes as a bare integer. Ordering is the natural time ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Create a timestamp from milliseconds since the epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// The current UTC time. Instants before the epoch clamp to the epoch.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Convert from a `chrono::DateTime<Utc>`, clamping pre-epoch instants.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(u64::try_from(dt.timestamp_millis()).unwrap_or(0))
    }

    /// Convert to a `chrono::DateTime<Utc>`, if representable.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// Parse an RFC 3339 string (any offset is normalized to UTC).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string does not
    /// parse or lies before the epoch.
    pub fn parse_rfc3339(value: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(value).map_err(|e| {
            ValidationError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            }
        })?;
        let millis = dt.timestamp_millis();
        u64::try_from(millis)
            .map(Self)
            .map_err(|_| ValidationError::InvalidTimestamp {
                value: value.to_string(),
                reason: "before the Unix epoch".to_string(),
            })
    }

    /// Add milliseconds, returning `None` on overflow.
    pub fn checked_add_millis(self, millis: u64) -> Option<Self> {
        self.0.checked_add(millis).map(Self)
    }

    /// Add whole minutes, returning `None` on overflow.
    pub fn checked_add_minutes(self, minutes: u64) -> Option<Self> {
        minutes
            .checked_mul(MILLIS_PER_MINUTE)
            .and_then(|millis| self.checked_add_millis(millis))
    }

    /// Subtract milliseconds, stopping at the epoch.
    pub fn saturating_sub_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_sub(millis))
    }

    /// RFC 3339 rendering with millisecond precision and a `Z` suffix,
    /// or a raw millisecond count when the instant is out of `chrono`'s range.
    pub fn to_canonical_string(self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => format!("{}ms", self.0),
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_offsets_convert_to_millis() {
        let base = Timestamp::from_millis(1_000);
        assert_eq!(
            base.checked_add_minutes(2),
            Some(Timestamp::from_millis(121_000))
        );
    }

    #[test]
    fn minute_offsets_overflow_is_detected() {
        assert_eq!(Timestamp::from_millis(0).checked_add_minutes(u64::MAX), None);
        assert_eq!(
            Timestamp::from_millis(u64::MAX).checked_add_minutes(1),
            None
        );
    }

    #[test]
    fn saturating_sub_stops_at_epoch() {
        let t = Timestamp::from_millis(10);
        assert_eq!(t.saturating_sub_millis(MILLIS_PER_HOUR), Timestamp::EPOCH);
    }

    #[test]
    fn canonical_string_has_millis_and_z() {
        let t = Timestamp::from_millis(1_767_225_600_123);
        assert_eq!(t.to_canonical_string(), "2026-01-01T00:00:00.123Z");
    }

    #[test]
    fn parse_rfc3339_normalizes_offsets() {
        let t = Timestamp::parse_rfc3339("2026-01-01T01:00:00+01:00").unwrap();
        assert_eq!(t, Timestamp::from_millis(1_767_225_600_000));
    }

    #[test]
    fn parse_rfc3339_rejects_garbage_and_pre_epoch() {
        assert!(Timestamp::parse_rfc3339("tomorrow").is_err());
        assert!(Timestamp::parse_rfc3339("1969-12-31T23:59:59Z").is_err());
    }

    #[test]
    fn datetime_roundtrip() {
        let t = Timestamp::from_millis(1_700_000_000_456);
        let dt = t.to_datetime().unwrap();
        assert_eq!(Timestamp::from_datetime(dt), t);
    }

    #[test]
    fn now_is_after_2020() {
        assert!(Timestamp::now() > Timestamp::from_millis(1_577_836_800_000));
    }
}
