//! # Validation Errors
//!
//! Errors raised while constructing domain primitives. Each variant carries
//! the rejected input and the expected shape, so a substrate can report the
//! problem to its caller without re-deriving the rule.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account identifier is empty, too long, or contains whitespace or
    /// control characters.
    #[error("invalid account ID: \"{0}\" (expected 1-128 characters, no whitespace or control characters)")]
    InvalidAccountId(String),

    /// Station name is empty, too long, or padded with whitespace.
    #[error("invalid station name: \"{0}\" (expected 1-64 characters without leading or trailing whitespace)")]
    InvalidStationName(String),

    /// A train must offer at least one seat.
    #[error("seat capacity must be at least 1")]
    ZeroSeatCapacity,

    /// A train offers more seats than the deployment allows.
    #[error("seat capacity {requested} exceeds the configured maximum of {maximum}")]
    SeatCapacityTooLarge {
        /// The requested capacity.
        requested: u32,
        /// The configured ceiling.
        maximum: u32,
    },

    /// A schedule offset pushes the timestamp past the representable range.
    #[error("schedule offset of {offset_minutes} minutes from {base_millis}ms overflows")]
    ScheduleOverflow {
        /// The clock reading the offset was applied to.
        base_millis: u64,
        /// The offending offset.
        offset_minutes: u64,
    },

    /// Timestamp string is not valid UTC RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_account_id_display() {
        let err = ValidationError::InvalidAccountId("bad id".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("bad id"));
        assert!(msg.contains("no whitespace"));
    }

    #[test]
    fn seat_capacity_too_large_display() {
        let err = ValidationError::SeatCapacityTooLarge {
            requested: 20_000,
            maximum: 10_000,
        };
        let msg = format!("{err}");
        assert!(msg.contains("20000"));
        assert!(msg.contains("10000"));
    }

    #[test]
    fn schedule_overflow_display() {
        let err = ValidationError::ScheduleOverflow {
            base_millis: 42,
            offset_minutes: u64::MAX,
        };
        assert!(format!("{err}").contains("42ms"));
    }

    #[test]
    fn invalid_timestamp_display() {
        let err = ValidationError::InvalidTimestamp {
            value: "yesterday".to_string(),
            reason: "parse failed".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("yesterday"));
        assert!(msg.contains("parse failed"));
    }
}
