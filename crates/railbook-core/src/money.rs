//! # Credits
//!
//! The single fungible value unit of the ledger. Amounts are whole
//! credits held in a `u64`; there are no fractions and no currencies.

use serde::{Deserialize, Serialize};

/// An amount of credits.
///
/// Arithmetic is checked. Escrow and treasury balances are sums of
/// payments supplied by callers, so an overflow is reachable in principle
/// and must be reported rather than wrapped.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Credits(u64);

impl Credits {
    /// Zero credits.
    pub const ZERO: Credits = Credits(0);

    /// Wrap a raw credit count.
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// The raw credit count.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Whether this amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Add two amounts, returning `None` on overflow.
    pub fn checked_add(self, rhs: Credits) -> Option<Credits> {
        self.0.checked_add(rhs.0).map(Credits)
    }

    /// Subtract `rhs`, returning `None` if it exceeds `self`.
    pub fn checked_sub(self, rhs: Credits) -> Option<Credits> {
        self.0.checked_sub(rhs.0).map(Credits)
    }

    /// Multiply by a count, returning `None` on overflow.
    pub fn checked_mul(self, count: u64) -> Option<Credits> {
        self.0.checked_mul(count).map(Credits)
    }
}

impl From<u64> for Credits {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

impl std::fmt::Display for Credits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} cr", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_detects_overflow() {
        assert_eq!(
            Credits::new(2).checked_add(Credits::new(3)),
            Some(Credits::new(5))
        );
        assert_eq!(Credits::new(u64::MAX).checked_add(Credits::new(1)), None);
    }

    #[test]
    fn checked_sub_rejects_underflow() {
        assert_eq!(
            Credits::new(5).checked_sub(Credits::new(5)),
            Some(Credits::ZERO)
        );
        assert_eq!(Credits::new(4).checked_sub(Credits::new(5)), None);
    }

    #[test]
    fn checked_mul_by_seat_count() {
        assert_eq!(Credits::new(100).checked_mul(5), Some(Credits::new(500)));
        assert_eq!(Credits::new(u64::MAX).checked_mul(2), None);
    }

    #[test]
    fn serializes_as_bare_integer() {
        assert_eq!(serde_json::to_string(&Credits::new(250)).unwrap(), "250");
        let back: Credits = serde_json::from_str("250").unwrap();
        assert_eq!(back, Credits::new(250));
    }

    #[test]
    fn display_has_unit_suffix() {
        assert_eq!(Credits::new(7).to_string(), "7 cr");
    }
}
