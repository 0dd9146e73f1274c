//! Fixed-point monetary amounts.

use serde::{Deserialize, Serialize};

/// Money amount with two fractional digits, stored as whole cents.
///
/// Serialized transparently as the cent count (`10000` is `100.00`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates an amount from cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates an amount from a whole number of currency units.
    pub const fn from_units(units: i64) -> Self {
        Self { cents: units * 100 }
    }

    /// Returns zero.
    pub const fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit part.
    pub const fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the fractional part in cents (always non-negative).
    pub const fn cents_part(&self) -> i64 {
        (self.cents % 100).abs()
    }

    /// Returns true if the amount is below zero.
    pub const fn is_negative(&self) -> bool {
        self.cents < 0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(f, "{sign}{}.{:02}", self.units().abs(), self.cents_part())
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money::from_cents(self.cents + rhs.cents)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::from_cents(self.cents - rhs.cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let money = Money::from_units(100);
        assert_eq!(money.cents(), 10_000);
        assert_eq!(money.units(), 100);
        assert_eq!(money.cents_part(), 0);
    }

    #[test]
    fn test_display_has_two_fraction_digits() {
        assert_eq!(Money::from_cents(10_000).to_string(), "100.00");
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_ordering_against_limit() {
        let limit = Money::from_units(1000);
        assert!(Money::from_units(2000) > limit);
        assert!(Money::from_units(1000) <= limit);
        assert!(Money::from_cents(100_001) > limit);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((b - a).cents(), -750);
        assert!((b - a).is_negative());
    }

    #[test]
    fn test_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_units(100)).unwrap();
        assert_eq!(json, "10000");
        let parsed: Money = serde_json::from_str("-1").unwrap();
        assert_eq!(parsed, Money::from_cents(-1));
    }
}
