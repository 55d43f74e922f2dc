//! Fixed-point monetary arithmetic.
//!
//! All charge amounts in the engine are decimals with precision 19 and
//! scale 4. Arithmetic rounds half-away-from-zero at scale 4; rounding to a
//! display scale of 2 is left to consumers. Nullable amounts are modeled as
//! [`MoneyValue`] rather than a sentinel so that a null input stays
//! distinguishable from an explicit zero.

use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fractional scale carried by every monetary amount.
pub const MONEY_SCALE: u32 = 4;

/// Errors produced by the monetary kernel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Division by a zero divisor.
    #[error("division by zero")]
    DivideByZero,

    /// An operation exceeded the representable decimal range.
    #[error("numeric overflow")]
    NumericOverflow,

    /// An input carried more fractional digits than scale 4 permits.
    #[error("precision loss: input has scale {scale}, maximum is {MONEY_SCALE}")]
    PrecisionLoss {
        /// The scale of the rejected input.
        scale: u32,
    },

    /// An input could not be parsed as a decimal at all.
    #[error("invalid amount: '{input}'")]
    InvalidAmount {
        /// The rejected input text.
        input: String,
    },
}

/// A type alias for Results that return MoneyError.
pub type MoneyResult<T> = Result<T, MoneyError>;

fn rescale(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// An exact monetary amount at scale 4.
///
/// The wrapped decimal never carries more than four fractional digits; every
/// constructor and arithmetic operation re-rounds half-away-from-zero.
///
/// # Example
///
/// ```
/// use rating_engine::money::Money;
///
/// let rate: Money = "1.2500".parse().unwrap();
/// let miles = Money::from_int(500);
/// assert_eq!(rate.mul(miles).unwrap().to_string(), "625.0000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(Decimal);

impl Money {
    /// The zero amount.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates an amount from an arbitrary decimal, rounding to scale 4.
    pub fn new(value: Decimal) -> Self {
        Money(rescale(value))
    }

    /// Creates an amount from an integer.
    pub fn from_int(value: i64) -> Self {
        Money(Decimal::from(value))
    }

    /// Returns the wrapped decimal.
    pub fn inner(&self) -> Decimal {
        self.0
    }

    /// Checked addition at scale 4.
    pub fn add(&self, other: Money) -> MoneyResult<Money> {
        self.0
            .checked_add(other.0)
            .map(|d| Money(rescale(d)))
            .ok_or(MoneyError::NumericOverflow)
    }

    /// Checked subtraction at scale 4.
    pub fn sub(&self, other: Money) -> MoneyResult<Money> {
        self.0
            .checked_sub(other.0)
            .map(|d| Money(rescale(d)))
            .ok_or(MoneyError::NumericOverflow)
    }

    /// Checked multiplication, rounded half-away-from-zero at scale 4.
    pub fn mul(&self, other: Money) -> MoneyResult<Money> {
        self.0
            .checked_mul(other.0)
            .map(|d| Money(rescale(d)))
            .ok_or(MoneyError::NumericOverflow)
    }

    /// Checked division, rounded half-away-from-zero at scale 4.
    ///
    /// Fails with [`MoneyError::DivideByZero`] on a zero divisor.
    pub fn div(&self, other: Money) -> MoneyResult<Money> {
        if other.0.is_zero() {
            return Err(MoneyError::DivideByZero);
        }
        self.0
            .checked_div(other.0)
            .map(|d| Money(rescale(d)))
            .ok_or(MoneyError::NumericOverflow)
    }

    /// Returns the negated amount.
    pub fn neg(&self) -> Money {
        Money(-self.0)
    }

    /// Returns the absolute value.
    pub fn abs(&self) -> Money {
        Money(self.0.abs())
    }

    /// Returns true if the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parses a decimal string, accepting any scale up to 4.
    ///
    /// Inputs with more than four fractional digits are rejected with
    /// [`MoneyError::PrecisionLoss`] rather than silently rounded.
    fn from_str(s: &str) -> MoneyResult<Money> {
        let value = Decimal::from_str(s).map_err(|_| MoneyError::InvalidAmount {
            input: s.to_string(),
        })?;
        if value.scale() > MONEY_SCALE {
            return Err(MoneyError::PrecisionLoss {
                scale: value.scale(),
            });
        }
        Ok(Money(value))
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyError;

    fn try_from(s: String) -> MoneyResult<Money> {
        s.parse()
    }
}

impl From<Money> for String {
    fn from(m: Money) -> String {
        m.to_string()
    }
}

impl fmt::Display for Money {
    /// Formats with exactly four fractional digits, e.g. `123.4500`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// A monetary amount that may be absent.
///
/// `Null` participates in sums as zero but survives pass-through on read, so
/// an unset charge is never confused with an explicit `0.0000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoneyValue {
    /// A present amount.
    Present(Money),
    /// No amount recorded.
    Null,
}

impl MoneyValue {
    /// Returns the amount, or zero when null.
    pub fn unwrap_or_zero(&self) -> Money {
        match self {
            MoneyValue::Present(m) => *m,
            MoneyValue::Null => Money::ZERO,
        }
    }

    /// Returns true when no amount is recorded.
    pub fn is_null(&self) -> bool {
        matches!(self, MoneyValue::Null)
    }
}

impl From<Money> for MoneyValue {
    fn from(m: Money) -> Self {
        MoneyValue::Present(m)
    }
}

impl Default for MoneyValue {
    fn default() -> Self {
        MoneyValue::Null
    }
}

impl Sum<MoneyValue> for Money {
    /// Sums a sequence of nullable amounts, treating `Null` as zero.
    ///
    /// Saturates on overflow; callers that need the overflow surfaced
    /// should fold with [`Money::add`] instead.
    fn sum<I: Iterator<Item = MoneyValue>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, v| {
            Money(rescale(acc.0.saturating_add(v.unwrap_or_zero().0)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_accepts_scale_up_to_four() {
        assert_eq!(money("250").to_string(), "250.0000");
        assert_eq!(money("250.5").to_string(), "250.5000");
        assert_eq!(money("250.1234").to_string(), "250.1234");
    }

    #[test]
    fn test_parse_rejects_scale_five() {
        let result = Money::from_str("1.23456");
        assert_eq!(result.unwrap_err(), MoneyError::PrecisionLoss { scale: 5 });
    }

    #[test]
    fn test_parse_rejects_garbage() {
        match Money::from_str("12.3.4").unwrap_err() {
            MoneyError::InvalidAmount { input } => assert_eq!(input, "12.3.4"),
            other => panic!("Expected InvalidAmount, got {:?}", other),
        }
    }

    #[test]
    fn test_display_pads_to_four_digits() {
        assert_eq!(Money::from_int(5).to_string(), "5.0000");
        assert_eq!(money("0.1").to_string(), "0.1000");
    }

    #[test]
    fn test_div_rounds_half_away_from_zero() {
        // 1 / 3 = 0.33333... -> 0.3333
        let third = Money::from_int(1).div(Money::from_int(3)).unwrap();
        assert_eq!(third.to_string(), "0.3333");

        // 0.00005 midpoint rounds away from zero
        let r = money("0.0001").div(Money::from_int(2)).unwrap();
        assert_eq!(r.to_string(), "0.0001");

        let r = money("-0.0001").div(Money::from_int(2)).unwrap();
        assert_eq!(r.to_string(), "-0.0001");
    }

    #[test]
    fn test_div_by_zero_fails() {
        let result = Money::from_int(10).div(Money::ZERO);
        assert_eq!(result.unwrap_err(), MoneyError::DivideByZero);
    }

    #[test]
    fn test_mul_rescales() {
        // 1.2345 * 1.0001 = 1.23462345 -> 1.2346
        let r = money("1.2345").mul(money("1.0001")).unwrap();
        assert_eq!(r.to_string(), "1.2346");
    }

    #[test]
    fn test_neg_abs_is_zero() {
        let m = money("12.5000");
        assert_eq!(m.neg().to_string(), "-12.5000");
        assert_eq!(m.neg().abs(), m);
        assert!(Money::ZERO.is_zero());
        assert!(!m.is_zero());
    }

    #[test]
    fn test_null_sums_as_zero_but_stays_distinguishable() {
        let values = vec![
            MoneyValue::Present(money("10.0000")),
            MoneyValue::Null,
            MoneyValue::Present(money("2.5000")),
        ];
        let total: Money = values.iter().copied().sum();
        assert_eq!(total, money("12.5000"));
        assert!(values[1].is_null());
        assert_eq!(values[1].unwrap_or_zero(), Money::ZERO);
    }

    #[test]
    fn test_money_value_serde_roundtrip() {
        let present = MoneyValue::Present(money("123.4500"));
        let json = serde_json::to_string(&present).unwrap();
        assert_eq!(json, "\"123.4500\"");
        assert_eq!(serde_json::from_str::<MoneyValue>(&json).unwrap(), present);

        let json = serde_json::to_string(&MoneyValue::Null).unwrap();
        assert_eq!(json, "null");
        assert!(
            serde_json::from_str::<MoneyValue>("null")
                .unwrap()
                .is_null()
        );
    }

    #[test]
    fn test_money_serializes_as_string() {
        let m = money("687.5");
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"687.5000\"");
        let back: Money = serde_json::from_str("\"687.5000\"").unwrap();
        assert_eq!(back, m);
    }

    proptest! {
        #[test]
        fn prop_add_stays_at_scale_four(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let a = Money::new(Decimal::new(a, 4));
            let b = Money::new(Decimal::new(b, 4));
            let sum = a.add(b).unwrap();
            prop_assert!(sum.inner().scale() <= MONEY_SCALE);
        }

        #[test]
        fn prop_add_sub_roundtrip(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let a = Money::new(Decimal::new(a, 4));
            let b = Money::new(Decimal::new(b, 4));
            let roundtrip = a.add(b).unwrap().sub(b).unwrap();
            prop_assert_eq!(roundtrip, a);
        }

        #[test]
        fn prop_display_parse_roundtrip(n in -1_000_000i64..1_000_000) {
            let m = Money::new(Decimal::new(n, 4));
            let parsed: Money = m.to_string().parse().unwrap();
            prop_assert_eq!(parsed, m);
        }
    }
}
