//! Fixed-point money in integer minor units (e.g. paise for INR).
//!
//! Every monetary amount in the service uses this type. Amounts never pass
//! through binary floating point, on the wire or in arithmetic; percentage
//! math goes through `Decimal` and rounds half-up exactly once.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    #[error("operation would produce a negative amount")]
    NegativeResult,

    #[error("amount overflows the minor-unit range")]
    AmountOverflow,

    #[error("rate {0} is outside the [0, 1] range")]
    InvalidRate(Decimal),
}

/// An amount of money in minor units of a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub minor_units: i64,
    pub currency: String,
}

impl Money {
    pub fn new(minor_units: i64, currency: impl Into<String>) -> Self {
        Self {
            minor_units,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let minor_units = self
            .minor_units
            .checked_add(other.minor_units)
            .ok_or(MoneyError::AmountOverflow)?;
        Ok(Money::new(minor_units, self.currency.clone()))
    }

    /// Subtract `other`, failing if the result would be negative.
    ///
    /// Used wherever negative amounts are disallowed, which in this domain
    /// is everywhere a balance or ledger amount is derived.
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let minor_units = self.minor_units - other.minor_units;
        if minor_units < 0 {
            return Err(MoneyError::NegativeResult);
        }
        Ok(Money::new(minor_units, self.currency.clone()))
    }

    /// Multiply by a decimal rate, rounding half-up to the nearest minor unit.
    ///
    /// Rounding happens here and nowhere else, so a computation chain rounds
    /// exactly once at its final step.
    pub fn multiply_by_rate(&self, rate: Decimal) -> Result<Money, MoneyError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(MoneyError::InvalidRate(rate));
        }
        let product = Decimal::from(self.minor_units) * rate;
        let minor_units = product
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(MoneyError::AmountOverflow)?;
        Ok(Money::new(minor_units, self.currency.clone()))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.minor_units, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inr(minor: i64) -> Money {
        Money::new(minor, "INR")
    }

    #[test]
    fn add_same_currency() {
        assert_eq!(inr(100).add(&inr(250)).unwrap(), inr(350));
    }

    #[test]
    fn add_rejects_currency_mismatch() {
        let err = inr(100).add(&Money::new(100, "USD")).unwrap_err();
        assert!(matches!(err, MoneyError::CurrencyMismatch { .. }));
    }

    #[test]
    fn checked_sub_rejects_negative() {
        assert_eq!(
            inr(100).checked_sub(&inr(101)).unwrap_err(),
            MoneyError::NegativeResult
        );
        assert_eq!(inr(100).checked_sub(&inr(100)).unwrap(), inr(0));
    }

    #[test]
    fn multiply_rounds_half_up() {
        // 15 * 0.105 = 1.575 -> 2
        let rate = Decimal::new(105, 3);
        assert_eq!(inr(15).multiply_by_rate(rate).unwrap(), inr(2));
        // 5 * 0.10 = 0.5 -> 1 (half-up, not banker's)
        let rate = Decimal::new(10, 2);
        assert_eq!(inr(5).multiply_by_rate(rate).unwrap(), inr(1));
    }

    #[test]
    fn multiply_rejects_out_of_range_rate() {
        let err = inr(100).multiply_by_rate(Decimal::new(-1, 1)).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidRate(_)));
        let err = inr(100).multiply_by_rate(Decimal::new(11, 1)).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidRate(_)));
    }
}
