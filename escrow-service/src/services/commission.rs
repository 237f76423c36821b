//! Commission engine: splitting a gross amount between platform and vendor.

use rust_decimal::Decimal;

use crate::models::{Money, MoneyError};

/// Result of splitting a gross amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub commission: Money,
    pub net: Money,
}

/// Split `gross` into platform commission and vendor net.
///
/// The commission is rounded half-up; the net is derived by subtraction
/// rather than rounded independently, so `commission + net == gross` holds
/// for every input.
pub fn compute_split(gross: &Money, rate: Decimal) -> Result<Split, MoneyError> {
    let commission = gross.multiply_by_rate(rate)?;
    let net = gross.checked_sub(&commission)?;
    Ok(Split { commission, net })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_percent_of_thousand_rupees() {
        let gross = Money::new(100_000, "INR"); // Rs 1,000 in paise
        let split = compute_split(&gross, Decimal::new(10, 2)).unwrap();
        assert_eq!(split.commission, Money::new(10_000, "INR"));
        assert_eq!(split.net, Money::new(90_000, "INR"));
    }

    #[test]
    fn zero_rate_takes_nothing() {
        let gross = Money::new(12_345, "INR");
        let split = compute_split(&gross, Decimal::ZERO).unwrap();
        assert_eq!(split.commission, Money::new(0, "INR"));
        assert_eq!(split.net, gross);
    }

    #[test]
    fn full_rate_takes_everything() {
        let gross = Money::new(12_345, "INR");
        let split = compute_split(&gross, Decimal::ONE).unwrap();
        assert_eq!(split.commission, gross);
        assert_eq!(split.net, Money::new(0, "INR"));
    }

    #[test]
    fn one_minor_unit_still_reconciles() {
        let gross = Money::new(1, "INR");
        let split = compute_split(&gross, Decimal::new(10, 2)).unwrap();
        // 0.1 rounds down to 0 commission; the vendor keeps the unit.
        assert_eq!(split.commission, Money::new(0, "INR"));
        assert_eq!(split.net, Money::new(1, "INR"));
        assert_eq!(
            split.commission.add(&split.net).unwrap(),
            gross
        );
    }
}
