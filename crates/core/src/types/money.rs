//! Money helpers.
//!
//! Amounts are carried as [`Decimal`] in the currency's standard unit
//! (rupees, not paise). Display figures are rounded to whole units with
//! midpoint-away-from-zero rounding; `Decimal::round` would use banker's
//! rounding and turn 12.5 into 12.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to the nearest whole currency unit (halves round up).
#[must_use]
pub fn round_to_unit(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_to_unit(Decimal::new(125, 1)), Decimal::from(13));
        assert_eq!(round_to_unit(Decimal::new(135, 1)), Decimal::from(14));
    }

    #[test]
    fn test_round_below_half() {
        assert_eq!(round_to_unit(Decimal::new(12_49, 2)), Decimal::from(12));
    }

    #[test]
    fn test_round_whole_unchanged() {
        assert_eq!(round_to_unit(Decimal::from(90)), Decimal::from(90));
    }
}
