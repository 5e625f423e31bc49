//! Money rounding rules
//!
//! All Meridian services charge in a single currency. Amounts are carried as
//! fixed-point decimals end-to-end; binary floating point never touches a
//! customer-facing charge.

use rust_decimal::{Decimal, RoundingStrategy};

/// Billing currency for all customer-facing amounts
pub const CURRENCY: &str = "USD";

/// Decimal places of the currency's minor unit (cents)
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Round an amount to the currency's minor unit.
///
/// Half-way values round away from zero; charges are non-negative, so this
/// is round-half-up. Callers round once, at the point an amount becomes a
/// customer-facing line, never mid-computation.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_currency_half_up() {
        assert_eq!(round_currency(dec!(12.005)), dec!(12.01));
        assert_eq!(round_currency(dec!(12.004)), dec!(12.00));
        assert_eq!(round_currency(dec!(0.125)), dec!(0.13));
    }

    #[test]
    fn test_round_currency_exact_amounts_unchanged() {
        assert_eq!(round_currency(dec!(50.00)), dec!(50.00));
        assert_eq!(round_currency(dec!(0)), dec!(0));
    }
}
