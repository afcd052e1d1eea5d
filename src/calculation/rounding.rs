//! Rounding rules.
//!
//! Every quantity that is rounded goes through exactly one of these
//! functions, so the policy for each lives in one place:
//!
//! | Quantity                               | Function               |
//! |----------------------------------------|------------------------|
//! | Pay lines, adjustments, fringe lines   | [`round_money`]        |
//! | Resolved hourly rate                   | [`round_money`]        |
//! | Period income tax (before additional)  | [`round_money`]        |
//! | Flat-rate tax amounts                  | [`round_money`]        |
//! | Hours leaving the classifier           | [`round_quarter_hour`] |
//!
//! Money rounds half away from zero to the cent. Intermediate products
//! (annualized wages, bracket tax, apprentice and differential scaling) are
//! never rounded.

use rust_decimal::{Decimal, RoundingStrategy};

/// Overtime multiplier (time and a half).
pub const OVERTIME_MULTIPLIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// Double-time multiplier.
pub const DOUBLE_TIME_MULTIPLIER: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

const QUARTERS_PER_HOUR: Decimal = Decimal::from_parts(4, 0, 0, false, 0);

/// Rounds a monetary amount to the cent, half away from zero.
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2));
/// assert_eq!(round_money(Decimal::new(-12345, 3)), Decimal::new(-1235, 2));
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds hours to the nearest quarter hour, half away from zero.
///
/// ```
/// use payroll_engine::calculation::round_quarter_hour;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_quarter_hour(Decimal::new(8125, 3)), Decimal::new(825, 2));
/// assert_eq!(round_quarter_hour(Decimal::new(81, 1)), Decimal::from(8));
/// ```
pub fn round_quarter_hour(hours: Decimal) -> Decimal {
    let quarters = (hours * QUARTERS_PER_HOUR)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    (quarters / QUARTERS_PER_HOUR).normalize()
}

/// Clamps a negative amount to zero.
pub fn floor_at_zero(amount: Decimal) -> Decimal {
    amount.max(Decimal::ZERO)
}
