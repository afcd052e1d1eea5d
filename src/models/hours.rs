//! Hour breakdown model.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::round_quarter_hour;

/// Regular, overtime, and double-time hours for a record, a day, or a period.
///
/// Breakdowns are values: the classifier computes new ones rather than
/// patching existing ones.
///
/// # Example
///
/// ```
/// use payroll_engine::models::HourBreakdown;
/// use rust_decimal::Decimal;
///
/// let day = HourBreakdown::new(Decimal::from(8), Decimal::from(2), Decimal::from(2));
/// assert_eq!(day.total(), Decimal::from(12));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourBreakdown {
    /// Hours paid at 1×.
    pub regular: Decimal,
    /// Hours paid at 1.5×.
    pub overtime: Decimal,
    /// Hours paid at 2×.
    pub double_time: Decimal,
}

impl HourBreakdown {
    /// Creates a breakdown from its three components.
    pub fn new(regular: Decimal, overtime: Decimal, double_time: Decimal) -> Self {
        Self {
            regular,
            overtime,
            double_time,
        }
    }

    /// Returns the sum of all three categories.
    pub fn total(&self) -> Decimal {
        self.regular + self.overtime + self.double_time
    }

    /// Returns a copy with every category rounded to the nearest quarter hour.
    pub fn rounded(&self) -> Self {
        Self {
            regular: round_quarter_hour(self.regular),
            overtime: round_quarter_hour(self.overtime),
            double_time: round_quarter_hour(self.double_time),
        }
    }

    /// Returns true if no category is negative.
    pub fn is_non_negative(&self) -> bool {
        self.regular >= Decimal::ZERO
            && self.overtime >= Decimal::ZERO
            && self.double_time >= Decimal::ZERO
    }
}

impl Add for HourBreakdown {
    type Output = HourBreakdown;

    fn add(self, rhs: HourBreakdown) -> HourBreakdown {
        HourBreakdown {
            regular: self.regular + rhs.regular,
            overtime: self.overtime + rhs.overtime,
            double_time: self.double_time + rhs.double_time,
        }
    }
}

impl Sum for HourBreakdown {
    fn sum<I: Iterator<Item = HourBreakdown>>(iter: I) -> Self {
        iter.fold(HourBreakdown::default(), |acc, b| acc + b)
    }
}
