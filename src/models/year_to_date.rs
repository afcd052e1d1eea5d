//! Year-to-date wage snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Year-to-date wages subject to each flat-rate tax, as of the start of the
/// period being calculated.
///
/// The engine only reads this snapshot. After a calculation is accepted the
/// caller commits [`YearToDateAccumulator::advanced_by`] as the next snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearToDateAccumulator {
    /// Wages subject to old-age/survivors tax so far this year.
    #[serde(default)]
    pub old_age_survivors_wages: Decimal,
    /// Wages subject to hospital insurance so far this year.
    #[serde(default)]
    pub hospital_insurance_wages: Decimal,
    /// Wages subject to state disability insurance so far this year.
    #[serde(default)]
    pub state_disability_wages: Decimal,
}

impl YearToDateAccumulator {
    /// Returns the snapshot that follows this one once `period_wages` are paid.
    ///
    /// ```
    /// use payroll_engine::models::YearToDateAccumulator;
    /// use rust_decimal::Decimal;
    ///
    /// let start = YearToDateAccumulator::default();
    /// let next = start.advanced_by(Decimal::from(2100));
    /// assert_eq!(next.old_age_survivors_wages, Decimal::from(2100));
    /// assert_eq!(start.old_age_survivors_wages, Decimal::ZERO);
    /// ```
    pub fn advanced_by(&self, period_wages: Decimal) -> Self {
        Self {
            old_age_survivors_wages: self.old_age_survivors_wages + period_wages,
            hospital_insurance_wages: self.hospital_insurance_wages + period_wages,
            state_disability_wages: self.state_disability_wages + period_wages,
        }
    }
}
