//! Pay period and holiday models.
//!
//! This module contains the [`PayPeriod`], [`PayFrequency`] and [`PublicHoliday`]
//! types that define the calculation window for one worker.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// How often a worker is paid; determines the annualization factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// 52 periods per year.
    Weekly,
    /// 26 periods per year.
    Biweekly,
    /// 24 periods per year.
    Semimonthly,
    /// 12 periods per year.
    Monthly,
}

impl PayFrequency {
    /// Returns the number of pay periods in a year.
    ///
    /// ```
    /// use payroll_engine::models::PayFrequency;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(PayFrequency::Biweekly.periods_per_year(), Decimal::from(26));
    /// ```
    pub fn periods_per_year(&self) -> Decimal {
        match self {
            PayFrequency::Weekly => Decimal::from(52),
            PayFrequency::Biweekly => Decimal::from(26),
            PayFrequency::Semimonthly => Decimal::from(24),
            PayFrequency::Monthly => Decimal::from(12),
        }
    }

    /// Returns the snake_case name used in keys and traces.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayFrequency::Weekly => "weekly",
            PayFrequency::Biweekly => "biweekly",
            PayFrequency::Semimonthly => "semimonthly",
            PayFrequency::Monthly => "monthly",
        }
    }
}

/// A holiday recognized for the whole pay period.
///
/// Records may also carry their own holiday flag; a date is treated as a
/// holiday if either source says so.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PublicHoliday;
/// use chrono::NaiveDate;
///
/// let holiday = PublicHoliday {
///     date: NaiveDate::from_ymd_opt(2023, 7, 4).unwrap(),
///     name: "Independence Day".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The name of the holiday.
    pub name: String,
}

/// Represents a pay period with its date range, frequency, and holidays.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{PayFrequency, PayPeriod, PublicHoliday};
/// use chrono::NaiveDate;
///
/// let pay_period = PayPeriod {
///     start_date: NaiveDate::from_ymd_opt(2023, 7, 3).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2023, 7, 9).unwrap(),
///     frequency: PayFrequency::Weekly,
///     public_holidays: vec![PublicHoliday {
///         date: NaiveDate::from_ymd_opt(2023, 7, 4).unwrap(),
///         name: "Independence Day".to_string(),
///     }],
/// };
///
/// assert!(pay_period.contains_date(NaiveDate::from_ymd_opt(2023, 7, 5).unwrap()));
/// assert!(pay_period.is_public_holiday(NaiveDate::from_ymd_opt(2023, 7, 4).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// The start date of the pay period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub end_date: NaiveDate,
    /// How often the worker is paid.
    pub frequency: PayFrequency,
    /// Holidays that fall within this pay period.
    #[serde(default)]
    pub public_holidays: Vec<PublicHoliday>,
}

impl PayPeriod {
    /// Checks if a given date falls within this pay period (inclusive).
    ///
    /// ```
    /// use payroll_engine::models::{PayFrequency, PayPeriod};
    /// use chrono::NaiveDate;
    ///
    /// let period = PayPeriod {
    ///     start_date: NaiveDate::from_ymd_opt(2023, 7, 3).unwrap(),
    ///     end_date: NaiveDate::from_ymd_opt(2023, 7, 16).unwrap(),
    ///     frequency: PayFrequency::Biweekly,
    ///     public_holidays: vec![],
    /// };
    ///
    /// assert!(period.contains_date(NaiveDate::from_ymd_opt(2023, 7, 3).unwrap()));
    /// assert!(period.contains_date(NaiveDate::from_ymd_opt(2023, 7, 16).unwrap()));
    /// assert!(!period.contains_date(NaiveDate::from_ymd_opt(2023, 7, 17).unwrap()));
    /// ```
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Checks if a given date is a holiday listed for this pay period.
    pub fn is_public_holiday(&self, date: NaiveDate) -> bool {
        self.public_holidays.iter().any(|h| h.date == date)
    }

    /// Returns the number of days in the pay period (inclusive).
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Rejects periods whose end precedes their start.
    pub fn validate(&self) -> EngineResult<()> {
        if self.end_date < self.start_date {
            return Err(EngineError::malformed(
                "pay_period",
                format!(
                    "end date {} is before start date {}",
                    self.end_date, self.start_date
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn weekly_period() -> PayPeriod {
        PayPeriod {
            start_date: make_date("2023-07-03"),
            end_date: make_date("2023-07-09"),
            frequency: PayFrequency::Weekly,
            public_holidays: vec![PublicHoliday {
                date: make_date("2023-07-04"),
                name: "Independence Day".to_string(),
            }],
        }
    }

    #[test]
    fn test_contains_date_boundaries() {
        let period = weekly_period();
        assert!(period.contains_date(make_date("2023-07-03")));
        assert!(period.contains_date(make_date("2023-07-09")));
        assert!(!period.contains_date(make_date("2023-07-02")));
        assert!(!period.contains_date(make_date("2023-07-10")));
    }

    #[test]
    fn test_is_public_holiday() {
        let period = weekly_period();
        assert!(period.is_public_holiday(make_date("2023-07-04")));
        assert!(!period.is_public_holiday(make_date("2023-07-05")));
    }

    #[test]
    fn test_duration_days() {
        assert_eq!(weekly_period().duration_days(), 7);
    }

    #[test]
    fn test_validate_rejects_inverted_period() {
        let mut period = weekly_period();
        period.end_date = make_date("2023-07-01");
        assert!(matches!(
            period.validate(),
            Err(EngineError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_periods_per_year() {
        assert_eq!(PayFrequency::Weekly.periods_per_year(), Decimal::from(52));
        assert_eq!(PayFrequency::Biweekly.periods_per_year(), Decimal::from(26));
        assert_eq!(PayFrequency::Semimonthly.periods_per_year(), Decimal::from(24));
        assert_eq!(PayFrequency::Monthly.periods_per_year(), Decimal::from(12));
    }

    #[test]
    fn test_deserialize_without_holidays() {
        let json = r#"{
            "start_date": "2023-07-03",
            "end_date": "2023-07-09",
            "frequency": "weekly"
        }"#;
        let period: PayPeriod = serde_json::from_str(json).unwrap();
        assert_eq!(period.frequency, PayFrequency::Weekly);
        assert!(period.public_holidays.is_empty());
    }
}
