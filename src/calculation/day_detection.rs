//! Day detection and workweek logic.
//!
//! This module provides utilities for determining which daily tier table a
//! date falls under (weekday, Saturday, or Sunday/holiday) and which
//! workweek it belongs to.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::PayPeriod;

use super::rounding::{DOUBLE_TIME_MULTIPLIER, OVERTIME_MULTIPLIER};

/// The kind of day, which selects the daily tier table.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::DayKind;
///
/// assert_eq!(DayKind::SundayOrHoliday.to_string(), "Sunday/holiday");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    /// Monday through Friday, not a holiday.
    Weekday,
    /// Saturday, not a holiday.
    Saturday,
    /// Sunday or a recognized holiday.
    SundayOrHoliday,
}

impl DayKind {
    /// Multiplier applied to minimum-pay guarantees on this kind of day.
    pub fn premium_multiplier(&self) -> Decimal {
        match self {
            DayKind::Weekday => Decimal::ONE,
            DayKind::Saturday => OVERTIME_MULTIPLIER,
            DayKind::SundayOrHoliday => DOUBLE_TIME_MULTIPLIER,
        }
    }
}

impl std::fmt::Display for DayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayKind::Weekday => write!(f, "weekday"),
            DayKind::Saturday => write!(f, "Saturday"),
            DayKind::SundayOrHoliday => write!(f, "Sunday/holiday"),
        }
    }
}

/// Determines the day kind for a date.
///
/// A date is a holiday if the record flags it or the pay period lists it.
/// Holidays take precedence over Saturday.
///
/// ```
/// use payroll_engine::calculation::{DayKind, get_day_kind};
/// use payroll_engine::models::{PayFrequency, PayPeriod};
/// use chrono::NaiveDate;
///
/// let period = PayPeriod {
///     start_date: NaiveDate::from_ymd_opt(2023, 3, 6).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2023, 3, 12).unwrap(),
///     frequency: PayFrequency::Weekly,
///     public_holidays: vec![],
/// };
/// let saturday = NaiveDate::from_ymd_opt(2023, 3, 11).unwrap();
/// assert_eq!(get_day_kind(saturday, false, &period), DayKind::Saturday);
/// assert_eq!(get_day_kind(saturday, true, &period), DayKind::SundayOrHoliday);
/// ```
pub fn get_day_kind(date: NaiveDate, holiday_flag: bool, period: &PayPeriod) -> DayKind {
    if holiday_flag || period.is_public_holiday(date) {
        return DayKind::SundayOrHoliday;
    }
    match date.weekday() {
        Weekday::Sun => DayKind::SundayOrHoliday,
        Weekday::Sat => DayKind::Saturday,
        _ => DayKind::Weekday,
    }
}

/// Returns the first day of the workweek containing `date`.
///
/// ```
/// use payroll_engine::calculation::workweek_start;
/// use chrono::{NaiveDate, Weekday};
///
/// // 2023-03-08 is a Wednesday.
/// let date = NaiveDate::from_ymd_opt(2023, 3, 8).unwrap();
/// assert_eq!(workweek_start(date, Weekday::Mon), NaiveDate::from_ymd_opt(2023, 3, 6).unwrap());
/// assert_eq!(workweek_start(date, Weekday::Sun), NaiveDate::from_ymd_opt(2023, 3, 5).unwrap());
/// ```
pub fn workweek_start(date: NaiveDate, start: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() - start.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(u64::from(offset)))
        .unwrap_or(NaiveDate::MIN)
}
