//! Daily work record model.
//!
//! A [`DailyRecord`] is one approved time entry: a worker's hours on one
//! project for one date. Records arrive already approved and are never
//! modified by the engine.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The most hours a single record may carry.
pub const MAX_HOURS_PER_RECORD: Decimal = Decimal::from_parts(24, 0, 0, false, 0);

/// The shift a record was worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkShift {
    /// Day shift; no differential.
    First,
    /// Second (swing) shift.
    Second,
    /// Third (graveyard) shift.
    Third,
}

impl TryFrom<u8> for WorkShift {
    type Error = EngineError;

    fn try_from(value: u8) -> EngineResult<Self> {
        match value {
            1 => Ok(WorkShift::First),
            2 => Ok(WorkShift::Second),
            3 => Ok(WorkShift::Third),
            other => Err(EngineError::malformed(
                "shift",
                format!("shift must be 1, 2 or 3, got {}", other),
            )),
        }
    }
}

impl fmt::Display for WorkShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkShift::First => write!(f, "1"),
            WorkShift::Second => write!(f, "2"),
            WorkShift::Third => write!(f, "3"),
        }
    }
}

/// The weekly schedule a worker is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// Five 8-hour days.
    #[default]
    Standard,
    /// Four 10-hour days.
    Compressed,
}

/// One approved day of work on one project.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{DailyRecord, WorkShift};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let record = DailyRecord {
///     work_date: NaiveDate::from_ymd_opt(2023, 3, 6).unwrap(),
///     project_id: "proj_100".to_string(),
///     zone: "zone_a".to_string(),
///     hours_worked: Decimal::from(8),
///     shift: 2,
///     meal_taken: true,
///     holiday: false,
///     travel_distance: Decimal::ZERO,
///     installation: false,
/// };
/// assert_eq!(record.work_shift().unwrap(), WorkShift::Second);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// The date the work was performed.
    pub work_date: NaiveDate,
    /// The project the hours were charged to.
    pub project_id: String,
    /// The pay-rate zone of the project site.
    pub zone: String,
    /// Raw hours worked.
    pub hours_worked: Decimal,
    /// Shift indicator (1, 2 or 3).
    pub shift: u8,
    /// Whether a meal period was taken.
    pub meal_taken: bool,
    /// Whether the date is a recognized holiday.
    #[serde(default)]
    pub holiday: bool,
    /// Distance in miles between the site and the worker's home local.
    #[serde(default)]
    pub travel_distance: Decimal,
    /// Whether the hours were installation work.
    #[serde(default)]
    pub installation: bool,
}

impl DailyRecord {
    /// Returns the shift as a typed value, rejecting out-of-range numbers.
    pub fn work_shift(&self) -> EngineResult<WorkShift> {
        WorkShift::try_from(self.shift)
    }

    /// Returns the day of the week the record falls on.
    pub fn weekday(&self) -> Weekday {
        self.work_date.weekday()
    }

    /// Checks the record's hours, shift, and travel distance.
    ///
    /// `index` is the record's position in its list and is used to name the
    /// offending field.
    pub fn validate(&self, index: usize) -> EngineResult<()> {
        let field = |name: &str| format!("records[{}].{}", index, name);

        if self.hours_worked < Decimal::ZERO {
            return Err(EngineError::malformed(
                field("hours_worked"),
                format!("hours cannot be negative, got {}", self.hours_worked),
            ));
        }
        if self.hours_worked > MAX_HOURS_PER_RECORD {
            return Err(EngineError::malformed(
                field("hours_worked"),
                format!(
                    "hours cannot exceed {} per record, got {}",
                    MAX_HOURS_PER_RECORD, self.hours_worked
                ),
            ));
        }
        if self.travel_distance < Decimal::ZERO {
            return Err(EngineError::malformed(
                field("travel_distance"),
                "travel distance cannot be negative",
            ));
        }
        self.work_shift().map_err(|_| {
            EngineError::malformed(
                field("shift"),
                format!("shift must be 1, 2 or 3, got {}", self.shift),
            )
        })?;

        Ok(())
    }
}

/// Converts a floating-point hour quantity into a [`Decimal`].
///
/// Time-entry systems often hand over hours as floats; NaN and infinities
/// are rejected rather than coerced.
///
/// ```
/// use payroll_engine::models::hours_from_f64;
/// use rust_decimal::Decimal;
///
/// assert_eq!(hours_from_f64(7.5, "hours").unwrap(), Decimal::new(75, 1));
/// assert!(hours_from_f64(f64::NAN, "hours").is_err());
/// ```
pub fn hours_from_f64(value: f64, field: &str) -> EngineResult<Decimal> {
    if !value.is_finite() {
        return Err(EngineError::malformed(
            field,
            format!("hours must be finite, got {}", value),
        ));
    }
    Decimal::try_from(value)
        .map(|d| d.normalize())
        .map_err(|e| EngineError::malformed(field, e.to_string()))
}
