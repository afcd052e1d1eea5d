//! Hours classification.
//!
//! Splits each daily record's hours into regular, overtime, and double-time
//! tiers. Daily tiers are assigned first, by day kind and schedule:
//!
//! | Day                    | Regular | Overtime | Double time |
//! |------------------------|---------|----------|-------------|
//! | Sunday or holiday      | -       | -        | all         |
//! | Saturday               | -       | first 8  | remainder   |
//! | Compressed weekday     | first 10| next 2   | remainder   |
//! | Standard weekday       | first 8 | next 2   | remainder   |
//!
//! Records sharing a date share the day's tiers in input order. A weekly
//! pass then caps regular hours per workweek, moving the excess to overtime
//! one record at a time in the configured order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{ClassifierPolicy, ReallocationOrder};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, DailyRecord, HourBreakdown, PayPeriod, ScheduleType};

use super::day_detection::{DayKind, get_day_kind, workweek_start};

/// Hours per day paid at overtime before double time starts.
pub const DAILY_OVERTIME_BAND: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Regular hours per standard weekday.
pub const STANDARD_DAY_REGULAR: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// Regular hours per compressed-schedule weekday.
pub const COMPRESSED_DAY_REGULAR: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Overtime hours on a Saturday before double time starts.
pub const SATURDAY_OVERTIME_BAND: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// One record's classified hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    /// Position of the record in the input.
    pub record_index: usize,
    /// The date worked.
    pub work_date: NaiveDate,
    /// The day kind that selected the tier table.
    pub day_kind: DayKind,
    /// Exact breakdown; sums to the record's hours.
    pub exact: HourBreakdown,
    /// Quarter-hour rounded breakdown; used for pay.
    pub hours: HourBreakdown,
}

/// The result of classifying a period's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursClassification {
    /// Classified records, in input order.
    pub records: Vec<ClassifiedRecord>,
    /// Sum of the exact breakdowns.
    pub exact_totals: HourBreakdown,
    /// Sum of the rounded breakdowns.
    pub totals: HourBreakdown,
    /// The audit steps recording each decision.
    pub audit_steps: Vec<AuditStep>,
}

/// Regular and overtime caps for a day; hours beyond both are double time.
fn daily_caps(day_kind: DayKind, schedule: ScheduleType) -> (Decimal, Decimal) {
    match (day_kind, schedule) {
        (DayKind::SundayOrHoliday, _) => (Decimal::ZERO, Decimal::ZERO),
        (DayKind::Saturday, _) => (Decimal::ZERO, SATURDAY_OVERTIME_BAND),
        (DayKind::Weekday, ScheduleType::Compressed) => {
            (COMPRESSED_DAY_REGULAR, DAILY_OVERTIME_BAND)
        }
        (DayKind::Weekday, ScheduleType::Standard) => (STANDARD_DAY_REGULAR, DAILY_OVERTIME_BAND),
    }
}

/// Splits `hours` into tiers given how many hours of the day came before it.
fn split_into_tiers(
    hours: Decimal,
    already_worked: Decimal,
    regular_cap: Decimal,
    overtime_cap: Decimal,
) -> HourBreakdown {
    let regular_room = (regular_cap - already_worked).max(Decimal::ZERO);
    let regular = hours.min(regular_room);

    let overtime_used = (already_worked - regular_cap).max(Decimal::ZERO);
    let overtime_room = (overtime_cap - overtime_used).max(Decimal::ZERO);
    let overtime = (hours - regular).min(overtime_room);

    HourBreakdown::new(regular, overtime, hours - regular - overtime)
}

fn check_records(records: &[DailyRecord], period: &PayPeriod) -> EngineResult<()> {
    let mut previous: Option<NaiveDate> = None;
    for (index, record) in records.iter().enumerate() {
        record.validate(index)?;
        if !period.contains_date(record.work_date) {
            return Err(EngineError::malformed(
                format!("records[{}].work_date", index),
                format!(
                    "{} is outside the pay period {} to {}",
                    record.work_date, period.start_date, period.end_date
                ),
            ));
        }
        if previous.is_some_and(|prev| record.work_date < prev) {
            return Err(EngineError::malformed(
                format!("records[{}].work_date", index),
                format!("{} is out of chronological order", record.work_date),
            ));
        }
        previous = Some(record.work_date);
    }
    Ok(())
}

/// Classifies every record's hours into regular, overtime, and double time.
///
/// # Errors
///
/// [`EngineError::MalformedInput`] for negative, over-24, or otherwise invalid
/// record fields, for records outside the pay period, and for records out of
/// chronological order. Nothing is clamped.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::classify_hours;
/// use payroll_engine::config::ClassifierPolicy;
/// use payroll_engine::models::{DailyRecord, PayFrequency, PayPeriod, ScheduleType};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let period = PayPeriod {
///     start_date: NaiveDate::from_ymd_opt(2023, 3, 6).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2023, 3, 12).unwrap(),
///     frequency: PayFrequency::Weekly,
///     public_holidays: vec![],
/// };
/// let record = DailyRecord {
///     work_date: NaiveDate::from_ymd_opt(2023, 3, 6).unwrap(),
///     project_id: "proj_100".to_string(),
///     zone: "zone_a".to_string(),
///     hours_worked: Decimal::from(12),
///     shift: 1,
///     meal_taken: true,
///     holiday: false,
///     travel_distance: Decimal::ZERO,
///     installation: false,
/// };
///
/// let result = classify_hours(
///     &[record],
///     &period,
///     ScheduleType::Standard,
///     &ClassifierPolicy::default(),
///     1,
/// )
/// .unwrap();
///
/// assert_eq!(result.totals.regular, Decimal::from(8));
/// assert_eq!(result.totals.overtime, Decimal::from(2));
/// assert_eq!(result.totals.double_time, Decimal::from(2));
/// ```
pub fn classify_hours(
    records: &[DailyRecord],
    period: &PayPeriod,
    schedule: ScheduleType,
    policy: &ClassifierPolicy,
    step_number: u32,
) -> EngineResult<HoursClassification> {
    check_records(records, period)?;

    let mut audit_steps = Vec::new();
    let mut next_step = step_number;

    // Daily pass. Records are chronological, so same-date records are adjacent.
    let mut exact: Vec<HourBreakdown> = Vec::with_capacity(records.len());
    let mut kinds: Vec<DayKind> = Vec::with_capacity(records.len());
    let mut start = 0;
    while start < records.len() {
        let date = records[start].work_date;
        let end = records[start..]
            .iter()
            .position(|r| r.work_date != date)
            .map_or(records.len(), |offset| start + offset);
        let day = &records[start..end];

        let holiday_flag = day.iter().any(|r| r.holiday);
        let day_kind = get_day_kind(date, holiday_flag, period);
        let (regular_cap, overtime_cap) = daily_caps(day_kind, schedule);

        let mut worked = Decimal::ZERO;
        for record in day {
            exact.push(split_into_tiers(
                record.hours_worked,
                worked,
                regular_cap,
                overtime_cap,
            ));
            kinds.push(day_kind);
            worked += record.hours_worked;
        }
        let day_total: HourBreakdown = exact[start..end].iter().copied().sum();

        audit_steps.push(AuditStep {
            step_number: next_step,
            rule_id: "daily_tiers".to_string(),
            rule_name: "Daily Tier Classification".to_string(),
            reference: format!("{:?} schedule, {} tier table", schedule, day_kind),
            input: serde_json::json!({
                "date": date.to_string(),
                "day_kind": day_kind,
                "records": day.len(),
                "hours_worked": worked.normalize().to_string(),
            }),
            output: serde_json::json!({
                "regular": day_total.regular.normalize().to_string(),
                "overtime": day_total.overtime.normalize().to_string(),
                "double_time": day_total.double_time.normalize().to_string(),
            }),
            reasoning: format!(
                "{} hours on {} ({}): {} regular, {} overtime, {} double time",
                worked.normalize(),
                date,
                day_kind,
                day_total.regular.normalize(),
                day_total.overtime.normalize(),
                day_total.double_time.normalize()
            ),
        });
        next_step += 1;
        start = end;
    }

    // Weekly pass.
    let mut workweeks: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        workweeks
            .entry(workweek_start(record.work_date, policy.workweek_start))
            .or_default()
            .push(index);
    }

    for (week_start, indices) in &workweeks {
        let regular: Decimal = indices.iter().map(|&i| exact[i].regular).sum();
        let excess = regular - policy.weekly_regular_limit;
        if excess <= Decimal::ZERO {
            continue;
        }

        let order: Vec<usize> = match policy.reallocation_order {
            ReallocationOrder::ReverseChronological => indices.iter().rev().copied().collect(),
            ReallocationOrder::Chronological => indices.clone(),
        };

        let mut remaining = excess;
        let mut moved: Vec<serde_json::Value> = Vec::new();
        for i in order {
            if remaining <= Decimal::ZERO {
                break;
            }
            let shift = remaining.min(exact[i].regular);
            if shift.is_zero() {
                continue;
            }
            exact[i] = HourBreakdown::new(
                exact[i].regular - shift,
                exact[i].overtime + shift,
                exact[i].double_time,
            );
            remaining -= shift;
            moved.push(serde_json::json!({
                "record_index": i,
                "date": records[i].work_date.to_string(),
                "hours": shift.normalize().to_string(),
            }));
        }

        audit_steps.push(AuditStep {
            step_number: next_step,
            rule_id: "weekly_overtime".to_string(),
            rule_name: "Weekly Overtime Reallocation".to_string(),
            reference: format!(
                "classifier.weekly_regular_limit = {}, {:?}",
                policy.weekly_regular_limit.normalize(),
                policy.reallocation_order
            ),
            input: serde_json::json!({
                "workweek_start": week_start.to_string(),
                "regular_hours": regular.normalize().to_string(),
                "limit": policy.weekly_regular_limit.normalize().to_string(),
            }),
            output: serde_json::json!({
                "excess": excess.normalize().to_string(),
                "moved": moved,
            }),
            reasoning: format!(
                "{} regular hours in the week of {} exceed the {} hour limit; {} hours moved to overtime",
                regular.normalize(),
                week_start,
                policy.weekly_regular_limit.normalize(),
                excess.normalize()
            ),
        });
        next_step += 1;
    }

    let classified: Vec<ClassifiedRecord> = records
        .iter()
        .enumerate()
        .map(|(index, record)| ClassifiedRecord {
            record_index: index,
            work_date: record.work_date,
            day_kind: kinds[index],
            exact: exact[index],
            hours: exact[index].rounded(),
        })
        .collect();

    let exact_totals: HourBreakdown = classified.iter().map(|c| c.exact).sum();
    let totals: HourBreakdown = classified.iter().map(|c| c.hours).sum();

    audit_steps.push(AuditStep {
        step_number: next_step,
        rule_id: "hours_classification".to_string(),
        rule_name: "Hours Classification".to_string(),
        reference: "quarter-hour rounding per record and tier".to_string(),
        input: serde_json::json!({
            "records": records.len(),
            "exact_regular": exact_totals.regular.normalize().to_string(),
            "exact_overtime": exact_totals.overtime.normalize().to_string(),
            "exact_double_time": exact_totals.double_time.normalize().to_string(),
        }),
        output: serde_json::json!({
            "regular": totals.regular.normalize().to_string(),
            "overtime": totals.overtime.normalize().to_string(),
            "double_time": totals.double_time.normalize().to_string(),
        }),
        reasoning: format!(
            "{} exact hours classified; rounded totals {} regular, {} overtime, {} double time",
            exact_totals.total().normalize(),
            totals.regular.normalize(),
            totals.overtime.normalize(),
            totals.double_time.normalize()
        ),
    });

    Ok(HoursClassification {
        records: classified,
        exact_totals,
        totals,
        audit_steps,
    })
}
