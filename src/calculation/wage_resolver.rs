//! Wage rate resolution.
//!
//! This module resolves the hourly rate paid for a daily record: the unique
//! effective wage rate for the worker's local and classification in the
//! record's zone, scaled for apprentices and uplifted for second and third
//! shift.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, DailyRecord, FringeRates, WageRateTable, WorkShift, Worker};

use super::rounding::round_money;

const ONE_HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// The rate resolved for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRate {
    /// The hourly rate paid for regular hours, rounded to the cent.
    pub hourly_rate: Decimal,
    /// The journeyman base rate from the table.
    pub base_rate: Decimal,
    /// The apprentice percentage applied, if any.
    pub apprentice_percentage: Option<Decimal>,
    /// The shift worked.
    pub shift: WorkShift,
    /// The shift differential percentage applied.
    pub differential: Decimal,
    /// Fringe rates from the same wage-rate row.
    pub fringe: FringeRates,
    /// The audit step recording the resolution.
    pub audit_step: AuditStep,
}

/// Resolves the hourly rate for a record.
///
/// The base rate is scaled by the apprentice percentage first, then by the
/// shift differential. The result is rounded to the cent once, after both
/// multiplications.
///
/// # Errors
///
/// - [`EngineError::RateAmbiguity`] if zero or several rates are effective.
/// - [`EngineError::MissingRateData`] if the worker's apprentice level has no
///   percentage in the rate row.
/// - [`EngineError::MalformedInput`] if the record's shift is not 1, 2 or 3.
pub fn resolve_wage_rate(
    table: &WageRateTable,
    worker: &Worker,
    record: &DailyRecord,
    step_number: u32,
) -> EngineResult<ResolvedRate> {
    let key = worker.rate_key(&record.zone);
    let rate = table.effective(&key, record.work_date)?;
    let shift = record.work_shift()?;

    let apprentice_percentage = match worker.apprentice_level {
        Some(level) => Some(rate.apprentice_percentage(level).ok_or_else(|| {
            EngineError::MissingRateData {
                key: key.to_string(),
                message: format!(
                    "no apprentice percentage for level {} effective {}",
                    level, rate.effective_from
                ),
            }
        })?),
        None => None,
    };

    let scaled = match apprentice_percentage {
        Some(percentage) => rate.base_rate * percentage / ONE_HUNDRED,
        None => rate.base_rate,
    };
    let differential = rate.differential_for(shift);
    let hourly_rate = round_money(scaled * (ONE_HUNDRED + differential) / ONE_HUNDRED);

    let reasoning = match apprentice_percentage {
        Some(percentage) => format!(
            "Base rate ${} at {}% for apprentice level {}, plus {}% for {} shift = ${}",
            rate.base_rate,
            percentage.normalize(),
            worker.apprentice_level.unwrap_or_default(),
            differential.normalize(),
            shift,
            hourly_rate
        ),
        None => format!(
            "Base rate ${} plus {}% for {} shift = ${}",
            rate.base_rate,
            differential.normalize(),
            shift,
            hourly_rate
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "wage_rate".to_string(),
        rule_name: "Wage Rate Resolution".to_string(),
        reference: format!("wage_rates: {} from {}", key, rate.effective_from),
        input: serde_json::json!({
            "key": key.to_string(),
            "date": record.work_date.to_string(),
            "shift": shift.to_string(),
            "apprentice_level": worker.apprentice_level,
        }),
        output: serde_json::json!({
            "base_rate": rate.base_rate.to_string(),
            "apprentice_percentage": apprentice_percentage.map(|p| p.normalize().to_string()),
            "differential": differential.normalize().to_string(),
            "hourly_rate": hourly_rate.to_string(),
        }),
        reasoning,
    };

    Ok(ResolvedRate {
        hourly_rate,
        base_rate: rate.base_rate,
        apprentice_percentage,
        shift,
        differential,
        fringe: rate.fringe,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ShiftDifferentials, WageRate};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rate(from: &str, to: Option<&str>, base: &str) -> WageRate {
        WageRate {
            local: "local_46".to_string(),
            classification: "inside_wireman".to_string(),
            zone: "zone_a".to_string(),
            effective_from: make_date(from),
            effective_to: to.map(make_date),
            base_rate: dec(base),
            shift_differentials: ShiftDifferentials {
                second_shift: dec("10"),
                third_shift: dec("15"),
            },
            fringe: FringeRates {
                health_welfare: dec("9.25"),
                pension: dec("7.10"),
                vacation: dec("2.00"),
                training: dec("0.75"),
            },
            apprentice_percentages: BTreeMap::from([(1, dec("40")), (3, dec("50"))]),
        }
    }

    fn table() -> WageRateTable {
        WageRateTable::new(vec![
            rate("2023-01-01", Some("2023-05-31"), "52.50"),
            rate("2023-06-01", None, "54.10"),
        ])
        .unwrap()
    }

    fn worker(level: Option<u8>) -> Worker {
        Worker {
            id: "wkr_001".to_string(),
            local: "local_46".to_string(),
            classification: "inside_wireman".to_string(),
            apprentice_level: level,
        }
    }

    fn record(date: &str, shift: u8) -> DailyRecord {
        DailyRecord {
            work_date: make_date(date),
            project_id: "proj_100".to_string(),
            zone: "zone_a".to_string(),
            hours_worked: dec("8"),
            shift,
            meal_taken: true,
            holiday: false,
            travel_distance: Decimal::ZERO,
            installation: false,
        }
    }

    #[test]
    fn test_first_shift_journeyman() {
        let resolved = resolve_wage_rate(&table(), &worker(None), &record("2023-03-06", 1), 1)
            .unwrap();
        assert_eq!(resolved.hourly_rate, dec("52.50"));
        assert_eq!(resolved.fringe.pension, dec("7.10"));
        assert_eq!(resolved.audit_step.rule_id, "wage_rate");
    }

    #[test]
    fn test_rate_change_mid_year() {
        let resolved = resolve_wage_rate(&table(), &worker(None), &record("2023-06-01", 1), 1)
            .unwrap();
        assert_eq!(resolved.hourly_rate, dec("54.10"));
    }

    #[test]
    fn test_second_shift_differential() {
        // 52.50 * 1.10 = 57.75
        let resolved = resolve_wage_rate(&table(), &worker(None), &record("2023-03-06", 2), 1)
            .unwrap();
        assert_eq!(resolved.hourly_rate, dec("57.75"));
    }

    #[test]
    fn test_apprentice_then_differential_rounded_once() {
        // 52.50 * 0.40 = 21.00; * 1.15 = 24.15
        let resolved =
            resolve_wage_rate(&table(), &worker(Some(1)), &record("2023-03-06", 3), 1).unwrap();
        assert_eq!(resolved.hourly_rate, dec("24.15"));
        assert_eq!(resolved.apprentice_percentage, Some(dec("40")));
    }

    #[test]
    fn test_rounding_happens_after_all_multiplications() {
        // 54.10 * 0.50 = 27.05; * 1.15 = 31.1075 -> 31.11
        let resolved =
            resolve_wage_rate(&table(), &worker(Some(3)), &record("2023-07-03", 3), 1).unwrap();
        assert_eq!(resolved.hourly_rate, dec("31.11"));
    }

    #[test]
    fn test_missing_apprentice_level() {
        let result = resolve_wage_rate(&table(), &worker(Some(7)), &record("2023-03-06", 1), 1);
        match result {
            Err(EngineError::MissingRateData { key, message }) => {
                assert_eq!(key, "local_46/inside_wireman/zone_a");
                assert!(message.contains("level 7"));
            }
            other => panic!("Expected MissingRateData, got {:?}", other),
        }
    }

    #[test]
    fn test_no_effective_rate_is_ambiguity() {
        let result = resolve_wage_rate(&table(), &worker(None), &record("2022-12-31", 1), 1);
        assert!(matches!(
            result,
            Err(EngineError::RateAmbiguity { matches: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_zone_is_ambiguity() {
        let mut other_zone = record("2023-03-06", 1);
        other_zone.zone = "zone_z".to_string();
        let result = resolve_wage_rate(&table(), &worker(None), &other_zone, 1);
        assert!(matches!(result, Err(EngineError::RateAmbiguity { .. })));
    }
}
