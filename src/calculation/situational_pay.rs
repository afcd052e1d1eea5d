//! Situational pay adjustments.
//!
//! Four adjustments are supported, each switched on by its own policy in
//! [`SituationalPayPolicy`] and rounded on its own:
//!
//! - minimum-pay guarantee (per day)
//! - missed-meal penalty (per day)
//! - travel/subsistence allowance (per day)
//! - installation premium (per record)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{
    InstallationPolicy, MealPenaltyPolicy, MinimumPayPolicy, SituationalPayPolicy, TravelPolicy,
};
use crate::models::{Adjustment, AdjustmentKind, AuditStep, DailyRecord, HourBreakdown, PayLine};

use super::day_detection::DayKind;
use super::hours_classifier::HoursClassification;
use super::rounding::{OVERTIME_MULTIPLIER, round_money};
use super::wage_resolver::ResolvedRate;

/// Adjustments for a period with their audit steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationalPayResult {
    /// Every adjustment with a non-zero amount, by date.
    pub adjustments: Vec<Adjustment>,
    /// Sum of adjustment amounts.
    pub total: Decimal,
    /// One step per enabled rule.
    pub audit_steps: Vec<AuditStep>,
}

/// One calendar day's view of the inputs.
struct WorkDay {
    date: NaiveDate,
    kind: DayKind,
    hours_worked: Decimal,
    /// Quarter-hour rounded breakdown, the same hours earnings were priced on.
    hours: HourBreakdown,
    rate: Decimal,
    earnings: Decimal,
    meal_taken: bool,
    max_distance: Decimal,
}

fn work_days(
    records: &[DailyRecord],
    classification: &HoursClassification,
    rates: &[ResolvedRate],
    pay_lines: &[PayLine],
) -> Vec<WorkDay> {
    let mut days: Vec<WorkDay> = Vec::new();
    for ((record, classified), rate) in records.iter().zip(&classification.records).zip(rates) {
        match days.last_mut() {
            Some(day) if day.date == record.work_date => {
                day.hours_worked += record.hours_worked;
                day.hours = day.hours + classified.hours;
                day.meal_taken |= record.meal_taken;
                day.max_distance = day.max_distance.max(record.travel_distance);
            }
            _ => days.push(WorkDay {
                date: record.work_date,
                kind: classified.day_kind,
                hours_worked: record.hours_worked,
                hours: classified.hours,
                // The first record of the day sets the day's rate.
                rate: rate.hourly_rate,
                earnings: Decimal::ZERO,
                meal_taken: record.meal_taken,
                max_distance: record.travel_distance,
            }),
        }
    }
    for day in &mut days {
        day.earnings = pay_lines
            .iter()
            .filter(|line| line.date == day.date)
            .map(|line| line.amount)
            .sum();
    }
    days
}

/// Any day with a record counts as reported, including a record of zero
/// hours. Only the flat minimum carries the Saturday/Sunday/holiday
/// multiplier; the hours-at-rate guarantee is already at the day's rate.
fn minimum_pay(policy: &MinimumPayPolicy, day: &WorkDay) -> Option<Adjustment> {
    let guaranteed_hours = if day.hours_worked > policy.escalation_threshold_hours {
        policy.upper_guarantee_hours
    } else {
        policy.lower_guarantee_hours
    };
    let flat = policy.flat_minimum * day.kind.premium_multiplier();
    let guarantee = round_money(flat.max(guaranteed_hours * day.rate));
    if day.earnings >= guarantee {
        return None;
    }
    Some(Adjustment {
        date: day.date,
        kind: AdjustmentKind::MinimumPay,
        units: guaranteed_hours,
        rate: day.rate,
        amount: guarantee - day.earnings,
        description: format!(
            "Guarantee ${} ({} hours, {}) less earnings ${}",
            guarantee,
            guaranteed_hours.normalize(),
            day.kind,
            day.earnings
        ),
    })
}

fn missed_meal(policy: &MealPenaltyPolicy, day: &WorkDay) -> Option<Adjustment> {
    let worked = day.hours.total();
    if day.meal_taken || worked <= policy.threshold_hours {
        return None;
    }
    // Tail hours come off the top tier first; only tail hours still at
    // straight time are under-paid relative to 1.5x.
    let mut tail = worked - policy.threshold_hours;
    for paid in [day.hours.double_time, day.hours.overtime] {
        tail -= tail.min(paid);
    }
    let regular_tail = tail.min(day.hours.regular);
    let uplift = OVERTIME_MULTIPLIER - Decimal::ONE;
    let amount = round_money(regular_tail * day.rate * uplift);
    if amount.is_zero() {
        return None;
    }
    Some(Adjustment {
        date: day.date,
        kind: AdjustmentKind::MissedMeal,
        units: regular_tail,
        rate: day.rate * uplift,
        amount,
        description: format!(
            "No meal in {} hours; {} straight-time hours past {} re-priced at 1.5x",
            worked.normalize(),
            regular_tail.normalize(),
            policy.threshold_hours.normalize()
        ),
    })
}

fn travel(policy: &TravelPolicy, day: &WorkDay) -> Option<Adjustment> {
    if day.hours_worked <= Decimal::ZERO {
        return None;
    }
    let band = policy.band_for(day.max_distance)?;
    if band.daily_amount.is_zero() {
        return None;
    }
    Some(Adjustment {
        date: day.date,
        kind: AdjustmentKind::Travel,
        units: Decimal::ONE,
        rate: band.daily_amount,
        amount: round_money(band.daily_amount),
        description: format!(
            "{} miles falls in the {}+ band",
            day.max_distance.normalize(),
            band.min_distance.normalize()
        ),
    })
}

fn installation(
    policy: &InstallationPolicy,
    record: &DailyRecord,
    hours: Decimal,
) -> Option<Adjustment> {
    if !record.installation || hours.is_zero() {
        return None;
    }
    let amount = round_money(hours * policy.premium_per_hour);
    Some(Adjustment {
        date: record.work_date,
        kind: AdjustmentKind::Installation,
        units: hours,
        rate: policy.premium_per_hour,
        amount,
        description: format!(
            "{} installation hours on {}",
            hours.normalize(),
            record.project_id
        ),
    })
}

fn summary_step(
    step_number: u32,
    rule_id: &str,
    rule_name: &str,
    reference: String,
    adjustments: &[Adjustment],
    days_considered: usize,
) -> AuditStep {
    let total: Decimal = adjustments.iter().map(|a| a.amount).sum();
    AuditStep {
        step_number,
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        reference,
        input: serde_json::json!({ "considered": days_considered }),
        output: serde_json::json!({
            "adjustments": adjustments
                .iter()
                .map(|a| serde_json::json!({
                    "date": a.date.to_string(),
                    "amount": a.amount.to_string(),
                }))
                .collect::<Vec<_>>(),
            "total": total.to_string(),
        }),
        reasoning: if adjustments.is_empty() {
            format!("{}: no adjustment owed", rule_name)
        } else {
            format!(
                "{}: {} adjustments totalling ${}",
                rule_name,
                adjustments.len(),
                total
            )
        },
    }
}

/// Calculates every enabled situational adjustment.
///
/// `rates` and `classification.records` must line up with `records`.
/// Disabled rules produce neither adjustments nor audit steps.
pub fn calculate_situational_pay(
    records: &[DailyRecord],
    classification: &HoursClassification,
    rates: &[ResolvedRate],
    pay_lines: &[PayLine],
    policy: &SituationalPayPolicy,
    step_number: u32,
) -> SituationalPayResult {
    let days = work_days(records, classification, rates, pay_lines);
    let mut adjustments = Vec::new();
    let mut audit_steps = Vec::new();
    let mut next_step = step_number;

    if let Some(rule) = &policy.minimum_pay {
        let found: Vec<_> = days.iter().filter_map(|d| minimum_pay(rule, d)).collect();
        audit_steps.push(summary_step(
            next_step,
            "minimum_pay",
            "Minimum Pay Guarantee",
            format!(
                "situational.minimum_pay: ${} flat, {}/{} hours over {}",
                rule.flat_minimum,
                rule.lower_guarantee_hours.normalize(),
                rule.upper_guarantee_hours.normalize(),
                rule.escalation_threshold_hours.normalize()
            ),
            &found,
            days.len(),
        ));
        next_step += 1;
        adjustments.extend(found);
    }

    if let Some(rule) = &policy.missed_meal {
        let found: Vec<_> = days.iter().filter_map(|d| missed_meal(rule, d)).collect();
        audit_steps.push(summary_step(
            next_step,
            "missed_meal",
            "Missed Meal Penalty",
            format!(
                "situational.missed_meal: threshold {} hours",
                rule.threshold_hours.normalize()
            ),
            &found,
            days.len(),
        ));
        next_step += 1;
        adjustments.extend(found);
    }

    if let Some(rule) = &policy.travel {
        let found: Vec<_> = days.iter().filter_map(|d| travel(rule, d)).collect();
        audit_steps.push(summary_step(
            next_step,
            "travel_allowance",
            "Travel Allowance",
            format!("situational.travel: {} bands", rule.bands.len()),
            &found,
            days.len(),
        ));
        next_step += 1;
        adjustments.extend(found);
    }

    if let Some(rule) = &policy.installation {
        let found: Vec<_> = records
            .iter()
            .zip(&classification.records)
            .filter_map(|(record, classified)| {
                installation(rule, record, classified.hours.total())
            })
            .collect();
        audit_steps.push(summary_step(
            next_step,
            "installation_premium",
            "Installation Premium",
            format!(
                "situational.installation: ${} per hour",
                rule.premium_per_hour
            ),
            &found,
            records.len(),
        ));
        adjustments.extend(found);
    }

    adjustments.sort_by_key(|a| a.date);
    let total = adjustments.iter().map(|a| a.amount).sum();

    SituationalPayResult {
        adjustments,
        total,
        audit_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{calculate_earnings, classify_hours};
    use crate::config::{ClassifierPolicy, TravelBand};
    use crate::models::{FringeRates, PayFrequency, PayPeriod, ScheduleType, WorkShift};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(date: &str, hours: &str) -> DailyRecord {
        DailyRecord {
            work_date: make_date(date),
            project_id: "proj_100".to_string(),
            zone: "zone_a".to_string(),
            hours_worked: dec(hours),
            shift: 1,
            meal_taken: true,
            holiday: false,
            travel_distance: Decimal::ZERO,
            installation: false,
        }
    }

    fn resolved(rate: &str) -> ResolvedRate {
        ResolvedRate {
            hourly_rate: dec(rate),
            base_rate: dec(rate),
            apprentice_percentage: None,
            shift: WorkShift::First,
            differential: Decimal::ZERO,
            fringe: FringeRates::default(),
            audit_step: AuditStep {
                step_number: 0,
                rule_id: "wage_rate".to_string(),
                rule_name: String::new(),
                reference: String::new(),
                input: serde_json::json!({}),
                output: serde_json::json!({}),
                reasoning: String::new(),
            },
        }
    }

    fn run(records: &[DailyRecord], policy: &SituationalPayPolicy) -> SituationalPayResult {
        let period = PayPeriod {
            start_date: make_date("2023-03-06"),
            end_date: make_date("2023-03-12"),
            frequency: PayFrequency::Weekly,
            public_holidays: vec![],
        };
        let classification = classify_hours(
            records,
            &period,
            ScheduleType::Standard,
            &ClassifierPolicy::default(),
            1,
        )
        .unwrap();
        let rates: Vec<_> = records.iter().map(|_| resolved("50.00")).collect();
        let earnings = calculate_earnings(records, &classification, &rates, 1);
        calculate_situational_pay(
            records,
            &classification,
            &rates,
            &earnings.pay_lines,
            policy,
            1,
        )
    }

    fn minimum_policy() -> SituationalPayPolicy {
        SituationalPayPolicy {
            minimum_pay: Some(MinimumPayPolicy {
                flat_minimum: dec("100.00"),
                lower_guarantee_hours: dec("4"),
                upper_guarantee_hours: dec("8"),
                escalation_threshold_hours: dec("4"),
            }),
            ..SituationalPayPolicy::default()
        }
    }

    #[test]
    fn test_disabled_rules_do_nothing() {
        let result = run(&[record("2023-03-06", "2")], &SituationalPayPolicy::default());
        assert!(result.adjustments.is_empty());
        assert!(result.audit_steps.is_empty());
        assert_eq!(result.total, Decimal::ZERO);
    }

    #[test]
    fn test_minimum_pay_lower_guarantee() {
        // 2 hours earn 100.00; guarantee max(100, 4 * 50) = 200.
        let result = run(&[record("2023-03-06", "2")], &minimum_policy());
        assert_eq!(result.adjustments.len(), 1);
        assert_eq!(result.adjustments[0].kind, AdjustmentKind::MinimumPay);
        assert_eq!(result.adjustments[0].amount, dec("100.00"));
    }

    #[test]
    fn test_minimum_pay_escalates_past_threshold() {
        // 5 hours earn 250.00; guarantee 8 * 50 = 400.
        let result = run(&[record("2023-03-06", "5")], &minimum_policy());
        assert_eq!(result.adjustments[0].amount, dec("150.00"));
        assert_eq!(result.adjustments[0].units, dec("8"));
    }

    #[test]
    fn test_minimum_pay_saturday_scales_flat_minimum_only() {
        // Saturday 2 hours at 1.5x earn 150.00; guarantee max(100 * 1.5, 4 * 50) = 200.
        let result = run(&[record("2023-03-11", "2")], &minimum_policy());
        assert_eq!(result.adjustments[0].amount, dec("50.00"));
    }

    #[test]
    fn test_minimum_pay_sunday_flat_minimum_doubles() {
        let mut policy = minimum_policy();
        if let Some(rule) = policy.minimum_pay.as_mut() {
            rule.flat_minimum = dec("150.00");
        }
        // Sunday 1 hour at 2x earns 100.00; guarantee max(150 * 2, 4 * 50) = 300.
        let result = run(&[record("2023-03-12", "1")], &policy);
        assert_eq!(result.adjustments[0].amount, dec("200.00"));
    }

    #[test]
    fn test_minimum_pay_flat_minimum_wins_for_low_rates() {
        let mut policy = minimum_policy();
        if let Some(rule) = policy.minimum_pay.as_mut() {
            rule.flat_minimum = dec("250.00");
        }
        // Guarantee max(250, 200) = 250; 2 hours earn 100.
        let result = run(&[record("2023-03-06", "2")], &policy);
        assert_eq!(result.adjustments[0].amount, dec("150.00"));
    }

    #[test]
    fn test_minimum_pay_not_owed_on_full_day() {
        let result = run(&[record("2023-03-06", "8")], &minimum_policy());
        assert!(result.adjustments.is_empty());
        assert_eq!(result.audit_steps.len(), 1);
    }

    #[test]
    fn test_minimum_pay_owed_when_reporting_zero_hours() {
        // Reported, sent home: earns 0; guarantee max(100, 4 * 50) = 200.
        let result = run(&[record("2023-03-06", "0")], &minimum_policy());
        assert_eq!(result.adjustments.len(), 1);
        assert_eq!(result.adjustments[0].kind, AdjustmentKind::MinimumPay);
        assert_eq!(result.adjustments[0].amount, dec("200.00"));
        assert_eq!(result.adjustments[0].units, dec("4"));
    }


    fn meal_policy() -> SituationalPayPolicy {
        SituationalPayPolicy {
            missed_meal: Some(MealPenaltyPolicy {
                threshold_hours: dec("5"),
            }),
            ..SituationalPayPolicy::default()
        }
    }

    #[test]
    fn test_missed_meal_on_regular_tail() {
        let mut no_meal = record("2023-03-06", "8");
        no_meal.meal_taken = false;
        // Tail 3 regular hours * 50 * 0.5 = 75.00
        let result = run(&[no_meal], &meal_policy());
        assert_eq!(result.adjustments[0].amount, dec("75.00"));
        assert_eq!(result.adjustments[0].units, dec("3"));
    }

    #[test]
    fn test_missed_meal_tail_taken_from_top_tier() {
        let mut no_meal = record("2023-03-06", "12");
        no_meal.meal_taken = false;
        // Tail 7: 2 double time, 2 overtime, 3 regular -> 3 * 25 = 75.00
        let result = run(&[no_meal], &meal_policy());
        assert_eq!(result.adjustments[0].amount, dec("75.00"));
    }

    #[test]
    fn test_missed_meal_uses_rounded_hours() {
        let mut no_meal = record("2023-03-06", "7.1");
        no_meal.meal_taken = false;
        // 7.1 rounds to 7.00, the hours earnings were paid on.
        // Tail 2 regular hours * 50 * 0.5 = 50.00
        let result = run(&[no_meal], &meal_policy());
        assert_eq!(result.adjustments[0].units, dec("2"));
        assert_eq!(result.adjustments[0].amount, dec("50.00"));
    }

    #[test]
    fn test_missed_meal_none_when_tail_already_premium() {
        let mut sunday = record("2023-03-12", "8");
        sunday.meal_taken = false;
        let result = run(&[sunday], &meal_policy());
        assert!(result.adjustments.is_empty());
    }

    #[test]
    fn test_meal_taken_no_penalty() {
        let result = run(&[record("2023-03-06", "10")], &meal_policy());
        assert!(result.adjustments.is_empty());
    }

    fn travel_policy() -> SituationalPayPolicy {
        SituationalPayPolicy {
            travel: Some(TravelPolicy {
                bands: vec![
                    TravelBand {
                        min_distance: dec("30"),
                        daily_amount: dec("25.00"),
                    },
                    TravelBand {
                        min_distance: dec("60"),
                        daily_amount: dec("55.00"),
                    },
                ],
            }),
            ..SituationalPayPolicy::default()
        }
    }

    #[test]
    fn test_travel_once_per_day_at_furthest_site() {
        let mut near = record("2023-03-06", "4");
        near.travel_distance = dec("35");
        let mut far = record("2023-03-06", "4");
        far.travel_distance = dec("70");
        let result = run(&[near, far], &travel_policy());
        assert_eq!(result.adjustments.len(), 1);
        assert_eq!(result.adjustments[0].amount, dec("55.00"));
    }

    #[test]
    fn test_travel_below_lowest_band() {
        let mut near = record("2023-03-06", "8");
        near.travel_distance = dec("29");
        let result = run(&[near], &travel_policy());
        assert!(result.adjustments.is_empty());
    }

    #[test]
    fn test_installation_premium_per_record() {
        let policy = SituationalPayPolicy {
            installation: Some(InstallationPolicy {
                premium_per_hour: dec("1.50"),
            }),
            ..SituationalPayPolicy::default()
        };
        let mut install = record("2023-03-06", "6");
        install.installation = true;
        let other = record("2023-03-06", "2");
        let result = run(&[install, other], &policy);
        assert_eq!(result.adjustments.len(), 1);
        assert_eq!(result.adjustments[0].amount, dec("9.00"));
    }

    #[test]
    fn test_steps_numbered_in_rule_order() {
        let policy = SituationalPayPolicy {
            minimum_pay: minimum_policy().minimum_pay,
            missed_meal: meal_policy().missed_meal,
            travel: travel_policy().travel,
            installation: None,
        };
        let result = run(&[record("2023-03-06", "8")], &policy);
        let ids: Vec<_> = result.audit_steps.iter().map(|s| s.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["minimum_pay", "missed_meal", "travel_allowance"]);
        let numbers: Vec<_> = result.audit_steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
