//! Earnings and gross pay.
//!
//! Prices each classified record's hours at the resolved rate and its tier
//! multiplier, then adds situational adjustments to give gross pay.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    Adjustment, AuditStep, DailyRecord, GrossPay, PayCategory, PayLine,
};

use super::hours_classifier::HoursClassification;
use super::rounding::{DOUBLE_TIME_MULTIPLIER, OVERTIME_MULTIPLIER, floor_at_zero, round_money};
use super::wage_resolver::ResolvedRate;

/// Returns the multiplier paid for a tier.
pub fn category_multiplier(category: PayCategory) -> Decimal {
    match category {
        PayCategory::Regular => Decimal::ONE,
        PayCategory::Overtime => OVERTIME_MULTIPLIER,
        PayCategory::DoubleTime => DOUBLE_TIME_MULTIPLIER,
    }
}

/// The priced earnings lines for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsResult {
    /// One line per record per tier with hours.
    pub pay_lines: Vec<PayLine>,
    /// Sum of line amounts.
    pub earnings: Decimal,
    /// The audit step recording the pricing.
    pub audit_step: AuditStep,
}

/// Prices classified hours.
///
/// `rates` must hold one resolved rate per record, in record order. Each line
/// is `hours * rate * multiplier` rounded to the cent; the total is the sum
/// of rounded lines.
pub fn calculate_earnings(
    records: &[DailyRecord],
    classification: &HoursClassification,
    rates: &[ResolvedRate],
    step_number: u32,
) -> EarningsResult {
    let mut pay_lines = Vec::new();

    for ((record, classified), rate) in records.iter().zip(&classification.records).zip(rates) {
        let tiers = [
            (PayCategory::Regular, classified.hours.regular),
            (PayCategory::Overtime, classified.hours.overtime),
            (PayCategory::DoubleTime, classified.hours.double_time),
        ];
        for (category, hours) in tiers {
            if hours.is_zero() {
                continue;
            }
            let multiplier = category_multiplier(category);
            pay_lines.push(PayLine {
                date: record.work_date,
                project_id: record.project_id.clone(),
                record_index: classified.record_index,
                category,
                hours,
                rate: rate.hourly_rate,
                multiplier,
                amount: round_money(hours * rate.hourly_rate * multiplier),
            });
        }
    }

    let earnings: Decimal = pay_lines.iter().map(|line| line.amount).sum();

    let audit_step = AuditStep {
        step_number,
        rule_id: "earnings".to_string(),
        rule_name: "Earnings".to_string(),
        reference: "regular x1, overtime x1.5, double time x2".to_string(),
        input: serde_json::json!({
            "regular_hours": classification.totals.regular.normalize().to_string(),
            "overtime_hours": classification.totals.overtime.normalize().to_string(),
            "double_time_hours": classification.totals.double_time.normalize().to_string(),
        }),
        output: serde_json::json!({
            "pay_lines": pay_lines.len(),
            "earnings": earnings.to_string(),
        }),
        reasoning: format!(
            "{} pay lines across {} records total ${}",
            pay_lines.len(),
            records.len(),
            earnings
        ),
    };

    EarningsResult {
        pay_lines,
        earnings,
        audit_step,
    }
}

/// Gross pay with its audit step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossPayResult {
    /// The gross pay breakdown.
    pub gross: GrossPay,
    /// The audit step recording the sum.
    pub audit_step: AuditStep,
}

/// Adds earnings and adjustments into gross pay, never below zero.
///
/// ```
/// use payroll_engine::calculation::calculate_gross_pay;
/// use rust_decimal::Decimal;
///
/// let result = calculate_gross_pay(Decimal::new(210000, 2), &[], 4);
/// assert_eq!(result.gross.gross_pay, Decimal::new(210000, 2));
/// ```
pub fn calculate_gross_pay(
    earnings: Decimal,
    adjustments: &[Adjustment],
    step_number: u32,
) -> GrossPayResult {
    let adjustments_total: Decimal = adjustments.iter().map(|a| a.amount).sum();
    let gross_pay = floor_at_zero(earnings + adjustments_total);

    let audit_step = AuditStep {
        step_number,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        reference: "earnings + adjustments".to_string(),
        input: serde_json::json!({
            "earnings": earnings.to_string(),
            "adjustments": adjustments_total.to_string(),
        }),
        output: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
        }),
        reasoning: format!(
            "Earnings ${} + adjustments ${} = ${}",
            earnings, adjustments_total, gross_pay
        ),
    };

    GrossPayResult {
        gross: GrossPay {
            earnings,
            adjustments: adjustments_total,
            gross_pay,
        },
        audit_step,
    }
}
