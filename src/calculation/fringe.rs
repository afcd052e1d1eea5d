//! Employer fringe benefit contributions.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AuditStep, DailyRecord, FringeBenefit, FringeContribution, FringeSummary};

use super::hours_classifier::HoursClassification;
use super::rounding::round_money;
use super::wage_resolver::ResolvedRate;

/// Fringe contributions with their audit step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FringeResult {
    /// Line items and totals.
    pub summary: FringeSummary,
    /// The audit step recording the totals.
    pub audit_step: AuditStep,
}

/// Computes fringe contributions owed on every hour worked.
///
/// Each record's rounded total hours are multiplied by the fringe rates from
/// the same wage-rate row that priced the record. Products are summed
/// unrounded per (benefit, rate) across the period, so a line only splits
/// when a rate changes mid-period. Every line is rounded once; totals are
/// sums of rounded lines.
pub fn calculate_fringe(
    records: &[DailyRecord],
    classification: &HoursClassification,
    rates: &[ResolvedRate],
    step_number: u32,
) -> FringeResult {
    // (benefit, rate) -> (hours, unrounded amount), in first-seen order.
    let mut lines: Vec<(FringeBenefit, Decimal, Decimal, Decimal)> = Vec::new();
    let mut per_record = Vec::new();

    for ((record, classified), rate) in records.iter().zip(&classification.records).zip(rates) {
        let hours = classified.hours.total();
        if hours.is_zero() {
            continue;
        }
        let fringe = &rate.fringe;
        let benefits = [
            (FringeBenefit::HealthWelfare, fringe.health_welfare),
            (FringeBenefit::Pension, fringe.pension),
            (FringeBenefit::Vacation, fringe.vacation),
            (FringeBenefit::Training, fringe.training),
        ];
        let mut exact = BTreeMap::new();
        for (benefit, per_hour) in benefits {
            if per_hour.is_zero() {
                continue;
            }
            let amount = hours * per_hour;
            exact.insert(benefit_key(benefit), amount.normalize().to_string());
            match lines
                .iter_mut()
                .find(|line| line.0 == benefit && line.1 == per_hour)
            {
                Some(line) => {
                    line.2 += hours;
                    line.3 += amount;
                }
                None => lines.push((benefit, per_hour, hours, amount)),
            }
        }
        per_record.push(serde_json::json!({
            "date": record.work_date.to_string(),
            "hours": hours.normalize().to_string(),
            "exact": exact,
        }));
    }

    let contributions: Vec<FringeContribution> = lines
        .into_iter()
        .map(|(benefit, rate, hours, amount)| FringeContribution {
            benefit,
            hours,
            rate,
            amount: round_money(amount),
        })
        .collect();

    let mut by_benefit = BTreeMap::new();
    for line in &contributions {
        *by_benefit.entry(line.benefit).or_insert(Decimal::ZERO) += line.amount;
    }
    let total: Decimal = contributions.iter().map(|line| line.amount).sum();

    let audit_step = AuditStep {
        step_number,
        rule_id: "fringe_benefits".to_string(),
        rule_name: "Fringe Benefit Contributions".to_string(),
        reference: "wage_rates: fringe".to_string(),
        input: serde_json::json!({
            "hours": classification.totals.total().normalize().to_string(),
            "records": per_record,
        }),
        output: serde_json::json!({
            "by_benefit": by_benefit
                .iter()
                .map(|(benefit, amount)| (benefit_key(*benefit), amount.to_string()))
                .collect::<BTreeMap<_, _>>(),
            "total": total.to_string(),
        }),
        reasoning: format!(
            "{} line items across {} records total ${}",
            contributions.len(),
            records.len(),
            total
        ),
    };

    FringeResult {
        summary: FringeSummary {
            contributions,
            by_benefit,
            total,
        },
        audit_step,
    }
}

fn benefit_key(benefit: FringeBenefit) -> &'static str {
    match benefit {
        FringeBenefit::HealthWelfare => "health_welfare",
        FringeBenefit::Pension => "pension",
        FringeBenefit::Vacation => "vacation",
        FringeBenefit::Training => "training",
    }
}
