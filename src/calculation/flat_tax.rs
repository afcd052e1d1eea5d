//! Flat-rate payroll taxes.
//!
//! Old-age/survivors and state disability are capped at an annual wage base;
//! hospital insurance is uncapped but adds a surtax on wages past a
//! year-to-date threshold. All three read the year-to-date snapshot and
//! never modify it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{FlatTaxRule, FlatTaxRules, HospitalInsuranceRule};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, YearToDateAccumulator};

use super::rounding::{floor_at_zero, round_money};

/// One flat tax applied to the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTaxLine {
    /// Wages the tax was charged on.
    pub taxable_wages: Decimal,
    /// Rounded tax.
    pub tax: Decimal,
    /// The audit step recording the computation.
    pub audit_step: AuditStep,
}

/// All flat taxes for the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTaxResult {
    /// Old-age/survivors insurance.
    pub old_age_survivors: FlatTaxLine,
    /// Hospital insurance including surtax.
    pub hospital_insurance: FlatTaxLine,
    /// State disability insurance.
    pub state_disability: FlatTaxLine,
}

impl FlatTaxResult {
    /// Sum of the three taxes.
    pub fn total(&self) -> Decimal {
        self.old_age_survivors.tax + self.hospital_insurance.tax + self.state_disability.tax
    }

    /// The audit steps in the order they were recorded.
    pub fn audit_steps(&self) -> impl Iterator<Item = &AuditStep> {
        [
            &self.old_age_survivors.audit_step,
            &self.hospital_insurance.audit_step,
            &self.state_disability.audit_step,
        ]
        .into_iter()
    }
}

fn check_non_negative(table: &str, name: &str, value: Decimal) -> EngineResult<()> {
    if value < Decimal::ZERO {
        return Err(EngineError::corrupt(
            format!("flat_taxes.{}", table),
            format!("{} is negative ({})", name, value),
        ));
    }
    Ok(())
}

/// Applies a wage-base-capped flat tax.
///
/// Taxable wages are the period wages, limited to whatever is left of the
/// wage base after year-to-date wages. A rule without a wage base is
/// uncapped.
///
/// ```
/// use payroll_engine::calculation::calculate_capped_tax;
/// use payroll_engine::config::FlatTaxRule;
/// use rust_decimal::Decimal;
///
/// let rule = FlatTaxRule {
///     rate: Decimal::new(62, 3),
///     wage_base: Some(Decimal::from(160_200)),
/// };
/// let line = calculate_capped_tax(
///     "old_age_survivors",
///     &rule,
///     Decimal::from(1000),
///     Decimal::from(159_700),
///     1,
/// )
/// .unwrap();
/// assert_eq!(line.taxable_wages, Decimal::from(500));
/// assert_eq!(line.tax, Decimal::new(3100, 2));
/// ```
pub fn calculate_capped_tax(
    name: &str,
    rule: &FlatTaxRule,
    period_wages: Decimal,
    ytd_wages: Decimal,
    step_number: u32,
) -> EngineResult<FlatTaxLine> {
    check_non_negative(name, "rate", rule.rate)?;
    if let Some(base) = rule.wage_base {
        check_non_negative(name, "wage_base", base)?;
    }

    let remaining = rule.wage_base.map(|base| floor_at_zero(base - ytd_wages));
    let taxable_wages = match remaining {
        Some(remaining) => period_wages.min(remaining),
        None => period_wages,
    };
    let tax = round_money(taxable_wages * rule.rate);

    let reasoning = match (rule.wage_base, remaining) {
        (Some(base), Some(remaining)) => format!(
            "${} of ${} wage base remains after ${} YTD; ${} taxable x {} = ${}",
            remaining, base, ytd_wages, taxable_wages, rule.rate, tax
        ),
        _ => format!("${} taxable x {} = ${}", taxable_wages, rule.rate, tax),
    };

    Ok(FlatTaxLine {
        taxable_wages,
        tax,
        audit_step: AuditStep {
            step_number,
            rule_id: name.to_string(),
            rule_name: display_name(name),
            reference: format!("flat_taxes.{}", name),
            input: serde_json::json!({
                "period_wages": period_wages.to_string(),
                "ytd_wages": ytd_wages.to_string(),
                "rate": rule.rate.to_string(),
                "wage_base": rule.wage_base.map(|b| b.to_string()),
            }),
            output: serde_json::json!({
                "taxable_wages": taxable_wages.to_string(),
                "tax": tax.to_string(),
            }),
            reasoning,
        },
    })
}

/// Applies hospital insurance with its surtax.
///
/// The surtax falls on the part of `ytd + period` wages above the threshold
/// that was not already above it at `ytd`.
pub fn calculate_hospital_insurance(
    rule: &HospitalInsuranceRule,
    period_wages: Decimal,
    ytd_wages: Decimal,
    step_number: u32,
) -> EngineResult<FlatTaxLine> {
    const NAME: &str = "hospital_insurance";
    check_non_negative(NAME, "rate", rule.rate)?;
    check_non_negative(NAME, "surtax_rate", rule.surtax_rate)?;
    check_non_negative(NAME, "surtax_threshold", rule.surtax_threshold)?;

    let above_after = floor_at_zero(ytd_wages + period_wages - rule.surtax_threshold);
    let above_before = floor_at_zero(ytd_wages - rule.surtax_threshold);
    let surtax_wages = above_after - above_before;
    let tax = round_money(period_wages * rule.rate + surtax_wages * rule.surtax_rate);

    Ok(FlatTaxLine {
        taxable_wages: period_wages,
        tax,
        audit_step: AuditStep {
            step_number,
            rule_id: NAME.to_string(),
            rule_name: display_name(NAME),
            reference: format!("flat_taxes.{}", NAME),
            input: serde_json::json!({
                "period_wages": period_wages.to_string(),
                "ytd_wages": ytd_wages.to_string(),
                "rate": rule.rate.to_string(),
                "surtax_rate": rule.surtax_rate.to_string(),
                "surtax_threshold": rule.surtax_threshold.to_string(),
            }),
            output: serde_json::json!({
                "taxable_wages": period_wages.to_string(),
                "surtax_wages": surtax_wages.to_string(),
                "tax": tax.to_string(),
            }),
            reasoning: format!(
                "${} x {} + ${} over ${} threshold x {} = ${}",
                period_wages, rule.rate, surtax_wages, rule.surtax_threshold, rule.surtax_rate, tax
            ),
        },
    })
}

/// Applies all flat taxes. Audit steps are numbered from `step_number`.
pub fn calculate_flat_taxes(
    rules: &FlatTaxRules,
    period_wages: Decimal,
    ytd: &YearToDateAccumulator,
    step_number: u32,
) -> EngineResult<FlatTaxResult> {
    Ok(FlatTaxResult {
        old_age_survivors: calculate_capped_tax(
            "old_age_survivors",
            &rules.old_age_survivors,
            period_wages,
            ytd.old_age_survivors_wages,
            step_number,
        )?,
        hospital_insurance: calculate_hospital_insurance(
            &rules.hospital_insurance,
            period_wages,
            ytd.hospital_insurance_wages,
            step_number + 1,
        )?,
        state_disability: calculate_capped_tax(
            "state_disability",
            &rules.state_disability,
            period_wages,
            ytd.state_disability_wages,
            step_number + 2,
        )?,
    })
}

fn display_name(name: &str) -> String {
    match name {
        "old_age_survivors" => "Old-Age/Survivors Insurance".to_string(),
        "hospital_insurance" => "Hospital Insurance".to_string(),
        "state_disability" => "State Disability Insurance".to_string(),
        other => other.to_string(),
    }
}
