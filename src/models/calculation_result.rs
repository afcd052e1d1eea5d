//! Calculation result models for the payroll engine.
//!
//! This module contains the [`PayrollCalculation`] type and its associated
//! structures that capture every output of one worker's pay calculation:
//! earnings lines, situational adjustments, withholding, employer fringe
//! contributions, external deductions, net pay, and the audit trace.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::{HourBreakdown, PayPeriod};

/// The tier a pay line is paid at.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayCategory;
///
/// let category = PayCategory::DoubleTime;
/// assert_eq!(serde_json::to_string(&category).unwrap(), "\"double_time\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayCategory {
    /// Straight time.
    Regular,
    /// Time and a half.
    Overtime,
    /// Double time.
    DoubleTime,
}

/// A single earnings line: one tier of one daily record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayLine {
    /// The date worked.
    pub date: NaiveDate,
    /// The project the hours were booked to.
    pub project_id: String,
    /// Index of the originating record in the input.
    pub record_index: usize,
    /// The tier being paid.
    pub category: PayCategory,
    /// Hours paid in this tier (quarter-hour rounded).
    pub hours: Decimal,
    /// The resolved hourly rate before the tier multiplier.
    pub rate: Decimal,
    /// Tier multiplier (1, 1.5, or 2).
    pub multiplier: Decimal,
    /// `hours * rate * multiplier`, rounded to the cent.
    pub amount: Decimal,
}

/// The kind of a situational pay adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Shortfall up to the daily minimum-pay guarantee.
    MinimumPay,
    /// Premium for working past the meal threshold without a meal.
    MissedMeal,
    /// Distance-banded travel/subsistence allowance.
    Travel,
    /// Per-hour premium for installation work.
    Installation,
}

/// A situational pay adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    /// The date the adjustment applies to.
    pub date: NaiveDate,
    /// What kind of adjustment this is.
    pub kind: AdjustmentKind,
    /// Units the rate applies to (hours, days).
    pub units: Decimal,
    /// Rate per unit.
    pub rate: Decimal,
    /// Amount paid, rounded to the cent.
    pub amount: Decimal,
    /// Human-readable description.
    pub description: String,
}

/// Gross pay for the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossPay {
    /// Sum of all pay lines.
    pub earnings: Decimal,
    /// Sum of all adjustments.
    pub adjustments: Decimal,
    /// `earnings + adjustments`.
    pub gross_pay: Decimal,
}

/// Itemized withholding for the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingSummary {
    /// Federal income tax, including additional withholding.
    pub federal_income_tax: Decimal,
    /// State income tax, including additional withholding.
    pub state_income_tax: Decimal,
    /// Old-age/survivors insurance.
    pub old_age_survivors: Decimal,
    /// Hospital insurance, including any surtax.
    pub hospital_insurance: Decimal,
    /// State disability insurance.
    pub state_disability: Decimal,
    /// Sum of the above.
    pub total: Decimal,
}

/// An employer-paid benefit fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FringeBenefit {
    /// Health and welfare fund.
    HealthWelfare,
    /// Pension fund.
    Pension,
    /// Vacation fund.
    Vacation,
    /// Apprenticeship and training fund.
    Training,
}

/// One fringe line item: a benefit at one rate across the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FringeContribution {
    /// The benefit fund.
    pub benefit: FringeBenefit,
    /// Hours across the period the contribution is owed on.
    pub hours: Decimal,
    /// Employer rate per hour.
    pub rate: Decimal,
    /// `hours * rate`, rounded to the cent once.
    pub amount: Decimal,
}

/// Employer fringe contributions for the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FringeSummary {
    /// Line items, one per benefit and rate with non-zero hours.
    pub contributions: Vec<FringeContribution>,
    /// Totals per benefit fund.
    pub by_benefit: BTreeMap<FringeBenefit, Decimal>,
    /// Sum of every line item.
    pub total: Decimal,
}

/// An opaque deduction supplied by the caller (e.g. union dues).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDeduction {
    /// Deduction code.
    pub code: String,
    /// Description shown on the statement.
    #[serde(default)]
    pub description: String,
    /// Amount deducted.
    pub amount: Decimal,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Where the rule's parameters came from (policy or table).
    pub reference: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate conditions that don't prevent calculation
/// but need a person to look at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{AuditStep, AuditTrace};
///
/// let trace = AuditTrace {
///     steps: vec![AuditStep {
///         step_number: 1,
///         rule_id: "gross_pay".to_string(),
///         rule_name: "Gross pay".to_string(),
///         reference: "earnings + adjustments".to_string(),
///         input: serde_json::json!({}),
///         output: serde_json::json!({"gross_pay": "100.00"}),
///         reasoning: "".to_string(),
///     }],
///     warnings: vec![],
/// };
///
/// assert!(trace.step("gross_pay").is_some());
/// assert_eq!(trace.values()["gross_pay"]["gross_pay"], "100.00");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

impl AuditTrace {
    /// Returns the first step recorded under `rule_id`.
    pub fn step(&self, rule_id: &str) -> Option<&AuditStep> {
        self.steps.iter().find(|s| s.rule_id == rule_id)
    }

    /// Returns every step recorded under `rule_id`, in order.
    pub fn steps_for<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a AuditStep> + 'a {
        self.steps.iter().filter(move |s| s.rule_id == rule_id)
    }

    /// Returns the output of every step keyed by rule id.
    ///
    /// Rules that fire more than once are keyed `rule_id#step_number` after
    /// the first occurrence.
    pub fn values(&self) -> BTreeMap<String, serde_json::Value> {
        let mut values = BTreeMap::new();
        for step in &self.steps {
            let key = if values.contains_key(&step.rule_id) {
                format!("{}#{}", step.rule_id, step.step_number)
            } else {
                step.rule_id.clone()
            };
            values.insert(key, step.output.clone());
        }
        values
    }
}

/// Lifecycle state of a calculation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    /// The current calculation for its worker and period.
    Active,
    /// Replaced by a later calculation; retained for audit.
    Voided,
}

/// The complete result of one worker's payroll calculation for one period.
///
/// Records are never modified in place. A correction goes through
/// [`PayrollCalculation::supersede`], which hands back the old record marked
/// voided alongside the replacement that points at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollCalculation {
    /// Deterministic identifier derived from the inputs.
    pub calculation_id: Uuid,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// The tax year whose tables were applied.
    pub tax_year: i32,
    /// The worker the calculation is for.
    pub worker_id: String,
    /// The pay period covered.
    pub pay_period: PayPeriod,
    /// Active or voided.
    pub status: CalculationStatus,
    /// The calculation this one replaces, if any.
    #[serde(default)]
    pub supersedes: Option<Uuid>,
    /// Exact hour breakdown for the period.
    pub hours_exact: HourBreakdown,
    /// Quarter-hour rounded breakdown for the period.
    pub hours: HourBreakdown,
    /// Earnings lines.
    pub pay_lines: Vec<PayLine>,
    /// Situational adjustments.
    pub adjustments: Vec<Adjustment>,
    /// Gross pay breakdown.
    pub gross: GrossPay,
    /// Itemized withholding.
    pub withholding: WithholdingSummary,
    /// Employer fringe contributions.
    pub fringe: FringeSummary,
    /// External deductions, as supplied.
    pub deductions: Vec<ExternalDeduction>,
    /// Sum of external deductions.
    pub deductions_total: Decimal,
    /// `gross - withholding - deductions`; may be negative (see warnings).
    pub net_pay: Decimal,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl PayrollCalculation {
    /// Returns true if this record has not been superseded.
    pub fn is_active(&self) -> bool {
        self.status == CalculationStatus::Active
    }

    /// Replaces this calculation with `replacement`.
    ///
    /// Returns `(voided, replacement)`: this record marked voided, and the
    /// replacement linked back to it. Fails if this record is already voided,
    /// if the replacement is for a different worker or period, or if it is
    /// the same calculation.
    pub fn supersede(
        self,
        replacement: PayrollCalculation,
    ) -> EngineResult<(PayrollCalculation, PayrollCalculation)> {
        if !self.is_active() {
            return Err(EngineError::malformed(
                "supersedes",
                format!("calculation {} is already voided", self.calculation_id),
            ));
        }
        if self.worker_id != replacement.worker_id || self.pay_period != replacement.pay_period {
            return Err(EngineError::malformed(
                "supersedes",
                "replacement must cover the same worker and pay period",
            ));
        }
        if self.calculation_id == replacement.calculation_id {
            return Err(EngineError::malformed(
                "supersedes",
                "replacement is identical to the calculation it replaces",
            ));
        }

        let supersedes = Some(self.calculation_id);
        let voided = PayrollCalculation {
            status: CalculationStatus::Voided,
            ..self
        };
        let linked = PayrollCalculation {
            status: CalculationStatus::Active,
            supersedes,
            ..replacement
        };
        Ok((voided, linked))
    }
}
