//! Income-tax withholding.
//!
//! Federal and state withholding share one four-stage procedure:
//!
//! 1. annualize period wages and apply the election's allowances or
//!    income/deduction adjustments;
//! 2. look the annual amount up in the bracket table;
//! 3. subtract credits, convert back to a per-period amount, and round;
//! 4. add the election's flat additional withholding.
//!
//! Each stage is its own type in an [`IncomeTaxPipeline`], and each stage's
//! only exit is the next stage's constructor, so a stage cannot be skipped or
//! reordered. State withholding is skipped entirely for wages at or below the
//! low-income exemption threshold.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{JurisdictionRules, TaxTables};
use crate::error::EngineResult;
use crate::models::{
    AuditStep, BracketRow, ElectionForm, Jurisdiction, PayFrequency, TaxTableKey,
    WithholdingElection,
};

use super::rounding::{floor_at_zero, round_money};

/// Everything the pipeline reads.
#[derive(Debug, Clone, Copy)]
pub struct IncomeTaxInput<'a> {
    /// Federal or state.
    pub jurisdiction: Jurisdiction,
    /// Taxable wages for the period.
    pub period_wages: Decimal,
    /// The worker's pay frequency.
    pub frequency: PayFrequency,
    /// The worker's election for this jurisdiction.
    pub election: &'a WithholdingElection,
    /// Annualization constants for this jurisdiction.
    pub rules: &'a JurisdictionRules,
    /// All bracket tables.
    pub tables: &'a TaxTables,
}

/// Stage 0: nothing computed yet.
#[derive(Debug, Clone, Copy)]
pub struct Unstarted;

/// Stage 1: annual wages after election adjustments.
#[derive(Debug, Clone, Copy)]
pub struct Annualized {
    /// Period wages times periods per year.
    pub annual_wages: Decimal,
    /// Annual wages after allowances or income adjustments, floored at zero.
    pub adjusted_annual_wages: Decimal,
}

/// Stage 2: annual tax from the bracket table.
#[derive(Debug, Clone, Copy)]
pub struct AnnualTax {
    /// Stage 1 values.
    pub annualized: Annualized,
    /// The bracket row the amount fell in.
    pub row: BracketRow,
    /// Unrounded annual tax.
    pub annual_tax: Decimal,
}

/// Stage 3: per-period tax after credits, rounded to the cent.
#[derive(Debug, Clone, Copy)]
pub struct PeriodTax {
    /// Stage 2 values.
    pub annual: AnnualTax,
    /// Annual credits subtracted (income-based era only).
    pub credits: Decimal,
    /// Rounded per-period tax.
    pub period_tax: Decimal,
}

/// The withholding procedure, parameterized by the stage reached.
#[derive(Debug, Clone)]
pub struct IncomeTaxPipeline<'a, S> {
    input: IncomeTaxInput<'a>,
    stage: S,
    steps: Vec<AuditStep>,
    next_step: u32,
}

/// The result of one jurisdiction's income-tax withholding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxResult {
    /// Federal or state.
    pub jurisdiction: Jurisdiction,
    /// True if the low-income exemption applied.
    pub exempt: bool,
    /// Annualized wages before adjustments.
    pub annual_wages: Decimal,
    /// Annualized wages after adjustments.
    pub adjusted_annual_wages: Decimal,
    /// Unrounded annual tax.
    pub annual_tax: Decimal,
    /// Rounded per-period tax before additional withholding.
    pub period_tax: Decimal,
    /// Additional withholding from the election.
    pub additional_withholding: Decimal,
    /// Amount withheld.
    pub total: Decimal,
    /// One step per stage.
    pub audit_steps: Vec<AuditStep>,
}

impl<'a, S> IncomeTaxPipeline<'a, S> {
    /// Returns the current stage's values.
    pub fn stage(&self) -> &S {
        &self.stage
    }

    fn rule_id(&self, suffix: &str) -> String {
        format!("{}_{}", self.input.jurisdiction.as_str(), suffix)
    }

    fn rule_name(&self, name: &str) -> String {
        let jurisdiction = match self.input.jurisdiction {
            Jurisdiction::Federal => "Federal",
            Jurisdiction::State => "State",
        };
        format!("{} {}", jurisdiction, name)
    }

    fn table_key(&self) -> TaxTableKey {
        TaxTableKey {
            jurisdiction: self.input.jurisdiction,
            filing_status: self.input.election.filing_status,
            pay_frequency: self.input.frequency,
            era: self.input.election.era(),
        }
    }

    fn advance<T>(self, stage: T, step: AuditStep) -> IncomeTaxPipeline<'a, T> {
        let mut steps = self.steps;
        steps.push(step);
        IncomeTaxPipeline {
            input: self.input,
            stage,
            steps,
            next_step: self.next_step + 1,
        }
    }
}

impl<'a> IncomeTaxPipeline<'a, Unstarted> {
    /// Starts the procedure. Audit steps are numbered from `step_number`.
    pub fn new(input: IncomeTaxInput<'a>, step_number: u32) -> Self {
        Self {
            input,
            stage: Unstarted,
            steps: Vec::new(),
            next_step: step_number,
        }
    }

    /// Stage 1: annualize wages and apply the election.
    ///
    /// The allowance-based era subtracts allowances times the per-allowance
    /// amount. The income-based era adds other income and subtracts
    /// deductions and the filing-status standard amount, which is zero when
    /// the multiple-jobs checkbox is set.
    pub fn annualize(self) -> EngineResult<IncomeTaxPipeline<'a, Annualized>> {
        let input = self.input;
        let periods = input.frequency.periods_per_year();
        let annual_wages = input.period_wages * periods;

        let (adjusted, detail) = match &input.election.form {
            ElectionForm::AllowanceBased { allowances } => {
                let allowance_total = Decimal::from(*allowances) * input.rules.allowance_amount;
                (
                    annual_wages - allowance_total,
                    serde_json::json!({
                        "allowances": allowances,
                        "allowance_amount": input.rules.allowance_amount.to_string(),
                        "allowance_total": allowance_total.to_string(),
                    }),
                )
            }
            ElectionForm::IncomeBased {
                other_income,
                deductions,
                extra_withholding_checkbox,
                ..
            } => {
                let standard = if *extra_withholding_checkbox {
                    Decimal::ZERO
                } else {
                    input
                        .rules
                        .standard_amount(input.jurisdiction, input.election.filing_status)?
                };
                (
                    annual_wages + *other_income - *deductions - standard,
                    serde_json::json!({
                        "other_income": other_income.to_string(),
                        "deductions": deductions.to_string(),
                        "standard_amount": standard.to_string(),
                        "extra_withholding_checkbox": extra_withholding_checkbox,
                    }),
                )
            }
        };
        let adjusted_annual_wages = floor_at_zero(adjusted);

        let step = AuditStep {
            step_number: self.next_step,
            rule_id: self.rule_id("annualize"),
            rule_name: self.rule_name("Annualization"),
            reference: format!(
                "{} periods per year, {} election",
                periods,
                input.election.era().as_str()
            ),
            input: serde_json::json!({
                "period_wages": input.period_wages.to_string(),
                "frequency": input.frequency.as_str(),
                "election": detail,
            }),
            output: serde_json::json!({
                "annual_wages": annual_wages.to_string(),
                "adjusted_annual_wages": adjusted_annual_wages.to_string(),
            }),
            reasoning: format!(
                "${} x {} = ${} annual; ${} after election adjustments",
                input.period_wages, periods, annual_wages, adjusted_annual_wages
            ),
        };

        Ok(self.advance(
            Annualized {
                annual_wages,
                adjusted_annual_wages,
            },
            step,
        ))
    }
}

impl<'a> IncomeTaxPipeline<'a, Annualized> {
    /// Stage 2: find the bracket row and compute annual tax.
    ///
    /// A missing table is [`crate::error::EngineError::MissingRateData`]; an
    /// amount no row contains is [`crate::error::EngineError::TaxTableCorrupt`].
    pub fn lookup_bracket(self) -> EngineResult<IncomeTaxPipeline<'a, AnnualTax>> {
        let key = self.table_key();
        let table = self.input.tables.get(&key)?;
        let amount = self.stage.adjusted_annual_wages;
        let row = *table.lookup(amount)?;
        let annual_tax = row.tax_for(amount);

        let step = AuditStep {
            step_number: self.next_step,
            rule_id: self.rule_id("bracket"),
            rule_name: self.rule_name("Bracket Lookup"),
            reference: format!("tax_tables: {}", key),
            input: serde_json::json!({
                "adjusted_annual_wages": amount.to_string(),
            }),
            output: serde_json::json!({
                "lower": row.lower.to_string(),
                "upper": row.upper.map(|u| u.to_string()),
                "base_tax": row.base_tax.to_string(),
                "rate": row.rate.to_string(),
                "annual_tax": annual_tax.to_string(),
            }),
            reasoning: format!(
                "${} + (${} - ${}) x {} = ${}",
                row.base_tax, amount, row.lower, row.rate, annual_tax
            ),
        };

        let annualized = self.stage;
        Ok(self.advance(
            AnnualTax {
                annualized,
                row,
                annual_tax,
            },
            step,
        ))
    }
}

impl<'a> IncomeTaxPipeline<'a, AnnualTax> {
    /// Stage 3: subtract credits, de-annualize, floor at zero, round to the cent.
    pub fn deannualize(self) -> IncomeTaxPipeline<'a, PeriodTax> {
        let credits = match &self.input.election.form {
            ElectionForm::AllowanceBased { .. } => Decimal::ZERO,
            ElectionForm::IncomeBased { credits, .. } => *credits,
        };
        let periods = self.input.frequency.periods_per_year();
        let after_credits = self.stage.annual_tax - credits;
        let period_tax = round_money(floor_at_zero(after_credits / periods));

        let step = AuditStep {
            step_number: self.next_step,
            rule_id: self.rule_id("period_tax"),
            rule_name: self.rule_name("Period Tax"),
            reference: format!("{} periods per year", periods),
            input: serde_json::json!({
                "annual_tax": self.stage.annual_tax.to_string(),
                "credits": credits.to_string(),
            }),
            output: serde_json::json!({
                "period_tax": period_tax.to_string(),
            }),
            reasoning: format!(
                "(${} - ${} credits) / {} = ${}",
                self.stage.annual_tax, credits, periods, period_tax
            ),
        };

        let annual = self.stage;
        self.advance(
            PeriodTax {
                annual,
                credits,
                period_tax,
            },
            step,
        )
    }
}

impl IncomeTaxPipeline<'_, PeriodTax> {
    /// Stage 4: add the election's additional withholding and finish.
    pub fn add_additional_withholding(self) -> IncomeTaxResult {
        let additional = self.input.election.additional_withholding;
        let total = self.stage.period_tax + additional;

        let step = AuditStep {
            step_number: self.next_step,
            rule_id: self.rule_id("withholding"),
            rule_name: self.rule_name("Income Tax Withholding"),
            reference: "election additional withholding".to_string(),
            input: serde_json::json!({
                "period_tax": self.stage.period_tax.to_string(),
                "additional_withholding": additional.to_string(),
            }),
            output: serde_json::json!({
                "withholding": total.to_string(),
            }),
            reasoning: format!(
                "${} + ${} additional = ${}",
                self.stage.period_tax, additional, total
            ),
        };

        let mut steps = self.steps;
        steps.push(step);
        let annual = self.stage.annual;
        IncomeTaxResult {
            jurisdiction: self.input.jurisdiction,
            exempt: false,
            annual_wages: annual.annualized.annual_wages,
            adjusted_annual_wages: annual.annualized.adjusted_annual_wages,
            annual_tax: annual.annual_tax,
            period_tax: self.stage.period_tax,
            additional_withholding: additional,
            total,
            audit_steps: steps,
        }
    }
}

/// Runs the full procedure for one jurisdiction.
///
/// If the jurisdiction configures a low-income threshold for the election's
/// filing status and the pay frequency, wages at or below it withhold
/// nothing and the pipeline does not run.
pub fn calculate_income_tax(
    input: IncomeTaxInput<'_>,
    step_number: u32,
) -> EngineResult<IncomeTaxResult> {
    let threshold = input
        .rules
        .low_income_threshold(input.election.filing_status, input.frequency);

    if let Some(threshold) = threshold.filter(|t| input.period_wages <= *t) {
        let prefix = input.jurisdiction.as_str();
        let step = AuditStep {
            step_number,
            rule_id: format!("{}_low_income_exemption", prefix),
            rule_name: "Low-Income Exemption".to_string(),
            reference: format!(
                "{}: {} {}",
                prefix,
                input.election.filing_status,
                input.frequency.as_str()
            ),
            input: serde_json::json!({
                "period_wages": input.period_wages.to_string(),
                "threshold": threshold.to_string(),
            }),
            output: serde_json::json!({ "withholding": "0" }),
            reasoning: format!(
                "Wages ${} are at or below the ${} exemption threshold",
                input.period_wages, threshold
            ),
        };
        return Ok(IncomeTaxResult {
            jurisdiction: input.jurisdiction,
            exempt: true,
            annual_wages: Decimal::ZERO,
            adjusted_annual_wages: Decimal::ZERO,
            annual_tax: Decimal::ZERO,
            period_tax: Decimal::ZERO,
            additional_withholding: Decimal::ZERO,
            total: Decimal::ZERO,
            audit_steps: vec![step],
        });
    }

    Ok(IncomeTaxPipeline::new(input, step_number)
        .annualize()?
        .lookup_bracket()?
        .deannualize()
        .add_additional_withholding())
}
