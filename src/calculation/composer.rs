//! Assembles one worker's full payroll calculation.
//!
//! The stages run in a fixed order and each appends its audit steps to a
//! single numbered trace:
//!
//! 1. validate the input
//! 2. classify hours into regular, overtime and double time
//! 3. resolve a wage rate per record
//! 4. price earnings lines
//! 5. situational adjustments
//! 6. gross pay
//! 7. federal then state income tax
//! 8. flat-rate taxes against the year-to-date snapshot
//! 9. fringe contributions
//! 10. external deductions and net pay
//!
//! Any error discards the partial result.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, CalculationStatus, Jurisdiction, PayrollCalculation,
    PayrollInput, WithholdingSummary,
};

use super::flat_tax::calculate_flat_taxes;
use super::fringe::calculate_fringe;
use super::gross_pay::{calculate_earnings, calculate_gross_pay};
use super::hours_classifier::classify_hours;
use super::income_tax::{IncomeTaxInput, calculate_income_tax};
use super::situational_pay::calculate_situational_pay;
use super::wage_resolver::resolve_wage_rate;

/// The engine version stamped on every calculation.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Derives the calculation id for an input.
///
/// The id is a UUID v5 over the serialized input, the engine version, and the
/// tax year, so the same input under the same engine and tables always gets
/// the same id.
pub fn calculation_id(input: &PayrollInput, tax_year: i32) -> EngineResult<Uuid> {
    let bytes = serde_json::to_vec(&(input, ENGINE_VERSION, tax_year))
        .map_err(|e| EngineError::malformed("input", format!("cannot serialize input: {}", e)))?;
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, &bytes))
}

struct TraceBuilder {
    steps: Vec<AuditStep>,
    warnings: Vec<AuditWarning>,
}

impl TraceBuilder {
    fn next_step(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    fn push(&mut self, step: AuditStep) {
        self.steps.push(step);
    }

    fn extend(&mut self, steps: impl IntoIterator<Item = AuditStep>) {
        self.steps.extend(steps);
    }

    fn warn(&mut self, code: &str, message: String, severity: &str) {
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message,
            severity: severity.to_string(),
        });
    }
}

/// Calculates pay for one worker and one period.
///
/// # Errors
///
/// - [`EngineError::MalformedInput`] for invalid records, elections, or amounts.
/// - [`EngineError::MissingRateData`] or [`EngineError::RateAmbiguity`] when a
///   wage rate, apprentice percentage, or bracket table cannot be resolved.
/// - [`EngineError::TaxTableCorrupt`] when a bracket table or flat-tax rule is
///   unusable.
pub fn calculate_payroll(
    input: &PayrollInput,
    config: &EngineConfig,
) -> EngineResult<PayrollCalculation> {
    input.validate()?;

    let worker = &input.worker;
    let records = &input.records;
    let mut trace = TraceBuilder {
        steps: Vec::new(),
        warnings: Vec::new(),
    };

    debug!(worker_id = %worker.id, records = records.len(), "Classifying hours");
    let classification = classify_hours(
        records,
        &input.pay_period,
        input.schedule,
        &config.classifier,
        trace.next_step(),
    )?;
    trace.extend(classification.audit_steps.iter().cloned());

    let mut rates = Vec::with_capacity(records.len());
    for record in records {
        let resolved = resolve_wage_rate(&config.wage_rates, worker, record, trace.next_step())?;
        trace.push(resolved.audit_step.clone());
        rates.push(resolved);
    }

    let earnings = calculate_earnings(records, &classification, &rates, trace.next_step());
    trace.push(earnings.audit_step.clone());

    let situational = calculate_situational_pay(
        records,
        &classification,
        &rates,
        &earnings.pay_lines,
        &config.situational,
        trace.next_step(),
    );
    trace.extend(situational.audit_steps.iter().cloned());

    let gross = calculate_gross_pay(
        earnings.earnings,
        &situational.adjustments,
        trace.next_step(),
    );
    trace.push(gross.audit_step.clone());
    let gross_pay = gross.gross.gross_pay;

    let mut income_taxes = Vec::with_capacity(2);
    for (jurisdiction, election) in [
        (Jurisdiction::Federal, &input.federal_election),
        (Jurisdiction::State, &input.state_election),
    ] {
        let result = calculate_income_tax(
            IncomeTaxInput {
                jurisdiction,
                period_wages: gross_pay,
                frequency: input.pay_period.frequency,
                election,
                rules: config.rules(jurisdiction),
                tables: &config.tax_tables,
            },
            trace.next_step(),
        )?;
        trace.extend(result.audit_steps.iter().cloned());
        income_taxes.push(result.total);
    }
    let (federal_income_tax, state_income_tax) = (income_taxes[0], income_taxes[1]);

    let flat = calculate_flat_taxes(
        &config.flat_taxes,
        gross_pay,
        &input.year_to_date,
        trace.next_step(),
    )?;
    trace.extend(flat.audit_steps().cloned());

    let withholding = WithholdingSummary {
        federal_income_tax,
        state_income_tax,
        old_age_survivors: flat.old_age_survivors.tax,
        hospital_insurance: flat.hospital_insurance.tax,
        state_disability: flat.state_disability.tax,
        total: federal_income_tax + state_income_tax + flat.total(),
    };

    let fringe = calculate_fringe(records, &classification, &rates, trace.next_step());
    trace.push(fringe.audit_step.clone());

    let deductions_total: Decimal = input.deductions.iter().map(|d| d.amount).sum();
    let net_pay = gross_pay - withholding.total - deductions_total;

    trace.push(AuditStep {
        step_number: trace.next_step(),
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        reference: "gross - withholding - deductions".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "withholding": withholding.total.to_string(),
            "deductions": input
                .deductions
                .iter()
                .map(|d| serde_json::json!({ "code": d.code, "amount": d.amount.to_string() }))
                .collect::<Vec<_>>(),
        }),
        output: serde_json::json!({ "net_pay": net_pay.to_string() }),
        reasoning: format!(
            "${} - ${} withholding - ${} deductions = ${}",
            gross_pay, withholding.total, deductions_total, net_pay
        ),
    });

    if records.is_empty() {
        trace.warn(
            "NO_RECORDS",
            "No daily records were supplied for the period".to_string(),
            "low",
        );
    }
    if net_pay < Decimal::ZERO {
        warn!(worker_id = %worker.id, net_pay = %net_pay, "Negative net pay");
        trace.warn(
            "NEGATIVE_NET_PAY",
            format!(
                "Withholding and deductions exceed gross pay; net pay is ${}",
                net_pay
            ),
            "high",
        );
    }

    let calculation = PayrollCalculation {
        calculation_id: calculation_id(input, config.tax_year)?,
        engine_version: ENGINE_VERSION.to_string(),
        tax_year: config.tax_year,
        worker_id: worker.id.clone(),
        pay_period: input.pay_period.clone(),
        status: CalculationStatus::Active,
        supersedes: None,
        hours_exact: classification.exact_totals,
        hours: classification.totals,
        pay_lines: earnings.pay_lines,
        adjustments: situational.adjustments,
        gross: gross.gross,
        withholding,
        fringe: fringe.summary,
        deductions: input.deductions.clone(),
        deductions_total,
        net_pay,
        audit_trace: AuditTrace {
            steps: trace.steps,
            warnings: trace.warnings,
        },
    };

    info!(
        worker_id = %calculation.worker_id,
        calculation_id = %calculation.calculation_id,
        gross_pay = %calculation.gross.gross_pay,
        net_pay = %calculation.net_pay,
        "Payroll calculated"
    );

    Ok(calculation)
}
