//! The complete input for one worker's calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::{
    DailyRecord, ExternalDeduction, PayPeriod, ScheduleType, WithholdingElection, Worker,
    YearToDateAccumulator,
};

/// Everything the engine needs to calculate one worker's pay for one period.
///
/// The input is consumed read-only; serializing it yields the bytes the
/// calculation id is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollInput {
    /// The worker being paid.
    pub worker: Worker,
    /// The period being paid.
    pub pay_period: PayPeriod,
    /// The worker's weekly schedule.
    #[serde(default)]
    pub schedule: ScheduleType,
    /// Approved daily records, in chronological order.
    pub records: Vec<DailyRecord>,
    /// Federal withholding election.
    pub federal_election: WithholdingElection,
    /// State withholding election.
    pub state_election: WithholdingElection,
    /// Year-to-date wages at the start of the period.
    #[serde(default)]
    pub year_to_date: YearToDateAccumulator,
    /// Opaque post-tax deductions.
    #[serde(default)]
    pub deductions: Vec<ExternalDeduction>,
}

impl PayrollInput {
    /// Checks every field that can be checked without configuration.
    ///
    /// Record ordering and period membership are checked by the hours
    /// classifier, which owns those rules.
    pub fn validate(&self) -> EngineResult<()> {
        if self.worker.id.trim().is_empty() {
            return Err(EngineError::malformed("worker.id", "worker id cannot be empty"));
        }
        self.pay_period.validate()?;
        for (index, record) in self.records.iter().enumerate() {
            record.validate(index)?;
        }
        self.federal_election.validate("federal_election")?;
        self.state_election.validate("state_election")?;

        let ytd = &self.year_to_date;
        for (name, value) in [
            ("old_age_survivors_wages", ytd.old_age_survivors_wages),
            ("hospital_insurance_wages", ytd.hospital_insurance_wages),
            ("state_disability_wages", ytd.state_disability_wages),
        ] {
            if value < Decimal::ZERO {
                return Err(EngineError::malformed(
                    format!("year_to_date.{}", name),
                    "year-to-date wages cannot be negative",
                ));
            }
        }

        for (index, deduction) in self.deductions.iter().enumerate() {
            if deduction.amount < Decimal::ZERO {
                return Err(EngineError::malformed(
                    format!("deductions[{}].amount", index),
                    format!("deduction cannot be negative, got {}", deduction.amount),
                ));
            }
        }
        Ok(())
    }
}
