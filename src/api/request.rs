//! Request types for the payroll engine API.
//!
//! Request bodies mirror [`PayrollInput`] except that record hours arrive as
//! plain JSON numbers, which are checked and converted to decimals here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{
    DailyRecord, ExternalDeduction, PayPeriod, PayrollInput, ScheduleType, WithholdingElection,
    Worker, YearToDateAccumulator, hours_from_f64,
};

/// Request body for the `/calculate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// The worker being paid.
    pub worker: Worker,
    /// The pay period.
    pub pay_period: PayPeriod,
    /// The worker's weekly schedule.
    #[serde(default)]
    pub schedule: ScheduleType,
    /// Approved daily records.
    #[serde(default)]
    pub records: Vec<DailyRecordRequest>,
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

/// A daily record in a calculation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRecordRequest {
    /// The date worked.
    pub work_date: NaiveDate,
    /// The project charged.
    pub project_id: String,
    /// The project's pay-rate zone.
    pub zone: String,
    /// Hours worked, as a JSON number.
    pub hours_worked: f64,
    /// Shift indicator (1, 2 or 3).
    #[serde(default = "default_shift")]
    pub shift: u8,
    /// Whether a meal period was taken.
    #[serde(default = "default_meal_taken")]
    pub meal_taken: bool,
    /// Whether the date is a recognized holiday.
    #[serde(default)]
    pub holiday: bool,
    /// Distance from the worker's home local.
    #[serde(default)]
    pub travel_distance: Decimal,
    /// Whether the hours were installation work.
    #[serde(default)]
    pub installation: bool,
}

fn default_shift() -> u8 {
    1
}

fn default_meal_taken() -> bool {
    true
}

/// Request body for the `/batch` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// One entry per worker.
    pub workers: Vec<CalculationRequest>,
}

impl DailyRecordRequest {
    fn into_record(self, index: usize) -> Result<DailyRecord, EngineError> {
        let field = format!("records[{}].hours_worked", index);
        Ok(DailyRecord {
            work_date: self.work_date,
            project_id: self.project_id,
            zone: self.zone,
            hours_worked: hours_from_f64(self.hours_worked, &field)?,
            shift: self.shift,
            meal_taken: self.meal_taken,
            holiday: self.holiday,
            travel_distance: self.travel_distance,
            installation: self.installation,
        })
    }
}

impl TryFrom<CalculationRequest> for PayrollInput {
    type Error = EngineError;

    fn try_from(req: CalculationRequest) -> Result<Self, Self::Error> {
        let records = req
            .records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_record(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PayrollInput {
            worker: req.worker,
            pay_period: req.pay_period,
            schedule: req.schedule,
            records,
            federal_election: req.federal_election,
            state_election: req.state_election,
            year_to_date: req.year_to_date,
            deductions: req.deductions,
        })
    }
}
