//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod calculation_result;
mod daily_record;
mod election;
mod hours;
mod pay_period;
mod payroll_input;
mod tax_table;
mod wage_rate;
mod worker;
mod year_to_date;

pub use calculation_result::{
    Adjustment, AdjustmentKind, AuditStep, AuditTrace, AuditWarning, CalculationStatus,
    ExternalDeduction, FringeBenefit, FringeContribution, FringeSummary, GrossPay, PayCategory,
    PayLine, PayrollCalculation, WithholdingSummary,
};
pub use daily_record::{
    DailyRecord, MAX_HOURS_PER_RECORD, ScheduleType, WorkShift, hours_from_f64,
};
pub use election::{ElectionEra, ElectionForm, FilingStatus, WithholdingElection};
pub use hours::HourBreakdown;
pub use pay_period::{PayFrequency, PayPeriod, PublicHoliday};
pub use payroll_input::PayrollInput;
pub use tax_table::{BracketRow, BracketTable, Jurisdiction, TaxTableKey};
pub use wage_rate::{FringeRates, RateKey, ShiftDifferentials, WageRate, WageRateTable};
pub use worker::Worker;
pub use year_to_date::YearToDateAccumulator;
