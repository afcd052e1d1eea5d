//! Calculation logic for the payroll engine.
//!
//! This module contains every stage of a worker's calculation: hours
//! classification into regular, overtime and double time, wage rate
//! resolution, earnings and situational pay, federal and state income tax,
//! flat-rate payroll taxes, fringe contributions, and the composer and batch
//! driver that run them in order.

mod batch;
mod composer;
mod day_detection;
mod flat_tax;
mod fringe;
mod gross_pay;
mod hours_classifier;
mod income_tax;
mod rounding;
mod situational_pay;
mod wage_resolver;

pub use batch::{BatchOutcome, CancellationToken, WorkerFailure, run_batch};
pub use composer::{ENGINE_VERSION, calculate_payroll, calculation_id};
pub use day_detection::{DayKind, get_day_kind, workweek_start};
pub use flat_tax::{
    FlatTaxLine, FlatTaxResult, calculate_capped_tax, calculate_flat_taxes,
    calculate_hospital_insurance,
};
pub use fringe::{FringeResult, calculate_fringe};
pub use gross_pay::{
    EarningsResult, GrossPayResult, calculate_earnings, calculate_gross_pay, category_multiplier,
};
pub use hours_classifier::{
    COMPRESSED_DAY_REGULAR, ClassifiedRecord, DAILY_OVERTIME_BAND, HoursClassification,
    SATURDAY_OVERTIME_BAND, STANDARD_DAY_REGULAR, classify_hours,
};
pub use income_tax::{
    AnnualTax, Annualized, IncomeTaxInput, IncomeTaxPipeline, IncomeTaxResult, PeriodTax,
    Unstarted, calculate_income_tax,
};
pub use rounding::{
    DOUBLE_TIME_MULTIPLIER, OVERTIME_MULTIPLIER, floor_at_zero, round_money, round_quarter_hour,
};
pub use situational_pay::{SituationalPayResult, calculate_situational_pay};
pub use wage_resolver::{ResolvedRate, resolve_wage_rate};
