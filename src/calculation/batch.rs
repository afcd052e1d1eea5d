//! Parallel batch driver.
//!
//! Workers are independent, so a batch maps [`calculate_payroll`] over its
//! inputs on the rayon pool. Per-worker errors are collected; a corrupt tax
//! table stops the remaining workers and fails the batch. Cancellation is
//! checked before each worker starts, never mid-calculation.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, ErrorClass};
use crate::models::{PayrollCalculation, PayrollInput};

use super::composer::calculate_payroll;

pub use tokio_util::sync::CancellationToken;

/// A worker whose calculation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFailure {
    /// The worker's id as given in the input.
    pub worker_id: String,
    /// How the failure affects the batch.
    pub class: ErrorClass,
    /// Stable error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

impl WorkerFailure {
    /// Records `error` against a worker.
    pub fn new(worker_id: &str, error: &EngineError) -> Self {
        Self {
            worker_id: worker_id.to_string(),
            class: error.class(),
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// The result of a batch run. Calculations and failures keep input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Completed calculations.
    pub calculations: Vec<PayrollCalculation>,
    /// Workers whose calculation failed.
    pub failures: Vec<WorkerFailure>,
    /// Workers not started because the batch was cancelled.
    pub skipped: Vec<String>,
    /// True if cancellation was requested before every worker started.
    pub cancelled: bool,
}

enum WorkerOutcome {
    Calculated(Box<PayrollCalculation>),
    Failed(WorkerFailure, EngineError),
    Skipped,
}

/// Calculates every input in parallel.
///
/// # Errors
///
/// Returns the first [`ErrorClass::BatchFatal`] error, in input order, if any
/// worker hit one. Workers not yet started when it occurred are abandoned and
/// no partial outcome is returned.
pub fn run_batch(
    inputs: &[PayrollInput],
    config: &EngineConfig,
    cancel: &CancellationToken,
) -> EngineResult<BatchOutcome> {
    run_batch_observed(inputs, config, cancel, |_| {})
}

/// `on_finished` runs with the worker's index after each calculation ends.
fn run_batch_observed<F>(
    inputs: &[PayrollInput],
    config: &EngineConfig,
    cancel: &CancellationToken,
    on_finished: F,
) -> EngineResult<BatchOutcome>
where
    F: Fn(usize) + Sync,
{
    info!(workers = inputs.len(), "Starting payroll batch");
    // Halting stops this batch without cancelling the caller's token.
    let halt = cancel.child_token();

    let outcomes: Vec<WorkerOutcome> = inputs
        .par_iter()
        .enumerate()
        .map(|(index, input)| {
            if halt.is_cancelled() {
                return WorkerOutcome::Skipped;
            }
            let result = calculate_payroll(input, config);
            on_finished(index);
            match result {
                Ok(calculation) => WorkerOutcome::Calculated(Box::new(calculation)),
                Err(error) => {
                    warn!(
                        worker_id = %input.worker.id,
                        code = error.code(),
                        error = %error,
                        "Worker calculation failed"
                    );
                    if error.class() == ErrorClass::BatchFatal {
                        halt.cancel();
                    }
                    WorkerOutcome::Failed(WorkerFailure::new(&input.worker.id, &error), error)
                }
            }
        })
        .collect();

    let mut outcome = BatchOutcome {
        calculations: Vec::new(),
        failures: Vec::new(),
        skipped: Vec::new(),
        cancelled: cancel.is_cancelled(),
    };

    for (input, result) in inputs.iter().zip(outcomes) {
        match result {
            WorkerOutcome::Calculated(calculation) => outcome.calculations.push(*calculation),
            WorkerOutcome::Failed(_, error) if error.class() == ErrorClass::BatchFatal => {
                warn!(worker_id = %input.worker.id, "Batch halted");
                return Err(error);
            }
            WorkerOutcome::Failed(failure, _) => outcome.failures.push(failure),
            WorkerOutcome::Skipped => outcome.skipped.push(input.worker.id.clone()),
        }
    }

    info!(
        calculated = outcome.calculations.len(),
        failed = outcome.failures.len(),
        skipped = outcome.skipped.len(),
        cancelled = outcome.cancelled,
        "Payroll batch finished"
    );

    Ok(outcome)
}
