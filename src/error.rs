//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while calculating a worker's pay.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How an error affects the surrounding batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The worker's calculation is rejected; the rest of the batch continues.
    PerWorker,
    /// Tax data is structurally broken; the whole batch must halt.
    BatchFatal,
    /// Configuration could not be loaded at all.
    Configuration,
}

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type. None of the
/// calculation errors are retryable: the engine is a pure function, so the
/// same bad input always fails the same way.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::MalformedInput {
///     field: "records[2].hours_worked".to_string(),
///     message: "hours cannot be negative".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Malformed input 'records[2].hours_worked': hours cannot be negative"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Input hours, dates, or amounts failed a basic sanity check.
    #[error("Malformed input '{field}': {message}")]
    MalformedInput {
        /// The offending field, e.g. `records[3].shift`.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// Required rate data (apprentice percentage, bracket table, standard amount) is absent.
    #[error("Missing rate data for '{key}': {message}")]
    MissingRateData {
        /// The lookup key that had no data.
        key: String,
        /// A description of what was missing.
        message: String,
    },

    /// Zero or several wage rates are effective for one lookup key and date.
    #[error("Expected exactly one wage rate for '{key}' on {date}, found {matches}")]
    RateAmbiguity {
        /// The `local/classification/zone` lookup key.
        key: String,
        /// The date of the lookup.
        date: NaiveDate,
        /// How many rates were effective.
        matches: usize,
    },

    /// A bracket table or flat-tax constant violates its structural invariant.
    #[error("Tax table '{table}' is corrupt: {message}")]
    TaxTableCorrupt {
        /// The table or constant that failed.
        table: String,
        /// A description of the violation.
        message: String,
    },
}

impl EngineError {
    /// Returns the batch-level classification of this error.
    ///
    /// ```
    /// use payroll_engine::error::{EngineError, ErrorClass};
    ///
    /// let error = EngineError::TaxTableCorrupt {
    ///     table: "federal/single/weekly/income_based".to_string(),
    ///     message: "gap between rows 2 and 3".to_string(),
    /// };
    /// assert_eq!(error.class(), ErrorClass::BatchFatal);
    /// ```
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ErrorClass::Configuration
            }
            EngineError::MalformedInput { .. }
            | EngineError::MissingRateData { .. }
            | EngineError::RateAmbiguity { .. } => ErrorClass::PerWorker,
            EngineError::TaxTableCorrupt { .. } => ErrorClass::BatchFatal,
        }
    }

    /// Returns a stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            EngineError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            EngineError::MalformedInput { .. } => "MALFORMED_INPUT",
            EngineError::MissingRateData { .. } => "MISSING_RATE_DATA",
            EngineError::RateAmbiguity { .. } => "RATE_AMBIGUITY",
            EngineError::TaxTableCorrupt { .. } => "TAX_TABLE_CORRUPT",
        }
    }

    pub(crate) fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::MalformedInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn corrupt(table: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::TaxTableCorrupt {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
