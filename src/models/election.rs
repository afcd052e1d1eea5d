//! Withholding election models.
//!
//! Two generations of election form are supported. The older form is
//! allowance-based; the newer one reports other income, deductions, and
//! credits directly. Each is a variant of [`ElectionForm`], so every
//! procedure that depends on the form must handle both explicitly.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Filing status declared on the election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    /// Single or married filing separately.
    Single,
    /// Married filing jointly.
    MarriedFilingJointly,
    /// Head of household.
    HeadOfHousehold,
}

impl FilingStatus {
    /// Returns the snake_case name used in keys and traces.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedFilingJointly => "married_filing_jointly",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The generation of election form a worker filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionEra {
    /// Older allowance-based form.
    AllowanceBased,
    /// Newer income/deduction/credit-based form.
    IncomeBased,
}

impl ElectionEra {
    /// Returns the snake_case name used in keys and traces.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionEra::AllowanceBased => "allowance_based",
            ElectionEra::IncomeBased => "income_based",
        }
    }
}

/// The era-specific content of an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "era", rename_all = "snake_case")]
pub enum ElectionForm {
    /// Older form: a count of withholding allowances.
    AllowanceBased {
        /// Number of allowances claimed.
        allowances: u32,
    },
    /// Newer form: annual amounts reported directly.
    IncomeBased {
        /// Other annual income not from jobs.
        #[serde(default)]
        other_income: Decimal,
        /// Annual deductions beyond the standard amount.
        #[serde(default)]
        deductions: Decimal,
        /// Annual tax credits (e.g. for dependents).
        #[serde(default)]
        credits: Decimal,
        /// Multiple-jobs checkbox; removes the standard amount when set.
        #[serde(default)]
        extra_withholding_checkbox: bool,
    },
}

impl ElectionForm {
    /// Returns the era this form belongs to.
    pub fn era(&self) -> ElectionEra {
        match self {
            ElectionForm::AllowanceBased { .. } => ElectionEra::AllowanceBased,
            ElectionForm::IncomeBased { .. } => ElectionEra::IncomeBased,
        }
    }
}

/// A worker's withholding election for one jurisdiction.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{ElectionEra, ElectionForm, FilingStatus, WithholdingElection};
/// use rust_decimal::Decimal;
///
/// let election = WithholdingElection {
///     filing_status: FilingStatus::Single,
///     form: ElectionForm::AllowanceBased { allowances: 2 },
///     additional_withholding: Decimal::from(10),
/// };
/// assert_eq!(election.era(), ElectionEra::AllowanceBased);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingElection {
    /// Declared filing status.
    pub filing_status: FilingStatus,
    /// Era-specific election content.
    pub form: ElectionForm,
    /// Flat additional amount withheld every period.
    #[serde(default)]
    pub additional_withholding: Decimal,
}

impl WithholdingElection {
    /// Returns the era of the election form.
    pub fn era(&self) -> ElectionEra {
        self.form.era()
    }

    /// Rejects negative amounts.
    ///
    /// `field` prefixes the reported field name, e.g. `federal_election`.
    pub fn validate(&self, field: &str) -> EngineResult<()> {
        let non_negative = |name: &str, value: Decimal| {
            if value < Decimal::ZERO {
                Err(EngineError::malformed(
                    format!("{}.{}", field, name),
                    format!("amount cannot be negative, got {}", value),
                ))
            } else {
                Ok(())
            }
        };

        non_negative("additional_withholding", self.additional_withholding)?;
        match &self.form {
            ElectionForm::AllowanceBased { .. } => Ok(()),
            ElectionForm::IncomeBased {
                other_income,
                deductions,
                credits,
                ..
            } => {
                non_negative("other_income", *other_income)?;
                non_negative("deductions", *deductions)?;
                non_negative("credits", *credits)
            }
        }
    }
}
