//! Graduated bracket tables.
//!
//! A [`BracketTable`] is one annual rate schedule, keyed by jurisdiction,
//! filing status, pay frequency, and election era. Tables are validated when
//! built: rows must start at zero, be contiguous and increasing, end in an
//! unbounded row, and carry base taxes that are continuous across row
//! boundaries. A table that passes is safe to look up without any fallback.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::{ElectionEra, FilingStatus, PayFrequency};

/// Allowed drift between a row's base tax and the tax accrued by the row below it.
const CONTINUITY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The taxing authority a withholding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jurisdiction {
    /// Federal income tax.
    Federal,
    /// State income tax.
    State,
}

impl Jurisdiction {
    /// Returns the snake_case name used in keys and traces.
    pub fn as_str(&self) -> &'static str {
        match self {
            Jurisdiction::Federal => "federal",
            Jurisdiction::State => "state",
        }
    }
}

/// The key a bracket table is looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxTableKey {
    /// Federal or state.
    pub jurisdiction: Jurisdiction,
    /// Filing status from the election.
    pub filing_status: FilingStatus,
    /// The worker's pay frequency.
    pub pay_frequency: PayFrequency,
    /// Election-form era.
    pub era: ElectionEra,
}

impl fmt::Display for TaxTableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.jurisdiction.as_str(),
            self.filing_status.as_str(),
            self.pay_frequency.as_str(),
            self.era.as_str()
        )
    }
}

/// One row of a bracket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRow {
    /// Inclusive lower bound of annual wages.
    pub lower: Decimal,
    /// Exclusive upper bound; `None` for the top row.
    #[serde(default)]
    pub upper: Option<Decimal>,
    /// Tax owed on wages up to `lower`.
    pub base_tax: Decimal,
    /// Marginal rate applied above `lower`.
    pub rate: Decimal,
}

impl BracketRow {
    /// Returns true if `amount` falls in `[lower, upper)`.
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.lower && self.upper.is_none_or(|upper| amount < upper)
    }

    /// Returns the unrounded tax for an amount inside this row.
    pub fn tax_for(&self, amount: Decimal) -> Decimal {
        self.base_tax + (amount - self.lower) * self.rate
    }
}

/// A validated annual bracket table.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{
///     BracketRow, BracketTable, ElectionEra, FilingStatus, Jurisdiction, PayFrequency,
///     TaxTableKey,
/// };
/// use rust_decimal::Decimal;
///
/// let key = TaxTableKey {
///     jurisdiction: Jurisdiction::Federal,
///     filing_status: FilingStatus::Single,
///     pay_frequency: PayFrequency::Weekly,
///     era: ElectionEra::IncomeBased,
/// };
/// let table = BracketTable::new(key, vec![
///     BracketRow { lower: Decimal::ZERO, upper: Some(Decimal::from(10000)), base_tax: Decimal::ZERO, rate: Decimal::new(10, 2) },
///     BracketRow { lower: Decimal::from(10000), upper: None, base_tax: Decimal::from(1000), rate: Decimal::new(20, 2) },
/// ]).unwrap();
///
/// assert_eq!(table.tax_for(Decimal::from(10000)).unwrap(), Decimal::from(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketTable {
    key: TaxTableKey,
    rows: Vec<BracketRow>,
}

impl BracketTable {
    /// Builds a table, failing with [`EngineError::TaxTableCorrupt`] if the
    /// rows violate the structural invariant.
    pub fn new(key: TaxTableKey, rows: Vec<BracketRow>) -> EngineResult<Self> {
        let table = key.to_string();

        let (first, last) = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(EngineError::corrupt(table, "table has no rows")),
        };
        if !first.lower.is_zero() {
            return Err(EngineError::corrupt(
                table,
                format!("first row starts at {} instead of 0", first.lower),
            ));
        }
        if last.upper.is_some() {
            return Err(EngineError::corrupt(table, "top row must be unbounded"));
        }

        for (i, row) in rows.iter().enumerate() {
            if row.rate < Decimal::ZERO || row.base_tax < Decimal::ZERO {
                return Err(EngineError::corrupt(
                    table,
                    format!("row {} has a negative rate or base tax", i),
                ));
            }
            let Some(next) = rows.get(i + 1) else {
                break;
            };
            let Some(upper) = row.upper else {
                return Err(EngineError::corrupt(
                    table,
                    format!("row {} is unbounded but is not the top row", i),
                ));
            };
            if upper <= row.lower {
                return Err(EngineError::corrupt(
                    table,
                    format!("row {} upper bound {} is not above {}", i, upper, row.lower),
                ));
            }
            if next.lower != upper {
                let kind = if next.lower > upper { "gap" } else { "overlap" };
                return Err(EngineError::corrupt(
                    table,
                    format!(
                        "{} between row {} (ends {}) and row {} (starts {})",
                        kind,
                        i,
                        upper,
                        i + 1,
                        next.lower
                    ),
                ));
            }
            let accrued = row.tax_for(upper);
            if (accrued - next.base_tax).abs() > CONTINUITY_TOLERANCE {
                return Err(EngineError::corrupt(
                    table,
                    format!(
                        "row {} base tax {} does not continue row {} (accrued {})",
                        i + 1,
                        next.base_tax,
                        i,
                        accrued
                    ),
                ));
            }
        }

        Ok(Self { key, rows })
    }

    /// Returns the key this table is filed under.
    pub fn key(&self) -> TaxTableKey {
        self.key
    }

    /// Returns the table rows in ascending order.
    pub fn rows(&self) -> &[BracketRow] {
        &self.rows
    }

    /// Returns the row containing `amount`.
    ///
    /// Amounts outside every row (only possible for negative amounts on a
    /// validated table) are reported as a corrupt table, never defaulted.
    pub fn lookup(&self, amount: Decimal) -> EngineResult<&BracketRow> {
        self.rows
            .iter()
            .find(|row| row.contains(amount))
            .ok_or_else(|| {
                EngineError::corrupt(
                    self.key.to_string(),
                    format!("no row contains annual amount {}", amount),
                )
            })
    }

    /// Returns the unrounded annual tax for `amount`.
    pub fn tax_for(&self, amount: Decimal) -> EngineResult<Decimal> {
        Ok(self.lookup(amount)?.tax_for(amount))
    }
}
