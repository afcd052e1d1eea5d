//! Wage rate models.
//!
//! A [`WageRate`] is one row of the negotiated rate sheet: the base hourly
//! rate for a (local, classification, zone) over an effective date range,
//! together with its shift differentials, apprentice scale, and employer
//! fringe rates. [`WageRateTable`] holds a validated set of them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::WorkShift;

/// The lookup key for a wage rate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RateKey {
    /// The union local.
    pub local: String,
    /// The trade classification.
    pub classification: String,
    /// The geographic pay zone.
    pub zone: String,
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.local, self.classification, self.zone)
    }
}

/// Shift differential percentages (e.g. `10` for a 10% uplift).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDifferentials {
    /// Uplift for second shift, in percent.
    #[serde(default)]
    pub second_shift: Decimal,
    /// Uplift for third shift, in percent.
    #[serde(default)]
    pub third_shift: Decimal,
}

/// Employer-paid fringe benefit rates per hour worked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FringeRates {
    /// Health and welfare fund contribution per hour.
    pub health_welfare: Decimal,
    /// Pension fund contribution per hour.
    pub pension: Decimal,
    /// Vacation fund contribution per hour.
    pub vacation: Decimal,
    /// Training fund contribution per hour.
    pub training: Decimal,
}

/// One effective-dated rate for a (local, classification, zone).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageRate {
    /// The union local.
    pub local: String,
    /// The trade classification.
    pub classification: String,
    /// The geographic pay zone.
    pub zone: String,
    /// First date the rate applies (inclusive).
    pub effective_from: NaiveDate,
    /// Last date the rate applies (inclusive); open-ended if absent.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// The journeyman base hourly rate.
    pub base_rate: Decimal,
    /// Shift differential percentages.
    #[serde(default)]
    pub shift_differentials: ShiftDifferentials,
    /// Employer fringe rates per hour.
    pub fringe: FringeRates,
    /// Apprentice level to percentage of the base rate.
    #[serde(default)]
    pub apprentice_percentages: BTreeMap<u8, Decimal>,
}

impl WageRate {
    /// Returns the lookup key of this rate.
    pub fn key(&self) -> RateKey {
        RateKey {
            local: self.local.clone(),
            classification: self.classification.clone(),
            zone: self.zone.clone(),
        }
    }

    /// Returns true if the rate is effective on `date`.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.is_none_or(|end| date <= end)
    }

    /// Returns true if both rates share a key and their date ranges intersect.
    pub fn overlaps(&self, other: &WageRate) -> bool {
        if self.key() != other.key() {
            return false;
        }
        let self_before_other = self.effective_to.is_some_and(|end| end < other.effective_from);
        let other_before_self = other.effective_to.is_some_and(|end| end < self.effective_from);
        !self_before_other && !other_before_self
    }

    /// Returns the differential percentage for a shift.
    pub fn differential_for(&self, shift: WorkShift) -> Decimal {
        match shift {
            WorkShift::First => Decimal::ZERO,
            WorkShift::Second => self.shift_differentials.second_shift,
            WorkShift::Third => self.shift_differentials.third_shift,
        }
    }

    /// Returns the apprentice percentage for a level, if configured.
    pub fn apprentice_percentage(&self, level: u8) -> Option<Decimal> {
        self.apprentice_percentages.get(&level).copied()
    }
}

/// A validated wage-rate table.
///
/// Construction rejects overlapping effective ranges for the same key, so
/// any lookup that finds more than one match indicates data that bypassed
/// this check; [`WageRateTable::effective`] still refuses to pick one.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{FringeRates, RateKey, WageRate, WageRateTable};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let rate = WageRate {
///     local: "local_46".to_string(),
///     classification: "inside_wireman".to_string(),
///     zone: "zone_a".to_string(),
///     effective_from: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
///     effective_to: None,
///     base_rate: Decimal::new(5250, 2),
///     shift_differentials: Default::default(),
///     fringe: FringeRates::default(),
///     apprentice_percentages: Default::default(),
/// };
/// let table = WageRateTable::new(vec![rate]).unwrap();
/// let key = RateKey {
///     local: "local_46".to_string(),
///     classification: "inside_wireman".to_string(),
///     zone: "zone_a".to_string(),
/// };
/// let found = table.effective(&key, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()).unwrap();
/// assert_eq!(found.base_rate, Decimal::new(5250, 2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WageRateTable {
    rates: Vec<WageRate>,
}

impl WageRateTable {
    /// Builds a table, rejecting malformed or overlapping rates.
    pub fn new(rates: Vec<WageRate>) -> EngineResult<Self> {
        for rate in &rates {
            if rate.effective_to.is_some_and(|end| end < rate.effective_from) {
                return Err(EngineError::MissingRateData {
                    key: rate.key().to_string(),
                    message: format!(
                        "effective range ends {} before it starts {}",
                        rate.effective_to.unwrap_or(rate.effective_from),
                        rate.effective_from
                    ),
                });
            }
            if rate.base_rate < Decimal::ZERO {
                return Err(EngineError::MissingRateData {
                    key: rate.key().to_string(),
                    message: format!("base rate cannot be negative, got {}", rate.base_rate),
                });
            }
        }

        for (i, a) in rates.iter().enumerate() {
            if let Some(b) = rates[i + 1..].iter().find(|b| a.overlaps(b)) {
                return Err(EngineError::RateAmbiguity {
                    key: a.key().to_string(),
                    date: a.effective_from.max(b.effective_from),
                    matches: 2,
                });
            }
        }

        Ok(Self { rates })
    }

    /// Returns the unique rate effective for `key` on `date`.
    ///
    /// Zero or several matches is a [`EngineError::RateAmbiguity`]; the table
    /// never arbitrates between candidates.
    pub fn effective(&self, key: &RateKey, date: NaiveDate) -> EngineResult<&WageRate> {
        let mut matches = self
            .rates
            .iter()
            .filter(|r| r.local == key.local && r.classification == key.classification)
            .filter(|r| r.zone == key.zone && r.is_effective_on(date));

        match (matches.next(), matches.next()) {
            (Some(rate), None) => Ok(rate),
            (None, _) => Err(EngineError::RateAmbiguity {
                key: key.to_string(),
                date,
                matches: 0,
            }),
            (Some(_), Some(_)) => Err(EngineError::RateAmbiguity {
                key: key.to_string(),
                date,
                matches: 2 + matches.count(),
            }),
        }
    }

    /// Returns every rate in the table.
    pub fn rates(&self) -> &[WageRate] {
        &self.rates
    }

    /// Returns the number of rates in the table.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if the table holds no rates.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
