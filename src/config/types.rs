//! Configuration types for payroll calculation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files, and the assembled
//! [`EngineConfig`] the calculation modules read from.

use std::collections::BTreeMap;

use chrono::Weekday;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    BracketRow, BracketTable, ElectionEra, FilingStatus, Jurisdiction, PayFrequency, TaxTableKey,
    WageRate, WageRateTable,
};

/// Order in which the weekly pass moves excess regular hours to overtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReallocationOrder {
    /// Most recent records first.
    #[default]
    ReverseChronological,
    /// Earliest records first.
    Chronological,
}

fn default_weekly_limit() -> Decimal {
    Decimal::from(40)
}

fn default_workweek_start() -> Weekday {
    Weekday::Mon
}

/// Hours classifier policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierPolicy {
    /// Regular hours allowed per workweek before the excess becomes overtime.
    #[serde(default = "default_weekly_limit")]
    pub weekly_regular_limit: Decimal,
    /// The first day of each workweek.
    #[serde(default = "default_workweek_start")]
    pub workweek_start: Weekday,
    /// Which records absorb the weekly excess first.
    #[serde(default)]
    pub reallocation_order: ReallocationOrder,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            weekly_regular_limit: default_weekly_limit(),
            workweek_start: default_workweek_start(),
            reallocation_order: ReallocationOrder::default(),
        }
    }
}

/// Daily minimum-pay guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumPayPolicy {
    /// Flat minimum paid for any day with hours worked.
    pub flat_minimum: Decimal,
    /// Guaranteed hours for short days.
    pub lower_guarantee_hours: Decimal,
    /// Guaranteed hours once the escalation threshold is passed.
    pub upper_guarantee_hours: Decimal,
    /// Hours worked above which the upper guarantee applies.
    pub escalation_threshold_hours: Decimal,
}

/// Missed-meal penalty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPenaltyPolicy {
    /// Hours worked without a meal before the penalty starts.
    pub threshold_hours: Decimal,
}

/// One travel/subsistence band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelBand {
    /// Minimum one-way distance for the band (inclusive).
    pub min_distance: Decimal,
    /// Flat daily amount paid in the band.
    pub daily_amount: Decimal,
}

/// Travel/subsistence allowance bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelPolicy {
    /// Bands in ascending distance order.
    pub bands: Vec<TravelBand>,
}

impl TravelPolicy {
    /// Returns the band for a distance: the highest band whose minimum the
    /// distance reaches, or `None` below the lowest band.
    pub fn band_for(&self, distance: Decimal) -> Option<&TravelBand> {
        self.bands
            .iter()
            .filter(|band| distance >= band.min_distance)
            .max_by_key(|band| band.min_distance)
    }

    fn validate(&self) -> Result<(), String> {
        for pair in self.bands.windows(2) {
            if pair[1].min_distance <= pair[0].min_distance {
                return Err(format!(
                    "travel band distances must increase, {} follows {}",
                    pair[1].min_distance, pair[0].min_distance
                ));
            }
            if pair[1].daily_amount < pair[0].daily_amount {
                return Err(format!(
                    "travel band amounts must not decrease, {} follows {}",
                    pair[1].daily_amount, pair[0].daily_amount
                ));
            }
        }
        Ok(())
    }
}

/// Installation-work premium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationPolicy {
    /// Premium per installation hour.
    pub premium_per_hour: Decimal,
}

/// Situational pay rules. Each rule is switched off when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationalPayPolicy {
    /// Minimum-pay guarantee.
    #[serde(default)]
    pub minimum_pay: Option<MinimumPayPolicy>,
    /// Missed-meal penalty.
    #[serde(default)]
    pub missed_meal: Option<MealPenaltyPolicy>,
    /// Travel/subsistence allowance.
    #[serde(default)]
    pub travel: Option<TravelPolicy>,
    /// Installation premium.
    #[serde(default)]
    pub installation: Option<InstallationPolicy>,
}

/// Contents of `engine.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// The tax year the configuration describes.
    pub tax_year: i32,
    /// Hours classifier policy.
    #[serde(default)]
    pub classifier: ClassifierPolicy,
    /// Situational pay rules.
    #[serde(default)]
    pub situational: SituationalPayPolicy,
}

impl EngineSettings {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.classifier.weekly_regular_limit <= Decimal::ZERO {
            return Err("classifier.weekly_regular_limit must be positive".to_string());
        }
        if let Some(minimum) = &self.situational.minimum_pay {
            if minimum.upper_guarantee_hours < minimum.lower_guarantee_hours {
                return Err(
                    "minimum_pay.upper_guarantee_hours is below lower_guarantee_hours".to_string(),
                );
            }
        }
        if let Some(travel) = &self.situational.travel {
            travel.validate()?;
        }
        Ok(())
    }
}

/// Contents of `wage_rates.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct WageRatesDocument {
    /// Effective-dated wage rates.
    pub rates: Vec<WageRate>,
}

/// Low-income exemption threshold for a (filing status, pay frequency).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowIncomeExemption {
    /// The filing status the threshold applies to.
    pub filing_status: FilingStatus,
    /// The pay frequency the threshold applies to.
    pub pay_frequency: PayFrequency,
    /// Period wages at or below this amount owe no tax.
    pub threshold: Decimal,
}

/// Annualization constants for one income-tax jurisdiction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionRules {
    /// Annual amount subtracted per allowance (allowance-based era).
    pub allowance_amount: Decimal,
    /// Annual standard amount per filing status (income-based era).
    #[serde(default)]
    pub standard_amounts: BTreeMap<FilingStatus, Decimal>,
    /// Low-income exemption thresholds; empty for no exemption.
    #[serde(default)]
    pub low_income_exemptions: Vec<LowIncomeExemption>,
}

impl JurisdictionRules {
    /// Returns the standard amount for a filing status.
    pub fn standard_amount(
        &self,
        jurisdiction: Jurisdiction,
        filing_status: FilingStatus,
    ) -> EngineResult<Decimal> {
        self.standard_amounts
            .get(&filing_status)
            .copied()
            .ok_or_else(|| EngineError::MissingRateData {
                key: format!("{}/{}", jurisdiction.as_str(), filing_status),
                message: "no standard amount for filing status".to_string(),
            })
    }

    /// Returns the low-income threshold for a filing status and frequency, if any.
    pub fn low_income_threshold(
        &self,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
    ) -> Option<Decimal> {
        self.low_income_exemptions
            .iter()
            .find(|e| e.filing_status == filing_status && e.pay_frequency == pay_frequency)
            .map(|e| e.threshold)
    }
}

/// A capped flat-rate payroll tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTaxRule {
    /// Tax rate as a fraction (e.g. `0.062`).
    pub rate: Decimal,
    /// Annual wage base; uncapped if absent.
    #[serde(default)]
    pub wage_base: Option<Decimal>,
}

/// Hospital insurance: uncapped, with a surtax above a threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalInsuranceRule {
    /// Base rate as a fraction.
    pub rate: Decimal,
    /// Additional rate on wages above the threshold.
    pub surtax_rate: Decimal,
    /// Year-to-date wages above which the surtax applies.
    pub surtax_threshold: Decimal,
}

/// Flat-rate payroll taxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTaxRules {
    /// Old-age/survivors insurance.
    pub old_age_survivors: FlatTaxRule,
    /// Hospital insurance.
    pub hospital_insurance: HospitalInsuranceRule,
    /// State disability insurance.
    pub state_disability: FlatTaxRule,
}

/// Contents of `taxes.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxesDocument {
    /// Federal income-tax constants.
    pub federal: JurisdictionRules,
    /// State income-tax constants.
    pub state: JurisdictionRules,
    /// Flat-rate payroll taxes.
    pub flat_taxes: FlatTaxRules,
}

/// One file under `tax_tables/`: a bracket schedule and the keys it serves.
#[derive(Debug, Clone, Deserialize)]
pub struct BracketTableDocument {
    /// Federal or state.
    pub jurisdiction: Jurisdiction,
    /// Filing statuses that use this schedule.
    pub filing_statuses: Vec<FilingStatus>,
    /// Pay frequencies that use this schedule.
    pub pay_frequencies: Vec<PayFrequency>,
    /// Election eras that use this schedule.
    pub eras: Vec<ElectionEra>,
    /// Annual bracket rows.
    pub rows: Vec<BracketRow>,
}

impl BracketTableDocument {
    /// Expands the document into one validated table per key.
    pub fn expand(&self) -> EngineResult<Vec<BracketTable>> {
        let mut tables = Vec::new();
        for &filing_status in &self.filing_statuses {
            for &pay_frequency in &self.pay_frequencies {
                for &era in &self.eras {
                    let key = TaxTableKey {
                        jurisdiction: self.jurisdiction,
                        filing_status,
                        pay_frequency,
                        era,
                    };
                    tables.push(BracketTable::new(key, self.rows.clone())?);
                }
            }
        }
        Ok(tables)
    }
}

/// All bracket tables, keyed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxTables {
    tables: BTreeMap<TaxTableKey, BracketTable>,
}

impl TaxTables {
    /// Creates an empty set of tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table; a second table for the same key is rejected.
    pub fn insert(&mut self, table: BracketTable) -> EngineResult<()> {
        let key = table.key();
        if self.tables.contains_key(&key) {
            return Err(EngineError::corrupt(
                key.to_string(),
                "more than one table defined for this key",
            ));
        }
        self.tables.insert(key, table);
        Ok(())
    }

    /// Returns the table for a key.
    pub fn get(&self, key: &TaxTableKey) -> EngineResult<&BracketTable> {
        self.tables
            .get(key)
            .ok_or_else(|| EngineError::MissingRateData {
                key: key.to_string(),
                message: "no bracket table configured".to_string(),
            })
    }

    /// Returns the number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no tables are loaded.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// The assembled configuration for one tax year.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The tax year the tables belong to.
    pub tax_year: i32,
    /// Hours classifier policy.
    pub classifier: ClassifierPolicy,
    /// Situational pay rules.
    pub situational: SituationalPayPolicy,
    /// Validated wage-rate table.
    pub wage_rates: WageRateTable,
    /// Federal income-tax constants.
    pub federal: JurisdictionRules,
    /// State income-tax constants.
    pub state: JurisdictionRules,
    /// Flat-rate payroll taxes.
    pub flat_taxes: FlatTaxRules,
    /// Validated bracket tables.
    pub tax_tables: TaxTables,
}

impl EngineConfig {
    /// Returns the income-tax constants for a jurisdiction.
    pub fn rules(&self, jurisdiction: Jurisdiction) -> &JurisdictionRules {
        match jurisdiction {
            Jurisdiction::Federal => &self.federal,
            Jurisdiction::State => &self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_classifier_policy_defaults() {
        let policy: ClassifierPolicy = serde_yaml::from_str("{}").unwrap();
        assert_eq!(policy.weekly_regular_limit, dec("40"));
        assert_eq!(policy.workweek_start, Weekday::Mon);
        assert_eq!(policy.reallocation_order, ReallocationOrder::ReverseChronological);
    }

    #[test]
    fn test_classifier_policy_from_yaml() {
        let yaml = r#"
weekly_regular_limit: "40"
workweek_start: Sun
reallocation_order: chronological
"#;
        let policy: ClassifierPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.workweek_start, Weekday::Sun);
        assert_eq!(policy.reallocation_order, ReallocationOrder::Chronological);
    }

    #[test]
    fn test_travel_band_lookup() {
        let policy = TravelPolicy {
            bands: vec![
                TravelBand {
                    min_distance: dec("30"),
                    daily_amount: dec("25.00"),
                },
                TravelBand {
                    min_distance: dec("60"),
                    daily_amount: dec("55.00"),
                },
            ],
        };
        assert!(policy.band_for(dec("29.9")).is_none());
        assert_eq!(policy.band_for(dec("30")).unwrap().daily_amount, dec("25.00"));
        assert_eq!(policy.band_for(dec("75")).unwrap().daily_amount, dec("55.00"));
    }

    #[test]
    fn test_travel_bands_must_increase() {
        let policy = TravelPolicy {
            bands: vec![
                TravelBand {
                    min_distance: dec("60"),
                    daily_amount: dec("55.00"),
                },
                TravelBand {
                    min_distance: dec("30"),
                    daily_amount: dec("25.00"),
                },
            ],
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_situational_rules_default_off() {
        let settings: EngineSettings = serde_yaml::from_str("tax_year: 2023").unwrap();
        assert!(settings.situational.minimum_pay.is_none());
        assert!(settings.situational.travel.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_weekly_limit_rejected() {
        let settings: EngineSettings = serde_yaml::from_str(
            "tax_year: 2023\nclassifier:\n  weekly_regular_limit: \"0\"\n",
        )
        .unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_standard_amount_lookup() {
        let yaml = r#"
allowance_amount: "4300"
standard_amounts:
  single: "8600"
  married_filing_jointly: "12900"
"#;
        let rules: JurisdictionRules = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            rules
                .standard_amount(Jurisdiction::Federal, FilingStatus::MarriedFilingJointly)
                .unwrap(),
            dec("12900")
        );
        assert!(matches!(
            rules.standard_amount(Jurisdiction::Federal, FilingStatus::HeadOfHousehold),
            Err(EngineError::MissingRateData { .. })
        ));
    }

    #[test]
    fn test_low_income_threshold_lookup() {
        let rules = JurisdictionRules {
            allowance_amount: Decimal::ZERO,
            standard_amounts: BTreeMap::new(),
            low_income_exemptions: vec![LowIncomeExemption {
                filing_status: FilingStatus::Single,
                pay_frequency: PayFrequency::Weekly,
                threshold: dec("333"),
            }],
        };
        assert_eq!(
            rules.low_income_threshold(FilingStatus::Single, PayFrequency::Weekly),
            Some(dec("333"))
        );
        assert_eq!(
            rules.low_income_threshold(FilingStatus::Single, PayFrequency::Monthly),
            None
        );
    }

    fn document() -> BracketTableDocument {
        BracketTableDocument {
            jurisdiction: Jurisdiction::Federal,
            filing_statuses: vec![FilingStatus::Single, FilingStatus::HeadOfHousehold],
            pay_frequencies: vec![PayFrequency::Weekly],
            eras: vec![ElectionEra::AllowanceBased, ElectionEra::IncomeBased],
            rows: vec![
                BracketRow {
                    lower: dec("0"),
                    upper: Some(dec("1000")),
                    base_tax: dec("0"),
                    rate: dec("0.1"),
                },
                BracketRow {
                    lower: dec("1000"),
                    upper: None,
                    base_tax: dec("100"),
                    rate: dec("0.2"),
                },
            ],
        }
    }

    #[test]
    fn test_document_expands_to_every_key() {
        let tables = document().expand().unwrap();
        assert_eq!(tables.len(), 4);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut tables = TaxTables::new();
        for table in document().expand().unwrap() {
            tables.insert(table).unwrap();
        }
        let again = document().expand().unwrap().remove(0);
        assert!(matches!(
            tables.insert(again),
            Err(EngineError::TaxTableCorrupt { .. })
        ));
    }

    #[test]
    fn test_missing_table_is_missing_rate_data() {
        let tables = TaxTables::new();
        let key = TaxTableKey {
            jurisdiction: Jurisdiction::State,
            filing_status: FilingStatus::Single,
            pay_frequency: PayFrequency::Monthly,
            era: ElectionEra::IncomeBased,
        };
        assert!(matches!(
            tables.get(&key),
            Err(EngineError::MissingRateData { .. })
        ));
    }
}
