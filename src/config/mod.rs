//! Configuration loading and management for the payroll engine.
//!
//! This module provides functionality to load one tax year's configuration
//! from YAML files: classifier and situational pay policies, wage rates,
//! income-tax constants, flat-rate taxes, and bracket tables.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/2023").unwrap();
//! println!("Loaded tax year: {}", loader.config().tax_year);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    BracketTableDocument, ClassifierPolicy, EngineConfig, EngineSettings, FlatTaxRule,
    FlatTaxRules, HospitalInsuranceRule, InstallationPolicy, JurisdictionRules,
    LowIncomeExemption, MealPenaltyPolicy, MinimumPayPolicy, ReallocationOrder,
    SituationalPayPolicy, TaxTables, TaxesDocument, TravelBand, TravelPolicy, WageRatesDocument,
};
