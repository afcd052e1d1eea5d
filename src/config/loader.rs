//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading one tax year's
//! engine configuration from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::WageRateTable;

use super::types::{
    BracketTableDocument, EngineConfig, EngineSettings, TaxTables, TaxesDocument,
    WageRatesDocument,
};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/2023/
/// ├── engine.yaml        # Tax year, classifier policy, situational pay
/// ├── wage_rates.yaml    # Effective-dated wage rates
/// ├── taxes.yaml         # Jurisdiction rules and flat-rate taxes
/// └── tax_tables/
///     └── *.yaml         # Bracket tables
/// ```
///
/// Every table is validated while loading, so a loader that exists holds
/// only structurally sound data.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/2023")?;
/// println!("Tax year: {}", loader.config().tax_year);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any required file is missing or unparseable, or if
    /// a wage-rate or bracket table fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let engine_path = path.join("engine.yaml");
        let settings = Self::load_yaml::<EngineSettings>(&engine_path)?;
        settings
            .validate()
            .map_err(|message| EngineError::ConfigParseError {
                path: engine_path.display().to_string(),
                message,
            })?;

        let rates_path = path.join("wage_rates.yaml");
        let rates = Self::load_yaml::<WageRatesDocument>(&rates_path)?;
        let wage_rates = WageRateTable::new(rates.rates)?;

        let taxes = Self::load_yaml::<TaxesDocument>(&path.join("taxes.yaml"))?;
        let tax_tables = Self::load_tax_tables(&path.join("tax_tables"))?;

        debug!(
            tax_year = settings.tax_year,
            wage_rates = wage_rates.len(),
            tax_tables = tax_tables.len(),
            "Loaded engine configuration"
        );

        Ok(Self::from_config(EngineConfig {
            tax_year: settings.tax_year,
            classifier: settings.classifier,
            situational: settings.situational,
            wage_rates,
            federal: taxes.federal,
            state: taxes.state,
            flat_taxes: taxes.flat_taxes,
            tax_tables,
        }))
    }

    /// Wraps an already-assembled configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every bracket-table document in the directory, in file-name order.
    fn load_tax_tables(dir: &Path) -> EngineResult<TaxTables> {
        let dir_str = dir.display().to_string();

        if !dir.exists() {
            return Err(EngineError::ConfigNotFound { path: dir_str });
        }

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no tax table files found)", dir_str),
            });
        }

        let mut tables = TaxTables::new();
        for path in paths {
            let document = Self::load_yaml::<BracketTableDocument>(&path)?;
            for table in document.expand()? {
                tables.insert(table)?;
            }
        }
        Ok(tables)
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
