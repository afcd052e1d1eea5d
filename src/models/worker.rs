//! Worker model.
//!
//! This module defines the [`Worker`] struct: the identity and rate-lookup
//! attributes of the person being paid.

use serde::{Deserialize, Serialize};

use super::RateKey;

/// Represents a worker whose pay is being calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    /// Unique identifier for the worker.
    pub id: String,
    /// The worker's home local.
    pub local: String,
    /// The trade classification (e.g., "journeyman_electrician").
    pub classification: String,
    /// Apprentice level, if the worker is an apprentice.
    #[serde(default)]
    pub apprentice_level: Option<u8>,
}

impl Worker {
    /// Returns true if the worker is paid as an apprentice.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::Worker;
    ///
    /// let apprentice = Worker {
    ///     id: "wkr_001".to_string(),
    ///     local: "local_46".to_string(),
    ///     classification: "inside_wireman".to_string(),
    ///     apprentice_level: Some(2),
    /// };
    /// assert!(apprentice.is_apprentice());
    /// ```
    pub fn is_apprentice(&self) -> bool {
        self.apprentice_level.is_some()
    }

    /// Builds the wage-rate lookup key for a record's zone.
    pub fn rate_key(&self, zone: &str) -> RateKey {
        RateKey {
            local: self.local.clone(),
            classification: self.classification.clone(),
            zone: zone.to_string(),
        }
    }
}
