//! # Configuration
//!
//! `cohort.toml` describes the populations to group and how to search:
//!
//! ```toml
//! mode = "minority_boost"
//! search_timeout_ms = 10000
//!
//! [[population]]
//! name = "male"
//! start = 1
//! end = 14
//! sizes = "4, 4, 3, 3"
//! ```
//!
//! CLI flags override the file; the HTTP server also reads `COHORT_*`
//! environment variables (see `api`).

use crate::error::AppError;
use cohort_core::{
    CohortError, FairnessMode, PopulationRange, PopulationSpec, parse_target_sizes,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default time budget for one partition request on the server.
pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 10_000;

fn default_search_timeout_ms() -> u64 {
    DEFAULT_SEARCH_TIMEOUT_MS
}

/// One population as written in config files, CLI flags and API requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub name: String,
    pub start: u64,
    pub end: u64,
    /// Comma-separated group sizes, e.g. `"4, 4, 3"`.
    pub sizes: String,
}

impl PopulationConfig {
    /// Parse sizes and build the engine's population description.
    pub fn to_spec(&self) -> Result<PopulationSpec, CohortError> {
        let sizes = parse_target_sizes(&self.sizes).map_err(|e| match e {
            CohortError::InvalidTargetSizes(reason) => {
                CohortError::InvalidTargetSizes(format!("{}: {reason}", self.name))
            }
            other => other,
        })?;
        Ok(PopulationSpec::new(
            self.name.clone(),
            PopulationRange::new(self.start, self.end),
            sizes,
        ))
    }

    /// Parse `NAME=START-END:SIZES`, e.g. `male=1-14:4,4,3,3`.
    pub fn parse_arg(arg: &str) -> Result<Self, AppError> {
        let invalid = || AppError::PopulationArg(arg.to_string());

        let (name, rest) = arg.split_once('=').ok_or_else(invalid)?;
        let (range, sizes) = rest.split_once(':').ok_or_else(invalid)?;
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            start: start.trim().parse().map_err(|_| invalid())?,
            end: end.trim().parse().map_err(|_| invalid())?,
            sizes: sizes.trim().to_string(),
        })
    }
}

/// Contents of `cohort.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: FairnessMode,

    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    #[serde(default, rename = "population")]
    pub populations: Vec<PopulationConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: FairnessMode::default(),
            search_timeout_ms: DEFAULT_SEARCH_TIMEOUT_MS,
            populations: Vec::new(),
        }
    }
}

impl Config {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String, AppError> {
        Ok(toml::to_string(self)?)
    }

    /// Engine population specs, in file order.
    pub fn population_specs(&self) -> Result<Vec<PopulationSpec>, CohortError> {
        self.populations
            .iter()
            .map(PopulationConfig::to_spec)
            .collect()
    }
}
