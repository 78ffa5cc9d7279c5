//! # Application Errors
//!
//! Everything the CLI and the HTTP API can fail with. Engine errors are
//! wrapped unchanged; the rest come from files, payloads and the runtime.

use cohort_core::{CohortError, ValidationReport};
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the Cohort binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] CohortError),

    /// The roster or population setup failed validation.
    #[error("Roster validation failed: {}", .0.summary())]
    Validation(ValidationReport),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File '{}' is {size} bytes, limit is {limit}", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Cannot write config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Invalid upload: {0}")]
    Upload(String),

    #[error("Unsupported roster format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid population '{0}': expected NAME=START-END:SIZES")]
    PopulationArg(String),

    #[error("Invalid template: {0}")]
    Template(String),

    #[error("Search timed out after {0} ms")]
    Timeout(u64),

    #[error("Server error: {0}")]
    Server(String),
}

impl AppError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller sent something malformed (as opposed to something
    /// well-formed that the engine rejects).
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::Json(_)
                | Self::Spreadsheet(_)
                | Self::Upload(_)
                | Self::UnsupportedFormat(_)
                | Self::PopulationArg(_)
                | Self::Engine(CohortError::InvalidTargetSizes(_))
        )
    }
}
