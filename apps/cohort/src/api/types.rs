//! # API Request/Response Types
//!
//! JSON bodies of the HTTP API, and the mapping from `AppError` to HTTP
//! status codes.

use crate::config::PopulationConfig;
use crate::error::AppError;
use crate::roster_io::{decode_data_url, roster_from_xlsx_bytes};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cohort_core::{
    CohortError, FairnessMode, Placement, Plan, PopulationSpec, PreferenceRecord, Roster,
    ValidationIssue,
};
use serde::{Deserialize, Serialize};

/// Largest `count` accepted by `/palette`.
pub const MAX_PALETTE_COUNT: usize = 256;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// PALETTE
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaletteQuery {
    /// Defaults to one full cycle of the palette.
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteResponse {
    pub colors: Vec<String>,
}

// =============================================================================
// ROSTER PAYLOAD
// =============================================================================

/// A roster as sent by clients: either records inline or an uploaded
/// spreadsheet.
///
/// ```json
/// [{"person": 1, "choices": [2, 3, 4]}]
/// {"contents": "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,UEsDB..."}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RosterPayload {
    Records(Vec<PreferenceRecord>),
    Upload { contents: String },
}

impl RosterPayload {
    pub fn into_roster(self) -> Result<Roster, AppError> {
        match self {
            Self::Records(records) => Ok(Roster::new(records)),
            Self::Upload { contents } => roster_from_xlsx_bytes(&decode_data_url(&contents)?),
        }
    }
}

fn resolve(
    roster: RosterPayload,
    populations: &[PopulationConfig],
) -> Result<(Roster, Vec<PopulationSpec>), AppError> {
    let specs = populations
        .iter()
        .map(PopulationConfig::to_spec)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((roster.into_roster()?, specs))
}

// =============================================================================
// VALIDATE REQUEST/RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub roster: RosterPayload,
    pub populations: Vec<PopulationConfig>,
}

impl ValidateRequest {
    /// Decode the roster and parse every population.
    pub fn resolve(self) -> Result<(Roster, Vec<PopulationSpec>), AppError> {
        resolve(self.roster, &self.populations)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub records: usize,
    pub issues: Vec<ValidationIssue>,
}

// =============================================================================
// PARTITION REQUEST/RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionRequest {
    pub roster: RosterPayload,
    pub populations: Vec<PopulationConfig>,
    /// Falls back to the server's configured mode.
    #[serde(default)]
    pub mode: Option<FairnessMode>,
}

impl PartitionRequest {
    pub fn resolve(self) -> Result<(Roster, Vec<PopulationSpec>), AppError> {
        resolve(self.roster, &self.populations)
    }
}

/// The plan plus a flat person-to-group table.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionResponse {
    pub complete: bool,
    #[serde(flatten)]
    pub plan: Plan,
    pub placements: Vec<Placement>,
}

impl From<Plan> for PartitionResponse {
    fn from(plan: Plan) -> Self {
        Self {
            complete: plan.is_complete(),
            placements: plan.placements(),
            plan,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::Engine(
                CohortError::NoFeasiblePartition
                | CohortError::TargetSizeMismatch { .. }
                | CohortError::InvalidRoster(_),
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Timeout(_) | Self::Engine(CohortError::SearchInterrupted) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            err if err.is_malformed_input() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && status != StatusCode::GATEWAY_TIMEOUT {
            tracing::error!("request failed: {}", self);
        }

        let error = self.to_string();
        let issues = match self {
            Self::Validation(report) => report.issues().to_vec(),
            _ => Vec::new(),
        };
        (status, Json(ErrorResponse { error, issues })).into_response()
    }
}
