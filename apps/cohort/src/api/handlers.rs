//! # API Endpoint Handlers

use super::{
    AppState,
    types::{
        HealthResponse, MAX_PALETTE_COUNT, PaletteQuery, PaletteResponse, PartitionRequest,
        PartitionResponse, ValidateRequest, ValidateResponse,
    },
};
use crate::error::AppError;
use crate::service;
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use cohort_core::{Interrupt, PALETTE};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// PALETTE HANDLER
// =============================================================================

/// First `count` group colours (capped at `MAX_PALETTE_COUNT`).
pub async fn palette_handler(Query(query): Query<PaletteQuery>) -> impl IntoResponse {
    let count = query.count.unwrap_or(PALETTE.len()).min(MAX_PALETTE_COUNT);
    Json(PaletteResponse {
        colors: cohort_core::colors(count)
            .into_iter()
            .map(|color| color.hex().to_string())
            .collect(),
    })
}

// =============================================================================
// VALIDATE HANDLER
// =============================================================================

/// Report every problem with a roster. A roster with issues is still a
/// successful request.
pub async fn validate_handler(
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, AppError> {
    let (roster, specs) = request.resolve()?;
    let report = roster.validate(&specs);

    Ok(Json(ValidateResponse {
        valid: report.is_ok(),
        records: roster.len(),
        issues: report.issues().to_vec(),
    }))
}

// =============================================================================
// PARTITION HANDLER
// =============================================================================

/// Group a roster.
///
/// The search runs on the blocking pool. When the configured timeout
/// passes first, the search is interrupted and the request fails with 504.
pub async fn partition_handler(
    State(state): State<AppState>,
    Json(request): Json<PartitionRequest>,
) -> Result<Json<PartitionResponse>, AppError> {
    let mode = request.mode.unwrap_or(state.settings.default_mode);
    let (roster, specs) = request.resolve()?;

    let timeout = state.settings.search_timeout;
    let interrupt = Interrupt::new();
    let search_interrupt = interrupt.clone();

    let search = tokio::task::spawn_blocking(move || {
        service::plan_roster(&roster, &specs, mode, Some(search_interrupt))
    });

    match tokio::time::timeout(timeout, search).await {
        Ok(Ok(plan)) => Ok(Json(PartitionResponse::from(plan?))),
        Ok(Err(join_error)) => Err(AppError::Server(join_error.to_string())),
        Err(_) => {
            interrupt.raise();
            let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(timeout_ms = millis, "partition search timed out");
            Err(AppError::Timeout(millis))
        }
    }
}
