//! # Cohort HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /palette?count=n` - First `n` group colours
//! - `POST /validate` - Validate a roster against population settings
//! - `POST /partition` - Group a roster
//!
//! ## Configuration (Environment Variables)
//!
//! - `COHORT_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `COHORT_RATE_LIMIT`: Requests per second (default: 20, 0 to disable)
//! - `COHORT_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use handlers::{health_handler, palette_handler, partition_handler, validate_handler};
pub use types::{
    ErrorResponse, HealthResponse, PaletteQuery, PaletteResponse, PartitionRequest,
    PartitionResponse, RosterPayload, ValidateRequest, ValidateResponse,
};

use crate::config::Config;
use crate::error::AppError;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use cohort_core::FairnessMode;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 20;

/// Maximum request body (rosters are small; uploads are base64 workbooks).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER SETTINGS
// =============================================================================

/// Everything the server needs to know, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Mode used when a request does not name one.
    pub default_mode: FairnessMode,
    /// Time budget for one `/partition` request.
    pub search_timeout: Duration,
    /// Bearer token required on every endpoint but `/health`.
    pub api_key: Option<String>,
    /// Requests per second, 0 disables limiting.
    pub rate_limit: u32,
    /// Raw `COHORT_CORS_ORIGINS` value.
    pub cors_origins: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ServerSettings {
    /// Settings from a config file, with no auth and the default rate limit.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_mode: config.mode,
            search_timeout: Duration::from_millis(config.search_timeout_ms),
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
        }
    }

    /// Settings from a config file overlaid with `COHORT_*` variables.
    #[must_use]
    pub fn from_env(config: &Config) -> Self {
        Self {
            api_key: auth::get_api_key_from_env(),
            rate_limit: middleware::get_rate_limit_from_env(),
            cors_origins: std::env::var("COHORT_CORS_ORIGINS").ok(),
            ..Self::from_config(config)
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into()).filter(|k: &String| !k.is_empty());
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limit = requests_per_second;
        self
    }
}

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    #[must_use]
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `COHORT_CORS_ORIGINS`.
///
/// - `"*"`: any origin
/// - unset or nothing parsable: localhost only
/// - otherwise: the listed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: allowing ALL origins (COHORT_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => {
                        tracing::info!("CORS: allowing origin {}", origin);
                        Some(value)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: no valid origins in COHORT_CORS_ORIGINS, using localhost");
                localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => localhost_cors(),
    }
}

fn localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit, rate
/// limiting (if enabled), authentication (if configured).
pub fn create_router(state: AppState) -> Router {
    let settings = Arc::clone(&state.settings);

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/palette", get(handlers::palette_handler))
        .route("/validate", post(handlers::validate_handler))
        .route("/partition", post(handlers::partition_handler));

    if let Some(key) = settings.api_key.clone() {
        tracing::info!("API key authentication enabled");
        router = router.layer(axum_middleware::from_fn_with_state(
            Arc::<str>::from(key),
            auth::api_key_auth_middleware,
        ));
    } else {
        tracing::warn!(
            "API key authentication DISABLED; set COHORT_API_KEY to require a bearer token"
        );
    }

    if settings.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", settings.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            middleware::create_rate_limiter(settings.rate_limit),
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(settings.cors_origins.as_deref()))
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(addr: &str, settings: ServerSettings) -> Result<(), AppError> {
    let router = create_router(AppState::new(settings));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("bind {addr} failed: {e}")))?;

    tracing::info!("Cohort HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}
