//! Integration tests for the HTTP API.
//!
//! Uses axum-test to exercise the router without binding a socket.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use cohort::api::{
    AppState, ErrorResponse, HealthResponse, PaletteResponse, ServerSettings, ValidateResponse,
    create_router,
};
use cohort::template::{TemplateOptions, generate};
use serde_json::{Value, json};
use std::time::Duration;

fn server_with(settings: ServerSettings) -> TestServer {
    TestServer::new(create_router(AppState::new(settings))).unwrap()
}

fn server() -> TestServer {
    server_with(ServerSettings::default().with_rate_limit(0))
}

fn pairs_roster() -> Value {
    json!([
        {"person": 1, "choices": [2, 3, 4]},
        {"person": 2, "choices": [1, 3, 4]},
        {"person": 3, "choices": [4, 1, 2]},
        {"person": 4, "choices": [3, 1, 2]}
    ])
}

fn population(sizes: &str) -> Value {
    json!([{"name": "class", "start": 1, "end": 4, "sizes": sizes}])
}

fn group_of(body: &Value, person: u64) -> u64 {
    body["placements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["person"] == person)
        .map(|p| p["group"].as_u64().unwrap())
        .unwrap()
}

// =============================================================================
// HEALTH / PALETTE
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_palette_defaults_to_one_cycle() {
    let server = server();

    let palette: PaletteResponse = server.get("/palette").await.json();
    assert_eq!(palette.colors.len(), 22);
    assert_eq!(palette.colors[0], "#1f77b4");
    assert_eq!(palette.colors[10], "#8dd3c7");
}

#[tokio::test]
async fn test_palette_cycles_and_caps() {
    let server = server();

    let palette: PaletteResponse = server.get("/palette").add_query_param("count", 23).await.json();
    assert_eq!(palette.colors.len(), 23);
    assert_eq!(palette.colors[22], palette.colors[0]);

    let capped: PaletteResponse = server
        .get("/palette")
        .add_query_param("count", 100_000)
        .await
        .json();
    assert_eq!(capped.colors.len(), 256);
}

// =============================================================================
// VALIDATE
// =============================================================================

#[tokio::test]
async fn test_validate_accepts_clean_roster() {
    let server = server();

    let response = server
        .post("/validate")
        .json(&json!({"roster": pairs_roster(), "populations": population("2, 2")}))
        .await;
    response.assert_status_ok();

    let result: ValidateResponse = response.json();
    assert!(result.valid);
    assert_eq!(result.records, 4);
    assert!(result.issues.is_empty());
}

#[tokio::test]
async fn test_validate_reports_issues_with_200() {
    let server = server();
    let roster = json!([
        {"person": 1, "choices": [1, 2, 3]},
        {"person": 2, "choices": [1, 3, 9]},
        {"person": 3, "choices": [1, 2, 1]}
    ]);

    let response = server
        .post("/validate")
        .json(&json!({"roster": roster, "populations": [{"name": "a", "start": 1, "end": 3, "sizes": "3"}]}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["valid"], false);
    let kinds: Vec<&str> = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"self_preference"));
    assert!(kinds.contains(&"unknown_preference"));
}

#[tokio::test]
async fn test_validate_rejects_garbage_upload() {
    let server = server();

    let response = server
        .post("/validate")
        .json(&json!({"roster": {"contents": "data:application/octet-stream;base64,bm90IGEgd29ya2Jvb2s="}, "populations": population("2, 2")}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let error: ErrorResponse = response.json();
    assert!(error.error.contains("Spreadsheet"));
}

// =============================================================================
// PARTITION
// =============================================================================

#[tokio::test]
async fn test_partition_groups_mutual_pairs() {
    let server = server();

    let response = server
        .post("/partition")
        .json(&json!({"roster": pairs_roster(), "populations": population("2, 2")}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["complete"], true);
    assert_eq!(body["mode"], "primary");
    assert_eq!(body["placements"].as_array().unwrap().len(), 4);

    assert_eq!(group_of(&body, 1), group_of(&body, 2));
    assert_eq!(group_of(&body, 3), group_of(&body, 4));
    assert_ne!(group_of(&body, 1), group_of(&body, 3));

    let grouped = &body["populations"][0];
    assert_eq!(grouped["status"], "grouped");
    assert_eq!(grouped["score"]["intra"], 12);
    assert_eq!(grouped["score"]["inter"], 12);
    assert_eq!(grouped["fairness"]["outcome"], "not_requested");
}

#[tokio::test]
async fn test_partition_honours_requested_mode() {
    let server = server();

    let response = server
        .post("/partition")
        .json(&json!({
            "roster": pairs_roster(),
            "populations": population("2, 2"),
            "mode": "minority_boost"
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["mode"], "minority_boost");
    assert!(body["populations"][0]["fairness"]["outcome"].is_string());
}

#[tokio::test]
async fn test_partition_size_mismatch_is_unprocessable() {
    let server = server();

    let response = server
        .post("/partition")
        .json(&json!({"roster": pairs_roster(), "populations": population("3, 3")}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let error: ErrorResponse = response.json();
    assert_eq!(error.issues.len(), 1);
}

#[tokio::test]
async fn test_partition_bad_sizes_is_bad_request() {
    let server = server();

    let response = server
        .post("/partition")
        .json(&json!({"roster": pairs_roster(), "populations": population("2, x")}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let error: ErrorResponse = response.json();
    assert!(error.error.contains("class"));
}

#[tokio::test]
async fn test_partition_overflowing_sizes_is_bad_request() {
    let server = server();

    let response = server
        .post("/partition")
        .json(&json!({"roster": pairs_roster(), "populations": population("18446744073709551615, 2")}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partition_infeasible_population_is_reported() {
    let server = server();
    // 1-2 and 3-4 only know each other; one group of four is unreachable.
    let roster = json!([
        {"person": 1, "choices": [2, 2, 2]},
        {"person": 2, "choices": [1, 1, 1]},
        {"person": 3, "choices": [4, 4, 4]},
        {"person": 4, "choices": [3, 3, 3]}
    ]);

    let response = server
        .post("/partition")
        .json(&json!({"roster": roster, "populations": population("4")}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["complete"], false);
    assert_eq!(body["populations"][0]["status"], "infeasible");
    assert!(body["placements"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_partition_times_out() {
    let mut settings = ServerSettings::default().with_rate_limit(0);
    settings.search_timeout = Duration::ZERO;
    let server = server_with(settings);

    let demo = generate(&TemplateOptions::default()).unwrap();
    let response = server
        .post("/partition")
        .json(&json!({
            "roster": demo.roster,
            "populations": demo.config.populations,
            "mode": "isolation_boost"
        }))
        .await;
    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
}

// =============================================================================
// AUTH / RATE LIMIT
// =============================================================================

#[tokio::test]
async fn test_auth_required_when_key_configured() {
    let server = server_with(
        ServerSettings::default()
            .with_rate_limit(0)
            .with_api_key("s3cret"),
    );
    let body = json!({"roster": pairs_roster(), "populations": population("2, 2")});

    server.get("/health").await.assert_status_ok();
    server
        .post("/validate")
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/validate")
        .add_header(header::AUTHORIZATION, "Bearer wrong".parse::<HeaderValue>().unwrap())
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/validate")
        .add_header(header::AUTHORIZATION, "Bearer s3cret".parse::<HeaderValue>().unwrap())
        .json(&body)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let server = server_with(ServerSettings::default().with_rate_limit(1));

    server.get("/health").await.assert_status_ok();
    server
        .get("/health")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
