use std::time::Instant;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{error, instrument};

use crate::state::AppState;

lazy_static! {
    static ref STARTED: Instant = Instant::now();
}

/// Touch the uptime clock at process start so `/health` reports uptime since
/// boot rather than since the first probe.
pub fn init_uptime_clock() {
    lazy_static::initialize(&STARTED);
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseHealth {
    connected: bool,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_time: Option<u128>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime: f64,
    database: DatabaseHealth,
}

async fn probe_database(state: &AppState) -> (bool, Option<u128>) {
    let started = Instant::now();
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => (true, Some(started.elapsed().as_millis())),
        Err(e) => {
            error!(error = %e, "database health check failed");
            (false, None)
        }
    }
}

#[instrument(skip(state))]
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (connected, response_time) = probe_database(&state).await;

    let response = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" },
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        uptime: STARTED.elapsed().as_secs_f64(),
        database: DatabaseHealth {
            connected,
            status: if connected { "connected" } else { "disconnected" },
            response_time,
        },
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

#[instrument]
async fn liveness() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

#[instrument(skip(state))]
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (connected, _) = probe_database(&state).await;
    if connected {
        (
            StatusCode::OK,
            Json(json!({ "status": "ready", "database": { "connected": true } })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready", "database": { "connected": false } })),
        )
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
}
