//! Liveness and database reachability at `/health`, outside `/api/v1`.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// The process is up but Postgres did not answer.
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    /// Round trip of the probe query in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: &'static str,
    pub database: DatabaseHealth,
}

/// GET /health
///
/// 200 when the database answers, 503 otherwise so load balancers stop
/// routing progress writes to this instance.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let started = Instant::now();
    let probe = salesdesk_db::health_check(&state.pool).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (code, status) = match &probe {
        Ok(()) => (StatusCode::OK, HealthStatus::Ok),
        Err(e) => {
            tracing::warn!(error = %e, latency_ms, "Database health probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Degraded)
        }
    };

    (
        code,
        Json(HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database: DatabaseHealth {
                reachable: probe.is_ok(),
                latency_ms,
            },
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
