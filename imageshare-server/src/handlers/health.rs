use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use crate::infra::app_state::AppState;

/// Liveness plus a database ping when Postgres backs the stores.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = match &state.postgres {
        Some(pg) => match pg.ping().await {
            Ok(()) => "ok",
            Err(err) => {
                warn!(error = %err, "database ping failed");
                "unavailable"
            }
        },
        None => "memory",
    };

    let status = if database == "unavailable" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(json!({
            "status": if status.is_success() { "ok" } else { "degraded" },
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now(),
        })),
    )
}
