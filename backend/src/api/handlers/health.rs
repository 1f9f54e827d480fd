//! Health check endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckStatus {
    fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            message: None,
        }
    }
}

/// Liveness plus a database ping when running on Postgres
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let database = match &state.db {
        Some(db) => match sqlx::query("SELECT 1").fetch_one(db).await {
            Ok(_) => CheckStatus::healthy(),
            Err(e) => CheckStatus {
                status: "unhealthy".to_string(),
                message: Some(format!("Database connection failed: {}", e)),
            },
        },
        None => CheckStatus {
            status: "healthy".to_string(),
            message: Some("in-memory store".to_string()),
        },
    };

    let healthy = database.status == "healthy";
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { database },
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}
