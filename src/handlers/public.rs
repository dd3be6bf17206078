use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

/// GET /
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Retention OS API",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "description": "Account-scoped customer retention data",
            "endpoints": {
                "health": "/health",
                "customers": "/api/customers/list",
                "guides": "/api/guides/list",
                "integrations": "/api/integrations/status",
                "metrics": [
                    "/api/metrics/cohorts",
                    "/api/metrics/kpis",
                    "/api/metrics/segments"
                ],
                "reports": "/api/reports/summary",
                "retention": "/api/retention/analysis",
                "settings": "/api/settings/user"
            },
            "authentication": "session cookie (sb-access-token or sb-<ref>-auth-token) or Authorization: Bearer"
        }
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        })),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ApiResponse::with_status(
                json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": e.to_string()
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
