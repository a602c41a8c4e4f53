// [apps/chronicler/src/handlers/health.rs]

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

/**
 * Endpoint: GET /health
 *
 * Sonda de vida: conectividad del Ledger + conjunto mínimo de tablas.
 */
pub async fn handle_health_probe(State(application_state): State<AppState>) -> Response {
    match application_state.database_client.verify_health().await {
        Ok(health_report) if health_report.is_operational() => (
            StatusCode::OK,
            Json(json!({
                "status": "operational",
                "schema_revision": health_report.schema_revision,
            })),
        )
            .into_response(),
        Ok(degraded_report) => {
            warn!(
                "🩺 [HEALTH_DEGRADED]: Missing tables: {:?}",
                degraded_report.missing_tables
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "missing_tables": degraded_report.missing_tables,
                })),
            )
                .into_response()
        }
        Err(probe_fault) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unreachable",
                "error": probe_fault.to_string(),
            })),
        )
            .into_response(),
    }
}
