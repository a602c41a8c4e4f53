// [apps/chronicler/src/handlers/session.rs]
/*!
 * =================================================================
 * APARATO: SESSION QUERY & MAINTENANCE GATEWAY (V4.2 - WINDOW ORACLE)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: CONSULTA DE VENTANA ACTIVA Y DISPARO DE BARRIDOS
 * =================================================================
 */

use crate::config::{READ_DEADLINE_SECONDS, SWEEP_DEADLINE_SECONDS};
use crate::handlers::{missing_parameter_response, pipeline_fault_response};
use crate::services::PipelineError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

/**
 * Endpoint: GET /active-session?user_id=...
 *
 * Variante de solo lectura: reporta la ventana vigente sin escrituras.
 */
#[instrument(skip(application_state, query_parameters))]
pub async fn handle_active_session_query(
    State(application_state): State<AppState>,
    Query(query_parameters): Query<HashMap<String, String>>,
) -> Response {
    let Some(user_identifier) = query_parameters
        .get("user_id")
        .filter(|identifier| !identifier.trim().is_empty())
    else {
        return missing_parameter_response("user_id");
    };

    let read_deadline = Duration::from_secs(READ_DEADLINE_SECONDS);
    let probe_instant = application_state.database_client.clock().now();

    let query_outcome = tokio::time::timeout(
        read_deadline,
        application_state
            .session_manager
            .get_active_session(user_identifier, probe_instant),
    )
    .await;

    match query_outcome {
        Ok(Ok(Some(live_window))) => (
            StatusCode::OK,
            Json(json!({
                "has_active_session": true,
                "session": live_window,
            })),
        )
            .into_response(),
        Ok(Ok(None)) => (
            StatusCode::OK,
            Json(json!({
                "has_active_session": false,
            })),
        )
            .into_response(),
        Ok(Err(pipeline_fault)) => pipeline_fault_response(pipeline_fault),
        Err(_deadline_blown) => {
            pipeline_fault_response(PipelineError::DeadlineExceeded(READ_DEADLINE_SECONDS))
        }
    }
}

/**
 * Endpoint: POST /cleanup-expired-sessions
 *
 * Dispara la pasada de mantenimiento bajo demanda (idempotente).
 */
#[instrument(skip(application_state))]
pub async fn handle_expired_session_cleanup(
    State(application_state): State<AppState>,
) -> Response {
    let sweep_deadline = Duration::from_secs(SWEEP_DEADLINE_SECONDS);

    let sweep_outcome = tokio::time::timeout(
        sweep_deadline,
        application_state.maintenance_sweeper.sweep(Utc::now()),
    )
    .await;

    match sweep_outcome {
        Ok(Ok(sweep_report)) => (
            StatusCode::OK,
            Json(json!({
                "expired_sessions": sweep_report.expired_sessions,
                "idle_work_blocks": sweep_report.idle_work_blocks,
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            })),
        )
            .into_response(),
        Ok(Err(pipeline_fault)) => pipeline_fault_response(pipeline_fault),
        Err(_deadline_blown) => {
            pipeline_fault_response(PipelineError::DeadlineExceeded(SWEEP_DEADLINE_SECONDS))
        }
    }
}
