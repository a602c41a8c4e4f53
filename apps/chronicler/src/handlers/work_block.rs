// [apps/chronicler/src/handlers/work_block.rs]
/*!
 * =================================================================
 * APARATO: WORK BLOCK QUERY GATEWAY (V4.1 - BLOCK ORACLE)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: ESTADO DEL BLOQUE ABIERTO Y AGREGACIÓN POR SESIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. READ PURITY: Las consultas de estado JAMÁS crean proyectos ni
 *    bloques; una ruta desconocida simplemente reporta ausencia.
 * 2. LIVE CREDIT: Las horas totales de una sesión suman la duración
 *    derivada de los bloques sellados más el tramo vivo de los abiertos.
 * =================================================================
 */

use crate::config::READ_DEADLINE_SECONDS;
use crate::handlers::{missing_parameter_response, pipeline_fault_response};
use crate::services::PipelineError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tempo_domain_models::WorkBlock;
use tracing::instrument;

/**
 * Endpoint: GET /work-block-status?session_id=...&project_path=...
 */
#[instrument(skip(application_state, query_parameters))]
pub async fn handle_work_block_status(
    State(application_state): State<AppState>,
    Query(query_parameters): Query<HashMap<String, String>>,
) -> Response {
    let Some(session_identifier) = query_parameters
        .get("session_id")
        .filter(|identifier| !identifier.trim().is_empty())
    else {
        return missing_parameter_response("session_id");
    };
    let Some(raw_project_path) = query_parameters
        .get("project_path")
        .filter(|path| !path.trim().is_empty())
    else {
        return missing_parameter_response("project_path");
    };

    let read_deadline = Duration::from_secs(READ_DEADLINE_SECONDS);

    let status_outcome = tokio::time::timeout(read_deadline, async {
        // Lectura pura: un proyecto no registrado implica ausencia de bloque.
        let Some(registered_project) = application_state
            .project_resolver
            .resolve_existing(raw_project_path)
            .await?
        else {
            return Ok::<Option<WorkBlock>, PipelineError>(None);
        };

        Ok(application_state
            .work_block_repository
            .get_open_by_session_and_project(session_identifier, &registered_project.id)
            .await?)
    })
    .await;

    match status_outcome {
        Ok(Ok(Some(open_block))) => (
            StatusCode::OK,
            Json(json!({
                "has_active_work_block": true,
                "work_block": open_block,
            })),
        )
            .into_response(),
        Ok(Ok(None)) => (
            StatusCode::OK,
            Json(json!({
                "has_active_work_block": false,
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
 * Endpoint: GET /session-work-blocks?session_id=...
 */
#[instrument(skip(application_state, query_parameters))]
pub async fn handle_session_work_blocks(
    State(application_state): State<AppState>,
    Query(query_parameters): Query<HashMap<String, String>>,
) -> Response {
    let Some(session_identifier) = query_parameters
        .get("session_id")
        .filter(|identifier| !identifier.trim().is_empty())
    else {
        return missing_parameter_response("session_id");
    };

    let read_deadline = Duration::from_secs(READ_DEADLINE_SECONDS);

    let listing_outcome = tokio::time::timeout(
        read_deadline,
        application_state
            .work_block_repository
            .list_by_session(session_identifier),
    )
    .await;

    match listing_outcome {
        Ok(Ok(session_blocks)) => {
            let total_work_hours: f64 = session_blocks
                .iter()
                .map(|session_block| match session_block.duration_hours {
                    Some(sealed_hours) => sealed_hours,
                    // Tramo vivo de un bloque abierto: start -> last_activity.
                    None => {
                        (session_block.last_activity_time - session_block.start_time)
                            .num_milliseconds() as f64
                            / 3_600_000.0
                    }
                })
                .sum();

            (
                StatusCode::OK,
                Json(json!({
                    "work_block_count": session_blocks.len(),
                    "total_work_hours": total_work_hours,
                    "work_blocks": session_blocks,
                })),
            )
                .into_response()
        }
        Ok(Err(store_fault)) => pipeline_fault_response(store_fault.into()),
        Err(_deadline_blown) => {
            pipeline_fault_response(PipelineError::DeadlineExceeded(READ_DEADLINE_SECONDS))
        }
    }
}
