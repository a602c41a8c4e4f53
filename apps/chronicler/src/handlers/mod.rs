// [apps/chronicler/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: HTTP HANDLER MATRIX (V4.0 - SURFACE CONTRACT)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: TRADUCCIÓN FALLO-DE-PIPELINE -> ESTADO HTTP
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STATUS TAXONOMY: Validation -> 400, NotFound -> 404, Store -> 500,
 *    Deadline -> 504. El 405 de método ilegal lo emite el router.
 * 2. ERROR PAYLOAD: Toda falla viaja como JSON {status, error} para el
 *    consumo uniforme de los clientes de ingesta.
 * =================================================================
 */

use crate::services::PipelineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

pub mod activity;
pub mod health;
pub mod session;
pub mod work_block;

/// Traduce un fallo del pipeline al contrato HTTP de la superficie.
pub(crate) fn pipeline_fault_response(pipeline_fault: PipelineError) -> Response {
    let (http_status, fault_message) = match &pipeline_fault {
        PipelineError::Validation(contract_violation) => {
            warn!("⛔ [INGEST_REJECTED]: {}", contract_violation);
            (StatusCode::BAD_REQUEST, pipeline_fault.to_string())
        }
        PipelineError::NotFound(missing_referent) => {
            warn!("🔍 [REFERENT_MISSING]: {}", missing_referent);
            (StatusCode::NOT_FOUND, pipeline_fault.to_string())
        }
        PipelineError::Store(store_fault) => {
            error!("💀 [STORE_FAULT]: {}", store_fault);
            (StatusCode::INTERNAL_SERVER_ERROR, pipeline_fault.to_string())
        }
        PipelineError::DeadlineExceeded(_) => {
            warn!("⏱️ [DEADLINE_BLOWN]: {}", pipeline_fault);
            (StatusCode::GATEWAY_TIMEOUT, pipeline_fault.to_string())
        }
    };

    (
        http_status,
        Json(json!({
            "status": "error",
            "error": fault_message,
        })),
    )
        .into_response()
}

/// Respuesta 400 uniforme para parámetros de consulta ausentes.
pub(crate) fn missing_parameter_response(parameter_name: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "status": "error",
            "error": format!("MISSING_QUERY_PARAMETER: {}", parameter_name),
        })),
    )
        .into_response()
}
