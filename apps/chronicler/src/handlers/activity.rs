// [apps/chronicler/src/handlers/activity.rs]
/*!
 * =================================================================
 * APARATO: ACTIVITY INGEST GATEWAY (V5.1 - PIPELINE FRONT)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: RECEPCIÓN DEL EVENTO ATÓMICO Y DESPACHO AL PIPELINE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DEADLINE SHIELD: Cada ingesta carga un presupuesto de 10 segundos;
 *    al agotarse, la llamada en vuelo se cancela y el fallo se reporta
 *    sin medias escrituras (toda mutación viaja en transacción).
 * 2. RETRY SEMANTICS: Reintentar el mismo evento es seguro para la
 *    integridad, pero el contador de actividad NO es idempotente; el
 *    transporte decide si deduplica.
 * =================================================================
 */

use crate::config::INGEST_DEADLINE_SECONDS;
use crate::handlers::pipeline_fault_response;
use crate::services::PipelineError;
use crate::state::AppState;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use serde_json::json;
use std::time::Duration;
use tempo_domain_models::IngestEvent;
use tracing::instrument;

/**
 * Endpoint: POST /activity
 *
 * Receptor universal de eventos de actividad del desarrollador.
 */
#[instrument(skip(application_state, ingest_event), fields(user = %ingest_event.user_id))]
pub async fn handle_activity_ingestion(
    State(application_state): State<AppState>,
    Json(ingest_event): Json<IngestEvent>,
) -> Response {
    let ingest_deadline = Duration::from_secs(INGEST_DEADLINE_SECONDS);

    let pipeline_outcome = tokio::time::timeout(
        ingest_deadline,
        application_state.activity_processor.process_event(ingest_event),
    )
    .await;

    match pipeline_outcome {
        Ok(Ok(processed_activity)) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "processed": true,
                "timestamp": processed_activity
                    .activity
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            })),
        )
            .into_response(),
        Ok(Err(pipeline_fault)) => pipeline_fault_response(pipeline_fault),
        Err(_deadline_blown) => {
            pipeline_fault_response(PipelineError::DeadlineExceeded(INGEST_DEADLINE_SECONDS))
        }
    }
}
