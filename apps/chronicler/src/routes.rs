// INICIO DEL ARCHIVO [apps/chronicler/src/routes.rs]
/*!
 * =================================================================
 * APARATO: LEDGER ROUTING MATRIX (V5.0 - SURFACE CONTRACT)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: TOPOLOGÍA HTTP DE INGESTA, CONSULTA Y MANTENIMIENTO
 *
 * VISION HIPER-HOLÍSTICA:
 * La topología expone el contrato completo del núcleo:
 * 1. Ingesta de alta frecuencia (POST /activity).
 * 2. Oráculos de solo lectura (ventana activa, bloques por sesión).
 * 3. Mantenimiento bajo demanda (barrido de expiración e inactividad).
 * Los métodos ilegales reciben 405 del propio router.
 * =================================================================
 */

use crate::handlers::{activity, health, session, work_block};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Techo físico del cuerpo de una ingesta (1 MiB).
const MAXIMUM_INGEST_BODY_BYTES: usize = 1_048_576;

pub fn create_ledger_router(application_shared_state: AppState) -> Router {
    // Escudo de Red: Permite CORS para el Dashboard y herramientas de Ops.
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        // ESTRATO DE INGESTA (High Frequency)
        .route("/activity", post(activity::handle_activity_ingestion))
        // ESTRATO DE ORÁCULOS (Read Only)
        .route("/active-session", get(session::handle_active_session_query))
        .route("/work-block-status", get(work_block::handle_work_block_status))
        .route("/session-work-blocks", get(work_block::handle_session_work_blocks))
        // ESTRATO DE MANTENIMIENTO (On Demand, Idempotent)
        .route(
            "/cleanup-expired-sessions",
            post(session::handle_expired_session_cleanup),
        )
        // SONDA DE VIDA
        .route("/health", get(health::handle_health_probe))
        .layer(network_security_shield)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAXIMUM_INGEST_BODY_BYTES))
        .with_state(application_shared_state)
}
// FIN DEL ARCHIVO [apps/chronicler/src/routes.rs]
