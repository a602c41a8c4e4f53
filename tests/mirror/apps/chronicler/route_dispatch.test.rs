// [tests/mirror/apps/chronicler/route_dispatch.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE DESPACHO DE RUTAS (V3.0 - TOPOLOGY)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: TOPOLOGÍA COMPLETA DE LA MATRIZ DE ENRUTAMIENTO
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use tempo_chronicler::routes::create_ledger_router;
    use tempo_chronicler::state::AppState;
    use tempo_infra_db::{StoreClient, StoreTuning};
    use tower::ServiceExt;

    async fn ignite_surface(memory_label: &str) -> axum::Router {
        let database_client = StoreClient::connect(
            &format!("file:{}?mode=memory&cache=shared", memory_label),
            None,
            StoreTuning::default(),
        )
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory temporal ledger.");
        create_ledger_router(AppState::new(database_client))
    }

    async fn decode_json_body(response_body: Body) -> Value {
        let collected_bytes = axum::body::to_bytes(response_body, usize::MAX)
            .await
            .expect("BODY_COLLECT_FAULT");
        serde_json::from_slice(&collected_bytes).expect("BODY_DECODE_FAULT")
    }

    /**
     * CERTIFICACIÓN: La sonda de vida reporta el Ledger operacional.
     */
    #[tokio::test]
    async fn certify_health_probe_dispatch() {
        println!("\n🩺 [INICIO]: Auditing /health dispatch...");

        let ledger_surface = ignite_surface("mem_routes_v3_health").await;

        let health_response = ledger_surface
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/health")
                    .body(Body::empty())
                    .expect("REQUEST_FORGE_FAULT"),
            )
            .await
            .expect("SURFACE_FAULT");

        assert_eq!(health_response.status(), StatusCode::OK);
        let health_payload = decode_json_body(health_response.into_body()).await;
        assert_eq!(health_payload["status"], "operational");
        assert!(health_payload["schema_revision"].is_number());
    }

    /**
     * CERTIFICACIÓN: El endpoint de mantenimiento responde el contrato
     * {expired_sessions, idle_work_blocks, timestamp} sobre un Ledger virgen.
     */
    #[tokio::test]
    async fn certify_maintenance_dispatch() {
        let ledger_surface = ignite_surface("mem_routes_v3_maintenance").await;

        let cleanup_response = ledger_surface
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/cleanup-expired-sessions")
                    .body(Body::empty())
                    .expect("REQUEST_FORGE_FAULT"),
            )
            .await
            .expect("SURFACE_FAULT");

        assert_eq!(cleanup_response.status(), StatusCode::OK);
        let cleanup_payload = decode_json_body(cleanup_response.into_body()).await;
        assert_eq!(cleanup_payload["expired_sessions"], 0);
        assert_eq!(cleanup_payload["idle_work_blocks"], 0);
        assert!(cleanup_payload["timestamp"].is_string());
    }

    /**
     * CERTIFICACIÓN: Ruta fantasma -> 404; parámetros ausentes -> 400.
     */
    #[tokio::test]
    async fn certify_dispatch_rejections() {
        let ledger_surface = ignite_surface("mem_routes_v3_rejections").await;

        let phantom_response = ledger_surface
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/phantom-route")
                    .body(Body::empty())
                    .expect("REQUEST_FORGE_FAULT"),
            )
            .await
            .expect("SURFACE_FAULT");
        assert_eq!(phantom_response.status(), StatusCode::NOT_FOUND);

        let parameterless_status = ledger_surface
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/work-block-status")
                    .body(Body::empty())
                    .expect("REQUEST_FORGE_FAULT"),
            )
            .await
            .expect("SURFACE_FAULT");
        assert_eq!(parameterless_status.status(), StatusCode::BAD_REQUEST);
    }

    /**
     * CERTIFICACIÓN: Estado del bloque por (sesión, ruta) — contrato dual.
     */
    #[tokio::test]
    async fn certify_work_block_status_dispatch() {
        let ledger_surface = ignite_surface("mem_routes_v3_block_status").await;

        // Proyecto jamás registrado: ausencia sin efectos colaterales.
        let vacant_response = ledger_surface
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/work-block-status?session_id=sess_ghost&project_path=/never")
                    .body(Body::empty())
                    .expect("REQUEST_FORGE_FAULT"),
            )
            .await
            .expect("SURFACE_FAULT");

        assert_eq!(vacant_response.status(), StatusCode::OK);
        let vacant_payload = decode_json_body(vacant_response.into_body()).await;
        assert_eq!(vacant_payload["has_active_work_block"], false);
    }
}
