// [tests/mirror/apps/chronicler/services/sweeper_idempotency.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LA BARREDORA (V3.0 - HYGIENE GOLD)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: IDEMPOTENCIA DE LOS BARRIDOS DE EXPIRACIÓN E INACTIVIDAD
 *
 * # Mathematical Proof (Sweep Idempotency):
 * Sea S el estado del Ledger y f la pasada de mantenimiento con reloj
 * fijo. El certificador demuestra f(f(S)) = f(S): la segunda pasada
 * sobre el mismo reloj reporta cero mutaciones.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempo_chronicler::state::AppState;
    use tempo_domain_models::{ActivitySource, ActivityType, IngestEvent, SessionState, WorkBlockState};
    use tempo_infra_db::{StoreClient, StoreTuning};

    async fn ignite_application(memory_label: &str) -> AppState {
        let database_client = StoreClient::connect(
            &format!("file:{}?mode=memory&cache=shared", memory_label),
            None,
            StoreTuning::default(),
        )
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory temporal ledger.");
        AppState::new(database_client)
    }

    fn forge_event(user_identifier: &str, event_instant: DateTime<Utc>) -> IngestEvent {
        IngestEvent {
            user_id: user_identifier.to_string(),
            project_path: Some("/home/shared/tempo".to_string()),
            project_name: None,
            timestamp: Some(event_instant),
            activity_type: ActivityType::Command,
            activity_source: ActivitySource::Daemon,
            command: None,
            description: None,
            metadata: Default::default(),
            claude_context: None,
        }
    }

    /**
     * CERTIFICACIÓN: Pasada doble sobre el mismo reloj — la segunda es nula.
     */
    #[tokio::test]
    async fn certify_double_sweep_idempotency() {
        println!("\n💀 [INICIO]: Auditing maintenance sweep idempotency...");

        let application_state = ignite_application("mem_sweeper_v3_double").await;
        let genesis_instant = Utc.with_ymd_and_hms(2026, 3, 5, 6, 0, 0).unwrap();

        // Pipeline real: ventana + bloque anclados 6 horas en el pasado
        // del reloj de barrido.
        application_state
            .activity_processor
            .process_event(forge_event("alice", genesis_instant))
            .await
            .expect("PIPELINE_FAULT");

        let sweep_instant = genesis_instant + Duration::hours(6);

        // PRIMERA PASADA: una ventana vencida y un bloque silencioso.
        let first_report = application_state
            .maintenance_sweeper
            .sweep(sweep_instant)
            .await
            .expect("SWEEP_FAULT");
        assert_eq!(first_report.expired_sessions, 1, "EXPIRY_MISCOUNT");
        assert_eq!(first_report.idle_work_blocks, 1, "IDLE_MISCOUNT");

        // SEGUNDA PASADA (mismo reloj): conjunto de víctimas vacío.
        let second_report = application_state
            .maintenance_sweeper
            .sweep(sweep_instant)
            .await
            .expect("SWEEP_FAULT");
        assert_eq!(second_report.expired_sessions, 0, "SWEEP_NON_IDEMPOTENT (sessions)");
        assert_eq!(second_report.idle_work_blocks, 0, "SWEEP_NON_IDEMPOTENT (blocks)");
    }

    /**
     * CERTIFICACIÓN: Los estados sellados por la barredora son los contractuales.
     */
    #[tokio::test]
    async fn certify_sweep_terminal_states() {
        let application_state = ignite_application("mem_sweeper_v3_states").await;
        let genesis_instant = Utc.with_ymd_and_hms(2026, 3, 5, 6, 0, 0).unwrap();

        let pipeline_outcome = application_state
            .activity_processor
            .process_event(forge_event("bob", genesis_instant))
            .await
            .expect("PIPELINE_FAULT");

        application_state
            .maintenance_sweeper
            .sweep(genesis_instant + Duration::hours(6))
            .await
            .expect("SWEEP_FAULT");

        let swept_window = application_state
            .session_repository
            .get_session(&pipeline_outcome.session.id)
            .await
            .expect("READ_FAULT")
            .expect("WINDOW_VANISHED");
        assert_eq!(swept_window.state, SessionState::Expired);

        let swept_block = application_state
            .work_block_repository
            .get_work_block(&pipeline_outcome.work_block.id)
            .await
            .expect("READ_FAULT")
            .expect("BLOCK_VANISHED");
        assert_eq!(swept_block.state, WorkBlockState::Idle);
        // Crédito contractual del umbral: last_activity + 5min.
        assert_eq!(
            swept_block.end_time,
            Some(genesis_instant + Duration::minutes(5))
        );
    }

    /**
     * CERTIFICACIÓN: Un Ledger vigente no entrega víctimas a la barredora.
     */
    #[tokio::test]
    async fn certify_sweep_spares_live_state() {
        let application_state = ignite_application("mem_sweeper_v3_spares").await;
        let genesis_instant = Utc.with_ymd_and_hms(2026, 3, 5, 6, 0, 0).unwrap();

        application_state
            .activity_processor
            .process_event(forge_event("carol", genesis_instant))
            .await
            .expect("PIPELINE_FAULT");

        // Barrido 2 minutos después: nada venció, nada quedó silencioso.
        let merciful_report = application_state
            .maintenance_sweeper
            .sweep(genesis_instant + Duration::minutes(2))
            .await
            .expect("SWEEP_FAULT");
        assert_eq!(merciful_report.expired_sessions, 0);
        assert_eq!(merciful_report.idle_work_blocks, 0);
    }
}
