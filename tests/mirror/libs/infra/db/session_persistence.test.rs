// [tests/mirror/libs/infra/db/session_persistence.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE PERSISTENCIA DE SESIONES (V3.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DE LA VENTANA DE 5 HORAS EN EL LEDGER
 *
 * # Mathematical Proof (Terminal State Physics):
 * Las transiciones exigen 'state = active' como origen en la cláusula
 * WHERE; el certificador demuestra que un estado terminal es
 * físicamente inalcanzable como origen de mutación.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use tempo_domain_models::{Session, SessionState};
    use tempo_infra_db::repositories::{SessionRepository, UserRepository};
    use tempo_infra_db::{DbError, StoreClient, StoreTuning};

    async fn ignite_memory_ledger(memory_label: &str) -> StoreClient {
        StoreClient::connect(
            &format!("file:{}?mode=memory&cache=shared", memory_label),
            None,
            StoreTuning::default(),
        )
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory temporal ledger.")
    }

    fn anchor() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 14, 0, 0).unwrap()
    }

    /**
     * CERTIFICACIÓN: Ciclo completo — génesis, pulso, expiración.
     */
    #[tokio::test]
    async fn certify_session_window_lifecycle() {
        println!("\n🗄️  [INICIO]: Auditing 5-hour window lifecycle in the Ledger...");

        let database_client = ignite_memory_ledger("mem_sessions_v31_cycle").await;
        let user_repository = UserRepository::new(database_client.clone());
        let session_repository = SessionRepository::new(database_client.clone());

        user_repository.ensure_user("alice").await.expect("USER_FAULT");

        // 1. GÉNESIS: Ventana fresca anclada a la primera actividad.
        let fresh_window = Session::open("alice", anchor());
        session_repository
            .create_session(&fresh_window)
            .await
            .expect("GENESIS_FAULT");

        // 2. PULSO: last_activity avanza, count se incrementa atómicamente.
        session_repository
            .record_session_activity(&fresh_window.id, anchor() + Duration::minutes(30))
            .await
            .expect("PULSE_FAULT");

        let pulsed_window = session_repository
            .get_session(&fresh_window.id)
            .await
            .expect("READ_FAULT")
            .expect("WINDOW_VANISHED");
        assert_eq!(pulsed_window.activity_count, 2);
        assert_eq!(pulsed_window.last_activity_time, anchor() + Duration::minutes(30));
        assert_eq!(pulsed_window.first_activity_time, Some(anchor()));
        assert_eq!(pulsed_window.end_time, anchor() + Duration::hours(5));

        // 3. CONSULTA DE VIGENCIA: el instante sonda respeta la frontera.
        let live_windows = session_repository
            .get_active_sessions_by_user("alice", anchor() + Duration::hours(4))
            .await
            .expect("QUERY_FAULT");
        assert_eq!(live_windows.len(), 1);

        let escaped_windows = session_repository
            .get_active_sessions_by_user("alice", anchor() + Duration::hours(5) + Duration::seconds(1))
            .await
            .expect("QUERY_FAULT");
        assert!(escaped_windows.is_empty(), "BOUNDARY_LEAK: window visible past end_time.");

        // 4. TRANSICIÓN TERMINAL: expired jamás se reabre.
        session_repository
            .transition_session_state(&fresh_window.id, SessionState::Expired, anchor() + Duration::hours(6))
            .await
            .expect("TRANSITION_FAULT");

        let resurrection_attempt = session_repository
            .record_session_activity(&fresh_window.id, anchor() + Duration::hours(6))
            .await;
        assert!(
            matches!(resurrection_attempt, Err(DbError::InvalidState)),
            "TERMINAL_BREACH: expired window absorbed activity."
        );
    }

    /**
     * CERTIFICACIÓN: El contrato de dominio rechaza ANTES de emitir SQL.
     */
    #[tokio::test]
    async fn certify_pre_flight_validation_rejections() {
        let database_client = ignite_memory_ledger("mem_sessions_v31_validation").await;
        let user_repository = UserRepository::new(database_client.clone());
        let session_repository = SessionRepository::new(database_client.clone());

        user_repository.ensure_user("mallory").await.expect("USER_FAULT");

        let mut broken_window = Session::open("mallory", anchor());
        broken_window.end_time = anchor() + Duration::hours(3);

        let rejection = session_repository.create_session(&broken_window).await;
        assert!(
            matches!(rejection, Err(DbError::ValidationRejected(_))),
            "PRE_FLIGHT_BYPASS: broken window reached the Ledger."
        );

        // El Ledger permanece virgen tras el rechazo.
        assert!(session_repository
            .get_session(&broken_window.id)
            .await
            .expect("READ_FAULT")
            .is_none());
    }

    /**
     * CERTIFICACIÓN: Expiración masiva basada en conjunto e idempotente.
     */
    #[tokio::test]
    async fn certify_mark_expired_sweep_idempotency() {
        println!("\n🗄️  [INICIO]: Auditing bulk expiry idempotency...");

        let database_client = ignite_memory_ledger("mem_sessions_v31_sweep").await;
        let user_repository = UserRepository::new(database_client.clone());
        let session_repository = SessionRepository::new(database_client.clone());

        user_repository.ensure_user("bob").await.expect("USER_FAULT");

        // Ventana vencida (anclada 6 horas atrás del instante de barrido).
        let stale_window = Session::open("bob", anchor() - Duration::hours(6));
        session_repository.create_session(&stale_window).await.expect("GENESIS_FAULT");

        // Ventana vigente.
        let live_window = Session::open("bob", anchor() - Duration::hours(1));
        session_repository.create_session(&live_window).await.expect("GENESIS_FAULT");

        let first_pass_volume = session_repository
            .mark_expired_sessions(anchor())
            .await
            .expect("SWEEP_FAULT");
        assert_eq!(first_pass_volume, 1, "SWEEP_MISCOUNT on first pass.");

        // Idempotencia: el mismo reloj no encuentra nuevas víctimas.
        let second_pass_volume = session_repository
            .mark_expired_sessions(anchor())
            .await
            .expect("SWEEP_FAULT");
        assert_eq!(second_pass_volume, 0, "SWEEP_NON_IDEMPOTENT on second pass.");

        let sealed_window = session_repository
            .get_session(&stale_window.id)
            .await
            .expect("READ_FAULT")
            .expect("WINDOW_VANISHED");
        assert_eq!(sealed_window.state, SessionState::Expired);

        let surviving_window = session_repository
            .get_session(&live_window.id)
            .await
            .expect("READ_FAULT")
            .expect("WINDOW_VANISHED");
        assert_eq!(surviving_window.state, SessionState::Active);
    }

    /**
     * CERTIFICACIÓN: El borrado de una sesión cascadea a sus bloques.
     */
    #[tokio::test]
    async fn certify_session_deletion_cascade() {
        use tempo_domain_models::WorkBlock;
        use tempo_infra_db::repositories::{ProjectRepository, WorkBlockRepository};

        let database_client = ignite_memory_ledger("mem_sessions_v31_cascade").await;
        let user_repository = UserRepository::new(database_client.clone());
        let session_repository = SessionRepository::new(database_client.clone());
        let project_repository = ProjectRepository::new(database_client.clone());
        let work_block_repository = WorkBlockRepository::new(database_client.clone());

        user_repository.ensure_user("carol").await.expect("USER_FAULT");

        let doomed_window = Session::open("carol", anchor());
        session_repository.create_session(&doomed_window).await.expect("GENESIS_FAULT");

        let anchored_project =
            tempo_domain_models::Project::materialize("/home/carol/p1", anchor());
        let canonical_project = project_repository
            .insert_if_absent(&anchored_project)
            .await
            .expect("PROJECT_FAULT");

        let doomed_block = WorkBlock::open(&doomed_window.id, &canonical_project.id, anchor());
        work_block_repository
            .create_work_block(&doomed_block)
            .await
            .expect("BLOCK_FAULT");

        let deleted_volume = session_repository
            .delete_session(&doomed_window.id)
            .await
            .expect("DELETE_FAULT");
        assert_eq!(deleted_volume, 1);

        assert!(
            work_block_repository
                .get_work_block(&doomed_block.id)
                .await
                .expect("READ_FAULT")
                .is_none(),
            "CASCADE_FAULT: orphan block survived session deletion."
        );
    }
}
