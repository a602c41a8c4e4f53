// [tests/mirror/libs/infra/db/work_block_lifecycle.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CICLO DE VIDA DE BLOQUES (V3.2 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DE PULSO ATÓMICO, SELLADO Y BARRIDO IDLE
 *
 * # Mathematical Proof (Single Open Block):
 * El sellado exige 'end_time IS NULL' en la cláusula WHERE: dos cierres
 * concurrentes no pueden sellar la misma fila, y un bloque sellado es
 * inmutable ante pulsos posteriores.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use tempo_domain_models::{Project, Session, WorkBlock, WorkBlockState};
    use tempo_infra_db::repositories::{
        ProjectRepository, SessionRepository, UserRepository, WorkBlockRepository,
    };
    use tempo_infra_db::{DbError, StoreClient, StoreTuning};

    fn anchor() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    /// Forja el trío (operador, ventana, proyecto) requerido por los FKs.
    async fn provision_session_and_project(
        database_client: &StoreClient,
        user_identifier: &str,
        project_path: &str,
    ) -> (Session, Project) {
        UserRepository::new(database_client.clone())
            .ensure_user(user_identifier)
            .await
            .expect("USER_FAULT");

        let fresh_window = Session::open(user_identifier, anchor());
        SessionRepository::new(database_client.clone())
            .create_session(&fresh_window)
            .await
            .expect("GENESIS_FAULT");

        let canonical_project = ProjectRepository::new(database_client.clone())
            .insert_if_absent(&Project::materialize(project_path, anchor()))
            .await
            .expect("PROJECT_FAULT");

        (fresh_window, canonical_project)
    }

    async fn ignite_memory_ledger(memory_label: &str) -> StoreClient {
        StoreClient::connect(
            &format!("file:{}?mode=memory&cache=shared", memory_label),
            None,
            StoreTuning::default(),
        )
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory temporal ledger.")
    }

    /**
     * CERTIFICACIÓN: Génesis -> pulso atómico -> sellado con duraciones.
     */
    #[tokio::test]
    async fn certify_block_pulse_and_sealing() {
        println!("\n🧱 [INICIO]: Auditing block pulse and sealing physics...");

        let database_client = ignite_memory_ledger("mem_blocks_v32_pulse").await;
        let (window, project) =
            provision_session_and_project(&database_client, "alice", "/home/alice/p1").await;
        let work_block_repository = WorkBlockRepository::new(database_client.clone());

        let fresh_block = WorkBlock::open(&window.id, &project.id, anchor());
        work_block_repository
            .create_work_block(&fresh_block)
            .await
            .expect("BLOCK_GENESIS_FAULT");

        // PULSO: count += 1, last_activity avanza.
        work_block_repository
            .record_activity(&fresh_block.id, anchor() + Duration::minutes(2))
            .await
            .expect("PULSE_FAULT");

        let pulsed_block = work_block_repository
            .get_work_block(&fresh_block.id)
            .await
            .expect("READ_FAULT")
            .expect("BLOCK_VANISHED");
        assert_eq!(pulsed_block.activity_count, 2);
        assert_eq!(pulsed_block.last_activity_time, anchor() + Duration::minutes(2));
        assert!(pulsed_block.end_time.is_none());

        // SELLADO: end fijado, duraciones derivadas de (start, end).
        work_block_repository
            .finish_work_block(&fresh_block.id, anchor() + Duration::minutes(7))
            .await
            .expect("SEAL_FAULT");

        let sealed_block = work_block_repository
            .get_work_block(&fresh_block.id)
            .await
            .expect("READ_FAULT")
            .expect("BLOCK_VANISHED");
        assert_eq!(sealed_block.state, WorkBlockState::Finished);
        assert_eq!(sealed_block.end_time, Some(anchor() + Duration::minutes(7)));
        assert_eq!(sealed_block.duration_seconds, Some(420));
        assert!((sealed_block.duration_hours.unwrap() - 420.0 / 3600.0).abs() < 1e-9);

        // INMUTABILIDAD TERMINAL: el pulso sobre un bloque sellado rebota.
        let necro_pulse = work_block_repository
            .record_activity(&fresh_block.id, anchor() + Duration::minutes(9))
            .await;
        assert!(matches!(necro_pulse, Err(DbError::InvalidState)));

        // El par (sesión, proyecto) ya no expone bloque abierto.
        assert!(work_block_repository
            .get_open_by_session_and_project(&window.id, &project.id)
            .await
            .expect("QUERY_FAULT")
            .is_none());
    }

    /**
     * CERTIFICACIÓN: Cierre masivo por fin de sesión.
     */
    #[tokio::test]
    async fn certify_finish_all_for_session() {
        let database_client = ignite_memory_ledger("mem_blocks_v32_finish_all").await;
        let (window, project_one) =
            provision_session_and_project(&database_client, "bob", "/home/bob/p1").await;
        let project_two = ProjectRepository::new(database_client.clone())
            .insert_if_absent(&Project::materialize("/home/bob/p2", anchor()))
            .await
            .expect("PROJECT_FAULT");

        let work_block_repository = WorkBlockRepository::new(database_client.clone());
        let first_block = WorkBlock::open(&window.id, &project_one.id, anchor());
        let second_block = WorkBlock::open(&window.id, &project_two.id, anchor() + Duration::minutes(1));
        work_block_repository.create_work_block(&first_block).await.expect("BLOCK_FAULT");
        work_block_repository.create_work_block(&second_block).await.expect("BLOCK_FAULT");

        let sealed_volume = work_block_repository
            .finish_all_for_session(&window.id, anchor() + Duration::minutes(30))
            .await
            .expect("CLOSURE_FAULT");
        assert_eq!(sealed_volume, 2, "CLOSURE_MISCOUNT");

        for sealed_identifier in [&first_block.id, &second_block.id] {
            let sealed_block = work_block_repository
                .get_work_block(sealed_identifier)
                .await
                .expect("READ_FAULT")
                .expect("BLOCK_VANISHED");
            assert_eq!(sealed_block.state, WorkBlockState::Finished);
            assert_eq!(sealed_block.end_time, Some(anchor() + Duration::minutes(30)));
        }

        // Re-ejecución: ya no quedan bloques abiertos que sellar.
        let idle_second_pass = work_block_repository
            .finish_all_for_session(&window.id, anchor() + Duration::minutes(40))
            .await
            .expect("CLOSURE_FAULT");
        assert_eq!(idle_second_pass, 0);
    }

    /**
     * CERTIFICACIÓN: Borrar un bloque anula las referencias de sus
     * actividades en lugar de arrastrarlas.
     */
    #[tokio::test]
    async fn certify_block_deletion_orphan_nulls_activities() {
        use tempo_domain_models::{Activity, ActivitySource, ActivityType};
        use tempo_infra_db::repositories::ActivityRepository;

        let database_client = ignite_memory_ledger("mem_blocks_v32_orphan").await;
        let (window, project) =
            provision_session_and_project(&database_client, "dave", "/home/dave/p1").await;
        let work_block_repository = WorkBlockRepository::new(database_client.clone());
        let activity_repository = ActivityRepository::new(database_client.clone());

        let doomed_block = WorkBlock::open(&window.id, &project.id, anchor());
        work_block_repository.create_work_block(&doomed_block).await.expect("BLOCK_FAULT");

        let anchored_activity = Activity::record(
            &doomed_block.id,
            "dave",
            &window.id,
            &project.id,
            anchor(),
            ActivityType::Command,
            ActivitySource::Cli,
        );
        activity_repository
            .insert_activity(&anchored_activity)
            .await
            .expect("ACTIVITY_FAULT");

        let deleted_volume = work_block_repository
            .delete_work_block(&doomed_block.id)
            .await
            .expect("DELETE_FAULT");
        assert_eq!(deleted_volume, 1);

        // La actividad sobrevive con su ancla anulada (orphan-null).
        let orphaned_activity = activity_repository
            .get_activity(&anchored_activity.id)
            .await
            .expect("READ_FAULT")
            .expect("ACTIVITY_VANISHED");
        assert_eq!(orphaned_activity.work_block_id, None, "ORPHAN_NULL_MISSED");
        assert_eq!(orphaned_activity.user_id, "dave");
    }

    /**
     * CERTIFICACIÓN: Barrido idle — crédito del umbral e idempotencia.
     */
    #[tokio::test]
    async fn certify_idle_sweep_credit_and_idempotency() {
        println!("\n💤 [INICIO]: Auditing idle sweep credit physics...");

        let database_client = ignite_memory_ledger("mem_blocks_v32_idle").await;
        let (window, project) =
            provision_session_and_project(&database_client, "carol", "/home/carol/p1").await;
        let work_block_repository = WorkBlockRepository::new(database_client.clone());

        // Bloque silencioso: última actividad 20 minutos antes del barrido.
        let silent_block = WorkBlock::open(&window.id, &project.id, anchor());
        work_block_repository.create_work_block(&silent_block).await.expect("BLOCK_FAULT");

        // Bloque vivo: última actividad 1 minuto antes del barrido.
        let lively_block = WorkBlock::open(&window.id, &project.id, anchor() + Duration::minutes(19));
        // El par ya tiene un bloque abierto; este certificador usa otro proyecto.
        let lively_project = ProjectRepository::new(database_client.clone())
            .insert_if_absent(&Project::materialize("/home/carol/p2", anchor()))
            .await
            .expect("PROJECT_FAULT");
        let lively_block = WorkBlock {
            project_id: lively_project.id.clone(),
            ..lively_block
        };
        work_block_repository.create_work_block(&lively_block).await.expect("BLOCK_FAULT");

        let sweep_instant = anchor() + Duration::minutes(20);
        let first_pass_volume = work_block_repository
            .mark_idle_work_blocks(sweep_instant)
            .await
            .expect("SWEEP_FAULT");
        assert_eq!(first_pass_volume, 1, "SWEEP_MISCOUNT: only the silent block idles.");

        let idled_block = work_block_repository
            .get_work_block(&silent_block.id)
            .await
            .expect("READ_FAULT")
            .expect("BLOCK_VANISHED");
        assert_eq!(idled_block.state, WorkBlockState::Idle);
        // Crédito contractual: last_activity + 5min, jamás el reloj del barrido.
        assert_eq!(idled_block.end_time, Some(anchor() + Duration::minutes(5)));

        // Idempotencia sobre el mismo reloj.
        let second_pass_volume = work_block_repository
            .mark_idle_work_blocks(sweep_instant)
            .await
            .expect("SWEEP_FAULT");
        assert_eq!(second_pass_volume, 0, "SWEEP_NON_IDEMPOTENT");

        let surviving_block = work_block_repository
            .get_work_block(&lively_block.id)
            .await
            .expect("READ_FAULT")
            .expect("BLOCK_VANISHED");
        assert_eq!(surviving_block.state, WorkBlockState::Active);
    }
}
