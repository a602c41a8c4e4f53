// [tests/mirror/apps/chronicler/services/multi_project_isolation.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE AISLAMIENTO MULTI-PROYECTO (V3.0 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: BLOQUES CONCURRENTES POR PROYECTO BAJO UNA VENTANA
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempo_chronicler::state::AppState;
    use tempo_domain_models::{ActivitySource, ActivityType, IngestEvent};
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

    fn forge_event(project_path: &str, event_instant: DateTime<Utc>) -> IngestEvent {
        IngestEvent {
            user_id: "carol".to_string(),
            project_path: Some(project_path.to_string()),
            project_name: None,
            timestamp: Some(event_instant),
            activity_type: ActivityType::FileEdit,
            activity_source: ActivitySource::Hook,
            command: None,
            description: None,
            metadata: Default::default(),
            claude_context: None,
        }
    }

    /**
     * ESCENARIO MULTI-PROJECT: dos proyectos bajo la misma ventana
     * sostienen dos bloques abiertos simultáneos, uno por proyecto.
     */
    #[tokio::test]
    async fn certify_concurrent_blocks_per_project() {
        println!("\n🧱 [INICIO]: Auditing multi-project block isolation...");

        let application_state = ignite_application("mem_isolation_v3_projects").await;
        let anchor_instant = Utc.with_ymd_and_hms(2026, 3, 4, 11, 0, 0).unwrap();

        let first_outcome = application_state
            .activity_processor
            .process_event(forge_event("/p1", anchor_instant))
            .await
            .expect("PIPELINE_FAULT: /p1 event rejected.");

        let second_outcome = application_state
            .activity_processor
            .process_event(forge_event("/p2", anchor_instant + Duration::minutes(1)))
            .await
            .expect("PIPELINE_FAULT: /p2 event rejected.");

        // UNA sola ventana de facturación gobierna ambos proyectos.
        assert_eq!(second_outcome.session.id, first_outcome.session.id, "WINDOW_FORKED");
        assert_eq!(second_outcome.session.activity_count, 2);

        // DOS bloques abiertos, uno por proyecto, cada uno con count=1.
        assert_ne!(second_outcome.work_block.id, first_outcome.work_block.id);
        assert_ne!(
            second_outcome.work_block.project_id,
            first_outcome.work_block.project_id
        );
        assert_eq!(first_outcome.work_block.activity_count, 1);
        assert_eq!(second_outcome.work_block.activity_count, 1);

        let session_blocks = application_state
            .work_block_repository
            .list_by_session(&first_outcome.session.id)
            .await
            .expect("QUERY_FAULT");
        assert_eq!(session_blocks.len(), 2);
        assert!(
            session_blocks.iter().all(|session_block| session_block.end_time.is_none()),
            "ISOLATION_BREACH: a block was sealed by the sibling project."
        );

        // PROPIEDAD 3: a lo sumo un bloque abierto por (sesión, proyecto).
        for probed_outcome in [&first_outcome, &second_outcome] {
            let open_block = application_state
                .work_block_repository
                .get_open_by_session_and_project(
                    &probed_outcome.session.id,
                    &probed_outcome.work_block.project_id,
                )
                .await
                .expect("QUERY_FAULT")
                .expect("OPEN_BLOCK_EXPECTED");
            assert_eq!(open_block.id, probed_outcome.work_block.id);
        }
    }

    /**
     * CERTIFICACIÓN: La rotación idle de un proyecto no perturba al vecino.
     */
    #[tokio::test]
    async fn certify_rotation_does_not_cross_projects() {
        let application_state = ignite_application("mem_isolation_v3_rotation").await;
        let anchor_instant = Utc.with_ymd_and_hms(2026, 3, 4, 11, 0, 0).unwrap();

        let first_outcome = application_state
            .activity_processor
            .process_event(forge_event("/p1", anchor_instant))
            .await
            .expect("PIPELINE_FAULT");
        let second_outcome = application_state
            .activity_processor
            .process_event(forge_event("/p2", anchor_instant + Duration::minutes(1)))
            .await
            .expect("PIPELINE_FAULT");

        // /p1 vuelve a la vida 10 minutos después: su bloque rota.
        let rotated_outcome = application_state
            .activity_processor
            .process_event(forge_event("/p1", anchor_instant + Duration::minutes(10)))
            .await
            .expect("PIPELINE_FAULT");
        assert_ne!(rotated_outcome.work_block.id, first_outcome.work_block.id);

        // El bloque de /p2 permanece abierto e intacto.
        let sibling_block = application_state
            .work_block_repository
            .get_work_block(&second_outcome.work_block.id)
            .await
            .expect("READ_FAULT")
            .expect("BLOCK_VANISHED");
        assert!(sibling_block.end_time.is_none(), "CROSS_PROJECT_ROTATION detected.");
        assert_eq!(sibling_block.activity_count, 1);
    }
}
