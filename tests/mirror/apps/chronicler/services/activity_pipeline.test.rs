// [tests/mirror/apps/chronicler/services/activity_pipeline.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL PIPELINE DE ACTIVIDAD (V4.0 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: AUDITORÍA EXTREMO A EXTREMO: CREAR-REUSAR Y ROTACIÓN IDLE
 *
 * # Mathematical Proof (Pipeline Total Order):
 * Cada evento atraviesa operador -> ventana -> bloque -> actividad en
 * orden estricto; el certificador verifica los estados intermedios que
 * solo ese orden puede producir.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempo_chronicler::state::AppState;
    use tempo_domain_models::{ActivitySource, ActivityType, IngestEvent, WorkBlockState};
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

    fn forge_event(user_identifier: &str, project_path: &str, event_instant: DateTime<Utc>) -> IngestEvent {
        IngestEvent {
            user_id: user_identifier.to_string(),
            project_path: Some(project_path.to_string()),
            project_name: None,
            timestamp: Some(event_instant),
            activity_type: ActivityType::Command,
            activity_source: ActivitySource::Hook,
            command: Some("cargo check".to_string()),
            description: None,
            metadata: Default::default(),
            claude_context: None,
        }
    }

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    /**
     * ESCENARIO CREATE-THEN-REUSE: el segundo evento del mismo par
     * (operador, proyecto) reutiliza ventana y bloque existentes.
     */
    #[tokio::test]
    async fn certify_create_then_reuse_scenario() {
        println!("\n⚡ [INICIO]: Auditing create-then-reuse pipeline scenario...");

        let application_state = ignite_application("mem_pipeline_v4_reuse").await;

        // EVENTO 1 en T: génesis de ventana y bloque.
        let first_outcome = application_state
            .activity_processor
            .process_event(forge_event("alice", "/home/alice/tempo", anchor()))
            .await
            .expect("PIPELINE_FAULT: first event rejected.");

        assert_eq!(first_outcome.session.start_time, anchor());
        assert_eq!(first_outcome.session.end_time, anchor() + Duration::hours(5));
        assert_eq!(first_outcome.session.activity_count, 1);
        assert_eq!(first_outcome.work_block.start_time, anchor());
        assert_eq!(first_outcome.work_block.activity_count, 1);
        assert!(first_outcome.work_block.end_time.is_none());

        // EVENTO 2 en T+30min: misma ventana, mismo bloque, contadores +1.
        let second_outcome = application_state
            .activity_processor
            .process_event(forge_event("alice", "/home/alice/tempo", anchor() + Duration::minutes(30)))
            .await
            .expect("PIPELINE_FAULT: second event rejected.");

        assert_eq!(second_outcome.session.id, first_outcome.session.id, "WINDOW_FORKED");
        assert_eq!(second_outcome.session.activity_count, 2);
        assert_eq!(second_outcome.work_block.id, first_outcome.work_block.id, "BLOCK_FORKED");
        assert_eq!(second_outcome.work_block.activity_count, 2);
        assert_eq!(
            second_outcome.work_block.last_activity_time,
            anchor() + Duration::minutes(30)
        );

        // La actividad quedó anclada al bloque y a la ventana resueltos.
        let crystallized_activity = application_state
            .activity_repository
            .get_activity(&second_outcome.activity.id)
            .await
            .expect("READ_FAULT")
            .expect("ACTIVITY_VANISHED");
        assert_eq!(
            crystallized_activity.work_block_id.as_deref(),
            Some(first_outcome.work_block.id.as_str())
        );
        assert_eq!(
            crystallized_activity.session_id.as_deref(),
            Some(first_outcome.session.id.as_str())
        );
    }

    /**
     * ESCENARIO IDLE ROTATION: un tercer evento 10 minutos después del
     * último sella el bloque viejo en last+5min y abre un sucesor.
     */
    #[tokio::test]
    async fn certify_idle_rotation_scenario() {
        println!("\n💤 [INICIO]: Auditing idle rotation pipeline scenario...");

        let application_state = ignite_application("mem_pipeline_v4_rotation").await;

        let first_outcome = application_state
            .activity_processor
            .process_event(forge_event("alice", "/home/alice/tempo", anchor()))
            .await
            .expect("PIPELINE_FAULT");
        application_state
            .activity_processor
            .process_event(forge_event("alice", "/home/alice/tempo", anchor() + Duration::minutes(30)))
            .await
            .expect("PIPELINE_FAULT");

        // EVENTO 3 en T+40min: 10 minutos de silencio > umbral de 5.
        let third_outcome = application_state
            .activity_processor
            .process_event(forge_event("alice", "/home/alice/tempo", anchor() + Duration::minutes(40)))
            .await
            .expect("PIPELINE_FAULT");

        // La ventana sobrevive con count=3; el bloque es un sucesor fresco.
        assert_eq!(third_outcome.session.id, first_outcome.session.id);
        assert_eq!(third_outcome.session.activity_count, 3);
        assert_ne!(third_outcome.work_block.id, first_outcome.work_block.id, "ROTATION_MISSED");
        assert_eq!(third_outcome.work_block.start_time, anchor() + Duration::minutes(40));
        assert_eq!(third_outcome.work_block.activity_count, 1);

        // El bloque viejo quedó sellado con el crédito del umbral: last+5min.
        let rotated_block = application_state
            .work_block_repository
            .get_work_block(&first_outcome.work_block.id)
            .await
            .expect("READ_FAULT")
            .expect("BLOCK_VANISHED");
        assert_eq!(rotated_block.state, WorkBlockState::Finished);
        assert_eq!(rotated_block.end_time, Some(anchor() + Duration::minutes(35)));
        assert_eq!(rotated_block.duration_seconds, Some(35 * 60));
    }

    /**
     * CERTIFICACIÓN: Validación de pre-vuelo — sin estado tocado.
     */
    #[tokio::test]
    async fn certify_pre_flight_event_rejections() {
        let application_state = ignite_application("mem_pipeline_v4_rejects").await;

        // Sin operador.
        let mut nameless_event = forge_event("", "/home/alice/tempo", anchor());
        nameless_event.user_id = String::new();
        assert!(application_state
            .activity_processor
            .process_event(nameless_event)
            .await
            .is_err());

        // Sin coordenadas de proyecto.
        let coordinateless_event = IngestEvent {
            user_id: "alice".to_string(),
            project_path: None,
            project_name: None,
            timestamp: Some(anchor()),
            activity_type: ActivityType::Other,
            activity_source: ActivitySource::Manual,
            command: None,
            description: None,
            metadata: Default::default(),
            claude_context: None,
        };
        assert!(application_state
            .activity_processor
            .process_event(coordinateless_event)
            .await
            .is_err());

        // Ningún residuo en el Ledger tras los rechazos.
        let session_volume = application_state
            .system_repository
            .count_table_rows("sessions")
            .await
            .expect("AUDIT_FAULT");
        assert_eq!(session_volume, 0, "REJECTION_RESIDUE detected.");
    }

    /**
     * CERTIFICACIÓN: Solo nombre de proyecto => ruta sintética /unknown/<name>.
     */
    #[tokio::test]
    async fn certify_synthetic_path_for_name_only_events() {
        let application_state = ignite_application("mem_pipeline_v4_synthetic").await;

        let name_only_event = IngestEvent {
            user_id: "bob".to_string(),
            project_path: None,
            project_name: Some("tempo".to_string()),
            timestamp: Some(anchor()),
            activity_type: ActivityType::Other,
            activity_source: ActivitySource::Cli,
            command: None,
            description: None,
            metadata: Default::default(),
            claude_context: None,
        };

        let pipeline_outcome = application_state
            .activity_processor
            .process_event(name_only_event)
            .await
            .expect("PIPELINE_FAULT");

        let resolved_project = application_state
            .project_repository
            .get_by_id(&pipeline_outcome.work_block.project_id)
            .await
            .expect("READ_FAULT")
            .expect("PROJECT_VANISHED");
        assert_eq!(resolved_project.path, "/unknown/tempo");
        assert_eq!(resolved_project.name, "Tempo");
    }
}
