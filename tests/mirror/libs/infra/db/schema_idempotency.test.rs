// [tests/mirror/libs/infra/db/schema_idempotency.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE EVOLUCIÓN DE ESQUEMA (V2.0 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: IDEMPOTENCIA TOTAL DE LOS TRES ESTRATOS ESTRUCTURALES
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use tempo_infra_db::schema::{apply_full_ledger_schema, CURRENT_SCHEMA_REVISION};
    use tempo_infra_db::{StoreClient, StoreTuning};

    /**
     * CERTIFICACIÓN: Aplicar el esquema N veces produce el mismo Ledger.
     */
    #[tokio::test]
    async fn certify_schema_application_idempotency() {
        println!("\n🏗️  [INICIO]: Auditing structural idempotency across repeated passes...");

        let database_client = StoreClient::connect(
            "file:mem_schema_v2_idem?mode=memory&cache=shared",
            None,
            StoreTuning::default(),
        )
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");

        let bootstrap_connection = database_client
            .acquire_connection()
            .await
            .expect("POOL_FAULT: Unable to allocate connection.");

        // El connect ya aplicó una pasada; se fuerzan dos adicionales.
        apply_full_ledger_schema(&bootstrap_connection)
            .await
            .expect("SCHEMA_FAULT: Second pass collapsed.");
        apply_full_ledger_schema(&bootstrap_connection)
            .await
            .expect("SCHEMA_FAULT: Third pass collapsed.");

        // AUDITORÍA: El conjunto de tablas y la revisión permanecen nivelados.
        let health_report = database_client
            .verify_health()
            .await
            .expect("HEALTH_FAULT: Probe collapsed.");
        assert!(health_report.is_operational(), "LEDGER_DEGRADED post-repasses.");
        assert_eq!(health_report.schema_revision, Some(CURRENT_SCHEMA_REVISION));

        // La revisión se estampa una única vez (INSERT OR IGNORE).
        let mut revision_results = bootstrap_connection
            .query("SELECT COUNT(*) FROM schema_version WHERE revision = ?1", libsql::params![CURRENT_SCHEMA_REVISION])
            .await
            .expect("QUERY_FAULT");
        let revision_row = revision_results.next().await.expect("ROW_FAULT").expect("EMPTY_FAULT");
        let stamp_volume: i64 = revision_row.get(0).expect("GET_FAULT");
        assert_eq!(stamp_volume, 1, "REVISION_STAMP_DUPLICATED");
    }

    /**
     * CERTIFICACIÓN: Las restricciones CHECK del contrato viven en el Ledger.
     */
    #[tokio::test]
    async fn certify_contract_checks_enforced() {
        let database_client = StoreClient::connect(
            "file:mem_schema_v2_checks?mode=memory&cache=shared",
            None,
            StoreTuning::default(),
        )
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");

        let probe_connection = database_client
            .acquire_connection()
            .await
            .expect("POOL_FAULT");

        probe_connection
            .execute("INSERT INTO users (id, username) VALUES ('mallory', 'mallory')", ())
            .await
            .expect("SETUP_FAULT");

        // Estado ilegal -> el CHECK de estados legales rechaza la fila.
        let illegal_state_outcome = probe_connection
            .execute(
                "INSERT INTO sessions (id, user_id, start_time, end_time, state, \
                 last_activity_time, activity_count, duration_hours, created_at, updated_at)
                 VALUES ('sess_x', 'mallory', '2026-01-01T10:00:00.000-03:00', \
                 '2026-01-01T15:00:00.000-03:00', 'zombie', '2026-01-01T10:00:00.000-03:00', \
                 1, 5.0, '2026-01-01T10:00:00.000-03:00', '2026-01-01T10:00:00.000-03:00')",
                (),
            )
            .await;
        assert!(illegal_state_outcome.is_err(), "CHECK_BYPASS: illegal state accepted.");

        // duration_hours != 5.0 -> el CHECK contractual rechaza la fila.
        let illegal_duration_outcome = probe_connection
            .execute(
                "INSERT INTO sessions (id, user_id, start_time, end_time, state, \
                 last_activity_time, activity_count, duration_hours, created_at, updated_at)
                 VALUES ('sess_y', 'mallory', '2026-01-01T10:00:00.000-03:00', \
                 '2026-01-01T15:00:00.000-03:00', 'active', '2026-01-01T10:00:00.000-03:00', \
                 1, 4.0, '2026-01-01T10:00:00.000-03:00', '2026-01-01T10:00:00.000-03:00')",
                (),
            )
            .await;
        assert!(illegal_duration_outcome.is_err(), "CHECK_BYPASS: illegal duration accepted.");
    }
}
