// [libs/infra/db/src/repositories/system.rs]
/*!
 * =================================================================
 * APARATO: SYSTEM INTEGRITY REPOSITORY (V2.3 - OMNISCIENT)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: VOLÚMENES, REFERENCIAS HUÉRFANAS Y REVISIÓN ESTRUCTURAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MIGRATION AUDIT: Provee los conteos por entidad y la consulta de
 *    integridad referencial que certifica una importación heredada.
 * 2. ALLOWLIST GUARD: Los nombres de tabla se validan contra una lista
 *    cerrada antes de interpolarse en SQL.
 * =================================================================
 */

use crate::errors::DbError;
use crate::StoreClient;
use tracing::instrument;

/// Tablas consultables por el auditor de volúmenes.
const COUNTABLE_TABLES: &[&str] = &["users", "projects", "sessions", "work_blocks", "activity_events"];

pub struct SystemRepository {
    database_client: StoreClient,
}

impl SystemRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Volumen de filas de una tabla del conjunto auditable.
     *
     * # Errors:
     * - `DbError::ConfigurationError` si la tabla no pertenece a la lista cerrada.
     */
    #[instrument(skip(self))]
    pub async fn count_table_rows(&self, table_identifier: &str) -> Result<u64, DbError> {
        if !COUNTABLE_TABLES.contains(&table_identifier) {
            return Err(DbError::ConfigurationError(format!(
                "TABLE_NOT_AUDITABLE: {}",
                table_identifier
            )));
        }

        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(&format!("SELECT COUNT(*) FROM {}", table_identifier), ())
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(data_row.get::<i64>(0)? as u64),
            None => Ok(0),
        }
    }

    /**
     * Integridad referencial: bloques de trabajo que apuntan a sesiones
     * inexistentes. Un Ledger sano retorna cero.
     */
    pub async fn count_orphan_work_blocks(&self) -> Result<u64, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                "SELECT COUNT(*)
                 FROM work_blocks
                 LEFT JOIN sessions ON work_blocks.session_id = sessions.id
                 WHERE sessions.id IS NULL",
                (),
            )
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(data_row.get::<i64>(0)? as u64),
            None => Ok(0),
        }
    }

    /// Revisión estructural vigente registrada por el motor de esquema.
    pub async fn current_schema_revision(&self) -> Result<Option<i64>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query("SELECT MAX(revision) FROM schema_version", ())
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(data_row.get::<i64>(0).ok()),
            None => Ok(None),
        }
    }
}
