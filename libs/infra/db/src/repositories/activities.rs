// [libs/infra/db/src/repositories/activities.rs]
/*!
 * =================================================================
 * APARATO: ACTIVITY EVENT REPOSITORY (V4.1 - INGEST ATOM)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CRISTALIZACIÓN Y CONSULTA DE EVENTOS ATÓMICOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OPAQUE METADATA: El mapa de metadatos viaja como cadena JSON; el
 *    repositorio lo codifica y decodifica sin interpretarlo.
 * 2. REFERENTIAL ANCHOR: Toda actividad referencia un bloque existente;
 *    la clave foránea del esquema rechaza anclas fantasma.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::{optional_text_column, text_or_null};
use crate::StoreClient;
use chrono::{DateTime, Utc};
use libsql::{params, Connection, Row};
use tempo_domain_models::{Activity, ActivitySource, ActivityType, ClaudeContext};
use tracing::{debug, instrument};

/// Lista nominal de columnas usada por todas las consultas de lectura.
const ACTIVITY_COLUMN_SET: &str =
    "id, work_block_id, user_id, session_id, project_id, timestamp, activity_type, \
     activity_source, command, description, metadata, claude_context, created_at";

pub struct ActivityRepository {
    database_client: StoreClient,
}

impl ActivityRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Cristaliza un evento atómico en el Ledger.
     *
     * # Errors:
     * - `DbError::QueryError` si la clave foránea del bloque rechaza el ancla.
     */
    #[instrument(skip(self, activity), fields(activity_id = %activity.id))]
    pub async fn insert_activity(&self, activity: &Activity) -> Result<(), DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        Self::execute_insert(&database_connection, activity, self.database_client.clock(), false)
            .await?;
        debug!("⚡ [ACTIVITY_CRYSTALLIZED]: Event {} anchored.", activity.id);
        Ok(())
    }

    /// Variante transaccional (insert-ignore) para la composición del migrador.
    pub async fn insert_ignore_on(
        shared_connection: &Connection,
        activity: &Activity,
        clock: &crate::CanonicalClock,
    ) -> Result<u64, DbError> {
        Self::execute_insert(shared_connection, activity, clock, true).await
    }

    async fn execute_insert(
        target_connection: &Connection,
        activity: &Activity,
        clock: &crate::CanonicalClock,
        ignore_duplicates: bool,
    ) -> Result<u64, DbError> {
        let metadata_payload = serde_json::to_string(&activity.metadata)
            .map_err(|encode_fault| DbError::MappingError(format!("METADATA_ENCODE: {}", encode_fault)))?;

        let claude_context_payload = activity
            .claude_context
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|encode_fault| DbError::MappingError(format!("CONTEXT_ENCODE: {}", encode_fault)))?;

        let insert_verb = if ignore_duplicates {
            "INSERT OR IGNORE INTO"
        } else {
            "INSERT INTO"
        };

        Ok(target_connection
            .execute(
                &format!(
                    "{} activity_events (id, work_block_id, user_id, session_id, project_id, \
                     timestamp, activity_type, activity_source, command, description, metadata, \
                     claude_context, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    insert_verb
                ),
                params![
                    activity.id.clone(),
                    text_or_null(activity.work_block_id.clone()),
                    activity.user_id.clone(),
                    text_or_null(activity.session_id.clone()),
                    text_or_null(activity.project_id.clone()),
                    clock.to_storage(activity.timestamp),
                    activity.activity_type.as_label(),
                    activity.activity_source.as_label(),
                    text_or_null(activity.command.clone()),
                    text_or_null(activity.description.clone()),
                    metadata_payload,
                    text_or_null(claude_context_payload),
                    clock.to_storage(activity.created_at)
                ],
            )
            .await?)
    }

    pub async fn get_activity(&self, activity_identifier: &str) -> Result<Option<Activity>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                &format!("SELECT {} FROM activity_events WHERE id = ?1", ACTIVITY_COLUMN_SET),
                params![activity_identifier],
            )
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(Some(self.map_row_to_activity(&data_row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_by_work_block(
        &self,
        block_identifier: &str,
    ) -> Result<Vec<Activity>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM activity_events
                     WHERE work_block_id = ?1
                     ORDER BY datetime(timestamp) ASC",
                    ACTIVITY_COLUMN_SET
                ),
                params![block_identifier],
            )
            .await?;
        self.collect_activities(&mut query_results).await
    }

    /// Eventos de un operador dentro de la ventana [from, to].
    pub async fn list_by_user_window(
        &self,
        user_identifier: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Activity>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();
        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM activity_events
                     WHERE user_id = ?1
                       AND datetime(timestamp) >= datetime(?2)
                       AND datetime(timestamp) <= datetime(?3)
                     ORDER BY datetime(timestamp) ASC",
                    ACTIVITY_COLUMN_SET
                ),
                params![
                    user_identifier,
                    canonical_clock.to_storage(window_start),
                    canonical_clock.to_storage(window_end)
                ],
            )
            .await?;
        self.collect_activities(&mut query_results).await
    }

    // --- ESTRATO DE MAPEO ---

    async fn collect_activities(
        &self,
        query_results: &mut libsql::Rows,
    ) -> Result<Vec<Activity>, DbError> {
        let mut activities_collection = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            activities_collection.push(self.map_row_to_activity(&data_row)?);
        }
        Ok(activities_collection)
    }

    fn map_row_to_activity(&self, data_row: &Row) -> Result<Activity, DbError> {
        let canonical_clock = self.database_client.clock();
        let type_label: String = data_row.get(6)?;
        let source_label: String = data_row.get(7)?;

        let metadata_payload: String = data_row.get(10)?;
        let metadata_map = serde_json::from_str(&metadata_payload)
            .map_err(|decode_fault| DbError::MappingError(format!("METADATA_DECODE: {}", decode_fault)))?;

        let claude_context: Option<ClaudeContext> = optional_text_column(data_row, 11)?
            .map(|context_payload| serde_json::from_str(&context_payload))
            .transpose()
            .map_err(|decode_fault| DbError::MappingError(format!("CONTEXT_DECODE: {}", decode_fault)))?;

        Ok(Activity {
            id: data_row.get(0)?,
            work_block_id: optional_text_column(data_row, 1)?,
            user_id: data_row.get(2)?,
            session_id: optional_text_column(data_row, 3)?,
            project_id: optional_text_column(data_row, 4)?,
            timestamp: canonical_clock.parse_storage(&data_row.get::<String>(5)?)?,
            activity_type: ActivityType::parse_label(&type_label)?,
            activity_source: ActivitySource::parse_label(&source_label)?,
            command: optional_text_column(data_row, 8)?,
            description: optional_text_column(data_row, 9)?,
            metadata: metadata_map,
            claude_context,
            created_at: canonical_clock.parse_storage(&data_row.get::<String>(12)?)?,
        })
    }
}
