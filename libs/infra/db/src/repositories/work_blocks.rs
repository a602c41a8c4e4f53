// [libs/infra/db/src/repositories/work_blocks.rs]
/*!
 * =================================================================
 * APARATO: WORK BLOCK REPOSITORY (V5.4 - IDLE GOVERNED)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE BLOQUES DE TRABAJO CONTINUOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE OPEN BLOCK: La consulta de bloque abierto filtra por
 *    end_time IS NULL; el cierre atómico exige el mismo predicado, por
 *    lo que dos cierres concurrentes no pueden sellar la misma fila.
 * 2. DERIVED DURATIONS: Todo sellado deriva duration_seconds y
 *    duration_hours desde (start_time, end_time) en el momento exacto
 *    del cierre; jamás se acumulan contadores paralelos.
 * 3. SWEEP RESILIENCE: El barrido de inactividad registra y continúa
 *    ante fallos por fila; una fila envenenada no aborta el barrido.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::{
    integer_or_null, optional_integer_column, optional_real_column, optional_text_column,
    real_or_null, text_or_null,
};
use crate::StoreClient;
use chrono::{DateTime, Duration, Utc};
use libsql::{params, Connection, Row};
use tempo_domain_models::{derive_block_durations, WorkBlock, WorkBlockState, IDLE_THRESHOLD_SECONDS};
use tracing::{debug, info, instrument, warn};

/// Lista nominal de columnas usada por todas las consultas de lectura.
const WORK_BLOCK_COLUMN_SET: &str =
    "id, session_id, project_id, start_time, end_time, state, last_activity_time, \
     activity_count, duration_seconds, duration_hours, created_at, updated_at";

/// Repositorio de autoridad única para los bloques de trabajo del Ledger.
pub struct WorkBlockRepository {
    database_client: StoreClient,
}

impl WorkBlockRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Cristaliza un bloque fresco (abierto) en el Ledger.
     */
    #[instrument(skip(self, work_block), fields(block_id = %work_block.id))]
    pub async fn create_work_block(&self, work_block: &WorkBlock) -> Result<(), DbError> {
        work_block.validate()?;

        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();

        database_connection
            .execute(
                "INSERT INTO work_blocks (id, session_id, project_id, start_time, end_time, \
                 state, last_activity_time, activity_count, duration_seconds, duration_hours, \
                 created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    work_block.id.clone(),
                    work_block.session_id.clone(),
                    work_block.project_id.clone(),
                    canonical_clock.to_storage(work_block.start_time),
                    text_or_null(
                        work_block
                            .end_time
                            .map(|instant| canonical_clock.to_storage(instant))
                    ),
                    work_block.state.as_label(),
                    canonical_clock.to_storage(work_block.last_activity_time),
                    work_block.activity_count,
                    integer_or_null(work_block.duration_seconds),
                    real_or_null(work_block.duration_hours),
                    canonical_clock.to_storage(work_block.created_at),
                    canonical_clock.to_storage(work_block.updated_at)
                ],
            )
            .await?;

        info!(
            "🧱 [BLOCK_GENESIS]: Block {} opened for (session {}, project {}).",
            work_block.id, work_block.session_id, work_block.project_id
        );
        Ok(())
    }

    /// Variante transaccional (insert-ignore) para la composición del migrador.
    pub async fn insert_ignore_on(
        shared_connection: &Connection,
        work_block: &WorkBlock,
        clock: &crate::CanonicalClock,
    ) -> Result<u64, DbError> {
        work_block.validate()?;
        Ok(shared_connection
            .execute(
                "INSERT OR IGNORE INTO work_blocks (id, session_id, project_id, start_time, \
                 end_time, state, last_activity_time, activity_count, duration_seconds, \
                 duration_hours, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    work_block.id.clone(),
                    work_block.session_id.clone(),
                    work_block.project_id.clone(),
                    clock.to_storage(work_block.start_time),
                    text_or_null(
                        work_block
                            .end_time
                            .map(|instant| clock.to_storage(instant))
                    ),
                    work_block.state.as_label(),
                    clock.to_storage(work_block.last_activity_time),
                    work_block.activity_count,
                    integer_or_null(work_block.duration_seconds),
                    real_or_null(work_block.duration_hours),
                    clock.to_storage(work_block.created_at),
                    clock.to_storage(work_block.updated_at)
                ],
            )
            .await?)
    }

    pub async fn get_work_block(&self, block_identifier: &str) -> Result<Option<WorkBlock>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                &format!("SELECT {} FROM work_blocks WHERE id = ?1", WORK_BLOCK_COLUMN_SET),
                params![block_identifier],
            )
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(Some(self.map_row_to_work_block(&data_row)?)),
            None => Ok(None),
        }
    }

    /**
     * Bloque abierto único del par (sesión, proyecto), si existe.
     */
    pub async fn get_open_by_session_and_project(
        &self,
        session_identifier: &str,
        project_identifier: &str,
    ) -> Result<Option<WorkBlock>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM work_blocks
                     WHERE session_id = ?1 AND project_id = ?2 AND end_time IS NULL",
                    WORK_BLOCK_COLUMN_SET
                ),
                params![session_identifier, project_identifier],
            )
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(Some(self.map_row_to_work_block(&data_row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_by_session(&self, session_identifier: &str) -> Result<Vec<WorkBlock>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM work_blocks
                     WHERE session_id = ?1
                     ORDER BY datetime(start_time) ASC",
                    WORK_BLOCK_COLUMN_SET
                ),
                params![session_identifier],
            )
            .await?;

        let mut blocks_collection = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            blocks_collection.push(self.map_row_to_work_block(&data_row)?);
        }
        Ok(blocks_collection)
    }

    pub async fn get_all_work_blocks(&self) -> Result<Vec<WorkBlock>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM work_blocks ORDER BY datetime(start_time) ASC",
                    WORK_BLOCK_COLUMN_SET
                ),
                (),
            )
            .await?;

        let mut blocks_collection = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            blocks_collection.push(self.map_row_to_work_block(&data_row)?);
        }
        Ok(blocks_collection)
    }

    /**
     * Registro atómico de actividad: last_activity = t, count += 1.
     * Solo un bloque abierto puede absorber el pulso.
     *
     * # Errors:
     * - `DbError::WorkBlockNotFound` si el identificador no existe.
     * - `DbError::InvalidState` si el bloque ya fue sellado.
     */
    #[instrument(skip(self, activity_instant))]
    pub async fn record_activity(
        &self,
        block_identifier: &str,
        activity_instant: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();
        let storage_instant = canonical_clock.to_storage(activity_instant);

        let updated_rows = database_connection
            .execute(
                "UPDATE work_blocks
                 SET last_activity_time = ?2,
                     activity_count = activity_count + 1,
                     updated_at = ?2
                 WHERE id = ?1 AND end_time IS NULL",
                params![block_identifier, storage_instant],
            )
            .await?;

        if updated_rows == 0 {
            return self.diagnose_block_update_failure(block_identifier).await;
        }

        debug!("🧱 [BLOCK_PULSE]: Block {} absorbed activity.", block_identifier);
        Ok(())
    }

    /**
     * Sellado atómico: fija end_time, deriva duraciones y transiciona al
     * estado terminal indicado. Exige que el bloque siga abierto.
     */
    #[instrument(skip(self, closure_instant))]
    pub async fn seal_work_block(
        &self,
        block_identifier: &str,
        closure_instant: DateTime<Utc>,
        terminal_state: WorkBlockState,
    ) -> Result<(), DbError> {
        if terminal_state == WorkBlockState::Active {
            return Err(DbError::InvalidState);
        }

        let open_block = self
            .get_work_block(block_identifier)
            .await?
            .ok_or(DbError::WorkBlockNotFound)?;

        let (derived_seconds, derived_hours) =
            derive_block_durations(open_block.start_time, closure_instant);

        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();

        let updated_rows = database_connection
            .execute(
                "UPDATE work_blocks
                 SET end_time = ?2,
                     state = ?3,
                     duration_seconds = ?4,
                     duration_hours = ?5,
                     updated_at = ?2
                 WHERE id = ?1 AND end_time IS NULL",
                params![
                    block_identifier,
                    canonical_clock.to_storage(closure_instant),
                    terminal_state.as_label(),
                    derived_seconds,
                    derived_hours
                ],
            )
            .await?;

        if updated_rows == 0 {
            return self.diagnose_block_update_failure(block_identifier).await;
        }

        info!(
            "🧱 [BLOCK_SEALED]: Block {} closed as '{}' ({}s).",
            block_identifier,
            terminal_state.as_label(),
            derived_seconds
        );
        Ok(())
    }

    /// Cierre por rotación de inactividad o fin de sesión.
    pub async fn finish_work_block(
        &self,
        block_identifier: &str,
        closure_instant: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.seal_work_block(block_identifier, closure_instant, WorkBlockState::Finished)
            .await
    }

    /// Cierre explícito ordenado por un actor externo.
    pub async fn close_work_block(
        &self,
        block_identifier: &str,
        closure_instant: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.seal_work_block(block_identifier, closure_instant, WorkBlockState::Closed)
            .await
    }

    /**
     * Sella como 'finished' todo bloque abierto de la sesión al instante
     * indicado. Retorna el volumen de bloques cerrados.
     */
    #[instrument(skip(self, closure_instant))]
    pub async fn finish_all_for_session(
        &self,
        session_identifier: &str,
        closure_instant: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let open_blocks: Vec<WorkBlock> = self
            .list_by_session(session_identifier)
            .await?
            .into_iter()
            .filter(|block| block.end_time.is_none())
            .collect();

        let mut sealed_volume = 0u64;
        for open_block in open_blocks {
            self.seal_work_block(&open_block.id, closure_instant, WorkBlockState::Finished)
                .await?;
            sealed_volume += 1;
        }

        if sealed_volume > 0 {
            info!(
                "🧱 [SESSION_CLOSURE]: {} open blocks sealed for session {}.",
                sealed_volume, session_identifier
            );
        }
        Ok(sealed_volume)
    }

    /**
     * Barrido de inactividad: sella como 'idle' todo bloque abierto cuyo
     * last_activity + 5min quedó detrás del reloj, acreditando el umbral
     * como tiempo de cierre. Idempotente; registra y continúa por fila.
     */
    #[instrument(skip(self, sweep_instant))]
    pub async fn mark_idle_work_blocks(&self, sweep_instant: DateTime<Utc>) -> Result<u64, DbError> {
        let idle_frontier = sweep_instant - Duration::seconds(IDLE_THRESHOLD_SECONDS);

        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();

        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM work_blocks
                     WHERE end_time IS NULL AND datetime(last_activity_time) < datetime(?1)",
                    WORK_BLOCK_COLUMN_SET
                ),
                params![canonical_clock.to_storage(idle_frontier)],
            )
            .await?;

        let mut idle_candidates = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            idle_candidates.push(self.map_row_to_work_block(&data_row)?);
        }
        drop(query_results);
        drop(database_connection);

        let mut idled_volume = 0u64;
        for idle_candidate in idle_candidates {
            let credited_closure = idle_candidate.idle_closure_instant(sweep_instant);
            match self
                .seal_work_block(&idle_candidate.id, credited_closure, WorkBlockState::Idle)
                .await
            {
                Ok(()) => idled_volume += 1,
                Err(row_fault) => {
                    // Una fila envenenada no aborta el barrido completo.
                    warn!(
                        "⚠️ [IDLE_SWEEP_SKIP]: Block {} bypassed: {}",
                        idle_candidate.id, row_fault
                    );
                }
            }
        }

        if idled_volume > 0 {
            info!("💤 [IDLE_SWEEP]: {} silent blocks sealed as idle.", idled_volume);
        }
        Ok(idled_volume)
    }

    /// Borrado físico; el esquema anula las referencias de sus actividades.
    pub async fn delete_work_block(&self, block_identifier: &str) -> Result<u64, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        Ok(database_connection
            .execute("DELETE FROM work_blocks WHERE id = ?1", params![block_identifier])
            .await?)
    }

    // --- ESTRATO DE MAPEO Y DIAGNÓSTICO ---

    fn map_row_to_work_block(&self, data_row: &Row) -> Result<WorkBlock, DbError> {
        let canonical_clock = self.database_client.clock();
        let state_label: String = data_row.get(5)?;

        Ok(WorkBlock {
            id: data_row.get(0)?,
            session_id: data_row.get(1)?,
            project_id: data_row.get(2)?,
            start_time: canonical_clock.parse_storage(&data_row.get::<String>(3)?)?,
            end_time: canonical_clock
                .parse_optional_storage(optional_text_column(data_row, 4)?)?,
            state: WorkBlockState::parse_label(&state_label)?,
            last_activity_time: canonical_clock.parse_storage(&data_row.get::<String>(6)?)?,
            activity_count: data_row.get(7)?,
            duration_seconds: optional_integer_column(data_row, 8)?,
            duration_hours: optional_real_column(data_row, 9)?,
            created_at: canonical_clock.parse_storage(&data_row.get::<String>(10)?)?,
            updated_at: canonical_clock.parse_storage(&data_row.get::<String>(11)?)?,
        })
    }

    async fn diagnose_block_update_failure(&self, block_identifier: &str) -> Result<(), DbError> {
        match self.get_work_block(block_identifier).await? {
            Some(sealed_block) => {
                warn!(
                    "⚠️ [BLOCK_REJECTED]: Block {} is '{}', not mutable.",
                    block_identifier,
                    sealed_block.state.as_label()
                );
                Err(DbError::InvalidState)
            }
            None => Err(DbError::WorkBlockNotFound),
        }
    }
}
