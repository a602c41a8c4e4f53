// [libs/infra/db/src/repositories/sessions.rs]
/*!
 * =================================================================
 * APARATO: SESSION WINDOW REPOSITORY (V5.2 - TIME GOVERNED)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE VENTANAS DE FACTURACIÓN DE 5 HORAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PRE-FLIGHT VALIDATION: Toda sesión se valida contra su contrato de
 *    dominio ANTES de emitir SQL; una fila ilegal jamás toca el Ledger.
 * 2. INSTANT PREDICATES: Los predicados temporales envuelven ambos
 *    operandos en datetime() para comparar instantes físicos y no
 *    cadenas de reloj de pared.
 * 3. ATOMIC COUNTERS: El registro de actividad actualiza last_activity,
 *    first_activity (solo si era cero) y el contador en una única ráfaga.
 *
 * # Mathematical Proof (State Machine Legality):
 * Las transiciones de estado exigen 'state = active' en la cláusula
 * WHERE; un estado terminal es físicamente inalcanzable como origen,
 * garantizando que expired/finished/expired_duplicate jamás se reabran.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::{optional_text_column, text_or_null};
use crate::StoreClient;
use chrono::{DateTime, Utc};
use libsql::{params, Connection, Row};
use tempo_domain_models::{Session, SessionState};
use tracing::{debug, info, instrument, warn};

/// Lista nominal de columnas usada por todas las consultas de lectura.
const SESSION_COLUMN_SET: &str =
    "id, user_id, start_time, end_time, state, first_activity_time, \
     last_activity_time, activity_count, duration_hours, created_at, updated_at";

/// Repositorio de autoridad única para las ventanas de facturación.
pub struct SessionRepository {
    database_client: StoreClient,
}

impl SessionRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Cristaliza una ventana nueva en el Ledger.
     *
     * # Errors:
     * - `DbError::ValidationRejected` si la sesión viola su contrato.
     */
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn create_session(&self, session: &Session) -> Result<(), DbError> {
        session.validate()?;

        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();

        database_connection
            .execute(
                "INSERT INTO sessions (id, user_id, start_time, end_time, state, \
                 first_activity_time, last_activity_time, activity_count, duration_hours, \
                 created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    session.id.clone(),
                    session.user_id.clone(),
                    canonical_clock.to_storage(session.start_time),
                    canonical_clock.to_storage(session.end_time),
                    session.state.as_label(),
                    text_or_null(
                        session
                            .first_activity_time
                            .map(|instant| canonical_clock.to_storage(instant))
                    ),
                    canonical_clock.to_storage(session.last_activity_time),
                    session.activity_count,
                    session.duration_hours,
                    canonical_clock.to_storage(session.created_at),
                    canonical_clock.to_storage(session.updated_at)
                ],
            )
            .await?;

        info!("🪟 [SESSION_GENESIS]: Window {} opened for operator {}.", session.id, session.user_id);
        Ok(())
    }

    /// Variante transaccional (insert-ignore) para la composición del migrador.
    pub async fn insert_ignore_on(
        shared_connection: &Connection,
        session: &Session,
        clock: &crate::CanonicalClock,
    ) -> Result<u64, DbError> {
        session.validate()?;
        Ok(shared_connection
            .execute(
                "INSERT OR IGNORE INTO sessions (id, user_id, start_time, end_time, state, \
                 first_activity_time, last_activity_time, activity_count, duration_hours, \
                 created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    session.id.clone(),
                    session.user_id.clone(),
                    clock.to_storage(session.start_time),
                    clock.to_storage(session.end_time),
                    session.state.as_label(),
                    text_or_null(
                        session
                            .first_activity_time
                            .map(|instant| clock.to_storage(instant))
                    ),
                    clock.to_storage(session.last_activity_time),
                    session.activity_count,
                    session.duration_hours,
                    clock.to_storage(session.created_at),
                    clock.to_storage(session.updated_at)
                ],
            )
            .await?)
    }

    pub async fn get_session(&self, session_identifier: &str) -> Result<Option<Session>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                &format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMN_SET),
                params![session_identifier],
            )
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(Some(self.map_row_to_session(&data_row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_all_sessions(&self) -> Result<Vec<Session>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM sessions ORDER BY datetime(start_time) ASC",
                    SESSION_COLUMN_SET
                ),
                (),
            )
            .await?;
        self.collect_sessions(&mut query_results).await
    }

    /**
     * Sesiones de un operador cuya ventana intersecta [from, to].
     */
    pub async fn get_sessions_in_window(
        &self,
        user_identifier: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Session>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();
        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM sessions
                     WHERE user_id = ?1
                       AND datetime(end_time) >= datetime(?2)
                       AND datetime(start_time) <= datetime(?3)
                     ORDER BY datetime(start_time) ASC",
                    SESSION_COLUMN_SET
                ),
                params![
                    user_identifier,
                    canonical_clock.to_storage(window_start),
                    canonical_clock.to_storage(window_end)
                ],
            )
            .await?;
        self.collect_sessions(&mut query_results).await
    }

    /**
     * Ventanas activas de un operador que aún contienen el instante sonda:
     * (state = active) ∧ (t <= end_time). Orden: start_time descendente.
     */
    #[instrument(skip(self, probe_instant))]
    pub async fn get_active_sessions_by_user(
        &self,
        user_identifier: &str,
        probe_instant: DateTime<Utc>,
    ) -> Result<Vec<Session>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();
        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM sessions
                     WHERE user_id = ?1
                       AND state = 'active'
                       AND datetime(?2) <= datetime(end_time)
                     ORDER BY datetime(start_time) DESC, activity_count DESC, id DESC",
                    SESSION_COLUMN_SET
                ),
                params![user_identifier, canonical_clock.to_storage(probe_instant)],
            )
            .await?;
        self.collect_sessions(&mut query_results).await
    }

    /**
     * Ventanas con estado 'active' sin filtro temporal: materia prima de
     * la expiración por barrido y de la limpieza de duplicados.
     */
    pub async fn get_sessions_labeled_active(
        &self,
        user_identifier: &str,
    ) -> Result<Vec<Session>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                &format!(
                    "SELECT {} FROM sessions
                     WHERE user_id = ?1 AND state = 'active'
                     ORDER BY datetime(start_time) DESC, activity_count DESC, id DESC",
                    SESSION_COLUMN_SET
                ),
                params![user_identifier],
            )
            .await?;
        self.collect_sessions(&mut query_results).await
    }

    /**
     * Registro atómico de actividad sobre la ventana:
     * last_activity = t, count += 1, first_activity = t solo si era cero.
     *
     * # Errors:
     * - `DbError::SessionNotFound` si el identificador no existe.
     * - `DbError::InvalidState` si la ventana ya no está activa.
     */
    #[instrument(skip(self, activity_instant))]
    pub async fn record_session_activity(
        &self,
        session_identifier: &str,
        activity_instant: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();
        let storage_instant = canonical_clock.to_storage(activity_instant);

        let updated_rows = database_connection
            .execute(
                "UPDATE sessions
                 SET last_activity_time = ?2,
                     first_activity_time = COALESCE(first_activity_time, ?2),
                     activity_count = activity_count + 1,
                     updated_at = ?2
                 WHERE id = ?1 AND state = 'active'",
                params![session_identifier, storage_instant],
            )
            .await?;

        if updated_rows == 0 {
            return self.diagnose_session_update_failure(session_identifier).await;
        }

        debug!("🪟 [SESSION_PULSE]: Window {} absorbed activity.", session_identifier);
        Ok(())
    }

    /**
     * Transición de estado con predicado de legalidad (origen 'active').
     */
    #[instrument(skip(self, transition_instant))]
    pub async fn transition_session_state(
        &self,
        session_identifier: &str,
        target_state: SessionState,
        transition_instant: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();

        let updated_rows = database_connection
            .execute(
                "UPDATE sessions SET state = ?2, updated_at = ?3
                 WHERE id = ?1 AND state = 'active'",
                params![
                    session_identifier,
                    target_state.as_label(),
                    canonical_clock.to_storage(transition_instant)
                ],
            )
            .await?;

        if updated_rows == 0 {
            return self.diagnose_session_update_failure(session_identifier).await;
        }

        info!(
            "🪟 [SESSION_TRANSITION]: Window {} sealed as '{}'.",
            session_identifier,
            target_state.as_label()
        );
        Ok(())
    }

    /**
     * Expiración masiva: sella como 'expired' toda ventana activa cuya
     * frontera temporal quedó detrás del reloj. Idempotente.
     */
    #[instrument(skip(self, sweep_instant))]
    pub async fn mark_expired_sessions(&self, sweep_instant: DateTime<Utc>) -> Result<u64, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();
        let storage_instant = canonical_clock.to_storage(sweep_instant);

        let expired_volume = database_connection
            .execute(
                "UPDATE sessions SET state = 'expired', updated_at = ?1
                 WHERE state = 'active' AND datetime(end_time) < datetime(?1)",
                params![storage_instant],
            )
            .await?;

        if expired_volume > 0 {
            info!("⏳ [SESSION_SWEEP]: {} stale windows sealed as expired.", expired_volume);
        }
        Ok(expired_volume)
    }

    /// Borrado físico; el esquema cascadea hacia los bloques de trabajo.
    pub async fn delete_session(&self, session_identifier: &str) -> Result<u64, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        Ok(database_connection
            .execute("DELETE FROM sessions WHERE id = ?1", params![session_identifier])
            .await?)
    }

    // --- ESTRATO DE MAPEO Y DIAGNÓSTICO ---

    async fn collect_sessions(
        &self,
        query_results: &mut libsql::Rows,
    ) -> Result<Vec<Session>, DbError> {
        let mut sessions_collection = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            sessions_collection.push(self.map_row_to_session(&data_row)?);
        }
        Ok(sessions_collection)
    }

    fn map_row_to_session(&self, data_row: &Row) -> Result<Session, DbError> {
        let canonical_clock = self.database_client.clock();
        let state_label: String = data_row.get(4)?;

        Ok(Session {
            id: data_row.get(0)?,
            user_id: data_row.get(1)?,
            start_time: canonical_clock.parse_storage(&data_row.get::<String>(2)?)?,
            end_time: canonical_clock.parse_storage(&data_row.get::<String>(3)?)?,
            state: SessionState::parse_label(&state_label)?,
            first_activity_time: canonical_clock
                .parse_optional_storage(optional_text_column(data_row, 5)?)?,
            last_activity_time: canonical_clock.parse_storage(&data_row.get::<String>(6)?)?,
            activity_count: data_row.get(7)?,
            duration_hours: data_row.get(8)?,
            created_at: canonical_clock.parse_storage(&data_row.get::<String>(9)?)?,
            updated_at: canonical_clock.parse_storage(&data_row.get::<String>(10)?)?,
        })
    }

    /// Analiza por qué falló una mutación para reporte forense.
    async fn diagnose_session_update_failure(
        &self,
        session_identifier: &str,
    ) -> Result<(), DbError> {
        match self.get_session(session_identifier).await? {
            Some(existing_session) => {
                warn!(
                    "⚠️ [SESSION_REJECTED]: Window {} is '{}', not mutable.",
                    session_identifier,
                    existing_session.state.as_label()
                );
                Err(DbError::InvalidState)
            }
            None => Err(DbError::SessionNotFound),
        }
    }
}
