// [apps/chronicler/src/services/work_block_manager.rs]
/*!
 * =================================================================
 * APARATO: WORK BLOCK MANAGER (V6.0 - IDLE ROTATION GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: UNICIDAD DEL BLOQUE ABIERTO POR (SESIÓN, PROYECTO)
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IDLE ROTATION: Más de 5 minutos de silencio sellan el bloque viejo
 *    (con crédito del umbral, sin extenderse al futuro) y abren uno
 *    fresco anclado a la actividad observada.
 * 2. TERMINAL STATES: finished/idle/closed jamás se reabren; actividad
 *    posterior del mismo par (sesión, proyecto) abre un bloque nuevo.
 * 3. REFERENT GUARDS: Rechaza identificadores vacíos y sesiones
 *    inexistentes antes de tocar el Ledger.
 * =================================================================
 */

use crate::services::{PipelineError, ProjectResolver};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tempo_domain_models::{ContractViolation, WorkBlock};
use tempo_infra_db::repositories::{SessionRepository, WorkBlockRepository};
use tracing::{debug, info, instrument};

/// Gestor de autoridad única sobre los bloques de trabajo.
pub struct WorkBlockManager {
    work_block_repository: Arc<WorkBlockRepository>,
    session_repository: Arc<SessionRepository>,
    project_resolver: Arc<ProjectResolver>,
}

impl WorkBlockManager {
    pub fn new(
        work_block_repository: Arc<WorkBlockRepository>,
        session_repository: Arc<SessionRepository>,
        project_resolver: Arc<ProjectResolver>,
    ) -> Self {
        Self {
            work_block_repository,
            session_repository,
            project_resolver,
        }
    }

    /**
     * Procesa una actividad contra el bloque del par (sesión, proyecto):
     * abre uno fresco si no hay, rota si el abierto quedó inactivo, o
     * extiende el vigente con el pulso atómico.
     *
     * # Errors:
     * - `PipelineError::Validation` ante identificadores vacíos.
     * - `PipelineError::NotFound` si la sesión referida no existe.
     */
    #[instrument(skip(self, activity_instant), fields(session = %session_identifier))]
    pub async fn process_activity(
        &self,
        session_identifier: &str,
        raw_project_path: &str,
        activity_instant: DateTime<Utc>,
    ) -> Result<WorkBlock, PipelineError> {
        if session_identifier.trim().is_empty() {
            return Err(PipelineError::Validation(ContractViolation::EmptyIdentifier(
                "work_block.session_id".into(),
            )));
        }
        if raw_project_path.trim().is_empty() {
            return Err(PipelineError::Validation(ContractViolation::EmptyIdentifier(
                "work_block.project_path".into(),
            )));
        }

        // La existencia de la sesión es responsabilidad del llamador;
        // aquí se verifica como guardia de referencia.
        self.session_repository
            .get_session(session_identifier)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("session {}", session_identifier)))?;

        let resolved_project = self.project_resolver.get_or_create(raw_project_path).await?;

        let open_block = self
            .work_block_repository
            .get_open_by_session_and_project(session_identifier, &resolved_project.id)
            .await?;

        match open_block {
            // --- RAMA GÉNESIS: Ningún bloque abierto para el par ---
            None => {
                self.open_fresh_block(session_identifier, &resolved_project.id, activity_instant)
                    .await
            }

            // --- RAMA DE ROTACIÓN: El bloque abierto quedó inactivo ---
            Some(stale_block) if stale_block.is_idle_at(activity_instant) => {
                let credited_closure = stale_block.idle_closure_instant(activity_instant);
                info!(
                    "💤 [BLOCK_ROTATION]: Block {} idle; sealing at {} and opening successor.",
                    stale_block.id, credited_closure
                );
                self.work_block_repository
                    .finish_work_block(&stale_block.id, credited_closure)
                    .await?;

                self.open_fresh_block(session_identifier, &resolved_project.id, activity_instant)
                    .await
            }

            // --- RAMA NOMINAL: Pulso atómico sobre el bloque vigente ---
            Some(live_block) => {
                self.work_block_repository
                    .record_activity(&live_block.id, activity_instant)
                    .await?;

                let refreshed_block = self
                    .work_block_repository
                    .get_work_block(&live_block.id)
                    .await?
                    .ok_or_else(|| PipelineError::NotFound(format!("work_block {}", live_block.id)))?;

                debug!(
                    "🧱 [BLOCK_PULSE]: Block {} extended (count {}).",
                    refreshed_block.id, refreshed_block.activity_count
                );
                Ok(refreshed_block)
            }
        }
    }

    /**
     * Sella como 'finished' todo bloque abierto de la sesión al instante
     * indicado. Usado cuando un actor externo finaliza la sesión.
     */
    pub async fn finish_work_blocks_for_session(
        &self,
        session_identifier: &str,
        closure_instant: DateTime<Utc>,
    ) -> Result<u64, PipelineError> {
        Ok(self
            .work_block_repository
            .finish_all_for_session(session_identifier, closure_instant)
            .await?)
    }

    /**
     * Barrido masivo de inactividad: sella como 'idle' todo bloque cuyo
     * last_activity + 5min quedó detrás del reloj. Idempotente.
     */
    pub async fn mark_idle_work_blocks(
        &self,
        sweep_instant: DateTime<Utc>,
    ) -> Result<u64, PipelineError> {
        Ok(self.work_block_repository.mark_idle_work_blocks(sweep_instant).await?)
    }

    /// Cierre explícito: fija end_time, deriva duraciones, estado 'closed'.
    pub async fn close_work_block(
        &self,
        block_identifier: &str,
        closure_instant: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        Ok(self
            .work_block_repository
            .close_work_block(block_identifier, closure_instant)
            .await?)
    }

    async fn open_fresh_block(
        &self,
        session_identifier: &str,
        project_identifier: &str,
        anchor_instant: DateTime<Utc>,
    ) -> Result<WorkBlock, PipelineError> {
        let fresh_block = WorkBlock::open(session_identifier, project_identifier, anchor_instant);
        self.work_block_repository.create_work_block(&fresh_block).await?;
        Ok(fresh_block)
    }
}
