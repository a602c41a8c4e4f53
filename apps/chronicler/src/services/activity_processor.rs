// [apps/chronicler/src/services/activity_processor.rs]
/*!
 * =================================================================
 * APARATO: ACTIVITY PROCESSOR (V5.3 - PIPELINE SINGULARITY)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: ORQUESTACIÓN DE UN EVENTO DE INGESTA EXTREMO A EXTREMO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TOTAL ORDER: Dentro de un evento el orden es estricto: operador ->
 *    ventana -> bloque -> actividad. Entre eventos del mismo operador el
 *    candado de serialización impone el mismo orden total.
 * 2. PRE-FLIGHT VALIDATION: El evento se valida ANTES de adquirir el
 *    candado; un evento ilegal jamás toca estado.
 * 3. PARALLEL USERS: Eventos de operadores distintos avanzan en paralelo
 *    sin contención cruzada.
 * =================================================================
 */

use crate::services::{PipelineError, SessionManager, WorkBlockManager};
use crate::state::user_locks::UserLockRegistry;
use std::sync::Arc;
use tempo_domain_models::{Activity, IngestEvent, Session, WorkBlock};
use tempo_infra_db::repositories::{ActivityRepository, UserRepository};
use tempo_infra_db::StoreClient;
use tracing::{debug, instrument};

/// Resultado consolidado de un evento procesado.
#[derive(Debug, Clone)]
pub struct ProcessedActivity {
    pub activity: Activity,
    pub session: Session,
    pub work_block: WorkBlock,
}

pub struct ActivityProcessor {
    user_repository: Arc<UserRepository>,
    activity_repository: Arc<ActivityRepository>,
    session_manager: Arc<SessionManager>,
    work_block_manager: Arc<WorkBlockManager>,
    user_lock_registry: Arc<UserLockRegistry>,
    database_client: StoreClient,
}

impl ActivityProcessor {
    pub fn new(
        user_repository: Arc<UserRepository>,
        activity_repository: Arc<ActivityRepository>,
        session_manager: Arc<SessionManager>,
        work_block_manager: Arc<WorkBlockManager>,
        user_lock_registry: Arc<UserLockRegistry>,
        database_client: StoreClient,
    ) -> Self {
        Self {
            user_repository,
            activity_repository,
            session_manager,
            work_block_manager,
            user_lock_registry,
            database_client,
        }
    }

    /**
     * Procesa un evento de ingesta de extremo a extremo bajo el candado
     * de serialización del operador.
     *
     * # Errors:
     * - `PipelineError::Validation` ante un evento ilegal (sin estado tocado).
     * - `PipelineError::Store` ante fallos del Ledger; el evento se reporta
     *   fallido sin dejar medias escrituras que rompan invariantes.
     */
    #[instrument(skip(self, ingest_event), fields(user = %ingest_event.user_id))]
    pub async fn process_event(
        &self,
        ingest_event: IngestEvent,
    ) -> Result<ProcessedActivity, PipelineError> {
        // 1. VALIDACIÓN DE PRE-VUELO (Sin estado tocado)
        ingest_event.validate()?;

        let effective_project_path = ingest_event
            .effective_project_path()
            .expect("INVARIANT: validate() guarantees project coordinates");

        // 2. ANCLAJE TEMPORAL: Ausencia de marca => reloj canónico del servidor.
        let event_instant = ingest_event
            .timestamp
            .unwrap_or_else(|| self.database_client.clock().now());

        // 3. CANDADO DE SERIALIZACIÓN POR OPERADOR (Race Shield)
        let _pipeline_guard = self.user_lock_registry.acquire(&ingest_event.user_id).await;

        // 4. EXISTENCIA DEL OPERADOR (insert-if-absent)
        let resolved_user = self.user_repository.ensure_user(&ingest_event.user_id).await?;

        // 5. RESOLUCIÓN DE LA VENTANA DE FACTURACIÓN
        let resolved_session = self
            .session_manager
            .get_or_create_session(&resolved_user.id, event_instant)
            .await?;

        // 6. RESOLUCIÓN DEL BLOQUE DE TRABAJO
        let resolved_block = self
            .work_block_manager
            .process_activity(&resolved_session.id, &effective_project_path, event_instant)
            .await?;

        // 7. CRISTALIZACIÓN DEL EVENTO ATÓMICO
        let mut activity_record = Activity::record(
            &resolved_block.id,
            &resolved_user.id,
            &resolved_session.id,
            &resolved_block.project_id,
            event_instant,
            ingest_event.activity_type,
            ingest_event.activity_source,
        );
        activity_record.command = ingest_event.command.clone();
        activity_record.description = ingest_event.description.clone();
        activity_record.metadata = ingest_event.metadata.clone();
        activity_record.claude_context = ingest_event.claude_context.clone();

        self.activity_repository.insert_activity(&activity_record).await?;

        debug!(
            "⚡ [PIPELINE_COMPLETE]: Event {} -> window {} -> block {}.",
            activity_record.id, resolved_session.id, resolved_block.id
        );

        Ok(ProcessedActivity {
            activity: activity_record,
            session: resolved_session,
            work_block: resolved_block,
        })
    }
}
