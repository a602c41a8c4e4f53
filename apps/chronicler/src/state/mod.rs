// [apps/chronicler/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: CHRONICLER STATE ORCHESTRATOR (V5.0 - LEDGER SINGULARITY)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REPOSITORIOS, GESTORES Y CANDADOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COMPOSITION ROOT: Centraliza el rastro de los 6 repositorios, los
 *    4 gestores del pipeline y el registro de candados por operador.
 * 2. NO ENTITY CACHE: Ningún gestor retiene estado de sesiones o bloques
 *    en RAM; la base de datos es la única fuente de verdad, por lo que
 *    la corrección sobrevive a reinicios del proceso.
 * 3. NOMINAL PURITY: Erradicación total de abreviaciones. Uso de
 *    'Arc<T>' para inmutabilidad compartida.
 *
 * # Mathematical Proof (Deterministic State Hub):
 * Todo handler observa exactamente el mismo grafo de dependencias; las
 * mutaciones viajan únicamente a través del Ledger (Estrato L3), por lo
 * que no existe estado de proceso del que dependa la corrección.
 * =================================================================
 */

pub mod user_locks;

use crate::services::{
    activity_processor::ActivityProcessor, migration::MigrationEngine,
    project_resolver::ProjectResolver, session_manager::SessionManager,
    sweeper::MaintenanceSweeper, work_block_manager::WorkBlockManager,
};
use std::sync::Arc;
use tempo_infra_db::repositories::{
    ActivityRepository, ProjectRepository, SessionRepository, SystemRepository, UserRepository,
    WorkBlockRepository,
};
use tempo_infra_db::StoreClient;
use user_locks::UserLockRegistry;

/**
 * Contenedor de estado compartido (Thread-Safe) para el Chronicler.
 * Actúa como la placa base donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Cliente táctico hacia el Ledger Temporal (libSQL).
    pub database_client: StoreClient,

    // --- ESTRATO L3: REPOSITORIOS DEL LEDGER ---
    pub user_repository: Arc<UserRepository>,
    pub project_repository: Arc<ProjectRepository>,
    pub session_repository: Arc<SessionRepository>,
    pub work_block_repository: Arc<WorkBlockRepository>,
    pub activity_repository: Arc<ActivityRepository>,
    pub system_repository: Arc<SystemRepository>,

    // --- ESTRATO L4: GESTORES DEL PIPELINE ---
    pub session_manager: Arc<SessionManager>,
    pub project_resolver: Arc<ProjectResolver>,
    pub work_block_manager: Arc<WorkBlockManager>,
    pub activity_processor: Arc<ActivityProcessor>,
    pub maintenance_sweeper: Arc<MaintenanceSweeper>,
    pub migration_engine: Arc<MigrationEngine>,

    /// Registro de candados de serialización por operador.
    pub user_lock_registry: Arc<UserLockRegistry>,
}

impl AppState {
    /**
     * Forja una nueva instancia del Estado Maestro inyectando todas las
     * dependencias desde el cliente táctico ya encendido.
     */
    pub fn new(database_client: StoreClient) -> Self {
        let user_repository = Arc::new(UserRepository::new(database_client.clone()));
        let project_repository = Arc::new(ProjectRepository::new(database_client.clone()));
        let session_repository = Arc::new(SessionRepository::new(database_client.clone()));
        let work_block_repository = Arc::new(WorkBlockRepository::new(database_client.clone()));
        let activity_repository = Arc::new(ActivityRepository::new(database_client.clone()));
        let system_repository = Arc::new(SystemRepository::new(database_client.clone()));

        let session_manager = Arc::new(SessionManager::new(session_repository.clone()));
        let project_resolver = Arc::new(ProjectResolver::new(
            project_repository.clone(),
            database_client.clone(),
        ));
        let work_block_manager = Arc::new(WorkBlockManager::new(
            work_block_repository.clone(),
            session_repository.clone(),
            project_resolver.clone(),
        ));

        let user_lock_registry = Arc::new(UserLockRegistry::new());

        let activity_processor = Arc::new(ActivityProcessor::new(
            user_repository.clone(),
            activity_repository.clone(),
            session_manager.clone(),
            work_block_manager.clone(),
            user_lock_registry.clone(),
            database_client.clone(),
        ));

        let maintenance_sweeper = Arc::new(MaintenanceSweeper::new(
            session_repository.clone(),
            work_block_repository.clone(),
        ));

        let migration_engine = Arc::new(MigrationEngine::new(
            database_client.clone(),
            system_repository.clone(),
        ));

        Self {
            database_client,
            user_repository,
            project_repository,
            session_repository,
            work_block_repository,
            activity_repository,
            system_repository,
            session_manager,
            project_resolver,
            work_block_manager,
            activity_processor,
            maintenance_sweeper,
            migration_engine,
            user_lock_registry,
        }
    }
}
