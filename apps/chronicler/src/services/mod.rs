// [apps/chronicler/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: PIPELINE SERVICE MATRIX (V5.0 - TOPOLOGY MASTER)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: GESTORES DEL PIPELINE Y CATÁLOGO DE FALLOS L4
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ERROR SOVEREIGNTY: Todo fallo del pipeline viaja como valor con
 *    etiqueta de clase (Validation/NotFound/Store/Deadline); jamás como
 *    excepción de control de flujo.
 * 2. CONTEXT WRAPPING: Los gestores envuelven los fallos con la
 *    operación y el identificador afectado antes de propagarlos; nunca
 *    los silencian.
 * =================================================================
 */

use tempo_domain_models::ContractViolation;
use tempo_infra_db::DbError;
use thiserror::Error;

// --- GESTORES DEL PIPELINE ---

/// Ventanas de facturación de 5 horas (get-or-create, expiración, duplicados).
pub mod session_manager;
/// Resolución determinista de proyectos por ruta.
pub mod project_resolver;
/// Bloques de trabajo continuos con regla de inactividad de 5 minutos.
pub mod work_block_manager;
/// Orquestación de un evento de ingesta de extremo a extremo.
pub mod activity_processor;
/// Barredora de mantenimiento (expiración + inactividad) y su daemon.
pub mod sweeper;
/// Importador único del snapshot binario heredado.
pub mod migration;

// --- RE-EXPORTACIONES SOBERANAS ---

pub use activity_processor::{ActivityProcessor, ProcessedActivity};
pub use migration::{MigrationEngine, MigrationReport};
pub use project_resolver::ProjectResolver;
pub use session_manager::SessionManager;
pub use sweeper::{MaintenanceSweeper, SweepReport};
pub use work_block_manager::WorkBlockManager;

/// Catálogo semántico de fallos del pipeline (Estrato L4).
#[derive(Error, Debug)]
pub enum PipelineError {
    /// El llamador entregó un evento ilegal; ningún estado fue tocado.
    #[error("[L4_VALIDATION_FAULT]: EVENT_REJECTED -> {0}")]
    Validation(ContractViolation),

    /// El llamador referencia una entidad inexistente.
    #[error("[L4_LOOKUP_FAULT]: REFERENT_MISSING -> {0}")]
    NotFound(String),

    /// Fallo de persistencia; la transacción involucrada fue revertida.
    #[error("[L4_STORE_FAULT]: {0}")]
    Store(DbError),

    /// El presupuesto temporal de la operación se agotó.
    #[error("[L4_DEADLINE_FAULT]: OPERATION_TIMED_OUT after {0}s")]
    DeadlineExceeded(u64),
}

impl From<DbError> for PipelineError {
    fn from(store_fault: DbError) -> Self {
        match store_fault {
            DbError::ValidationRejected(contract_violation) => {
                PipelineError::Validation(contract_violation)
            }
            DbError::SessionNotFound => PipelineError::NotFound("session".into()),
            DbError::WorkBlockNotFound => PipelineError::NotFound("work_block".into()),
            DbError::ProjectNotFound => PipelineError::NotFound("project".into()),
            other_fault => PipelineError::Store(other_fault),
        }
    }
}

impl From<ContractViolation> for PipelineError {
    fn from(contract_violation: ContractViolation) -> Self {
        PipelineError::Validation(contract_violation)
    }
}
