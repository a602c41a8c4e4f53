// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V4.2 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. RETRIABILITY AWARENESS: Distingue fallos de enlace (reintentables)
 *    de violaciones de restricción (fatales para la operación).
 * 2. PANOPTICON COMPLIANCE: Formatea los mensajes con prefijos de estrato
 *    para su renderizado cromático en el Dashboard.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use tempo_domain_models::ContractViolation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el motor libSQL.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (Variables vacías o zona ilegal).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el Dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// Una entidad violó su contrato de dominio ANTES de tocar el Ledger.
    #[error("[L3_DB_VALIDATION_FAULT]: CONTRACT_REJECTED -> {0}")]
    ValidationRejected(#[from] ContractViolation),

    /// Error al comprometer cambios en una secuencia multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE")]
    TransactionError,

    // --- ESTRATO DE ENTIDADES DEL LEDGER TEMPORAL ---

    /// La sesión solicitada no existe en el Ledger.
    #[error("[L3_SESSION_FAULT]: IDENTIFIER_NOT_FOUND")]
    SessionNotFound,

    /// El bloque de trabajo solicitado no existe o ya fue sellado.
    #[error("[L3_BLOCK_FAULT]: IDENTIFIER_NOT_FOUND")]
    WorkBlockNotFound,

    /// El proyecto solicitado no existe en el Ledger.
    #[error("[L3_PROJECT_FAULT]: IDENTIFIER_NOT_FOUND")]
    ProjectNotFound,

    /// La entidad no se encuentra en un estado apto para la operación.
    #[error("[L3_STATE_FAULT]: INVALID_STATE_TRANSITION")]
    InvalidState,
}

impl DbError {
    /**
     * Clasifica el fallo según la política de reintentos del llamador:
     * los cortes de enlace son reintentables; las violaciones de
     * restricción y de contrato son fatales para la operación.
     */
    pub fn is_retriable(&self) -> bool {
        matches!(self, DbError::ConnectionError(_))
    }
}
