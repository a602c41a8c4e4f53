// [libs/domain/models/src/violations.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN CONTRACT VIOLATION CATALOG (V1.2 - SOBERANO)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE INVARIANTES ROTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PRE-FLIGHT GUARD: Toda entidad se valida ANTES de tocar el Ledger
 *    Temporal, garantizando que una fila corrupta jamás se cristalice.
 * 2. NOMINAL PURITY: Nomenclatura nominal absoluta sin abreviaciones.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractViolation {
    /// La ventana de sesión no respeta la duración contractual de 5 horas.
    #[error("[L2_SESSION_FAULT]: WINDOW_CONTRACT_BROKEN -> {0}")]
    SessionWindowBroken(String),

    /// El contador de actividad cayó por debajo del mínimo legal (1).
    #[error("[L2_SESSION_FAULT]: ACTIVITY_COUNT_UNDERFLOW -> count={0}")]
    ActivityCountUnderflow(i64),

    /// Las marcas temporales violan el orden first <= last dentro de la ventana.
    #[error("[L2_TEMPORAL_FAULT]: TIMELINE_INVERSION -> {0}")]
    TimelineInversion(String),

    /// Un bloque de trabajo abierto declara end_time, o viceversa.
    #[error("[L2_BLOCK_FAULT]: OPEN_STATE_INCOHERENT -> {0}")]
    OpenStateIncoherent(String),

    /// Las duraciones derivadas no corresponden a end_time - start_time.
    #[error("[L2_BLOCK_FAULT]: DURATION_DERIVATION_MISMATCH -> {0}")]
    DurationDerivationMismatch(String),

    /// Un identificador obligatorio llegó vacío desde el exterior.
    #[error("[L2_INPUT_FAULT]: EMPTY_IDENTIFIER -> {0}")]
    EmptyIdentifier(String),

    /// El evento de ingesta carece de coordenadas de proyecto.
    #[error("[L2_INPUT_FAULT]: PROJECT_COORDINATES_MISSING")]
    ProjectCoordinatesMissing,

    /// Etiqueta de estado desconocida recuperada desde la persistencia.
    #[error("[L2_STATE_FAULT]: UNKNOWN_STATE_LABEL -> {0}")]
    UnknownStateLabel(String),

    /// La ráfaga binaria heredada no respeta el contrato del snapshot.
    #[error("[L2_SNAPSHOT_FAULT]: BINARY_CONTRACT_BROKEN -> {0}")]
    SnapshotMalformed(String),
}
