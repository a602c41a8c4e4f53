// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V4.0 - TOPOLOGY MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ACCESS SOVEREIGNTY: Centraliza la visibilidad de los repositorios
 *    del Ledger Temporal para la inyección de dependencias en Chronicler.
 * 2. VALUE BRIDGE: Expone los auxiliares de mapeo para columnas anulables
 *    compartidos por todos los sub-módulos.
 *
 * # Mathematical Proof (Modular Encapsulation):
 * El barrel file actúa como una interfaz galvánica. Los sub-módulos
 * permanecen aislados, y solo las estructuras de autoridad (Repositories)
 * son expuestas al exterior, reduciendo el acoplamiento sistémico.
 * =================================================================
 */

use crate::errors::DbError;
use libsql::{Row, Value};

// --- ESTRATO 1: IDENTIDAD (OPERADORES Y PROYECTOS) ---

/// Registro bajo demanda de operadores.
pub mod users;
/// Identidad determinista de proyectos con ruta única.
pub mod projects;

// --- ESTRATO 2: MÁQUINAS DE ESTADO TEMPORALES ---

/// Ventanas de facturación de 5 horas por operador.
pub mod sessions;
/// Bloques de trabajo continuos por (sesión, proyecto).
pub mod work_blocks;

// --- ESTRATO 3: INGESTA Y SISTEMA ---

/// Unidad atómica de ingesta (actividades).
pub mod activities;
/// Metadatos de salud, volúmenes y referencias huérfanas.
pub mod system;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS API) ---

pub use activities::ActivityRepository;
pub use projects::ProjectRepository;
pub use sessions::SessionRepository;
pub use system::SystemRepository;
pub use users::UserRepository;
pub use work_blocks::WorkBlockRepository;

// --- PUENTE DE VALORES (Columnas Anulables de SQLite) ---

pub(crate) fn text_or_null(optional_text: Option<String>) -> Value {
    match optional_text {
        Some(text_value) => Value::Text(text_value),
        None => Value::Null,
    }
}

pub(crate) fn integer_or_null(optional_integer: Option<i64>) -> Value {
    match optional_integer {
        Some(integer_value) => Value::Integer(integer_value),
        None => Value::Null,
    }
}

pub(crate) fn real_or_null(optional_real: Option<f64>) -> Value {
    match optional_real {
        Some(real_value) => Value::Real(real_value),
        None => Value::Null,
    }
}

pub(crate) fn optional_text_column(data_row: &Row, column_index: i32) -> Result<Option<String>, DbError> {
    match data_row.get_value(column_index)? {
        Value::Null => Ok(None),
        Value::Text(text_value) => Ok(Some(text_value)),
        unexpected_value => Err(DbError::MappingError(format!(
            "COLUMN_{}_EXPECTED_TEXT: {:?}",
            column_index, unexpected_value
        ))),
    }
}

pub(crate) fn optional_integer_column(data_row: &Row, column_index: i32) -> Result<Option<i64>, DbError> {
    match data_row.get_value(column_index)? {
        Value::Null => Ok(None),
        Value::Integer(integer_value) => Ok(Some(integer_value)),
        unexpected_value => Err(DbError::MappingError(format!(
            "COLUMN_{}_EXPECTED_INTEGER: {:?}",
            column_index, unexpected_value
        ))),
    }
}

pub(crate) fn optional_real_column(data_row: &Row, column_index: i32) -> Result<Option<f64>, DbError> {
    match data_row.get_value(column_index)? {
        Value::Null => Ok(None),
        Value::Real(real_value) => Ok(Some(real_value)),
        Value::Integer(integer_value) => Ok(Some(integer_value as f64)),
        unexpected_value => Err(DbError::MappingError(format!(
            "COLUMN_{}_EXPECTED_REAL: {:?}",
            column_index, unexpected_value
        ))),
    }
}
