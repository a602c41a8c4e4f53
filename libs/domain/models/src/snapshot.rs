// [libs/domain/models/src/snapshot.rs]
/*!
 * =================================================================
 * APARATO: LEGACY SNAPSHOT CONTRACT (V1.3 - BINARY PARITY)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: FORMATO BINARIO DEL ESTADO HEREDADO (SOLO LECTURA)
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. READ-ONLY COVENANT: El núcleo decodifica este formato una única vez
 *    durante la migración; jamás lo produce.
 * 2. IS_ACTIVE DISTRUST: El booleano 'is_active' heredado NO se honra;
 *    la actividad se recomputa siempre desde el tiempo físico.
 * 3. BINARY PARITY: La decodificación fija Little-Endian + fixint para
 *    garantizar paridad bit-a-bit entre arquitecturas x86_64 y ARM64.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Sesión tal como la serializó el sistema heredado.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacySession {
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    /// Puede NO respetar la ventana de 5h; el migrador la fuerza.
    pub end_time: DateTime<Utc>,
    pub first_activity_time: Option<DateTime<Utc>>,
    pub last_activity_time: DateTime<Utc>,
    pub activity_count: i64,
    /// Bandera cacheada del ecosistema origen. Ignorada como verdad.
    pub is_active: bool,
}

/// Bloque de trabajo heredado; referencia su proyecto por par (nombre, ruta).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacyWorkBlock {
    pub id: String,
    pub session_id: String,
    pub project_name: String,
    pub project_path: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_activity_time: DateTime<Utc>,
    pub activity_count: i64,
    pub duration_seconds: Option<i64>,
    pub is_active: bool,
}

/// Actividad heredada en orden de emisión.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacyActivity {
    pub id: String,
    pub work_block_id: String,
    pub user_id: String,
    pub session_id: Option<String>,
    /// Par de coordenadas de proyecto; ambos vacíos => project_id nulo.
    pub project_name: String,
    pub project_path: String,
    pub timestamp: DateTime<Utc>,
    pub activity_type: String,
    pub activity_source: String,
    pub command: Option<String>,
    pub description: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

/// Mapeo-de-mapeos raíz del snapshot binario heredado.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacySnapshot {
    pub sessions: HashMap<String, LegacySession>,
    pub work_blocks: HashMap<String, LegacyWorkBlock>,
    pub activities: Vec<LegacyActivity>,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

impl LegacySnapshot {
    /// Volumen total de registros transportados, para el reporte de migración.
    pub fn record_volume(&self) -> (usize, usize, usize) {
        (
            self.sessions.len(),
            self.work_blocks.len(),
            self.activities.len(),
        )
    }
}
