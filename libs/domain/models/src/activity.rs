// [libs/domain/models/src/activity.rs]
/*!
 * =================================================================
 * APARATO: ACTIVITY EVENT MODELS (V2.4 - INGEST ATOM)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: UNIDAD ATÓMICA DE INGESTA Y SU CONTEXTO ASISTIDO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OPAQUE METADATA: El mapa de metadatos se persiste como cadena JSON
 *    sin interpretación semántica en el núcleo.
 * 2. ASSISTANT SYNAPSE: El sub-objeto ClaudeContext transporta la
 *    biometría de un prompt (start/end/progress/user_action) sin que el
 *    núcleo ejecute clasificación alguna sobre él.
 * 3. REFERENTIAL ANCHOR: Toda actividad referencia exactamente un bloque
 *    de trabajo existente.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typeshare::typeshare;
use uuid::Uuid;

/// Naturaleza del evento observado en el entorno del desarrollador.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Command,
    FileEdit,
    FileRead,
    Navigation,
    Search,
    Generation,
    #[default]
    Other,
}

impl ActivityType {
    pub fn as_label(&self) -> &'static str {
        match self {
            ActivityType::Command => "command",
            ActivityType::FileEdit => "file_edit",
            ActivityType::FileRead => "file_read",
            ActivityType::Navigation => "navigation",
            ActivityType::Search => "search",
            ActivityType::Generation => "generation",
            ActivityType::Other => "other",
        }
    }

    pub fn parse_label(label: &str) -> Result<Self, crate::violations::ContractViolation> {
        match label {
            "command" => Ok(ActivityType::Command),
            "file_edit" => Ok(ActivityType::FileEdit),
            "file_read" => Ok(ActivityType::FileRead),
            "navigation" => Ok(ActivityType::Navigation),
            "search" => Ok(ActivityType::Search),
            "generation" => Ok(ActivityType::Generation),
            "other" => Ok(ActivityType::Other),
            unknown_label => Err(crate::violations::ContractViolation::UnknownStateLabel(
                unknown_label.into(),
            )),
        }
    }
}

/// Canal emisor de la señal de actividad.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    Hook,
    Cli,
    Daemon,
    #[default]
    Manual,
}

impl ActivitySource {
    pub fn as_label(&self) -> &'static str {
        match self {
            ActivitySource::Hook => "hook",
            ActivitySource::Cli => "cli",
            ActivitySource::Daemon => "daemon",
            ActivitySource::Manual => "manual",
        }
    }

    pub fn parse_label(label: &str) -> Result<Self, crate::violations::ContractViolation> {
        match label {
            "hook" => Ok(ActivitySource::Hook),
            "cli" => Ok(ActivitySource::Cli),
            "daemon" => Ok(ActivitySource::Daemon),
            "manual" => Ok(ActivitySource::Manual),
            unknown_label => Err(crate::violations::ContractViolation::UnknownStateLabel(
                unknown_label.into(),
            )),
        }
    }
}

/// Fase del ciclo de vida de un prompt asistido.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClaudeActivityPhase {
    Start,
    End,
    Progress,
    UserAction,
}

/// Biometría opcional de un prompt asistido adjunta a la actividad.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaudeContext {
    pub prompt_id: String,
    /// Estimación de procesamiento en milisegundos.
    pub estimated_processing_time: i64,
    /// Medición real, disponible solo en la fase 'end'.
    pub actual_processing_time: Option<i64>,
    pub tokens_count: Option<i64>,
    pub prompt_length: i64,
    pub complexity_hint: String,
    pub claude_activity: ClaudeActivityPhase,
}

/// Evento individual cristalizado en el Ledger Temporal.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: String,
    /// None únicamente cuando el bloque ancla fue eliminado (orphan-null).
    pub work_block_id: Option<String>,
    pub user_id: String,
    pub session_id: Option<String>,
    pub project_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub activity_type: ActivityType,
    pub activity_source: ActivitySource,
    pub command: Option<String>,
    pub description: Option<String>,
    /// Mapa plano opaco; se persiste como cadena JSON.
    pub metadata: BTreeMap<String, String>,
    pub claude_context: Option<ClaudeContext>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Forja el registro atómico listo para su cristalización.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        work_block_identifier: &str,
        user_identifier: &str,
        session_identifier: &str,
        project_identifier: &str,
        event_instant: DateTime<Utc>,
        activity_type: ActivityType,
        activity_source: ActivitySource,
    ) -> Self {
        Self {
            id: format!("act_{}", Uuid::new_v4()),
            work_block_id: Some(work_block_identifier.to_string()),
            user_id: user_identifier.to_string(),
            session_id: Some(session_identifier.to_string()),
            project_id: Some(project_identifier.to_string()),
            timestamp: event_instant,
            activity_type,
            activity_source,
            command: None,
            description: None,
            metadata: BTreeMap::new(),
            claude_context: None,
            created_at: event_instant,
        }
    }
}
