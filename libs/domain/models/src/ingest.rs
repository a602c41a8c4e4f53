// [libs/domain/models/src/ingest.rs]

use crate::activity::{ActivitySource, ActivityType, ClaudeContext};
use crate::violations::ContractViolation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typeshare::typeshare;

/// Evento de ingesta tal como llega por el túnel HTTP (POST /activity).
///
/// El contrato exige 'user_id' y al menos una coordenada de proyecto;
/// el resto de los campos se completa con valores por defecto.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestEvent {
    pub user_id: String,
    #[serde(default)]
    pub project_path: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    /// Ausente => el servidor ancla el evento a su reloj canónico.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub activity_source: ActivitySource,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub claude_context: Option<ClaudeContext>,
}

impl IngestEvent {
    /**
     * Validación de pre-vuelo: ningún estado se toca si el evento es ilegal.
     *
     * # Errors:
     * - `ContractViolation::EmptyIdentifier` si 'user_id' llega vacío.
     * - `ContractViolation::ProjectCoordinatesMissing` si no hay ruta ni nombre.
     */
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.user_id.trim().is_empty() {
            return Err(ContractViolation::EmptyIdentifier("event.user_id".into()));
        }

        let has_path = self
            .project_path
            .as_deref()
            .map(|path| !path.trim().is_empty())
            .unwrap_or(false);
        let has_name = self
            .project_name
            .as_deref()
            .map(|name| !name.trim().is_empty())
            .unwrap_or(false);

        if !has_path && !has_name {
            return Err(ContractViolation::ProjectCoordinatesMissing);
        }

        Ok(())
    }

    /**
     * Coordenada de proyecto efectiva: la ruta explícita, o la ruta
     * sintética '/unknown/<name>' cuando solo llegó el nombre.
     */
    pub fn effective_project_path(&self) -> Option<String> {
        if let Some(explicit_path) = self.project_path.as_deref() {
            if !explicit_path.trim().is_empty() {
                return Some(explicit_path.to_string());
            }
        }
        self.project_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(|name| format!("/unknown/{}", name.trim()))
    }
}
