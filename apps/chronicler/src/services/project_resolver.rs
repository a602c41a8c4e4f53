// [apps/chronicler/src/services/project_resolver.rs]
/*!
 * =================================================================
 * APARATO: PROJECT RESOLVER (V3.1 - GET OR CREATE)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: MAPEO DE RUTA DE FILESYSTEM A IDENTIDAD ESTABLE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IMMUTABLE RESOLUTION: Resolver una ruta existente JAMÁS actualiza
 *    el proyecto registrado; la primera cristalización es canónica.
 * 2. DETERMINISTIC IDENTITY: Identidades estables entre reinicios vía
 *    digestión SHA-256 de (nombre, ruta normalizada).
 * =================================================================
 */

use crate::services::PipelineError;
use std::sync::Arc;
use tempo_domain_models::{normalize_project_path, ContractViolation, Project};
use tempo_infra_db::repositories::ProjectRepository;
use tempo_infra_db::StoreClient;
use tracing::{debug, instrument};

pub struct ProjectResolver {
    project_repository: Arc<ProjectRepository>,
    database_client: StoreClient,
}

impl ProjectResolver {
    pub fn new(project_repository: Arc<ProjectRepository>, database_client: StoreClient) -> Self {
        Self {
            project_repository,
            database_client,
        }
    }

    /**
     * Resuelve la identidad del proyecto para una ruta cruda:
     * normaliza, busca por ruta exacta y materializa si está ausente.
     *
     * # Errors:
     * - `PipelineError::Validation` ante una ruta vacía.
     */
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, raw_project_path: &str) -> Result<Project, PipelineError> {
        if raw_project_path.trim().is_empty() {
            return Err(PipelineError::Validation(ContractViolation::EmptyIdentifier(
                "project.path".into(),
            )));
        }

        let normalized_path = normalize_project_path(raw_project_path);

        if let Some(registered_project) = self.project_repository.get_by_path(&normalized_path).await? {
            debug!(
                "📁 [PROJECT_HIT]: Path {} already resolved as {}.",
                normalized_path, registered_project.id
            );
            return Ok(registered_project);
        }

        let materialized_project =
            Project::materialize(&normalized_path, self.database_client.clock().now());
        let canonical_project = self
            .project_repository
            .insert_if_absent(&materialized_project)
            .await?;

        Ok(canonical_project)
    }

    /**
     * Variante de solo lectura para las consultas de estado: jamás crea.
     */
    pub async fn resolve_existing(
        &self,
        raw_project_path: &str,
    ) -> Result<Option<Project>, PipelineError> {
        if raw_project_path.trim().is_empty() {
            return Ok(None);
        }
        let normalized_path = normalize_project_path(raw_project_path);
        Ok(self.project_repository.get_by_path(&normalized_path).await?)
    }
}
