// [libs/infra/db/src/repositories/projects.rs]
/*!
 * =================================================================
 * APARATO: PROJECT IDENTITY REPOSITORY (V3.0 - DETERMINISTIC)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: RESOLUCIÓN GET-OR-CREATE DE PROYECTOS POR RUTA ÚNICA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PATH UNIQUENESS: La ruta normalizada es la clave natural; el
 *    INSERT OR IGNORE absorbe carreras de creación sin duplicar filas.
 * 2. IMMUTABLE RESOLUTION: Resolver una ruta existente JAMÁS muta el
 *    proyecto registrado.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::{optional_text_column, text_or_null};
use crate::StoreClient;
use libsql::{params, Connection, Row};
use tempo_domain_models::Project;
use tracing::{debug, instrument};

pub struct ProjectRepository {
    database_client: StoreClient,
}

impl ProjectRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Registra el proyecto si su ruta aún no existe y retorna la fila
     * canónica del Ledger (la existente o la recién cristalizada).
     */
    #[instrument(skip(self, project))]
    pub async fn insert_if_absent(&self, project: &Project) -> Result<Project, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let canonical_clock = self.database_client.clock();

        let inserted_rows = database_connection
            .execute(
                "INSERT OR IGNORE INTO projects (id, name, path, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    project.id.clone(),
                    project.name.clone(),
                    project.path.clone(),
                    text_or_null(project.description.clone()),
                    canonical_clock.to_storage(project.created_at),
                    canonical_clock.to_storage(project.updated_at)
                ],
            )
            .await?;

        if inserted_rows > 0 {
            debug!("📁 [PROJECT_GENESIS]: Identity {} materialized for path {}.", project.id, project.path);
        }

        self.get_by_path(&project.path)
            .await?
            .ok_or(DbError::ProjectNotFound)
    }

    /// Variante transaccional para la composición del migrador.
    pub async fn insert_ignore_on(
        shared_connection: &Connection,
        project: &Project,
        storage_created_at: &str,
        storage_updated_at: &str,
    ) -> Result<u64, DbError> {
        Ok(shared_connection
            .execute(
                "INSERT OR IGNORE INTO projects (id, name, path, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    project.id.clone(),
                    project.name.clone(),
                    project.path.clone(),
                    text_or_null(project.description.clone()),
                    storage_created_at,
                    storage_updated_at
                ],
            )
            .await?)
    }

    pub async fn get_by_path(&self, normalized_path: &str) -> Result<Option<Project>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                "SELECT id, name, path, description, created_at, updated_at
                 FROM projects WHERE path = ?1",
                params![normalized_path],
            )
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(Some(self.map_row_to_project(&data_row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_id(&self, project_identifier: &str) -> Result<Option<Project>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                "SELECT id, name, path, description, created_at, updated_at
                 FROM projects WHERE id = ?1",
                params![project_identifier],
            )
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(Some(self.map_row_to_project(&data_row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_all_projects(&self) -> Result<Vec<Project>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                "SELECT id, name, path, description, created_at, updated_at
                 FROM projects ORDER BY path ASC",
                (),
            )
            .await?;

        let mut projects_collection = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            projects_collection.push(self.map_row_to_project(&data_row)?);
        }
        Ok(projects_collection)
    }

    fn map_row_to_project(&self, data_row: &Row) -> Result<Project, DbError> {
        let canonical_clock = self.database_client.clock();
        Ok(Project {
            id: data_row.get(0)?,
            name: data_row.get(1)?,
            path: data_row.get(2)?,
            description: optional_text_column(data_row, 3)?,
            created_at: canonical_clock.parse_storage(&data_row.get::<String>(4)?)?,
            updated_at: canonical_clock.parse_storage(&data_row.get::<String>(5)?)?,
        })
    }
}
