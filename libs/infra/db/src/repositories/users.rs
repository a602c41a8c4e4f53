// [libs/infra/db/src/repositories/users.rs]

use crate::errors::DbError;
use crate::StoreClient;
use libsql::{params, Connection};
use tempo_domain_models::User;
use tracing::{debug, instrument};

/// Repositorio de operadores. Los operadores se crean bajo demanda
/// al observar su primera actividad y jamás se eliminan desde el núcleo.
pub struct UserRepository {
    database_client: StoreClient,
}

impl UserRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Garantiza la existencia del operador (insert-if-absent).
     * Operación idempotente: repeticiones no alteran el registro original.
     */
    #[instrument(skip(self))]
    pub async fn ensure_user(&self, user_identifier: &str) -> Result<User, DbError> {
        if user_identifier.trim().is_empty() {
            return Err(DbError::ValidationRejected(
                tempo_domain_models::ContractViolation::EmptyIdentifier("user.id".into()),
            ));
        }

        let database_connection = self.database_client.acquire_connection().await?;
        let fresh_user = User::first_seen(user_identifier);

        let inserted_rows = database_connection
            .execute(
                "INSERT OR IGNORE INTO users (id, username) VALUES (?1, ?2)",
                params![fresh_user.id.clone(), fresh_user.username.clone()],
            )
            .await?;

        if inserted_rows > 0 {
            debug!("👤 [USER_GENESIS]: Operator {} registered on first sight.", user_identifier);
        }

        self.get_user(user_identifier)
            .await?
            .ok_or(DbError::MappingError("USER_VANISHED_POST_INSERT".into()))
    }

    /// Variante transaccional para la composición del migrador.
    pub async fn insert_ignore_on(
        shared_connection: &Connection,
        user: &User,
    ) -> Result<u64, DbError> {
        Ok(shared_connection
            .execute(
                "INSERT OR IGNORE INTO users (id, username) VALUES (?1, ?2)",
                params![user.id.clone(), user.username.clone()],
            )
            .await?)
    }

    pub async fn get_user(&self, user_identifier: &str) -> Result<Option<User>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query(
                "SELECT id, username FROM users WHERE id = ?1",
                params![user_identifier],
            )
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(Some(User {
                id: data_row.get(0)?,
                username: data_row.get(1)?,
            })),
            None => Ok(None),
        }
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, DbError> {
        let database_connection = self.database_client.acquire_connection().await?;
        let mut query_results = database_connection
            .query("SELECT id, username FROM users ORDER BY id ASC", ())
            .await?;

        let mut users_collection = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            users_collection.push(User {
                id: data_row.get(0)?,
                username: data_row.get(1)?,
            });
        }
        Ok(users_collection)
    }
}
