// INICIO DEL ARCHIVO [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT (V5.1 - CAPACITY GOVERNED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES TÁCTICOS Y PERSISTENCIA ACID
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CAPACITY GOVERNANCE: Un semáforo soberano acota las conexiones
 *    vivas al máximo configurado (default 25); cada préstamo retiene
 *    su permiso hasta ser devuelto al pool.
 * 2. MEMORY ANCHOR: En modo RAM, el cliente aplica el ancla de
 *    persistencia ANTES del bootstrap para que las tablas residan en un
 *    segmento de memoria compartido entre hilos.
 * 3. TRANSACTIONAL PRIMITIVE: 'with_transaction' envuelve una unidad de
 *    trabajo con commit en éxito y rollback automático ante error.
 *
 * # Mathematical Proof (In-Memory Consistency):
 * Al detectar URLs de memoria el cliente solidifica el esquema sobre el
 *  ancla, garantizando que toda conexión posterior observe el mismo
 * segmento compartido y no una base efímera vacía.
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::apply_full_ledger_schema;
use crate::timezone::{CanonicalClock, DEFAULT_CANONICAL_TIMEZONE};
use futures::future::BoxFuture;
use libsql::{Builder, Connection, Database};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{error, info, instrument};

/// Parámetros de capacidad y normalización del Ledger Temporal.
#[derive(Debug, Clone)]
pub struct StoreTuning {
    /// Límite físico de conexiones concurrentes (pool abierto).
    pub maximum_open_connections: usize,
    /// Objetivo de conexiones tibias en reposo (informativo para Ops).
    pub idle_warm_target: usize,
    /// Zona IANA de normalización canónica.
    pub canonical_timezone: String,
}

impl Default for StoreTuning {
    fn default() -> Self {
        Self {
            maximum_open_connections: 25,
            idle_warm_target: 5,
            canonical_timezone: DEFAULT_CANONICAL_TIMEZONE.to_string(),
        }
    }
}

/// Préstamo de conexión: retiene el permiso de capacidad mientras vive.
pub struct ConnectionLease {
    leased_connection: Connection,
    _capacity_permit: OwnedSemaphorePermit,
}

impl Deref for ConnectionLease {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.leased_connection
    }
}

/// Veredicto del chequeo de salud del Ledger Temporal.
#[derive(Debug, Clone)]
pub struct LedgerHealthReport {
    pub connectivity_confirmed: bool,
    pub missing_tables: Vec<String>,
    pub schema_revision: Option<i64>,
}

impl LedgerHealthReport {
    pub fn is_operational(&self) -> bool {
        self.connectivity_confirmed && self.missing_tables.is_empty()
    }
}

/// Conjunto mínimo de tablas exigido por el chequeo de salud.
const REQUIRED_TABLE_SET: &[&str] = &[
    "users",
    "projects",
    "sessions",
    "work_blocks",
    "activity_events",
    "schema_version",
];

#[derive(Clone)]
pub struct StoreClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene la base de datos viva en memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
    /// Gobernador de capacidad del pool de conexiones.
    connection_capacity_governor: Arc<Semaphore>,
    /// Reloj canónico compartido por todos los repositorios.
    canonical_clock: CanonicalClock,
    tuning: StoreTuning,
}

impl StoreClient {
    #[instrument(skip(database_access_token, tuning))]
    pub async fn connect(
        database_connection_url: &str,
        database_access_token: Option<String>,
        tuning: StoreTuning,
    ) -> Result<Self, DbError> {
        if database_connection_url.is_empty() {
            return Err(DbError::ConfigurationError(
                "CRITICAL_FAULT: DATABASE_URL_UNDEFINED".into(),
            ));
        }

        if tuning.maximum_open_connections == 0 {
            return Err(DbError::ConfigurationError(
                "CRITICAL_FAULT: POOL_CAPACITY_ZERO".into(),
            ));
        }

        let canonical_clock = CanonicalClock::new(&tuning.canonical_timezone)?;

        info!(
            "🔌 [DATABASE]: Initiating tactical link synchronization to [{}] (zone {})",
            database_connection_url,
            canonical_clock.zone_label()
        );

        let is_remote = database_connection_url.starts_with("libsql://")
            || database_connection_url.starts_with("https://");

        let is_memory = database_connection_url.contains(":memory:")
            || database_connection_url.contains("mode=memory");

        let database_driver = if is_remote {
            let token = database_access_token.ok_or_else(|| {
                DbError::ConnectionError("SECURITY_FAULT: Remote access denied (Token missing)".into())
            })?;
            Builder::new_remote(database_connection_url.to_string(), token)
                .build()
                .await
        } else {
            Builder::new_local(database_connection_url).build().await
        }
        .map_err(|driver_fault| {
            DbError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {}", driver_fault))
        })?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        // En modo memoria, abrimos el ancla ANTES que cualquier otra operación.
        if is_memory {
            let anchor_connection = shared_driver.connect().map_err(|anchor_fault| {
                DbError::ConnectionError(format!("ANCHOR_FAULT: {}", anchor_fault))
            })?;

            Self::harden_connection(&anchor_connection).await?;
            apply_full_ledger_schema(&anchor_connection)
                .await
                .map_err(|schema_fault| {
                    DbError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", schema_fault))
                })?;

            anchor = Some(Arc::new(anchor_connection));
            info!("⚓ [DATABASE]: Memory strata solidified and anchored.");
        } else {
            // En modo Disco/Remoto, usamos una conexión temporal para el bootstrap.
            let bootstrap_connection = shared_driver.connect().map_err(|bootstrap_fault| {
                DbError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {}", bootstrap_fault))
            })?;
            Self::harden_connection(&bootstrap_connection).await?;
            apply_full_ledger_schema(&bootstrap_connection)
                .await
                .map_err(|schema_fault| {
                    DbError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", schema_fault))
                })?;
        }

        let capacity_governor = Arc::new(Semaphore::new(tuning.maximum_open_connections));

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: anchor,
            connection_capacity_governor: capacity_governor,
            canonical_clock,
            tuning,
        })
    }

    /// Activa la imposición de claves foráneas en el enlace recién abierto.
    async fn harden_connection(connection: &Connection) -> Result<(), DbError> {
        connection
            .execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|pragma_fault| {
                DbError::ConnectionError(format!("PRAGMA_FAULT: {}", pragma_fault))
            })?;
        Ok(())
    }

    /// Reloj canónico compartido del Ledger.
    pub fn clock(&self) -> &CanonicalClock {
        &self.canonical_clock
    }

    pub fn tuning(&self) -> &StoreTuning {
        &self.tuning
    }

    /**
     * Presta una conexión gobernada por el semáforo de capacidad.
     * El permiso viaja dentro del préstamo y se libera al soltarlo.
     */
    pub async fn acquire_connection(&self) -> Result<ConnectionLease, DbError> {
        let capacity_permit = self
            .connection_capacity_governor
            .clone()
            .acquire_owned()
            .await
            .map_err(|governor_fault| {
                DbError::ConnectionError(format!("CAPACITY_GOVERNOR_CLOSED: {}", governor_fault))
            })?;

        let fresh_connection = self.internal_database_driver.connect().map_err(|pool_fault| {
            error!("⚠️ [POOL_FAULT]: Connection allocation failed: {}", pool_fault);
            DbError::ConnectionError(pool_fault.to_string())
        })?;

        Self::harden_connection(&fresh_connection).await?;

        Ok(ConnectionLease {
            leased_connection: fresh_connection,
            _capacity_permit: capacity_permit,
        })
    }

    /**
     * Primitiva transaccional soberana: entrega a la unidad de trabajo un
     * enlace acotado a la transacción viva; commit ante Ok, rollback
     * automático ante Err.
     *
     * # Errors:
     * El error de la unidad de trabajo se propaga sin alteración; los
     * fallos de commit/rollback se reportan como 'TransactionError'.
     */
    pub async fn with_transaction<T, F>(&self, unit_of_work: F) -> Result<T, DbError>
    where
        F: FnOnce(Connection) -> BoxFuture<'static, Result<T, DbError>>,
    {
        let connection_lease = self.acquire_connection().await?;

        // El mismo enlace físico sobre el que abre la transacción, como
        // manija clonada: toda sentencia emitida sobre él viaja dentro
        // de la transacción.
        let transaction_scoped_connection: Connection = (*connection_lease).clone();

        let live_transaction = connection_lease
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        match unit_of_work(transaction_scoped_connection).await {
            Ok(work_outcome) => {
                live_transaction
                    .commit()
                    .await
                    .map_err(|_| DbError::TransactionError)?;
                Ok(work_outcome)
            }
            Err(work_fault) => {
                if let Err(rollback_fault) = live_transaction.rollback().await {
                    error!("💀 [TX_ROLLBACK_FAULT]: {}", rollback_fault);
                }
                Err(work_fault)
            }
        }
    }

    /**
     * Chequeo de salud: conectividad viva + presencia del conjunto mínimo
     * de tablas + revisión estructural vigente.
     */
    #[instrument(skip(self))]
    pub async fn verify_health(&self) -> Result<LedgerHealthReport, DbError> {
        let connection_lease = self.acquire_connection().await?;

        // 1. SONDA DE CONECTIVIDAD
        let mut probe_results = connection_lease.query("SELECT 1", ()).await?;
        let connectivity_confirmed = probe_results.next().await?.is_some();

        // 2. AUDITORÍA DEL CONJUNTO MÍNIMO DE TABLAS
        let mut missing_tables = Vec::new();
        for required_table in REQUIRED_TABLE_SET {
            let mut presence_results = connection_lease
                .query(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    libsql::params![*required_table],
                )
                .await?;
            if presence_results.next().await?.is_none() {
                missing_tables.push((*required_table).to_string());
            }
        }

        // 3. LECTURA DE LA REVISIÓN ESTRUCTURAL
        let schema_revision = if missing_tables.iter().any(|table| table == "schema_version") {
            None
        } else {
            let mut revision_results = connection_lease
                .query("SELECT MAX(revision) FROM schema_version", ())
                .await?;
            match revision_results.next().await? {
                Some(revision_row) => revision_row.get::<i64>(0).ok(),
                None => None,
            }
        };

        Ok(LedgerHealthReport {
            connectivity_confirmed,
            missing_tables,
            schema_revision,
        })
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/client.rs]
