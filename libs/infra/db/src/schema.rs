// [libs/infra/db/src/schema.rs]
/**
 * =================================================================
 * APARATO: TEMPORAL LEDGER SCHEMA (V7.0 - CONTRACT STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. CONTRACT CHECKS: Las restricciones CHECK codifican los invariantes
 *    del dominio (estados legales, contadores >= 1, duration_hours = 5.0,
 *    coherencia end_time/estado en bloques).
 * 2. REFERENTIAL ACTIONS: El borrado de una sesión cascadea a sus bloques;
 *    el de un bloque anula las referencias de sus actividades.
 * 3. IDEMPOTENCIA: Gestión de errores para migraciones en caliente.
 * 4. PERFORMANCE: Índices de aceleración para las consultas de ventana.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/// Revisión estructural vigente registrada en 'schema_version'.
pub const CURRENT_SCHEMA_REVISION: i64 = 7;

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base del Ledger Temporal.
 */
const LEDGER_TABLES: &[(&str, &str)] = &[
    ("TABLE_USERS", r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL
        );
    "#),
    ("TABLE_PROJECTS", r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            path TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_SESSIONS", r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'active'
                CHECK (state IN ('active', 'expired', 'finished', 'expired_duplicate')),
            first_activity_time TEXT,
            last_activity_time TEXT NOT NULL,
            activity_count INTEGER NOT NULL DEFAULT 1 CHECK (activity_count >= 1),
            duration_hours REAL NOT NULL DEFAULT 5.0 CHECK (duration_hours = 5.0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_WORK_BLOCKS", r#"
        CREATE TABLE IF NOT EXISTS work_blocks (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            project_id TEXT NOT NULL REFERENCES projects(id),
            start_time TEXT NOT NULL,
            end_time TEXT,
            state TEXT NOT NULL DEFAULT 'active'
                CHECK (state IN ('active', 'idle', 'finished', 'closed')),
            last_activity_time TEXT NOT NULL,
            activity_count INTEGER NOT NULL DEFAULT 1 CHECK (activity_count >= 1),
            duration_seconds INTEGER,
            duration_hours REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK ((end_time IS NULL) = (state = 'active'))
        );
    "#),
    ("TABLE_ACTIVITY_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS activity_events (
            id TEXT PRIMARY KEY,
            work_block_id TEXT REFERENCES work_blocks(id) ON DELETE SET NULL,
            user_id TEXT NOT NULL REFERENCES users(id),
            session_id TEXT REFERENCES sessions(id) ON DELETE SET NULL,
            project_id TEXT REFERENCES projects(id),
            timestamp TEXT NOT NULL,
            activity_type TEXT NOT NULL,
            activity_source TEXT NOT NULL,
            command TEXT,
            description TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        );
    "#),
    ("TABLE_SCHEMA_VERSION", r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            revision INTEGER PRIMARY KEY,
            descriptor TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Asegura que las tablas existentes se adapten a las nuevas capacidades.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    // --- SOPORTE DE CONTEXTO ASISTIDO ---
    ("ACTIVITY_CLAUDE_CONTEXT", "ALTER TABLE activity_events ADD COLUMN claude_context TEXT"),

    // --- METADATOS DE PROYECTO ---
    ("PROJECT_DESCRIPTION", "ALTER TABLE projects ADD COLUMN description TEXT"),
];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 * Optimiza las consultas de ventana temporal y de agregación por sesión.
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_SESSIONS_USER_WINDOW", "CREATE INDEX IF NOT EXISTS idx_sessions_user_window ON sessions(user_id, start_time, end_time);"),
    ("IDX_BLOCKS_SESSION", "CREATE INDEX IF NOT EXISTS idx_work_blocks_session ON work_blocks(session_id);"),
    ("IDX_BLOCKS_PROJECT", "CREATE INDEX IF NOT EXISTS idx_work_blocks_project ON work_blocks(project_id);"),
    ("IDX_BLOCKS_WINDOW", "CREATE INDEX IF NOT EXISTS idx_work_blocks_window ON work_blocks(start_time, end_time);"),
    ("IDX_ACTIVITY_USER_TIME", "CREATE INDEX IF NOT EXISTS idx_activity_user_time ON activity_events(user_id, timestamp);"),
    ("IDX_ACTIVITY_BLOCK", "CREATE INDEX IF NOT EXISTS idx_activity_block ON activity_events(work_block_id);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el motor libSQL.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_ledger_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V7.0...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;
    stamp_schema_revision(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Temporal Ledger V7.0 level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in LEDGER_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(repair_fault) => {
                let message = repair_fault.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}

/// Registra la revisión vigente de forma idempotente.
async fn stamp_schema_revision(db: &Connection) -> Result<()> {
    db.execute(
        "INSERT OR IGNORE INTO schema_version (revision, descriptor) VALUES (?1, ?2)",
        libsql::params![CURRENT_SCHEMA_REVISION, "temporal-ledger-contract-strata"],
    )
    .await
    .context("CRITICAL_STAMP_FAULT: schema_version")?;
    Ok(())
}
