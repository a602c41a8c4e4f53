// [apps/chronicler/src/services/migration.rs]
/*!
 * =================================================================
 * APARATO: LEGACY MIGRATION ENGINE (V4.2 - ONE SHOT GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4 / OPS)
 * RESPONSABILIDAD: IMPORTACIÓN ÚNICA DEL SNAPSHOT BINARIO HEREDADO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IS_ACTIVE DISTRUST: La bandera cacheada del snapshot JAMÁS se honra;
 *    el estado de cada ventana se recomputa desde el tiempo físico.
 * 2. SINGLE TRANSACTION: Toda la importación viaja en una transacción;
 *    las re-ejecuciones son inocuas gracias al insert-ignore.
 * 3. POST-AUDIT: La validación de volúmenes e integridad referencial es
 *    posterior y NO revierte la transacción; un fallo marca el resultado
 *    como inválido y lo reporta.
 * 4. SANITIZATION: Las marcas temporales heredadas se acotan a la ventana
 *    forzada de 5 horas para que ninguna fila viole el contrato del Ledger.
 *
 * # Mathematical Proof (Idempotent Import):
 * Sea I el conjunto de identificadores del snapshot. El insert-ignore
 * convierte la importación en la unión Ledger ∪ I; aplicarla n veces
 * produce el mismo conjunto que aplicarla una vez.
 * =================================================================
 */

use crate::services::PipelineError;
use bincode::Options;
use chrono::{DateTime, Duration, Utc};
use futures::future::FutureExt;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tempo_domain_models::{
    derive_block_durations, derive_project_identity, derive_project_name, normalize_project_path,
    Activity, ActivitySource, ActivityType, LegacyActivity, LegacySession, LegacySnapshot,
    LegacyWorkBlock, Project, Session, SessionState, User, WorkBlock, WorkBlockState,
    SESSION_WINDOW_HOURS,
};
use tempo_infra_db::repositories::{
    ActivityRepository, ProjectRepository, SessionRepository, SystemRepository, UserRepository,
    WorkBlockRepository,
};
use tempo_infra_db::{DbError, StoreClient};
use tracing::{info, instrument, warn};

/// Límite de seguridad para evitar agotamiento de memoria (256MB).
const MAXIMUM_SNAPSHOT_SIZE_LIMIT_BYTES: u64 = 256_000_000;

/**
 * Genera la configuración soberana de decodificación Bincode.
 * Garantiza determinismo entre arquitecturas x86_64 y ARM64.
 */
fn get_snapshot_decoding_config() -> impl bincode::Options {
    bincode::DefaultOptions::new()
        .with_little_endian()
        .with_fixint_encoding()
        .with_limit(MAXIMUM_SNAPSHOT_SIZE_LIMIT_BYTES)
        .allow_trailing_bytes()
}

/**
 * Decodifica la ráfaga binaria heredada hacia el contrato de dominio.
 *
 * # Errors:
 * - `PipelineError::Validation` si la ráfaga no respeta el formato.
 */
pub fn decode_snapshot(binary_burst: &[u8]) -> Result<LegacySnapshot, PipelineError> {
    get_snapshot_decoding_config()
        .deserialize(binary_burst)
        .map_err(|decode_fault| {
            PipelineError::Validation(tempo_domain_models::ContractViolation::SnapshotMalformed(
                decode_fault.to_string(),
            ))
        })
}

/// Resultado consolidado de la importación heredada.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub users_imported: u64,
    pub projects_imported: u64,
    pub sessions_imported: u64,
    pub work_blocks_imported: u64,
    pub activities_imported: u64,
    pub duration_milliseconds: u64,
    pub data_integrity_valid: bool,
    pub validation_errors: Vec<String>,
}

/// Importador único del estado heredado hacia el Ledger Temporal.
pub struct MigrationEngine {
    database_client: StoreClient,
    system_repository: Arc<SystemRepository>,
}

impl MigrationEngine {
    pub fn new(database_client: StoreClient, system_repository: Arc<SystemRepository>) -> Self {
        Self {
            database_client,
            system_repository,
        }
    }

    /**
     * Ejecuta la importación completa dentro de una transacción única y
     * audita los volúmenes y la integridad referencial al finalizar.
     */
    #[instrument(skip(self, legacy_snapshot))]
    pub async fn execute(
        &self,
        legacy_snapshot: LegacySnapshot,
    ) -> Result<MigrationReport, PipelineError> {
        let migration_stopwatch = std::time::Instant::now();
        let recompute_instant = self.database_client.clock().now();

        let (source_session_volume, source_block_volume, source_activity_volume) =
            legacy_snapshot.record_volume();

        info!(
            "📦 [MIGRATION_IGNITION]: Snapshot v{} ({} sessions, {} blocks, {} activities).",
            legacy_snapshot.version, source_session_volume, source_block_volume, source_activity_volume
        );

        // --- FASE PURA: CONVERSIÓN EN RAM (sin tocar el Ledger) ---

        let extracted_users = extract_distinct_users(&legacy_snapshot);
        let project_registry = extract_project_registry(&legacy_snapshot);

        let converted_sessions: Vec<Session> = legacy_snapshot
            .sessions
            .values()
            .map(|legacy_session| convert_legacy_session(legacy_session, recompute_instant))
            .collect();

        let converted_blocks: Vec<WorkBlock> = legacy_snapshot
            .work_blocks
            .values()
            .map(|legacy_block| convert_legacy_work_block(legacy_block, &project_registry))
            .collect();

        let converted_activities: Vec<Activity> = legacy_snapshot
            .activities
            .iter()
            .map(|legacy_activity| convert_legacy_activity(legacy_activity, &project_registry))
            .collect();

        let converted_projects: Vec<Project> = project_registry.into_values().collect();

        // --- FASE TRANSACCIONAL: UNIÓN CON EL LEDGER (insert-ignore) ---

        let transaction_clock = self.database_client.clock().clone();
        let import_volumes = self
            .database_client
            .with_transaction(move |transaction_connection| {
                async move {
                    let mut users_imported = 0u64;
                    for legacy_user in &extracted_users {
                        users_imported +=
                            UserRepository::insert_ignore_on(&transaction_connection, legacy_user)
                                .await?;
                    }

                    let mut projects_imported = 0u64;
                    for converted_project in &converted_projects {
                        let storage_instant =
                            transaction_clock.to_storage(converted_project.created_at);
                        projects_imported += ProjectRepository::insert_ignore_on(
                            &transaction_connection,
                            converted_project,
                            &storage_instant,
                            &storage_instant,
                        )
                        .await?;
                    }

                    let mut sessions_imported = 0u64;
                    for converted_session in &converted_sessions {
                        sessions_imported += SessionRepository::insert_ignore_on(
                            &transaction_connection,
                            converted_session,
                            &transaction_clock,
                        )
                        .await?;
                    }

                    let mut blocks_imported = 0u64;
                    for converted_block in &converted_blocks {
                        blocks_imported += WorkBlockRepository::insert_ignore_on(
                            &transaction_connection,
                            converted_block,
                            &transaction_clock,
                        )
                        .await?;
                    }

                    let mut activities_imported = 0u64;
                    for converted_activity in &converted_activities {
                        activities_imported += ActivityRepository::insert_ignore_on(
                            &transaction_connection,
                            converted_activity,
                            &transaction_clock,
                        )
                        .await?;
                    }

                    Ok::<_, DbError>((
                        users_imported,
                        projects_imported,
                        sessions_imported,
                        blocks_imported,
                        activities_imported,
                    ))
                }
                .boxed()
            })
            .await?;

        // --- FASE DE AUDITORÍA (no transaccional, no revierte) ---

        let mut validation_errors = Vec::new();

        self.audit_entity_volume("sessions", source_session_volume, &mut validation_errors)
            .await;
        self.audit_entity_volume("work_blocks", source_block_volume, &mut validation_errors)
            .await;
        self.audit_entity_volume("activity_events", source_activity_volume, &mut validation_errors)
            .await;

        match self.system_repository.count_orphan_work_blocks().await {
            Ok(0) => {}
            Ok(orphan_volume) => validation_errors.push(format!(
                "REFERENTIAL_BREACH: {} work blocks reference absent sessions",
                orphan_volume
            )),
            Err(audit_fault) => {
                validation_errors.push(format!("ORPHAN_AUDIT_UNAVAILABLE: {}", audit_fault))
            }
        }

        let data_integrity_valid = validation_errors.is_empty();
        if !data_integrity_valid {
            warn!(
                "⚠️ [MIGRATION_SUSPECT]: Import flagged invalid ({} findings). Partial state remains.",
                validation_errors.len()
            );
        }

        let migration_report = MigrationReport {
            users_imported: import_volumes.0,
            projects_imported: import_volumes.1,
            sessions_imported: import_volumes.2,
            work_blocks_imported: import_volumes.3,
            activities_imported: import_volumes.4,
            duration_milliseconds: migration_stopwatch.elapsed().as_millis() as u64,
            data_integrity_valid,
            validation_errors,
        };

        info!(
            "✅ [MIGRATION_SEALED]: {}u/{}p/{}s/{}b/{}a in {}ms (integrity: {}).",
            migration_report.users_imported,
            migration_report.projects_imported,
            migration_report.sessions_imported,
            migration_report.work_blocks_imported,
            migration_report.activities_imported,
            migration_report.duration_milliseconds,
            migration_report.data_integrity_valid
        );

        Ok(migration_report)
    }

    /// Compara el volumen de una tabla contra el del snapshot de origen.
    async fn audit_entity_volume(
        &self,
        table_identifier: &str,
        source_volume: usize,
        validation_errors: &mut Vec<String>,
    ) {
        match self.system_repository.count_table_rows(table_identifier).await {
            Ok(ledger_volume) if ledger_volume == source_volume as u64 => {}
            Ok(ledger_volume) => validation_errors.push(format!(
                "VOLUME_MISMATCH[{}]: ledger={} source={}",
                table_identifier, ledger_volume, source_volume
            )),
            Err(audit_fault) => validation_errors.push(format!(
                "VOLUME_AUDIT_UNAVAILABLE[{}]: {}",
                table_identifier, audit_fault
            )),
        }
    }
}

// --- ESTRATO DE CONVERSIÓN PURA (Legacy -> Dominio) ---

/// Operadores referenciados por sesiones y actividades del snapshot.
/// Las actividades se incluyen para que la clave foránea del Ledger
/// encuentre a todo operador ancla.
fn extract_distinct_users(legacy_snapshot: &LegacySnapshot) -> Vec<User> {
    let mut distinct_identifiers = BTreeSet::new();

    for legacy_session in legacy_snapshot.sessions.values() {
        if !legacy_session.user_id.is_empty() {
            distinct_identifiers.insert(legacy_session.user_id.clone());
        }
    }
    for legacy_activity in &legacy_snapshot.activities {
        if !legacy_activity.user_id.is_empty() {
            distinct_identifiers.insert(legacy_activity.user_id.clone());
        }
    }

    distinct_identifiers
        .into_iter()
        .map(|user_identifier| User::first_seen(&user_identifier))
        .collect()
}

/// Clave del registro: el par crudo (nombre, ruta) tal como viaja en el snapshot.
type ProjectPairKey = (String, String);

/**
 * Registro determinista de proyectos extraído de los pares distintos
 * (project_name, project_path) referenciados por los bloques heredados.
 */
fn extract_project_registry(legacy_snapshot: &LegacySnapshot) -> BTreeMap<ProjectPairKey, Project> {
    let mut project_registry = BTreeMap::new();

    for legacy_block in legacy_snapshot.work_blocks.values() {
        let pair_key = (
            legacy_block.project_name.clone(),
            legacy_block.project_path.clone(),
        );
        project_registry
            .entry(pair_key)
            .or_insert_with(|| materialize_legacy_project(legacy_block, legacy_snapshot.last_updated));
    }

    project_registry
}

fn materialize_legacy_project(legacy_block: &LegacyWorkBlock, registry_instant: DateTime<Utc>) -> Project {
    // Coordenada efectiva: ruta explícita, o sintética cuando solo hay nombre.
    let effective_path = if !legacy_block.project_path.trim().is_empty() {
        normalize_project_path(&legacy_block.project_path)
    } else if !legacy_block.project_name.trim().is_empty() {
        format!("/unknown/{}", legacy_block.project_name.trim())
    } else {
        "/unknown".to_string()
    };

    let effective_name = if !legacy_block.project_name.trim().is_empty() {
        legacy_block.project_name.trim().to_string()
    } else {
        derive_project_name(&effective_path)
    };

    Project {
        id: derive_project_identity(&effective_name, &effective_path),
        name: effective_name,
        path: effective_path,
        description: None,
        created_at: registry_instant,
        updated_at: registry_instant,
    }
}

/**
 * Conversión de sesión: fuerza la ventana de 5 horas, recomputa el estado
 * desde el tiempo y acota las marcas heredadas al contrato del Ledger.
 */
fn convert_legacy_session(legacy_session: &LegacySession, recompute_instant: DateTime<Utc>) -> Session {
    let forced_end = legacy_session.start_time + Duration::hours(SESSION_WINDOW_HOURS);

    // Recómputo temporal: la bandera is_active del snapshot NO es verdad.
    let recomputed_state = if recompute_instant >= forced_end {
        SessionState::Expired
    } else if legacy_session.is_active {
        SessionState::Active
    } else {
        SessionState::Finished
    };

    let clamped_last_activity = legacy_session
        .last_activity_time
        .clamp(legacy_session.start_time, forced_end);

    let clamped_first_activity = legacy_session
        .first_activity_time
        .map(|first_instant| first_instant.clamp(legacy_session.start_time, clamped_last_activity));

    Session {
        id: legacy_session.id.clone(),
        user_id: legacy_session.user_id.clone(),
        start_time: legacy_session.start_time,
        end_time: forced_end,
        state: recomputed_state,
        first_activity_time: clamped_first_activity,
        last_activity_time: clamped_last_activity,
        activity_count: legacy_session.activity_count.max(1),
        duration_hours: 5.0,
        created_at: legacy_session.start_time,
        updated_at: clamped_last_activity,
    }
}

/**
 * Conversión de bloque: resuelve el proyecto desde el registro, anula
 * end_time para los activos y deriva duraciones para los sellados.
 */
fn convert_legacy_work_block(
    legacy_block: &LegacyWorkBlock,
    project_registry: &BTreeMap<ProjectPairKey, Project>,
) -> WorkBlock {
    let pair_key = (
        legacy_block.project_name.clone(),
        legacy_block.project_path.clone(),
    );
    let resolved_project_id = project_registry
        .get(&pair_key)
        .map(|registered_project| registered_project.id.clone())
        .unwrap_or_else(|| {
            // Inalcanzable: el registro se construyó desde estos mismos bloques.
            derive_project_identity(&legacy_block.project_name, &legacy_block.project_path)
        });

    let recomputed_state = if legacy_block.is_active {
        WorkBlockState::Active
    } else {
        WorkBlockState::Finished
    };

    if recomputed_state == WorkBlockState::Active {
        let clamped_last_activity = legacy_block
            .last_activity_time
            .max(legacy_block.start_time);

        return WorkBlock {
            id: legacy_block.id.clone(),
            session_id: legacy_block.session_id.clone(),
            project_id: resolved_project_id,
            start_time: legacy_block.start_time,
            end_time: None,
            state: WorkBlockState::Active,
            last_activity_time: clamped_last_activity,
            activity_count: legacy_block.activity_count.max(1),
            duration_seconds: None,
            duration_hours: None,
            created_at: legacy_block.start_time,
            updated_at: clamped_last_activity,
        };
    }

    let closure_instant = legacy_block
        .end_time
        .unwrap_or(legacy_block.last_activity_time)
        .max(legacy_block.start_time);
    let clamped_last_activity = legacy_block
        .last_activity_time
        .clamp(legacy_block.start_time, closure_instant);
    let (derived_seconds, derived_hours) =
        derive_block_durations(legacy_block.start_time, closure_instant);

    WorkBlock {
        id: legacy_block.id.clone(),
        session_id: legacy_block.session_id.clone(),
        project_id: resolved_project_id,
        start_time: legacy_block.start_time,
        end_time: Some(closure_instant),
        state: WorkBlockState::Finished,
        last_activity_time: clamped_last_activity,
        activity_count: legacy_block.activity_count.max(1),
        duration_seconds: Some(derived_seconds),
        duration_hours: Some(derived_hours),
        created_at: legacy_block.start_time,
        updated_at: closure_instant,
    }
}

/**
 * Conversión de actividad: el proyecto se resuelve solo si el par de
 * coordenadas es determinable desde el registro; un par vacío viaja nulo.
 */
fn convert_legacy_activity(
    legacy_activity: &LegacyActivity,
    project_registry: &BTreeMap<ProjectPairKey, Project>,
) -> Activity {
    let pair_is_empty = legacy_activity.project_name.trim().is_empty()
        && legacy_activity.project_path.trim().is_empty();

    let resolved_project_id = if pair_is_empty {
        None
    } else {
        project_registry
            .get(&(
                legacy_activity.project_name.clone(),
                legacy_activity.project_path.clone(),
            ))
            .map(|registered_project| registered_project.id.clone())
    };

    Activity {
        id: legacy_activity.id.clone(),
        work_block_id: Some(legacy_activity.work_block_id.clone()),
        user_id: legacy_activity.user_id.clone(),
        session_id: legacy_activity.session_id.clone(),
        project_id: resolved_project_id,
        timestamp: legacy_activity.timestamp,
        activity_type: ActivityType::parse_label(&legacy_activity.activity_type)
            .unwrap_or_default(),
        activity_source: ActivitySource::parse_label(&legacy_activity.activity_source)
            .unwrap_or_default(),
        command: legacy_activity.command.clone(),
        description: legacy_activity.description.clone(),
        metadata: legacy_activity.metadata.clone(),
        claude_context: None,
        created_at: legacy_activity.timestamp,
    }
}
