// [apps/chronicler/src/services/sweeper.rs]
/*!
 * =================================================================
 * APARATO: MAINTENANCE SWEEPER (V4.0 - HYGIENE HARDENED)
 * CLASIFICACIÓN: APPLICATION SERVICE + BACKGROUND DAEMON (ESTRATO L4)
 * RESPONSABILIDAD: EXPIRACIÓN DE VENTANAS Y SELLADO DE BLOQUES INACTIVOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STATELESS SWEEPS: Ambos barridos son actualizaciones idempotentes
 *    basadas en conjuntos; invocarlos a cualquier cadencia es seguro.
 * 2. DUAL TRIGGER: Disponible bajo demanda (endpoint de mantenimiento)
 *    y como daemon perpetuo de cadencia configurable.
 * 3. PANOPTICON LOGGING: Reporta los volúmenes recuperados en cada pasada.
 * =================================================================
 */

use crate::services::PipelineError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tempo_infra_db::repositories::{SessionRepository, WorkBlockRepository};
use tokio::time::interval;
use tracing::{info, instrument, warn};

/// Volúmenes recuperados por una pasada de mantenimiento.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SweepReport {
    pub expired_sessions: u64,
    pub idle_work_blocks: u64,
}

/// Barredora sin estado: la verdad vive exclusivamente en el Ledger.
pub struct MaintenanceSweeper {
    session_repository: Arc<SessionRepository>,
    work_block_repository: Arc<WorkBlockRepository>,
}

impl MaintenanceSweeper {
    pub fn new(
        session_repository: Arc<SessionRepository>,
        work_block_repository: Arc<WorkBlockRepository>,
    ) -> Self {
        Self {
            session_repository,
            work_block_repository,
        }
    }

    /**
     * Pasada completa de mantenimiento: primero las ventanas vencidas,
     * después los bloques silenciosos. Retorna ambos volúmenes.
     */
    #[instrument(skip(self, sweep_instant))]
    pub async fn sweep(&self, sweep_instant: DateTime<Utc>) -> Result<SweepReport, PipelineError> {
        let expired_sessions = self
            .session_repository
            .mark_expired_sessions(sweep_instant)
            .await?;

        let idle_work_blocks = self
            .work_block_repository
            .mark_idle_work_blocks(sweep_instant)
            .await?;

        Ok(SweepReport {
            expired_sessions,
            idle_work_blocks,
        })
    }

    /**
     * Inicia el daemon de limpieza perpetua en el runtime de Tokio.
     *
     * # Performance:
     * La cadencia configurable (default 60s) está sintonizada para
     * minimizar el jitter en los hilos de red de la ingesta.
     */
    pub fn spawn_sweeper_daemon(self: Arc<Self>, cadence_seconds: u64) {
        if cadence_seconds == 0 {
            info!("💀 [SWEEPER_DISABLED]: Cadence zero; maintenance is on-demand only.");
            return;
        }

        let mut maintenance_ticker = interval(Duration::from_secs(cadence_seconds));

        tokio::spawn(async move {
            info!(
                "💀 [SWEEPER_ACTIVE]: Ledger hygiene daemon initiated ({}s cadence).",
                cadence_seconds
            );

            loop {
                maintenance_ticker.tick().await;

                match self.sweep(Utc::now()).await {
                    Ok(sweep_report) => {
                        if sweep_report.expired_sessions > 0 || sweep_report.idle_work_blocks > 0 {
                            info!(
                                "💀 [SWEEPER_CLEANUP]: {} windows expired, {} blocks idled.",
                                sweep_report.expired_sessions, sweep_report.idle_work_blocks
                            );
                        }
                    }
                    Err(sweep_fault) => {
                        // Una pasada fallida no mata el daemon: la siguiente reintenta.
                        warn!("⚠️ [SWEEPER_FAULT]: Pass bypassed: {}", sweep_fault);
                    }
                }
            }
        });
    }
}
