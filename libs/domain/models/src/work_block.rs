// [libs/domain/models/src/work_block.rs]
/*!
 * =================================================================
 * APARATO: WORK BLOCK MODELS (V3.1 - IDLE GOVERNED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DEL BLOQUE DE TRABAJO CONTINUO POR PROYECTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE OPEN BLOCK: Por cada par (sesión, proyecto) existe a lo sumo
 *    un bloque con end_time = NULL en cualquier instante.
 * 2. IDLE CREDIT: Un bloque rotado por inactividad retiene el crédito del
 *    umbral de 5 minutos, pero jamás se extiende hacia el futuro.
 * 3. DERIVED DURATIONS: duration_seconds y duration_hours son funciones
 *    puras de (start_time, end_time), nunca contadores independientes.
 * =================================================================
 */

use crate::violations::ContractViolation;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Umbral de inactividad que dispara la rotación del bloque. Contractual.
pub const IDLE_THRESHOLD_SECONDS: i64 = 300;

/// Estados legales de un bloque de trabajo. Los terminales jamás se reabren.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkBlockState {
    /// Bloque abierto recibiendo actividad (end_time = NULL).
    Active,
    /// Cerrado por la barredora de mantenimiento al detectar inactividad.
    Idle,
    /// Cerrado por rotación de inactividad o fin de sesión.
    Finished,
    /// Cierre explícito ordenado por un actor externo.
    Closed,
}

impl WorkBlockState {
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkBlockState::Active => "active",
            WorkBlockState::Idle => "idle",
            WorkBlockState::Finished => "finished",
            WorkBlockState::Closed => "closed",
        }
    }

    pub fn parse_label(label: &str) -> Result<Self, ContractViolation> {
        match label {
            "active" => Ok(WorkBlockState::Active),
            "idle" => Ok(WorkBlockState::Idle),
            "finished" => Ok(WorkBlockState::Finished),
            "closed" => Ok(WorkBlockState::Closed),
            unknown_label => Err(ContractViolation::UnknownStateLabel(unknown_label.into())),
        }
    }
}

/// Período continuo de actividad dentro de una sesión, acotado a un proyecto.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkBlock {
    pub id: String,
    pub session_id: String,
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    /// NULL si y solo si state == Active.
    pub end_time: Option<DateTime<Utc>>,
    pub state: WorkBlockState,
    pub last_activity_time: DateTime<Utc>,
    pub activity_count: i64,
    /// floor((end - start).total_seconds), presente solo con end_time.
    pub duration_seconds: Option<i64>,
    /// (end - start) / 3600, presente solo con end_time.
    pub duration_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkBlock {
    /**
     * Abre un bloque fresco anclado al instante de la actividad disparadora.
     */
    pub fn open(session_identifier: &str, project_identifier: &str, anchor_instant: DateTime<Utc>) -> Self {
        Self {
            id: format!("blk_{}", Uuid::new_v4()),
            session_id: session_identifier.to_string(),
            project_id: project_identifier.to_string(),
            start_time: anchor_instant,
            end_time: None,
            state: WorkBlockState::Active,
            last_activity_time: anchor_instant,
            activity_count: 1,
            duration_seconds: None,
            duration_hours: None,
            created_at: anchor_instant,
            updated_at: anchor_instant,
        }
    }

    /// Predicado de rotación: más de 5 minutos sin actividad al instante t.
    pub fn is_idle_at(&self, probe_instant: DateTime<Utc>) -> bool {
        probe_instant - self.last_activity_time > Duration::seconds(IDLE_THRESHOLD_SECONDS)
    }

    /**
     * Instante de cierre para una rotación por inactividad: el bloque
     * retiene el crédito del umbral (last + 5min) sin extenderse más allá
     * del instante observado.
     */
    pub fn idle_closure_instant(&self, observed_instant: DateTime<Utc>) -> DateTime<Utc> {
        let credited_end = self.last_activity_time + Duration::seconds(IDLE_THRESHOLD_SECONDS);
        credited_end.min(observed_instant)
    }

    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.id.is_empty() || self.session_id.is_empty() || self.project_id.is_empty() {
            return Err(ContractViolation::EmptyIdentifier(
                "work_block.id / session_id / project_id".into(),
            ));
        }

        match (self.end_time, self.state) {
            (None, WorkBlockState::Active) => {}
            (Some(_), WorkBlockState::Active) | (None, _) => {
                return Err(ContractViolation::OpenStateIncoherent(format!(
                    "state={} end_time={:?}",
                    self.state.as_label(),
                    self.end_time
                )));
            }
            (Some(closure_instant), _) => {
                if self.last_activity_time > closure_instant {
                    return Err(ContractViolation::TimelineInversion(format!(
                        "last={} escapes closure {}",
                        self.last_activity_time, closure_instant
                    )));
                }
                let (expected_seconds, expected_hours) =
                    derive_block_durations(self.start_time, closure_instant);
                let seconds_coherent = self.duration_seconds == Some(expected_seconds);
                let hours_coherent = self
                    .duration_hours
                    .map(|hours| (hours - expected_hours).abs() < 1e-9)
                    .unwrap_or(false);
                if !seconds_coherent || !hours_coherent {
                    return Err(ContractViolation::DurationDerivationMismatch(format!(
                        "stored=({:?}, {:?}) derived=({}, {})",
                        self.duration_seconds, self.duration_hours, expected_seconds, expected_hours
                    )));
                }
            }
        }

        if self.last_activity_time < self.start_time {
            return Err(ContractViolation::TimelineInversion(format!(
                "last={} precedes start={}",
                self.last_activity_time, self.start_time
            )));
        }

        if self.activity_count < 1 {
            return Err(ContractViolation::ActivityCountUnderflow(self.activity_count));
        }

        Ok(())
    }
}

/**
 * Deriva las duraciones contractuales de un bloque cerrado.
 *
 * # Mathematical Proof (Derivation Law):
 * duration_seconds = floor((end - start).total_seconds);
 * duration_hours = (end - start) / 3600 con precisión de milisegundos.
 */
pub fn derive_block_durations(
    start_instant: DateTime<Utc>,
    end_instant: DateTime<Utc>,
) -> (i64, f64) {
    let elapsed = end_instant - start_instant;
    let derived_seconds = elapsed.num_seconds();
    let derived_hours = elapsed.num_milliseconds() as f64 / 3_600_000.0;
    (derived_seconds, derived_hours)
}
