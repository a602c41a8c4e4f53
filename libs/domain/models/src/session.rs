// [libs/domain/models/src/session.rs]
/*!
 * =================================================================
 * APARATO: SESSION WINDOW MODELS (V3.0 - TIME DERIVED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE LA VENTANA DE FACTURACIÓN DE 5 HORAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TIME-DERIVED TRUTH: La "actividad" de una sesión jamás se cachea en
 *    un booleano; se recomputa siempre como (state == Active && t <= end).
 * 2. CONTRACT WINDOW: end_time = start_time + 5h es un invariante físico
 *    validado antes de cada cristalización en el Ledger.
 * 3. TIE-BREAK DETERMINISM: El orden de supervivencia ante duplicados es
 *    total y reproducible (start, count, id).
 *
 * # Mathematical Proof (Single Active Window):
 * Para todo operador u e instante t, el gestor de sesiones garantiza
 * |{s : s.user = u ∧ s.state = Active ∧ t <= s.end}| <= 1 tras cada
 * resolución, aplicando la limpieza de duplicados con el orden total
 * definido por 'supremacy_ordering'.
 * =================================================================
 */

use crate::violations::ContractViolation;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use typeshare::typeshare;
use uuid::Uuid;

/// Duración contractual de la ventana de facturación. No es configurable.
pub const SESSION_WINDOW_HOURS: i64 = 5;

/// Valor exacto exigido al campo derivado 'duration_hours'.
pub const SESSION_WINDOW_DURATION_HOURS: f64 = 5.0;

/// Estados legales de una sesión. Los estados terminales jamás se reabren.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// La ventana acepta actividad mientras now <= end_time.
    Active,
    /// El reloj superó end_time sin cierre explícito.
    Expired,
    /// Cierre explícito ordenado por un actor externo.
    Finished,
    /// Perdedora de una limpieza de duplicados (corrupción de datos).
    ExpiredDuplicate,
}

impl SessionState {
    /// Etiqueta persistida en la columna 'state' del Ledger.
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Expired => "expired",
            SessionState::Finished => "finished",
            SessionState::ExpiredDuplicate => "expired_duplicate",
        }
    }

    pub fn parse_label(label: &str) -> Result<Self, ContractViolation> {
        match label {
            "active" => Ok(SessionState::Active),
            "expired" => Ok(SessionState::Expired),
            "finished" => Ok(SessionState::Finished),
            "expired_duplicate" => Ok(SessionState::ExpiredDuplicate),
            unknown_label => Err(ContractViolation::UnknownStateLabel(unknown_label.into())),
        }
    }
}

/// Ventana de facturación de 5 horas anclada a la primera actividad
/// del operador tras un período sin sesión vigente.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    /// Siempre start_time + 5h, sin excepciones.
    pub end_time: DateTime<Utc>,
    pub state: SessionState,
    /// None representa el cero heredado de snapshots legacy.
    pub first_activity_time: Option<DateTime<Utc>>,
    pub last_activity_time: DateTime<Utc>,
    pub activity_count: i64,
    /// Campo derivado: contractualmente 5.0.
    pub duration_hours: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /**
     * Abre una ventana nueva anclada al instante de la actividad disparadora.
     */
    pub fn open(user_identifier: &str, anchor_instant: DateTime<Utc>) -> Self {
        Self {
            id: format!("sess_{}", Uuid::new_v4()),
            user_id: user_identifier.to_string(),
            start_time: anchor_instant,
            end_time: anchor_instant + Duration::hours(SESSION_WINDOW_HOURS),
            state: SessionState::Active,
            first_activity_time: Some(anchor_instant),
            last_activity_time: anchor_instant,
            activity_count: 1,
            duration_hours: SESSION_WINDOW_DURATION_HOURS,
            created_at: anchor_instant,
            updated_at: anchor_instant,
        }
    }

    /// Verdad derivada del tiempo: jamás un booleano cacheado.
    pub fn accepts_activity_at(&self, probe_instant: DateTime<Utc>) -> bool {
        self.state == SessionState::Active && probe_instant <= self.end_time
    }

    /**
     * Valida los invariantes contractuales antes de tocar la persistencia.
     *
     * # Errors:
     * Retorna la primera violación detectada; el llamador decide si la
     * operación completa debe abortar.
     */
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.id.is_empty() || self.user_id.is_empty() {
            return Err(ContractViolation::EmptyIdentifier(
                "session.id / session.user_id".into(),
            ));
        }

        if self.end_time - self.start_time != Duration::hours(SESSION_WINDOW_HOURS) {
            return Err(ContractViolation::SessionWindowBroken(format!(
                "end - start = {}s, expected {}h",
                (self.end_time - self.start_time).num_seconds(),
                SESSION_WINDOW_HOURS
            )));
        }

        if (self.duration_hours - SESSION_WINDOW_DURATION_HOURS).abs() > f64::EPSILON {
            return Err(ContractViolation::SessionWindowBroken(format!(
                "duration_hours = {}, expected {}",
                self.duration_hours, SESSION_WINDOW_DURATION_HOURS
            )));
        }

        if self.activity_count < 1 {
            return Err(ContractViolation::ActivityCountUnderflow(self.activity_count));
        }

        if let Some(first_activity) = self.first_activity_time {
            if first_activity < self.start_time || self.last_activity_time < first_activity {
                return Err(ContractViolation::TimelineInversion(format!(
                    "first={} last={} window=[{}, {}]",
                    first_activity, self.last_activity_time, self.start_time, self.end_time
                )));
            }
        }

        if self.last_activity_time > self.end_time {
            return Err(ContractViolation::TimelineInversion(format!(
                "last={} escapes window end {}",
                self.last_activity_time, self.end_time
            )));
        }

        Ok(())
    }

    /**
     * Orden total de supremacía ante duplicados activos:
     * start_time más tardío > mayor activity_count > id lexicográficamente mayor.
     * La sesión 'Greater' sobrevive; el resto transiciona a ExpiredDuplicate.
     */
    pub fn supremacy_ordering(&self, contender: &Session) -> Ordering {
        self.start_time
            .cmp(&contender.start_time)
            .then(self.activity_count.cmp(&contender.activity_count))
            .then(self.id.cmp(&contender.id))
    }
}
