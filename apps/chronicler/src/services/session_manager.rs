// [apps/chronicler/src/services/session_manager.rs]
/*!
 * =================================================================
 * APARATO: SESSION WINDOW MANAGER (V6.2 - TIME DERIVED GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: UNICIDAD DE LA VENTANA ACTIVA DE 5 HORAS POR OPERADOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TIME-DERIVED TRUTH: La pertenencia de una actividad a una ventana
 *    se decide SIEMPRE comparando instantes contra end_time; jamás se
 *    consulta una bandera cacheada.
 * 2. DUPLICATE EXORCISM: Ante el estado imposible de múltiples ventanas
 *    activas, sobrevive la suprema (orden total start/count/id) y el
 *    resto transiciona a 'expired_duplicate'.
 * 3. ERROR TRANSPARENCY: Los fallos del Ledger se propagan envueltos con
 *    contexto; las advertencias de limpieza se registran sin abortar.
 *
 * # Mathematical Proof (Bounded Convergence):
 * Cada vuelta del lazo de resolución reduce estrictamente el número de
 * ventanas etiquetadas 'active' del operador o retorna; con N ventanas
 * iniciales el lazo converge en a lo sumo N+1 vueltas.
 * =================================================================
 */

use crate::services::PipelineError;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;
use tempo_domain_models::{ContractViolation, Session, SessionState};
use tempo_infra_db::repositories::SessionRepository;
use tracing::{debug, info, instrument, warn};

/// Gestor de autoridad única sobre las ventanas de facturación.
pub struct SessionManager {
    session_repository: Arc<SessionRepository>,
}

impl SessionManager {
    pub fn new(session_repository: Arc<SessionRepository>) -> Self {
        Self { session_repository }
    }

    /**
     * Resuelve la ventana a la que pertenece una actividad del operador:
     * la crea si no existe, la extiende si sigue vigente, la rota si
     * expiró y exorciza duplicados si el Ledger quedó corrupto.
     *
     * # Errors:
     * - `PipelineError::Validation` ante un identificador vacío.
     * - `PipelineError::Store` ante fallos del Ledger (propagados intactos).
     */
    #[instrument(skip(self, activity_instant), fields(user = %user_identifier))]
    pub async fn get_or_create_session(
        &self,
        user_identifier: &str,
        activity_instant: DateTime<Utc>,
    ) -> Result<Session, PipelineError> {
        if user_identifier.trim().is_empty() {
            return Err(PipelineError::Validation(ContractViolation::EmptyIdentifier(
                "session.user_id".into(),
            )));
        }

        loop {
            let labeled_active_windows = self
                .session_repository
                .get_sessions_labeled_active(user_identifier)
                .await?;

            match labeled_active_windows.len() {
                // --- RAMA GÉNESIS: Ninguna ventana viva ---
                0 => {
                    let fresh_window = Session::open(user_identifier, activity_instant);
                    self.session_repository.create_session(&fresh_window).await?;
                    return Ok(fresh_window);
                }

                // --- RAMA NOMINAL: Exactamente una ventana viva ---
                1 => {
                    let sole_window = labeled_active_windows.into_iter().next()
                        .expect("INVARIANT: length checked above");
                    if let Some(resolved_window) = self
                        .absorb_or_expire(sole_window, activity_instant)
                        .await?
                    {
                        return Ok(resolved_window);
                    }
                    // La ventana expiró; la próxima vuelta cae en la rama génesis.
                }

                // --- RAMA DE CORRUPCIÓN: Estado imposible con duplicados ---
                duplicate_volume => {
                    warn!(
                        "⚠️ [DUPLICATE_WINDOWS]: Operator {} holds {} active windows. Initiating exorcism.",
                        user_identifier, duplicate_volume
                    );

                    let supreme_window = self
                        .exorcise_duplicates(labeled_active_windows, activity_instant)
                        .await?;

                    if let Some(resolved_window) = self
                        .absorb_or_expire(supreme_window, activity_instant)
                        .await?
                    {
                        return Ok(resolved_window);
                    }
                }
            }
        }
    }

    /**
     * Variante de solo lectura: retorna la ventana activa más reciente
     * del operador, o nada. Ante multiplicidad advierte sin escribir.
     */
    #[instrument(skip(self, probe_instant))]
    pub async fn get_active_session(
        &self,
        user_identifier: &str,
        probe_instant: DateTime<Utc>,
    ) -> Result<Option<Session>, PipelineError> {
        let live_windows = self
            .session_repository
            .get_active_sessions_by_user(user_identifier, probe_instant)
            .await?;

        if live_windows.len() > 1 {
            warn!(
                "⚠️ [READ_ONLY_DUPLICATES]: Operator {} holds {} live windows; reporting the supreme one.",
                user_identifier,
                live_windows.len()
            );
        }

        Ok(live_windows.into_iter().next())
    }

    /**
     * Sella como 'expired' toda ventana activa vencida. Idempotente.
     */
    pub async fn mark_expired_sessions(
        &self,
        sweep_instant: DateTime<Utc>,
    ) -> Result<u64, PipelineError> {
        Ok(self.session_repository.mark_expired_sessions(sweep_instant).await?)
    }

    // --- ESTRATO INTERNO DE RESOLUCIÓN ---

    /**
     * Absorbe la actividad en la ventana si sigue vigente; si el instante
     * escapó la frontera, la sella como 'expired' y retorna None.
     */
    async fn absorb_or_expire(
        &self,
        candidate_window: Session,
        activity_instant: DateTime<Utc>,
    ) -> Result<Option<Session>, PipelineError> {
        if activity_instant <= candidate_window.end_time {
            self.session_repository
                .record_session_activity(&candidate_window.id, activity_instant)
                .await?;

            let refreshed_window = self
                .session_repository
                .get_session(&candidate_window.id)
                .await?
                .ok_or_else(|| PipelineError::NotFound(format!("session {}", candidate_window.id)))?;

            debug!(
                "🪟 [WINDOW_ABSORB]: Activity folded into {} (count {}).",
                refreshed_window.id, refreshed_window.activity_count
            );
            return Ok(Some(refreshed_window));
        }

        info!(
            "⏳ [WINDOW_ROTATION]: Window {} outlived by activity at {}; sealing as expired.",
            candidate_window.id, activity_instant
        );
        self.session_repository
            .transition_session_state(&candidate_window.id, SessionState::Expired, activity_instant)
            .await?;
        Ok(None)
    }

    /**
     * Exorcismo de duplicados: conserva la ventana suprema según el orden
     * total (start_time, activity_count, id) y sella el resto como
     * 'expired_duplicate'. Los fallos por fila se registran sin abortar.
     */
    async fn exorcise_duplicates(
        &self,
        mut duplicate_windows: Vec<Session>,
        cleanup_instant: DateTime<Utc>,
    ) -> Result<Session, PipelineError> {
        duplicate_windows.sort_by(|left_window, right_window| {
            // Suprema primero: orden descendente del ranking de supremacía.
            match left_window.supremacy_ordering(right_window) {
                Ordering::Less => Ordering::Greater,
                Ordering::Greater => Ordering::Less,
                Ordering::Equal => Ordering::Equal,
            }
        });

        let mut windows_iterator = duplicate_windows.into_iter();
        let supreme_window = windows_iterator.next()
            .expect("INVARIANT: exorcism invoked with >= 2 windows");

        for defeated_window in windows_iterator {
            match self
                .session_repository
                .transition_session_state(
                    &defeated_window.id,
                    SessionState::ExpiredDuplicate,
                    cleanup_instant,
                )
                .await
            {
                Ok(()) => {
                    warn!(
                        "🧹 [DUPLICATE_SEALED]: Window {} demoted to expired_duplicate.",
                        defeated_window.id
                    );
                }
                Err(row_fault) => {
                    // La limpieza es higiene, no misión crítica: se registra y continúa.
                    warn!(
                        "⚠️ [DUPLICATE_SKIP]: Window {} bypass: {}",
                        defeated_window.id, row_fault
                    );
                }
            }
        }

        Ok(supreme_window)
    }
}
