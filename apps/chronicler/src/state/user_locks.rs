// [apps/chronicler/src/state/user_locks.rs]
/*!
 * =================================================================
 * APARATO: USER SERIALIZATION LOCK REGISTRY (V2.0 - RACE SHIELD)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L4)
 * RESPONSABILIDAD: SERIALIZACIÓN DE EVENTOS CONCURRENTES POR OPERADOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PER-USER FUNNEL: Dos eventos simultáneos del mismo operador jamás
 *    observan ambos "cero sesiones activas"; el segundo espera el candado.
 * 2. NO GLOBAL LOCK: Operadores distintos avanzan en paralelo sin
 *    contención cruzada.
 *
 * # Mathematical Proof (Race Window Closure):
 * Sea L(u) el mutex del operador u. El pipeline completo de un evento
 * (resolución de sesión -> bloque -> actividad) ocurre bajo L(u), por lo
 * que la propiedad "a lo sumo una sesión activa" se sostiene de forma
 * instantánea dentro del proceso y eventual entre procesos.
 * =================================================================
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Registro de candados de serialización por operador.
#[derive(Default)]
pub struct UserLockRegistry {
    lock_table: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Adquiere el candado del operador, forjándolo en su primera aparición.
     * El guard retornado serializa todo el pipeline del evento.
     */
    pub async fn acquire(&self, user_identifier: &str) -> OwnedMutexGuard<()> {
        let user_lock_cell = {
            let mut lock_table_guard = self
                .lock_table
                .lock()
                .expect("LOCK_POISONED: User lock registry inaccessible.");

            lock_table_guard
                .entry(user_identifier.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        user_lock_cell.lock_owned().await
    }
}
