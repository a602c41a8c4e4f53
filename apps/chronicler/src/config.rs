// [apps/chronicler/src/config.rs]
/*!
 * =================================================================
 * APARATO: CHRONICLER RUNTIME CONFIGURATION (V3.0 - ENV SOVEREIGN)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L4)
 * RESPONSABILIDAD: CAPTURA TIPADA DEL ENTORNO OPERATIVO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONTRACT CONSTANTS: La longitud de sesión (5h) y el umbral de
 *    inactividad (5min) son contratos del dominio, NO configuración;
 *    viven en tempo-domain-models y aquí solo se consumen.
 * 2. DEADLINE MATRIX: Presupuestos temporales fijos por clase de
 *    operación (ingesta 10s, barridos 30s, lecturas 5s).
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use tempo_infra_db::{StoreTuning, DEFAULT_CANONICAL_TIMEZONE};

/// Presupuesto temporal de una ingesta individual (POST /activity).
pub const INGEST_DEADLINE_SECONDS: u64 = 10;

/// Presupuesto temporal de los barridos de mantenimiento.
pub const SWEEP_DEADLINE_SECONDS: u64 = 30;

/// Presupuesto temporal de las consultas de solo lectura.
pub const READ_DEADLINE_SECONDS: u64 = 5;

/// Configuración operativa capturada del entorno del proceso.
#[derive(Debug, Clone)]
pub struct ChroniclerConfig {
    pub database_connection_url: String,
    pub database_access_token: Option<String>,
    pub listening_network_port: u16,
    pub canonical_timezone: String,
    pub maximum_open_connections: usize,
    pub idle_warm_target: usize,
    /// Cadencia del daemon de barrido en segundos (0 = daemon apagado).
    pub sweep_interval_seconds: u64,
}

impl ChroniclerConfig {
    /**
     * Hidrata la configuración desde el espacio de nombres del proceso.
     * Los valores ausentes adoptan los defaults contractuales.
     */
    pub fn capture_from_environment() -> Self {
        let database_connection_url = std::env::var("TEMPO_DATABASE_URL")
            .unwrap_or_else(|_| "file:tempo_ledger.db".to_string());

        let database_access_token = std::env::var("TEMPO_DATABASE_AUTH_TOKEN").ok();

        let listening_network_port: u16 = std::env::var("TEMPO_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let canonical_timezone = std::env::var("TEMPO_CANONICAL_TIMEZONE")
            .unwrap_or_else(|_| DEFAULT_CANONICAL_TIMEZONE.to_string());

        let maximum_open_connections: usize = std::env::var("TEMPO_MAX_OPEN_CONNECTIONS")
            .unwrap_or_else(|_| "25".to_string())
            .parse()
            .unwrap_or(25);

        let idle_warm_target: usize = std::env::var("TEMPO_IDLE_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let sweep_interval_seconds: u64 = std::env::var("TEMPO_SWEEP_INTERVAL_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        Self {
            database_connection_url,
            database_access_token,
            listening_network_port,
            canonical_timezone,
            maximum_open_connections,
            idle_warm_target,
            sweep_interval_seconds,
        }
    }

    /// Proyección de los parámetros de persistencia hacia el Estrato L3.
    pub fn store_tuning(&self) -> StoreTuning {
        StoreTuning {
            maximum_open_connections: self.maximum_open_connections,
            idle_warm_target: self.idle_warm_target,
            canonical_timezone: self.canonical_timezone.clone(),
        }
    }
}
