// [libs/infra/db/src/timezone.rs]
/*!
 * =================================================================
 * APARATO: CANONICAL CLOCK (V2.0 - INSTANT BASED)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: NORMALIZACIÓN HORARIA CANÓNICA DEL LEDGER TEMPORAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE ZONE TRUTH: Todo instante persistido se renderiza RFC 3339
 *    en la zona canónica configurada (default America/Montevideo) y se
 *    reconstruye como instante UTC en la lectura.
 * 2. INSTANT COMPARISONS: Las comparaciones temporales son siempre entre
 *    instantes físicos, jamás entre cadenas de reloj de pared; los
 *    predicados SQL envuelven ambos operandos en datetime().
 * 3. DST RESILIENCE: La zona IANA absorbe los saltos de horario de
 *    verano sin alterar el instante físico almacenado.
 *
 * # Mathematical Proof (Normalization Bijectivity):
 * Sea g(t) = rfc3339(t, zona) y h(s) = instante(parse(s)). Para todo
 * instante t con precisión de milisegundos, h(g(t)) = t: el cambio de
 * zona es una biyección sobre la recta temporal física.
 * =================================================================
 */

use crate::errors::DbError;
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Zona horaria canónica por defecto del Ledger Temporal.
pub const DEFAULT_CANONICAL_TIMEZONE: &str = "America/Montevideo";

/// Reloj canónico: dueño único de la zona de normalización del Ledger.
#[derive(Debug, Clone)]
pub struct CanonicalClock {
    canonical_zone: Tz,
}

impl CanonicalClock {
    /**
     * Construye el reloj anclado a una zona IANA nominal.
     *
     * # Errors:
     * - `DbError::ConfigurationError` si la etiqueta de zona es ilegal.
     */
    pub fn new(zone_identifier: &str) -> Result<Self, DbError> {
        let canonical_zone = Tz::from_str(zone_identifier).map_err(|_| {
            DbError::ConfigurationError(format!(
                "ILLEGAL_TIMEZONE_LABEL: '{}' is not a recognized IANA zone",
                zone_identifier
            ))
        })?;
        Ok(Self { canonical_zone })
    }

    /// Reloj con la zona contractual por defecto.
    pub fn montevideo() -> Self {
        Self {
            canonical_zone: chrono_tz::America::Montevideo,
        }
    }

    pub fn zone_label(&self) -> String {
        self.canonical_zone.name().to_string()
    }

    /// Instante presente, listo para anclar eventos sin marca temporal.
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /**
     * Renderiza un instante para su cristalización en el Ledger:
     * RFC 3339 con precisión de milisegundos en la zona canónica.
     */
    pub fn to_storage(&self, physical_instant: DateTime<Utc>) -> String {
        physical_instant
            .with_timezone(&self.canonical_zone)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /**
     * Reconstruye el instante físico desde su forma persistida.
     *
     * # Errors:
     * - `DbError::MappingError` si la cadena no es RFC 3339 legal.
     */
    pub fn parse_storage(&self, stored_representation: &str) -> Result<DateTime<Utc>, DbError> {
        DateTime::parse_from_rfc3339(stored_representation)
            .map(|zoned_instant| zoned_instant.with_timezone(&Utc))
            .map_err(|parse_fault| {
                DbError::MappingError(format!(
                    "TEMPORAL_DECODE_FAULT: '{}' -> {}",
                    stored_representation, parse_fault
                ))
            })
    }

    /// Variante tolerante para columnas anulables.
    pub fn parse_optional_storage(
        &self,
        stored_representation: Option<String>,
    ) -> Result<Option<DateTime<Utc>>, DbError> {
        stored_representation
            .map(|representation| self.parse_storage(&representation))
            .transpose()
    }
}
