// [libs/domain/models/src/project.rs]
/*!
 * =================================================================
 * APARATO: PROJECT IDENTITY MODELS (V2.1 - DETERMINISTIC)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: IDENTIDAD ESTABLE DE PROYECTOS Y NORMALIZACIÓN DE RUTAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DETERMINISTIC GENESIS: El identificador de un proyecto se deriva por
 *    digestión SHA-256 de (nombre, ruta normalizada), garantizando que
 *    resoluciones repetidas -- incluso tras reinicios -- converjan en la
 *    misma identidad física.
 * 2. PATH SOVEREIGNTY: Toda ruta entrante se normaliza a separadores '/'
 *    con resolución de segmentos '.' y '..' antes de tocar el Ledger.
 * 3. NOMINAL PURITY: Erradicación total de abreviaciones.
 *
 * # Mathematical Proof (Identity Stability):
 * Sea f(n, p) = "proj_" || hex(SHA256(n || 0x1F || p))[0..12]. La función
 * es pura y libre de estado de proceso, por lo que la identidad sobrevive
 * a reinicios y es resistente a colisiones dentro del espacio realista
 * de rutas de un sistema de archivos (2^48 prefijos).
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use typeshare::typeshare;

/// Longitud hexadecimal del prefijo de digestión usado como identidad.
const PROJECT_DIGEST_PREFIX_LENGTH: usize = 12;

/// Nombre de reserva cuando la ruta carece de segmentos nominales.
const ROOT_PROJECT_FALLBACK_NAME: &str = "Root Project";

/// Proyecto registrado en el Ledger Temporal. La ruta normalizada es única.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Identidad determinista derivada de (nombre, ruta).
    pub id: String,
    /// Nombre legible derivado del último segmento de la ruta.
    pub name: String,
    /// Ruta normalizada (separadores '/', sin '.' ni '..').
    pub path: String,
    /// Descripción opcional provista por estratos superiores.
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /**
     * Forja un proyecto nuevo a partir de una ruta YA normalizada.
     * La identidad y el nombre se derivan de forma determinista.
     */
    pub fn materialize(normalized_path: &str, now: DateTime<Utc>) -> Self {
        let derived_name = derive_project_name(normalized_path);
        Self {
            id: derive_project_identity(&derived_name, normalized_path),
            name: derived_name,
            path: normalized_path.to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/**
 * Normaliza una ruta de sistema de archivos a la forma canónica del Ledger.
 *
 * # Logic:
 * 1. Separadores '\\' -> '/'.
 * 2. Resolución de segmentos '.' (descarte) y '..' (ascenso).
 * 3. Colapso de separadores duplicados y de barras finales.
 */
pub fn normalize_project_path(raw_path: &str) -> String {
    let unified_separators = raw_path.replace('\\', "/");
    let is_absolute = unified_separators.starts_with('/');

    let mut resolved_segments: Vec<&str> = Vec::new();
    for segment in unified_separators.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                // Ascenso al padre; más allá de la raíz simplemente se ignora.
                resolved_segments.pop();
            }
            nominal_segment => resolved_segments.push(nominal_segment),
        }
    }

    let joined_body = resolved_segments.join("/");
    if is_absolute {
        format!("/{}", joined_body)
    } else if joined_body.is_empty() {
        ".".to_string()
    } else {
        joined_body
    }
}

/**
 * Deriva el nombre legible de un proyecto desde el último segmento no vacío
 * de su ruta: puntuación ('-', '_', '.') -> espacios, palabras en Title Case.
 */
pub fn derive_project_name(normalized_path: &str) -> String {
    let last_nominal_segment = normalized_path
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty() && *segment != ".");

    let Some(raw_segment) = last_nominal_segment else {
        return ROOT_PROJECT_FALLBACK_NAME.to_string();
    };

    let spaced = raw_segment.replace(['-', '_', '.'], " ");
    let title_cased: Vec<String> = spaced
        .split_whitespace()
        .map(|word| {
            let mut characters = word.chars();
            match characters.next() {
                Some(first_character) => {
                    first_character.to_uppercase().collect::<String>()
                        + &characters.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect();

    if title_cased.is_empty() {
        ROOT_PROJECT_FALLBACK_NAME.to_string()
    } else {
        title_cased.join(" ")
    }
}

/**
 * Computa la identidad determinista de un proyecto.
 *
 * # Performance: O(n) sobre la longitud de la ruta. Sin alocaciones de estado.
 */
pub fn derive_project_identity(project_name: &str, normalized_path: &str) -> String {
    let mut digest_engine = Sha256::new();
    digest_engine.update(project_name.as_bytes());
    digest_engine.update([0x1F]);
    digest_engine.update(normalized_path.as_bytes());
    let digest_output = digest_engine.finalize();

    format!(
        "proj_{}",
        &hex::encode(digest_output)[..PROJECT_DIGEST_PREFIX_LENGTH]
    )
}
