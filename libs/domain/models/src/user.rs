// [libs/domain/models/src/user.rs]

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Operador registrado en el Ledger Temporal. Se crea bajo demanda
/// al observar su primera actividad y nunca se elimina desde el núcleo.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Identificador soberano del operador (provisto por el cliente de ingesta).
    pub id: String,
    /// Alias legible para el Dashboard.
    pub username: String,
}

impl User {
    /// Forja el registro mínimo de un operador visto por primera vez.
    pub fn first_seen(user_identifier: &str) -> Self {
        Self {
            id: user_identifier.to_string(),
            username: user_identifier.to_string(),
        }
    }
}
