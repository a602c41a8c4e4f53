// [apps/chronicler/src/lib.rs]

pub mod config;
pub mod handlers;
pub mod kernel;
pub mod routes;
pub mod services;
pub mod state;

/// Superficie nominal de arranque para los binarios del Chronicler.
pub mod prelude {
    pub use crate::config::ChroniclerConfig;
    pub use crate::kernel::ChroniclerKernel;
    pub use crate::routes::create_ledger_router;
    pub use crate::state::AppState;
}
