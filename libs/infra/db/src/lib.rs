// [libs/infra/db/src/lib.rs]

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;
pub mod timezone;

pub use client::{ConnectionLease, LedgerHealthReport, StoreClient, StoreTuning};
pub use errors::DbError;
pub use timezone::{CanonicalClock, DEFAULT_CANONICAL_TIMEZONE};
