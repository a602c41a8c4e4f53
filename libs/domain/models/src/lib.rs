// [libs/domain/models/src/lib.rs]

pub mod activity;
pub mod ingest;
pub mod project;
pub mod session;
pub mod snapshot;
pub mod user;
pub mod violations;
pub mod work_block;

pub use activity::{Activity, ActivitySource, ActivityType, ClaudeActivityPhase, ClaudeContext};
pub use ingest::IngestEvent;
pub use project::{derive_project_identity, derive_project_name, normalize_project_path, Project};
pub use session::{Session, SessionState, SESSION_WINDOW_HOURS};
pub use snapshot::{LegacyActivity, LegacySession, LegacySnapshot, LegacyWorkBlock};
pub use user::User;
pub use violations::ContractViolation;
pub use work_block::{derive_block_durations, WorkBlock, WorkBlockState, IDLE_THRESHOLD_SECONDS};
