pub mod backup;
pub mod engine;
pub mod manifest;
pub mod plan;

pub use backup::{restore_backup, BackupError, BackupSession, RestoreReport};
pub use engine::{clean, execute_plan, execute_with_session, reviewed_plan, CleanupResult};
pub use manifest::{BackupManifest, ManifestItem};
pub use plan::{build_plan, CleanOptions, CleanupPlan, PlannedItem};
