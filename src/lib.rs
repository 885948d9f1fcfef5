//! # Reclaim
//!
//! Finds reclaimable disk space and removes it under a safety policy.
//!
//! A scan walks a catalog of candidate roots (caches, logs, temp files,
//! downloads, photos) concurrently, classifies every regular file and asks
//! the [`SafetyPolicy`](common::safety::SafetyPolicy) whether it may be
//! deleted. Optional post-passes find byte-identical duplicates and flag
//! large or old files. The resulting [`ScanReport`] feeds a cleanup that
//! copies each file into a timestamped backup before removing it.
//!
//! ```no_run
//! use reclaim::{CleanOptions, Config, Engine, PathCatalog, ScanOptions, Category};
//!
//! # fn main() -> Result<(), reclaim::ReclaimError> {
//! let mut engine = Engine::new(Config::default())?;
//! engine.scan(&PathCatalog::for_current_os(), &ScanOptions::default())?;
//! let dry_run = engine.clean(&CleanOptions::new([Category::UserCache, Category::Temp]))?;
//! println!("would free {} bytes", dry_run.bytes_freed);
//! # Ok(())
//! # }
//! ```

pub mod advisor;
pub mod cleaner;
pub mod cli;
pub mod common;
pub mod duplicates;
pub mod engine;
pub mod scanner;

pub use advisor::{NoopAdvisor, SafetyAdvisor};
pub use cleaner::{CleanOptions, CleanupPlan, CleanupResult};
pub use common::config::Config;
pub use common::errors::ReclaimError;
pub use duplicates::DuplicateGroup;
pub use engine::Engine;
pub use scanner::{
    Category, FileRecord, FileType, PathCatalog, RiskLevel, ScanOptions, ScanReport,
};
