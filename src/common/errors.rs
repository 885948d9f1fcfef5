use std::path::PathBuf;
use thiserror::Error;

use crate::cleaner::CleanupResult;

/// Typed errors for the public scan/clean surface.
///
/// Three tiers exist: validation errors are raised before any filesystem
/// access, per-item failures never show up here (they are collected into
/// `scan_errors` / `clean_errors`), and infrastructure failures abort the
/// remaining work while still handing back whatever was accomplished.
/// The binary wraps all of this in `anyhow` at the top level.
#[derive(Debug, Error)]
pub enum ReclaimError {
    /// Mutually exclusive or empty options
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Config values out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An exclude pattern failed to compile
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Cleanup was requested but the engine holds no report
    #[error("no scan report available, run a scan first")]
    NoReport,

    /// The backup root could not be created
    #[error("backup location unavailable at '{}': {source}", .path.display())]
    BackupUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cleanup stopped part way; `partial` holds what was done before the abort
    #[error(
        "cleanup aborted after removing {} of {} planned files: {reason}",
        .partial.files_removed,
        .partial.planned_files
    )]
    CleanupAborted {
        reason: String,
        partial: Box<CleanupResult>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReclaimError {
    /// True for errors raised before any work started
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ReclaimError::InvalidOptions(_)
                | ReclaimError::InvalidConfig(_)
                | ReclaimError::InvalidPattern { .. }
                | ReclaimError::NoReport
        )
    }

    /// The partial cleanup result carried by an aborted run
    pub fn partial_result(&self) -> Option<&CleanupResult> {
        match self {
            ReclaimError::CleanupAborted { partial, .. } => Some(partial),
            _ => None,
        }
    }
}
