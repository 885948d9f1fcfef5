use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, warn};

use super::backup::{BackupError, BackupSession};
use super::manifest::{BackupManifest, ManifestItem};
use super::plan::{build_plan, CleanOptions, CleanupPlan, PlannedItem};
use crate::advisor::SafetyAdvisor;
use crate::common::config::Config;
use crate::common::errors::ReclaimError;
use crate::common::safety;
use crate::common::{format, progress};
use crate::scanner::records::ScanReport;

/// Report from a clean operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanupResult {
    pub safe_mode: bool,
    pub planned_files: usize,
    pub planned_bytes: u64,
    /// Always zero in safe mode
    pub files_removed: usize,
    /// In safe mode, the bytes that would have been freed
    pub bytes_freed: u64,
    pub files_backed_up: usize,
    pub backup_path: Option<PathBuf>,
    pub clean_errors: Vec<String>,
    pub duration_secs: f64,
}

impl CleanupResult {
    fn for_plan(plan: &CleanupPlan) -> Self {
        Self {
            safe_mode: plan.safe_mode,
            planned_files: plan.len(),
            planned_bytes: plan.total_bytes,
            ..Default::default()
        }
    }
}

/// Clean the deletable files of a report.
///
/// The report is consumed: once a cleanup has acted on it, its records no
/// longer describe the filesystem.
pub fn clean(
    report: ScanReport,
    options: &CleanOptions,
    config: &Config,
    advisor: &dyn SafetyAdvisor,
) -> Result<CleanupResult, ReclaimError> {
    let plan = reviewed_plan(&report, options, advisor)?;
    drop(report);

    info!(
        files = plan.len(),
        bytes = plan.total_bytes,
        safe_mode = plan.safe_mode,
        backup = plan.backup_enabled,
        "starting cleanup"
    );
    execute_plan(&plan, config, options.show_progress)
}

/// Build the plan for a report and drop whatever the advisor vetoes.
/// This is exactly the set of files a cleanup with `options` would act on.
pub fn reviewed_plan(
    report: &ScanReport,
    options: &CleanOptions,
    advisor: &dyn SafetyAdvisor,
) -> Result<CleanupPlan, ReclaimError> {
    let mut plan = build_plan(report, options)?;
    let vetoed = advisor.review_plan(&plan);
    if !vetoed.is_empty() {
        let removed = plan.remove_paths(&vetoed);
        info!(advisor = advisor.name(), removed, "advisor vetoed plan entries");
    }
    Ok(plan)
}

/// Run a plan, creating a backup session under `config.backup_base()` when
/// the plan asks for backups
pub fn execute_plan(
    plan: &CleanupPlan,
    config: &Config,
    show_progress: bool,
) -> Result<CleanupResult, ReclaimError> {
    let start = Instant::now();

    if plan.safe_mode {
        let mut result = CleanupResult::for_plan(plan);
        result.bytes_freed = plan.total_bytes;
        result.duration_secs = start.elapsed().as_secs_f64();
        return Ok(result);
    }

    let session = if plan.backup_enabled && !plan.is_empty() {
        match BackupSession::create(&config.backup_base()) {
            Ok(s) => Some(s.with_limit(config.max_backup_bytes())),
            Err(e) => {
                let mut partial = CleanupResult::for_plan(plan);
                partial.duration_secs = start.elapsed().as_secs_f64();
                return Err(ReclaimError::CleanupAborted {
                    reason: e.to_string(),
                    partial: Box::new(partial),
                });
            }
        }
    } else {
        None
    };

    execute_with_session(plan, session.as_ref(), show_progress)
}

enum ItemOutcome {
    Removed { backup: Option<PathBuf> },
    Failed { error: String, backup: Option<PathBuf> },
    /// Backup location vanished; the run stops
    Aborted(String),
    /// Not attempted because the run was already stopping
    NotAttempted,
}

/// Execute a plan against an existing backup session (or none).
///
/// A plan that asks for backups needs a session; without one the call is
/// rejected before any file is touched. Files are processed concurrently. For each file the backup copy, if any,
/// completes before the original is removed, and a failed copy keeps the
/// original in place. Per-file failures are collected; losing the backup
/// location stops the run and returns the partial result inside the error.
pub fn execute_with_session(
    plan: &CleanupPlan,
    session: Option<&BackupSession>,
    show_progress: bool,
) -> Result<CleanupResult, ReclaimError> {
    let start = Instant::now();
    let mut result = CleanupResult::for_plan(plan);
    result.backup_path = session.map(|s| s.root.clone());

    if plan.safe_mode {
        result.bytes_freed = plan.total_bytes;
        result.duration_secs = start.elapsed().as_secs_f64();
        return Ok(result);
    }
    if plan.backup_enabled && session.is_none() && !plan.is_empty() {
        return Err(ReclaimError::InvalidOptions(
            "plan requires backups but no backup session was provided".into(),
        ));
    }

    let abort = AtomicBool::new(false);
    let pb = progress::make_progress(show_progress, plan.len() as u64, "Cleaning...");

    let outcomes: Vec<ItemOutcome> = plan
        .items
        .par_iter()
        .map(|item| {
            let outcome = process_item(item, session, &abort);
            if let Some(ref pb) = pb {
                pb.set_message(format::short_path(&item.path, 40));
                pb.inc(1);
            }
            outcome
        })
        .collect();
    progress::clear(pb);

    let mut manifest = session.map(|s| BackupManifest::new(&s.id));
    let mut abort_reason = None;

    for (item, outcome) in plan.items.iter().zip(outcomes) {
        let (removed, backup, error) = match outcome {
            ItemOutcome::Removed { backup } => (true, backup, None),
            ItemOutcome::Failed { error, backup } => (false, backup, Some(error)),
            ItemOutcome::Aborted(reason) => {
                abort_reason.get_or_insert(reason);
                continue;
            }
            ItemOutcome::NotAttempted => continue,
        };

        if removed {
            result.files_removed += 1;
            result.bytes_freed += item.size;
        }
        if backup.is_some() {
            result.files_backed_up += 1;
        }
        if let Some(ref e) = error {
            warn!("{}", e);
            result.clean_errors.push(e.clone());
        }
        if let Some(ref mut manifest) = manifest {
            manifest.add_item(ManifestItem {
                original_path: item.path.clone(),
                backup_path: backup,
                size_bytes: item.size,
                category: item.category.key().to_string(),
                removed,
                error,
            });
        }
    }

    if let (Some(session), Some(manifest)) = (session, manifest) {
        if let Err(e) = save_manifest(session, &manifest) {
            result.clean_errors.push(format!("{:#}", e));
        }
    }

    result.duration_secs = start.elapsed().as_secs_f64();
    info!(
        removed = result.files_removed,
        freed = result.bytes_freed,
        errors = result.clean_errors.len(),
        "cleanup finished"
    );

    match abort_reason {
        Some(reason) => Err(ReclaimError::CleanupAborted {
            reason,
            partial: Box::new(result),
        }),
        None => Ok(result),
    }
}

fn save_manifest(session: &BackupSession, manifest: &BackupManifest) -> Result<()> {
    if !session.root.is_dir() {
        anyhow::bail!("Backup session missing, manifest not written: {}", session.root.display());
    }
    manifest
        .save(&session.root)
        .context("Failed to save cleanup manifest")
}

fn process_item(
    item: &PlannedItem,
    session: Option<&BackupSession>,
    abort: &AtomicBool,
) -> ItemOutcome {
    if abort.load(Ordering::SeqCst) {
        return ItemOutcome::NotAttempted;
    }
    if let Some(session) = session {
        if !session.is_available() {
            abort.store(true, Ordering::SeqCst);
            return ItemOutcome::Aborted(format!(
                "backup location disappeared: {}",
                session.root.display()
            ));
        }
    }

    if let Err(error) = verify_unchanged(item) {
        return ItemOutcome::Failed {
            error,
            backup: None,
        };
    }

    let backup = match session {
        Some(session) => match session.back_up(&item.path, item.size) {
            Ok(copy) => Some(copy),
            Err(BackupError::SessionGone(root)) => {
                abort.store(true, Ordering::SeqCst);
                return ItemOutcome::Aborted(format!(
                    "backup location disappeared: {}",
                    root.display()
                ));
            }
            Err(e) => {
                return ItemOutcome::Failed {
                    error: format!("Backup failed, kept '{}': {:#}", item.path.display(), e),
                    backup: None,
                }
            }
        },
        None => None,
    };

    match std::fs::remove_file(&item.path) {
        Ok(()) => ItemOutcome::Removed { backup },
        Err(e) => ItemOutcome::Failed {
            error: format!("Failed to remove '{}': {}", item.path.display(), e),
            backup,
        },
    }
}

/// The file must still be the regular file the scan saw
fn verify_unchanged(item: &PlannedItem) -> std::result::Result<(), String> {
    let path: &Path = &item.path;
    if safety::is_critical_path(path) {
        return Err(format!("Refusing to remove protected path: {}", path.display()));
    }
    let meta = std::fs::symlink_metadata(path)
        .map_err(|e| format!("Skipped '{}': {}", path.display(), e))?;
    if !meta.is_file() {
        return Err(format!("Skipped '{}': no longer a regular file", path.display()));
    }
    if meta.len() != item.size {
        return Err(format!(
            "Skipped '{}': size changed since scan ({} -> {})",
            path.display(),
            format::format_size(item.size),
            format::format_size(meta.len())
        ));
    }
    Ok(())
}
