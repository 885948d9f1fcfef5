use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use super::manifest::BackupManifest;
use crate::common::errors::ReclaimError;
use crate::common::{format, progress};

/// Why a single file could not be backed up
#[derive(Debug, Error)]
pub enum BackupError {
    /// The session directory is gone; nothing more can be backed up
    #[error("backup location disappeared: {}", .0.display())]
    SessionGone(PathBuf),

    /// Copying this file would push the session past its size cap
    #[error("backup size limit of {limit} bytes reached")]
    LimitReached { limit: u64 },

    #[error(transparent)]
    Copy(#[from] anyhow::Error),
}

/// One timestamped backup location for a single cleanup run.
///
/// Files are copied under `<root>/files/` at their original absolute path,
/// so `/var/cache/app/x` lands at `<root>/files/var/cache/app/x`.
#[derive(Debug)]
pub struct BackupSession {
    pub id: String,
    pub root: PathBuf,
    /// Total bytes this session may hold; `None` for no cap
    limit: Option<u64>,
    used: AtomicU64,
}

impl BackupSession {
    /// Create `<base>/<timestamp>-<suffix>/files`
    pub fn create(base: &Path) -> Result<Self, ReclaimError> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let id = format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S"), &suffix[..8]);
        let root = base.join(&id);
        let session = Self {
            id,
            root,
            limit: None,
            used: AtomicU64::new(0),
        };

        let files_dir = session.files_dir();
        std::fs::create_dir_all(&files_dir).map_err(|source| ReclaimError::BackupUnavailable {
            path: files_dir,
            source,
        })?;
        Ok(session)
    }

    /// Cap the bytes copied into this session
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }

    /// Still present on disk
    pub fn is_available(&self) -> bool {
        self.files_dir().is_dir()
    }

    /// Bytes copied so far
    pub fn used_bytes(&self) -> u64 {
        self.used.load(Ordering::SeqCst)
    }

    /// Where `original` is stored inside this session
    pub fn backup_path_for(&self, original: &Path) -> PathBuf {
        self.files_dir().join(mirrored_relative(original))
    }

    /// Copy `original` into the session and verify the copy's length.
    ///
    /// Only directories below `files/` are created; a vanished session is
    /// reported as [`BackupError::SessionGone`] rather than rebuilt.
    pub fn back_up(&self, original: &Path, size: u64) -> Result<PathBuf, BackupError> {
        if !self.is_available() {
            return Err(BackupError::SessionGone(self.root.clone()));
        }
        self.reserve(size)?;

        let copied = self.copy_into(original);
        if copied.is_err() {
            self.used.fetch_sub(size, Ordering::SeqCst);
        }
        Ok(copied?)
    }

    fn reserve(&self, size: u64) -> Result<(), BackupError> {
        let Some(limit) = self.limit else {
            self.used.fetch_add(size, Ordering::SeqCst);
            return Ok(());
        };
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(size).filter(|total| *total <= limit)
            })
            .map(|_| ())
            .map_err(|_| BackupError::LimitReached { limit })
    }

    fn copy_into(&self, original: &Path) -> Result<PathBuf> {
        let target = self.backup_path_for(original);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create backup dir: {}", parent.display()))?;
        }
        let copied = std::fs::copy(original, &target).with_context(|| {
            format!(
                "Failed to copy '{}' to '{}'",
                original.display(),
                target.display()
            )
        })?;
        let expected = std::fs::metadata(original)
            .with_context(|| format!("Failed to stat {}", original.display()))?
            .len();
        if copied != expected {
            anyhow::bail!(
                "Backup of '{}' is incomplete ({} of {} bytes)",
                original.display(),
                copied,
                expected
            );
        }
        Ok(target)
    }
}

/// Turn an absolute path into a relative one that keeps every component.
/// Drive prefixes become a plain directory (`C:` -> `C`).
pub fn mirrored_relative(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                let drive = prefix.as_os_str().to_string_lossy().replace([':', '\\', '?'], "");
                if !drive.is_empty() {
                    out.push(drive);
                }
            }
            Component::Normal(part) => out.push(part),
            Component::RootDir | Component::CurDir | Component::ParentDir => {}
        }
    }
    out
}

/// Report from a restore operation
#[derive(Debug, Default, Serialize)]
pub struct RestoreReport {
    pub session_id: String,
    pub restored_count: usize,
    pub restored_bytes: u64,
    pub errors: Vec<String>,
}

/// Copy every removed file of a backup session back to where it came from.
/// Nothing that already exists at the original path is overwritten and the
/// backup itself is left in place.
pub fn restore_backup(session_root: &Path, show_progress: bool) -> Result<RestoreReport> {
    let manifest = BackupManifest::load(session_root)?;
    let restorable: Vec<_> = manifest
        .items
        .iter()
        .filter(|i| i.removed)
        .filter_map(|i| i.backup_path.as_ref().map(|b| (i, b)))
        .collect();

    if restorable.is_empty() {
        anyhow::bail!("No restorable items in backup '{}'", manifest.session_id);
    }

    let pb = progress::make_progress(show_progress, restorable.len() as u64, "Restoring...");
    let mut report = RestoreReport {
        session_id: manifest.session_id.clone(),
        ..Default::default()
    };

    for (item, backup_path) in restorable {
        if let Some(ref pb) = pb {
            pb.set_message(format::short_path(&item.original_path, 40));
        }
        match restore_single_path(backup_path, &item.original_path) {
            Ok(()) => {
                report.restored_count += 1;
                report.restored_bytes += item.size_bytes;
            }
            Err(e) => report.errors.push(format!(
                "Failed to restore '{}': {:#}",
                item.original_path.display(),
                e
            )),
        }
        progress::inc(&pb);
    }

    progress::clear(pb);
    Ok(report)
}

fn restore_single_path(backup: &Path, original: &Path) -> Result<()> {
    if !backup.is_file() {
        anyhow::bail!("Backup copy no longer exists: {}", backup.display());
    }
    if original.exists() {
        anyhow::bail!(
            "Original path already exists (won't overwrite): {}",
            original.display()
        );
    }
    if let Some(parent) = original.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent dir: {}", parent.display()))?;
    }
    std::fs::copy(backup, original)
        .with_context(|| format!("Failed to copy back to {}", original.display()))?;
    Ok(())
}
