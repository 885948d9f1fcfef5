use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::warn;

use crate::common::errors::ReclaimError;
use crate::scanner::records::{Category, ScanReport};

/// How a cleanup should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOptions {
    pub enabled_categories: BTreeSet<Category>,
    /// Report what would happen without touching the filesystem
    pub safe_mode: bool,
    /// Copy every file into a backup session before removing it
    pub backup_enabled: bool,
    pub show_progress: bool,
}

impl CleanOptions {
    /// Safe mode with backups, for the given categories
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            enabled_categories: categories.into_iter().collect(),
            safe_mode: true,
            backup_enabled: true,
            show_progress: false,
        }
    }

    pub fn validate(&self) -> Result<(), ReclaimError> {
        if self.enabled_categories.is_empty() {
            return Err(ReclaimError::InvalidOptions(
                "at least one category must be enabled for cleanup".into(),
            ));
        }
        Ok(())
    }
}

/// One file scheduled for removal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedItem {
    pub path: PathBuf,
    pub size: u64,
    pub category: Category,
    pub modified: DateTime<Utc>,
}

/// The files a cleanup will act on, fixed before execution starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupPlan {
    pub items: Vec<PlannedItem>,
    pub total_bytes: u64,
    pub safe_mode: bool,
    pub backup_enabled: bool,
}

impl CleanupPlan {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop the given paths from the plan, returning how many were removed
    pub fn remove_paths(&mut self, paths: &[PathBuf]) -> usize {
        let vetoed: HashSet<&PathBuf> = paths.iter().collect();
        let before = self.items.len();
        self.items.retain(|i| !vetoed.contains(&i.path));
        self.total_bytes = self.items.iter().map(|i| i.size).sum();
        before - self.items.len()
    }
}

/// Select every deletable record in an enabled category
pub fn build_plan(report: &ScanReport, options: &CleanOptions) -> Result<CleanupPlan, ReclaimError> {
    options.validate()?;

    for tag in [Category::LargeFile, Category::OldFile] {
        if options.enabled_categories.contains(&tag) {
            warn!(
                "'{}' is a report tag, not a discovery category; it selects no files",
                tag.key()
            );
        }
    }

    let items: Vec<PlannedItem> = report
        .records
        .iter()
        .filter(|r| r.safe_to_delete && options.enabled_categories.contains(&r.category))
        .map(|r| PlannedItem {
            path: r.path.clone(),
            size: r.size,
            category: r.category,
            modified: r.modified,
        })
        .collect();

    Ok(CleanupPlan {
        total_bytes: items.iter().map(|i| i.size).sum(),
        items,
        safe_mode: options.safe_mode,
        backup_enabled: options.backup_enabled,
    })
}
