use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Record of one cleanup run, written next to its backup copies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupManifest {
    pub session_id: String,

    /// When the cleanup started
    pub timestamp: DateTime<Utc>,

    pub files_removed: usize,
    pub bytes_freed: u64,

    /// Individual files that were processed
    pub items: Vec<ManifestItem>,

    pub errors: Vec<String>,
}

/// A single file entry in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestItem {
    /// Path before cleaning
    pub original_path: PathBuf,

    /// Copy inside the session, if the backup succeeded
    pub backup_path: Option<PathBuf>,

    pub size_bytes: u64,

    /// Category key
    pub category: String,

    /// Whether the original was removed
    pub removed: bool,

    pub error: Option<String>,
}

impl BackupManifest {
    pub const FILE_NAME: &'static str = "manifest.json";

    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
            files_removed: 0,
            bytes_freed: 0,
            items: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Add a processed item; only removals count toward the totals
    pub fn add_item(&mut self, item: ManifestItem) {
        if item.removed {
            self.bytes_freed += item.size_bytes;
            self.files_removed += 1;
        }
        if let Some(ref e) = item.error {
            self.errors.push(e.clone());
        }
        self.items.push(item);
    }

    /// Save manifest to `<session_root>/manifest.json`
    pub fn save(&self, session_root: &Path) -> Result<()> {
        let path = session_root.join(Self::FILE_NAME);
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
        Ok(())
    }

    pub fn load(session_root: &Path) -> Result<Self> {
        let path = session_root.join(Self::FILE_NAME);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    /// All sessions under `base` that carry a manifest, newest first
    pub fn list_sessions(base: &Path) -> Result<Vec<(PathBuf, BackupManifest)>> {
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in std::fs::read_dir(base)
            .with_context(|| format!("Failed to read backup dir: {}", base.display()))?
        {
            let entry = entry?;
            let root = entry.path();
            if root.join(Self::FILE_NAME).is_file() {
                if let Ok(manifest) = Self::load(&root) {
                    sessions.push((root, manifest));
                }
            }
        }

        sessions.sort_by(|a, b| {
            b.1.timestamp
                .cmp(&a.1.timestamp)
                .then_with(|| b.1.session_id.cmp(&a.1.session_id))
        });
        Ok(sessions)
    }
}
