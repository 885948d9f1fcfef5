use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::errors::ReclaimError;
use crate::scanner::records::Category;

/// Scanner and cleaner configuration.
///
/// Passed by reference into every component; nothing reads a global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Files younger than this are never deletable
    #[serde(default = "default_min_file_age_hours")]
    pub min_file_age_hours: u64,

    /// Substrings that protect a path from deletion.
    /// Older config files call this `whitelist_paths`.
    #[serde(default = "default_protected_paths", alias = "whitelist_paths")]
    pub protected_paths: Vec<String>,

    /// Substrings that forbid deletion outright
    #[serde(default = "default_blacklist_paths")]
    pub blacklist_paths: Vec<String>,

    /// Glob patterns skipped during traversal and refused at cleanup
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Lowercase substrings that mark a path as high risk
    #[serde(default = "default_high_risk_patterns")]
    pub high_risk_patterns: Vec<String>,

    /// Lowercase substrings that mark a path as medium risk
    #[serde(default = "default_medium_risk_patterns")]
    pub medium_risk_patterns: Vec<String>,

    /// Minimum number of path components for a system cache file to be deletable
    #[serde(default = "default_system_cache_min_depth")]
    pub system_cache_min_depth: usize,

    /// Large file threshold in MB
    #[serde(default = "default_large_file_mb")]
    pub large_file_threshold_mb: u64,

    /// Files not modified for this many days are reported as old
    #[serde(default = "default_old_file_days")]
    pub old_file_days: u32,

    /// Files at or below this size are ignored by duplicate detection
    #[serde(default = "default_duplicate_min_size")]
    pub duplicate_min_size: u64,

    /// Wall-clock budget for one scan, in seconds
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,

    /// Number of roots walked concurrently
    #[serde(default = "default_max_parallel_roots")]
    pub max_parallel_roots: usize,

    /// Depth limit for detailed scans
    #[serde(default = "default_max_scan_depth")]
    pub max_scan_depth: usize,

    /// Walk system cache roots
    #[serde(default = "default_true")]
    pub include_system_caches: bool,

    #[serde(default = "default_true")]
    pub include_user_caches: bool,

    #[serde(default = "default_true")]
    pub include_application_caches: bool,

    #[serde(default = "default_true")]
    pub include_browser_caches: bool,

    #[serde(default = "default_true")]
    pub include_logs: bool,

    #[serde(default = "default_true")]
    pub include_temp_files: bool,

    /// Most data one backup session may hold, in MB. 0 lifts the cap.
    #[serde(default = "default_max_backup_size_mb")]
    pub max_backup_size_mb: u64,

    /// Where backup sessions are written (defaults to ~/.reclaim/backups)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
}

fn default_min_file_age_hours() -> u64 {
    24
}
fn default_protected_paths() -> Vec<String> {
    ["/Applications/", "/Documents/", "/Desktop/", "/.ssh/", "/.gnupg/"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_blacklist_paths() -> Vec<String> {
    ["/System/Library/", "/bin/", "/sbin/", "/usr/bin/", "/usr/sbin/", "/etc/"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_exclude_patterns() -> Vec<String> {
    ["*.important", "backup/*", "*.backup", "*.bak"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_high_risk_patterns() -> Vec<String> {
    [
        "/system/",
        "/system32/",
        "/syswow64/",
        "/windows/",
        "/program files",
        "/bin/",
        "/sbin/",
        "/usr/bin/",
        "/usr/sbin/",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_medium_risk_patterns() -> Vec<String> {
    ["application support", "preferences", "settings", "appdata", "/local/", "roaming"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_system_cache_min_depth() -> usize {
    3
}
fn default_large_file_mb() -> u64 {
    10
}
fn default_old_file_days() -> u32 {
    90
}
fn default_duplicate_min_size() -> u64 {
    1024
}
fn default_scan_timeout_secs() -> u64 {
    300
}
fn default_max_parallel_roots() -> usize {
    4
}
fn default_max_scan_depth() -> usize {
    10
}
fn default_true() -> bool {
    true
}
fn default_max_backup_size_mb() -> u64 {
    1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_file_age_hours: default_min_file_age_hours(),
            protected_paths: default_protected_paths(),
            blacklist_paths: default_blacklist_paths(),
            exclude_patterns: default_exclude_patterns(),
            high_risk_patterns: default_high_risk_patterns(),
            medium_risk_patterns: default_medium_risk_patterns(),
            system_cache_min_depth: default_system_cache_min_depth(),
            large_file_threshold_mb: default_large_file_mb(),
            old_file_days: default_old_file_days(),
            duplicate_min_size: default_duplicate_min_size(),
            scan_timeout_secs: default_scan_timeout_secs(),
            max_parallel_roots: default_max_parallel_roots(),
            max_scan_depth: default_max_scan_depth(),
            include_system_caches: true,
            include_user_caches: true,
            include_application_caches: true,
            include_browser_caches: true,
            include_logs: true,
            include_temp_files: true,
            max_backup_size_mb: default_max_backup_size_mb(),
            backup_dir: None,
        }
    }
}

impl Config {
    /// Get the data directory (~/.reclaim)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".reclaim")
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Directory under which backup sessions are created
    pub fn backup_base(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("backups"))
    }

    /// Load config from the default location, or defaults if it does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Reject out-of-range values and uncompilable patterns
    pub fn validate(&self) -> Result<(), ReclaimError> {
        if self.max_parallel_roots == 0 {
            return Err(ReclaimError::InvalidConfig(
                "max_parallel_roots must be at least 1".into(),
            ));
        }
        if self.max_scan_depth == 0 {
            return Err(ReclaimError::InvalidConfig(
                "max_scan_depth must be at least 1".into(),
            ));
        }
        if self.scan_timeout_secs == 0 {
            return Err(ReclaimError::InvalidConfig(
                "scan_timeout_secs must be greater than zero".into(),
            ));
        }
        self.exclude_globs()?;
        Ok(())
    }

    /// Compile `exclude_patterns`
    pub fn exclude_globs(&self) -> Result<Vec<glob::Pattern>, ReclaimError> {
        self.exclude_patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|source| ReclaimError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Get large file threshold in bytes
    pub fn large_file_threshold_bytes(&self) -> u64 {
        self.large_file_threshold_mb * 1024 * 1024
    }

    /// Per-category scan switch. Categories without a switch are governed
    /// by scan options alone.
    pub fn includes(&self, category: Category) -> bool {
        match category {
            Category::SystemCache => self.include_system_caches,
            Category::UserCache => self.include_user_caches,
            Category::ApplicationCache => self.include_application_caches,
            Category::BrowserCache => self.include_browser_caches,
            Category::Log => self.include_logs,
            Category::Temp => self.include_temp_files,
            _ => true,
        }
    }

    pub fn max_backup_bytes(&self) -> Option<u64> {
        (self.max_backup_size_mb > 0).then(|| self.max_backup_size_mb * 1024 * 1024)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "min_file_age_hours = 2\nwhitelist_paths = [\"/keep/\"]\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.min_file_age_hours, 2);
        assert_eq!(config.protected_paths, vec!["/keep/".to_string()]);
        assert_eq!(config.old_file_days, 90);
        assert_eq!(config.exclude_patterns.len(), 4);
        assert!(config.include_logs);
        assert_eq!(config.max_backup_size_mb, 1024);
    }

    #[test]
    fn test_category_switches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "include_logs = false\nmax_backup_size_mb = 0\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.includes(Category::Log));
        assert!(config.includes(Category::Temp));
        assert!(config.includes(Category::Photo));
        assert_eq!(config.max_backup_bytes(), None);
        assert_eq!(Config::default().max_backup_bytes(), Some(1 << 30));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.scan_timeout_secs = 42;
        config.backup_dir = Some(dir.path().join("bk"));
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let mut config = Config::default();
        config.exclude_patterns.push("[unclosed".into());
        let err = config.validate().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let mut config = Config::default();
        config.max_parallel_roots = 0;
        assert!(matches!(config.validate(), Err(ReclaimError::InvalidConfig(_))));
    }
}
