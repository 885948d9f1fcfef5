use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::duplicates::DuplicateGroup;

// ─── Core types ───────────────────────────────────────────────────────────────

/// Why a file ended up in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SystemCache,
    UserCache,
    ApplicationCache,
    BrowserCache,
    Log,
    Temp,
    PotentialDuplicate,
    Photo,
    LargeFile,
    OldFile,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::SystemCache,
        Category::UserCache,
        Category::ApplicationCache,
        Category::BrowserCache,
        Category::Log,
        Category::Temp,
        Category::PotentialDuplicate,
        Category::Photo,
        Category::LargeFile,
        Category::OldFile,
    ];

    /// Categories whose safe bytes count toward cache savings
    pub fn is_cache_like(self) -> bool {
        matches!(
            self,
            Category::SystemCache
                | Category::UserCache
                | Category::ApplicationCache
                | Category::BrowserCache
                | Category::Log
                | Category::Temp
        )
    }

    /// Stable snake_case identifier, as used in config and on the command line
    pub fn key(self) -> &'static str {
        match self {
            Category::SystemCache => "system_cache",
            Category::UserCache => "user_cache",
            Category::ApplicationCache => "application_cache",
            Category::BrowserCache => "browser_cache",
            Category::Log => "log",
            Category::Temp => "temp",
            Category::PotentialDuplicate => "potential_duplicate",
            Category::Photo => "photo",
            Category::LargeFile => "large_file",
            Category::OldFile => "old_file",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::SystemCache => write!(f, "System Cache"),
            Category::UserCache => write!(f, "User Cache"),
            Category::ApplicationCache => write!(f, "Application Cache"),
            Category::BrowserCache => write!(f, "Browser Cache"),
            Category::Log => write!(f, "Logs"),
            Category::Temp => write!(f, "Temporary Files"),
            Category::PotentialDuplicate => write!(f, "Potential Duplicate"),
            Category::Photo => write!(f, "Photo"),
            Category::LargeFile => write!(f, "Large File"),
            Category::OldFile => write!(f, "Old File"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.key() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
                format!("unknown category '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Coarse content type derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Log,
    Cache,
    Other,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileType::Image => "image",
            FileType::Video => "video",
            FileType::Audio => "audio",
            FileType::Document => "document",
            FileType::Archive => "archive",
            FileType::Log => "log",
            FileType::Cache => "cache",
            FileType::Other => "other",
        };
        f.write_str(s)
    }
}

/// Risk of breaking something by deleting a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// The rule that kept a record from being deletable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refusal {
    Blacklisted,
    Protected,
    Excluded,
    TooYoung,
    HighRisk,
    ShallowSystemCache,
    ReviewOnly,
    RetainedDuplicate,
}

impl std::fmt::Display for Refusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Refusal::Blacklisted => write!(f, "blacklisted path"),
            Refusal::Protected => write!(f, "protected path"),
            Refusal::Excluded => write!(f, "matches an exclude pattern"),
            Refusal::TooYoung => write!(f, "modified too recently"),
            Refusal::HighRisk => write!(f, "high risk location"),
            Refusal::ShallowSystemCache => write!(f, "system cache too close to the root"),
            Refusal::ReviewOnly => write!(f, "review only"),
            Refusal::RetainedDuplicate => write!(f, "kept copy of a duplicate group"),
        }
    }
}

/// One regular file discovered during traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub category: Category,
    pub file_type: FileType,
    pub safe_to_delete: bool,
    pub risk_level: RiskLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<Refusal>,

    /// Hex digest, present once duplicate analysis hashed the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_group_id: Option<usize>,
}

impl FileRecord {
    /// Hours since last modification, clamped at zero for future timestamps
    pub fn age_hours(&self, now: DateTime<Utc>) -> u64 {
        (now - self.modified).num_hours().max(0) as u64
    }

    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

/// Per-category totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub file_count: usize,
    pub total_bytes: u64,
    pub safe_count: usize,
    pub safe_bytes: u64,
}

/// Complete, immutable result of one scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// When the scan was performed
    pub timestamp: DateTime<Utc>,

    /// How long the scan took in seconds
    pub duration_secs: f64,

    pub total_files: usize,
    pub total_bytes: u64,

    pub categories: BTreeMap<Category, CategoryStats>,

    /// Every record, sorted by path
    pub records: Vec<FileRecord>,

    pub duplicate_groups: Vec<DuplicateGroup>,
    pub large_files: Vec<FileRecord>,
    pub old_files: Vec<FileRecord>,

    /// Safe bytes in cache-like categories outside duplicate groups
    pub cache_savings: u64,
    pub duplicate_savings: u64,
    pub photo_savings: u64,
    pub potential_space_savings: u64,

    /// Per-item problems encountered along the way
    pub scan_errors: Vec<String>,

    /// The scan budget ran out before every root finished
    pub timed_out: bool,
}

impl ScanReport {
    /// Records that the policy allows deleting
    pub fn safe_records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(|r| r.safe_to_delete)
    }

    pub fn records_in(&self, category: Category) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(move |r| r.category == category)
    }

    pub fn stats(&self, category: Category) -> CategoryStats {
        self.categories.get(&category).cloned().unwrap_or_default()
    }
}
