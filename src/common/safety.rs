use std::path::{Component, Path};

use super::config::Config;
use super::errors::ReclaimError;
use crate::scanner::records::{Category, Refusal, RiskLevel};

/// Paths that must NEVER be deleted, whatever the policy says.
const CRITICAL_PATHS: &[&str] = &[
    "/",
    "/System",
    "/Applications",
    "/Users",
    "/Library",
    "/usr",
    "/bin",
    "/sbin",
    "/var",
    "/etc",
    "/opt",
    "/private",
    "/home",
    "/root",
    "C:\\",
    "C:\\Windows",
    "C:\\Program Files",
];

/// Directories under home that must never be deleted entirely
const CRITICAL_HOME_DIRS: &[&str] = &[
    "", // home dir itself
    "Desktop",
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Movies",
    "Library",
    ".ssh",
    ".gnupg",
];

/// Check if a path is one of the well-known roots that are never removed
pub fn is_critical_path(path: &Path) -> bool {
    if CRITICAL_PATHS.iter().any(|p| path == Path::new(p)) {
        return true;
    }
    if let Some(home) = dirs::home_dir() {
        return CRITICAL_HOME_DIRS.iter().any(|d| {
            if d.is_empty() {
                path == home
            } else {
                path == home.join(d)
            }
        });
    }
    false
}

/// Outcome of evaluating one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub safe_to_delete: bool,
    pub risk_level: RiskLevel,
    pub refusal: Option<Refusal>,
}

impl Verdict {
    fn refuse(risk_level: RiskLevel, refusal: Refusal) -> Self {
        Self {
            safe_to_delete: false,
            risk_level,
            refusal: Some(refusal),
        }
    }

    fn allow(risk_level: RiskLevel) -> Self {
        Self {
            safe_to_delete: true,
            risk_level,
            refusal: None,
        }
    }
}

/// Deletion rules compiled from a [`Config`].
///
/// Rules apply in a fixed order and the first match wins:
/// blacklist, protected paths, exclude patterns, minimum age, high risk,
/// then the per-category rule. Protected paths are what older configs call
/// the "whitelist": a match keeps the file, it never permits deletion.
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    blacklist: Vec<String>,
    protected: Vec<String>,
    excludes: Vec<glob::Pattern>,
    high_risk: Vec<String>,
    medium_risk: Vec<String>,
    min_age_hours: u64,
    system_cache_min_depth: usize,
}

/// Path text with `/` as the only separator, so `/Documents/` also
/// matches `C:\Users\me\Documents\x`
fn slashed(text: &str) -> String {
    text.replace('\\', "/")
}

fn slashed_all(patterns: &[String], lowercase: bool) -> Vec<String> {
    patterns
        .iter()
        .map(|p| if lowercase { slashed(&p.to_lowercase()) } else { slashed(p) })
        .collect()
}

impl SafetyPolicy {
    pub fn from_config(config: &Config) -> Result<Self, ReclaimError> {
        Ok(Self {
            blacklist: slashed_all(&config.blacklist_paths, false),
            protected: slashed_all(&config.protected_paths, false),
            excludes: config.exclude_globs()?,
            high_risk: slashed_all(&config.high_risk_patterns, true),
            medium_risk: slashed_all(&config.medium_risk_patterns, true),
            min_age_hours: config.min_file_age_hours,
            system_cache_min_depth: config.system_cache_min_depth,
        })
    }

    /// Case-insensitive lookup in the high table, then the medium table
    pub fn risk_level(&self, path: &Path) -> RiskLevel {
        let lowered = slashed(&path.to_string_lossy().to_lowercase());
        if self.high_risk.iter().any(|p| lowered.contains(p.as_str())) {
            RiskLevel::High
        } else if self.medium_risk.iter().any(|p| lowered.contains(p.as_str())) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Match exclude globs against the path anchored at its end, so
    /// `*.bak` matches any file name and `backup/*` matches anything
    /// directly inside a directory named `backup`.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.excludes.is_empty() {
            return false;
        }
        let full = path.to_string_lossy();
        if self.excludes.iter().any(|p| p.matches(&full)) {
            return true;
        }

        let parts: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        (0..parts.len()).any(|start| {
            let suffix = parts[start..].join("/");
            self.excludes.iter().any(|p| p.matches(&suffix))
        })
    }

    pub fn is_blacklisted(&self, path: &Path) -> bool {
        let s = slashed(&path.to_string_lossy());
        self.blacklist.iter().any(|b| s.contains(b.as_str()))
    }

    pub fn is_protected(&self, path: &Path) -> bool {
        let s = slashed(&path.to_string_lossy());
        self.protected.iter().any(|w| s.contains(w.as_str()))
    }

    /// Evaluate a freshly discovered file
    pub fn evaluate(&self, path: &Path, category: Category, age_hours: u64) -> Verdict {
        let risk = self.risk_level(path);
        if let Some(refusal) = self.shared_refusal(path, age_hours, risk) {
            return Verdict::refuse(risk, refusal);
        }

        match category {
            Category::SystemCache if normal_depth(path) < self.system_cache_min_depth => {
                Verdict::refuse(risk, Refusal::ShallowSystemCache)
            }
            Category::Photo | Category::PotentialDuplicate => {
                Verdict::refuse(risk, Refusal::ReviewOnly)
            }
            _ => Verdict::allow(risk),
        }
    }

    /// Evaluate a non-retained duplicate copy: every rule except the
    /// per-category one still applies.
    pub fn evaluate_duplicate(&self, path: &Path, age_hours: u64) -> Verdict {
        let risk = self.risk_level(path);
        match self.shared_refusal(path, age_hours, risk) {
            Some(refusal) => Verdict::refuse(risk, refusal),
            None => Verdict::allow(risk),
        }
    }

    fn shared_refusal(&self, path: &Path, age_hours: u64, risk: RiskLevel) -> Option<Refusal> {
        if self.is_blacklisted(path) {
            Some(Refusal::Blacklisted)
        } else if self.is_protected(path) {
            Some(Refusal::Protected)
        } else if self.is_excluded(path) {
            Some(Refusal::Excluded)
        } else if age_hours < self.min_age_hours {
            Some(Refusal::TooYoung)
        } else if risk == RiskLevel::High {
            Some(Refusal::HighRisk)
        } else {
            None
        }
    }
}

fn normal_depth(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}
