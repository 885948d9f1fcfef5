use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::records::Category;

/// Candidate roots per category.
///
/// Entries are stored as written (`~` and `*` allowed) and expanded when a
/// scan resolves them. Roots that do not exist are dropped silently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathCatalog {
    entries: BTreeMap<Category, Vec<String>>,
}

impl PathCatalog {
    /// An empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_root(mut self, category: Category, root: impl AsRef<Path>) -> Self {
        self.insert(category, root);
        self
    }

    pub fn insert(&mut self, category: Category, root: impl AsRef<Path>) {
        self.entries
            .entry(category)
            .or_default()
            .push(root.as_ref().to_string_lossy().into_owned());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|v| v.is_empty())
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.keys().copied()
    }

    /// Raw entries for one category
    pub fn entries(&self, category: Category) -> &[String] {
        self.entries.get(&category).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Expand every entry into concrete, existing roots
    pub fn resolve(&self) -> Vec<(Category, PathBuf)> {
        let mut roots = Vec::new();
        for (category, patterns) in &self.entries {
            for path in expand_paths(patterns) {
                if path.exists() {
                    roots.push((*category, path));
                }
            }
        }
        roots
    }

    /// Default locations for the running OS
    pub fn for_current_os() -> Self {
        let mut catalog = Self::new();
        for (category, root) in default_entries() {
            catalog.insert(*category, root);
        }
        catalog
    }
}

#[cfg(target_os = "macos")]
fn default_entries() -> &'static [(Category, &'static str)] {
    &[
        (Category::SystemCache, "/Library/Caches"),
        (Category::UserCache, "~/Library/Caches"),
        (Category::ApplicationCache, "~/Library/Containers/*/Data/Library/Caches"),
        (Category::BrowserCache, "~/Library/Caches/Google/Chrome"),
        (Category::BrowserCache, "~/Library/Caches/com.apple.Safari"),
        (Category::BrowserCache, "~/Library/Caches/Firefox"),
        (Category::Log, "~/Library/Logs"),
        (Category::Log, "/Library/Logs"),
        (Category::Temp, "/private/var/tmp"),
        (Category::Temp, "/tmp"),
        (Category::PotentialDuplicate, "~/Downloads"),
        (Category::Photo, "~/Pictures"),
    ]
}

#[cfg(windows)]
fn default_entries() -> &'static [(Category, &'static str)] {
    &[
        (Category::SystemCache, "C:/ProgramData/Package Cache"),
        (Category::UserCache, "~/AppData/Local/Temp"),
        (Category::ApplicationCache, "~/AppData/Local/*/Cache"),
        (Category::BrowserCache, "~/AppData/Local/Google/Chrome/User Data/Default/Cache"),
        (Category::BrowserCache, "~/AppData/Local/Microsoft/Edge/User Data/Default/Cache"),
        (Category::Log, "~/AppData/Local/CrashDumps"),
        (Category::Temp, "C:/Temp"),
        (Category::PotentialDuplicate, "~/Downloads"),
        (Category::Photo, "~/Pictures"),
    ]
}

#[cfg(not(any(target_os = "macos", windows)))]
fn default_entries() -> &'static [(Category, &'static str)] {
    &[
        (Category::SystemCache, "/var/cache"),
        (Category::UserCache, "~/.cache"),
        (Category::ApplicationCache, "~/.var/app/*/cache"),
        (Category::BrowserCache, "~/.cache/google-chrome"),
        (Category::BrowserCache, "~/.cache/chromium"),
        (Category::BrowserCache, "~/.cache/mozilla/firefox"),
        (Category::Log, "/var/log"),
        (Category::Temp, "/tmp"),
        (Category::Temp, "/var/tmp"),
        (Category::PotentialDuplicate, "~/Downloads"),
        (Category::Photo, "~/Pictures"),
    ]
}

/// Expand a leading `~` and `*` glob patterns
pub fn expand_paths(paths: &[String]) -> Vec<PathBuf> {
    let home = dirs::home_dir();
    let mut expanded = Vec::new();

    for path_str in paths {
        let resolved = match (path_str.strip_prefix('~'), &home) {
            (Some(rest), Some(home)) => {
                let rest = rest.trim_start_matches(['/', '\\']);
                home.join(rest).to_string_lossy().into_owned()
            }
            (Some(_), None) => continue,
            (None, _) => path_str.clone(),
        };

        if resolved.contains('*') {
            if let Ok(entries) = glob::glob(&resolved) {
                expanded.extend(entries.filter_map(|e| e.ok()));
            }
        } else {
            expanded.push(PathBuf::from(resolved));
        }
    }

    expanded
}
