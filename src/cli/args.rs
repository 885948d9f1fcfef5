use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::errors::ReclaimError;
use crate::scanner::{Category, PathCatalog, ScanOptions};

/// Reclaim: find reclaimable disk space and clean it safely
#[derive(Parser, Debug)]
#[command(
    name = "reclaim",
    version,
    about = "Find reclaimable disk space and clean it safely",
    long_about = "Reclaim scans caches, logs, temp files, duplicates and photos for space\n\
                  that can be freed. Cleanup is a dry run unless --execute is given, and\n\
                  every removed file is backed up first.",
    after_help = "EXAMPLES:\n  \
        reclaim scan                               Scan the default locations\n  \
        reclaim scan --quick --format json         Shallow scan, JSON report\n  \
        reclaim scan --duplicates --photos         Include duplicate and photo analysis\n  \
        reclaim scan --root temp=/tmp/build        Scan a custom root only\n  \
        reclaim clean --categories user_cache,temp Preview what would be cleaned\n  \
        reclaim clean --categories log --execute   Back up and remove old logs\n  \
        reclaim restore --last                     Put back the last cleanup\n  \
        reclaim config init                        Write the default config file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Config file to use instead of ~/.reclaim/config.toml
    #[arg(long, global = true, value_name = "PATH", env = "RECLAIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Also write logs to a daily rotated file under ~/.reclaim/logs
    #[arg(long, global = true)]
    pub log_file: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan for reclaimable files
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Show individual files in results
        #[arg(long)]
        list: bool,
    },

    /// Remove deletable files from selected categories
    Clean {
        #[command(flatten)]
        scan: ScanArgs,

        /// Categories to clean, comma separated (e.g. user_cache,temp,log)
        #[arg(long, short = 'c', value_delimiter = ',', required = true)]
        categories: Vec<String>,

        /// Actually delete files. Without this only a dry run is reported.
        #[arg(long)]
        execute: bool,

        /// Delete without copying files to a backup first
        #[arg(long)]
        no_backup: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Restore files from a cleanup backup
    Restore {
        /// Backup session directory or id
        #[arg(conflicts_with_all = ["last", "list"])]
        backup: Option<String>,

        /// Restore the most recent backup
        #[arg(long)]
        last: bool,

        /// List available backups
        #[arg(long)]
        list: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: CompletionShell,
    },
}

/// Options shared by `scan` and `clean`
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Shallow traversal of every root
    #[arg(long)]
    pub quick: bool,

    /// Deep traversal, bounded by max_scan_depth
    #[arg(long)]
    pub detailed: bool,

    /// Look for byte-identical duplicates
    #[arg(long)]
    pub duplicates: bool,

    /// Include photo libraries
    #[arg(long)]
    pub photos: bool,

    /// Report files above the large file threshold
    #[arg(long)]
    pub large_files: bool,

    /// Give up on unfinished roots after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Scan CATEGORY=PATH instead of the default locations (repeatable)
    #[arg(long = "root", value_name = "CATEGORY=PATH")]
    pub roots: Vec<String>,
}

impl ScanArgs {
    pub fn scan_options(&self, show_progress: bool) -> ScanOptions {
        ScanOptions {
            quick_mode: self.quick,
            detailed_mode: self.detailed,
            include_duplicates: self.duplicates,
            include_photos: self.photos,
            include_large_files: self.large_files,
            timeout: self.timeout.map(Duration::from_secs),
            show_progress,
        }
    }

    /// Catalog built from `--root` values, or `None` to use the defaults.
    /// Relative paths are resolved against `cwd`.
    pub fn catalog(&self, cwd: &Path) -> Result<Option<PathCatalog>, ReclaimError> {
        if self.roots.is_empty() {
            return Ok(None);
        }
        let mut catalog = PathCatalog::new();
        for spec in &self.roots {
            let (category, path) = parse_root(spec)?;
            let path = if path.is_absolute() || path.starts_with("~") {
                path
            } else {
                cwd.join(path)
            };
            catalog.insert(category, path);
        }
        Ok(Some(catalog))
    }
}

/// Split a `CATEGORY=PATH` argument
pub fn parse_root(spec: &str) -> Result<(Category, PathBuf), ReclaimError> {
    let (category, path) = spec.split_once('=').ok_or_else(|| {
        ReclaimError::InvalidOptions(format!("expected CATEGORY=PATH, got '{}'", spec))
    })?;
    if path.trim().is_empty() {
        return Err(ReclaimError::InvalidOptions(format!(
            "empty path in root '{}'",
            spec
        )));
    }
    let category: Category = category.parse().map_err(ReclaimError::InvalidOptions)?;
    if matches!(category, Category::LargeFile | Category::OldFile) {
        return Err(ReclaimError::InvalidOptions(format!(
            "'{}' is assigned by the scan and cannot be used for a root",
            category.key()
        )));
    }
    Ok((category, PathBuf::from(path)))
}

/// Parse a list of category names as given to `clean --categories`
pub fn parse_categories(names: &[String]) -> Result<Vec<Category>, ReclaimError> {
    names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| n.parse::<Category>().map_err(ReclaimError::InvalidOptions))
        .collect()
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
