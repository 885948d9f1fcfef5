pub mod aggregate;
pub mod catalog;
pub mod classifier;
pub mod detectors;
pub mod records;
pub mod walker;

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::advisor::{self, SafetyAdvisor};
use crate::common::config::Config;
use crate::common::errors::ReclaimError;
use crate::common::safety::SafetyPolicy;
use crate::common::{format, progress};
use crate::duplicates;

pub use catalog::PathCatalog;
pub use records::{Category, CategoryStats, FileRecord, FileType, Refusal, RiskLevel, ScanReport};
use walker::{RootUnit, ScanDepth, WalkContext};

/// What a scan should look at
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Shallow traversal
    pub quick_mode: bool,
    /// Deep traversal bounded by `max_scan_depth`
    pub detailed_mode: bool,
    /// Walk duplicate-candidate roots and run the duplicate pass
    pub include_duplicates: bool,
    /// Walk photo roots
    pub include_photos: bool,
    /// Run the large file pass
    pub include_large_files: bool,
    /// Overrides `scan_timeout_secs`
    pub timeout: Option<Duration>,
    pub show_progress: bool,
}

impl ScanOptions {
    pub fn validate(&self) -> Result<(), ReclaimError> {
        if self.quick_mode && self.detailed_mode {
            return Err(ReclaimError::InvalidOptions(
                "quick mode and detailed mode cannot be combined".into(),
            ));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ReclaimError::InvalidOptions(
                "scan timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn depth(&self, config: &Config) -> ScanDepth {
        if self.quick_mode {
            ScanDepth::Quick
        } else if self.detailed_mode {
            ScanDepth::Detailed(config.max_scan_depth)
        } else {
            ScanDepth::Normal
        }
    }

    /// Whether roots of this category get walked at all
    fn wants(&self, category: Category, config: &Config) -> bool {
        match category {
            Category::Photo => self.include_photos,
            Category::PotentialDuplicate => self.include_duplicates,
            // Tags set by post-passes, never walked
            Category::LargeFile | Category::OldFile => false,
            _ => config.includes(category),
        }
    }
}

/// Main scan orchestrator: traverse, classify, run the post-passes and
/// reduce everything into a report.
///
/// Only invalid options or config fail the call; everything else ends up
/// in `scan_errors` of a (possibly partial) report.
pub fn run_scan(
    catalog: &PathCatalog,
    options: &ScanOptions,
    config: &Config,
    advisor: &dyn SafetyAdvisor,
) -> Result<ScanReport, ReclaimError> {
    options.validate()?;
    config.validate()?;
    let policy = SafetyPolicy::from_config(config)?;

    if options.quick_mode && (options.include_duplicates || options.include_photos) {
        warn!("quick mode with duplicate or photo analysis requested; running them anyway");
    }

    let start = Instant::now();
    let now = Utc::now();
    let depth = options.depth(config);

    let units: Vec<RootUnit> = catalog
        .resolve()
        .into_iter()
        .filter(|(category, root)| {
            let wanted = options.wants(*category, config);
            if !wanted {
                debug!(category = category.key(), root = %root.display(), "root skipped");
            }
            wanted
        })
        .map(|(category, root)| RootUnit {
            category,
            max_depth: walker::depth_for(category, depth),
            root,
        })
        .collect();

    info!(roots = units.len(), ?depth, "starting scan");

    // 1. Traverse all roots
    let pb = progress::make_progress(options.show_progress, units.len() as u64, "Scanning...");
    let ctx = Arc::new(WalkContext {
        policy: policy.clone(),
        now,
    });
    let timeout = options.timeout.unwrap_or_else(|| config.scan_timeout());
    let walked = walker::walk_roots(units, ctx, config.max_parallel_roots, timeout, |unit| {
        if let Some(ref pb) = pb {
            pb.set_message(format::short_path(&unit.root, 40));
            pb.inc(1);
        }
    })?;
    progress::clear(pb);

    let mut records = walked.records;
    let mut errors = walked.errors;

    // 2. Advisor opinions, before anything derives from safety
    let escalated = advisor::apply_assessments(advisor, &mut records);
    if escalated > 0 {
        info!(advisor = advisor.name(), escalated, "advisor raised risk levels");
    }

    // 3. Duplicates
    let duplicate_groups = if options.include_duplicates {
        let analysis = duplicates::analyze_duplicates(
            &mut records,
            &policy,
            now,
            config.duplicate_min_size,
            options.show_progress,
        );
        errors.extend(analysis.errors);
        analysis.groups
    } else {
        Vec::new()
    };

    // 4. Large and old files
    let large_files = if options.include_large_files {
        detectors::large_files(&records, config.large_file_threshold_bytes())
    } else {
        Vec::new()
    };
    let old_files = detectors::old_files(&records, config.old_file_days, now);

    let report = aggregate::build_report(
        aggregate::ScanParts {
            records,
            duplicate_groups,
            large_files,
            old_files,
            errors,
            timed_out: walked.timed_out,
        },
        now,
        start.elapsed().as_secs_f64(),
    );

    info!(
        files = report.total_files,
        bytes = report.total_bytes,
        reclaimable = report.potential_space_savings,
        errors = report.scan_errors.len(),
        timed_out = report.timed_out,
        "scan finished in {}",
        format::format_elapsed(report.duration_secs)
    );

    Ok(report)
}
