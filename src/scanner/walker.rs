use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::classifier;
use super::records::{Category, FileRecord, FileType};
use crate::common::errors::ReclaimError;
use crate::common::format;
use crate::common::permissions;
use crate::common::safety::SafetyPolicy;

/// How deep traversal goes below each root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDepth {
    Quick,
    Normal,
    /// Deep scan bounded by `max_scan_depth`
    Detailed(usize),
}

/// Depth limit for a category. A file directly inside the root is depth 1.
pub fn depth_for(category: Category, depth: ScanDepth) -> usize {
    let (quick, normal) = match category {
        Category::SystemCache => (1, 3),
        Category::UserCache => (2, 5),
        Category::ApplicationCache => (2, 4),
        Category::BrowserCache => (1, 3),
        Category::Log => (1, 3),
        Category::Temp => (1, 2),
        Category::PotentialDuplicate => (2, 4),
        Category::Photo => (2, 5),
        Category::LargeFile | Category::OldFile => (2, 5),
    };
    match depth {
        ScanDepth::Quick => quick,
        ScanDepth::Normal => normal,
        ScanDepth::Detailed(max) => max.max(normal),
    }
}

/// One independent traversal unit
#[derive(Debug, Clone)]
pub struct RootUnit {
    pub category: Category,
    pub root: PathBuf,
    pub max_depth: usize,
}

/// Shared, read-only state every unit needs
#[derive(Debug)]
pub struct WalkContext {
    pub policy: SafetyPolicy,
    pub now: DateTime<Utc>,
}

/// What a single unit produced
#[derive(Debug, Default)]
pub struct UnitOutcome {
    pub root: PathBuf,
    pub records: Vec<FileRecord>,
    pub errors: Vec<String>,
    pub cancelled: bool,
}

/// Merged output of all units
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Deduplicated by path, sorted by path
    pub records: Vec<FileRecord>,
    pub errors: Vec<String>,
    pub units_total: usize,
    pub units_completed: usize,
    pub timed_out: bool,
}

/// Whether a category keeps this file at all
fn accepts(category: Category, path: &Path) -> bool {
    match category {
        Category::Log => classifier::is_log_name(path),
        Category::Photo => classifier::classify(path, category).0 == FileType::Image,
        _ => true,
    }
}

/// Walk one root, stopping early if `cancel` is raised
pub fn walk_root(unit: &RootUnit, ctx: &WalkContext, cancel: &AtomicBool) -> UnitOutcome {
    let mut outcome = UnitOutcome {
        root: unit.root.clone(),
        ..Default::default()
    };

    if !unit.root.exists() || ctx.policy.is_excluded(&unit.root) {
        return outcome;
    }

    let walker = WalkDir::new(&unit.root)
        .follow_links(false)
        .max_depth(unit.max_depth)
        .into_iter()
        .filter_entry(|e| {
            // Prune excluded directories with everything under them
            e.depth() == 0 || !(e.file_type().is_dir() && ctx.policy.is_excluded(e.path()))
        });

    for entry in walker {
        if cancel.load(Ordering::Relaxed) {
            outcome.cancelled = true;
            break;
        }

        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                let at = err.path().unwrap_or(unit.root.as_path()).to_path_buf();
                let denied = err
                    .io_error()
                    .map(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
                    .unwrap_or(false);
                let msg = if denied {
                    format!(
                        "Permission denied: {} ({})",
                        at.display(),
                        permissions::permission_hint(&at)
                    )
                } else {
                    format!("Error scanning {}: {}", at.display(), err)
                };
                outcome.errors.push(msg);
                continue;
            }
        };

        // Only regular files; symlinks are never followed
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if ctx.policy.is_excluded(path) || !accepts(unit.category, path) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                outcome
                    .errors
                    .push(format!("Error reading {}: {}", path.display(), err));
                continue;
            }
        };

        let size = metadata.len();
        if size == 0 {
            continue;
        }

        // An unreadable mtime counts as "just modified"
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or(ctx.now);

        outcome
            .records
            .push(build_record(path, size, modified, unit.category, ctx));
    }

    debug!(
        root = %unit.root.display(),
        files = outcome.records.len(),
        errors = outcome.errors.len(),
        cancelled = outcome.cancelled,
        "root walked"
    );
    outcome
}

fn build_record(
    path: &Path,
    size: u64,
    modified: DateTime<Utc>,
    category: Category,
    ctx: &WalkContext,
) -> FileRecord {
    let (file_type, category) = classifier::classify(path, category);
    let age_hours = (ctx.now - modified).num_hours().max(0) as u64;
    let verdict = ctx.policy.evaluate(path, category, age_hours);

    FileRecord {
        path: path.to_path_buf(),
        size,
        modified,
        category,
        file_type,
        safe_to_delete: verdict.safe_to_delete,
        risk_level: verdict.risk_level,
        refusal: verdict.refusal,
        content_hash: None,
        duplicate_group_id: None,
    }
}

/// How long cancelled units get to hand back what they collected
const CANCEL_GRACE: Duration = Duration::from_millis(500);

/// Walk every unit on a bounded pool and merge once all have reported or
/// the timeout expires. On timeout the remaining units are cancelled; the
/// records they had already collected are still merged, and a timeout entry
/// is added to the errors.
pub fn walk_roots<F>(
    units: Vec<RootUnit>,
    ctx: Arc<WalkContext>,
    parallelism: usize,
    timeout: Duration,
    mut on_unit_done: F,
) -> Result<WalkOutcome, ReclaimError>
where
    F: FnMut(&UnitOutcome),
{
    let total = units.len();
    let mut outcome = WalkOutcome {
        units_total: total,
        ..Default::default()
    };
    if total == 0 {
        return Ok(outcome);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.clamp(1, total))
        .thread_name(|i| format!("reclaim-walk-{}", i))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to start traversal pool: {}", e))?;

    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<UnitOutcome>();

    for unit in units {
        let tx = tx.clone();
        let ctx = Arc::clone(&ctx);
        let cancel = Arc::clone(&cancel);
        pool.spawn(move || {
            let result = walk_root(&unit, &ctx, &cancel);
            // The receiver is gone once the grace period is over
            let _ = tx.send(result);
        });
    }
    drop(tx);

    let mut received: Vec<UnitOutcome> = Vec::with_capacity(total);
    outcome.timed_out = !receive_until(
        &rx,
        Instant::now().checked_add(timeout),
        total,
        &mut received,
        &mut on_unit_done,
    );

    if outcome.timed_out {
        cancel.store(true, Ordering::SeqCst);
        // Cancelled units stop at their next entry and send what they have
        receive_until(
            &rx,
            Instant::now().checked_add(CANCEL_GRACE),
            total,
            &mut received,
            &mut on_unit_done,
        );
    }

    outcome.units_completed = received.iter().filter(|u| !u.cancelled).count();

    if outcome.timed_out {
        let msg = format!(
            "Scan timed out after {}: {} of {} roots finished",
            format::format_elapsed(timeout.as_secs_f64()),
            outcome.units_completed,
            total
        );
        warn!("{}", msg);
        outcome.errors.push(msg);
    } else if received.len() < total {
        outcome.errors.push(format!(
            "{} of {} roots stopped without reporting",
            total - received.len(),
            total
        ));
    }

    merge_units(received, &mut outcome);
    Ok(outcome)
}

/// Collect unit outcomes until `total` have arrived, the senders are gone or
/// `deadline` passes. Returns false only when the deadline cut it short.
fn receive_until<F>(
    rx: &mpsc::Receiver<UnitOutcome>,
    deadline: Option<Instant>,
    total: usize,
    received: &mut Vec<UnitOutcome>,
    on_unit_done: &mut F,
) -> bool
where
    F: FnMut(&UnitOutcome),
{
    while received.len() < total {
        let next = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return false;
                }
                rx.recv_timeout(deadline - now)
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match next {
            Ok(unit) => {
                on_unit_done(&unit);
                received.push(unit);
            }
            Err(RecvTimeoutError::Timeout) => return false,
            Err(RecvTimeoutError::Disconnected) => return true,
        }
    }
    true
}

/// Single-writer merge. A file reached from overlapping roots keeps the
/// record produced under the most specific (longest) root.
fn merge_units(mut units: Vec<UnitOutcome>, outcome: &mut WalkOutcome) {
    units.sort_by(|a, b| a.root.cmp(&b.root));

    let mut by_path: HashMap<PathBuf, (usize, FileRecord)> = HashMap::new();
    for unit in units {
        let depth = unit.root.components().count();
        outcome.errors.extend(unit.errors);
        for record in unit.records {
            match by_path.get(&record.path) {
                Some((existing, _)) if *existing >= depth => {}
                _ => {
                    by_path.insert(record.path.clone(), (depth, record));
                }
            }
        }
    }

    let mut records: Vec<FileRecord> = by_path.into_values().map(|(_, r)| r).collect();
    records.sort_by(|a, b| a.path.cmp(&b.path));
    outcome.records = records;
}
