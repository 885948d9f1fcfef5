use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use reclaim::cleaner::{self, BackupManifest, BackupSession, CleanOptions, CleanupPlan};
use reclaim::common::config::Config;
use reclaim::common::errors::ReclaimError;
use reclaim::engine::OperationKind;
use reclaim::{Category, Engine, FileRecord, PathCatalog, RiskLevel, SafetyAdvisor, ScanOptions};

/// A scanned root plus a separate backup base
struct Fixture {
    tmp: TempDir,
    root: PathBuf,
    backups: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        let backups = tmp.path().join("backups");
        fs::create_dir_all(&root).unwrap();
        Self {
            tmp,
            root,
            backups,
        }
    }

    fn write(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn config(&self) -> Config {
        Config {
            min_file_age_hours: 0,
            backup_dir: Some(self.backups.clone()),
            ..Config::default()
        }
    }

    fn catalog(&self) -> PathCatalog {
        PathCatalog::new().with_root(Category::UserCache, &self.root)
    }

    /// Engine that has already scanned the fixture
    fn scanned_engine(&self, config: Config) -> Engine {
        let mut engine = Engine::new(config).unwrap();
        engine
            .scan(&self.catalog(), &ScanOptions::default())
            .unwrap();
        engine
    }
}

fn executing(categories: &[Category]) -> CleanOptions {
    let mut options = CleanOptions::new(categories.iter().copied());
    options.safe_mode = false;
    options
}

fn only_session(base: &Path) -> PathBuf {
    let sessions = BackupManifest::list_sessions(base).unwrap();
    assert_eq!(sessions.len(), 1);
    sessions.into_iter().next().unwrap().0
}

// ─── Safe mode ────────────────────────────────────────────────────────────────

#[test]
fn test_safe_mode_touches_nothing() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"aaaa");
    let b = fx.write("nested/b.bin", b"bbbbbb");
    let mut engine = fx.scanned_engine(fx.config());

    let result = engine
        .clean(&CleanOptions::new([Category::UserCache]))
        .unwrap();

    assert!(result.safe_mode);
    assert_eq!(result.files_removed, 0);
    assert_eq!(result.planned_files, 2);
    assert_eq!(result.bytes_freed, 10);
    assert!(result.backup_path.is_none());
    assert!(a.exists() && b.exists());
    assert!(!fx.backups.exists());
}

#[test]
fn test_unselected_categories_untouched() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"aaaa");
    let mut engine = fx.scanned_engine(fx.config());

    let result = engine.clean(&executing(&[Category::Log])).unwrap();

    assert_eq!(result.planned_files, 0);
    assert_eq!(result.files_removed, 0);
    assert!(a.exists());
}

// ─── Backup before delete ─────────────────────────────────────────────────────

#[test]
fn test_backup_then_delete() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"first payload");
    let b = fx.write("deep/dir/b.bin", b"second");
    let mut engine = fx.scanned_engine(fx.config());

    let result = engine.clean(&executing(&[Category::UserCache])).unwrap();

    assert_eq!(result.files_removed, 2);
    assert_eq!(result.files_backed_up, 2);
    assert_eq!(result.bytes_freed, 19);
    assert!(result.clean_errors.is_empty());
    assert!(!a.exists() && !b.exists());

    let session_root = result.backup_path.clone().unwrap();
    assert_eq!(only_session(&fx.backups), session_root);

    let manifest = BackupManifest::load(&session_root).unwrap();
    assert_eq!(manifest.files_removed, 2);
    for item in &manifest.items {
        assert!(item.removed);
        let copy = item.backup_path.as_ref().unwrap();
        assert!(copy.starts_with(session_root.join("files")));
        assert_eq!(fs::metadata(copy).unwrap().len(), item.size_bytes);
    }
}

#[test]
fn test_failed_backup_keeps_original() {
    let fx = Fixture::new();
    let victim = fx.write("blocked/x.bin", b"must survive");
    let fine = fx.write("y.bin", b"goes away");
    let mut engine = fx.scanned_engine(fx.config());
    let report = engine.take_report().unwrap();

    let options = executing(&[Category::UserCache]);
    let plan = cleaner::build_plan(&report, &options).unwrap();
    let session = BackupSession::create(&fx.backups).unwrap();

    // A regular file where the backup directory should go
    let blocker = session.backup_path_for(&victim).parent().unwrap().to_path_buf();
    fs::create_dir_all(blocker.parent().unwrap()).unwrap();
    fs::write(&blocker, b"in the way").unwrap();

    let result = cleaner::execute_with_session(&plan, Some(&session), false).unwrap();

    assert!(victim.exists());
    assert_eq!(fs::read(&victim).unwrap(), b"must survive");
    assert!(!fine.exists());
    assert_eq!(result.files_removed, 1);
    assert_eq!(result.clean_errors.len(), 1);
    assert!(result.clean_errors[0].contains("Backup failed"));
}

#[test]
fn test_uncreatable_backup_aborts() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"keep me");
    let plain = fx.tmp.path().join("not-a-dir");
    fs::write(&plain, b"file").unwrap();
    let config = Config {
        backup_dir: Some(plain.join("backups")),
        ..fx.config()
    };
    let mut engine = fx.scanned_engine(config);

    let err = engine.clean(&executing(&[Category::UserCache])).unwrap_err();

    assert!(matches!(err, ReclaimError::CleanupAborted { .. }));
    let partial = err.partial_result().unwrap();
    assert_eq!(partial.files_removed, 0);
    assert_eq!(partial.planned_files, 1);
    assert!(a.exists());

    let last = engine.history().last().unwrap();
    assert_eq!(last.kind, OperationKind::Clean);
    assert!(!last.success);
}

#[test]
fn test_backups_requested_without_session_rejected() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"needs a backup");
    let mut engine = fx.scanned_engine(fx.config());
    let report = engine.take_report().unwrap();
    let plan = cleaner::build_plan(&report, &executing(&[Category::UserCache])).unwrap();
    assert!(plan.backup_enabled);

    let err = cleaner::execute_with_session(&plan, None, false).unwrap_err();

    assert!(matches!(err, ReclaimError::InvalidOptions(_)));
    assert!(a.exists());
}

#[test]
fn test_vanished_backup_location_aborts_run() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"first");
    let b = fx.write("b.bin", b"second");
    let mut engine = fx.scanned_engine(fx.config());
    let report = engine.take_report().unwrap();
    let plan = cleaner::build_plan(&report, &executing(&[Category::UserCache])).unwrap();
    let session = BackupSession::create(&fx.backups).unwrap();
    fs::remove_dir_all(&session.root).unwrap();

    let err = cleaner::execute_with_session(&plan, Some(&session), false).unwrap_err();

    assert!(err.to_string().contains("backup location disappeared"));
    let partial = err.partial_result().unwrap();
    assert_eq!(partial.planned_files, 2);
    assert_eq!(partial.files_removed, 0);
    assert!(a.exists() && b.exists());
    // Not rebuilt behind our back
    assert!(!session.root.exists());
}

#[test]
fn test_backup_size_cap_keeps_overflow() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", &[b'a'; 10]);
    let b = fx.write("b.bin", &[b'b'; 10]);
    let mut engine = fx.scanned_engine(fx.config());
    let report = engine.take_report().unwrap();
    let plan = cleaner::build_plan(&report, &executing(&[Category::UserCache])).unwrap();
    let session = BackupSession::create(&fx.backups)
        .unwrap()
        .with_limit(Some(15));

    let result = cleaner::execute_with_session(&plan, Some(&session), false).unwrap();

    assert_eq!(result.files_removed, 1);
    assert_eq!(result.files_backed_up, 1);
    assert_eq!(result.clean_errors.len(), 1);
    assert!(result.clean_errors[0].contains("size limit"));
    // Exactly one original survives
    assert!(a.exists() != b.exists());
    assert_eq!(session.used_bytes(), 10);
}

#[test]
fn test_changed_file_is_skipped() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"short");
    let mut engine = fx.scanned_engine(fx.config());
    fs::write(&a, b"much longer than before").unwrap();

    let result = engine.clean(&executing(&[Category::UserCache])).unwrap();

    assert_eq!(result.files_removed, 0);
    assert!(a.exists());
    assert!(result.clean_errors[0].contains("size changed"));
}

#[test]
fn test_without_backup() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"gone");
    let mut engine = fx.scanned_engine(fx.config());
    let mut options = executing(&[Category::UserCache]);
    options.backup_enabled = false;

    let result = engine.clean(&options).unwrap();

    assert_eq!(result.files_removed, 1);
    assert_eq!(result.files_backed_up, 0);
    assert!(result.backup_path.is_none());
    assert!(!a.exists());
    assert!(!fx.backups.exists());
}

// ─── Restore ──────────────────────────────────────────────────────────────────

#[test]
fn test_restore_round_trip() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"restore me");
    let b = fx.write("sub/b.bin", b"me too");
    let mut engine = fx.scanned_engine(fx.config());
    let result = engine.clean(&executing(&[Category::UserCache])).unwrap();
    assert!(!a.exists() && !b.exists());

    let report = cleaner::restore_backup(&result.backup_path.unwrap(), false).unwrap();

    assert_eq!(report.restored_count, 2);
    assert!(report.errors.is_empty());
    assert_eq!(fs::read(&a).unwrap(), b"restore me");
    assert_eq!(fs::read(&b).unwrap(), b"me too");
}

#[test]
fn test_restore_never_overwrites() {
    let fx = Fixture::new();
    let a = fx.write("a.bin", b"old");
    let mut engine = fx.scanned_engine(fx.config());
    let result = engine.clean(&executing(&[Category::UserCache])).unwrap();
    fs::write(&a, b"new content").unwrap();

    let report = cleaner::restore_backup(&result.backup_path.unwrap(), false).unwrap();

    assert_eq!(report.restored_count, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(fs::read(&a).unwrap(), b"new content");
}

// ─── Engine ───────────────────────────────────────────────────────────────────

#[test]
fn test_clean_without_report() {
    let fx = Fixture::new();
    let mut engine = Engine::new(fx.config()).unwrap();

    let err = engine
        .clean(&CleanOptions::new([Category::UserCache]))
        .unwrap_err();
    assert!(matches!(err, ReclaimError::NoReport));
}

#[test]
fn test_empty_categories_rejected_and_report_kept() {
    let fx = Fixture::new();
    fx.write("a.bin", b"aaaa");
    let mut engine = fx.scanned_engine(fx.config());

    let err = engine.clean(&CleanOptions::new([])).unwrap_err();
    assert!(matches!(err, ReclaimError::InvalidOptions(_)));
    assert!(engine.last_report().is_some());
}

#[test]
fn test_report_consumed_by_clean() {
    let fx = Fixture::new();
    fx.write("a.bin", b"aaaa");
    let mut engine = fx.scanned_engine(fx.config());

    engine
        .clean(&CleanOptions::new([Category::UserCache]))
        .unwrap();

    assert!(engine.last_report().is_none());
    let again = engine
        .clean(&CleanOptions::new([Category::UserCache]))
        .unwrap_err();
    assert!(matches!(again, ReclaimError::NoReport));

    // A clean that never started leaves no history entry
    let kinds: Vec<OperationKind> = engine.history().map(|op| op.kind).collect();
    assert_eq!(kinds, vec![OperationKind::Scan, OperationKind::Clean]);
}

/// Vetoes every planned file and flags anything named `precious`
struct Cautious;

impl SafetyAdvisor for Cautious {
    fn name(&self) -> &str {
        "cautious"
    }

    fn assess(&self, record: &FileRecord) -> Option<RiskLevel> {
        record
            .path
            .to_string_lossy()
            .contains("precious")
            .then_some(RiskLevel::High)
    }

    fn review_plan(&self, plan: &CleanupPlan) -> Vec<PathBuf> {
        plan.items
            .iter()
            .filter(|i| i.path.ends_with("vetoed.bin"))
            .map(|i| i.path.clone())
            .collect()
    }
}

#[test]
fn test_advisor_only_makes_cleanup_stricter() {
    let fx = Fixture::new();
    let precious = fx.write("precious.bin", b"p");
    let vetoed = fx.write("vetoed.bin", b"v");
    let plain = fx.write("plain.bin", b"x");
    let mut engine = Engine::new(fx.config())
        .unwrap()
        .with_advisor(Box::new(Cautious));
    let report = engine
        .scan(&fx.catalog(), &ScanOptions::default())
        .unwrap();
    let flagged = report.records.iter().find(|r| r.path == precious).unwrap();
    assert!(!flagged.safe_to_delete);
    assert_eq!(flagged.risk_level, RiskLevel::High);

    // The preview already reflects the veto
    let preview = engine.preview(&executing(&[Category::UserCache])).unwrap();
    assert_eq!(preview.len(), 1);
    assert_eq!(preview.items[0].path, plain);

    let result = engine.clean(&executing(&[Category::UserCache])).unwrap();

    assert_eq!(result.files_removed, 1);
    assert!(precious.exists());
    assert!(vetoed.exists());
    assert!(!plain.exists());
}
