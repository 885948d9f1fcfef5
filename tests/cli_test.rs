use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use reclaim::common::config::Config;

fn reclaim() -> Command {
    let mut cmd = Command::cargo_bin("reclaim").unwrap();
    cmd.env_remove("RECLAIM_CONFIG").env_remove("RECLAIM_LOG");
    cmd
}

/// Config that lets fresh files be cleaned and keeps backups inside `dir`
fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    let config = Config {
        min_file_age_hours: 0,
        backup_dir: Some(dir.join("backups")),
        ..Config::default()
    };
    config.save_to(&path).unwrap();
    path
}

fn root_arg(category: &str, path: &Path) -> String {
    format!("{}={}", category, path.display())
}

// ─── Help & version ──────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    reclaim()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reclaimable"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("clean"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_version_flag() {
    reclaim()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reclaim"));
}

// ─── Scan command ────────────────────────────────────────────────────────────

#[test]
fn test_scan_json_output() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("tmpfiles");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.tmp"), b"some bytes").unwrap();
    let config = write_config(tmp.path());

    let output = reclaim()
        .args(["scan", "--format", "json", "--config"])
        .arg(&config)
        .args(["--root", &root_arg("temp", &root)])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_files"], 1);
    assert_eq!(json["potential_space_savings"], 10);
    assert_eq!(json["timed_out"], false);
}

#[test]
fn test_scan_quiet_output() {
    let tmp = TempDir::new().unwrap();
    reclaim()
        .args(["scan", "--format", "quiet", "--root"])
        .arg(root_arg("temp", tmp.path()))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0 B"));
}

#[test]
fn test_scan_human_output() {
    let tmp = TempDir::new().unwrap();
    reclaim()
        .args(["scan", "--no-color", "--quiet", "--root"])
        .arg(root_arg("user_cache", tmp.path()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Reclaim Scan Results"));
}

#[test]
fn test_scan_quick_and_detailed_fail() {
    let tmp = TempDir::new().unwrap();
    reclaim()
        .args(["scan", "--quick", "--detailed", "--root"])
        .arg(root_arg("temp", tmp.path()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be combined"));
}

#[test]
fn test_scan_unknown_category_fails() {
    reclaim()
        .args(["scan", "--root", "nonsense=/tmp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown category"));
}

#[test]
fn test_scan_rejects_tag_category_roots() {
    let tmp = TempDir::new().unwrap();
    reclaim()
        .args(["scan", "--root"])
        .arg(root_arg("large_file", tmp.path()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used for a root"));
}

#[test]
fn test_scan_zero_timeout_fails() {
    let tmp = TempDir::new().unwrap();
    reclaim()
        .args(["scan", "--timeout", "0", "--root"])
        .arg(root_arg("temp", tmp.path()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
}

// ─── Clean command ───────────────────────────────────────────────────────────

#[test]
fn test_clean_requires_categories() {
    reclaim().arg("clean").assert().failure();
}

#[test]
fn test_clean_dry_run_keeps_files() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("cache");
    fs::create_dir_all(&root).unwrap();
    let file = root.join("blob.bin");
    fs::write(&file, b"cached").unwrap();
    let config = write_config(tmp.path());

    reclaim()
        .args(["clean", "--categories", "user_cache", "--format", "json", "--config"])
        .arg(&config)
        .args(["--root", &root_arg("user_cache", &root)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"safe_mode\": true"))
        .stdout(predicate::str::contains("\"bytes_freed\": 6"));

    assert!(file.exists());
}

#[test]
fn test_clean_execute_then_restore() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("cache");
    fs::create_dir_all(&root).unwrap();
    let file = root.join("blob.bin");
    fs::write(&file, b"cached").unwrap();
    let config = write_config(tmp.path());

    reclaim()
        .args(["clean", "-c", "user_cache", "--execute", "--yes", "--format", "json"])
        .arg("--config")
        .arg(&config)
        .args(["--root", &root_arg("user_cache", &root)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"files_removed\": 1"));
    assert!(!file.exists());

    reclaim()
        .args(["restore", "--list", "--format", "quiet", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("backups"));

    reclaim()
        .args(["restore", "--last", "--format", "quiet", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1"));
    assert_eq!(fs::read(&file).unwrap(), b"cached");
}

#[test]
fn test_declined_prompt_keeps_stdout_clean() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("cache");
    fs::create_dir_all(&root).unwrap();
    let file = root.join("blob.bin");
    fs::write(&file, b"cached").unwrap();
    let config = write_config(tmp.path());

    reclaim()
        .args(["clean", "-c", "user_cache", "--execute", "--format", "json", "--config"])
        .arg(&config)
        .args(["--root", &root_arg("user_cache", &root)])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("blob.bin"))
        .stderr(predicate::str::contains("[y/N]"));
    assert!(file.exists());
}

#[test]
fn test_restore_without_target_fails() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path());
    reclaim()
        .arg("restore")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--last"));
}

// ─── Config command ──────────────────────────────────────────────────────────

#[test]
fn test_config_show() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path());
    reclaim()
        .args(["config", "show", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("min_file_age_hours = 0"))
        .stdout(predicate::str::contains("exclude_patterns"));
}

#[test]
fn test_config_init_and_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("config.toml");

    reclaim()
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    reclaim()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    reclaim()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

// ─── Completions ─────────────────────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    reclaim()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reclaim"));
}
