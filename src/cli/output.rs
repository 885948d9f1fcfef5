use colored::*;
use std::path::PathBuf;

use crate::cleaner::{BackupManifest, CleanupPlan, CleanupResult, RestoreReport};
use crate::common::format::{self, display_path, format_size, format_size_colored};
use crate::scanner::{Category, FileRecord, ScanReport};

/// Files listed per section with `--list`
const LIST_LIMIT: usize = 10;

// ─── Scan ─────────────────────────────────────────────────────────────────────

/// Print scan results in human-readable format
pub fn print_scan_results(report: &ScanReport, list: bool) {
    println!();
    println!("  {} Reclaim Scan Results", "🧹");
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned in {}  •  {} reclaimable  •  {}",
        format::format_elapsed(report.duration_secs).cyan(),
        format_size_colored(report.potential_space_savings),
        format::plural(report.total_files, "file").dimmed()
    );
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if report.records.is_empty() {
        println!("  {} Nothing to reclaim here.", "✨");
        print_scan_errors(report);
        println!();
        return;
    }

    for (category, stats) in &report.categories {
        println!(
            "    {:<22} {:>10}  {}  {} safe ({})",
            category.to_string(),
            format_size(stats.total_bytes),
            format::share_bar(stats.safe_bytes, stats.total_bytes, 16),
            format_size(stats.safe_bytes).green(),
            format::plural(stats.safe_count, "file").dimmed()
        );

        if list {
            let records: Vec<&FileRecord> = report.records_in(*category).collect();
            print_records(&records);
        }
    }
    println!();

    print_duplicates(report, list);
    print_flagged("Large Files", &report.large_files, list);
    print_flagged("Old Files", &report.old_files, list);
    print_scan_errors(report);

    println!("{}", "─".repeat(60).dimmed());
    format::print_savings("Cache, logs and temp", report.cache_savings);
    format::print_savings("Duplicates", report.duplicate_savings);
    format::print_savings("Photo compression", report.photo_savings);
    println!(
        "  {} Total reclaimable: {}",
        "💾",
        format_size_colored(report.potential_space_savings)
    );
    println!(
        "  {} Run {} to preview a cleanup",
        "💡",
        "reclaim clean --categories <list>".cyan()
    );
    println!();
}

fn print_records(records: &[&FileRecord]) {
    for record in records.iter().take(LIST_LIMIT) {
        println!(
            "      {} {} ({}, {} risk, {})",
            "↳".dimmed(),
            format::short_path(&record.path, 60),
            format_size(record.size),
            format::format_risk(record.risk_level),
            format::format_verdict(record.safe_to_delete, record.refusal)
        );
    }
    if records.len() > LIST_LIMIT {
        println!(
            "      {} ... and {} more",
            "↳".dimmed(),
            (records.len() - LIST_LIMIT).to_string().dimmed()
        );
    }
}

fn print_duplicates(report: &ScanReport, list: bool) {
    if report.duplicate_groups.is_empty() {
        return;
    }
    println!(
        "  {} {} ({} groups, {} redundant)",
        "●".yellow(),
        "Duplicates".yellow().bold(),
        report.duplicate_groups.len(),
        format_size_colored(report.duplicate_savings),
    );
    if list {
        for group in report.duplicate_groups.iter().take(LIST_LIMIT) {
            println!(
                "    Group {} · {} files of {}",
                group.id.to_string().bold(),
                group.members.len(),
                format_size(group.file_size),
            );
            println!(
                "      {} {}",
                "keep →".dimmed(),
                display_path(&group.retained).green()
            );
            for member in group.redundant() {
                println!(
                    "      {} {}",
                    "  dup →".dimmed(),
                    display_path(&member.path).dimmed()
                );
            }
        }
    } else {
        println!("      Run with {} to see file paths", "--list".cyan());
    }
    println!();
}

fn print_flagged(title: &str, records: &[FileRecord], list: bool) {
    if records.is_empty() {
        return;
    }
    let total: u64 = records.iter().map(|r| r.size).sum();
    println!(
        "  {} {} ({}, {})",
        "●".cyan(),
        title.cyan().bold(),
        format::plural(records.len(), "file"),
        format_size(total)
    );
    if list {
        let refs: Vec<&FileRecord> = records.iter().collect();
        print_records(&refs);
    }
    println!();
}

fn print_scan_errors(report: &ScanReport) {
    if report.timed_out {
        println!(
            "  {} {}",
            "⏱".yellow(),
            "Scan timed out; results are partial".yellow()
        );
    }
    if report.scan_errors.is_empty() {
        return;
    }
    println!(
        "  {} {}",
        "⚠".yellow(),
        format!("{} warnings:", report.scan_errors.len()).yellow()
    );
    for error in report.scan_errors.iter().take(LIST_LIMIT) {
        println!("    {} {}", "→".dimmed(), error.dimmed());
    }
    if report.scan_errors.len() > LIST_LIMIT {
        println!(
            "    ... and {} more",
            (report.scan_errors.len() - LIST_LIMIT).to_string().dimmed()
        );
    }
    println!();
}

/// Print scan results as JSON
pub fn print_scan_json(report: &ScanReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}

/// Print a minimal summary
pub fn print_scan_quiet(report: &ScanReport) {
    println!(
        "{}  {}  {}",
        format_size(report.potential_space_savings),
        report.total_files,
        report.duplicate_groups.len()
    );
}

// ─── Clean ────────────────────────────────────────────────────────────────────

/// Summary shown before asking for confirmation. Goes to stderr along
/// with the prompt.
pub fn print_plan(plan: &CleanupPlan, categories: &[Category]) {
    eprintln!();
    let names: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
    eprintln!("  {} Cleanup plan: {}", "📋", names.join(", ").bold());
    eprintln!(
        "  {} and {} selected",
        format::plural(plan.len(), "file").cyan(),
        format_size_colored(plan.total_bytes)
    );
    for item in plan.items.iter().take(LIST_LIMIT) {
        eprintln!(
            "      {} {} ({})",
            "↳".dimmed(),
            format::short_path(&item.path, 60),
            format_size(item.size)
        );
    }
    if plan.len() > LIST_LIMIT {
        eprintln!("      {} ... and {} more", "↳".dimmed(), plan.len() - LIST_LIMIT);
    }
    if !plan.backup_enabled && !plan.safe_mode {
        eprintln!(
            "  {} {}",
            "⚠".yellow(),
            "Backups are disabled; removed files cannot be restored".yellow()
        );
    }
}

/// Print the outcome of a cleanup
pub fn print_clean_result(result: &CleanupResult) {
    println!();
    if result.safe_mode {
        println!(
            "  {} {} · would free {} from {}. No files modified.",
            "ℹ️",
            "Dry run".bold(),
            format_size_colored(result.bytes_freed),
            format::plural(result.planned_files, "file")
        );
        println!(
            "  {} Re-run with {} to back up and remove them",
            "💡",
            "--execute".cyan()
        );
    } else {
        println!(
            "  {} {} · {} files, {}",
            "✓".green(),
            "Cleaned".bold(),
            result.files_removed.to_string().cyan(),
            format_size_colored(result.bytes_freed),
        );
        if let Some(ref path) = result.backup_path {
            println!(
                "  {} Backup: {} ({} files)",
                "💾",
                display_path(path).cyan(),
                result.files_backed_up
            );
            println!(
                "  {} Undo with: {}",
                "💡",
                format!("reclaim restore {}", path.display()).cyan()
            );
        }
    }

    print_error_list(&result.clean_errors);
    println!();
}

pub fn print_clean_json(result: &CleanupResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}

pub fn print_clean_quiet(result: &CleanupResult) {
    println!(
        "{}  {}  {}",
        format_size(result.bytes_freed),
        result.files_removed,
        result
            .backup_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );
}

fn print_error_list(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    println!();
    println!("  {} {} errors:", "⚠".yellow(), errors.len());
    for (i, err) in errors.iter().enumerate().take(LIST_LIMIT) {
        println!("    {} {}", format!("{}.", i + 1).dimmed(), err.dimmed());
    }
    if errors.len() > LIST_LIMIT {
        println!(
            "    ... and {} more",
            (errors.len() - LIST_LIMIT).to_string().dimmed()
        );
    }
}

// ─── Restore ──────────────────────────────────────────────────────────────────

/// Print the list of backup sessions
pub fn print_backups(sessions: &[(PathBuf, BackupManifest)]) {
    println!();
    println!("  {} Backups", "📦");
    println!("{}", "─".repeat(80).dimmed());

    if sessions.is_empty() {
        println!("  No backups yet.");
        println!();
        return;
    }

    for (root, manifest) in sessions {
        let restorable = manifest
            .items
            .iter()
            .filter(|i| i.removed && i.backup_path.is_some())
            .count();
        println!(
            "  {} {}  {}  {} removed, {} restorable",
            "•".dimmed(),
            manifest.session_id.cyan(),
            manifest
                .timestamp
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed(),
            format_size(manifest.bytes_freed),
            format::plural(restorable, "file")
        );
        println!("      {} {}", "↳".dimmed(), display_path(root).dimmed());
    }
    println!();
}

/// Print the outcome of a restore
pub fn print_restore_report(report: &RestoreReport) {
    println!();
    println!(
        "  {} Restored {} files ({})",
        "✓".green(),
        report.restored_count.to_string().cyan(),
        format_size_colored(report.restored_bytes),
    );
    println!("  {} Backup: {}", "📦", report.session_id.cyan());

    if !report.errors.is_empty() {
        println!();
        println!(
            "  {} {} errors during restore:",
            "⚠".yellow(),
            report.errors.len()
        );
        for err in report.errors.iter().take(5) {
            println!("    {} {}", "→".dimmed(), err.dimmed());
        }
    }
    println!();
}
