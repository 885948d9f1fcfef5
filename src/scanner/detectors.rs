use chrono::{DateTime, Duration, Utc};

use super::records::FileRecord;

/// Records strictly larger than `threshold_bytes`, largest first.
/// Copies only; the source records are untouched.
pub fn large_files(records: &[FileRecord], threshold_bytes: u64) -> Vec<FileRecord> {
    let mut found: Vec<FileRecord> = records
        .iter()
        .filter(|r| r.size > threshold_bytes)
        .cloned()
        .collect();
    found.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    found
}

/// Records last modified more than `days` ago, oldest first
pub fn old_files(records: &[FileRecord], days: u32, now: DateTime<Utc>) -> Vec<FileRecord> {
    let cutoff = now - Duration::days(days as i64);
    let mut found: Vec<FileRecord> = records
        .iter()
        .filter(|r| r.modified < cutoff)
        .cloned()
        .collect();
    found.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::records::{Category, FileType, RiskLevel};
    use std::path::PathBuf;

    fn record(path: &str, size: u64, age_days: i64, now: DateTime<Utc>) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            size,
            modified: now - Duration::days(age_days),
            category: Category::UserCache,
            file_type: FileType::Other,
            safe_to_delete: true,
            risk_level: RiskLevel::Low,
            refusal: None,
            content_hash: None,
            duplicate_group_id: None,
        }
    }

    #[test]
    fn test_large_threshold_is_strict() {
        let now = Utc::now();
        let mib = 1024 * 1024;
        let records = vec![
            record("/a", 10 * mib, 0, now),
            record("/b", 10 * mib + 1, 0, now),
            record("/c", 50 * mib, 0, now),
        ];
        let found = large_files(&records, 10 * mib);
        let paths: Vec<_> = found.iter().map(|r| r.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["/c", "/b"]);
    }

    #[test]
    fn test_old_files_keep_category() {
        let now = Utc::now();
        let records = vec![
            record("/new", 10, 5, now),
            record("/old", 10, 120, now),
            record("/older", 10, 400, now),
        ];
        let found = old_files(&records, 90, now);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, PathBuf::from("/older"));
        assert!(found.iter().all(|r| r.category == Category::UserCache));
    }
}
