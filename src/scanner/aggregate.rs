use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::records::{Category, CategoryStats, FileRecord, ScanReport};
use crate::duplicates::DuplicateGroup;

/// Estimated fraction saved by recompressing a photo, by extension
const PHOTO_COMPRESSION_RATIOS: &[(&str, f64)] = &[
    ("jpg", 0.10),
    ("jpeg", 0.10),
    ("png", 0.30),
    ("gif", 0.20),
    ("bmp", 0.90),
    ("tif", 0.60),
    ("tiff", 0.60),
    ("webp", 0.05),
    ("heic", 0.05),
    ("heif", 0.05),
];

pub fn photo_compression_ratio(ext: &str) -> f64 {
    PHOTO_COMPRESSION_RATIOS
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, r)| *r)
        .unwrap_or(0.0)
}

/// Everything the aggregator reduces into a report
#[derive(Debug, Default)]
pub struct ScanParts {
    pub records: Vec<FileRecord>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub large_files: Vec<FileRecord>,
    pub old_files: Vec<FileRecord>,
    pub errors: Vec<String>,
    pub timed_out: bool,
}

/// Pure reduction of scan output into a [`ScanReport`]
pub fn build_report(parts: ScanParts, timestamp: DateTime<Utc>, duration_secs: f64) -> ScanReport {
    let mut categories: BTreeMap<Category, CategoryStats> = BTreeMap::new();
    let mut cache_savings = 0u64;
    let mut photo_savings = 0u64;

    for record in &parts.records {
        let stats = categories.entry(record.category).or_default();
        stats.file_count += 1;
        stats.total_bytes += record.size;
        if record.safe_to_delete {
            stats.safe_count += 1;
            stats.safe_bytes += record.size;
        }

        // Duplicate members are counted through their group instead
        if record.safe_to_delete
            && record.category.is_cache_like()
            && record.duplicate_group_id.is_none()
        {
            cache_savings += record.size;
        }

        if record.category == Category::Photo {
            let ratio = record
                .extension()
                .map(|e| photo_compression_ratio(&e))
                .unwrap_or(0.0);
            photo_savings += (record.size as f64 * ratio).round() as u64;
        }
    }

    let duplicate_savings: u64 = parts
        .duplicate_groups
        .iter()
        .map(|g| g.potential_savings)
        .sum();

    ScanReport {
        timestamp,
        duration_secs,
        total_files: parts.records.len(),
        total_bytes: parts.records.iter().map(|r| r.size).sum(),
        categories,
        records: parts.records,
        duplicate_groups: parts.duplicate_groups,
        large_files: parts.large_files,
        old_files: parts.old_files,
        cache_savings,
        duplicate_savings,
        photo_savings,
        potential_space_savings: cache_savings + duplicate_savings + photo_savings,
        scan_errors: parts.errors,
        timed_out: parts.timed_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::records::{FileType, RiskLevel};
    use std::path::PathBuf;

    fn record(path: &str, size: u64, category: Category, safe: bool) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            size,
            modified: Utc::now(),
            category,
            file_type: FileType::Other,
            safe_to_delete: safe,
            risk_level: RiskLevel::Low,
            refusal: None,
            content_hash: None,
            duplicate_group_id: None,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(ScanParts::default(), Utc::now(), 0.0);
        assert_eq!(report.total_files, 0);
        assert_eq!(report.potential_space_savings, 0);
        assert!(report.scan_errors.is_empty());
    }

    #[test]
    fn test_savings_breakdown() {
        let mut dup = record("/d/b", 2000, Category::UserCache, true);
        dup.duplicate_group_id = Some(0);
        let parts = ScanParts {
            records: vec![
                record("/c/a", 100, Category::UserCache, true),
                record("/c/b", 50, Category::Temp, false),
                record("/p/a.png", 1000, Category::Photo, false),
                record("/dl/a", 70, Category::PotentialDuplicate, false),
                dup,
            ],
            duplicate_groups: vec![DuplicateGroup {
                id: 0,
                hash: "h".into(),
                file_size: 2000,
                retained: PathBuf::from("/d/a"),
                members: Vec::new(),
                total_size: 4000,
                potential_savings: 2000,
            }],
            ..Default::default()
        };

        let report = build_report(parts, Utc::now(), 1.5);
        assert_eq!(report.cache_savings, 100);
        assert_eq!(report.duplicate_savings, 2000);
        assert_eq!(report.photo_savings, 300);
        assert_eq!(report.potential_space_savings, 2400);
        assert_eq!(report.stats(Category::UserCache).file_count, 2);
        assert_eq!(report.stats(Category::Temp).safe_count, 0);
        assert_eq!(report.total_bytes, 3220);
    }

    #[test]
    fn test_unknown_photo_format() {
        assert_eq!(photo_compression_ratio("raw"), 0.0);
        assert_eq!(photo_compression_ratio("JPG"), 0.10);
    }
}
