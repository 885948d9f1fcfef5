use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use super::hasher::{self, HashedSet};
use super::resolver;
use crate::common::progress;
use crate::common::safety::SafetyPolicy;
use crate::scanner::records::{FileRecord, Refusal, RiskLevel};

/// Byte-identical files found during a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub id: usize,
    pub hash: String,
    /// Size of each member
    pub file_size: u64,
    /// The copy that is never offered for deletion
    pub retained: PathBuf,
    /// Retained member first, the rest ordered by path
    pub members: Vec<FileRecord>,
    pub total_size: u64,
    /// `total_size` minus the retained copy
    pub potential_savings: u64,
}

impl DuplicateGroup {
    /// Members other than the retained copy
    pub fn redundant(&self) -> impl Iterator<Item = &FileRecord> {
        self.members.iter().filter(move |m| m.path != self.retained)
    }
}

/// Result of the duplicate post-pass
#[derive(Debug, Default)]
pub struct DuplicateAnalysis {
    pub groups: Vec<DuplicateGroup>,
    pub files_hashed: usize,
    pub errors: Vec<String>,
}

struct PendingGroup {
    hash: String,
    size: u64,
    retained: usize,
    members: Vec<usize>,
}

impl PendingGroup {
    fn savings(&self) -> u64 {
        self.size * (self.members.len() as u64 - 1)
    }
}

/// Find duplicate groups across all records and annotate them in place.
///
/// Sets `content_hash` on every fully hashed record and
/// `duplicate_group_id` on every group member. The retained copy is marked
/// not deletable; the others are re-evaluated with the duplicate rules.
pub fn analyze_duplicates(
    records: &mut [FileRecord],
    policy: &SafetyPolicy,
    now: DateTime<Utc>,
    min_size: u64,
    show_progress: bool,
) -> DuplicateAnalysis {
    let mut analysis = DuplicateAnalysis::default();

    // ── Pass 1: Group by file size ────────────────────────────────────────
    let buckets = hasher::bucket_by_size(records, min_size);
    if buckets.is_empty() {
        return analysis;
    }
    debug!(buckets = buckets.len(), "size buckets with candidates");

    // ── Passes 2-3: hash buckets in parallel ──────────────────────────────
    let pb = progress::make_progress(
        show_progress,
        buckets.len() as u64,
        "Hashing duplicate candidates...",
    );
    let shared: &[FileRecord] = records;
    let hashed: Vec<HashedSet> = buckets
        .par_iter()
        .map(|(size, members)| {
            let set = hasher::hash_bucket(shared, *size, members);
            progress::inc(&pb);
            set
        })
        .collect();
    progress::clear(pb);

    let mut pending = Vec::new();
    for set in hashed {
        for (hash, members) in set.groups() {
            let Some(retained) = resolver::retained_member(records, &members) else {
                continue;
            };
            pending.push(PendingGroup {
                size: records[retained].size,
                members: resolver::order_members(records, &members, retained),
                retained,
                hash,
            });
        }
        analysis.files_hashed += set.digests.len();
        for (idx, digest) in set.digests {
            records[idx].content_hash = Some(digest);
        }
        analysis.errors.extend(set.errors);
    }

    pending.sort_by(|a, b| {
        b.savings()
            .cmp(&a.savings())
            .then_with(|| a.hash.cmp(&b.hash))
    });

    for (id, group) in pending.into_iter().enumerate() {
        for &idx in &group.members {
            let record = &mut records[idx];
            record.duplicate_group_id = Some(id);
            if idx == group.retained {
                if record.safe_to_delete {
                    record.safe_to_delete = false;
                    record.refusal = Some(Refusal::RetainedDuplicate);
                }
            } else {
                let verdict = policy.evaluate_duplicate(&record.path, record.age_hours(now));
                // Risk may already have been raised by an advisor; never lower it
                let risk = verdict.risk_level.max(record.risk_level);
                if verdict.safe_to_delete && risk == RiskLevel::High {
                    record.safe_to_delete = false;
                    record.refusal = Some(Refusal::HighRisk);
                } else {
                    record.safe_to_delete = verdict.safe_to_delete;
                    record.refusal = verdict.refusal;
                }
                record.risk_level = risk;
            }
        }

        let members: Vec<FileRecord> = group.members.iter().map(|&i| records[i].clone()).collect();
        let total_size = group.size * members.len() as u64;
        analysis.groups.push(DuplicateGroup {
            id,
            potential_savings: group.savings(),
            retained: records[group.retained].path.clone(),
            hash: group.hash,
            file_size: group.size,
            members,
            total_size,
        });
    }

    debug!(
        groups = analysis.groups.len(),
        hashed = analysis.files_hashed,
        "duplicate analysis finished"
    );
    analysis
}
