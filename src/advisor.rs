//! Pluggable second opinion on deletion safety.
//!
//! An advisor can only make things more conservative: it may raise a
//! record's risk level during a scan and veto entries of a cleanup plan.
//! The default [`NoopAdvisor`] does neither.

use std::path::PathBuf;

use crate::cleaner::CleanupPlan;
use crate::scanner::records::{FileRecord, Refusal, RiskLevel};

pub trait SafetyAdvisor: Send + Sync {
    fn name(&self) -> &str {
        "none"
    }

    /// A risk level for this record, if the advisor has an opinion.
    /// Levels lower than the policy's are ignored.
    fn assess(&self, _record: &FileRecord) -> Option<RiskLevel> {
        None
    }

    /// Paths that must be dropped from the plan before execution
    fn review_plan(&self, _plan: &CleanupPlan) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Advisor that never intervenes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAdvisor;

impl SafetyAdvisor for NoopAdvisor {}

/// Apply an advisor's assessments, returning how many records were escalated
pub fn apply_assessments(advisor: &dyn SafetyAdvisor, records: &mut [FileRecord]) -> usize {
    let mut escalated = 0;
    for record in records.iter_mut() {
        let Some(level) = advisor.assess(record) else {
            continue;
        };
        if level <= record.risk_level {
            continue;
        }
        record.risk_level = level;
        if level == RiskLevel::High && record.safe_to_delete {
            record.safe_to_delete = false;
            record.refusal = Some(Refusal::HighRisk);
        }
        escalated += 1;
    }
    escalated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::records::{Category, FileType};

    struct FlagEverything;

    impl SafetyAdvisor for FlagEverything {
        fn assess(&self, _record: &FileRecord) -> Option<RiskLevel> {
            Some(RiskLevel::High)
        }
    }

    struct Lenient;

    impl SafetyAdvisor for Lenient {
        fn assess(&self, _record: &FileRecord) -> Option<RiskLevel> {
            Some(RiskLevel::Low)
        }
    }

    fn record(risk: RiskLevel) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/tmp/x/y.tmp"),
            size: 10,
            modified: chrono::Utc::now(),
            category: Category::Temp,
            file_type: FileType::Cache,
            safe_to_delete: true,
            risk_level: risk,
            refusal: None,
            content_hash: None,
            duplicate_group_id: None,
        }
    }

    #[test]
    fn test_noop_changes_nothing() {
        let mut records = vec![record(RiskLevel::Low)];
        assert_eq!(apply_assessments(&NoopAdvisor, &mut records), 0);
        assert!(records[0].safe_to_delete);
    }

    #[test]
    fn test_escalation_to_high_blocks_deletion() {
        let mut records = vec![record(RiskLevel::Low)];
        assert_eq!(apply_assessments(&FlagEverything, &mut records), 1);
        assert_eq!(records[0].risk_level, RiskLevel::High);
        assert!(!records[0].safe_to_delete);
    }

    #[test]
    fn test_cannot_lower_risk() {
        let mut records = vec![record(RiskLevel::Medium)];
        assert_eq!(apply_assessments(&Lenient, &mut records), 0);
        assert_eq!(records[0].risk_level, RiskLevel::Medium);
    }
}
