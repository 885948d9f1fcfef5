use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::advisor::{NoopAdvisor, SafetyAdvisor};
use crate::cleaner::{self, CleanOptions, CleanupPlan, CleanupResult};
use crate::common::config::Config;
use crate::common::errors::ReclaimError;
use crate::scanner::{self, PathCatalog, ScanOptions, ScanReport};

/// Operations kept in the history ring
const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Scan,
    Clean,
}

/// Summary of one finished or failed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub kind: OperationKind,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub files: usize,
    pub bytes: u64,
    pub errors: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Owns the configuration, the advisor and the most recent scan report.
///
/// Only the latest report is kept. A cleanup takes it out of the engine,
/// so each report is cleaned at most once.
pub struct Engine {
    config: Config,
    advisor: Box<dyn SafetyAdvisor>,
    last_report: Option<ScanReport>,
    history: VecDeque<OperationRecord>,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self, ReclaimError> {
        config.validate()?;
        Ok(Self {
            config,
            advisor: Box::new(NoopAdvisor),
            last_report: None,
            history: VecDeque::new(),
        })
    }

    pub fn with_advisor(mut self, advisor: Box<dyn SafetyAdvisor>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn last_report(&self) -> Option<&ScanReport> {
        self.last_report.as_ref()
    }

    /// Hand the report out of the engine
    pub fn take_report(&mut self) -> Option<ScanReport> {
        self.last_report.take()
    }

    /// Oldest first
    pub fn history(&self) -> impl Iterator<Item = &OperationRecord> {
        self.history.iter()
    }

    /// Scan and keep the report, replacing any previous one
    pub fn scan(
        &mut self,
        catalog: &PathCatalog,
        options: &ScanOptions,
    ) -> Result<&ScanReport, ReclaimError> {
        match scanner::run_scan(catalog, options, &self.config, self.advisor.as_ref()) {
            Ok(report) => {
                self.record(OperationRecord {
                    kind: OperationKind::Scan,
                    timestamp: report.timestamp,
                    success: true,
                    files: report.total_files,
                    bytes: report.potential_space_savings,
                    errors: report.scan_errors.len(),
                    failure: None,
                });
                Ok(&*self.last_report.insert(report))
            }
            Err(e) => {
                self.record_failure(OperationKind::Scan, &e);
                Err(e)
            }
        }
    }

    /// The plan a cleanup with `options` would run against the last report,
    /// after the advisor's review. The report stays in the engine.
    pub fn preview(&self, options: &CleanOptions) -> Result<CleanupPlan, ReclaimError> {
        options.validate()?;
        let report = self.last_report.as_ref().ok_or(ReclaimError::NoReport)?;
        cleaner::reviewed_plan(report, options, self.advisor.as_ref())
    }

    /// Clean using the last report. Invalid options leave the report in place.
    pub fn clean(&mut self, options: &CleanOptions) -> Result<CleanupResult, ReclaimError> {
        options.validate()?;
        let report = self.last_report.take().ok_or(ReclaimError::NoReport)?;

        match cleaner::clean(report, options, &self.config, self.advisor.as_ref()) {
            Ok(result) => {
                self.record(OperationRecord {
                    kind: OperationKind::Clean,
                    timestamp: Utc::now(),
                    success: true,
                    files: result.files_removed,
                    bytes: result.bytes_freed,
                    errors: result.clean_errors.len(),
                    failure: None,
                });
                Ok(result)
            }
            Err(e) => {
                self.record_failure(OperationKind::Clean, &e);
                Err(e)
            }
        }
    }

    fn record_failure(&mut self, kind: OperationKind, error: &ReclaimError) {
        let (files, bytes, errors) = match error.partial_result() {
            Some(p) => (p.files_removed, p.bytes_freed, p.clean_errors.len()),
            None => (0, 0, 0),
        };
        self.record(OperationRecord {
            kind,
            timestamp: Utc::now(),
            success: false,
            files,
            bytes,
            errors,
            failure: Some(error.to_string()),
        });
    }

    fn record(&mut self, op: OperationRecord) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(op);
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("advisor", &self.advisor.name())
            .field("has_report", &self.last_report.is_some())
            .field("history", &self.history.len())
            .finish()
    }
}
