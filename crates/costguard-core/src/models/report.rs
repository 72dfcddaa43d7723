//! Report and invocation result models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::storage::StoredReport;

use super::compliance::ComplianceFinding;
use super::cost::{DailyCostRecord, SpikeVerdict};

/// Findings written into a compliance report unless configured otherwise
pub const DEFAULT_REPORT_FINDING_LIMIT: usize = 200;

/// Cost summary persisted after each cost run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    /// Day the run executed
    pub as_of: NaiveDate,
    /// Tag key the costs were filtered on
    pub env_tag_key: String,
    /// Tag value the costs were filtered on
    pub env_tag_value: String,
    /// `None` when there was not enough history
    pub spike: Option<SpikeVerdict>,
    /// Every day fetched for this run
    pub timeseries: Vec<DailyCostRecord>,
}

/// Tag audit summary persisted after each compliance run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Resources inspected
    pub total_resources: usize,
    /// Size of the full finding set
    pub noncompliant: usize,
    /// Leading findings, capped for report size
    pub findings: Vec<ComplianceFinding>,
}

impl ComplianceReport {
    /// Build a report, keeping at most `limit` findings
    ///
    /// `noncompliant` always counts every finding.
    pub fn assemble(total_resources: usize, findings: &[ComplianceFinding], limit: usize) -> Self {
        Self {
            total_resources,
            noncompliant: findings.len(),
            findings: findings.iter().take(limit).cloned().collect(),
        }
    }
}

/// Result of a cost spike run, handed back to the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSpikeOutcome {
    /// Whether the run completed
    pub ok: bool,
    /// Computed verdict, `None` with insufficient history
    pub spike: Option<SpikeVerdict>,
    /// Whether a notification was sent
    pub alerted: bool,
    /// Where the cost report was written
    pub report: StoredReport,
}

/// Result of a tag audit run, handed back to the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAuditOutcome {
    /// Whether the run completed
    pub ok: bool,
    /// Number of non-compliant resources
    pub noncompliant: usize,
    /// Number of resources inspected
    pub total_resources: usize,
    /// Whether a notification was sent
    pub alerted: bool,
    /// Where the compliance report was written
    pub report: StoredReport,
}

/// Result of a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedOutcome {
    /// Always `false`
    pub ok: bool,
    /// Error rendered for the scheduler's logs
    pub error: String,
}

impl FailedOutcome {
    /// Wrap an error message
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn finding(n: usize) -> ComplianceFinding {
        ComplianceFinding {
            resource_id: format!("arn:aws:s3:::bucket-{n}"),
            tags: BTreeMap::new(),
            missing_keys: BTreeSet::from(["Owner".to_string()]),
            invalid_environment_value: None,
        }
    }

    #[test]
    fn test_report_caps_findings_but_not_count() {
        let findings: Vec<_> = (0..250).map(finding).collect();
        let report = ComplianceReport::assemble(1000, &findings, DEFAULT_REPORT_FINDING_LIMIT);

        assert_eq!(report.total_resources, 1000);
        assert_eq!(report.noncompliant, 250);
        assert_eq!(report.findings.len(), 200);
        assert_eq!(report.findings[0].resource_id, "arn:aws:s3:::bucket-0");
        assert_eq!(report.findings[199].resource_id, "arn:aws:s3:::bucket-199");
    }

    #[test]
    fn test_report_under_cap_keeps_everything() {
        let findings: Vec<_> = (0..3).map(finding).collect();
        let report = ComplianceReport::assemble(10, &findings, DEFAULT_REPORT_FINDING_LIMIT);
        assert_eq!(report.noncompliant, 3);
        assert_eq!(report.findings, findings);
    }

    #[test]
    fn test_finding_serialized_field_names() {
        let json = serde_json::to_value(finding(7)).unwrap();
        assert_eq!(json["arn"], "arn:aws:s3:::bucket-7");
        assert_eq!(json["missing"], serde_json::json!(["Owner"]));
        assert!(json["invalid_environment"].is_null());
    }

    #[test]
    fn test_failed_outcome_shape() {
        let json = serde_json::to_value(FailedOutcome::new("billing failed: 403")).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "error": "billing failed: 403"}));
    }
}
