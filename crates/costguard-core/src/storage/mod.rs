//! Report persistence
//!
//! Every report is written twice: to a canonical "latest" key that consumers
//! poll, and to a dated snapshot key that keeps history.

mod file;

pub use file::FileReportSink;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Logical report names and their key layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Cost spike summary and time series
    CostSummary,
    /// Tag compliance audit
    TagAudit,
}

impl ReportKind {
    /// Logical report name
    pub fn name(self) -> &'static str {
        match self {
            Self::CostSummary => "summary",
            Self::TagAudit => "tag_audit",
        }
    }

    /// Key of the always-current copy
    pub fn latest_key(self) -> String {
        format!("reports/{}.json", self.name())
    }

    /// Key of the snapshot for `as_of`
    pub fn snapshot_key(self, as_of: NaiveDate) -> String {
        let prefix = match self {
            Self::CostSummary => "timeseries",
            Self::TagAudit => "tag_audit",
        };
        format!("{prefix}/{}.json", as_of.format("%Y-%m-%d"))
    }
}

/// Where a report ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    /// Location of the latest copy
    pub latest: String,
    /// Location of the dated snapshot
    pub snapshot: String,
}

/// Destination for assembled reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Persist `report` under both keys of `kind`
    async fn put_report(
        &self,
        kind: ReportKind,
        as_of: NaiveDate,
        report: &serde_json::Value,
    ) -> Result<StoredReport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let as_of = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();

        assert_eq!(ReportKind::CostSummary.latest_key(), "reports/summary.json");
        assert_eq!(
            ReportKind::CostSummary.snapshot_key(as_of),
            "timeseries/2024-05-15.json"
        );
        assert_eq!(ReportKind::TagAudit.latest_key(), "reports/tag_audit.json");
        assert_eq!(
            ReportKind::TagAudit.snapshot_key(as_of),
            "tag_audit/2024-05-15.json"
        );
    }
}
