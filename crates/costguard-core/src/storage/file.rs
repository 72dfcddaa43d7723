//! Filesystem report sink

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::fs;
use tracing::info;

use crate::error::Result;

use super::{ReportKind, ReportSink, StoredReport};

/// Writes reports as JSON files under a root directory
#[derive(Debug, Clone)]
pub struct FileReportSink {
    root: PathBuf,
}

impl FileReportSink {
    /// Create a sink rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write via a temp file and rename so readers never see a partial report
    async fn write(&self, key: &str, body: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &path).await?;

        Ok(path)
    }
}

#[async_trait]
impl ReportSink for FileReportSink {
    async fn put_report(
        &self,
        kind: ReportKind,
        as_of: NaiveDate,
        report: &serde_json::Value,
    ) -> Result<StoredReport> {
        let body = serde_json::to_vec(report)?;

        let latest = self.write(&kind.latest_key(), &body).await?;
        let snapshot = self.write(&kind.snapshot_key(as_of), &body).await?;

        info!(
            report = kind.name(),
            latest = %latest.display(),
            snapshot = %snapshot.display(),
            bytes = body.len(),
            "Report written"
        );

        Ok(StoredReport {
            latest: latest.display().to_string(),
            snapshot: snapshot.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_writes_latest_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileReportSink::new(dir.path());
        let as_of = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let report = json!({"as_of": "2024-05-15", "spike": null});

        let stored = sink
            .put_report(ReportKind::CostSummary, as_of, &report)
            .await
            .unwrap();

        let latest = dir.path().join("reports/summary.json");
        let snapshot = dir.path().join("timeseries/2024-05-15.json");
        assert_eq!(stored.latest, latest.display().to_string());
        assert_eq!(stored.snapshot, snapshot.display().to_string());

        for path in [latest, snapshot] {
            let written: serde_json::Value =
                serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
            assert_eq!(written, report);
        }
    }

    #[tokio::test]
    async fn test_overwrites_latest() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileReportSink::new(dir.path());
        let day1 = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();

        sink.put_report(ReportKind::TagAudit, day1, &json!({"noncompliant": 1}))
            .await
            .unwrap();
        sink.put_report(ReportKind::TagAudit, day2, &json!({"noncompliant": 2}))
            .await
            .unwrap();

        let latest: serde_json::Value = serde_json::from_slice(
            &std::fs::read(dir.path().join("reports/tag_audit.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(latest["noncompliant"], 2);
        assert!(dir.path().join("tag_audit/2024-05-15.json").exists());
        assert!(dir.path().join("tag_audit/2024-05-16.json").exists());
        assert!(!dir.path().join("reports/tag_audit.json.tmp").exists());
    }
}
