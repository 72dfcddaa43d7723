//! In-memory collaborators for pipeline tests

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use costguard::alerting::Notifier;
use costguard::collector::{CostFetcher, CostQuery, ResourceFetcher};
use costguard::models::{DailyCostRecord, ServiceCost, TaggedResource};
use costguard::storage::{ReportKind, ReportSink, StoredReport};
use costguard::{Error, Result};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One record per total, ending the day before `today`
pub fn series_ending_before(today: NaiveDate, totals: &[i64]) -> Vec<DailyCostRecord> {
    let first = today - Duration::days(totals.len() as i64);
    totals
        .iter()
        .enumerate()
        .map(|(i, total)| {
            DailyCostRecord::from_breakdown(
                first + Duration::days(i as i64),
                vec![ServiceCost::new("Amazon EC2", Decimal::from(*total))],
            )
        })
        .collect()
}

/// Returns a fixed series and records the queries it received
pub struct StaticCostFetcher {
    series: Vec<DailyCostRecord>,
    pub queries: Mutex<Vec<CostQuery>>,
}

impl StaticCostFetcher {
    pub fn new(series: Vec<DailyCostRecord>) -> Self {
        Self {
            series,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CostFetcher for StaticCostFetcher {
    async fn fetch_daily_costs(&self, query: &CostQuery) -> Result<Vec<DailyCostRecord>> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.series.clone())
    }
}

pub struct StaticResourceFetcher(pub Vec<TaggedResource>);

#[async_trait]
impl ResourceFetcher for StaticResourceFetcher {
    async fn fetch_all_tagged_resources(&self) -> Result<Vec<TaggedResource>> {
        Ok(self.0.clone())
    }
}

/// Fails every fetch
pub struct FailingFetcher;

#[async_trait]
impl CostFetcher for FailingFetcher {
    async fn fetch_daily_costs(&self, _query: &CostQuery) -> Result<Vec<DailyCostRecord>> {
        Err(Error::collaborator("billing", "throttled"))
    }
}

#[async_trait]
impl ResourceFetcher for FailingFetcher {
    async fn fetch_all_tagged_resources(&self) -> Result<Vec<TaggedResource>> {
        Err(Error::collaborator("inventory", "access denied"))
    }
}

/// Keeps every report in memory
#[derive(Default)]
pub struct MemorySink {
    pub reports: Mutex<Vec<(ReportKind, NaiveDate, serde_json::Value)>>,
}

impl MemorySink {
    pub fn single(&self) -> (ReportKind, NaiveDate, serde_json::Value) {
        let reports = self.reports.lock().unwrap();
        assert_eq!(reports.len(), 1, "expected exactly one report");
        reports[0].clone()
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn put_report(
        &self,
        kind: ReportKind,
        as_of: NaiveDate,
        report: &serde_json::Value,
    ) -> Result<StoredReport> {
        self.reports
            .lock()
            .unwrap()
            .push((kind, as_of, report.clone()));
        Ok(StoredReport {
            latest: kind.latest_key(),
            snapshot: kind.snapshot_key(as_of),
        })
    }
}

/// Records notifications, optionally failing after recording
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        if self.fail {
            return Err(Error::collaborator("notifier", "topic not found"));
        }
        Ok(())
    }
}
