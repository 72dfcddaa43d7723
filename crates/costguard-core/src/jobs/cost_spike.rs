//! Cost spike job: fetch → evaluate → report → notify

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::alerting::{spike_notification, Notifier};
use crate::collector::{CostFetcher, CostQuery};
use crate::config::Config;
use crate::error::Result;
use crate::evaluator::{evaluate_spike, SpikeThresholds};
use crate::models::{CostReport, CostSpikeOutcome};
use crate::storage::{ReportKind, ReportSink};

/// Settings for [`CostSpikeJob`]
#[derive(Debug, Clone)]
pub struct CostSpikeSettings {
    /// Tag key identifying the monitored environment
    pub env_tag_key: String,
    /// Tag value identifying the monitored environment
    pub env_tag_value: String,
    /// Days of history fetched per run
    pub lookback_days: u32,
    /// Alert thresholds
    pub thresholds: SpikeThresholds,
}

impl CostSpikeSettings {
    /// Settings from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            env_tag_key: config.monitor.env_tag_key.clone(),
            env_tag_value: config.monitor.env_tag_value.clone(),
            lookback_days: config.monitor.lookback_days,
            thresholds: config.spike_thresholds()?,
        })
    }

    /// Fetch window ending (exclusively) at `today`
    pub fn query(&self, today: NaiveDate) -> CostQuery {
        CostQuery {
            start: today - Duration::days(i64::from(self.lookback_days)),
            end: today,
            tag_key: self.env_tag_key.clone(),
            tag_value: self.env_tag_value.clone(),
            group_by_service: true,
        }
    }
}

/// Daily cost spike check
pub struct CostSpikeJob {
    fetcher: Arc<dyn CostFetcher>,
    sink: Arc<dyn ReportSink>,
    notifier: Arc<dyn Notifier>,
    settings: CostSpikeSettings,
}

impl CostSpikeJob {
    /// Create a job from its collaborators
    pub fn new(
        fetcher: Arc<dyn CostFetcher>,
        sink: Arc<dyn ReportSink>,
        notifier: Arc<dyn Notifier>,
        settings: CostSpikeSettings,
    ) -> Self {
        Self {
            fetcher,
            sink,
            notifier,
            settings,
        }
    }

    /// Run once for `today`
    ///
    /// Collaborator failures propagate. The report is written before any
    /// notification is attempted, so a notifier failure leaves it in place.
    #[instrument(
        name = "cost_spike",
        skip(self),
        fields(run_id = %Uuid::new_v4(), env = %self.settings.env_tag_value)
    )]
    pub async fn run(&self, today: NaiveDate) -> Result<CostSpikeOutcome> {
        let query = self.settings.query(today);
        info!(start = %query.start, end = %query.end, "Fetching daily costs");

        let timeseries = self.fetcher.fetch_daily_costs(&query).await?;
        debug!(days = timeseries.len(), "Fetched cost series");

        let spike = evaluate_spike(&timeseries);
        match &spike {
            Some(verdict) => info!(
                yesterday = %verdict.yesterday_cost,
                trailing = %verdict.trailing_average,
                pct = %verdict.percent_delta.round_dp(1),
                "Evaluated cost spike"
            ),
            None => info!(
                days = timeseries.len(),
                "Not enough history for a spike determination"
            ),
        }

        let report = CostReport {
            as_of: today,
            env_tag_key: self.settings.env_tag_key.clone(),
            env_tag_value: self.settings.env_tag_value.clone(),
            spike: spike.clone(),
            timeseries,
        };
        let stored = self
            .sink
            .put_report(ReportKind::CostSummary, today, &serde_json::to_value(&report)?)
            .await?;
        info!(latest = %stored.latest, snapshot = %stored.snapshot, "Cost report stored");

        let alerted = match &spike {
            Some(verdict) if self.settings.thresholds.is_alertworthy(verdict) => {
                let notification = spike_notification(&self.settings.env_tag_value, verdict);
                self.notifier
                    .notify(&notification.subject, &notification.body)
                    .await?;
                info!(channel = self.notifier.channel(), "Cost spike alert sent");
                true
            }
            _ => false,
        };

        Ok(CostSpikeOutcome {
            ok: true,
            spike,
            alerted,
            report: stored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_window() {
        let settings = CostSpikeSettings {
            env_tag_key: "Environment".to_string(),
            env_tag_value: "nonprod".to_string(),
            lookback_days: 14,
            thresholds: SpikeThresholds::default(),
        };
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();

        let query = settings.query(today);
        assert_eq!(query.start, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(query.end, today);
        assert!(query.group_by_service);
        assert_eq!(query.tag_value, "nonprod");
    }
}
