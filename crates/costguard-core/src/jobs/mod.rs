//! Invocation pipelines
//!
//! Each job owns its collaborators, runs once per call and never keeps state
//! between runs.

mod cost_spike;
mod tag_audit;

pub use cost_spike::{CostSpikeJob, CostSpikeSettings};
pub use tag_audit::{TagAuditJob, TagAuditSettings};

use std::sync::Arc;

use crate::alerting::{notifier_for, Notifier};
use crate::collector::{
    http_client, CostFetcher, HttpCostFetcher, HttpResourceFetcher, ResourceFetcher,
};
use crate::config::Config;
use crate::error::Result;
use crate::storage::{FileReportSink, ReportSink};

/// The concrete collaborators for a configured deployment
#[derive(Clone)]
pub struct Collaborators {
    /// Billing API client
    pub costs: Arc<dyn CostFetcher>,
    /// Inventory API client
    pub resources: Arc<dyn ResourceFetcher>,
    /// Report destination
    pub sink: Arc<dyn ReportSink>,
    /// Notification channel
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// Build HTTP clients, the filesystem sink and the configured notifier
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http_client(&config.http)?;

        Ok(Self {
            costs: Arc::new(HttpCostFetcher::new(
                client.clone(),
                config.billing.endpoint.clone(),
            )),
            resources: Arc::new(HttpResourceFetcher::new(
                client.clone(),
                config.inventory.endpoint.clone(),
                config.inventory.page_size,
            )),
            sink: Arc::new(FileReportSink::new(config.report_root()?)),
            notifier: Arc::from(notifier_for(&config.notification_target()?, client)),
        })
    }

    /// Cost spike job over these collaborators
    pub fn cost_spike_job(&self, config: &Config) -> Result<CostSpikeJob> {
        Ok(CostSpikeJob::new(
            self.costs.clone(),
            self.sink.clone(),
            self.notifier.clone(),
            CostSpikeSettings::from_config(config)?,
        ))
    }

    /// Tag audit job over these collaborators
    pub fn tag_audit_job(&self, config: &Config) -> TagAuditJob {
        TagAuditJob::new(
            self.resources.clone(),
            self.sink.clone(),
            self.notifier.clone(),
            TagAuditSettings::from_config(config),
        )
    }
}
