//! Tag audit job: fetch → evaluate → report → notify

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::alerting::{tag_audit_notification, Notifier};
use crate::collector::ResourceFetcher;
use crate::config::Config;
use crate::error::Result;
use crate::evaluator::evaluate_compliance;
use crate::models::{CompliancePolicy, ComplianceReport, TagAuditOutcome};
use crate::storage::{ReportKind, ReportSink};

/// Settings for [`TagAuditJob`]
#[derive(Debug, Clone)]
pub struct TagAuditSettings {
    /// Policy resources are checked against
    pub policy: CompliancePolicy,
    /// Findings kept in the report
    pub report_finding_limit: usize,
    /// Resource ids listed in the notification
    pub notification_sample_size: usize,
}

impl TagAuditSettings {
    /// Settings from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: config.compliance_policy(),
            report_finding_limit: config.compliance.report_finding_limit,
            notification_sample_size: config.compliance.notification_sample_size,
        }
    }
}

/// Tag compliance audit
pub struct TagAuditJob {
    fetcher: Arc<dyn ResourceFetcher>,
    sink: Arc<dyn ReportSink>,
    notifier: Arc<dyn Notifier>,
    settings: TagAuditSettings,
}

impl TagAuditJob {
    /// Create a job from its collaborators
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        sink: Arc<dyn ReportSink>,
        notifier: Arc<dyn Notifier>,
        settings: TagAuditSettings,
    ) -> Self {
        Self {
            fetcher,
            sink,
            notifier,
            settings,
        }
    }

    /// Run once, stamping the snapshot with `today`
    #[instrument(name = "tag_audit", skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn run(&self, today: NaiveDate) -> Result<TagAuditOutcome> {
        let resources = self.fetcher.fetch_all_tagged_resources().await?;
        info!(resources = resources.len(), "Fetched tagged resources");

        let findings = evaluate_compliance(&resources, &self.settings.policy);
        info!(
            noncompliant = findings.len(),
            total = resources.len(),
            "Evaluated tag compliance"
        );

        let report = ComplianceReport::assemble(
            resources.len(),
            &findings,
            self.settings.report_finding_limit,
        );
        let stored = self
            .sink
            .put_report(ReportKind::TagAudit, today, &serde_json::to_value(&report)?)
            .await?;
        info!(latest = %stored.latest, snapshot = %stored.snapshot, "Tag audit report stored");

        let alerted = if findings.is_empty() {
            false
        } else {
            let notification = tag_audit_notification(
                resources.len(),
                &findings,
                self.settings.notification_sample_size,
            );
            self.notifier
                .notify(&notification.subject, &notification.body)
                .await?;
            info!(channel = self.notifier.channel(), "Tag audit alert sent");
            true
        };

        Ok(TagAuditOutcome {
            ok: true,
            noncompliant: findings.len(),
            total_resources: resources.len(),
            alerted,
            report: stored,
        })
    }
}
