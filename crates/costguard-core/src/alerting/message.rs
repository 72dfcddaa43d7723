//! Notification text

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{ComplianceFinding, SpikeVerdict};

/// Subject used for cost spike notifications
pub const SPIKE_SUBJECT: &str = "Cloud Cost Guard: non-prod spike";

/// Subject used for tag audit notifications
pub const TAG_AUDIT_SUBJECT: &str = "Cloud Cost Guard: tag audit";

/// A rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

fn fixed(value: Decimal, places: u32) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", places as usize, rounded)
}

/// Render the cost spike notification
pub fn spike_notification(env_tag_value: &str, verdict: &SpikeVerdict) -> Notification {
    let top = verdict
        .top_services
        .iter()
        .map(|s| format!("{} ${}", s.service, fixed(s.yesterday_cost, 2)))
        .collect::<Vec<_>>()
        .join(", ");

    let body = format!(
        "Non-prod cost spike detected for {env_tag_value}:\n\
         Yesterday: ${}\n\
         Trailing 7-day avg: ${}\n\
         Change: +${} ({}%)\n\
         \n\
         Top services: {top}",
        fixed(verdict.yesterday_cost, 2),
        fixed(verdict.trailing_average, 2),
        fixed(verdict.absolute_delta, 2),
        fixed(verdict.percent_delta, 1),
    );

    Notification {
        subject: SPIKE_SUBJECT.to_string(),
        body,
    }
}

/// Render the tag audit notification, listing the first `sample_size` resources
pub fn tag_audit_notification(
    total_resources: usize,
    findings: &[ComplianceFinding],
    sample_size: usize,
) -> Notification {
    let examples = findings
        .iter()
        .take(sample_size)
        .map(|f| f.resource_id.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Notification {
        subject: TAG_AUDIT_SUBJECT.to_string(),
        body: format!(
            "Tag audit found {} non-compliant resources out of {total_resources}. \
             Top {sample_size} examples:\n{examples}",
            findings.len(),
        ),
    }
}
