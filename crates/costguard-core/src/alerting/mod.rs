//! Alerting for Cost Guard
//!
//! Renders spike and tag audit notifications and delivers them.

mod message;
mod notifier;

pub use message::{
    spike_notification, tag_audit_notification, Notification, SPIKE_SUBJECT, TAG_AUDIT_SUBJECT,
};
pub use notifier::{notifier_for, LogNotifier, Notifier, WebhookNotifier};
