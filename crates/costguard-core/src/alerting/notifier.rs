//! Notification delivery

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::config::NotificationTarget;
use crate::error::{Error, Result};

const COLLABORATOR: &str = "notifier";

/// Sends a subject/body message somewhere a human will see it
///
/// Returning `Ok` means the channel accepted the message; delivery is not
/// tracked beyond that.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs
    fn channel(&self) -> &'static str;

    /// Publish a message
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
}

/// Build the notifier for a configured target
pub fn notifier_for(target: &NotificationTarget, client: Client) -> Box<dyn Notifier> {
    match target {
        NotificationTarget::Log => Box::new(LogNotifier),
        NotificationTarget::Webhook(url) => Box::new(WebhookNotifier::new(client, url.clone())),
    }
}

/// Writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn channel(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        info!(subject, body, "Notification");
        Ok(())
    }
}

/// POSTs notifications as JSON to a webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    message: &'a str,
}

impl WebhookNotifier {
    /// Create a webhook notifier
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn channel(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                subject,
                message: body,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::collaborator(
                COLLABORATOR,
                format!("webhook returned {status}: {body}"),
            ));
        }

        info!(url = %self.url, subject, "Webhook notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_accepts() {
        let notifier = notifier_for(&NotificationTarget::Log, Client::new());
        assert_eq!(notifier.channel(), "log");
        assert!(notifier.notify("subject", "body").await.is_ok());
    }

    #[test]
    fn test_webhook_target() {
        let notifier = notifier_for(
            &NotificationTarget::Webhook("http://localhost:9/hook".to_string()),
            Client::new(),
        );
        assert_eq!(notifier.channel(), "webhook");
    }
}
