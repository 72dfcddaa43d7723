//! Configuration management for Cost Guard
//!
//! Values are layered from built-in defaults, an optional TOML file and
//! `COSTGUARD_<SECTION>__<FIELD>` environment variables, in that order.

use std::path::{Path, PathBuf};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::evaluator::SpikeThresholds;
use crate::models::CompliancePolicy;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "COSTGUARD";

/// Keys whose environment values are comma-separated lists
const LIST_KEYS: [&str; 2] = ["compliance.required_tags", "compliance.allowed_env_values"];

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Monitored environment class
    pub monitor: MonitorConfig,

    /// Spike thresholds
    pub spike: SpikeConfig,

    /// Tag compliance policy
    pub compliance: ComplianceConfig,

    /// Billing API
    pub billing: BillingConfig,

    /// Resource inventory API
    pub inventory: InventoryConfig,

    /// Shared HTTP client settings
    pub http: HttpConfig,

    /// Report destination
    pub reports: ReportsConfig,

    /// Notification destination
    pub notifications: NotificationsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Which tagged environment the cost pipeline watches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Tag key used to filter costs
    pub env_tag_key: String,
    /// Tag value used to filter costs
    pub env_tag_value: String,
    /// Days of history fetched per run
    pub lookback_days: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            env_tag_key: "Environment".to_string(),
            env_tag_value: "nonprod".to_string(),
            lookback_days: 14,
        }
    }
}

/// Spike configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpikeConfig {
    /// Minimum percentage increase over the trailing average
    pub percent_threshold: f64,
    /// Minimum absolute increase in dollars
    pub minimum_dollars: f64,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            percent_threshold: 30.0,
            minimum_dollars: 20.0,
        }
    }
}

/// Compliance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Tags every resource must carry with a non-blank value
    pub required_tags: Vec<String>,
    /// Values allowed for the environment tag
    pub allowed_env_values: Vec<String>,
    /// Maximum findings written into the report
    pub report_finding_limit: usize,
    /// Resource ids listed in the notification body
    pub notification_sample_size: usize,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            required_tags: vec![
                "Environment".to_string(),
                "Owner".to_string(),
                "CostCenter".to_string(),
            ],
            allowed_env_values: vec![
                "nonprod".to_string(),
                "dev".to_string(),
                "qa".to_string(),
                "stage".to_string(),
            ],
            report_finding_limit: 200,
            notification_sample_size: 10,
        }
    }
}

/// Billing API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Cost-and-usage endpoint
    pub endpoint: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4566/cost-explorer".to_string(),
        }
    }
}

/// Resource inventory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Tag-mapping endpoint
    pub endpoint: String,
    /// Resources requested per page
    pub page_size: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4566/tagging".to_string(),
            page_size: 100,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

/// Report destination (mandatory)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Root directory reports are written under
    pub root: Option<PathBuf>,
}

/// Notification destination (mandatory)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// `log` or a webhook URL
    pub channel: Option<String>,
}

/// Where notifications go, parsed from [`NotificationsConfig::channel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    /// Write notifications to the log only
    Log,
    /// POST notifications to a webhook
    Webhook(String),
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut env = ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .try_parsing(true);
        for key in LIST_KEYS {
            env = env.with_list_parse_key(key);
        }

        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let mut config: Self = builder.add_source(env).build()?.try_deserialize()?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Trim list entries and drop blanks
    pub fn normalize(&mut self) {
        fn clean(values: &mut Vec<String>) {
            *values = values
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
        }
        clean(&mut self.compliance.required_tags);
        clean(&mut self.compliance.allowed_env_values);
    }

    /// Check mandatory destinations and threshold sanity
    pub fn validate(&self) -> Result<()> {
        if self.reports.root.is_none() {
            return Err(Error::config("reports.root is required"));
        }
        self.notification_target()?;

        for (name, value) in [
            ("spike.percent_threshold", self.spike.percent_threshold),
            ("spike.minimum_dollars", self.spike.minimum_dollars),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.monitor.lookback_days < 8 {
            return Err(Error::config(
                "monitor.lookback_days must be at least 8 to form a trailing baseline",
            ));
        }
        if self.monitor.env_tag_key.trim().is_empty() {
            return Err(Error::config("monitor.env_tag_key must not be blank"));
        }
        if self.compliance.required_tags.is_empty() {
            return Err(Error::config("compliance.required_tags must not be empty"));
        }
        if self.inventory.page_size == 0 {
            return Err(Error::config("inventory.page_size must be positive"));
        }

        Ok(())
    }

    /// Report root directory
    pub fn report_root(&self) -> Result<&Path> {
        self.reports
            .root
            .as_deref()
            .ok_or_else(|| Error::config("reports.root is required"))
    }

    /// Parse the notification destination
    pub fn notification_target(&self) -> Result<NotificationTarget> {
        let channel = self
            .notifications
            .channel
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::config("notifications.channel is required"))?;

        if channel.eq_ignore_ascii_case("log") {
            Ok(NotificationTarget::Log)
        } else if channel.starts_with("http://") || channel.starts_with("https://") {
            Ok(NotificationTarget::Webhook(channel.to_string()))
        } else {
            Err(Error::config(format!(
                "notifications.channel must be `log` or an http(s) URL, got `{channel}`"
            )))
        }
    }

    /// Build the spike thresholds
    pub fn spike_thresholds(&self) -> Result<SpikeThresholds> {
        let to_decimal = |name: &str, value: f64| {
            Decimal::from_f64(value)
                .ok_or_else(|| Error::config(format!("{name} is not representable: {value}")))
        };

        Ok(SpikeThresholds::new(
            to_decimal("spike.percent_threshold", self.spike.percent_threshold)?,
            to_decimal("spike.minimum_dollars", self.spike.minimum_dollars)?,
        ))
    }

    /// Build the compliance policy
    pub fn compliance_policy(&self) -> CompliancePolicy {
        CompliancePolicy::new(
            self.compliance.required_tags.iter().cloned(),
            self.monitor.env_tag_key.clone(),
            self.compliance.allowed_env_values.iter().cloned(),
        )
    }
}
