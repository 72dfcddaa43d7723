//! Collector module - cost and resource inventory fetching
//!
//! The jobs only see the [`CostFetcher`] and [`ResourceFetcher`] traits;
//! pagination and wire formats stay inside the HTTP implementations.

mod billing;
mod inventory;
pub mod pagination;

pub use billing::HttpCostFetcher;
pub use inventory::{HttpResourceFetcher, RawResource};
pub use pagination::{collect_all, pages, Page, PageSource};

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;

use crate::config::HttpConfig;
use crate::error::Result;
use crate::models::{DailyCostRecord, TaggedResource};

/// Daily cost query for one tagged environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    /// First day, inclusive
    pub start: NaiveDate,
    /// Last day, exclusive
    pub end: NaiveDate,
    /// Tag key to filter on
    pub tag_key: String,
    /// Tag value to filter on
    pub tag_value: String,
    /// Whether to break each day down by service
    pub group_by_service: bool,
}

/// Source of daily cost data
#[async_trait::async_trait]
pub trait CostFetcher: Send + Sync {
    /// Fetch every day in the query window, ascending by date
    async fn fetch_daily_costs(&self, query: &CostQuery) -> Result<Vec<DailyCostRecord>>;
}

/// Source of tagged resources
#[async_trait::async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the full resource inventory
    async fn fetch_all_tagged_resources(&self) -> Result<Vec<TaggedResource>>;
}

/// Build the HTTP client shared by the fetchers and the webhook notifier
pub fn http_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(concat!("costguard/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
