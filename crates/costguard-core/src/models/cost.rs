//! Cost time-series data models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cost attributed to one service on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCost {
    /// Service name as reported by the billing API
    pub service: String,
    /// Cost in dollars
    pub cost: Decimal,
}

impl ServiceCost {
    /// Create a new service cost entry
    pub fn new(service: impl Into<String>, cost: Decimal) -> Self {
        Self {
            service: service.into(),
            cost,
        }
    }
}

/// One day of cost for the monitored environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCostRecord {
    /// Calendar day (UTC)
    pub date: NaiveDate,

    /// Total cost for the day
    pub total: Decimal,

    /// Per-service breakdown, in the order the billing API reported it
    pub by_service: Vec<ServiceCost>,
}

impl DailyCostRecord {
    /// Build a day from its service breakdown; the total is the sum of services
    pub fn from_breakdown(date: NaiveDate, by_service: Vec<ServiceCost>) -> Self {
        let total = by_service.iter().map(|s| s.cost).sum();
        Self {
            date,
            total,
            by_service,
        }
    }

    /// Build a day that only carries a total
    pub fn from_total(date: NaiveDate, total: Decimal) -> Self {
        Self {
            date,
            total,
            by_service: Vec::new(),
        }
    }
}

/// Date-ascending sequence of daily records
pub type CostTimeSeries = Vec<DailyCostRecord>;

/// A service's cost on the most recent day of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopService {
    /// Service name
    pub service: String,
    /// Cost on the most recent day
    pub yesterday_cost: Decimal,
}

/// Outcome of comparing the most recent day against its trailing baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpikeVerdict {
    /// Cost of the most recent day
    #[serde(rename = "yesterday")]
    pub yesterday_cost: Decimal,

    /// Mean of the seven days before the most recent day
    #[serde(rename = "trailing7")]
    pub trailing_average: Decimal,

    /// `yesterday_cost - trailing_average`
    #[serde(rename = "diff")]
    pub absolute_delta: Decimal,

    /// Delta as a percentage of the trailing average (0 when the baseline is 0)
    #[serde(rename = "pct")]
    pub percent_delta: Decimal,

    /// Up to five most expensive services on the most recent day
    pub top_services: Vec<TopService>,
}
