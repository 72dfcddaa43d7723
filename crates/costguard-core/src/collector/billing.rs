//! Billing API client
//!
//! Speaks the cost-and-usage JSON page format: daily results with an optional
//! per-service `Groups` breakdown and a `NextPageToken` continuation.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{DailyCostRecord, ServiceCost};

use super::pagination::{collect_all, Page, PageSource};
use super::{CostFetcher, CostQuery};

const COST_METRIC: &str = "UnblendedCost";
const COLLABORATOR: &str = "billing";

/// HTTP cost fetcher
#[derive(Debug, Clone)]
pub struct HttpCostFetcher {
    client: Client,
    endpoint: String,
}

impl HttpCostFetcher {
    /// Create a fetcher against `endpoint`
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CostFetcher for HttpCostFetcher {
    async fn fetch_daily_costs(&self, query: &CostQuery) -> Result<Vec<DailyCostRecord>> {
        let pages = CostPages {
            fetcher: self,
            query,
        };
        let raw = collect_all(&pages).await?;

        let records = raw
            .into_iter()
            .map(RawCostDay::into_record)
            .collect::<Result<Vec<_>>>()?;

        into_series(records)
    }
}

/// One query's worth of pages
struct CostPages<'a> {
    fetcher: &'a HttpCostFetcher,
    query: &'a CostQuery,
}

#[async_trait]
impl<'a> PageSource for CostPages<'a> {
    type Item = RawCostDay;

    fn name(&self) -> &'static str {
        COLLABORATOR
    }

    async fn fetch_page(&self, token: Option<String>) -> Result<Page<RawCostDay>> {
        let request = CostAndUsageRequest::new(self.query, token);

        let response = self
            .fetcher
            .client
            .post(&self.fetcher.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::collaborator(
                COLLABORATOR,
                format!("returned {status}: {body}"),
            ));
        }

        let page: CostAndUsageResponse = response.json().await?;
        debug!(
            days = page.results_by_time.len(),
            has_more = page.next_page_token.is_some(),
            "Fetched cost page"
        );

        Ok(Page::new(page.results_by_time, page.next_page_token))
    }
}

/// Sort by date and reject duplicate days
fn into_series(mut records: Vec<DailyCostRecord>) -> Result<Vec<DailyCostRecord>> {
    records.sort_by_key(|r| r.date);

    for pair in records.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.date == next.date {
            return Err(Error::malformed(format!(
                "billing returned {} more than once",
                next.date
            )));
        }
        if next.date.signed_duration_since(prev.date).num_days() > 1 {
            warn!(after = %prev.date, before = %next.date, "Gap in cost series");
        }
    }

    Ok(records)
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CostAndUsageRequest<'a> {
    time_period: TimePeriod,
    granularity: &'static str,
    metrics: [&'static str; 1],
    filter: Filter<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_by: Option<[GroupDefinition; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_page_token: Option<String>,
}

impl<'a> CostAndUsageRequest<'a> {
    fn new(query: &'a CostQuery, next_page_token: Option<String>) -> Self {
        Self {
            time_period: TimePeriod {
                start: query.start,
                end: query.end,
            },
            granularity: "DAILY",
            metrics: [COST_METRIC],
            filter: Filter {
                tags: TagFilter {
                    key: &query.tag_key,
                    values: [&query.tag_value],
                    match_options: ["EQUALS"],
                },
            },
            group_by: query.group_by_service.then_some([GroupDefinition {
                kind: "DIMENSION",
                key: "SERVICE",
            }]),
            next_page_token,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TimePeriod {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Filter<'a> {
    tags: TagFilter<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TagFilter<'a> {
    key: &'a str,
    values: [&'a str; 1],
    match_options: [&'static str; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GroupDefinition {
    #[serde(rename = "Type")]
    kind: &'static str,
    key: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CostAndUsageResponse {
    #[serde(default)]
    results_by_time: Vec<RawCostDay>,
    next_page_token: Option<String>,
}

/// A day as the billing API reports it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawCostDay {
    time_period: Option<RawTimePeriod>,
    #[serde(default)]
    total: Option<HashMap<String, RawMetric>>,
    groups: Option<Vec<RawGroup>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTimePeriod {
    start: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawGroup {
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    metrics: HashMap<String, RawMetric>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMetric {
    amount: Option<String>,
}

impl RawCostDay {
    /// Convert into a record
    ///
    /// A `Groups` array (even an empty one) defines the day's total as the
    /// sum of its services; otherwise the explicit total is used. A day with
    /// neither is rejected rather than read as zero.
    pub(crate) fn into_record(self) -> Result<DailyCostRecord> {
        let date = self
            .time_period
            .and_then(|p| p.start)
            .ok_or_else(|| Error::malformed("cost day without TimePeriod.Start"))?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| Error::malformed(format!("cost day has invalid date `{date}`: {e}")))?;

        if let Some(groups) = self.groups {
            let by_service = groups
                .into_iter()
                .map(|group| group.into_service_cost(date))
                .collect::<Result<Vec<_>>>()?;
            return Ok(DailyCostRecord::from_breakdown(date, by_service));
        }

        let total = self
            .total
            .as_ref()
            .and_then(|metrics| metrics.get(COST_METRIC))
            .ok_or_else(|| {
                Error::malformed(format!("cost day {date} has neither a total nor groups"))
            })?;

        Ok(DailyCostRecord::from_total(date, parse_amount(total, date)?))
    }
}

impl RawGroup {
    fn into_service_cost(self, date: NaiveDate) -> Result<ServiceCost> {
        let service = self
            .keys
            .into_iter()
            .next()
            .ok_or_else(|| Error::malformed(format!("cost group on {date} has no service key")))?;
        let metric = self.metrics.get(COST_METRIC).ok_or_else(|| {
            Error::malformed(format!("cost group {service} on {date} has no {COST_METRIC}"))
        })?;

        Ok(ServiceCost::new(service, parse_amount(metric, date)?))
    }
}

fn parse_amount(metric: &RawMetric, date: NaiveDate) -> Result<Decimal> {
    let amount = metric
        .amount
        .as_deref()
        .ok_or_else(|| Error::malformed(format!("cost metric on {date} has no Amount")))?;

    Decimal::from_str(amount)
        .or_else(|_| Decimal::from_scientific(amount))
        .map_err(|e| Error::malformed(format!("cost amount `{amount}` on {date}: {e}")))
}
