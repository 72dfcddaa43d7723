//! Resource inventory client
//!
//! Walks the tag-mapping API page by page using `PaginationToken`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::TaggedResource;

use super::pagination::{collect_all, Page, PageSource};
use super::ResourceFetcher;

const COLLABORATOR: &str = "inventory";

/// HTTP resource fetcher
#[derive(Debug, Clone)]
pub struct HttpResourceFetcher {
    client: Client,
    endpoint: String,
    page_size: u32,
}

impl HttpResourceFetcher {
    /// Create a fetcher against `endpoint`
    pub fn new(client: Client, endpoint: impl Into<String>, page_size: u32) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            page_size,
        }
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn fetch_all_tagged_resources(&self) -> Result<Vec<TaggedResource>> {
        collect_all(self)
            .await?
            .into_iter()
            .map(RawResource::into_resource)
            .collect()
    }
}

#[async_trait]
impl PageSource for HttpResourceFetcher {
    type Item = RawResource;

    fn name(&self) -> &'static str {
        COLLABORATOR
    }

    async fn fetch_page(&self, token: Option<String>) -> Result<Page<RawResource>> {
        let request = GetResourcesRequest {
            resources_per_page: self.page_size,
            pagination_token: token,
        };

        let response = self
            .client
            .post(&self.endpoint)
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

        let page: GetResourcesResponse = response.json().await?;
        debug!(
            resources = page.resource_tag_mapping_list.len(),
            "Fetched resource page"
        );

        Ok(Page::new(
            page.resource_tag_mapping_list,
            page.pagination_token,
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetResourcesRequest {
    resources_per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetResourcesResponse {
    #[serde(default)]
    resource_tag_mapping_list: Vec<RawResource>,
    pagination_token: Option<String>,
}

/// A resource as the inventory API reports it
#[derive(Debug, Clone, Deserialize)]
pub struct RawResource {
    #[serde(rename = "ResourceARN")]
    resource_arn: Option<String>,
    #[serde(rename = "Tags", default)]
    tags: Vec<RawTag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTag {
    key: String,
    #[serde(default)]
    value: String,
}

impl RawResource {
    fn into_resource(self) -> Result<TaggedResource> {
        let id = self
            .resource_arn
            .filter(|arn| !arn.is_empty())
            .ok_or_else(|| Error::malformed("resource without ResourceARN"))?;

        Ok(TaggedResource::new(
            id,
            self.tags.into_iter().map(|t| (t.key, t.value)),
        ))
    }
}
