//! Continuation-token pagination
//!
//! A [`PageSource`] fetches one page at a time; [`pages`] turns it into a lazy
//! stream that starts from the first page every time it is called.

use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

use crate::error::{Error, Result};

/// One page of results and the token for the next one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Continuation token; `None` or empty means this was the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }
}

/// Anything that can fetch a page given a continuation token
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Item type on each page
    type Item: Send;

    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    /// Fetch the page for `token` (`None` for the first page)
    async fn fetch_page(&self, token: Option<String>) -> Result<Page<Self::Item>>;
}

/// Lazy sequence of pages from `source`, following tokens until none remain
pub fn pages<S>(source: &S) -> impl Stream<Item = Result<Vec<S::Item>>> + Send + '_
where
    S: PageSource + ?Sized,
{
    // None: exhausted. Some(token): fetch with token.
    stream::try_unfold(Some(None::<String>), move |state| async move {
        let Some(token) = state else {
            return Ok(None);
        };

        let page = source.fetch_page(token.clone()).await?;
        let next = page.next_token.filter(|t| !t.is_empty());

        if next.is_some() && next == token {
            return Err(Error::collaborator(
                source.name(),
                "pagination token did not advance",
            ));
        }

        Ok(Some((page.items, next.map(Some))))
    })
}

/// Drain every page of `source` into one vector
pub async fn collect_all<S>(source: &S) -> Result<Vec<S::Item>>
where
    S: PageSource + ?Sized,
{
    let mut stream = Box::pin(pages(source));
    let mut items = Vec::new();
    let mut page_count = 0usize;

    while let Some(page) = stream.try_next().await? {
        page_count += 1;
        items.extend(page);
    }

    debug!(
        source = source.name(),
        pages = page_count,
        items = items.len(),
        "Collected paginated results"
    );

    Ok(items)
}
