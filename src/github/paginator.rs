use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::{sleep, Duration};

use crate::error::{Error, Result};
use crate::github::rate_limiter::RateLimiter;
use crate::models::{WorkflowRun, WorkflowRunPage};

const MAX_ATTEMPTS: u32 = 3;

/// One page of a listing endpoint that wraps its items in an envelope.
pub trait Page: DeserializeOwned {
    type Item;
    fn into_items(self) -> Vec<Self::Item>;
}

impl Page for WorkflowRunPage {
    type Item = WorkflowRun;

    fn into_items(self) -> Vec<WorkflowRun> {
        self.workflow_runs
    }
}

pub struct Paginator<'a> {
    client: &'a Client,
    rate_limiter: &'a RateLimiter,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a Client, rate_limiter: &'a RateLimiter) -> Self {
        Self {
            client,
            rate_limiter,
        }
    }

    /// Follows `rel="next"` links until `max_items` items are collected or the
    /// listing ends.
    pub async fn fetch_limited<P: Page>(
        &self,
        base_url: &str,
        per_page: u32,
        max_items: Option<usize>,
    ) -> Result<Vec<P::Item>> {
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            let url = page_url(base_url, per_page, page);
            let (items, has_next) = self.fetch_page_with_retry::<P>(&url).await?;
            let items_count = items.len();
            all_items.extend(items);

            let full = max_items.is_some_and(|max| all_items.len() >= max);
            if full || !has_next || items_count < per_page as usize {
                break;
            }

            page += 1;
        }

        if let Some(max) = max_items {
            all_items.truncate(max);
        }
        Ok(all_items)
    }

    async fn fetch_page_with_retry<P: Page>(&self, url: &str) -> Result<(Vec<P::Item>, bool)> {
        let mut attempt = 1;
        loop {
            match self.fetch_page::<P>(url).await {
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    let backoff = match &e {
                        Error::RateLimited(secs) => Duration::from_secs(*secs),
                        _ => Duration::from_secs(2u64.pow(attempt)),
                    };
                    tracing::warn!("{} failed ({}), retrying in {:?}", url, e, backoff);
                    sleep(backoff).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Items of one page and whether the listing continues.
    async fn fetch_page<P: Page>(&self, url: &str) -> Result<(Vec<P::Item>, bool)> {
        self.rate_limiter.wait().await;

        tracing::debug!("Fetching: {}", url);
        let response = self.client.get(url).send().await?;
        self.rate_limiter.update_from_response(&response).await;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN && self.rate_limiter.remaining().await == 0)
        {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Err(Error::RateLimited(retry_after));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!("{} returned {} - {}", url, status, body)));
        }

        let has_next = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("rel=\"next\""))
            .unwrap_or(false);

        Ok((response.json::<P>().await?.into_items(), has_next))
    }
}

fn page_url(base_url: &str, per_page: u32, page: u32) -> String {
    let separator = if base_url.contains('?') { "&" } else { "?" };
    format!("{}{}per_page={}&page={}", base_url, separator, per_page, page)
}
