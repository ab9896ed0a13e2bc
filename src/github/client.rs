use reqwest::{header, Client};

use crate::error::{Error, Result};
use crate::github::paginator::Paginator;
use crate::github::rate_limiter::RateLimiter;
use crate::models::{WorkflowRun, WorkflowRunPage};

pub struct GitHubClient {
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl GitHubClient {
    /// Anonymous access works for public repositories at a much lower quota.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("changeclass/0.1"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(),
            base_url: "https://api.github.com".to_string(),
        })
    }

    /// Completed workflow runs, newest first.
    pub async fn get_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        max_runs: Option<usize>,
    ) -> Result<Vec<WorkflowRun>> {
        let url = format!(
            "{}/repos/{}/{}/actions/runs?status=completed",
            self.base_url, owner, repo
        );
        let paginator = Paginator::new(&self.client, &self.rate_limiter);
        tracing::info!("Fetching workflow runs for: {}/{}", owner, repo);
        paginator
            .fetch_limited::<WorkflowRunPage>(&url, 100, max_runs)
            .await
    }
}

/// Splits a GitHub remote url into `(owner, repo)`.
pub fn parse_repo_slug(url: &str) -> Result<(String, String)> {
    let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
    let path = trimmed
        .strip_prefix("git@github.com:")
        .or_else(|| trimmed.split_once("github.com/").map(|(_, rest)| rest))
        .unwrap_or(trimmed);

    let mut parts = path.split('/').filter(|p| !p.is_empty());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) => Ok((owner.to_string(), repo.to_string())),
        _ => Err(Error::Config(format!(
            "cannot derive owner/repo from {}; pass --github owner/name",
            url
        ))),
    }
}
