use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::auth::Token;
use crate::error::{PipescopeError, Result};

use super::types::{GitHubWorkflowRun, WorkflowRunsResponse};

/// Thin GitHub REST v3 client covering the workflow-run endpoints.
pub struct GitHubClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

#[derive(Debug, Deserialize)]
pub struct GitHubRepositoryDto {
    pub id: u64,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("pipescope/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PipescopeError::Config(format!("Failed to create HTTP client: {e}")))?;

        // keep any path prefix (GitHub Enterprise serves the API under /api/v3)
        let api_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| PipescopeError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    fn repo_url(&self, owner: &str, repo: &str, rest: &str) -> Result<Url> {
        self.api_url
            .join(&format!(
                "repos/{}/{}{rest}",
                urlencoding::encode(owner),
                urlencoding::encode(repo)
            ))
            .map_err(|e| PipescopeError::Config(format!("Invalid repository URL: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self.auth_request(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(PipescopeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }

    pub async fn fetch_repository(&self, owner: &str, repo: &str) -> Result<GitHubRepositoryDto> {
        let url = self.repo_url(owner, repo, "")?;
        debug!("GET {url}");
        self.get_json(self.client.get(url)).await
    }

    /// Fetches the first page (one entry) of runs for a head commit.
    pub async fn fetch_runs_for_sha(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<GitHubWorkflowRun>> {
        let url = self.repo_url(owner, repo, "/actions/runs")?;
        debug!("GET {url} head_sha={sha}");
        let request = self
            .client
            .get(url)
            .query(&[("head_sha", sha), ("page", "1"), ("per_page", "1")]);

        let response: WorkflowRunsResponse = self.get_json(request).await?;
        debug!("GitHub reports {} runs for {sha}", response.total_count);
        Ok(response.workflow_runs)
    }

    pub async fn fetch_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<GitHubWorkflowRun> {
        let url = self.repo_url(owner, repo, &format!("/actions/runs/{run_id}"))?;
        debug!("GET {url}");
        self.get_json(self.client.get(url)).await
    }
}
