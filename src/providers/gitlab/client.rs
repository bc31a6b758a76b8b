use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{PipescopeError, Result};

use super::types::{GitLabPipelineDto, GitLabProjectDto};

pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pipescope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipescopeError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| PipescopeError::Config(format!("Invalid base URL: {e}")))?
            .join("api/v4/")
            .map_err(|e| PipescopeError::Config(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    /// Helper to build authenticated requests
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.header("PRIVATE-TOKEN", token.as_str())
        } else {
            request
        }
    }

    /// Construct project base URL
    fn project_url(&self, project_id: &str) -> Result<Url> {
        self.api_url
            .join(&format!("projects/{}/", urlencoding::encode(project_id)))
            .map_err(|e| PipescopeError::Config(format!("Invalid project URL: {e}")))
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

    pub async fn fetch_project(&self, project_id: &str) -> Result<GitLabProjectDto> {
        // the project resource itself has no trailing slash
        let url = self
            .api_url
            .join(&format!("projects/{}", urlencoding::encode(project_id)))
            .map_err(|e| PipescopeError::Config(format!("Invalid project URL: {e}")))?;
        debug!("GET {url}");
        self.get_json(self.client.get(url)).await
    }

    /// Fetches the first page of pipelines for a commit, newest id first.
    pub async fn fetch_pipelines_for_sha(
        &self,
        project_id: &str,
        sha: &str,
    ) -> Result<Vec<GitLabPipelineDto>> {
        let url = self
            .project_url(project_id)?
            .join("pipelines")
            .map_err(|e| PipescopeError::Config(format!("Invalid pipelines URL: {e}")))?;
        debug!("GET {url} sha={sha}");

        let request = self
            .client
            .get(url)
            .query(&[("sha", sha), ("order_by", "id")]);
        self.get_json(request).await
    }

    /// Fetch a single pipeline
    pub async fn fetch_pipeline(
        &self,
        project_id: &str,
        pipeline_id: u64,
    ) -> Result<GitLabPipelineDto> {
        let url = self
            .project_url(project_id)?
            .join(&format!("pipelines/{pipeline_id}"))
            .map_err(|e| PipescopeError::Config(format!("Invalid pipeline URL: {e}")))?;
        debug!("GET {url}");
        self.get_json(self.client.get(url)).await
    }
}
