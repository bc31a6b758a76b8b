use async_trait::async_trait;
use log::info;

use crate::auth::Token;
use crate::error::{PipescopeError, Result};
use crate::pipeline::{Pipeline, PipelineState};
use crate::providers::{remote_path, Provider, ProviderKind};

use super::client::GitLabClient;
use super::types::GitLabPipelineDto;

const PENDING_STATUSES: [&str; 5] = [
    "created",
    "waiting_for_resource",
    "preparing",
    "pending",
    "running",
];

/// GitLab CI/CD adapter.
///
/// GitLab accepts either a numeric project id or the URL-encoded
/// path-with-namespace wherever a project is expected, so remotes are
/// reduced to `group/subgroup/project` and passed through as-is.
pub struct GitLabProvider {
    client: GitLabClient,
}

/// Reduces a remote URL to GitLab's path-with-namespace.
fn parse_project_path(path: &str) -> Result<String> {
    let project = remote_path(path);

    let is_numeric_id = !project.is_empty() && project.chars().all(|c| c.is_ascii_digit());
    if is_numeric_id || (project.contains('/') && !project.contains(char::is_whitespace)) {
        Ok(project)
    } else {
        Err(PipescopeError::InvalidRepositoryPath(path.to_string()))
    }
}

impl GitLabProvider {
    /// Creates a provider for the GitLab instance at `base_url`
    /// (e.g. <https://gitlab.com>).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the URL is invalid.
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = GitLabClient::new(base_url, token)?;
        Ok(Self { client })
    }

    fn to_pipeline(dto: GitLabPipelineDto) -> Pipeline {
        Pipeline {
            id: dto.id,
            project_id: dto.project_id.to_string(),
            commit_sha: dto.sha.unwrap_or_default(),
            status: dto.status,
            url: dto.web_url.unwrap_or_default(),
            created_at: dto.created_at,
        }
    }
}

#[async_trait]
impl Provider for GitLabProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    async fn resolve_project_id(&self, repo_path: &str) -> Result<String> {
        let project = parse_project_path(repo_path)?;
        let dto = self
            .client
            .fetch_project(&project)
            .await
            .map_err(|e| PipescopeError::fetch(format!("failed to get project_id of {project}"), e))?;

        Ok(dto.id.to_string())
    }

    async fn pipeline_by_sha(&self, repo_path: &str, sha: &str) -> Result<Pipeline> {
        let project = parse_project_path(repo_path)?;
        info!("Looking up pipelines for {project}@{sha}");

        let pipelines = self
            .client
            .fetch_pipelines_for_sha(&project, sha)
            .await
            .map_err(|e| {
                PipescopeError::fetch(format!("failed to retrieve pipelines of {project}"), e)
            })?;

        let dto = pipelines
            .into_iter()
            .next()
            .ok_or_else(|| PipescopeError::PipelineNotFound {
                project,
                sha: sha.to_string(),
            })?;

        Ok(Self::to_pipeline(dto))
    }

    async fn pipeline(&self, project_id: &str, pipeline_id: u64) -> Result<Pipeline> {
        let dto = self
            .client
            .fetch_pipeline(project_id, pipeline_id)
            .await
            .map_err(|e| {
                PipescopeError::fetch(
                    format!("failed to retrieve pipeline {pipeline_id} for project_id={project_id}"),
                    e,
                )
            })?;

        Ok(Self::to_pipeline(dto))
    }

    fn is_pending(&self, status: &str) -> bool {
        PENDING_STATUSES.contains(&status)
    }

    fn state(&self, status: &str) -> PipelineState {
        match status {
            s if self.is_pending(s) => PipelineState::Pending,
            "success" => PipelineState::Succeeded,
            "failed" => PipelineState::Failed,
            "canceled" => PipelineState::Canceled,
            other => PipelineState::Unknown(other.to_string()),
        }
    }
}
