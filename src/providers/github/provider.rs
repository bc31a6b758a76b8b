use async_trait::async_trait;
use log::info;

use crate::auth::Token;
use crate::error::{PipescopeError, Result};
use crate::pipeline::{Pipeline, PipelineState};
use crate::providers::{remote_path, Provider, ProviderKind};

use super::client::GitHubClient;
use super::types::{links, GitHubWorkflowRun};

const PENDING_STATUSES: [&str; 2] = ["queued", "in_progress"];

/// GitHub Actions adapter.
pub struct GitHubProvider {
    client: GitHubClient,
}

/// Splits a remote URL or `owner/repo` path into owner and repository name.
pub(super) fn parse_repository_path(path: &str) -> Result<(String, String)> {
    let repository = remote_path(path);

    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(PipescopeError::InvalidRepositoryPath(path.to_string())),
    }
}

impl GitHubProvider {
    /// Creates a provider talking to the GitHub REST API at `base_url`
    /// (e.g. <https://api.github.com>).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the URL is invalid.
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = GitHubClient::new(base_url, token)?;
        Ok(Self { client })
    }

    fn to_pipeline(run: GitHubWorkflowRun, owner: &str, repo: &str) -> Pipeline {
        let status = run.display_status();
        let project_id = run
            .repository
            .as_ref()
            .and_then(|r| r.full_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("{owner}/{repo}"));

        Pipeline {
            id: run.id,
            project_id,
            commit_sha: run.head_sha.unwrap_or_default(),
            url: run
                .html_url
                .unwrap_or_else(|| links::workflow_run_url(owner, repo, run.id)),
            status,
            created_at: run.created_at,
        }
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    async fn resolve_project_id(&self, repo_path: &str) -> Result<String> {
        let (owner, repo) = parse_repository_path(repo_path)?;
        let repository = self
            .client
            .fetch_repository(&owner, &repo)
            .await
            .map_err(|e| PipescopeError::fetch("failed to get project_id from GitHub", e))?;

        Ok(repository.id.to_string())
    }

    async fn pipeline_by_sha(&self, repo_path: &str, sha: &str) -> Result<Pipeline> {
        let (owner, repo) = parse_repository_path(repo_path)?;
        info!("Looking up workflow runs for {owner}/{repo}@{sha}");

        let runs = self
            .client
            .fetch_runs_for_sha(&owner, &repo, sha)
            .await
            .map_err(|e| PipescopeError::fetch("failed to retrieve pipelines from GitHub", e))?;

        let run = runs
            .into_iter()
            .next()
            .ok_or_else(|| PipescopeError::PipelineNotFound {
                project: format!("{owner}/{repo}"),
                sha: sha.to_string(),
            })?;

        Ok(Self::to_pipeline(run, &owner, &repo))
    }

    async fn pipeline(&self, project_id: &str, pipeline_id: u64) -> Result<Pipeline> {
        let (owner, repo) = parse_repository_path(project_id)?;
        let run = self
            .client
            .fetch_run(&owner, &repo, pipeline_id)
            .await
            .map_err(|e| {
                PipescopeError::fetch(
                    format!("failed to retrieve run {pipeline_id} of {owner}/{repo} from GitHub"),
                    e,
                )
            })?;

        Ok(Self::to_pipeline(run, &owner, &repo))
    }

    fn is_pending(&self, status: &str) -> bool {
        PENDING_STATUSES.contains(&status)
    }

    fn state(&self, status: &str) -> PipelineState {
        match status {
            s if self.is_pending(s) => PipelineState::Pending,
            "success" => PipelineState::Succeeded,
            "failure" | "timed_out" | "startup_failure" => PipelineState::Failed,
            "cancelled" => PipelineState::Canceled,
            other => PipelineState::Unknown(other.to_string()),
        }
    }
}
