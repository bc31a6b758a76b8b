use chrono::{DateTime, Utc};
use serde::Deserialize;

/// GitHub Actions workflow run, as returned by `/actions/runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubWorkflowRun {
    /// Unique identifier for the workflow run
    pub id: u64,
    /// SHA of the head commit
    #[serde(default)]
    pub head_sha: Option<String>,
    /// Status of the run (queued, in_progress, completed, ...)
    #[serde(default)]
    pub status: Option<String>,
    /// Conclusion of the run (success, failure, etc.), set once completed
    #[serde(default)]
    pub conclusion: Option<String>,
    /// Browser link to the run
    #[serde(default)]
    pub html_url: Option<String>,
    /// When the run was created
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Repository the run belongs to
    #[serde(default)]
    pub repository: Option<GitHubRepository>,
}

impl GitHubWorkflowRun {
    /// Status shown to users: the conclusion replaces `completed` once it is known.
    pub fn display_status(&self) -> String {
        let status = self.status.clone().unwrap_or_default();
        match (&self.conclusion, status.as_str()) {
            (Some(conclusion), "completed") => conclusion.clone(),
            _ => status,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepository {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Response from GitHub API for workflow runs.
#[derive(Debug, Deserialize)]
pub struct WorkflowRunsResponse {
    #[serde(default)]
    pub total_count: u64,
    pub workflow_runs: Vec<GitHubWorkflowRun>,
}

/// Links for GitHub resources.
pub mod links {
    /// Generate URL for a workflow run.
    pub fn workflow_run_url(owner: &str, repo: &str, run_id: u64) -> String {
        format!("https://github.com/{owner}/{repo}/actions/runs/{run_id}")
    }
}
