use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A GitLab CI/CD pipeline as returned by the REST v4 pipelines endpoints.
///
/// The list endpoint and the single-pipeline endpoint share these fields.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabPipelineDto {
    pub id: u64,
    pub project_id: u64,
    /// Pipeline status (e.g. "running", "success", "failed")
    pub status: String,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabProjectDto {
    pub id: u64,
}
