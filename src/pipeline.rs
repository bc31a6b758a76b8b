use chrono::{DateTime, Utc};

/// Snapshot of a CI run as reported by a provider at fetch time.
///
/// `status` is the provider's own token (e.g. `in_progress`, `running`,
/// `failure`, `failed`). Use [`crate::providers::Provider::is_pending`] or
/// [`crate::providers::Provider::state`] to interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub id: u64,
    /// Identifier accepted by the provider's fetch-by-id call for this pipeline:
    /// the numeric project id on GitLab, `owner/repo` on GitHub.
    pub project_id: String,
    pub commit_sha: String,
    pub status: String,
    pub url: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Pipeline {
    /// Returns this pipeline with `commit_sha` set to `sha` if the provider left it empty.
    #[must_use]
    pub fn with_commit_fallback(mut self, sha: &str) -> Self {
        if self.commit_sha.is_empty() {
            self.commit_sha = sha.to_string();
        }
        self
    }
}

/// Provider-neutral classification of a pipeline status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Succeeded,
    Failed,
    Canceled,
    /// Terminal, but not one of the outcomes above (skipped, manual, neutral...).
    Unknown(String),
}

impl PipelineState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
            Self::Canceled => f.write_str("canceled"),
            Self::Unknown(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

/// One observation published by a status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: String,
    pub state: PipelineState,
}
