mod poll;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::error::{PipescopeError, Result};
use crate::git::GitReader;
use crate::pipeline::Pipeline;
use crate::providers::Provider;

pub use poll::{PollErrorPolicy, StatusStream, MIN_POLL_INTERVAL};
use poll::PollWorker;

/// Resolves the pipeline of the current checkout and watches its status.
pub struct Service {
    provider: Arc<dyn Provider>,
    git: Arc<dyn GitReader>,
    on_error: PollErrorPolicy,
    timeout: Option<Duration>,
}

fn git_error(what: &str, e: PipescopeError) -> PipescopeError {
    match e {
        PipescopeError::GitLookup(msg) => PipescopeError::GitLookup(format!("{what}: {msg}")),
        other => PipescopeError::GitLookup(format!("{what}: {other}")),
    }
}

impl Service {
    pub fn new(provider: Arc<dyn Provider>, git: Arc<dyn GitReader>) -> Self {
        Self {
            provider,
            git,
            on_error: PollErrorPolicy::default(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_error_policy(mut self, on_error: PollErrorPolicy) -> Self {
        self.on_error = on_error;
        self
    }

    /// Gives up polling once `timeout` has elapsed since the poll started.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Finds the most recent pipeline for the checkout's `HEAD` on its remote.
    ///
    /// # Errors
    ///
    /// Returns `GitLookup` if the remote or `HEAD` cannot be read, and
    /// `PipelineFetch` wrapping the provider's error otherwise.
    pub async fn get_pipeline(&self) -> Result<Pipeline> {
        let url = self
            .git
            .remote_url()
            .await
            .map_err(|e| git_error("failed to get remote url from git", e))?;

        let sha = self
            .git
            .head()
            .await
            .map_err(|e| git_error("failed to get HEAD SHA from git", e))?;

        debug!("Resolved {url} at {sha}");

        let pipeline = self
            .provider
            .pipeline_by_sha(&url, &sha)
            .await
            .map_err(|e| {
                PipescopeError::fetch(
                    format!("failed to get pipeline from {} for {sha}", self.provider.kind()),
                    e,
                )
            })?;

        info!(
            "Found pipeline {} of {} at {}",
            pipeline.id, pipeline.project_id, pipeline.url
        );

        Ok(pipeline.with_commit_fallback(&sha))
    }

    pub async fn get_pipeline_status(&self) -> Result<String> {
        Ok(self.get_pipeline().await?.status)
    }

    pub async fn get_pipeline_status_by_id(
        &self,
        project_id: &str,
        pipeline_id: u64,
    ) -> Result<String> {
        let pipeline = self
            .provider
            .pipeline(project_id, pipeline_id)
            .await
            .map_err(|e| {
                PipescopeError::fetch(
                    format!("failed to get pipeline {pipeline_id} of project {project_id}"),
                    e,
                )
            })?;

        Ok(pipeline.status)
    }

    /// Polls a known pipeline every `interval` until it leaves the pending state.
    ///
    /// The first fetch happens one `interval` after the call. Intervals
    /// shorter than [`MIN_POLL_INTERVAL`] are raised to it. Each observed
    /// status is yielded in order; the stream ends after the first terminal
    /// status, after a failed fetch (see [`PollErrorPolicy`]), on timeout,
    /// or when cancelled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn poll_pipeline_status(
        &self,
        project_id: &str,
        pipeline_id: u64,
        interval: Duration,
    ) -> StatusStream {
        PollWorker {
            provider: Arc::clone(&self.provider),
            project_id: project_id.to_string(),
            pipeline_id,
            interval,
            timeout: self.timeout,
            on_error: self.on_error,
        }
        .spawn()
    }
}
