//! Local git metadata, read by shelling out to the `git` binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::error::{PipescopeError, Result};

/// Source of the commit and remote that identify the current checkout.
#[async_trait]
pub trait GitReader: Send + Sync {
    /// Full SHA of `HEAD`.
    async fn head(&self) -> Result<String>;

    async fn remote_url(&self) -> Result<String>;
}

/// [`GitReader`] backed by `git -C <dir> ...`.
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
    remote: String,
}

impl GitCli {
    pub fn new(dir: impl AsRef<Path>, remote: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            remote: remote.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let command = format!("git {}", args.join(" "));
        debug!("Running `{command}` in {}", self.dir.display());

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.dir)
            .args(args)
            .output()
            .await
            .map_err(|e| PipescopeError::GitLookup(format!("failed to run `{command}`: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipescopeError::GitLookup(format!(
                "`{command}` failed in {}: {}",
                self.dir.display(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            return Err(PipescopeError::GitLookup(format!(
                "`{command}` returned no output"
            )));
        }

        Ok(stdout)
    }
}

#[async_trait]
impl GitReader for GitCli {
    async fn head(&self) -> Result<String> {
        self.run(&["rev-parse", "HEAD"]).await
    }

    async fn remote_url(&self) -> Result<String> {
        self.run(&["remote", "get-url", &self.remote]).await
    }
}
