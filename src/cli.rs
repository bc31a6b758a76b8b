use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Token;
use crate::checker::{PollErrorPolicy, Service};
use crate::config::Config;
use crate::error::PipescopeError;
use crate::git::{GitCli, GitReader};
use crate::notify;
use crate::output::{self, PollProgress};
use crate::pipeline::{Pipeline, PipelineState, StatusUpdate};
use crate::providers::{self, Provider, ProviderOptions};

#[derive(Parser, Debug)]
#[command(name = "pipescope")]
#[command(author, version, about = "Watch the CI pipeline of the current commit", long_about = None)]
pub struct Cli {
    /// CI provider (github or gitlab); guessed from the token or remote when omitted
    provider: Option<String>,

    #[arg(short = 't', long, env = "ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Repository to inspect [default: .]
    #[arg(short = 'd', long)]
    git_directory: Option<PathBuf>,

    /// Git remote identifying the project [default: origin]
    #[arg(short, long)]
    remote: Option<String>,

    /// Seconds between status checks [default: 5]
    #[arg(short = 'f', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    poll_frequency: Option<u64>,

    /// Stop watching after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// What to do when a status check fails
    #[arg(long, value_enum)]
    on_error: Option<PollErrorPolicy>,

    #[arg(long, value_name = "URL")]
    github_url: Option<String>,

    #[arg(long, value_name = "URL")]
    gitlab_url: Option<String>,

    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ring the terminal bell when the pipeline finishes
    #[arg(long, default_value_t = false)]
    play_sound: bool,

    /// Report the current status and exit without watching
    #[arg(long, default_value_t = false)]
    once: bool,
}

/// Command-line flags layered over the config file.
#[derive(Debug)]
struct Settings {
    provider: Option<String>,
    token: Option<Token>,
    git_directory: PathBuf,
    remote: String,
    interval: Duration,
    timeout: Option<Duration>,
    on_error: PollErrorPolicy,
    options: ProviderOptions,
    play_sound: bool,
    once: bool,
}

impl Settings {
    fn merge(cli: &Cli, config: &Config) -> Self {
        let mut options = config.provider_options();
        if let Some(url) = &cli.github_url {
            options.github_url.clone_from(url);
        }
        if let Some(url) = &cli.gitlab_url {
            options.gitlab_url.clone_from(url);
        }

        Self {
            provider: cli.provider.clone().filter(|p| !p.trim().is_empty()),
            token: Token::non_empty(cli.access_token.as_deref()),
            git_directory: cli
                .git_directory
                .clone()
                .unwrap_or_else(|| config.git.directory.clone()),
            remote: cli.remote.clone().unwrap_or_else(|| config.git.remote.clone()),
            interval: cli
                .poll_frequency
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.poll_interval()),
            timeout: cli.timeout.map(Duration::from_secs).or(config.poll_timeout()),
            on_error: cli.on_error.unwrap_or(config.poll.on_error),
            options,
            play_sound: cli.play_sound || config.notify.play_sound,
            once: cli.once,
        }
    }
}

/// 0 when the pipeline succeeded, 2 for any other final state.
fn exit_status(state: &PipelineState) -> u8 {
    if state.is_success() {
        0
    } else {
        2
    }
}

impl Cli {
    async fn build_provider(
        &self,
        settings: &Settings,
        config: &Config,
        git: &GitCli,
    ) -> Result<Box<dyn Provider>> {
        let remote_url = if settings.provider.is_none() && settings.token.is_none() {
            Some(
                git.remote_url()
                    .await
                    .context("Failed to detect the CI provider from the git remote")?,
            )
        } else {
            None
        };

        let provider = providers::select(
            settings.token.clone(),
            settings.provider.as_deref(),
            remote_url.as_deref(),
            &settings.options,
        )
        .context("Failed to select a CI provider")?;

        if settings.token.is_some() {
            return Ok(provider);
        }

        match config.token_for(provider.kind()) {
            Some(token) => {
                info!("Using {} token from configuration", provider.kind());
                Ok(providers::from_name(
                    &provider.kind().to_string(),
                    Some(token),
                    &settings.options,
                )?)
            }
            None => Ok(provider),
        }
    }

    async fn watch(
        &self,
        service: &Service,
        pipeline: &Pipeline,
        initial: StatusUpdate,
        settings: &Settings,
    ) -> Result<ExitCode> {
        let mut stream =
            service.poll_pipeline_status(&pipeline.project_id, pipeline.id, settings.interval);

        let cancel = stream.cancellation_token();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        let progress = PollProgress::start(pipeline.id, &initial);
        let mut last = initial;
        let mut failure = None;

        while let Some(item) = stream.next().await {
            match item {
                Ok(update) => {
                    if update.status != last.status {
                        progress.suspend(|| {
                            info!(
                                "Pipeline {} status changed: {} -> {}",
                                pipeline.id, last.status, update.status
                            )
                        });
                    }
                    progress.update(&update);
                    last = update;
                }
                Err(e) => failure = Some(e),
            }
        }
        ctrl_c.abort();

        match failure {
            Some(PipescopeError::Cancelled) => {
                progress.finish(None);
                warn!("Stopped watching pipeline {}", pipeline.id);
                Ok(ExitCode::FAILURE)
            }
            Some(e) => {
                progress.finish(None);
                Err(e).with_context(|| format!("Failed to watch pipeline {}", pipeline.id))
            }
            // the stream ended quietly on an error
            None if last.state.is_pending() => {
                progress.finish(None);
                Ok(ExitCode::FAILURE)
            }
            None => {
                progress.finish(Some(&last));
                Ok(self.report(pipeline, &last, settings))
            }
        }
    }

    fn report(&self, pipeline: &Pipeline, last: &StatusUpdate, settings: &Settings) -> ExitCode {
        eprintln!(
            "\n  {} {}\n",
            output::status(&last.status, &last.state),
            output::dim(&pipeline.url)
        );
        println!("{}", last.status);
        notify::pipeline_finished(settings.play_sound);
        ExitCode::from(exit_status(&last.state))
    }

    pub async fn execute(&self) -> Result<ExitCode> {
        let config = Config::load(self.config.as_deref())?;
        let settings = Settings::merge(self, &config);

        let git = GitCli::new(&settings.git_directory, settings.remote.clone());
        let provider: Arc<dyn Provider> =
            Arc::from(self.build_provider(&settings, &config, &git).await?);
        info!("Using {} provider", provider.kind());

        let service = Service::new(provider, Arc::new(git))
            .with_error_policy(settings.on_error)
            .with_timeout(settings.timeout);

        let pipeline = service
            .get_pipeline()
            .await
            .context("Failed to find the pipeline of the current commit")?;

        let state = service.provider().state(&pipeline.status);
        info!("URL: {}", output::cyan(&pipeline.url));
        info!(
            "SHA: {} | project: {} | pipeline: {} | status: {}",
            pipeline.commit_sha,
            pipeline.project_id,
            pipeline.id,
            output::status(&pipeline.status, &state)
        );

        let initial = StatusUpdate {
            status: pipeline.status.clone(),
            state,
        };

        if settings.once || !initial.state.is_pending() {
            return Ok(self.report(&pipeline, &initial, &settings));
        }

        self.watch(&service, &pipeline, initial, &settings).await
    }
}
