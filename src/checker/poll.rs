use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{PipescopeError, Result};
use crate::pipeline::StatusUpdate;
use crate::providers::Provider;

/// Shortest period between two fetches of the same pipeline.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a status poll does when a fetch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PollErrorPolicy {
    /// Yield the error as the final item, then end the stream.
    #[default]
    Report,
    /// Log the error and end the stream without yielding it.
    EndStream,
}

/// Status values observed by a running poll, in fetch order.
///
/// The stream ends after the first non-pending status, after an error, or
/// once the poll is cancelled. Dropping the stream cancels the poll.
pub struct StatusStream {
    rx: mpsc::Receiver<Result<StatusUpdate>>,
    cancel: CancellationToken,
}

impl StatusStream {
    pub async fn next(&mut self) -> Option<Result<StatusUpdate>> {
        self.rx.recv().await
    }

    /// Stops the poll at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this poll, for handing to signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for StatusStream {
    type Item = Result<StatusUpdate>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for StatusStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub(super) struct PollWorker {
    pub provider: Arc<dyn Provider>,
    pub project_id: String,
    pub pipeline_id: u64,
    pub interval: Duration,
    pub timeout: Option<Duration>,
    pub on_error: PollErrorPolicy,
}

impl PollWorker {
    pub fn spawn(self) -> StatusStream {
        // capacity 1: a slow consumer holds back the next tick
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        tokio::spawn(self.run(tx, cancel.clone()));

        StatusStream { rx, cancel }
    }

    async fn run(self, tx: mpsc::Sender<Result<StatusUpdate>>, cancel: CancellationToken) {
        let interval = if self.interval < MIN_POLL_INTERVAL {
            warn!(
                "Poll interval {:?} is too short, using {:?}",
                self.interval, MIN_POLL_INTERVAL
            );
            MIN_POLL_INTERVAL
        } else {
            self.interval
        };

        let started = Instant::now();
        let mut ticker = time::interval_at(started + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let deadline = self.timeout.map(|t| started + t);
        let expired = async {
            match deadline {
                Some(at) => time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(expired);

        debug!(
            "Polling pipeline {} of {} every {:?}",
            self.pipeline_id, self.project_id, interval
        );

        loop {
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(PipescopeError::Cancelled),
                () = &mut expired => Err(PipescopeError::PollTimeout(self.timeout.unwrap_or_default())),
                result = self.fetch_after_tick(&mut ticker) => result,
            };

            let (item, done) = match fetched {
                Ok(update) => {
                    let done = !self.provider.is_pending(&update.status);
                    (Ok(update), done)
                }
                Err(e) if self.on_error == PollErrorPolicy::EndStream => {
                    warn!("Stopped polling pipeline {}: {e}", self.pipeline_id);
                    break;
                }
                Err(e) => (Err(e), true),
            };

            // a dropped stream makes send fail, which also ends the worker
            if tx.send(item).await.is_err() || done {
                break;
            }
        }

        debug!("Stopped polling pipeline {}", self.pipeline_id);
    }

    async fn fetch_after_tick(&self, ticker: &mut time::Interval) -> Result<StatusUpdate> {
        ticker.tick().await;

        let pipeline = self
            .provider
            .pipeline(&self.project_id, self.pipeline_id)
            .await
            .map_err(|e| {
                PipescopeError::fetch(format!("failed to poll pipeline {}", self.pipeline_id), e)
            })?;

        debug!("Pipeline {} status: {}", self.pipeline_id, pipeline.status);
        let state = self.provider.state(&pipeline.status);

        Ok(StatusUpdate {
            status: pipeline.status,
            state,
        })
    }
}
