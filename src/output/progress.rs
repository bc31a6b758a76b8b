use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::pipeline::{PipelineState, StatusUpdate};

use super::styling::{bright_green, bright_red, bright_yellow, cyan, dim, status};

/// Spinner showing the latest status of a watched pipeline.
pub struct PollProgress {
    pb: ProgressBar,
    pipeline_id: u64,
}

impl PollProgress {
    pub fn start(pipeline_id: u64, initial: &StatusUpdate) -> Self {
        let pb = create_spinner();
        let progress = Self { pb, pipeline_id };
        progress.update(initial);
        progress
    }

    pub fn update(&self, update: &StatusUpdate) {
        self.pb.set_message(format!(
            "{} {} {}",
            bright_yellow("Watching pipeline"),
            cyan(self.pipeline_id),
            status(&update.status, &update.state)
        ));
    }

    pub fn finish(self, final_state: Option<&StatusUpdate>) {
        let message = match final_state {
            Some(update) if update.state == PipelineState::Succeeded => format!(
                "{} {} ✓",
                bright_green(format!("Pipeline {} succeeded", self.pipeline_id)),
                dim(&update.status)
            ),
            Some(update) => format!(
                "{} {}",
                bright_red(format!("Pipeline {} finished", self.pipeline_id)),
                status(&update.status, &update.state)
            ),
            None => format!(
                "{}",
                dim(format!("Stopped watching pipeline {}", self.pipeline_id))
            ),
        };
        self.pb.finish_with_message(message);
    }

    /// Clears the spinner so log lines are not interleaved with it.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.pb.suspend(f)
    }
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    let style = ProgressStyle::default_spinner()
        .template("  {msg} {spinner} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
