use console::{style, StyledObject};

use crate::pipeline::PipelineState;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Colours a raw status by the state it normalizes to.
pub fn status(text: &str, state: &PipelineState) -> StyledObject<String> {
    match state {
        PipelineState::Pending => bright_yellow(text),
        PipelineState::Succeeded => bright_green(text),
        PipelineState::Failed => bright_red(text),
        PipelineState::Canceled | PipelineState::Unknown(_) => dim(text),
    }
}
