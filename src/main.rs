mod auth;
mod checker;
mod cli;
mod config;
mod error;
mod git;
mod notify;
mod output;
mod pipeline;
mod providers;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting pipescope");
    let code = cli.execute().await?;

    Ok(code)
}
