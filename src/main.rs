use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;
mod config;
mod core;
mod display;
mod input;
mod twitch;

use crate::app::Application;
use crate::cli::Args;
use crate::config::Config;
use crate::core::error::BooperError;

/// Logs go to stderr so they never tangle with the progress line.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "sbooper=debug" } else { "sbooper=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<(), BooperError> {
    let config = Config::load()?;
    let mut app = Application::new(args, config);
    app.run().await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        display::display_error(&e);
        std::process::exit(1);
    }
}
