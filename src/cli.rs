use crate::config::FailurePolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Show debug logs on stderr (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dispatch queued chat commands to a channel, one at a time
    Run {
        /// File with one command per line; reads stdin or prompts when omitted
        file: Option<PathBuf>,

        /// Channel to send to (defaults to the configured channel)
        #[arg(short, long)]
        channel: Option<String>,

        /// Milliseconds to wait before each command
        #[arg(short, long)]
        delay: Option<u64>,

        /// What to do when a chat message fails to send
        #[arg(long, value_enum)]
        on_send_failure: Option<FailurePolicy>,
    },

    /// List the channels the configured account can moderate
    Channels,

    /// Show or edit the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the current configuration with the token masked
    Show,
    /// Print the configuration file location
    Path,
    /// Set a configuration value
    Set { key: String, value: String },
}
