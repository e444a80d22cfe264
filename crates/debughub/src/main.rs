// debughub - Debugger Coordination Hub
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! debughub - Debugger Coordination Hub
//!
//! Starts language debug clients, multiplexes every debuggee that connects back
//! and speaks newline delimited JSON with a front end on stdin/stdout.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use debughub_engine::HubConfig;
use eyre::Result;
use tracing::Level;

mod cmd;

/// Command-line interface for debughub
#[derive(Debug, Parser)]
#[command(name = "debughub")]
#[command(
    about = "Debugger coordination hub - multiplexes language debug clients behind one front end"
)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ~/.debughub.toml)
    #[arg(long, env = "DEBUGHUB_CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the hub, reading requests from stdin and writing events to stdout
    Serve(ServeArgs),
    /// Print the configuration as TOML
    Config {
        /// Print the built-in defaults instead of the effective configuration
        #[arg(long)]
        default: bool,
    },
}

/// Options of the `serve` command, overriding the configuration file
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address the backend listener binds to
    #[arg(long)]
    pub host: Option<std::net::IpAddr>,

    /// Backend listener port, 0 picks a free one
    #[arg(long)]
    pub port: Option<u16>,

    /// Wait for externally started debuggees instead of launching them
    #[arg(long)]
    pub passive: bool,

    /// Language of debuggees connecting in passive mode
    #[arg(long)]
    pub passive_language: Option<String>,

    /// Language used for scripts with an unknown extension
    #[arg(long)]
    pub language: Option<String>,

    /// Disable the rolling log file
    #[arg(long)]
    pub no_file_log: bool,

    /// Breakpoint set before any debuggee starts, as `<path>:<line> [if <condition>]`
    #[arg(long = "break", value_name = "BREAKPOINT")]
    pub breakpoints: Vec<String>,
}

impl Cli {
    /// Console log level when RUST_LOG is not set
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Loads the configuration from `--config` or the default location.
    fn load_config(&self) -> Result<HubConfig> {
        match &self.config {
            Some(path) => HubConfig::load_from(path),
            None => HubConfig::load(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve(args) => {
            debughub_common::logging::init_logging_with_level(
                "debughub",
                !args.no_file_log,
                cli.log_level(),
            )?;
            let config = cli.load_config()?;
            cmd::serve(config, args).await
        }
        Commands::Config { default } => {
            let config = if *default { HubConfig::default() } else { cli.load_config()? };
            cmd::print_config(&config)
        }
    }
}
