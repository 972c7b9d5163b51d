// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code, unused_imports)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

mod acquisition;
mod alert;
mod browser;
mod calendar;
mod cli;
mod config;
mod error;
mod orchestrator;
mod report;
mod session;
mod sheets;

use config::RunArgs;

#[derive(Parser)]
#[command(
    name = "chanweek",
    about = "Chanweek — weekly channel-performance export and ledger aggregation",
    version,
    after_help = "Run 'chanweek <command> --help' for details on each command."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export each week in the range and aggregate it into the ledger
    Run {
        #[command(flatten)]
        args: RunArgs,
    },
    /// Aggregate an already-downloaded raw export CSV offline
    Summarize {
        /// Path to the raw channel export CSV
        input: PathBuf,
        /// Week start, YYYY-MM-DD
        #[arg(long)]
        since: String,
        /// Week end, YYYY-MM-DD
        #[arg(long)]
        until: String,
        /// Country code for the provenance column
        #[arg(long, default_value = "US")]
        country: String,
        /// Output path (default: <input>_SUMMARY.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "chanweek=debug"
    } else {
        "chanweek=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_directive.parse().unwrap()),
        )
        .init();

    let result = match &cli.command {
        Commands::Run { args } => cli::run_cmd::run(args).await,
        Commands::Summarize {
            input,
            since,
            until,
            country,
            output,
        } => cli::summarize_cmd::run(input, since, until, country, output.as_deref()),
        Commands::Doctor => cli::doctor::run(),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "chanweek", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error.
    if let Err(e) = &result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    result
}
