// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printlink: reconcile local printers with a cloud print service.
//
// Entry point. Parses arguments, loads configuration, initialises logging,
// and dispatches to a subcommand.  Results go to stdout as JSON; logs go to
// stderr.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use printlink_core::config::ConnectorConfig;

/// Exit status when the cloud holds printers newer than this connector.
const EXIT_FATAL: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "printlink", version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Diff a local printer snapshot against the cloud's and print the diffs.
    Diff {
        /// JSON array of local printers.
        #[arg(long)]
        local: PathBuf,
        /// JSON array of cloud printers.
        #[arg(long)]
        remote: PathBuf,
        /// Directory of `<printer>.ppd` files used to fill in capabilities.
        #[arg(long)]
        ppd_dir: Option<PathBuf>,
    },
    /// Translate and print the capabilities of the named printers.
    Capabilities {
        #[arg(long)]
        ppd_dir: PathBuf,
        #[arg(required = true)]
        printers: Vec<String>,
    },
    /// Print the network hostname named by a device URI.
    Hostname {
        #[arg(long)]
        device_uri: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match ConnectorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("printlink: {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => ConnectorConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::debug!(?cli, "Printlink starting");

    let result = match cli.command {
        Command::Diff {
            local,
            remote,
            ppd_dir,
        } => commands::diff(&local, &remote, ppd_dir, &config),
        Command::Capabilities { ppd_dir, printers } => {
            commands::capabilities(ppd_dir, &printers, &config)
        }
        Command::Hostname { device_uri } => Ok(commands::hostname(&device_uri)),
    };

    match result {
        Ok(code) => code,
        Err(e) if e.is_fatal() => {
            tracing::error!(error = %e, "fatal error; stopping");
            ExitCode::from(EXIT_FATAL)
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
