// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Reaching-spec command-line interface.
//!
//! This is the main entry point for the `reachspec` command.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod input;

#[derive(Debug, Parser)]
#[command(name = "reachspec")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Files every command needs.
#[derive(Debug, Args)]
struct Target {
    /// Target configuration (`reachspec.toml`)
    #[arg(long, default_value = "reachspec.toml")]
    config: Utf8PathBuf,

    /// Type registry (JSON array of type descriptions)
    #[arg(long)]
    types: Utf8PathBuf,

    /// Observed call (JSON)
    #[arg(long)]
    call: Utf8PathBuf,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a spec from an observed call
    Record {
        #[command(flatten)]
        target: Target,

        /// Where to write the spec
        #[arg(long)]
        out: Utf8PathBuf,
    },

    /// Score an observed call against a saved spec
    Score {
        #[command(flatten)]
        target: Target,

        /// Saved spec
        #[arg(long)]
        spec: Utf8PathBuf,
    },

    /// Check whether an observed call satisfies a saved spec
    Check {
        #[command(flatten)]
        target: Target,

        /// Saved spec
        #[arg(long)]
        spec: Utf8PathBuf,

        /// Fail unless the spec is fully met
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reachspec=info,reachspec_core=warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Record { target, out } => {
            commands::record::run(&target.config, &target.types, &target.call, &out)
        }
        Command::Score { target, spec } => {
            commands::score::run(&target.config, &target.types, &spec, &target.call)
        }
        Command::Check {
            target,
            spec,
            strict,
        } => commands::check::run(&target.config, &target.types, &spec, &target.call, strict),
    };

    // Exit with appropriate code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}
