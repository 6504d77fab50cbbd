// src/bin/plumb.rs

//! `plumb`: run commands and pipelines from the command line.

use anyhow::Result;
use clap::Parser;
use colored::*;
use plumb::{
    cli::{Cli, Mode, handlers},
    constants::{FATAL_EXIT_CODE, TRACE_LOG_TARGET},
};
use std::io::Write;

/// The main entry point of the `plumb` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    init_logging();

    // Failures of commands run with `--errexit` never get here: the exit policy
    // terminates the process with the command's own status.
    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(FATAL_EXIT_CODE);
    }
}

/// Sets up `env_logger`. Trace lines routed through the logger are shown by default
/// and printed bare, since they already carry their own prefix.
fn init_logging() {
    let default_filter = format!("warn,{}=info", TRACE_LOG_TARGET);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            if record.target() == TRACE_LOG_TARGET {
                writeln!(buf, "{}", record.args())
            } else {
                writeln!(buf, "[plumb] {}: {}", record.level(), record.args())
            }
        })
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    match cli.mode {
        Mode::Run(args) => handlers::run::handle(args),
        Mode::Text(args) => handlers::text::handle(args),
        Mode::Check(args) => handlers::check::handle(args),
    }
}
