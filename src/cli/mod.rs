// src/cli/mod.rs

//! Command-line interface of the `plumb` binary.

use clap::{Parser, Subcommand};

pub mod args;
pub mod handlers;

use args::PipelineArgs;

/// plumb: run external commands and pipelines with shell-like tracing and exit codes.
///
/// Stages of a pipeline are separated by a literal `|` argument (quote it so your
/// shell does not interpret it):
///
///   plumb text --trace -- git log --oneline '|' head -n 1
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
#[command(
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default())
)]
pub struct Cli {
    /// What to report once the pipeline finishes.
    #[command(subcommand)]
    pub mode: Mode,
}

/// How the result of the pipeline is reported.
#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Run the pipeline with its output passed through.
    Run(PipelineArgs),
    /// Run the pipeline and print its stdout, trimmed.
    Text(PipelineArgs),
    /// Run the pipeline and print whether it succeeded (`true` or `false`).
    Check(PipelineArgs),
}
