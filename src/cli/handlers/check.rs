// src/cli/handlers/check.rs

//! Handler for the `check` mode.

use crate::cli::{args::PipelineArgs, handlers::commons};
use anyhow::Result;

/// Main entry point for the 'check' mode.
///
/// Prints `true` or `false`. A non-zero exit is an answer here, so the process
/// itself still exits 0; only a command that cannot run is an error.
pub fn handle(args: PipelineArgs) -> Result<()> {
    let pipeline = commons::prepare_pipeline(&args)?;
    let succeeded = pipeline.succeeded()?;
    println!("{}", succeeded);
    Ok(())
}
