// src/cli/handlers/run.rs

//! Handler for the `run` mode.

use crate::cli::{args::PipelineArgs, handlers::commons};
use anyhow::Result;

/// Main entry point for the 'run' mode: output is passed straight through.
pub fn handle(args: PipelineArgs) -> Result<()> {
    let pipeline = commons::prepare_pipeline(&args)?;
    log::debug!("Running pipeline: {:?}", pipeline);
    pipeline.run()?;
    Ok(())
}
