// src/cli/handlers/text.rs

//! Handler for the `text` mode.

use crate::cli::{args::PipelineArgs, handlers::commons};
use anyhow::Result;

/// Main entry point for the 'text' mode: prints the captured, trimmed stdout.
pub fn handle(args: PipelineArgs) -> Result<()> {
    let pipeline = commons::prepare_pipeline(&args)?;
    let text = pipeline.capture_text()?;
    println!("{}", text);
    Ok(())
}
