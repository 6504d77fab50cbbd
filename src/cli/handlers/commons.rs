// src/cli/handlers/commons.rs

//! Shared functions used by multiple handlers.

use anyhow::{Context as _, Result, anyhow};

use crate::{
    cli::args::PipelineArgs,
    constants::STAGE_SEPARATOR,
    core::{command::Command, context::Context, settings},
};

/// Loads the settings named by the arguments and builds the pipeline they describe.
pub fn prepare_pipeline(args: &PipelineArgs) -> Result<Command> {
    let settings = settings::load_settings(args.config.as_deref())
        .context("Failed to load settings")?;
    let context = Context::from_settings(&settings).context("Failed to set up tracing")?;
    build_pipeline(&context, args)
}

/// Builds the pipeline described by the arguments, reporting through `context`.
///
/// Every stage gets the same environment, trace and suppression options.
/// `--errexit` goes on the final stage, the only one where it takes effect.
pub fn build_pipeline(context: &Context, args: &PipelineArgs) -> Result<Command> {
    let mut stages = split_stages(&args.command)?.into_iter();
    let first = stages
        .next()
        .ok_or_else(|| anyhow!("No command specified to run."))?;

    let mut command = configure_stage(context.command(first), args);
    for stage in stages {
        command = configure_stage(command.pipe(stage), args);
    }
    if args.errexit {
        command = command.abort_on_failure();
    }
    Ok(command)
}

fn configure_stage(mut command: Command, args: &PipelineArgs) -> Command {
    for (name, value) in &args.envs {
        command = command.env(name.as_str(), value.as_str());
    }
    if args.trace {
        command = command.trace();
    }
    if args.no_stdout {
        command = command.suppress_stdout();
    }
    if args.no_stderr {
        command = command.suppress_stderr();
    }
    command
}

/// Splits the command words into stages at each `|` argument.
pub fn split_stages(words: &[String]) -> Result<Vec<Vec<String>>> {
    let stages: Vec<Vec<String>> = words
        .split(|word| word == STAGE_SEPARATOR)
        .map(<[String]>::to_vec)
        .collect();

    if let Some(position) = stages.iter().position(Vec::is_empty) {
        return Err(anyhow!(
            "Pipeline stage {} is empty. Each '{}' must sit between two commands.",
            position + 1,
            STAGE_SEPARATOR
        ));
    }
    Ok(stages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trace::MemorySink;
    use std::sync::Arc;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_stages_on_separator() {
        let stages = split_stages(&words(&["git", "log", "|", "head", "-n", "1"])).unwrap();
        assert_eq!(stages, vec![words(&["git", "log"]), words(&["head", "-n", "1"])]);
    }

    #[test]
    fn test_split_stages_rejects_dangling_separator() {
        assert!(split_stages(&words(&["git", "log", "|"])).is_err());
        assert!(split_stages(&words(&["|", "head"])).is_err());
        assert!(split_stages(&words(&["a", "|", "|", "b"])).is_err());
    }

    #[test]
    fn test_build_pipeline_configures_every_stage() {
        // --- Setup ---
        let sink = Arc::new(MemorySink::new());
        let context = Context::with_shared_sink(sink);
        let args = PipelineArgs {
            trace: true,
            errexit: true,
            envs: vec![("AWS_REGION".to_string(), "eu-west-1".to_string())],
            command: words(&["aws", "ecr", "get-login-password", "|", "docker", "login"]),
            ..PipelineArgs::default()
        };

        // --- Execute ---
        let command = build_pipeline(&context, &args).unwrap();

        // --- Assert ---
        assert_eq!(command.args(), ["docker", "login"]);
        assert_eq!(command.envs().len(), 1);
        let upstream = command.upstream().unwrap();
        assert_eq!(upstream.args(), ["aws", "ecr", "get-login-password"]);
        assert_eq!(upstream.envs(), command.envs());
        assert!(upstream.upstream().is_none());
    }
}
