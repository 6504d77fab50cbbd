// src/cli/args.rs

//! Parsed arguments of the pipeline modes.

use clap::Args;
use std::path::PathBuf;

/// Options shared by every mode. Stage options apply to each stage of the pipeline.
#[derive(Args, Debug, Default, Clone)]
pub struct PipelineArgs {
    /// Print each stage's command line before it starts.
    #[arg(short = 'x', long)]
    pub trace: bool,

    /// Exit with the failing command's status (or 1 if it could not run).
    #[arg(short, long)]
    pub errexit: bool,

    /// Set an environment variable for every stage (e.g., "GOOS=linux").
    #[arg(long = "env", value_name = "NAME=VALUE", value_parser = parse_env_assignment)]
    pub envs: Vec<(String, String)>,

    /// Discard the stdout of every stage (captured text is still returned).
    #[arg(long)]
    pub no_stdout: bool,

    /// Discard the stderr of every stage.
    #[arg(long)]
    pub no_stderr: bool,

    /// Read settings from this file instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The pipeline: a program and its arguments, stages separated by `|`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Parses a `NAME=VALUE` assignment. The value may itself contain `=`.
pub fn parse_env_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_assignment_splits_on_first_equals() {
        assert_eq!(
            parse_env_assignment("LDFLAGS=-s -w=1").unwrap(),
            ("LDFLAGS".to_string(), "-s -w=1".to_string())
        );
        assert_eq!(
            parse_env_assignment("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_env_assignment_rejects_malformed_input() {
        assert!(parse_env_assignment("NOVALUE").is_err());
        assert!(parse_env_assignment("=value").is_err());
    }
}
