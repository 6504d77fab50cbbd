// src/core/command.rs

//! The command builder and its result extractors.
//!
//! A [`Command`] describes one process invocation. By default it inherits the
//! environment and standard streams of the current process and reports a non-zero
//! exit as an error. Builder methods adjust that behavior; [`Command::pipe`] chains
//! a new command whose stdin is fed by the receiver's stdout.
//!
//! ```no_run
//! use plumb::Command;
//!
//! let branch = Command::new(["git", "rev-parse", "--abbrev-ref", "HEAD"])
//!     .trace()
//!     .capture_text()?;
//!
//! Command::new(["go", "build", "-o", "out/app", "./cmd/app"])
//!     .env("CGO_ENABLED", "0")
//!     .env("GOOS", "linux")
//!     .trace()
//!     .abort_on_failure()
//!     .run()?;
//! # Ok::<(), plumb::ExecutionError>(())
//! ```

use crate::core::context::Context;
use crate::core::exit_policy;
use crate::system::executor::{self, ExecutionError, OutputMode, Stage};

/// Per-stage behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CommandFlags {
    pub(crate) trace: bool,
    pub(crate) abort_on_failure: bool,
    pub(crate) suppress_stdout: bool,
    pub(crate) suppress_stderr: bool,
}

/// A builder for one command, optionally the final stage of a pipeline.
#[derive(Debug, Clone)]
pub struct Command {
    args: Vec<String>,
    envs: Vec<(String, String)>,
    flags: CommandFlags,
    upstream: Option<Box<Command>>,
    context: Context,
}

impl Command {
    /// Creates a command that will run with the provided arguments.
    ///
    /// The first argument is the program. If it contains no path separator it is
    /// looked up in `PATH` when the command runs; a program that cannot be found
    /// is reported then, as [`ExecutionError::StartFailure`]. Diagnostics go to a
    /// default [`Context`] (stderr).
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_context(Context::default(), args)
    }

    /// Creates a command reporting through the given context.
    pub fn with_context<I, S>(context: Context, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            envs: Vec::new(),
            flags: CommandFlags::default(),
            upstream: None,
            context,
        }
    }

    /// Creates a new command whose stdin is connected to the stdout of `self`.
    ///
    /// Running the new command starts `self` as well, approximating
    /// `set -o pipefail`: if the new command succeeds but `self` fails, the new
    /// command reports the failure of `self`.
    ///
    /// The new command shares the context of `self` but none of its settings:
    /// environment, tracing, suppression and abort-on-failure must be given to
    /// every stage that needs them. Abort-on-failure set on `self` has no effect of
    /// its own; only the final stage's setting decides whether a failure aborts.
    pub fn pipe<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let context = self.context.clone();
        let mut next = Self::with_context(context, args);
        next.upstream = Some(Box::new(self));
        next
    }

    /// Adds an environment variable for the command.
    ///
    /// It overrides any value inherited from the current process or set by an
    /// earlier call for the same name. The current process's environment is not
    /// modified.
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((name.into(), value.into()));
        self
    }

    /// Prints the full command line before it starts, approximating `set -x`.
    ///
    /// The line is sent to the context's sink as `+ NAME=value ... arg0 arg1 ...`.
    /// Traced stages of one pipeline print in no particular order.
    pub fn trace(mut self) -> Self {
        self.flags.trace = true;
        self
    }

    /// Terminates the current process if the command fails, approximating `set -e`.
    ///
    /// A command that exits non-zero makes the current process exit with the same
    /// code. A command that cannot run at all is reported to the context's sink and
    /// the current process exits with status 1. [`Command::succeeded`] relaxes this.
    pub fn abort_on_failure(mut self) -> Self {
        self.flags.abort_on_failure = true;
        self
    }

    /// Discards the command's stdout instead of passing it through.
    pub fn suppress_stdout(mut self) -> Self {
        self.flags.suppress_stdout = true;
        self
    }

    /// Discards the command's stderr instead of passing it through.
    pub fn suppress_stderr(mut self) -> Self {
        self.flags.suppress_stderr = true;
        self
    }

    /// Combines [`Command::suppress_stdout`] and [`Command::suppress_stderr`].
    pub fn suppress_output(self) -> Self {
        self.suppress_stdout().suppress_stderr()
    }

    /// The argument vector of this stage.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The environment overrides of this stage, in the order they were added.
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// The stage feeding this one, if any.
    pub fn upstream(&self) -> Option<&Self> {
        self.upstream.as_deref()
    }

    /// Runs the command and waits for every stage to complete.
    ///
    /// # Errors
    /// Returns the error of the final stage, or of an upstream stage when the final
    /// stage itself succeeded.
    pub fn run(&self) -> Result<(), ExecutionError> {
        let result = executor::execute(self.stages(), OutputMode::Default).map(drop);
        self.enforce(result)
    }

    /// Runs the command and returns its stdout with surrounding whitespace trimmed.
    ///
    /// Stdout is captured even if it was suppressed. Bytes that are not valid UTF-8
    /// are replaced with U+FFFD.
    ///
    /// # Errors
    /// Same as [`Command::run`].
    pub fn capture_text(&self) -> Result<String, ExecutionError> {
        let result = executor::execute(self.stages(), OutputMode::Capture)
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string());
        self.enforce(result)
    }

    /// Runs the command and returns whether it exited with status 0.
    ///
    /// A non-zero exit is an answer, not an error: it yields `Ok(false)` and never
    /// aborts, even with [`Command::abort_on_failure`].
    ///
    /// # Errors
    /// Returns an error if the command could not be run at all.
    pub fn succeeded(&self) -> Result<bool, ExecutionError> {
        match executor::execute(self.stages(), OutputMode::Default) {
            Ok(_) => Ok(true),
            Err(e) if e.is_exit_failure() => {
                log::debug!("{}", e);
                Ok(false)
            }
            Err(e) => self.enforce(Err(e)),
        }
    }

    fn enforce<T>(&self, result: Result<T, ExecutionError>) -> Result<T, ExecutionError> {
        match result {
            Err(e) if self.flags.abort_on_failure => exit_policy::exit_for_error(&self.context, &e),
            other => other,
        }
    }

    /// Resolves the upstream chain into stages ordered from the root to `self`.
    pub(crate) fn stages(&self) -> Vec<Stage> {
        let mut stages = Vec::new();
        let mut current = Some(self);
        while let Some(command) = current {
            stages.push(Stage {
                args: command.args.clone(),
                envs: command.envs.clone(),
                flags: command.flags,
                context: command.context.clone(),
            });
            current = command.upstream.as_deref();
        }
        stages.reverse();
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trace::MemorySink;
    use std::sync::Arc;

    #[test]
    fn test_pipe_does_not_inherit_settings() {
        // --- Setup ---
        let upstream = Command::new(["aws", "ecr", "get-login-password"])
            .env("AWS_PROFILE", "deploy")
            .trace()
            .abort_on_failure()
            .suppress_output();

        // --- Execute ---
        let piped = upstream.pipe(["docker", "login", "--password-stdin"]);

        // --- Assert ---
        assert!(piped.envs().is_empty());
        assert_eq!(piped.flags, CommandFlags::default());
        let upstream = piped.upstream().unwrap();
        assert_eq!(upstream.args(), ["aws", "ecr", "get-login-password"]);
        assert!(upstream.flags.trace);
        assert!(upstream.flags.suppress_stderr);
    }

    #[test]
    fn test_env_keeps_every_assignment_in_order() {
        let command = Command::new(["env"]).env("X", "1").env("Y", "y").env("X", "2");
        let names: Vec<_> = command.envs().iter().map(|(n, v)| format!("{}={}", n, v)).collect();
        assert_eq!(names, vec!["X=1", "Y=y", "X=2"]);
    }

    #[test]
    fn test_stages_are_ordered_from_root() {
        let command = Command::new(["a"]).pipe(["b"]).pipe(["c", "-x"]);
        let stages = command.stages();
        let programs: Vec<_> = stages.iter().map(|s| s.args.join(" ")).collect();
        assert_eq!(programs, vec!["a", "b", "c -x"]);
    }

    #[test]
    fn test_piped_stages_share_the_context() {
        let sink = Arc::new(MemorySink::new());
        let context = Context::with_shared_sink(sink.clone());
        let command = context.command(["a"]).pipe(["b"]);
        for stage in command.stages() {
            stage.context.sink().trace("probe");
        }
        assert_eq!(sink.traces(), vec!["probe", "probe"]);
    }
}
