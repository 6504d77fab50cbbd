// src/system/executor.rs

//! Pipeline execution and the errors it reports.

use crate::core::command::CommandFlags;
use crate::core::context::Context;
use crate::core::trace;
use crate::system::process::{LiveProcess, StdinBinding, StdoutBinding};
use std::io;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread;
use thiserror::Error;

/// Why a command or pipeline did not complete successfully.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A stage has no program to run.
    #[error("No command specified to run.")]
    EmptyCommand,
    /// The program could not be started, usually because it was not found.
    #[error("Command '{command}' could not be started: {source}")]
    StartFailure {
        /// The stage's command line.
        command: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The program ran and exited with a non-zero code (128+N when killed by signal N).
    #[error("Command '{command}' exited with status {code}.")]
    NonZeroExit {
        /// The failing stage's command line.
        command: String,
        /// Its exit code.
        code: i32,
    },
    /// The pipe or worker thread linking two stages could not be created.
    #[error("Could not set up the pipe feeding '{command}': {source}")]
    PipeSetupFailure {
        /// The stage's command line.
        command: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Waiting on a started stage failed, or its outcome was lost.
    #[error("Lost track of command '{command}' while it was running: {source}")]
    WaitFailure {
        /// The stage's command line.
        command: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl ExecutionError {
    /// The exit code of a command that ran to completion and failed.
    ///
    /// Returns `None` for every error where the command did not get to report an
    /// exit status of its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the command ran and exited non-zero, as opposed to not running at all.
    pub fn is_exit_failure(&self) -> bool {
        matches!(self, Self::NonZeroExit { .. })
    }
}

/// One command of a pipeline, detached from its upstream link.
#[derive(Debug, Clone)]
pub(crate) struct Stage {
    pub(crate) args: Vec<String>,
    pub(crate) envs: Vec<(String, String)>,
    pub(crate) flags: CommandFlags,
    pub(crate) context: Context,
}

impl Stage {
    pub(crate) fn display(&self) -> String {
        trace::quote_args(&self.args)
    }
}

/// What the extractor wants from the final stage's stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputMode {
    /// Inherit or discard, following the stage's own flags.
    Default,
    /// Collect into memory regardless of suppression.
    Capture,
}

/// Runs a pipeline, ordered from the root stage to the final one, and returns the
/// captured stdout of the final stage (empty unless `mode` is `Capture`).
///
/// Blocks until every stage has exited.
pub(crate) fn execute(
    mut stages: Vec<Stage>,
    mode: OutputMode,
) -> Result<Vec<u8>, ExecutionError> {
    if stages.iter().any(|stage| stage.args.is_empty()) {
        return Err(ExecutionError::EmptyCommand);
    }
    let last = stages.pop().ok_or(ExecutionError::EmptyCommand)?;
    log::debug!(
        "Executing pipeline of {} stage(s) ending in '{}'.",
        stages.len() + 1,
        last.display()
    );

    let stdout = match mode {
        OutputMode::Default => StdoutBinding::Default,
        OutputMode::Capture => StdoutBinding::Capture,
    };
    run_stage(last, stages, stdout, None)
}

/// Runs `stage` on the calling thread with `upstream` (everything before it)
/// feeding its stdin from a worker thread, then reconciles both outcomes.
///
/// `started` is signalled as soon as this stage's process exists. It is dropped
/// without a signal when the stage never starts.
fn run_stage(
    stage: Stage,
    mut upstream: Vec<Stage>,
    stdout: StdoutBinding,
    started: Option<SyncSender<()>>,
) -> Result<Vec<u8>, ExecutionError> {
    let (stdin, link) = match upstream.pop() {
        Some(previous) => {
            let (link, reader) = PipelineRun::start(previous, upstream, &stage)?;
            // The upstream must be running before this stage starts reading from it.
            link.wait_started()?;
            (StdinBinding::Pipe(reader), Some(link))
        }
        None => (StdinBinding::Inherit, None),
    };

    let own = start_and_wait(&stage, stdin, stdout, started);
    let from_upstream = match link {
        Some(link) => link.finish(),
        None => Ok(()),
    };

    // pipefail: an upstream failure surfaces here unless this stage failed too.
    match (own, from_upstream) {
        (Ok(_), Err(upstream_err)) => Err(upstream_err),
        (own, _) => own,
    }
}

fn start_and_wait(
    stage: &Stage,
    stdin: StdinBinding,
    stdout: StdoutBinding,
    started: Option<SyncSender<()>>,
) -> Result<Vec<u8>, ExecutionError> {
    if stage.flags.trace {
        stage
            .context
            .sink()
            .trace(&trace::format_trace_line(&stage.envs, &stage.args));
    }

    let process = LiveProcess::spawn(stage, stdin, stdout)?;
    if let Some(started) = started {
        // The receiver may already be gone if the downstream gave up; nothing to do then.
        let _ = started.send(());
    }
    process.wait()
}

/// The coordination state of one pipe link, seen from its downstream stage.
struct PipelineRun {
    upstream: String,
    started: Receiver<()>,
    done: Receiver<Result<(), ExecutionError>>,
}

impl PipelineRun {
    /// Allocates the pipe and starts the upstream part of the pipeline on a worker
    /// thread. Returns the link and the read end destined for the downstream stage.
    fn start(
        previous: Stage,
        rest: Vec<Stage>,
        downstream: &Stage,
    ) -> Result<(Self, io::PipeReader), ExecutionError> {
        let (reader, writer) = io::pipe().map_err(|source| ExecutionError::PipeSetupFailure {
            command: downstream.display(),
            source,
        })?;

        let upstream = previous.display();
        let (started_tx, started_rx) = sync_channel(1);
        let (done_tx, done_rx) = sync_channel(1);

        log::debug!("Piping '{}' into '{}'.", upstream, downstream.display());
        thread::Builder::new()
            .name(format!("plumb-stage-{}", rest.len()))
            .spawn(move || {
                let result =
                    run_stage(previous, rest, StdoutBinding::Pipe(writer), Some(started_tx));
                let _ = done_tx.send(result.map(drop));
            })
            .map_err(|source| ExecutionError::PipeSetupFailure {
                command: downstream.display(),
                source,
            })?;

        Ok((
            Self {
                upstream,
                started: started_rx,
                done: done_rx,
            },
            reader,
        ))
    }

    /// Blocks until the upstream process has started.
    ///
    /// If the upstream (or anything before it) could not start, its error is
    /// returned and the downstream stage must not be started.
    fn wait_started(&self) -> Result<(), ExecutionError> {
        if self.started.recv().is_ok() {
            return Ok(());
        }
        match self.done.recv() {
            Ok(Err(e)) => Err(e),
            // A stage that never started cannot have succeeded.
            Ok(Ok(())) | Err(_) => Err(lost_outcome(&self.upstream)),
        }
    }

    /// Waits for the upstream to finish and returns its outcome.
    fn finish(self) -> Result<(), ExecutionError> {
        self.done
            .recv()
            .unwrap_or_else(|_| Err(lost_outcome(&self.upstream)))
    }
}

/// The error for a stage whose worker ended without reporting how it went.
fn lost_outcome(command: &str) -> ExecutionError {
    log::warn!("Stage '{}' ended without reporting an outcome.", command);
    ExecutionError::WaitFailure {
        command: command.to_string(),
        source: io::Error::other("stage ended without reporting"),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn stage(args: &[&str]) -> Stage {
        Stage {
            args: args.iter().map(|s| s.to_string()).collect(),
            envs: Vec::new(),
            flags: CommandFlags::default(),
            context: Context::default(),
        }
    }

    #[test]
    fn test_execute_rejects_empty_stage() {
        let result = execute(vec![stage(&["true"]), stage(&[])], OutputMode::Default);
        assert!(matches!(result, Err(ExecutionError::EmptyCommand)));
    }

    #[test]
    fn test_execute_rejects_empty_pipeline() {
        let result = execute(Vec::new(), OutputMode::Default);
        assert!(matches!(result, Err(ExecutionError::EmptyCommand)));
    }

    #[test]
    fn test_execute_moves_data_through_every_stage() {
        // --- Setup ---
        let stages = vec![
            stage(&["printf", "alpha\\nbeta\\n"]),
            stage(&["tr", "a-z", "A-Z"]),
            stage(&["sort", "-r"]),
        ];

        // --- Execute ---
        let output = execute(stages, OutputMode::Capture).unwrap();

        // --- Assert ---
        assert_eq!(String::from_utf8(output).unwrap(), "BETA\nALPHA\n");
    }

    #[test]
    fn test_execute_does_not_start_downstream_when_upstream_cannot_start() {
        // --- Setup ---
        let stages = vec![
            stage(&["/nonexistent/plumb-missing-tool"]),
            stage(&["sh", "-c", "echo started"]),
        ];

        // --- Execute ---
        let result = execute(stages, OutputMode::Capture);

        // --- Assert ---
        match result {
            Err(ExecutionError::StartFailure { command, .. }) => {
                assert_eq!(command, "/nonexistent/plumb-missing-tool");
            }
            other => panic!("expected a start failure, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_downstream_start_failure_wins_over_upstream_success() {
        let stages = vec![stage(&["printf", "data"]), stage(&["/nonexistent/plumb-sink"])];
        let result = execute(stages, OutputMode::Default);
        assert!(matches!(result, Err(ExecutionError::StartFailure { .. })));
    }

    #[test]
    fn test_link_without_outcome_is_a_wait_failure() {
        // --- Setup ---
        let (started_tx, started_rx) = sync_channel::<()>(1);
        let (done_tx, done_rx) = sync_channel(1);
        drop(started_tx);
        drop(done_tx);
        let link = PipelineRun {
            upstream: "printf data".to_string(),
            started: started_rx,
            done: done_rx,
        };

        // --- Execute & Assert ---
        assert!(matches!(
            link.wait_started(),
            Err(ExecutionError::WaitFailure { ref command, .. }) if command == "printf data"
        ));
        assert!(matches!(link.finish(), Err(ExecutionError::WaitFailure { .. })));
    }

    #[test]
    fn test_link_started_without_reporting_is_not_success() {
        let (started_tx, started_rx) = sync_channel(1);
        let (done_tx, done_rx) = sync_channel::<Result<(), ExecutionError>>(1);
        started_tx.send(()).unwrap();
        drop(done_tx);
        let link = PipelineRun {
            upstream: "cat".to_string(),
            started: started_rx,
            done: done_rx,
        };
        assert!(link.wait_started().is_ok());
        assert!(matches!(link.finish(), Err(ExecutionError::WaitFailure { .. })));
    }

    #[test]
    fn test_exit_code_only_for_exit_failures() {
        let exit = ExecutionError::NonZeroExit {
            command: "false".to_string(),
            code: 1,
        };
        let start = ExecutionError::StartFailure {
            command: "nope".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(exit.exit_code(), Some(1));
        assert!(exit.is_exit_failure());
        assert_eq!(start.exit_code(), None);
        assert!(!start.is_exit_failure());
    }
}
