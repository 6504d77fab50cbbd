// src/system/process.rs

//! Live OS processes for pipeline stages: standard stream bindings, spawning and
//! exit status interpretation.

use crate::constants::{FATAL_EXIT_CODE, SIGNAL_EXIT_OFFSET};
use crate::system::executor::{ExecutionError, Stage};
use std::io::{PipeReader, PipeWriter};
use std::process::{Child, Command as StdCommand, ExitStatus, Stdio};

/// Where a stage reads its standard input from.
#[derive(Debug)]
pub(crate) enum StdinBinding {
    /// The standard input of the current process (root stage).
    Inherit,
    /// The read end of the pipe fed by the previous stage.
    Pipe(PipeReader),
}

/// Where a stage writes its standard output to.
#[derive(Debug)]
pub(crate) enum StdoutBinding {
    /// The current process's stdout, or the null device when the stage suppresses it.
    Default,
    /// An in-memory buffer, regardless of suppression.
    Capture,
    /// The write end of the pipe feeding the next stage, regardless of suppression.
    Pipe(PipeWriter),
}

impl StdinBinding {
    fn into_stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Pipe(reader) => Stdio::from(reader),
        }
    }
}

impl StdoutBinding {
    fn into_stdio(self, suppressed: bool) -> Stdio {
        match self {
            Self::Default if suppressed => Stdio::null(),
            Self::Default => Stdio::inherit(),
            Self::Capture => Stdio::piped(),
            Self::Pipe(writer) => Stdio::from(writer),
        }
    }
}

fn stderr_stdio(suppressed: bool) -> Stdio {
    if suppressed {
        Stdio::null()
    } else {
        Stdio::inherit()
    }
}

/// A started stage process.
#[derive(Debug)]
pub(crate) struct LiveProcess {
    child: Child,
    command: String,
    capture: bool,
}

impl LiveProcess {
    /// Starts the stage's program with the given bindings.
    ///
    /// Environment overrides are applied in order on top of the inherited
    /// environment, so the last assignment for a name wins. Pipe ends handed in
    /// through the bindings are closed in this process once the child exists.
    pub(crate) fn spawn(
        stage: &Stage,
        stdin: StdinBinding,
        stdout: StdoutBinding,
    ) -> Result<Self, ExecutionError> {
        let (program, args) = stage
            .args
            .split_first()
            .ok_or(ExecutionError::EmptyCommand)?;
        let capture = matches!(stdout, StdoutBinding::Capture);

        let mut command = StdCommand::new(program);
        command
            .args(args)
            .stdin(stdin.into_stdio())
            .stdout(stdout.into_stdio(stage.flags.suppress_stdout))
            .stderr(stderr_stdio(stage.flags.suppress_stderr));
        for (name, value) in &stage.envs {
            command.env(name, value);
        }

        let spawned = command.spawn();
        // Dropping the builder releases our copies of any pipe ends it holds.
        drop(command);

        let child = spawned.map_err(|source| ExecutionError::StartFailure {
            command: stage.display(),
            source,
        })?;
        log::debug!("Started '{}' (pid {}).", stage.display(), child.id());

        Ok(Self {
            child,
            command: stage.display(),
            capture,
        })
    }

    /// Waits for the process to exit, collecting its stdout when it is captured.
    pub(crate) fn wait(self) -> Result<Vec<u8>, ExecutionError> {
        let Self {
            child,
            command,
            capture,
        } = self;

        let (status, stdout) = if capture {
            let output = child
                .wait_with_output()
                .map_err(|source| ExecutionError::WaitFailure {
                    command: command.clone(),
                    source,
                })?;
            (output.status, output.stdout)
        } else {
            let mut child = child;
            let status = child.wait().map_err(|source| ExecutionError::WaitFailure {
                command: command.clone(),
                source,
            })?;
            (status, Vec::new())
        };

        log::debug!("'{}' finished with {}.", command, status);
        if status.success() {
            Ok(stdout)
        } else {
            Err(ExecutionError::NonZeroExit {
                command,
                code: exit_code(status),
            })
        }
    }
}

/// Maps an unsuccessful exit status to the code a shell would report for it.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_OFFSET + signal;
        }
    }
    FATAL_EXIT_CODE
}
