// src/core/exit_policy.rs

//! Turning command failures into termination of the current process.

use crate::constants::FATAL_EXIT_CODE;
use crate::core::context::Context;
use crate::system::executor::ExecutionError;
use std::process;

/// How the current process ends because of a failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The command ran and exited non-zero: exit with the same code.
    Propagate(i32),
    /// The command could not be run: report it and exit with [`FATAL_EXIT_CODE`].
    Fatal,
}

impl Termination {
    /// Picks the termination matching an error.
    pub fn for_error(err: &ExecutionError) -> Self {
        match err.exit_code() {
            Some(code) => Self::Propagate(code),
            None => Self::Fatal,
        }
    }

    /// The status the current process exits with.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Propagate(code) => code,
            Self::Fatal => FATAL_EXIT_CODE,
        }
    }
}

/// Terminates the current process because of `err`.
///
/// Fatal errors are first reported to the context's sink so the exit is never silent;
/// a propagated exit code speaks for itself, the child having already written its
/// own diagnostics.
pub fn exit_for_error(context: &Context, err: &ExecutionError) -> ! {
    let termination = Termination::for_error(err);
    match termination {
        Termination::Propagate(code) => log::debug!("{} Exiting with status {}.", err, code),
        Termination::Fatal => context.sink().fatal(&err.to_string()),
    }
    process::exit(termination.exit_code())
}

/// Applies the exit policy to a result obtained without abort-on-failure.
pub fn exit_if_error(context: &Context, result: Result<(), ExecutionError>) {
    if let Err(e) = result {
        exit_for_error(context, &e);
    }
}

/// Returns the value of a successful result, or terminates per the exit policy.
pub fn get_or_exit<T>(context: &Context, result: Result<T, ExecutionError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => exit_for_error(context, &e),
    }
}
