// src/core/trace.rs

//! Diagnostics emitted around command execution.
//!
//! Before a traced stage starts, its command line is rendered as
//! `+ NAME=value ... arg0 arg1 ...` with every value shell-quoted, so the line can
//! be pasted back into a shell to reproduce the invocation. Where that line ends up
//! is decided by a [`TraceSink`], which is also where fatal messages go right before
//! the exit policy terminates the program.

use crate::constants::{TRACE_LOG_TARGET, TRACE_MARKER};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Destination for trace lines and fatal messages.
///
/// Implementations are shared between the stages of a pipeline, which may run on
/// different threads, so they must be `Send + Sync`.
pub trait TraceSink: Send + Sync + fmt::Debug {
    /// Records one trace line. The line carries no trailing newline.
    fn trace(&self, line: &str);

    /// Records a message describing why the program is about to abort.
    fn fatal(&self, message: &str);
}

/// Routes diagnostics through the `log` facade.
///
/// Trace lines are logged at `info` level on the [`TRACE_LOG_TARGET`] target.
/// Fatal messages are logged at `error` level, or written to stderr when no logger
/// would record them, so an abort is never silent.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    prefix: String,
}

impl LogSink {
    /// Creates a sink that prepends `prefix` to every trace line.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl TraceSink for LogSink {
    fn trace(&self, line: &str) {
        log::info!(target: TRACE_LOG_TARGET, "{}{}", self.prefix, line);
    }

    fn fatal(&self, message: &str) {
        if log::log_enabled!(log::Level::Error) {
            log::error!("{}", message);
        } else {
            eprintln!("{}", message);
        }
    }
}

/// Writes diagnostics line by line to any `Write` implementation (stderr, a file...).
///
/// The prefix marks trace lines only; fatal messages are written as they are.
pub struct WriterSink {
    prefix: String,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterSink {
    /// Creates a sink writing to `writer`, prepending `prefix` to every trace line.
    pub fn new(prefix: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Creates a sink writing to the standard error stream of the current process.
    pub fn stderr(prefix: impl Into<String>) -> Self {
        Self::new(prefix, io::stderr())
    }

    fn write_line(&self, prefix: &str, text: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // Diagnostics are best effort: a closed stream must not fail the command itself.
        if let Err(e) = writeln!(writer, "{}{}", prefix, text).and_then(|()| writer.flush()) {
            log::warn!("Failed to write diagnostic line: {}", e);
        }
    }
}

impl fmt::Debug for WriterSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl TraceSink for WriterSink {
    fn trace(&self, line: &str) {
        self.write_line(&self.prefix, line);
    }

    fn fatal(&self, message: &str) {
        self.write_line("", message);
    }
}

/// Keeps every diagnostic in memory. Useful when embedding or testing.
#[derive(Debug, Default)]
pub struct MemorySink {
    traces: Mutex<Vec<String>>,
    fatals: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the trace lines recorded so far, in arrival order.
    pub fn traces(&self) -> Vec<String> {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns a copy of the fatal messages recorded so far.
    pub fn fatals(&self) -> Vec<String> {
        self.fatals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TraceSink for MemorySink {
    fn trace(&self, line: &str) {
        self.traces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }

    fn fatal(&self, message: &str) {
        self.fatals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Quotes a single word for a POSIX shell, leaving it untouched when that is safe.
pub fn quote_word(word: &str) -> Cow<'_, str> {
    // `try_quote` only rejects interior NUL bytes, which no OS accepts in an
    // argument anyway. Show those escaped instead of dropping the word.
    shlex::try_quote(word).unwrap_or_else(|_| Cow::Owned(format!("{:?}", word)))
}

/// Renders an argument vector as a single shell-quoted string.
pub fn quote_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| quote_word(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the trace line for a stage: `+ NAME=value ... arg0 arg1 ...`.
///
/// Variable names are printed as given and values are shell-quoted. Overrides are
/// listed in the order they were added, including repeated names.
pub fn format_trace_line(envs: &[(String, String)], args: &[String]) -> String {
    let mut line = String::with_capacity(TRACE_MARKER.len() + 1 + args.len() * 16);
    line.push_str(TRACE_MARKER);
    line.push(' ');
    for (name, value) in envs {
        line.push_str(name);
        line.push('=');
        line.push_str(&quote_word(value));
        line.push(' ');
    }
    line.push_str(&quote_args(args));
    line
}
