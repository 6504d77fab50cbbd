// src/core/context.rs

//! Where a command sends its diagnostics.

use crate::core::command::Command;
use crate::core::settings::{Settings, SettingsError};
use crate::core::trace::{TraceSink, WriterSink};
use std::sync::Arc;

/// Explicit configuration shared by every command built from it.
///
/// A context is built once at program start (see [`Context::from_settings`]) and
/// handed to the commands it creates. It currently carries the sink receiving
/// trace lines and fatal messages. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Context {
    sink: Arc<dyn TraceSink>,
}

impl Default for Context {
    /// Writes diagnostics to stderr without a prefix.
    fn default() -> Self {
        Self::new(WriterSink::stderr(""))
    }
}

impl Context {
    /// Creates a context around the given sink.
    pub fn new(sink: impl TraceSink + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Creates a context around a sink that the caller keeps a handle to.
    pub fn with_shared_sink(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink }
    }

    /// Builds the context described by the `[trace]` section of the settings.
    ///
    /// # Errors
    /// Returns an error if the trace destination is a file that cannot be opened.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        Ok(Self::with_shared_sink(settings.trace.build_sink()?))
    }

    /// The sink receiving diagnostics.
    pub fn sink(&self) -> &dyn TraceSink {
        self.sink.as_ref()
    }

    /// Starts a new command that reports through this context.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::with_context(self.clone(), args)
    }
}
