// src/constants.rs

//! Fixed values shared across the crate.

/// The exit status used when a command could not be run at all (start, pipe or
/// wait failures), as opposed to a command that ran and exited non-zero.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Offset added to a signal number to form the exit code of a child killed by
/// that signal, following the usual shell convention.
pub const SIGNAL_EXIT_OFFSET: i32 = 128;

/// Marker printed at the start of every trace line, approximating `set -x`.
pub const TRACE_MARKER: &str = "+";

/// The `log` target used for trace lines when they are routed through the logger.
pub const TRACE_LOG_TARGET: &str = "plumb::trace";

/// Default prefix prepended to trace lines written directly to a stream or file.
pub const DEFAULT_TRACE_PREFIX: &str = "[plumb] $ ";

/// The argument separating pipeline stages on the `plumb` command line.
pub const STAGE_SEPARATOR: &str = "|";

/// The name of the directory containing plumb configuration (in the system config dir).
pub const CONFIG_DIR_NAME: &str = "plumb";

/// The name of the settings file inside the configuration directory.
pub const SETTINGS_FILENAME: &str = "config.toml";

/// Environment variable that points at an explicit settings file.
pub const SETTINGS_ENV_VAR: &str = "PLUMB_CONFIG";
