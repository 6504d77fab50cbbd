//! Build and run external commands with shell-like behavior.
//!
//! `plumb` runs programs directly (no shell in between) while offering the few
//! shell conveniences a deployment script relies on: environment overrides,
//! linear pipelines with `pipefail` semantics, output capture, `set -x` style
//! tracing and `set -e` style exit-on-failure.
//!
//! ```no_run
//! use plumb::{Command, Context, LogSink};
//!
//! let context = Context::new(LogSink::new("[deploy] $ "));
//! let authenticated = context
//!     .command(["zeroimage", "check-auth", "--push", "registry/app:latest"])
//!     .trace()
//!     .suppress_output()
//!     .succeeded()?;
//!
//! if !authenticated {
//!     context
//!         .command(["aws", "ecr", "get-login-password"])
//!         .trace()
//!         .pipe(["zeroimage", "login", "--username", "AWS", "--password-stdin", "registry"])
//!         .trace()
//!         .abort_on_failure()
//!         .run()?;
//! }
//! # Ok::<(), plumb::ExecutionError>(())
//! ```

pub mod cli;
pub mod constants;
pub mod core;
pub mod system;

pub use crate::core::command::Command;
pub use crate::core::context::Context;
pub use crate::core::exit_policy::{Termination, exit_for_error, exit_if_error, get_or_exit};
pub use crate::core::settings::{Settings, SettingsError};
pub use crate::core::trace::{LogSink, MemorySink, TraceSink, WriterSink};
pub use crate::system::executor::ExecutionError;
