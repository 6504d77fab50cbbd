//! # System Interaction Layer
//!
//! The boundary between the command builder and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: resolves a command chain into ordered stages, connects them
//!   with OS pipes, runs every stage but the last on its own worker thread and
//!   reconciles their outcomes (pipefail).
//! - **`process`**: one live child process: standard stream bindings, spawning,
//!   waiting and exit status interpretation.

pub mod executor;
pub(crate) mod process;
