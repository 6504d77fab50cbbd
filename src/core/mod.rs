// src/core/mod.rs

//! Command building, diagnostics, settings and exit policy.

pub mod command;
pub mod context;
pub mod exit_policy;
pub mod settings;
pub mod trace;
