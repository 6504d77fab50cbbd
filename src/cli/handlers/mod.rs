// src/cli/handlers/mod.rs

//! One handler per mode; `commons` turns the parsed arguments into a pipeline.

pub mod check;
pub mod commons;
pub mod run;
pub mod text;
