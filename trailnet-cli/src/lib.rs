//! Support library for the trailnet CLI binary.
//!
//! Exposes the command layer, the batch orchestrator and logging setup so
//! doctests and integration tests can drive them without a subprocess.

pub mod cli;
pub mod logging;
