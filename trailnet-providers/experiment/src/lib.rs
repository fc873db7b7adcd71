//! Experiment bundle provider: discovers and loads the JSON documents a
//! simulation run exports into [`trailnet_core::ExperimentResult`] values.

mod bundle;
mod errors;
mod provider;

pub use errors::ExperimentProviderError;
pub use provider::{ExperimentFile, discover, is_experiment_bundle};
