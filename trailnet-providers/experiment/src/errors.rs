use std::{io, path::PathBuf};

use thiserror::Error;
use trailnet_core::ExperimentError;

#[derive(Debug, Error)]
pub enum ExperimentProviderError {
    #[error("failed to list experiments in `{}`: {source}", dir.display())]
    ListDirectory { dir: PathBuf, source: io::Error },
    #[error("failed to read `{}`: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("`{}` is not a valid experiment bundle: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("`{}` holds an unusable experiment: {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: ExperimentError,
    },
}

impl ExperimentProviderError {
    /// Returns the file or directory the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::ListDirectory { dir, .. } => dir,
            Self::Read { path, .. } | Self::Malformed { path, .. } | Self::Invalid { path, .. } => {
                path
            }
        }
    }
}
