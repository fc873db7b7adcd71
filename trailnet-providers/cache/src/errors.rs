use std::{io, path::PathBuf};

use thiserror::Error;
use trailnet_core::GraphError;

/// Failure to read or publish an artifact.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read artifact `{}`: {source}", key.display())]
    Read { key: PathBuf, source: io::Error },
    #[error("failed to stage artifact `{}`: {source}", key.display())]
    Stage { key: PathBuf, source: io::Error },
    #[error("failed to publish artifact `{}`: {source}", key.display())]
    Persist { key: PathBuf, source: io::Error },
    #[error("failed to retract artifact `{}`: {source}", key.display())]
    Retract { key: PathBuf, source: io::Error },
}

/// Failure to decode a cached artifact. Decoding failures turn a lookup into
/// a miss rather than an error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("line {line}: expected `<a> <b> {{'weight': <w>}}`, found `{text}`")]
    MalformedEdge { line: usize, text: String },
    #[error("line {line}: `{token}` is not a node id")]
    InvalidNode { line: usize, token: String },
    #[error("line {line}: `{token}` is not a weight")]
    InvalidWeight { line: usize, token: String },
    #[error("edge list is not UTF-8")]
    NotUtf8,
    #[error("JSON artifact is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cached edges do not form a valid graph: {0}")]
    Graph(#[from] GraphError),
}

/// Failure of a [`crate::RefinementCache`] operation.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode cached artifact: {0}")]
    Encode(#[source] serde_json::Error),
}
