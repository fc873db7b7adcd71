//! Refinement cache: an artifact store with atomic publication plus the
//! edge-list and distance-table encodings kept next to experiment files.

mod cache;
mod codec;
mod errors;
mod store;

pub use cache::{
    RefinementCache, RefinementParameters, distances_key, edge_list_key, parameters_key,
};
pub use codec::{decode_distances, decode_edge_list, encode_distances, encode_edge_list};
pub use errors::{CacheError, CodecError, StoreError};
pub use store::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};

#[cfg(test)]
mod tests;
