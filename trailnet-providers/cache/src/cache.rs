//! Persistence of station refinements next to their experiment files.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use trailnet_core::{NodeId, ProximitySubgraph, Refinement};

use crate::{
    codec::{decode_distances, decode_edge_list, encode_distances, encode_edge_list},
    errors::{CacheError, CodecError},
    store::ArtifactStore,
};

/// Returns the key of the edge list cached for `experiment` at `level`.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use trailnet_providers_cache::edge_list_key;
///
/// let key = edge_list_key(Path::new("runs/a.json"), 2);
/// assert_eq!(key, Path::new("runs/a.json.p2.weighted.edgelist"));
/// ```
#[must_use]
pub fn edge_list_key(experiment: &Path, level: usize) -> PathBuf {
    with_suffix(experiment, &format!(".p{level}.weighted.edgelist"))
}

/// Returns the key of the distance table cached for `experiment`.
#[must_use]
pub fn distances_key(experiment: &Path) -> PathBuf {
    with_suffix(experiment, ".distances.json")
}

/// Returns the key of the parameters a cached refinement was computed with.
#[must_use]
pub fn parameters_key(experiment: &Path) -> PathBuf {
    with_suffix(experiment, ".params.json")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Inputs that shape a refinement besides the experiment itself.
///
/// A cached refinement is only served to a lookup with equal parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementParameters {
    /// Neighbourhood size of the proximity mesh.
    pub neighbours: usize,
    /// Crossing threshold used when pruning the mesh.
    pub max_water_crossings: usize,
    /// Number of stations in the experiment.
    pub stations: usize,
}

/// Loads and publishes [`Refinement`]s through an [`ArtifactStore`].
///
/// The distance table is the commit marker: it is retracted before a new
/// refinement is written and published after every edge list and the
/// parameters. A lookup only hits when the table, the parameters and every
/// requested level decode cleanly and the parameters match; anything less
/// is a miss.
#[derive(Debug, Clone, Default)]
pub struct RefinementCache<S> {
    store: S,
}

impl<S: ArtifactStore> RefinementCache<S> {
    /// Wraps `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn artifacts(&self) -> &S {
        &self.store
    }

    /// Looks up the refinement cached for `experiment` under `parameters`.
    ///
    /// Returns `Ok(None)` on a miss, including partially written,
    /// undecodable or differently parameterised caches.
    ///
    /// # Errors
    /// Returns [`CacheError::Store`] when an artifact exists but cannot be
    /// read.
    #[instrument(
        name = "cache.load",
        err,
        skip(self, experiment, parameters, stations),
        fields(experiment = %experiment.display(), levels = ?levels),
    )]
    pub fn load(
        &self,
        experiment: &Path,
        parameters: &RefinementParameters,
        stations: &[NodeId],
        levels: &[usize],
    ) -> Result<Option<Refinement>, CacheError> {
        let Some(distances) = self.store.load(&distances_key(experiment))? else {
            debug!("cache miss: no distance table");
            return Ok(None);
        };
        let Some(recorded) = self.store.load(&parameters_key(experiment))? else {
            warn!("cache miss: parameters absent despite distance table");
            return Ok(None);
        };
        match serde_json::from_slice::<RefinementParameters>(&recorded) {
            Ok(cached) if cached == *parameters => {}
            Ok(cached) => {
                info!(cached = ?cached, "cache miss: parameters changed");
                return Ok(None);
            }
            Err(err) => {
                warn!(error = %err, "cache miss: cached parameters are unreadable");
                return Ok(None);
            }
        }
        let mut edge_lists = Vec::with_capacity(levels.len());
        for &level in levels {
            match self.store.load(&edge_list_key(experiment, level))? {
                Some(bytes) => edge_lists.push((level, bytes)),
                None => {
                    warn!(level, "cache miss: edge list absent despite distance table");
                    return Ok(None);
                }
            }
        }
        match decode(&distances, edge_lists, stations) {
            Ok(refinement) => {
                info!(pairs = refinement.distances().len(), "cache hit");
                Ok(Some(refinement))
            }
            Err(err) => {
                warn!(error = %err, "cache miss: cached artifacts are unreadable");
                Ok(None)
            }
        }
    }

    /// Publishes `refinement` for `experiment`, computed under `parameters`.
    ///
    /// # Errors
    /// Returns [`CacheError`] when encoding or publishing fails. Artifacts
    /// published before the failure are harmless without the distance table.
    #[instrument(
        name = "cache.store",
        err,
        skip(self, experiment, parameters, refinement),
        fields(experiment = %experiment.display(), levels = refinement.subgraphs().len()),
    )]
    pub fn store(
        &self,
        experiment: &Path,
        parameters: &RefinementParameters,
        refinement: &Refinement,
    ) -> Result<(), CacheError> {
        let marker = distances_key(experiment);
        self.store.retract(&marker)?;
        for subgraph in refinement.subgraphs() {
            let text = encode_edge_list(subgraph.graph());
            self.store
                .publish(&edge_list_key(experiment, subgraph.level()), text.as_bytes())?;
        }
        let encoded = serde_json::to_vec(parameters).map_err(CacheError::Encode)?;
        self.store.publish(&parameters_key(experiment), &encoded)?;
        let distances = encode_distances(refinement.distances()).map_err(CacheError::Encode)?;
        self.store.publish(&marker, &distances)?;
        debug!("refinement cached");
        Ok(())
    }
}

fn decode(
    distances: &[u8],
    edge_lists: Vec<(usize, Vec<u8>)>,
    stations: &[NodeId],
) -> Result<Refinement, CodecError> {
    let table = decode_distances(distances)?;
    let mut subgraphs = Vec::with_capacity(edge_lists.len());
    for (level, bytes) in edge_lists {
        let text = String::from_utf8(bytes).map_err(|_| CodecError::NotUtf8)?;
        let edges = decode_edge_list(&text)?;
        subgraphs.push(ProximitySubgraph::from_edges(
            level,
            stations.iter().copied(),
            edges,
        )?);
    }
    Ok(Refinement::from_parts(table, subgraphs))
}
