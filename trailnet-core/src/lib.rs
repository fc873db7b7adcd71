//! Trailnet core library.
//!
//! Turns the nuclei of a foraging simulation into a terrain-aware station
//! network: a k-nearest-neighbour mesh pruned against the terrain raster,
//! per-level station backbones, their degree-two skeletons, and the cost,
//! travel-time, and vulnerability scores used to compare experiments.
//!
//! When the `metrics` feature is enabled the core emits:
//!
//! - `trailnet_refinement_sources_total` (counter)
//! - `trailnet_vulnerability_trials_total` (counter)
#![cfg_attr(docsrs, feature(doc_cfg))]

mod analysis;
mod builder;
mod cancel;
mod error;
mod exec;
mod experiment;
mod geometry;
mod graph;
mod paths;
mod pipeline;
mod proximity;
mod pruning;
mod refine;
mod simplify;

pub use crate::{
    analysis::{NetworkReport, cost, edge_vulnerabilities, mean_travel_time, vulnerability},
    builder::{
        DEFAULT_MAX_WATER_CROSSINGS, DEFAULT_PROXIMITY_LEVELS, ExecutionStrategy, PipelineBuilder,
    },
    cancel::CancellationToken,
    error::{
        ExperimentError, ExperimentErrorCode, GraphError, GraphErrorCode, Result, TrailnetError,
        TrailnetErrorCode,
    },
    experiment::{ExperimentMetadata, ExperimentResult},
    geometry::{LinePixels, Point, TerrainGrid, rasterize_line},
    graph::{Edge, Graph, NodeId},
    paths::{ShortestPaths, dijkstra, is_connected},
    pipeline::{LevelReport, Pipeline},
    proximity::{DEFAULT_NEIGHBOURS, ProximityGraphBuilder},
    pruning::MapAwareEdgePruner,
    refine::{DistanceTable, ProximitySubgraph, Refinement, StationNetworkRefiner},
    simplify::TopologySimplifier,
};
