//! Error types for the trailnet core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::fmt;

use thiserror::Error;

use crate::{builder::ExecutionStrategy, graph::NodeId};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while mutating a [`crate::Graph`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
    /// Edges must join two distinct nodes.
    #[error("self-loop on node {node} is not allowed")]
    SelfLoop {
        /// Node the rejected edge started and ended on.
        node: NodeId,
    },
    /// Edge weights must be finite.
    #[error("edge ({left}, {right}) has non-finite weight")]
    NonFiniteWeight {
        /// Left endpoint as provided.
        left: NodeId,
        /// Right endpoint as provided.
        right: NodeId,
    },
    /// Edge weights must not be negative.
    #[error("edge ({left}, {right}) has negative weight {weight}")]
    NegativeWeight {
        /// Left endpoint as provided.
        left: NodeId,
        /// Right endpoint as provided.
        right: NodeId,
        /// The rejected weight.
        weight: f64,
    },
    /// The edge already exists with a different weight.
    #[error("edge ({left}, {right}) already has weight {existing}, refusing {requested}")]
    ConflictingWeight {
        /// Left endpoint as provided.
        left: NodeId,
        /// Right endpoint as provided.
        right: NodeId,
        /// Weight already stored on the edge.
        existing: f64,
        /// Weight the caller attempted to store.
        requested: f64,
    },
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// Edges must join two distinct nodes.
        SelfLoop => SelfLoop { .. } => "GRAPH_SELF_LOOP",
        /// Edge weights must be finite.
        NonFiniteWeight => NonFiniteWeight { .. } => "GRAPH_NON_FINITE_WEIGHT",
        /// Edge weights must not be negative.
        NegativeWeight => NegativeWeight { .. } => "GRAPH_NEGATIVE_WEIGHT",
        /// The edge already exists with a different weight.
        ConflictingWeight => ConflictingWeight { .. } => "GRAPH_CONFLICTING_WEIGHT",
    }
}

/// An error produced while assembling an [`crate::ExperimentResult`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ExperimentError {
    /// A nucleus or station had a NaN or infinite coordinate.
    #[error("point {index} of `{array}` has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Name of the input array holding the point.
        array: &'static str,
        /// Row within that array.
        index: usize,
    },
    /// The terrain raster was not rectangular.
    #[error("terrain column {column} has {actual} cells but expected {expected}")]
    RaggedTerrain {
        /// Outer (x) index of the offending column.
        column: usize,
        /// Column height established by the first column.
        expected: usize,
        /// Height of the offending column.
        actual: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`ExperimentError`] variants.
    enum ExperimentErrorCode for ExperimentError {
        /// A nucleus or station had a NaN or infinite coordinate.
        NonFiniteCoordinate => NonFiniteCoordinate { .. } => "EXPERIMENT_NON_FINITE_COORDINATE",
        /// The terrain raster was not rectangular.
        RaggedTerrain => RaggedTerrain { .. } => "EXPERIMENT_RAGGED_TERRAIN",
    }
}

/// Error type produced when configuring or running a [`crate::Pipeline`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TrailnetError {
    /// The neighbourhood size must include at least the query point.
    #[error("neighbour count must be at least 1 (got {got})")]
    InvalidNeighbourCount {
        /// The invalid neighbour count supplied by the caller.
        got: usize,
    },
    /// At least one proximity level is required.
    #[error("at least one proximity level must be requested")]
    EmptyProximityLevels,
    /// Proximity levels count stations and must be positive.
    #[error("proximity level must be at least 1 (got {got})")]
    InvalidProximityLevel {
        /// The invalid level supplied by the caller.
        got: usize,
    },
    /// The requested execution strategy is unavailable in the current build.
    #[error("the requested execution strategy {requested:?} is not available in this build")]
    BackendUnavailable {
        /// Strategy that could not be satisfied by the current build.
        requested: ExecutionStrategy,
    },
    /// A cancellation request interrupted the computation.
    #[error("computation was cancelled")]
    Cancelled,
    /// A graph mutation failed.
    #[error(transparent)]
    Graph {
        /// Underlying graph error.
        #[from]
        source: GraphError,
    },
}

define_error_codes! {
    /// Stable codes describing [`TrailnetError`] variants.
    enum TrailnetErrorCode for TrailnetError {
        /// The neighbourhood size must include at least the query point.
        InvalidNeighbourCount => InvalidNeighbourCount { .. } => "TRAILNET_INVALID_NEIGHBOUR_COUNT",
        /// At least one proximity level is required.
        EmptyProximityLevels => EmptyProximityLevels => "TRAILNET_EMPTY_PROXIMITY_LEVELS",
        /// Proximity levels count stations and must be positive.
        InvalidProximityLevel => InvalidProximityLevel { .. } => "TRAILNET_INVALID_PROXIMITY_LEVEL",
        /// The requested execution strategy is unavailable in the current build.
        BackendUnavailable => BackendUnavailable { .. } => "TRAILNET_BACKEND_UNAVAILABLE",
        /// A cancellation request interrupted the computation.
        Cancelled => Cancelled => "TRAILNET_CANCELLED",
        /// A graph mutation failed.
        GraphFailure => Graph { .. } => "TRAILNET_GRAPH_FAILURE",
    }
}

impl TrailnetError {
    /// Retrieve the inner [`GraphErrorCode`] when the error originated in a graph mutation.
    #[must_use]
    pub const fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Self::Graph { source } => Some(source.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, TrailnetError>;
