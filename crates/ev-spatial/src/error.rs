//! Spatial-subsystem error type.

use thiserror::Error;

use ev_core::{CoreError, NodeId};

/// Errors produced by `ev-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("network is empty: {0}")]
    EmptyNetwork(&'static str),

    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("no candidate reachable from {from}")]
    Unreachable { from: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("negative cycle reachable from {0}")]
    NegativeCycle(NodeId),

    #[error("unknown routing algorithm {0:?}")]
    UnknownAlgorithm(String),

    #[error("too many nodes for 32-bit ids: {0}")]
    TooLarge(usize),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
