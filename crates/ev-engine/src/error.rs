use thiserror::Error;

use ev_core::{CoreError, GeoPoint, NodeId};
use ev_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Input records could not produce a usable network.
    #[error("data error: {0}")]
    Data(#[source] SpatialError),

    #[error("coordinate {0} cannot be resolved to a road node")]
    InvalidCoordinate(GeoPoint),

    /// No safe point is reachable from the origin.  A normal negative result.
    #[error("no safe point reachable from {origin}")]
    NoRouteFound { origin: NodeId },

    #[error("computation error: {0}")]
    Computation(#[source] SpatialError),

    #[error("engine configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("a network load is already in progress")]
    AlreadyLoading,

    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
