//! Link error type.

use thiserror::Error;

use mt_core::{EdgeId, VehicleId};

/// Errors produced by a [`SimulationLink`](crate::SimulationLink).
#[derive(Debug, Error)]
pub enum LinkError {
    /// The connection dropped, the simulator terminated, or a step took
    /// longer than the configured bound.  Always ends the run.
    #[error("simulation unavailable: {0}")]
    SimulationUnavailable(String),

    /// The vehicle is not live (already arrived, never inserted).
    #[error("unknown vehicle {0}")]
    UnknownEntity(VehicleId),

    #[error("failed to insert vehicle {id}: {reason}")]
    InjectionFailed { id: VehicleId, reason: String },

    #[error("no route from {from} to {to}")]
    NoRoute { from: EdgeId, to: EdgeId },

    #[error("edge {0} not found in network")]
    UnknownEdge(EdgeId),
}

impl LinkError {
    /// `true` for errors after which no further link call can succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::SimulationUnavailable(_))
    }
}

pub type LinkResult<T> = Result<T, LinkError>;
