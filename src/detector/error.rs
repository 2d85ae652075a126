//! Error definitions for the gesture detector

use crate::detector::tracker::PointerId;
use thiserror::Error;

/// Contract and configuration violations surfaced by the detector
///
/// Degenerate geometry is never an error; the fitter falls back to a lower degree solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    /// A configuration value is out of range; nothing was changed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The detector was built without a transform listener
    #[error("A transform listener is required")]
    MissingListener,

    /// A move or end referenced a pointer that is not active
    #[error("Unknown pointer: {0}")]
    UnknownPointer(PointerId),

    /// A begin reused the id of a pointer that is still active
    #[error("Pointer already active: {0}")]
    DuplicatePointer(PointerId),
}
