//! Running transform between listener acknowledgements.

use crate::geometry::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

// Gesture phase derived from tracker state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    #[default]
    Idle,     // No contacts down
    PreSlop,  // Contacts down, movement still inside slop
    PostSlop, // Slop exceeded at least once this gesture
}

impl Display for GesturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GesturePhase::Idle => write!(f, "Idle"),
            GesturePhase::PreSlop => write!(f, "PreSlop"),
            GesturePhase::PostSlop => write!(f, "PostSlop"),
        }
    }
}

/// Composes fitted deltas until the listener reports it consumed them.
///
/// `pending` is true whenever at least one delta was composed since the last reset, so the
/// reset condition can be checked without comparing matrices.
#[derive(Clone, Debug, Default)]
pub struct Accumulator {
    matrix: Matrix,
    pending: bool,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Applies `delta` after everything accumulated so far.
    pub fn compose(&mut self, delta: &Matrix) {
        self.matrix.post_concat(delta);
        self.pending = true;
    }

    /// Called when the listener handled the current matrix.
    pub fn consume(&mut self) {
        self.reset();
    }

    pub fn reset(&mut self) {
        self.matrix = Matrix::IDENTITY;
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn compose_applies_deltas_in_order() {
        let mut acc = Accumulator::new();
        acc.compose(&Matrix::translate(10.0, 0.0));
        acc.compose(&Matrix::scale_about(2.0, Point::ORIGIN));
        assert!(acc.has_pending());
        assert_eq!(acc.matrix().map_point(Point::new(1.0, 1.0)), Point::new(22.0, 2.0));
    }

    #[test]
    fn consume_resets_to_identity() {
        let mut acc = Accumulator::new();
        acc.compose(&Matrix::translate(3.0, 4.0));
        acc.consume();
        assert!(!acc.has_pending());
        assert!(acc.matrix().is_identity());
    }
}
