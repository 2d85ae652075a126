//! Planar geometry shared by the fitter and the detector.
//!
//! Positions are [`kurbo::Point`]s. Transforms are full 3x3 homogeneous matrices so that
//! the four point solver can express perspective distortion; the lower degree solvers
//! always produce affine matrices.

pub mod matrix;

pub use kurbo::{Point, Vec2};
pub use matrix::Matrix;

/// Magnitude below which a determinant-like quantity (squared pixel units) is treated as zero.
pub const NEARLY_ZERO: f64 = 1.0 / 4096.0;

pub fn is_nearly_zero(value: f64) -> bool {
    !value.is_finite() || value.abs() <= NEARLY_ZERO
}
