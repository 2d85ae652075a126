//! Closed-form point-to-point transform fitting.
//!
//! A fit uses the first `k` correspondences of two index-aligned point arrays and tries
//! solvers from the most to the least degrees of freedom until one of them accepts the
//! configuration:
//!
//! ```text
//! Projective (4) ──► Affine (3) ──► Similarity (2) ──► Translation (1)
//! ```
//!
//! Nearly degenerate inputs (almost collinear or coincident points) are accepted and may
//! yield very large transforms.

use crate::geometry::{is_nearly_zero, Matrix};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    /// One correspondence: pure translation
    Translation,
    /// Two correspondences: uniform scale, rotation and translation
    Similarity,
    /// Three correspondences: adds skew and non-uniform scale
    Affine,
    /// Four correspondences: full quadrilateral mapping with perspective terms
    Projective,
}

impl Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solver::Translation => write!(f, "Translation"),
            Solver::Similarity => write!(f, "Similarity"),
            Solver::Affine => write!(f, "Affine"),
            Solver::Projective => write!(f, "Projective"),
        }
    }
}

/// Result of a successful fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fit {
    pub matrix: Matrix,
    pub solver: Solver,
}

impl Solver {
    pub const ALL: [Solver; 4] = [
        Solver::Translation,
        Solver::Similarity,
        Solver::Affine,
        Solver::Projective,
    ];

    pub fn correspondences(self) -> usize {
        match self {
            Solver::Translation => 1,
            Solver::Similarity => 2,
            Solver::Affine => 3,
            Solver::Projective => 4,
        }
    }

    pub fn for_count(count: usize) -> Option<Solver> {
        Self::ALL.into_iter().find(|s| s.correspondences() == count)
    }

    /// Solvers usable with `count` correspondences, highest degree first.
    pub fn ladder(count: usize) -> impl Iterator<Item = Solver> {
        Self::ALL
            .into_iter()
            .rev()
            .filter(move |s| s.correspondences() <= count)
    }

    /// Solves using the first `correspondences()` pairs. `None` when the arrays are too
    /// short or the configuration is degenerate for this solver.
    pub fn solve(self, src: &[Point], dst: &[Point]) -> Option<Matrix> {
        let k = self.correspondences();
        if src.len() < k || dst.len() < k {
            return None;
        }
        let (src, dst) = (&src[..k], &dst[..k]);
        match self {
            Solver::Translation => {
                let delta = dst[0] - src[0];
                Some(Matrix::translate(delta.x, delta.y))
            }
            Solver::Similarity => similarity(src, dst),
            Solver::Affine => {
                let source = triangle_basis(src);
                if is_nearly_zero(source.determinant()) {
                    return None;
                }
                Some(triangle_basis(dst) * source.invert()?)
            }
            Solver::Projective => {
                let source = quad_basis(src)?;
                if is_nearly_zero(source.determinant()) {
                    return None;
                }
                let target = quad_basis(dst)?;
                Some((target * source.invert()?).normalized())
            }
        }
    }
}

/// Best available mapping from `before` to `after` using at most `max_pointers`
/// correspondences. `None` when there is nothing to fit.
pub fn fit(before: &[Point], after: &[Point], max_pointers: usize) -> Option<Fit> {
    let count = before.len().min(after.len()).min(max_pointers);
    Solver::ladder(count).find_map(|solver| match solver.solve(before, after) {
        Some(matrix) => Some(Fit { matrix, solver }),
        None => {
            trace!("{} solver rejected degenerate input, falling back", solver);
            None
        }
    })
}

fn similarity(src: &[Point], dst: &[Point]) -> Option<Matrix> {
    let vs = src[1] - src[0];
    let vd = dst[1] - dst[0];
    let length_sq = vs.hypot2();
    if is_nearly_zero(length_sq) {
        return None;
    }

    // vd = R * vs with R = [a -b; b a]
    let a = vs.dot(vd) / length_sq;
    let b = vs.cross(vd) / length_sq;
    let tx = dst[0].x - (a * src[0].x - b * src[0].y);
    let ty = dst[0].y - (b * src[0].x + a * src[0].y);
    Some(Matrix::affine(a, -b, tx, b, a, ty))
}

// Maps (0,0), (1,0), (0,1) onto the three points
fn triangle_basis(p: &[Point]) -> Matrix {
    let u = p[1] - p[0];
    let v = p[2] - p[0];
    Matrix::affine(u.x, v.x, p[0].x, u.y, v.y, p[0].y)
}

// Maps the unit square (0,0), (1,0), (1,1), (0,1) onto the four points
fn quad_basis(p: &[Point]) -> Option<Matrix> {
    let sum = (p[0] - p[1]) + (p[2] - p[3]);
    let d1 = p[1] - p[2];
    let d2 = p[3] - p[2];
    let den = d1.cross(d2);
    if is_nearly_zero(den) {
        return None;
    }

    let g = sum.cross(d2) / den;
    let h = d1.cross(sum) / den;
    Some(Matrix::from_rows([
        p[1].x - p[0].x + g * p[1].x,
        p[3].x - p[0].x + h * p[3].x,
        p[0].x,
        p[1].y - p[0].y + g * p[1].y,
        p[3].y - p[0].y + h * p[3].y,
        p[0].y,
        g,
        h,
        1.0,
    ]))
}
