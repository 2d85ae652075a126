//! 3x3 homogeneous transform matrix.
//!
//! Storage is row-major:
//!
//! ```text
//! | sx  kx  tx |
//! | ky  sy  ty |
//! | p0  p1  p2 |
//! ```
//!
//! A point maps as `x' = (sx*x + kx*y + tx) / w`, `y' = (ky*x + sy*y + ty) / w` with
//! `w = p0*x + p1*y + p2`.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    values: [f64; 9],
}

const SX: usize = 0;
const KX: usize = 1;
const TX: usize = 2;
const KY: usize = 3;
const SY: usize = 4;
const TY: usize = 5;
const P0: usize = 6;
const P1: usize = 7;
const P2: usize = 8;

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        values: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    /// Creates a matrix from its nine row-major components.
    pub const fn from_rows(values: [f64; 9]) -> Self {
        Self { values }
    }

    /// Creates an affine matrix from its six non-perspective components.
    pub const fn affine(sx: f64, kx: f64, tx: f64, ky: f64, sy: f64, ty: f64) -> Self {
        Self {
            values: [sx, kx, tx, ky, sy, ty, 0.0, 0.0, 1.0],
        }
    }

    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self::affine(1.0, 0.0, dx, 0.0, 1.0, dy)
    }

    /// Uniform scale that keeps `center` fixed.
    pub fn scale_about(factor: f64, center: Point) -> Self {
        Self::affine(
            factor,
            0.0,
            center.x - factor * center.x,
            0.0,
            factor,
            center.y - factor * center.y,
        )
    }

    /// Rotation by `angle` radians that keeps `center` fixed.
    pub fn rotate_about(angle: f64, center: Point) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::affine(
            cos,
            -sin,
            center.x - cos * center.x + sin * center.y,
            sin,
            cos,
            center.y - sin * center.x - cos * center.y,
        )
    }

    pub fn values(&self) -> &[f64; 9] {
        &self.values
    }

    pub fn translation(&self) -> (f64, f64) {
        (self.values[TX], self.values[TY])
    }

    /// Matrix product `a * b`: the result applies `b` first, then `a`.
    pub fn concat(a: &Matrix, b: &Matrix) -> Matrix {
        let a = &a.values;
        let b = &b.values;
        let mut out = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 3 + col] = a[row * 3] * b[col]
                    + a[row * 3 + 1] * b[3 + col]
                    + a[row * 3 + 2] * b[6 + col];
            }
        }
        Matrix { values: out }
    }

    /// `self = other * self`: `other` is applied after the current transform.
    pub fn post_concat(&mut self, other: &Matrix) {
        *self = Matrix::concat(other, self);
    }

    /// `self = self * other`: `other` is applied before the current transform.
    pub fn pre_concat(&mut self, other: &Matrix) {
        *self = Matrix::concat(self, other);
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.values;
        m[SX] * (m[SY] * m[P2] - m[TY] * m[P1]) - m[KX] * (m[KY] * m[P2] - m[TY] * m[P0])
            + m[TX] * (m[KY] * m[P1] - m[SY] * m[P0])
    }

    /// Inverse through the adjugate, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() <= f64::EPSILON {
            return None;
        }
        let m = &self.values;
        let inv_det = 1.0 / det;
        if self.is_affine() {
            let sx = m[SY] * inv_det;
            let kx = -m[KX] * inv_det;
            let ky = -m[KY] * inv_det;
            let sy = m[SX] * inv_det;
            return Some(Matrix::affine(
                sx,
                kx,
                -(sx * m[TX] + kx * m[TY]),
                ky,
                sy,
                -(ky * m[TX] + sy * m[TY]),
            ));
        }
        let adjugate = [
            m[SY] * m[P2] - m[TY] * m[P1],
            m[TX] * m[P1] - m[KX] * m[P2],
            m[KX] * m[TY] - m[TX] * m[SY],
            m[TY] * m[P0] - m[KY] * m[P2],
            m[SX] * m[P2] - m[TX] * m[P0],
            m[TX] * m[KY] - m[SX] * m[TY],
            m[KY] * m[P1] - m[SY] * m[P0],
            m[KX] * m[P0] - m[SX] * m[P1],
            m[SX] * m[SY] - m[KX] * m[KY],
        ];
        Some(Matrix {
            values: adjugate.map(|v| v * inv_det),
        })
    }

    /// Rescales so the bottom-right component is one. Leaves the matrix untouched when that
    /// component is zero.
    pub fn normalized(&self) -> Matrix {
        let w = self.values[P2];
        if w == 0.0 || w == 1.0 || !w.is_finite() {
            return *self;
        }
        Matrix {
            values: self.values.map(|v| v / w),
        }
    }

    /// Maps a point, dividing through by the homogeneous coordinate.
    pub fn map_point(&self, point: Point) -> Point {
        let m = &self.values;
        let x = m[SX] * point.x + m[KX] * point.y + m[TX];
        let y = m[KY] * point.x + m[SY] * point.y + m[TY];
        let w = m[P0] * point.x + m[P1] * point.y + m[P2];
        Point::new(x / w, y / w)
    }

    pub fn is_identity(&self) -> bool {
        *self == Matrix::IDENTITY
    }

    pub fn is_affine(&self) -> bool {
        self.values[P0] == 0.0 && self.values[P1] == 0.0 && self.values[P2] == 1.0
    }

    /// Component-wise comparison after normalizing both matrices.
    pub fn approx_eq(&self, other: &Matrix, tolerance: f64) -> bool {
        let lhs = self.normalized();
        let rhs = other.normalized();
        lhs.values
            .iter()
            .zip(rhs.values.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        Matrix::concat(&self, &rhs)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.values;
        write!(
            f,
            "[{:.4} {:.4} {:.4}; {:.4} {:.4} {:.4}; {:.6} {:.6} {:.4}]",
            m[SX], m[KX], m[TX], m[KY], m[SY], m[TY], m[P0], m[P1], m[P2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_with_identity_is_noop() {
        let m = Matrix::affine(0.5, 0.1, 10.0, -0.1, 0.9, -20.0);
        assert_eq!(Matrix::concat(&Matrix::IDENTITY, &m), m);
        assert_eq!(Matrix::concat(&m, &Matrix::IDENTITY), m);
    }

    #[test]
    fn post_concat_applies_other_last() {
        let mut m = Matrix::scale_about(2.0, Point::ORIGIN);
        m.post_concat(&Matrix::translate(5.0, 0.0));
        let p = m.map_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(7.0, 2.0));

        let mut n = Matrix::scale_about(2.0, Point::ORIGIN);
        n.pre_concat(&Matrix::translate(5.0, 0.0));
        assert_eq!(n.map_point(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
    }

    #[test]
    fn invert_roundtrip() {
        let m = Matrix::from_rows([2.0, 0.3, 5.0, -0.2, 1.5, -3.0, 0.001, 0.002, 1.0]);
        let inv = m.invert().unwrap();
        assert!((m * inv).approx_eq(&Matrix::IDENTITY, 1e-9));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Matrix::affine(1.0, 2.0, 0.0, 2.0, 4.0, 0.0);
        assert!(m.invert().is_none());
    }

    #[test]
    fn rotate_about_keeps_center() {
        let center = Point::new(10.0, -4.0);
        let m = Matrix::rotate_about(std::f64::consts::FRAC_PI_2, center);
        let c = m.map_point(center);
        assert!((c.x - center.x).abs() < 1e-9 && (c.y - center.y).abs() < 1e-9);
        let p = m.map_point(Point::new(11.0, -4.0));
        assert!((p.x - 10.0).abs() < 1e-9 && (p.y + 3.0).abs() < 1e-9);
    }

    #[test]
    fn perspective_division() {
        let m = Matrix::from_rows([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0]);
        assert_eq!(m.map_point(Point::new(4.0, 2.0)), Point::new(2.0, 1.0));
        assert!(!m.is_affine());
        assert!(m.normalized().approx_eq(&Matrix::scale_about(0.5, Point::ORIGIN), 1e-12));
    }
}
