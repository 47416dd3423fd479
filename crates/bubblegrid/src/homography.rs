//! Perspective transform between the canonical page rectangle and a
//! photographed page quadrilateral.
//!
//! The page boundary gives exactly four correspondences, so the transform is
//! solved directly from the 8×8 linear system (h33 fixed to 1) rather than an
//! overdetermined least-squares fit.

use nalgebra::{Matrix3, SMatrix, SVector};

/// Corner order contract: top-left, top-right, bottom-right, bottom-left.
pub type Quad = [[f64; 2]; 4];

#[derive(Debug, Clone, PartialEq)]
pub enum PerspectiveError {
    /// The corner configuration admits no invertible transform
    /// (collinear or coincident points).
    Degenerate,
}

impl std::fmt::Display for PerspectiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Degenerate => write!(f, "degenerate corner configuration"),
        }
    }
}

impl std::error::Error for PerspectiveError {}

/// Project a 2D point through a 3×3 homography: `H · [x, y, 1]ᵀ → [u, v]`.
pub fn project(h: &Matrix3<f64>, x: f64, y: f64) -> [f64; 2] {
    let w = h[(2, 0)] * x + h[(2, 1)] * y + h[(2, 2)];
    if w.abs() < 1e-15 {
        return [f64::NAN, f64::NAN];
    }
    let u = h[(0, 0)] * x + h[(0, 1)] * y + h[(0, 2)];
    let v = h[(1, 0)] * x + h[(1, 1)] * y + h[(1, 2)];
    [u / w, v / w]
}

/// Estimate the homography mapping `src[i] → dst[i]` for four corners.
///
/// Solves the standard 8-unknown system: for each correspondence
/// `(x, y) → (u, v)`,
///
/// ```text
/// u = (h11·x + h12·y + h13) / (h31·x + h32·y + 1)
/// v = (h21·x + h22·y + h23) / (h31·x + h32·y + 1)
/// ```
pub fn perspective_from_quads(src: &Quad, dst: &Quad) -> Result<Matrix3<f64>, PerspectiveError> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for i in 0..4 {
        let [x, y] = src[i];
        let [u, v] = dst[i];

        a[(2 * i, 0)] = x;
        a[(2 * i, 1)] = y;
        a[(2 * i, 2)] = 1.0;
        a[(2 * i, 6)] = -u * x;
        a[(2 * i, 7)] = -u * y;
        b[2 * i] = u;

        a[(2 * i + 1, 3)] = x;
        a[(2 * i + 1, 4)] = y;
        a[(2 * i + 1, 5)] = 1.0;
        a[(2 * i + 1, 6)] = -v * x;
        a[(2 * i + 1, 7)] = -v * y;
        b[2 * i + 1] = v;
    }

    let h = a.lu().solve(&b).ok_or(PerspectiveError::Degenerate)?;

    Ok(Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
    ))
}

/// Homography mapping the axis-aligned `width`×`height` rectangle (origin at
/// the top-left) onto `corners`.
///
/// This is the inverse-warp direction: iterate destination pixels, project
/// into the source image, sample.
pub fn rect_to_quad(
    width: f64,
    height: f64,
    corners: &Quad,
) -> Result<Matrix3<f64>, PerspectiveError> {
    let rect: Quad = [
        [0.0, 0.0],
        [width, 0.0],
        [width, height],
        [0.0, height],
    ];
    perspective_from_quads(&rect, corners)
}
