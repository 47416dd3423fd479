//! Page normalizer: locate the photographed page boundary and warp it into
//! the canonical 595×842 frame.
//!
//! Detection failure is not fatal. A scan that is already fronto-parallel
//! has no surrounding boundary to find, so the normalizer fails *open*:
//! the input is handed through unchanged and the outcome is reported as
//! [`Normalization::PassThrough`] so callers can tell a clean rectification
//! from a degraded one.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

use crate::homography::{self, Quad};
use crate::layout::{CANONICAL_HEIGHT, CANONICAL_WIDTH};
use crate::preprocess;

/// Canny hysteresis thresholds for page-edge detection.
const CANNY_LOW: f32 = 75.0;
const CANNY_HIGH: f32 = 200.0;
/// Polygon approximation tolerance as a fraction of contour perimeter.
const APPROX_EPSILON_FRAC: f64 = 0.02;

/// Outcome of page normalization.
#[derive(Debug, Clone)]
pub enum Normalization {
    /// Page boundary found; image warped into the canonical frame.
    Rectified {
        image: GrayImage,
        /// Source-image page corners, ordered TL, TR, BR, BL.
        corners: Quad,
    },
    /// No usable boundary; the input image, unchanged.
    PassThrough { image: GrayImage },
}

impl Normalization {
    pub fn image(&self) -> &GrayImage {
        match self {
            Self::Rectified { image, .. } => image,
            Self::PassThrough { image } => image,
        }
    }

    pub fn into_image(self) -> GrayImage {
        match self {
            Self::Rectified { image, .. } => image,
            Self::PassThrough { image } => image,
        }
    }

    pub fn is_rectified(&self) -> bool {
        matches!(self, Self::Rectified { .. })
    }
}

/// Rectify a photographed page into the canonical frame, or pass it through.
pub fn normalize(image: &GrayImage) -> Normalization {
    match find_page_quad(image) {
        Some(corners) => match warp_to_canonical(image, &corners) {
            Ok(warped) => {
                tracing::info!(
                    "Page boundary rectified: {}x{} -> {}x{}",
                    image.width(),
                    image.height(),
                    CANONICAL_WIDTH,
                    CANONICAL_HEIGHT
                );
                Normalization::Rectified {
                    image: warped,
                    corners,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Page quad found but transform is degenerate ({}); passing input through",
                    e
                );
                Normalization::PassThrough {
                    image: image.clone(),
                }
            }
        },
        None => {
            tracing::warn!(
                "No 4-vertex page boundary found in {}x{} image; passing input through",
                image.width(),
                image.height()
            );
            Normalization::PassThrough {
                image: image.clone(),
            }
        }
    }
}

/// Locate the page boundary: the largest-area external contour whose
/// 2%-perimeter polygon approximation has exactly four vertices.
///
/// Ties on area keep the first candidate found; contour enumeration order is
/// not specified, so degenerate equal-area input resolves arbitrarily.
pub fn find_page_quad(image: &GrayImage) -> Option<Quad> {
    let blurred = preprocess::gaussian_blur(image, preprocess::BLUR_SIGMA_5X5);
    let edges = imageproc::edges::canny(&blurred, CANNY_LOW, CANNY_HIGH);

    let contours = find_contours::<i32>(&edges);
    let mut best: Option<(f64, [Point<i32>; 4])> = None;

    for contour in &contours {
        if contour.border_type != BorderType::Outer || contour.points.len() < 4 {
            continue;
        }
        let epsilon = APPROX_EPSILON_FRAC * perimeter(&contour.points);
        let approx = approximate_polygon_dp(&contour.points, epsilon, true);
        if approx.len() != 4 {
            continue;
        }
        let area = polygon_area(&contour.points);
        if area <= f64::EPSILON {
            // Zero-area quads (collapsed contours) cannot bound a page.
            continue;
        }
        let is_better = match &best {
            Some((best_area, _)) => area > *best_area,
            None => true,
        };
        if is_better {
            best = Some((area, [approx[0], approx[1], approx[2], approx[3]]));
        }
    }

    best.map(|(area, points)| {
        tracing::debug!("Page quad candidate accepted: area={:.0}px²", area);
        order_corners(points)
    })
}

/// Order four points as top-left, top-right, bottom-right, bottom-left:
/// split into top and bottom pairs by y, then resolve left/right by x.
fn order_corners(points: [Point<i32>; 4]) -> Quad {
    let mut pts: Vec<[f64; 2]> = points.iter().map(|p| [p.x as f64, p.y as f64]).collect();
    pts.sort_by(|a, b| a[1].total_cmp(&b[1]));

    let (tl, tr) = if pts[0][0] < pts[1][0] {
        (pts[0], pts[1])
    } else {
        (pts[1], pts[0])
    };
    let (bl, br) = if pts[2][0] < pts[3][0] {
        (pts[2], pts[3])
    } else {
        (pts[3], pts[2])
    };
    [tl, tr, br, bl]
}

/// Warp the source image so `corners` lands on the canonical page rectangle.
fn warp_to_canonical(
    image: &GrayImage,
    corners: &Quad,
) -> Result<GrayImage, homography::PerspectiveError> {
    // Inverse mapping: for each canonical pixel, project into the source.
    let h = homography::rect_to_quad(CANONICAL_WIDTH as f64, CANONICAL_HEIGHT as f64, corners)?;

    let mut out = GrayImage::new(CANONICAL_WIDTH, CANONICAL_HEIGHT);
    for y in 0..CANONICAL_HEIGHT {
        for x in 0..CANONICAL_WIDTH {
            let [sx, sy] = homography::project(&h, x as f64, y as f64);
            let v = bilinear_sample(image, sx, sy).unwrap_or(0.0);
            out.put_pixel(x, y, image::Luma([v.round() as u8]));
        }
    }
    Ok(out)
}

/// Bilinear sample at a fractional source position; `None` outside the image.
fn bilinear_sample(image: &GrayImage, x: f64, y: f64) -> Option<f64> {
    let (w, h) = image.dimensions();
    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return None;
    }
    if x > (w - 1) as f64 || y > (h - 1) as f64 {
        return None;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = image.get_pixel(x0, y0)[0] as f64;
    let p10 = image.get_pixel(x1, y0)[0] as f64;
    let p01 = image.get_pixel(x0, y1)[0] as f64;
    let p11 = image.get_pixel(x1, y1)[0] as f64;

    let top = p00 + (p10 - p00) * fx;
    let bottom = p01 + (p11 - p01) * fx;
    Some(top + (bottom - top) * fy)
}

fn perimeter(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let dx = (a.x - b.x) as f64;
        let dy = (a.y - b.y) as f64;
        total += (dx * dx + dy * dy).sqrt();
    }
    total
}

/// Unsigned shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        twice_area += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    twice_area.abs() / 2.0
}
