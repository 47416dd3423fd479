//! Grayscale preprocessing shared by the normalizer, classifier, and
//! field extractor.
//!
//! The adaptive mean threshold tolerates uneven lighting across a
//! photographed page; a single global threshold does not. Otsu binarization
//! is reserved for the small, evenly-lit field crops handed to OCR.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};

/// Sigma equivalent of a 5×5 Gaussian kernel (0.3·((k−1)/2 − 1) + 0.8).
pub const BLUR_SIGMA_5X5: f32 = 1.1;

/// Pixel window for the adaptive mean threshold.
pub const ADAPTIVE_BLOCK_SIZE: u32 = 15;
/// Offset subtracted from the local mean before comparison.
pub const ADAPTIVE_OFFSET: i32 = 10;

/// Gaussian-blur a grayscale image.
///
/// `imageproc` blurs in f32; round-trip through a normalized float buffer.
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    let (w, h) = image.dimensions();
    let mut f = ImageBuffer::<Luma<f32>, Vec<f32>>::new(w, h);
    for y in 0..h {
        for x in 0..w {
            f.put_pixel(x, y, Luma([image.get_pixel(x, y)[0] as f32 / 255.0]));
        }
    }
    let blurred = imageproc::filter::gaussian_blur_f32(&f, sigma);
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = blurred.get_pixel(x, y)[0].clamp(0.0, 1.0);
            out.put_pixel(x, y, Luma([(v * 255.0).round() as u8]));
        }
    }
    out
}

/// Inverted adaptive mean threshold.
///
/// A pixel becomes foreground (255) when it is at least `offset` darker than
/// the mean of the `block_size`×`block_size` window centered on it (clamped
/// at the borders). Marked bubbles and ink come out as high-intensity
/// foreground on a zero background.
pub fn adaptive_mean_threshold_inv(image: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (w, h) = image.dimensions();
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let integral = integral_image(image);
    let half = (block_size / 2) as i64;

    for y in 0..h {
        for x in 0..w {
            let x0 = (x as i64 - half).max(0) as u32;
            let y0 = (y as i64 - half).max(0) as u32;
            let x1 = (x as i64 + half).min(w as i64 - 1) as u32;
            let y1 = (y as i64 + half).min(h as i64 - 1) as u32;

            let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as i64;
            let sum = window_sum(&integral, w, x0, y0, x1, y1);
            let mean = sum / count;

            let value = image.get_pixel(x, y)[0] as i64;
            let fg = value <= mean - offset as i64;
            out.put_pixel(x, y, Luma([if fg { 255 } else { 0 }]));
        }
    }
    out
}

/// Binarize with a global Otsu threshold (dark ink → 0, paper → 255).
pub fn otsu_binarize(image: &GrayImage) -> GrayImage {
    let level = otsu_level(image);
    threshold(image, level, ThresholdType::Binary)
}

// Summed-area table, one extra row/column of zeros at the top-left so
// window sums need no edge special-casing.
fn integral_image(image: &GrayImage) -> Vec<i64> {
    let (w, h) = image.dimensions();
    let stride = (w + 1) as usize;
    let mut integral = vec![0i64; stride * (h + 1) as usize];
    for y in 0..h {
        let mut row_sum = 0i64;
        for x in 0..w {
            row_sum += image.get_pixel(x, y)[0] as i64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            integral[idx] = integral[idx - stride] + row_sum;
        }
    }
    integral
}

fn window_sum(integral: &[i64], width: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> i64 {
    let stride = (width + 1) as usize;
    let a = integral[y0 as usize * stride + x0 as usize];
    let b = integral[y0 as usize * stride + (x1 + 1) as usize];
    let c = integral[(y1 + 1) as usize * stride + x0 as usize];
    let d = integral[(y1 + 1) as usize * stride + (x1 + 1) as usize];
    d - b - c + a
}
