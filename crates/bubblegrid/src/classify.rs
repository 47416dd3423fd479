//! Bubble fill classification.
//!
//! Samples the adaptive-thresholded image inside a circular mask at each
//! bubble position from the layout model, rescaled from canonical points to
//! the actual image size. Within a row the strictly highest mean foreground
//! intensity wins; equal means keep the earlier (lower-letter) choice. There
//! is no dedicated "no mark" or "over-marked" outcome — the row's darkest
//! bubble is reported, matching the page generator's companion recognizer.

use image::GrayImage;

use crate::layout::{SheetLayout, CANONICAL_HEIGHT, CANONICAL_WIDTH, CHOICE_LABELS};
use crate::preprocess;

/// Per-item detected choice labels, in item order.
pub type DetectedAnswers = Vec<Option<char>>;

/// Smallest image the classifier will sample. Below this the rescaled
/// bubble radius collapses under a pixel and mask means are meaningless.
pub const MIN_IMAGE_DIM: u32 = 64;

/// The classifier was invoked on an image it cannot sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    ImageTooSmall { width: u32, height: u32 },
}

impl std::fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImageTooSmall { width, height } => write!(
                f,
                "image {}x{} is below the {}px minimum for bubble sampling",
                width, height, MIN_IMAGE_DIM
            ),
        }
    }
}

impl std::error::Error for RecognitionError {}

/// Classify every answer row of a normalized page image.
///
/// The image does not need to be exactly canonical-sized; bubble coordinates
/// are rescaled linearly per axis from the 595×842 frame.
pub fn classify(image: &GrayImage, layout: &SheetLayout) -> Result<DetectedAnswers, RecognitionError> {
    let (w, h) = image.dimensions();
    if w < MIN_IMAGE_DIM || h < MIN_IMAGE_DIM {
        return Err(RecognitionError::ImageTooSmall {
            width: w,
            height: h,
        });
    }

    let thresh = preprocess::adaptive_mean_threshold_inv(
        image,
        preprocess::ADAPTIVE_BLOCK_SIZE,
        preprocess::ADAPTIVE_OFFSET,
    );

    let scale_x = w as f32 / CANONICAL_WIDTH as f32;
    let scale_y = h as f32 / CANONICAL_HEIGHT as f32;
    let scale_r = (scale_x + scale_y) / 2.0;

    let mut answers = Vec::with_capacity(layout.bubble_positions().len());
    for (item, row) in layout.bubble_positions().iter().enumerate() {
        let mut best_mean = f64::NEG_INFINITY;
        let mut best_choice: Option<usize> = None;

        for (choice, bubble) in row.iter().enumerate() {
            let cx = bubble.x * scale_x;
            let cy = bubble.y * scale_y;
            let r = (bubble.r * scale_r).max(1.0);
            let mean = circular_mask_mean(&thresh, cx, cy, r);
            if mean > best_mean {
                best_mean = mean;
                best_choice = Some(choice);
            }
        }

        let label = best_choice.map(|c| CHOICE_LABELS[c]);
        tracing::debug!(
            "item {}: marked {:?} (mean fill {:.1})",
            item + 1,
            label,
            best_mean
        );
        answers.push(label);
    }
    Ok(answers)
}

/// Mean intensity inside the circle of radius `r` centered at `(cx, cy)`.
///
/// Pixels outside the image are excluded from the mask rather than counted
/// as background.
fn circular_mask_mean(image: &GrayImage, cx: f32, cy: f32, r: f32) -> f64 {
    let (w, h) = image.dimensions();
    let x0 = ((cx - r).floor().max(0.0)) as u32;
    let y0 = ((cy - r).floor().max(0.0)) as u32;
    let x1 = ((cx + r).ceil() as i64).min(w as i64 - 1).max(0) as u32;
    let y1 = ((cy + r).ceil() as i64).min(h as i64 - 1).max(0) as u32;

    let r2 = (r * r) as f64;
    let mut sum = 0.0f64;
    let mut count = 0u32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - cx as f64;
            let dy = y as f64 + 0.5 - cy as f64;
            if dx * dx + dy * dy <= r2 {
                sum += image.get_pixel(x, y)[0] as f64;
                count += 1;
            }
        }
    }
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}
