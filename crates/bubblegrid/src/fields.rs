//! Identity-field extraction: crop each handwritten box from the normalized
//! page, binarize, and hand it to the OCR engine.
//!
//! Extraction is best-effort per field. An unreadable region — out-of-bounds
//! crop, engine failure, timeout, empty text — becomes the `[unreadable]`
//! sentinel and never aborts the remaining fields.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::layout::{Region, SheetLayout, CANONICAL_HEIGHT, CANONICAL_WIDTH};
use crate::ocr::OcrEngine;
use crate::preprocess;

/// Sentinel value for a field that could not be read.
pub const UNREADABLE: &str = "[unreadable]";

/// Margin added around each field box before cropping, in canonical points.
const CROP_MARGIN: f32 = 8.0;

/// Free-text identity values read off the page header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityFields {
    pub name: String,
    pub section: String,
}

impl IdentityFields {
    /// Both fields unreadable; the degenerate result when OCR is unavailable.
    pub fn unreadable() -> Self {
        Self {
            name: UNREADABLE.to_string(),
            section: UNREADABLE.to_string(),
        }
    }
}

/// Extract name and section from a normalized page image.
pub fn extract_fields(
    image: &GrayImage,
    layout: &SheetLayout,
    engine: &dyn OcrEngine,
) -> IdentityFields {
    let regions = layout.text_field_regions();
    let mut values = [UNREADABLE.to_string(), UNREADABLE.to_string()];

    for (slot, (field, region)) in regions.named().into_iter().enumerate() {
        values[slot] = match extract_one(image, &region, engine) {
            Ok(text) => text,
            Err(reason) => {
                tracing::warn!("field '{}' unreadable: {}", field, reason);
                UNREADABLE.to_string()
            }
        };
    }

    let [name, section] = values;
    IdentityFields { name, section }
}

fn extract_one(
    image: &GrayImage,
    region: &Region,
    engine: &dyn OcrEngine,
) -> Result<String, String> {
    let crop = crop_region(image, region).ok_or("region lies outside the image")?;
    let binary = preprocess::otsu_binarize(&crop);
    let text = engine.recognize(&binary).map_err(|e| e.to_string())?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("engine returned no text".to_string());
    }
    Ok(trimmed.to_string())
}

/// Expand by the crop margin, rescale from canonical points to image pixels,
/// clamp to bounds, and crop. `None` when nothing of the region remains.
fn crop_region(image: &GrayImage, region: &Region) -> Option<GrayImage> {
    let (w, h) = image.dimensions();
    let scale_x = w as f32 / CANONICAL_WIDTH as f32;
    let scale_y = h as f32 / CANONICAL_HEIGHT as f32;

    let expanded = region.expand(CROP_MARGIN);
    let x0 = (expanded.x * scale_x).round().max(0.0) as u32;
    let y0 = (expanded.y * scale_y).round().max(0.0) as u32;
    if x0 >= w || y0 >= h {
        return None;
    }
    let cw = ((expanded.w * scale_x).round() as u32).clamp(1, w - x0);
    let ch = ((expanded.h * scale_y).round() as u32).clamp(1, h - y0);

    Some(image::imageops::crop_imm(image, x0, y0, cw, ch).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SheetConfig;
    use crate::ocr::OcrError;
    use image::Luma;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedEngine {
        responses: Vec<Result<String, ()>>,
        calls: AtomicUsize,
    }

    impl ScriptedEngine {
        fn new(responses: Vec<Result<String, ()>>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl OcrEngine for ScriptedEngine {
        fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.responses[i % self.responses.len()] {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(OcrError::Engine {
                    detail: "scripted failure".into(),
                }),
            }
        }
    }

    fn canonical_page() -> GrayImage {
        GrayImage::from_pixel(CANONICAL_WIDTH, CANONICAL_HEIGHT, Luma([240]))
    }

    fn layout() -> SheetLayout {
        SheetLayout::new(SheetConfig::new(10, 4).expect("valid"))
    }

    #[test]
    fn both_fields_extracted_in_order() {
        let engine = ScriptedEngine::new(vec![
            Ok("Jane Student\n".to_string()),
            Ok(" BSCS-2A ".to_string()),
        ]);
        let fields = extract_fields(&canonical_page(), &layout(), &engine);
        assert_eq!(fields.name, "Jane Student");
        assert_eq!(fields.section, "BSCS-2A");
    }

    #[test]
    fn one_failing_field_does_not_abort_the_other() {
        let engine = ScriptedEngine::new(vec![Err(()), Ok("BSIT-3B".to_string())]);
        let fields = extract_fields(&canonical_page(), &layout(), &engine);
        assert_eq!(fields.name, UNREADABLE);
        assert_eq!(fields.section, "BSIT-3B");
    }

    #[test]
    fn whitespace_only_text_is_unreadable() {
        let engine = ScriptedEngine::new(vec![Ok("   \n".to_string())]);
        let fields = extract_fields(&canonical_page(), &layout(), &engine);
        assert_eq!(fields.name, UNREADABLE);
        assert_eq!(fields.section, UNREADABLE);
    }

    #[test]
    fn out_of_bounds_region_is_unreadable_without_engine_call() {
        let engine = ScriptedEngine::new(vec![Ok("never used".to_string())]);
        let region = Region {
            x: CANONICAL_WIDTH as f32 + 50.0,
            y: 10.0,
            w: 100.0,
            h: 24.0,
        };
        let result = extract_one(&canonical_page(), &region, &engine);
        assert!(result.is_err());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn crop_covers_the_expanded_region() {
        let img = canonical_page();
        let region = Region {
            x: 48.0,
            y: 88.0,
            w: 200.0,
            h: 24.0,
        };
        let crop = crop_region(&img, &region).expect("in bounds");
        assert_eq!(crop.dimensions(), (216, 40));
    }
}
