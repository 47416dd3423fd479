//! bubblegrid — bubble-sheet (OMR) recognition and scoring.
//!
//! Recognizes filled answer bubbles and handwritten identity fields on
//! photographed or scanned copies of a generated exam page, then scores them
//! against an answer key. The pipeline stages are:
//!
//! 1. **Layout** – canonical bubble and field geometry, shared bit-for-bit
//!    with the page generator.
//! 2. **Normalize** – page-boundary detection (Canny + contour polygon
//!    approximation) and perspective warp into the canonical 595×842 frame,
//!    failing open to pass-through for already-cropped scans.
//! 3. **Classify** – adaptive-threshold circular sampling at every bubble
//!    position, per-row argmax fill selection.
//! 4. **Fields** – identity-box crops binarized and handed to a pluggable
//!    OCR engine, degrading per field to `[unreadable]`.
//! 5. **Score** – answer-key comparison with a per-item breakdown.
//!
//! # Public API
//! [`SheetScanner`] is the primary entry point; [`SheetConfig`] /
//! [`AnswerKey`] are the per-sheet inputs, [`PageReport`] the per-page
//! output. The per-stage functions ([`normalize`], [`classify`],
//! [`extract_fields`], [`score`]) are exposed for callers composing their
//! own pipeline. Low-level math internals are not part of the public
//! surface.

mod api;
mod classify;
mod fields;
mod homography;
mod layout;
mod normalize;
mod ocr;
mod pipeline;
mod preprocess;
mod score;
#[cfg(test)]
mod test_utils;

pub use api::SheetScanner;
pub use classify::{classify, DetectedAnswers, RecognitionError, MIN_IMAGE_DIM};
pub use fields::{extract_fields, IdentityFields, UNREADABLE};
pub use layout::{
    Bubble, FieldRegions, LayoutError, Region, SheetConfig, SheetLayout, CANONICAL_HEIGHT,
    CANONICAL_WIDTH, CHOICE_LABELS, ITEMS_PER_COLUMN, MAX_ITEMS,
};
pub use normalize::{normalize, Normalization};
pub use ocr::{OcrEngine, OcrError, TesseractOcr};
pub use pipeline::{load_gray, scan_batch, scan_file, scan_gray, PageReport, PageScan, PipelineError};
pub use score::{score, AnswerKey, ItemOutcome, ScoreError, ScoreResult};
