//! Per-page scan orchestration and parallel batch processing.
//!
//! One page is one synchronous invocation: normalize → (classify, extract
//! fields) → score. Pages in a batch are independent and run in parallel;
//! a failed page is reported against its source path and never aborts its
//! siblings.

use std::path::{Path, PathBuf};

use image::GrayImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classify::{self, DetectedAnswers, RecognitionError};
use crate::fields::{self, IdentityFields};
use crate::layout::SheetLayout;
use crate::normalize;
use crate::ocr::OcrEngine;
use crate::score::{self, AnswerKey, ScoreError, ScoreResult};

/// Everything recognized and scored from one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// Source file, when the page came from disk.
    pub source: Option<String>,
    /// Input image dimensions before normalization.
    pub image_size: [u32; 2],
    /// False when the normalizer fell back to pass-through (degraded scan).
    pub rectified: bool,
    pub answers: DetectedAnswers,
    pub fields: IdentityFields,
    pub result: ScoreResult,
}

/// Per-page failure. Batch processing reports these per source, it never
/// folds a batch into a single pass/fail.
#[derive(Debug)]
pub enum PipelineError {
    /// Input is neither a supported raster image nor a pre-rasterized page.
    UnsupportedFormat { path: String, reason: String },
    Recognition(RecognitionError),
    Score(ScoreError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat { path, reason } => {
                write!(f, "unsupported input '{}': {}", path, reason)
            }
            Self::Recognition(e) => write!(f, "recognition failed: {}", e),
            Self::Score(e) => write!(f, "scoring failed: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnsupportedFormat { .. } => None,
            Self::Recognition(e) => Some(e),
            Self::Score(e) => Some(e),
        }
    }
}

impl From<RecognitionError> for PipelineError {
    fn from(e: RecognitionError) -> Self {
        Self::Recognition(e)
    }
}

impl From<ScoreError> for PipelineError {
    fn from(e: ScoreError) -> Self {
        Self::Score(e)
    }
}

/// One batch entry: the source it came from and how it went.
#[derive(Debug)]
pub struct PageScan {
    pub source: PathBuf,
    pub outcome: Result<PageReport, PipelineError>,
}

/// Scan one already-decoded grayscale page.
pub fn scan_gray(
    image: &GrayImage,
    layout: &SheetLayout,
    key: &AnswerKey,
    engine: &dyn OcrEngine,
) -> Result<PageReport, PipelineError> {
    let image_size = [image.width(), image.height()];
    let normalized = normalize::normalize(image);
    let rectified = normalized.is_rectified();

    let answers = classify::classify(normalized.image(), layout)?;
    let identity = fields::extract_fields(normalized.image(), layout, engine);
    let result = score::score(&answers, key)?;

    tracing::info!(
        "Page scored {}/{}{}",
        result.score,
        result.total,
        if rectified { "" } else { " (degraded: pass-through)" }
    );

    Ok(PageReport {
        source: None,
        image_size,
        rectified,
        answers,
        fields: identity,
        result,
    })
}

/// Decode a raster file into grayscale, rejecting formats this engine does
/// not own (PDF pages must be rasterized by the caller first).
pub fn load_gray(path: &Path) -> Result<GrayImage, PipelineError> {
    let display = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if extension.as_deref() == Some("pdf") {
        return Err(PipelineError::UnsupportedFormat {
            path: display,
            reason: "PDF input must be rasterized (first page) before scanning".to_string(),
        });
    }

    let image = image::open(path).map_err(|e| PipelineError::UnsupportedFormat {
        path: display,
        reason: e.to_string(),
    })?;
    Ok(image.to_luma8())
}

/// Scan one page from disk.
pub fn scan_file(
    path: &Path,
    layout: &SheetLayout,
    key: &AnswerKey,
    engine: &dyn OcrEngine,
) -> Result<PageReport, PipelineError> {
    let gray = load_gray(path)?;
    let mut report = scan_gray(&gray, layout, key, engine)?;
    report.source = Some(path.display().to_string());
    Ok(report)
}

/// Scan many pages in parallel, one worker per page.
///
/// Output order matches input order; each entry carries its own outcome so
/// callers can attribute failures to files.
pub fn scan_batch(
    paths: &[PathBuf],
    layout: &SheetLayout,
    key: &AnswerKey,
    engine: &dyn OcrEngine,
) -> Vec<PageScan> {
    tracing::info!("Scanning batch of {} page(s)", paths.len());
    paths
        .par_iter()
        .map(|path| {
            let outcome = scan_file(path, layout, key, engine);
            if let Err(e) = &outcome {
                tracing::warn!("page '{}' failed: {}", path.display(), e);
            }
            PageScan {
                source: path.clone(),
                outcome,
            }
        })
        .collect()
}
