//! High-level scanning API.
//!
//! [`SheetScanner`] is the primary entry point: it pairs a sheet layout with
//! an OCR engine. Create once, scan many pages against per-call answer keys.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use crate::layout::{SheetConfig, SheetLayout};
use crate::ocr::{OcrEngine, TesseractOcr};
use crate::pipeline::{self, PageReport, PageScan, PipelineError};
use crate::score::AnswerKey;

/// Primary scanning interface.
///
/// # Examples
///
/// ```no_run
/// use bubblegrid::{AnswerKey, SheetConfig, SheetScanner};
/// use std::path::Path;
///
/// let config = SheetConfig::new(20, 4).unwrap();
/// let scanner = SheetScanner::new(config);
/// let key = AnswerKey::parse("ABCDABCDABCDABCDABCD").unwrap();
/// let report = scanner.scan_file(Path::new("scan-001.jpg"), &key).unwrap();
/// println!("{}/{}", report.result.score, report.result.total);
/// ```
pub struct SheetScanner {
    layout: SheetLayout,
    engine: Arc<dyn OcrEngine>,
}

impl SheetScanner {
    /// Scanner with the default Tesseract OCR engine.
    pub fn new(config: SheetConfig) -> Self {
        Self::with_engine(config, Arc::new(TesseractOcr::new()))
    }

    /// Scanner with a custom OCR engine.
    pub fn with_engine(config: SheetConfig, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            layout: SheetLayout::new(config),
            engine,
        }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Scan one decoded image.
    pub fn scan_image(
        &self,
        image: &DynamicImage,
        key: &AnswerKey,
    ) -> Result<PageReport, PipelineError> {
        pipeline::scan_gray(&image.to_luma8(), &self.layout, key, self.engine.as_ref())
    }

    /// Scan one page from disk.
    pub fn scan_file(&self, path: &Path, key: &AnswerKey) -> Result<PageReport, PipelineError> {
        pipeline::scan_file(path, &self.layout, key, self.engine.as_ref())
    }

    /// Scan many pages in parallel; per-page outcomes in input order.
    pub fn scan_batch(&self, paths: &[PathBuf], key: &AnswerKey) -> Vec<PageScan> {
        pipeline::scan_batch(paths, &self.layout, key, self.engine.as_ref())
    }
}
