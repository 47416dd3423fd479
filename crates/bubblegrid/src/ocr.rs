//! Text recognition seam for identity fields.
//!
//! The engine is an external capability: anything that can turn a binarized
//! field crop into text satisfies [`OcrEngine`]. The bundled implementation
//! shells out to a `tesseract` executable with a bounded per-call deadline so
//! a wedged recognition never stalls a batch.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use image::GrayImage;

/// Poll interval while waiting for the subprocess.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Text recognition over a grayscale crop.
///
/// Implementations must be shareable across the batch workers.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError>;
}

#[derive(Debug)]
pub enum OcrError {
    /// Engine could not be started (missing executable, IO failure).
    Spawn(std::io::Error),
    /// Temp-file or output IO failed.
    Io(std::io::Error),
    /// Engine ran but reported failure.
    Engine { detail: String },
    /// Engine exceeded its deadline and was killed.
    Timeout { deadline: Duration },
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to start OCR engine: {}", e),
            Self::Io(e) => write!(f, "OCR IO failure: {}", e),
            Self::Engine { detail } => write!(f, "OCR engine failed: {}", detail),
            Self::Timeout { deadline } => {
                write!(f, "OCR exceeded {:.1}s deadline", deadline.as_secs_f32())
            }
        }
    }
}

impl std::error::Error for OcrError {}

/// Tesseract CLI engine.
///
/// Writes the crop to a temp PNG, runs
/// `tesseract <input> <base> -l <lang> --psm <psm> txt`, and reads
/// `<base>.txt`. Single-line page segmentation suits the one-line identity
/// boxes.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    executable: PathBuf,
    language: String,
    page_seg_mode: u8,
    deadline: Duration,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_seg_mode: 7,
            deadline: Duration::from_secs(10),
        }
    }
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific tesseract executable instead of `$PATH` lookup.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = path.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Bound one recognition call; on expiry the subprocess is killed and
    /// the call fails with [`OcrError::Timeout`].
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        let input = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(OcrError::Io)?;
        image
            .save(input.path())
            .map_err(|e| OcrError::Engine {
                detail: format!("failed to write input image: {}", e),
            })?;

        let output_base = input.path().with_extension("out");
        let mut child = Command::new(&self.executable)
            .arg(input.path())
            .arg(&output_base)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_seg_mode.to_string())
            .arg("txt")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(OcrError::Spawn)?;

        let started = Instant::now();
        let status = loop {
            match child.try_wait().map_err(OcrError::Io)? {
                Some(status) => break status,
                None => {
                    if started.elapsed() >= self.deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(OcrError::Timeout {
                            deadline: self.deadline,
                        });
                    }
                    std::thread::sleep(WAIT_POLL);
                }
            }
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(OcrError::Engine {
                detail: format!("exit status {}: {}", status, stderr.trim()),
            });
        }

        // Tesseract appends ".txt" to the output base it is given.
        let text_path = PathBuf::from(format!("{}.txt", output_base.display()));
        let text = std::fs::read_to_string(&text_path).map_err(OcrError::Io)?;
        let _ = std::fs::remove_file(&text_path);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_reports_spawn_error() {
        let engine = TesseractOcr::new()
            .with_executable("/nonexistent/tesseract-binary")
            .with_deadline(Duration::from_secs(1));
        let img = GrayImage::new(32, 32);
        assert!(matches!(engine.recognize(&img), Err(OcrError::Spawn(_))));
    }

    #[cfg(unix)]
    #[test]
    fn deadline_kills_a_wedged_engine() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        // A script that ignores its arguments and hangs stands in for a
        // wedged recognizer.
        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("hung-ocr.sh");
        {
            let mut f = std::fs::File::create(&script).expect("script file");
            f.write_all(b"#!/bin/sh\nsleep 30\n").expect("script body");
        }
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("chmod");

        let engine = TesseractOcr::new()
            .with_executable(&script)
            .with_deadline(Duration::from_millis(200));
        let img = GrayImage::new(32, 32);
        let started = Instant::now();
        let result = engine.recognize(&img);
        assert!(matches!(result, Err(OcrError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn display_messages_name_the_failure() {
        let timeout = OcrError::Timeout {
            deadline: Duration::from_secs(10),
        };
        assert!(timeout.to_string().contains("deadline"));
        let engine = OcrError::Engine {
            detail: "exit status 1".into(),
        };
        assert!(engine.to_string().contains("exit status 1"));
    }
}
