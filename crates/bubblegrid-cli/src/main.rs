//! bubblegrid CLI — scan and score bubble-sheet images from the command line.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bubblegrid::{
    AnswerKey, OcrEngine, OcrError, PageScan, SheetConfig, SheetLayout, SheetScanner,
    TesseractOcr,
};
use image::GrayImage;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "bubblegrid")]
#[command(about = "Recognize and score bubble-sheet exam scans against an answer key")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one or more page images and score them.
    Scan(ScanArgs),

    /// Print the canonical layout geometry for a sheet configuration.
    LayoutInfo(SheetArgs),

    /// Score a detected answer string offline (no image).
    ScoreTest {
        /// Answer key in compact form (e.g. ABCD-A, '-' = unkeyed).
        #[arg(long)]
        key: String,

        /// Detected answers in the same compact form.
        #[arg(long)]
        detected: String,
    },
}

#[derive(Debug, Clone, Args)]
struct SheetArgs {
    /// Number of items on the sheet (1..=50).
    #[arg(long)]
    items: usize,

    /// Choices per item (2..=6, labeled A..).
    #[arg(long, default_value = "4")]
    choices: usize,
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Page images to scan (raster; rasterize PDFs first).
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    sheet: SheetArgs,

    /// Answer key in compact form (length must equal --items).
    #[arg(long)]
    key: String,

    /// Path to write the JSON report (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Tesseract executable for identity-field OCR.
    #[arg(long, default_value = "tesseract")]
    tesseract: PathBuf,

    /// OCR language.
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Per-field OCR deadline in seconds.
    #[arg(long, default_value = "10")]
    ocr_deadline_secs: u64,

    /// Skip identity-field OCR entirely (fields become "[unreadable]").
    #[arg(long)]
    no_ocr: bool,
}

/// Engine stub for `--no-ocr`: every field degrades to the sentinel.
struct DisabledOcr;

impl OcrEngine for DisabledOcr {
    fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
        Err(OcrError::Engine {
            detail: "OCR disabled (--no-ocr)".to_string(),
        })
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Scan(args) => run_scan(args),
        Commands::LayoutInfo(args) => run_layout_info(args),
        Commands::ScoreTest { key, detected } => run_score_test(&key, &detected),
    }
}

fn run_scan(args: ScanArgs) -> CliResult<()> {
    let config = SheetConfig::new(args.sheet.items, args.sheet.choices)?;
    let key = AnswerKey::parse(&args.key)?;
    if key.len() != args.sheet.items {
        return Err(format!(
            "--key has {} entries but --items is {}",
            key.len(),
            args.sheet.items
        )
        .into());
    }

    let engine: Arc<dyn OcrEngine> = if args.no_ocr {
        Arc::new(DisabledOcr)
    } else {
        Arc::new(
            TesseractOcr::new()
                .with_executable(&args.tesseract)
                .with_language(&args.lang)
                .with_deadline(Duration::from_secs(args.ocr_deadline_secs)),
        )
    };

    let scanner = SheetScanner::with_engine(config, engine);
    let scans = scanner.scan_batch(&args.images, &key);

    let failed = scans.iter().filter(|s| s.outcome.is_err()).count();
    let report = serde_json::Value::Array(scans.iter().map(page_json).collect());
    write_json(&report, args.out.as_deref())?;

    if failed > 0 {
        tracing::warn!("{}/{} page(s) failed", failed, scans.len());
    }
    Ok(())
}

fn page_json(scan: &PageScan) -> serde_json::Value {
    match &scan.outcome {
        Ok(report) => serde_json::json!({
            "source": scan.source.display().to_string(),
            "report": report,
            "percentage": report.result.percentage(),
        }),
        Err(e) => serde_json::json!({
            "source": scan.source.display().to_string(),
            "error": e.to_string(),
        }),
    }
}

fn run_layout_info(args: SheetArgs) -> CliResult<()> {
    let config = SheetConfig::new(args.items, args.choices)?;
    let layout = SheetLayout::new(config);
    let value = serde_json::json!({
        "config": config,
        "bubbles": layout.bubble_positions(),
        "fields": layout.text_field_regions(),
    });
    write_json(&value, None)
}

fn run_score_test(key: &str, detected: &str) -> CliResult<()> {
    let key = AnswerKey::parse(key)?;
    let detected = AnswerKey::parse(detected)?;
    let result = bubblegrid::score(detected.entries(), &key)?;
    let percentage = result.percentage();
    let value = serde_json::json!({
        "result": result,
        "percentage": percentage,
    });
    write_json(&value, None)
}

fn write_json(value: &serde_json::Value, out: Option<&std::path::Path>) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => std::fs::write(path, text)?,
        None => println!("{}", text),
    }
    Ok(())
}
