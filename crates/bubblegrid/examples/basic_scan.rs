use bubblegrid::{AnswerKey, SheetConfig, SheetScanner};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        eprintln!("Usage: {} <image> <items> <choices> <key> [out.json]", args[0]);
        std::process::exit(2);
    }

    let items: usize = args[2].parse()?;
    let choices: usize = args[3].parse()?;
    let key = AnswerKey::parse(&args[4])?;

    let scanner = SheetScanner::new(SheetConfig::new(items, choices)?);
    let report = scanner.scan_file(Path::new(&args[1]), &key)?;

    println!(
        "{}: {}/{} ({}%), name={:?}, section={:?}{}",
        args[1],
        report.result.score,
        report.result.total,
        report.result.percentage(),
        report.fields.name,
        report.fields.section,
        if report.rectified { "" } else { " [degraded]" }
    );

    if let Some(out_path) = args.get(5) {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
