use std::path::{Path, PathBuf};
use std::process::ExitCode;

use worksheet_prep::config::{self, merged::PreprocessOverrides};
use worksheet_prep::ocr::TesseractEngine;
use worksheet_prep::pipeline::preprocessor::preprocess;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: worksheet_prep <image>...");
        eprintln!("  Preprocess worksheet photos for Vision and OCR consumption.");
        eprintln!("  Writes <image>.display.<ext> and <image>.ocr.png next to each input.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("worksheet_prep {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    // Settings are discovered next to the first input file.
    let settings_dir = Path::new(&args[0])
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let settings = match config::load_settings(&settings_dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    let engine = TesseractEngine::new();
    let overrides = PreprocessOverrides::default();

    let mut has_error = false;
    for input_arg in &args {
        let input_path = Path::new(input_arg);
        let bytes = match std::fs::read(input_path) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("ERROR: Failed to read {input_arg}: {e}");
                has_error = true;
                continue;
            }
        };
        let mime = match mime_from_path(input_path) {
            Some(m) => m,
            None => {
                eprintln!("ERROR: {input_arg}: cannot determine MIME type from extension");
                has_error = true;
                continue;
            }
        };

        match preprocess(&engine, &settings, &bytes, mime, &overrides) {
            Ok(outcome) => {
                let display_path = output_path(input_path, "display", outcome.display_image.mime);
                if let Err(e) = std::fs::write(&display_path, &outcome.display_image.bytes) {
                    eprintln!("ERROR: Failed to write {}: {e}", display_path.display());
                    has_error = true;
                    continue;
                }
                let mut written = format!("{}", display_path.display());
                if let Some(ocr_image) = &outcome.ocr_input_image {
                    let ocr_path = output_path(input_path, "ocr", ocr_image.mime);
                    if let Err(e) = std::fs::write(&ocr_path, &ocr_image.bytes) {
                        eprintln!("ERROR: Failed to write {}: {e}", ocr_path.display());
                        has_error = true;
                        continue;
                    }
                    written.push_str(&format!(", {}", ocr_path.display()));
                }
                eprintln!(
                    "OK: {input_arg} -> {written} (OCR source: {})",
                    outcome.ocr_source_description
                );
            }
            Err(failure) => {
                eprintln!("ERROR: {input_arg}: {}", failure.error);
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Guess the input MIME type from the file extension.
fn mime_from_path(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// `photo.jpg` -> `photo.display.jpg` / `photo.ocr.png` beside the input.
fn output_path(input: &Path, kind: &str, mime: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = match mime {
        "image/png" => "png",
        _ => "jpg",
    };
    let file_name = format!("{stem}.{kind}.{ext}");
    input.with_file_name(file_name)
}
