use anyhow::Result;
use rxscan::analyzer;
use rxscan::config::AppConfig;
use rxscan::errors::AppError;
use rxscan::history;
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::prelude::*;

/// Initialize structured logging on stderr
///
/// Stdout is reserved for the report JSON, so all log output goes to stderr.
/// `LOG_FORMAT=json` selects JSON formatting; anything else gets the compact
/// human-readable format. The filter honors `RUST_LOG`.
fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("rxscan=info".parse()?);

    if env::var("LOG_FORMAT").unwrap_or_default() == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .init();
    }

    Ok(())
}

/// Print a structured JSON error object to stdout
///
/// Used for the invocation-gate failures (usage and missing-file errors) that
/// exit non-zero without running the pipeline.
fn emit_error_object(error: &AppError) {
    let object = serde_json::json!({
        "error": error.to_string(),
        "processing_status": "error",
    });
    match serde_json::to_string_pretty(&object) {
        Ok(json) => println!("{}", json),
        Err(_) => println!("{{\"processing_status\": \"error\"}}"),
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        emit_error_object(&AppError::Usage(
            "expected exactly one argument: rxscan <image_path>".to_string(),
        ));
        return ExitCode::FAILURE;
    }

    let image_path = &args[1];
    if !Path::new(image_path).exists() {
        emit_error_object(&AppError::FileNotFound(format!(
            "Image file not found: {}",
            image_path
        )));
        return ExitCode::FAILURE;
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            emit_error_object(&e);
            return ExitCode::FAILURE;
        }
    };

    // Analysis-level failures are reported inside the JSON with a zero exit
    // code; only the gate above exits non-zero.
    let report = analyzer::analyze_prescription(image_path, &config);

    if let Err(e) = history::append_report(&config.output_dir, &report, config.history_limit) {
        warn!("Failed to persist report to history: {}", e);
    }

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            emit_error_object(&AppError::Internal(format!(
                "Failed to serialize report: {}",
                e
            )));
        }
    }

    ExitCode::SUCCESS
}
