//! # Prescription Analysis Pipeline
//!
//! This module orchestrates the full analysis of one prescription image:
//! normalization, text extraction, classification and report assembly.
//!
//! Control flow is strictly linear and synchronous, with no retries or
//! internal parallelism. The pipeline always produces a report: every failure
//! below the invocation gate (decode failure, empty extraction, any internal
//! fault) is converted into an error report instead of crashing the process.

use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::classifier::MedicalClassifier;
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::ocr;
use crate::preprocessing;
use crate::report::AnalysisReport;

/// Analyze a prescription image end to end
///
/// Runs the linear pipeline Normalizer → Extractor → Classifier → Report
/// Assembler and always returns a report. Failure modes:
///
/// - the file cannot be validated or decoded as an image: decode-error report
///   with no partial fields
/// - OCR produces no text: error report with confidence 0.0 and a message
///   distinguishing it from decode failure (classification never runs)
/// - any other internal fault: generic error report carrying the fault message
///
/// # Arguments
///
/// * `image_path` - Path to the prescription image
/// * `config` - Application configuration
pub fn analyze_prescription(image_path: &str, config: &AppConfig) -> AnalysisReport {
    let start_time = Instant::now();
    let file_name = base_name(image_path);

    info!("Starting prescription analysis for {}", image_path);

    let report = match run_pipeline(image_path, &file_name, config, start_time) {
        Ok(report) => report,
        Err(AppError::Decode(msg)) => {
            warn!("Image decoding failed for {}: {}", image_path, msg);
            AnalysisReport::decode_error(&file_name, msg)
        }
        Err(AppError::EmptyExtraction(msg)) => {
            warn!("OCR produced no text for {}: {}", image_path, msg);
            AnalysisReport::empty_extraction(&file_name)
        }
        Err(other) => {
            warn!("Prescription analysis failed for {}: {}", image_path, other);
            AnalysisReport::internal_error(&file_name, other.to_string())
        }
    };

    info!(
        file = %file_name,
        status = ?report.processing_status,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Prescription analysis finished"
    );

    report
}

/// The fallible pipeline body; callers convert errors into error reports
fn run_pipeline(
    image_path: &str,
    file_name: &str,
    config: &AppConfig,
    start_time: Instant,
) -> AppResult<AnalysisReport> {
    ocr::validate_image_file(image_path, &config.ocr)
        .map_err(|e| AppError::Decode(e.to_string()))?;

    let raster = preprocessing::normalize_for_ocr(image_path)?;

    let extracted_text = ocr::extract_text_lossy(&raster, &config.ocr);
    if extracted_text.is_empty() {
        return Err(AppError::EmptyExtraction(format!(
            "no text extracted from {}",
            image_path
        )));
    }

    let classifier = MedicalClassifier::new().map_err(|e| {
        AppError::Internal(format!("Failed to compile classification patterns: {}", e))
    })?;
    let classification = classifier.classify(&extracted_text);

    Ok(AnalysisReport::success(
        file_name,
        extracted_text,
        classification,
        start_time.elapsed(),
    ))
}

/// File name component of a path, falling back to "unknown"
fn base_name(image_path: &str) -> String {
    Path::new(image_path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ProcessingStatus;
    use std::io::Write;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/uploads/scan.jpg"), "scan.jpg");
        assert_eq!(base_name("scan.jpg"), "scan.jpg");
        assert_eq!(base_name("/uploads/.."), "unknown");
    }

    #[test]
    fn test_missing_file_yields_decode_error_report() {
        let config = AppConfig::default();
        let report = analyze_prescription("/nonexistent/scan.png", &config);

        assert_eq!(report.processing_status, ProcessingStatus::Error);
        assert!(report.error.is_some());
        assert!(report.confidence.is_none());
        assert!(report.extracted_text.is_none());
    }

    #[test]
    fn test_corrupt_image_yields_decode_error_report() {
        let config = AppConfig::default();
        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        file.write_all(b"definitely not a png").expect("write data");
        let path = file.path().to_string_lossy().to_string();

        let report = analyze_prescription(&path, &config);

        assert_eq!(report.processing_status, ProcessingStatus::Error);
        assert!(report.error.is_some());
        assert!(report.medications.is_none());
        assert!(report.processing_info.is_none());
    }
}
