//! # OCR Processing Module
//!
//! This module provides optical character recognition (OCR) functionality for
//! extracting text from normalized prescription rasters using the Tesseract
//! OCR engine.
//!
//! ## Features
//!
//! - Text extraction constrained to a prescription-relevant character whitelist
//! - Single-block page segmentation (prescriptions are short unstructured notes)
//! - Image file validation with magic-byte format detection
//! - Graceful degradation: engine failures map to an empty extraction rather
//!   than aborting the pipeline
//!
//! ## Dependencies
//!
//! - `leptess`: Rust bindings for Tesseract OCR and Leptonica
//! - `image`: Image format detection and in-memory PNG encoding
//! - `anyhow`: Error handling at the validation boundary

use anyhow::Result;
use image::GrayImage;
use leptess::LepTess;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing::{debug, info, warn};

use crate::config::OcrConfig;

/// Name of the OCR engine reported in processing metadata
pub const OCR_ENGINE_NAME: &str = "Tesseract OCR";

/// Custom error types for OCR operations
#[derive(Debug, Clone)]
pub enum OcrError {
    /// OCR engine initialization errors
    Initialization(String),
    /// Raster encoding errors (feeding the engine)
    Encode(String),
    /// Image loading errors
    ImageLoad(String),
    /// Text extraction errors
    Extraction(String),
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::Initialization(msg) => {
                write!(f, "[OCR_INIT] OCR engine initialization failed: {}", msg)
            }
            OcrError::Encode(msg) => {
                write!(f, "[OCR_ENCODE] Failed to encode raster for OCR: {}", msg)
            }
            OcrError::ImageLoad(msg) => {
                write!(f, "[IMAGE_LOAD] Failed to load image for OCR processing: {}", msg)
            }
            OcrError::Extraction(msg) => {
                write!(f, "[OCR_EXTRACT] Text extraction from image failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for OcrError {}

/// Validate an image file path and basic properties before decoding
///
/// Checks that the path exists, is a regular file, is non-empty, respects the
/// configured size limit, and carries the magic bytes of a supported image
/// format (PNG, JPEG, BMP or TIFF).
///
/// # Arguments
///
/// * `image_path` - Path to the image file to validate
/// * `config` - OCR configuration with size limits and buffer settings
pub fn validate_image_file(image_path: &str, config: &OcrConfig) -> Result<()> {
    let path = std::path::Path::new(image_path);

    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Image validation failed: file does not exist ({})",
            image_path
        ));
    }

    if !path.is_file() {
        return Err(anyhow::anyhow!(
            "Image validation failed: path is not a file ({})",
            image_path
        ));
    }

    let metadata = path.metadata().map_err(|e| {
        anyhow::anyhow!(
            "Image validation failed: cannot read file metadata ({}) - {}",
            image_path,
            e
        )
    })?;

    let file_size = metadata.len();
    if file_size == 0 {
        return Err(anyhow::anyhow!(
            "Image validation failed: file is empty ({})",
            image_path
        ));
    }
    if file_size > config.max_file_size {
        return Err(anyhow::anyhow!(
            "Image validation failed: file too large ({} bytes, maximum allowed: {} bytes)",
            file_size,
            config.max_file_size
        ));
    }

    // Format detection from magic bytes; only formats Tesseract handles well
    let file = File::open(image_path).map_err(|e| {
        anyhow::anyhow!(
            "Cannot open image file for validation: {} - {}",
            image_path,
            e
        )
    })?;
    let mut reader = BufReader::new(file);
    let mut buffer = vec![0; config.buffer_size];
    let bytes_read = reader.read(&mut buffer).map_err(|e| {
        anyhow::anyhow!(
            "Error reading image file for format detection: {} - {}",
            image_path,
            e
        )
    })?;

    if bytes_read < config.min_format_bytes {
        return Err(anyhow::anyhow!(
            "Image validation failed: could not read enough bytes for format detection from {} (read {}, need at least {})",
            image_path,
            bytes_read,
            config.min_format_bytes
        ));
    }
    buffer.truncate(bytes_read);

    match image::guess_format(&buffer) {
        Ok(format) => {
            let supported = matches!(
                format,
                image::ImageFormat::Png
                    | image::ImageFormat::Jpeg
                    | image::ImageFormat::Bmp
                    | image::ImageFormat::Tiff
            );
            if !supported {
                return Err(anyhow::anyhow!(
                    "Image validation failed: unsupported image format {:?} ({})",
                    format,
                    image_path
                ));
            }
            debug!("Detected supported image format: {format:?} for file: {image_path}");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!(
            "Image validation failed: could not determine image format for {} - {}",
            image_path,
            e
        )),
    }
}

/// Extract text from a normalized raster using Tesseract
///
/// Configures the engine with the prescription character whitelist and
/// single-block page segmentation, feeds the raster as an in-memory PNG and
/// returns the cleaned extracted text.
///
/// # Arguments
///
/// * `raster` - The normalized binary raster to recognize
/// * `config` - OCR configuration (language, PSM mode, character whitelist)
///
/// # Returns
///
/// Returns the extracted text (leading/trailing whitespace trimmed, internal
/// newlines preserved), or an `OcrError` on engine failure
pub fn extract_text(raster: &GrayImage, config: &OcrConfig) -> Result<String, OcrError> {
    let ocr_start_time = std::time::Instant::now();

    let mut png_buffer = Vec::new();
    raster
        .write_to(
            &mut std::io::Cursor::new(&mut png_buffer),
            image::ImageFormat::Png,
        )
        .map_err(|e| OcrError::Encode(format!("PNG encoding failed: {}", e)))?;

    let mut tess = LepTess::new(None, &config.language)
        .map_err(|e| OcrError::Initialization(format!("Failed to initialize Tesseract: {}", e)))?;

    tess.set_variable(
        leptess::Variable::TesseditCharWhitelist,
        &config.character_whitelist,
    )
    .map_err(|e| OcrError::Initialization(format!("Failed to set character whitelist: {}", e)))?;

    tess.set_variable(
        leptess::Variable::TesseditPagesegMode,
        config.psm_mode.as_str(),
    )
    .map_err(|e| OcrError::Initialization(format!("Failed to set PSM mode: {}", e)))?;

    tess.set_image_from_mem(&png_buffer)
        .map_err(|e| OcrError::ImageLoad(format!("Failed to load raster into Tesseract: {}", e)))?;

    let extracted_text = tess
        .get_utf8_text()
        .map_err(|e| OcrError::Extraction(format!("Failed to extract text from image: {}", e)))?;

    let cleaned_text = cleanup_extracted_text(&extracted_text);

    info!(
        "OCR processing completed in {}ms, extracted {} characters",
        ocr_start_time.elapsed().as_millis(),
        cleaned_text.len()
    );

    Ok(cleaned_text)
}

/// Extract text from a raster, degrading to an empty string on engine failure
///
/// This is the never-throws boundary of the extractor: any internal OCR engine
/// failure is logged and mapped to an empty string, so the pipeline degrades
/// gracefully instead of aborting. An empty result signals total extraction
/// failure to the caller.
pub fn extract_text_lossy(raster: &GrayImage, config: &OcrConfig) -> String {
    match extract_text(raster, config) {
        Ok(text) => text,
        Err(err) => {
            crate::errors::error_logging::log_ocr_error(&err, "extract_text", None, None);
            warn!("OCR extraction failed, degrading to empty text");
            String::new()
        }
    }
}

/// Clean up extracted text: trim each line, drop empty lines, preserve the
/// remaining line boundaries (the classifier needs them)
fn cleanup_extracted_text(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cleanup_trims_and_preserves_lines() {
        let raw = "  Paracetamol 500mg  \n\n   twice daily   \n";
        assert_eq!(cleanup_extracted_text(raw), "Paracetamol 500mg\ntwice daily");
    }

    #[test]
    fn test_cleanup_empty_input() {
        assert_eq!(cleanup_extracted_text(""), "");
        assert_eq!(cleanup_extracted_text("   \n  \n"), "");
    }

    #[test]
    fn test_validate_missing_file() {
        let config = OcrConfig::default();
        assert!(validate_image_file("/nonexistent/scan.png", &config).is_err());
    }

    #[test]
    fn test_validate_empty_file() {
        let config = OcrConfig::default();
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let path = file.path().to_string_lossy().to_string();
        assert!(validate_image_file(&path, &config).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_format() {
        let config = OcrConfig::default();
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"plain text, definitely not pixels")
            .expect("write temp data");
        let path = file.path().to_string_lossy().to_string();
        assert!(validate_image_file(&path, &config).is_err());
    }

    #[test]
    fn test_validate_accepts_png() {
        let config = OcrConfig::default();
        let img = image::GrayImage::new(8, 8);
        let file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        let path = file.path().to_string_lossy().to_string();
        img.save(&path).expect("save png");
        assert!(validate_image_file(&path, &config).is_ok());
    }
}
