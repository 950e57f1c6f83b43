//! # Application Configuration
//!
//! This module defines configuration structures for the prescription analysis
//! pipeline: OCR engine settings and application-level settings (output
//! directory, history size). Values load from environment variables with
//! sensible defaults and are validated at startup.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Default OCR language code
pub const DEFAULT_LANGUAGE: &str = "eng";
/// Buffer size for image format detection in bytes
pub const FORMAT_DETECTION_BUFFER_SIZE: usize = 32;
/// Minimum bytes required for format detection
pub const MIN_FORMAT_BYTES: usize = 8;
/// 10MB limit for image files
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
/// Character whitelist restricting OCR output to prescription-relevant characters
pub const DEFAULT_CHARACTER_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.,:-/() ";
/// Default output directory for the report history file
pub const DEFAULT_OUTPUT_DIR: &str = "public";
/// Default number of reports retained in the history file
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Page Segmentation Mode for Tesseract OCR
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSegMode {
    /// Fully automatic page segmentation
    Auto = 3,
    /// Assume a single column of text
    SingleColumn = 4,
    /// Assume a single uniform block of text
    #[default]
    SingleBlock = 6,
    /// Treat the image as a single text line
    SingleLine = 7,
}

impl PageSegMode {
    /// Convert PSM mode to string value for Tesseract
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SingleLine => "7",
        }
    }
}

/// Configuration structure for OCR processing
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// OCR language code (e.g., "eng")
    pub language: String,
    /// Page segmentation mode; prescriptions are short unstructured notes,
    /// so a single uniform block beats full-page layout analysis
    pub psm_mode: PageSegMode,
    /// Character whitelist to suppress spurious symbol noise
    pub character_whitelist: String,
    /// Maximum allowed file size in bytes
    pub max_file_size: u64,
    /// Buffer size for format detection in bytes
    pub buffer_size: usize,
    /// Minimum bytes required for format detection
    pub min_format_bytes: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            psm_mode: PageSegMode::default(),
            character_whitelist: DEFAULT_CHARACTER_WHITELIST.to_string(),
            max_file_size: MAX_FILE_SIZE,
            buffer_size: FORMAT_DETECTION_BUFFER_SIZE,
            min_format_bytes: MIN_FORMAT_BYTES,
        }
    }
}

impl OcrConfig {
    /// Validate OCR configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.language.trim().is_empty() {
            return Err(AppError::Config("language cannot be empty".to_string()));
        }
        if self.character_whitelist.trim().is_empty() {
            return Err(AppError::Config(
                "character_whitelist cannot be empty".to_string(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(AppError::Config(
                "buffer_size must be greater than 0".to_string(),
            ));
        }
        if self.min_format_bytes == 0 {
            return Err(AppError::Config(
                "min_format_bytes must be greater than 0".to_string(),
            ));
        }
        if self.min_format_bytes > self.buffer_size {
            return Err(AppError::Config(format!(
                "min_format_bytes ({}) cannot exceed buffer_size ({})",
                self.min_format_bytes, self.buffer_size
            )));
        }
        if self.max_file_size == 0 {
            return Err(AppError::Config(
                "max_file_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory receiving the report history file
    pub output_dir: String,
    /// Maximum number of reports retained in the history file
    pub history_limit: usize,
    /// OCR engine configuration
    #[serde(skip)]
    pub ocr: OcrConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            ocr: OcrConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// Recognized variables:
    /// - `RXSCAN_OUTPUT_DIR` - directory for the history file (default: "public")
    /// - `RXSCAN_HISTORY_LIMIT` - retained report count (default: 50)
    /// - `RXSCAN_OCR_LANGUAGE` - Tesseract language code (default: "eng")
    pub fn from_env() -> AppResult<Self> {
        let output_dir =
            env::var("RXSCAN_OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string());

        let history_limit = env::var("RXSCAN_HISTORY_LIMIT")
            .unwrap_or_else(|_| DEFAULT_HISTORY_LIMIT.to_string())
            .parse::<usize>()
            .map_err(|_| {
                AppError::Config("RXSCAN_HISTORY_LIMIT must be a valid number".to_string())
            })?;

        let mut ocr = OcrConfig::default();
        if let Ok(language) = env::var("RXSCAN_OCR_LANGUAGE") {
            ocr.language = language;
        }

        let config = Self {
            output_dir,
            history_limit,
            ocr,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate application configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.output_dir.trim().is_empty() {
            return Err(AppError::Config("output_dir cannot be empty".to_string()));
        }
        if self.history_limit == 0 {
            return Err(AppError::Config(
                "history_limit must be greater than 0".to_string(),
            ));
        }
        self.ocr.validate()?;
        Ok(())
    }
}
