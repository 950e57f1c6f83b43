//! # Application Error Types
//!
//! This module defines common error types used throughout the rxscan application.
//! It provides structured error handling for the various pipeline stages.
//!
//! Errors split into two severities: usage/file-existence errors abort the
//! process with a non-zero exit code, while everything below that gate is
//! converted into an error report and exits zero (see `analyzer`).

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Invocation errors (wrong argument count)
    Usage(String),
    /// Input path does not exist
    FileNotFound(String),
    /// Input exists but cannot be interpreted as an image
    Decode(String),
    /// OCR produced no text at all
    EmptyExtraction(String),
    /// OCR engine errors
    Ocr(String),
    /// Configuration validation errors
    Config(String),
    /// File system errors (history persistence, output directory)
    FileSystem(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Usage(msg) => write!(f, "[USAGE] {}", msg),
            AppError::FileNotFound(msg) => write!(f, "[FILE_NOT_FOUND] {}", msg),
            AppError::Decode(msg) => write!(f, "[DECODE] {}", msg),
            AppError::EmptyExtraction(msg) => write!(f, "[EMPTY_EXTRACTION] {}", msg),
            AppError::Ocr(msg) => write!(f, "[OCR] {}", msg),
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::ocr::OcrError> for AppError {
    fn from(err: crate::ocr::OcrError) -> Self {
        AppError::Ocr(err.to_string())
    }
}

impl From<crate::preprocessing::PreprocessingError> for AppError {
    fn from(err: crate::preprocessing::PreprocessingError) -> Self {
        match err {
            crate::preprocessing::PreprocessingError::ImageLoad { message } => {
                AppError::Decode(message)
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting
pub mod error_logging {
    use tracing::error;

    /// Log OCR processing errors with image and processing context
    pub fn log_ocr_error(
        error: &impl std::fmt::Display,
        operation: &str,
        image_path: Option<&str>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            image_path = ?image_path,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "OCR processing failed"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "File system operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_tags() {
        assert_eq!(
            AppError::Usage("wrong argument count".to_string()).to_string(),
            "[USAGE] wrong argument count"
        );
        assert_eq!(
            AppError::Decode("bad header".to_string()).to_string(),
            "[DECODE] bad header"
        );
        assert_eq!(
            AppError::EmptyExtraction("no text".to_string()).to_string(),
            "[EMPTY_EXTRACTION] no text"
        );
    }

    #[test]
    fn test_from_anyhow() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err, AppError::Internal("boom".to_string()));
    }

    #[test]
    fn test_decode_error_from_preprocessing() {
        let err: AppError = crate::preprocessing::PreprocessingError::ImageLoad {
            message: "not an image".to_string(),
        }
        .into();
        assert_eq!(err, AppError::Decode("not an image".to_string()));
    }
}
