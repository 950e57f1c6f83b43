//! # Preprocessing Types Module
//!
//! Shared types for the image normalization pipeline: error variants and
//! per-stage result structures carrying the processed raster plus metadata.

use image::GrayImage;

/// Errors that can occur during image preprocessing operations.
#[derive(Debug, Clone)]
pub enum PreprocessingError {
    /// Failed to load or decode the input image
    ImageLoad { message: String },
    /// Invalid stage parameter (kernel/window sizes)
    InvalidParameter { message: String },
    /// Image processing operation failed
    ProcessingFailed { message: String },
}

impl std::fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingError::ImageLoad { message } => {
                write!(f, "Failed to load image: {}", message)
            }
            PreprocessingError::InvalidParameter { message } => {
                write!(f, "Invalid preprocessing parameter: {}", message)
            }
            PreprocessingError::ProcessingFailed { message } => {
                write!(f, "Image processing failed: {}", message)
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

/// Result of the median denoise stage
#[derive(Debug, Clone)]
pub struct DenoisedImageResult {
    /// The denoised grayscale image
    pub image: GrayImage,
    /// Median filter kernel size (odd)
    pub kernel_size: u32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of the local-adaptive binarization stage
#[derive(Debug, Clone)]
pub struct BinarizedImageResult {
    /// The binary image (pixels are 0 or 255)
    pub image: GrayImage,
    /// Side length of the local neighborhood window (odd)
    pub window_size: u32,
    /// Constant subtracted from the local mean before comparison
    pub bias: i32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of the morphological closing stage
#[derive(Debug, Clone)]
pub struct ClosedImageResult {
    /// The cleaned binary image
    pub image: GrayImage,
    /// Side length of the square structuring element
    pub kernel_size: u32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}
