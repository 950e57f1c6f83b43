//! # Image Filtering Module
//!
//! This module provides noise reduction and morphological operations for OCR
//! preprocessing: median filtering against salt-and-pepper scanning artifacts
//! and morphological closing to fuse broken character strokes.

use image::GrayImage;
use tracing;

use super::types::{ClosedImageResult, DenoisedImageResult, PreprocessingError};

/// Applies a median filter to remove salt-and-pepper noise.
///
/// Median filtering replaces each pixel with the median of its neighborhood,
/// which removes isolated speckles from scanning artifacts while keeping text
/// edges sharper than a blur would.
///
/// # Arguments
///
/// * `image` - The input grayscale image to denoise
/// * `kernel_size` - Side length of the neighborhood (must be odd, >= 3)
///
/// # Returns
///
/// Returns a `Result` containing the denoised image and stage metadata, or a
/// `PreprocessingError` for invalid parameters
pub fn reduce_noise(
    image: &GrayImage,
    kernel_size: u32,
) -> Result<DenoisedImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    if kernel_size < 3 || kernel_size % 2 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!("kernel_size must be an odd value >= 3, got {}", kernel_size),
        });
    }

    let radius = kernel_size / 2;
    let denoised = imageproc::filter::median_filter(image, radius, radius);

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Noise reduction completed in {:.2}ms: kernel={}, dimensions={}x{}",
        processing_time.as_millis(),
        kernel_size,
        denoised.width(),
        denoised.height()
    );

    Ok(DenoisedImageResult {
        image: denoised,
        kernel_size,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Applies morphological closing (dilation followed by erosion) to a binary image.
///
/// Closing fills small gaps in foreground strokes. With a small square
/// structuring element it fuses broken character strokes without bridging
/// separate characters.
///
/// # Arguments
///
/// * `image` - The input binary image to clean
/// * `kernel_size` - Side length of the square structuring element (>= 2)
///
/// # Returns
///
/// Returns a `Result` containing the cleaned image and stage metadata, or a
/// `PreprocessingError` for invalid parameters
pub fn apply_closing(
    image: &GrayImage,
    kernel_size: u32,
) -> Result<ClosedImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    if kernel_size < 2 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!("kernel_size must be >= 2, got {}", kernel_size),
        });
    }

    let dilated = apply_dilation(image, kernel_size);
    let closed = apply_erosion(&dilated, kernel_size);

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Morphological closing completed in {:.2}ms: kernel={}, dimensions={}x{}",
        processing_time.as_millis(),
        kernel_size,
        closed.width(),
        closed.height()
    );

    Ok(ClosedImageResult {
        image: closed,
        kernel_size,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Applies dilation with a square kernel anchored at its top-left corner.
///
/// Dilation expands bright regions: each pixel takes the maximum value of its
/// kernel neighborhood. Out-of-bounds neighbors are skipped.
fn apply_dilation(image: &GrayImage, kernel_size: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut max_val = 0u8;
            for ky in 0..kernel_size {
                for kx in 0..kernel_size {
                    let nx = x + kx;
                    let ny = y + ky;
                    if nx < width && ny < height {
                        max_val = max_val.max(image.get_pixel(nx, ny)[0]);
                    }
                }
            }
            result.put_pixel(x, y, image::Luma([max_val]));
        }
    }

    result
}

/// Applies erosion with the reflected square kernel (bottom-right anchor).
///
/// Erosion shrinks bright regions: each pixel takes the minimum value of its
/// kernel neighborhood. The kernel is reflected relative to [`apply_dilation`]
/// so that dilation followed by erosion is a proper closing with no spatial
/// offset. Out-of-bounds neighbors are skipped.
fn apply_erosion(image: &GrayImage, kernel_size: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut min_val = 255u8;
            for ky in 0..kernel_size {
                for kx in 0..kernel_size {
                    if kx <= x && ky <= y {
                        min_val = min_val.min(image.get_pixel(x - kx, y - ky)[0]);
                    }
                }
            }
            result.put_pixel(x, y, image::Luma([min_val]));
        }
    }

    result
}
