//! # Image Thresholding Module
//!
//! This module provides binary thresholding functionality for OCR preprocessing.
//! It implements local-adaptive mean thresholding, which tolerates the uneven
//! lighting and shadows common in photographed prescription pages.

use image::GrayImage;
use tracing;

use super::types::{BinarizedImageResult, PreprocessingError};

/// Applies local-adaptive mean thresholding to convert an image to binary.
///
/// Each pixel is compared against the mean intensity of its local neighborhood
/// minus a bias constant, rather than a single global threshold. Pixels brighter
/// than the local statistic become white (255), the rest black (0). A per-pixel
/// threshold keeps text legible across a page with a lighting gradient where a
/// global threshold would wash out one side.
///
/// # Arguments
///
/// * `image` - The input grayscale image to threshold
/// * `window_size` - Side length of the local neighborhood (must be odd, > 1)
/// * `bias` - Constant subtracted from the local mean before comparison
///
/// # Returns
///
/// Returns a `Result` containing the binary image and stage metadata, or a
/// `PreprocessingError` for invalid parameters
///
/// # Examples
///
/// ```no_run
/// use rxscan::preprocessing::apply_adaptive_threshold;
/// use image::open;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gray = open("prescription.jpg")?.to_luma8();
/// let binarized = apply_adaptive_threshold(&gray, 11, 2)?;
/// // binarized.image is binary and ready for morphological cleanup
/// # Ok(())
/// # }
/// ```
pub fn apply_adaptive_threshold(
    image: &GrayImage,
    window_size: u32,
    bias: i32,
) -> Result<BinarizedImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    if window_size < 3 || window_size % 2 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            message: format!(
                "window_size must be an odd value >= 3, got {}",
                window_size
            ),
        });
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessingError::ProcessingFailed {
            message: "cannot threshold an empty image".to_string(),
        });
    }

    // Summed-area table over pixel intensities. integral[y][x] holds the sum of
    // all pixels strictly above and left of (x, y), so any window sum is four
    // lookups instead of a nested neighborhood scan.
    let w = width as usize;
    let h = height as usize;
    let mut integral = vec![0u64; (w + 1) * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += u64::from(image.get_pixel(x as u32, y as u32)[0]);
            integral[(y + 1) * (w + 1) + (x + 1)] = integral[y * (w + 1) + (x + 1)] + row_sum;
        }
    }

    let radius = (window_size / 2) as i64;
    let mut binary_img = GrayImage::new(width, height);

    for y in 0..h as i64 {
        for x in 0..w as i64 {
            // Window clamped at the image borders; the mean uses the actual
            // pixel count so border thresholds are not biased low.
            let x0 = (x - radius).max(0) as usize;
            let y0 = (y - radius).max(0) as usize;
            let x1 = ((x + radius) as usize).min(w - 1) + 1;
            let y1 = ((y + radius) as usize).min(h - 1) + 1;

            let sum = integral[y1 * (w + 1) + x1] + integral[y0 * (w + 1) + x0]
                - integral[y0 * (w + 1) + x1]
                - integral[y1 * (w + 1) + x0];
            let count = ((x1 - x0) * (y1 - y0)) as u64;
            let mean = (sum / count) as i32;

            let intensity = i32::from(image.get_pixel(x as u32, y as u32)[0]);
            let binary_value = if intensity > mean - bias { 255u8 } else { 0u8 };
            binary_img.put_pixel(x as u32, y as u32, image::Luma([binary_value]));
        }
    }

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Adaptive thresholding completed in {:.2}ms: window={}, bias={}, dimensions={}x{}",
        processing_time.as_millis(),
        window_size,
        bias,
        width,
        height
    );

    Ok(BinarizedImageResult {
        image: binary_img,
        window_size,
        bias,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_threshold_output_is_binary() {
        let mut img = GrayImage::new(20, 20);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            pixel[0] = ((x * 7 + y * 13) % 256) as u8;
        }

        let result = apply_adaptive_threshold(&img, 11, 2)
            .expect("adaptive threshold should succeed on a valid image");

        for pixel in result.image.pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
        assert_eq!(result.window_size, 11);
        assert_eq!(result.bias, 2);
    }

    #[test]
    fn test_adaptive_threshold_uniform_image_goes_white() {
        // Uniform intensity: every pixel equals its local mean, so with a
        // positive bias everything lands above (mean - bias) and turns white.
        let mut img = GrayImage::new(16, 16);
        for pixel in img.pixels_mut() {
            pixel[0] = 128;
        }

        let result = apply_adaptive_threshold(&img, 11, 2)
            .expect("adaptive threshold should succeed on a uniform image");

        for pixel in result.image.pixels() {
            assert_eq!(pixel[0], 255);
        }
    }

    #[test]
    fn test_adaptive_threshold_tracks_lighting_gradient() {
        // Horizontal lighting gradient with dark "strokes" drawn on top.
        // A local threshold must keep the strokes black on both the dim and
        // bright halves of the image.
        let mut img = GrayImage::new(64, 16);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let background = 80 + (x * 2) as i32;
            let value = if y == 8 { background - 60 } else { background };
            pixel[0] = value.clamp(0, 255) as u8;
        }

        let result = apply_adaptive_threshold(&img, 11, 2)
            .expect("adaptive threshold should succeed on a gradient image");

        // Sample stroke pixels away from the borders on both halves
        assert_eq!(result.image.get_pixel(10, 8)[0], 0);
        assert_eq!(result.image.get_pixel(54, 8)[0], 0);
        // Background stays white on both halves
        assert_eq!(result.image.get_pixel(10, 2)[0], 255);
        assert_eq!(result.image.get_pixel(54, 2)[0], 255);
    }

    #[test]
    fn test_adaptive_threshold_rejects_even_window() {
        let img = GrayImage::new(8, 8);
        assert!(apply_adaptive_threshold(&img, 10, 2).is_err());
        assert!(apply_adaptive_threshold(&img, 1, 2).is_err());
    }

    #[test]
    fn test_adaptive_threshold_rejects_empty_image() {
        let img = GrayImage::new(0, 0);
        assert!(apply_adaptive_threshold(&img, 11, 2).is_err());
    }
}
