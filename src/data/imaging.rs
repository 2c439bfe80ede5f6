//! Image preprocessing for inference on image-trained models.

use image::imageops::FilterType;

use crate::error::Result;
use crate::math::matrix::Matrix;

/// Decodes image bytes (PNG/JPEG/BMP/GIF), resizes to `width × height`,
/// converts to grayscale and normalizes pixels to [0, 1].
///
/// Returns a flat `Vec<f64>` of length `width * height`.
pub fn grayscale_input(bytes: &[u8], width: u32, height: u32) -> Result<Vec<f64>> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    let gray = resized.to_luma8();
    Ok(gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect())
}

/// Same as `grayscale_input`, wrapped as a one-row batch.
pub fn grayscale_batch(bytes: &[u8], width: u32, height: u32) -> Result<Matrix> {
    Ok(Matrix::row_vector(grayscale_input(bytes, width, height)?))
}
