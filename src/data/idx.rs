//! Parse a pair of IDX binary files (image + label) as used by MNIST and its
//! derivatives (Fashion-MNIST, EMNIST, …) into a `Dataset`.
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index
//! ```
//!
//! Pixels are divided by 255 so inputs lie in `[0.0, 1.0]`.
use log::info;

use crate::data::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

pub fn parse_idx_pair(image_bytes: &[u8], label_bytes: &[u8]) -> Result<Dataset> {
    // ── Image file header ───────────────────────────────────────────────────
    check_magic("image", image_bytes, 3, 16)?;
    let n_items = read_u32(image_bytes, 4);
    let rows = read_u32(image_bytes, 8);
    let cols = read_u32(image_bytes, 12);

    let n_pixels = rows.checked_mul(cols).ok_or_else(|| {
        NnError::Dataset(format!("IDX image file: rows * cols overflows (rows={}, cols={})", rows, cols))
    })?;
    let data_len = n_items.checked_mul(n_pixels).ok_or_else(|| {
        NnError::Dataset(format!(
            "IDX image file: n_items * n_pixels overflows (n_items={}, n_pixels={})",
            n_items, n_pixels
        ))
    })?;
    if image_bytes.len() - 16 < data_len {
        return Err(NnError::Dataset(format!(
            "IDX image file too short: header declares {} items of {}×{} pixels \
             ({} data bytes), but only {} bytes follow the header",
            n_items,
            rows,
            cols,
            data_len,
            image_bytes.len() - 16
        )));
    }

    // ── Label file header ───────────────────────────────────────────────────
    check_magic("label", label_bytes, 1, 8)?;
    let label_count = read_u32(label_bytes, 4);
    if label_count != n_items {
        return Err(NnError::Dataset(format!(
            "IDX file mismatch: image file declares {} items but label file declares {}",
            n_items, label_count
        )));
    }
    if label_bytes.len() - 8 < n_items {
        return Err(NnError::Dataset(format!(
            "IDX label file too short: header declares {} labels but only {} bytes follow",
            n_items,
            label_bytes.len() - 8
        )));
    }

    // ── Build ───────────────────────────────────────────────────────────────
    let data = if n_pixels == 0 {
        vec![Vec::new(); n_items]
    } else {
        image_bytes[16..16 + data_len]
            .chunks_exact(n_pixels)
            .map(|chunk| chunk.iter().map(|&px| px as f64 / 255.0).collect())
            .collect()
    };
    let labels = label_bytes[8..8 + n_items].iter().map(|&b| b as usize).collect();

    Dataset::new(Matrix { rows: n_items, cols: n_pixels, data }, labels)
}

/// Reads both files from disk and parses them.
pub fn load_idx_pair(image_path: &str, label_path: &str) -> Result<Dataset> {
    let images = std::fs::read(image_path)?;
    let labels = std::fs::read(label_path)?;
    let dataset = parse_idx_pair(&images, &labels)?;
    info!(
        "loaded {} samples with {} features from {}",
        dataset.len(),
        dataset.feature_count(),
        image_path
    );
    Ok(dataset)
}

fn check_magic(kind: &str, bytes: &[u8], dims: u8, header_len: usize) -> Result<()> {
    if bytes.len() < header_len {
        return Err(NnError::Dataset(format!(
            "IDX {} file too short: expected at least {} header bytes, got {}",
            kind,
            header_len,
            bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(NnError::Dataset(format!(
            "IDX {} file: bytes 0-1 must be 0x00 0x00, got 0x{:02X} 0x{:02X}",
            kind, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(NnError::Dataset(format!(
            "IDX {} file: dtype byte must be 0x08 (uint8), got 0x{:02X}",
            kind, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(NnError::Dataset(format!(
            "IDX {} file: expected {} dimensions, got {}",
            kind, dims, bytes[3]
        )));
    }
    Ok(())
}

fn read_u32(bytes: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]]) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(n: u32, side: u32, pixels: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0, 0, 8, 3];
        bytes.extend_from_slice(&n.to_be_bytes());
        bytes.extend_from_slice(&side.to_be_bytes());
        bytes.extend_from_slice(&side.to_be_bytes());
        bytes.extend_from_slice(pixels);
        bytes
    }

    fn labels(values: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0, 0, 8, 1];
        bytes.extend_from_slice(&(values.len() as u32).to_be_bytes());
        bytes.extend_from_slice(values);
        bytes
    }

    #[test]
    fn parses_two_tiny_images() {
        let data = parse_idx_pair(&images(2, 2, &[0, 255, 51, 0, 255, 255, 255, 255]), &labels(&[3, 7])).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.feature_count(), 4);
        assert_eq!(data.inputs.data[0], vec![0.0, 1.0, 0.2, 0.0]);
        assert_eq!(data.labels, vec![3, 7]);
    }

    #[test]
    fn truncated_pixels_are_rejected() {
        let err = parse_idx_pair(&images(2, 2, &[0; 5]), &labels(&[0, 1])).unwrap_err();
        assert!(matches!(err, NnError::Dataset(_)));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        assert!(parse_idx_pair(&images(1, 1, &[9]), &labels(&[0, 1])).is_err());
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bad = images(1, 1, &[0]);
        bad[3] = 1;
        assert!(parse_idx_pair(&bad, &labels(&[0])).is_err());
        assert!(parse_idx_pair(&[0, 0], &labels(&[0])).is_err());
    }
}
