// src/display.rs

//! 8-bit conversions for handing eigenfaces and reconstructions to a renderer.
//! These only produce new buffers; the `f64` data used for computation is never modified.

use crate::selector::ProjectionBasis;
use ndarray::{Array2, ArrayView1};

/// Min-max normalizes a real-valued vector into [0, 255].
/// A constant vector maps to all zeros.
pub fn eigenface_to_u8(vector: ArrayView1<f64>) -> Vec<u8> {
    let (min, max) = vector
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    if !(range.is_finite() && range > 0.0) {
        return vec![0; vector.len()];
    }
    vector
        .iter()
        .map(|&v| (255.0 * (v - min) / range).round() as u8)
        .collect()
}

/// The first `count` basis columns (capped at K), each normalized to 8-bit.
pub fn eigenfaces_to_u8(basis: &ProjectionBasis, count: usize) -> Vec<Vec<u8>> {
    basis
        .leading_columns(count)
        .columns()
        .into_iter()
        .map(eigenface_to_u8)
        .collect()
}

/// Rounds and clips each reconstructed row to [0, 255].
pub fn clip_to_u8(reconstructed: &Array2<f64>) -> Vec<Vec<u8>> {
    reconstructed
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|&v| v.round().clamp(0.0, 255.0) as u8).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_min_max_normalization() {
        let v = array![-1.0, 0.0, 1.0];
        assert_eq!(eigenface_to_u8(v.view()), vec![0, 128, 255]);
    }

    #[test]
    fn test_constant_vector_maps_to_zero() {
        let v = array![0.5, 0.5];
        assert_eq!(eigenface_to_u8(v.view()), vec![0, 0]);
    }

    #[test]
    fn test_clip_to_u8() {
        let m = array![[-12.0, 3.4, 300.0], [254.6, 0.0, 127.5]];
        assert_eq!(clip_to_u8(&m), vec![vec![0, 3, 255], vec![255, 0, 128]]);
    }
}
