// src/evaluate.rs

use crate::error::{EigenfaceError, Result};
use crate::reconstruct::reconstruct;
use crate::selector::ProjectionBasis;
use ndarray::{Array1, Array2, Zip};
use serde::{Deserialize, Serialize};

/// Divisor applied to the total squared reconstruction error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorNormalization {
    /// Total squared error divided by N, the number of test images.
    #[default]
    PerImage,
    /// Total squared error divided by N × D, the number of matrix elements.
    PerElement,
}

impl ErrorNormalization {
    fn divisor(self, n_images: usize, n_pixels: usize) -> f64 {
        match self {
            ErrorNormalization::PerImage => n_images as f64,
            ErrorNormalization::PerElement => (n_images * n_pixels) as f64,
        }
    }
}

/// Reconstructed test images together with their error score.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionResult {
    /// Shape: (N, D), unclipped.
    pub reconstructed: Array2<f64>,
    pub error: f64,
}

/// Squared reconstruction error summed over every element and divided
/// according to `normalization`.
///
/// # Errors
/// `ShapeMismatch` if the shapes differ, `EmptyInput` if there are no elements.
pub fn evaluate(
    original: &Array2<f64>,
    reconstructed: &Array2<f64>,
    normalization: ErrorNormalization,
) -> Result<f64> {
    if original.dim() != reconstructed.dim() {
        return Err(EigenfaceError::shape(
            "evaluate: reconstructed matrix",
            original.dim(),
            reconstructed.dim(),
        ));
    }
    let (n_images, n_pixels) = original.dim();
    if n_images == 0 || n_pixels == 0 {
        return Err(EigenfaceError::EmptyInput(format!(
            "cannot score an empty ({}, {}) matrix",
            n_images, n_pixels
        )));
    }
    let mut total = 0.0f64;
    Zip::from(original).and(reconstructed).for_each(|&a, &b| {
        let diff = a - b;
        total += diff * diff;
    });
    Ok(total / normalization.divisor(n_images, n_pixels))
}

/// Reconstructs `images` through `basis` and scores the result.
pub fn reconstruct_and_evaluate(
    images: &Array2<f64>,
    mean: &Array1<f64>,
    basis: &ProjectionBasis,
    normalization: ErrorNormalization,
) -> Result<ReconstructionResult> {
    let reconstructed = reconstruct(images, mean, basis.vectors())?;
    let error = evaluate(images, &reconstructed, normalization)?;
    Ok(ReconstructionResult { reconstructed, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_per_image_and_per_element_differ_by_d() {
        let original = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let reconstructed = array![[1.0, 2.0, 5.0], [4.0, 4.0, 6.0]];
        // squared differences: 4 + 1 = 5
        let per_image = evaluate(&original, &reconstructed, ErrorNormalization::PerImage).unwrap();
        let per_element =
            evaluate(&original, &reconstructed, ErrorNormalization::PerElement).unwrap();
        assert_abs_diff_eq!(per_image, 2.5);
        assert_abs_diff_eq!(per_element, 5.0 / 6.0, epsilon = 1e-15);
        assert_abs_diff_eq!(per_image, per_element * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_identical_matrices_score_zero() {
        let m = array![[0.0, 255.0], [17.0, 3.0]];
        assert_eq!(evaluate(&m, &m, ErrorNormalization::default()).unwrap(), 0.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Array2::<f64>::zeros((2, 3));
        let b = Array2::<f64>::zeros((3, 2));
        assert!(matches!(
            evaluate(&a, &b, ErrorNormalization::PerImage).unwrap_err(),
            EigenfaceError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_empty_matrices_are_rejected() {
        let a = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            evaluate(&a, &a, ErrorNormalization::PerImage).unwrap_err(),
            EigenfaceError::EmptyInput(_)
        ));
    }
}
