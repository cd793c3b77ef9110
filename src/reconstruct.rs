// src/reconstruct.rs

use crate::error::{EigenfaceError, Result};
use ndarray::{Array1, Array2};

fn check_shapes(images: &Array2<f64>, mean: &Array1<f64>, basis: &Array2<f64>) -> Result<()> {
    let n_pixels = images.ncols();
    if mean.len() != n_pixels {
        return Err(EigenfaceError::shape("reconstruct: mean vector", n_pixels, mean.len()));
    }
    if basis.nrows() != n_pixels {
        return Err(EigenfaceError::shape("reconstruct: basis rows", n_pixels, basis.nrows()));
    }
    Ok(())
}

/// Projects mean-centered images onto the basis.
///
/// * `images` - shape (N, D)
/// * `mean` - shape (D)
/// * `basis` - shape (D, K)
///
/// Returns the (N, K) coefficient matrix `(images - mean)·basis`.
pub fn project(
    images: &Array2<f64>,
    mean: &Array1<f64>,
    basis: &Array2<f64>,
) -> Result<Array2<f64>> {
    check_shapes(images, mean, basis)?;
    let centered = images - mean;
    Ok(centered.dot(basis))
}

/// Maps (N, K) coefficients back to pixel space: `coefficients·basisᵀ + mean`.
pub fn back_project(
    coefficients: &Array2<f64>,
    mean: &Array1<f64>,
    basis: &Array2<f64>,
) -> Result<Array2<f64>> {
    if coefficients.ncols() != basis.ncols() {
        return Err(EigenfaceError::shape(
            "back_project: coefficient columns",
            basis.ncols(),
            coefficients.ncols(),
        ));
    }
    if mean.len() != basis.nrows() {
        return Err(EigenfaceError::shape("back_project: mean vector", basis.nrows(), mean.len()));
    }
    let mut reconstructed = coefficients.dot(&basis.t());
    reconstructed += mean;
    Ok(reconstructed)
}

/// Projects images onto the K-dimensional basis and reconstructs them in pixel
/// space, adding the mean back.
///
/// The output has the same (N, D) shape as `images`. Values are real-valued
/// approximations of pixel intensities; nothing is clipped or quantized.
///
/// # Errors
/// `ShapeMismatch` if `mean` or the basis rows do not match D.
pub fn reconstruct(
    images: &Array2<f64>,
    mean: &Array1<f64>,
    basis: &Array2<f64>,
) -> Result<Array2<f64>> {
    let coefficients = project(images, mean, basis)?;
    back_project(&coefficients, mean, basis)
}
