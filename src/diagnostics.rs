// src/diagnostics.rs

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal numerical health findings raised while ranking and selecting eigenpairs.
///
/// Computation proceeds with the real parts of the decomposition; these are
/// surfaced so the caller can judge whether the resulting basis is trustworthy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NumericalHealthWarning {
    /// A selected eigenpair carries a non-negligible imaginary component.
    /// `eigenvalue_imag` is the imaginary part of the eigenvalue and
    /// `eigenvector_imag_norm` the Euclidean norm of the eigenvector's imaginary part.
    ImaginaryComponent {
        solver_index: usize,
        eigenvalue_imag: f64,
        eigenvector_imag_norm: f64,
    },
    /// The last eigenvalue kept and the first one dropped are equal within tolerance,
    /// so which eigenvector enters the basis depends on the tie-break.
    NearDuplicateEigenvalues {
        k: usize,
        kept: f64,
        dropped: f64,
    },
}

impl fmt::Display for NumericalHealthWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericalHealthWarning::ImaginaryComponent {
                solver_index,
                eigenvalue_imag,
                eigenvector_imag_norm,
            } => write!(
                f,
                "eigenpair {} has imaginary component \
                 (eigenvalue im = {:e}, eigenvector im norm = {:e}); using real part",
                solver_index, eigenvalue_imag, eigenvector_imag_norm
            ),
            NumericalHealthWarning::NearDuplicateEigenvalues { k, kept, dropped } => write!(
                f,
                "eigenvalues at the K = {} cut are nearly equal \
                 ({:e} kept, {:e} dropped); basis choice is ambiguous",
                k, kept, dropped
            ),
        }
    }
}

/// Computes the Frobenius norm of an f64 matrix.
pub fn compute_frob_norm_f64(matrix: &ArrayView2<f64>) -> f64 {
    if matrix.is_empty() {
        return 0.0;
    }
    matrix.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Computes `||I - Q^T Q||_F` for a matrix whose columns should be orthonormal.
pub fn compute_orthogonality_error(q_matrix: &ArrayView2<f64>) -> f64 {
    let k = q_matrix.ncols();
    if k == 0 {
        return 0.0;
    }
    let gram = q_matrix.t().dot(q_matrix);
    let deviation = &gram - &Array2::<f64>::eye(k);
    compute_frob_norm_f64(&deviation.view())
}

/// Largest absolute pairwise dot product between distinct columns.
pub fn max_off_diagonal_dot(q_matrix: &ArrayView2<f64>) -> f64 {
    let k = q_matrix.ncols();
    let mut worst = 0.0f64;
    for i in 0..k {
        for j in (i + 1)..k {
            worst = worst.max(q_matrix.column(i).dot(&q_matrix.column(j)).abs());
        }
    }
    worst
}

/// Relative gap `|a - b| / max(|a|, |b|, floor)`.
pub fn relative_gap(a: f64, b: f64, floor: f64) -> f64 {
    let scale = a.abs().max(b.abs()).max(floor);
    (a - b).abs() / scale
}
