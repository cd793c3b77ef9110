// src/selector.rs

use crate::diagnostics::{
    compute_orthogonality_error, max_off_diagonal_dot, relative_gap, NumericalHealthWarning,
};
use crate::eigenpairs::EigenPairs;
use crate::error::{EigenfaceError, Result};
use log::{debug, warn};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tolerances used when judging the numerical health of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// An eigenvalue's imaginary part is flagged above
    /// `imaginary_tolerance * max(1, |largest eigenvalue|)`; an eigenvector's
    /// imaginary norm is flagged above `imaginary_tolerance`.
    pub imaginary_tolerance: f64,
    /// Relative gap at or below which the eigenvalues either side of the K cut
    /// are considered duplicates.
    pub degeneracy_tolerance: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        SelectorConfig {
            imaginary_tolerance: 1e-8,
            degeneracy_tolerance: 1e-10,
        }
    }
}

/// An ordered D×K basis of the top-K eigenvectors by descending eigenvalue.
///
/// Columns are taken from the solver as-is. They are orthonormal only if the
/// solver made them so; use [`ProjectionBasis::orthogonality_error`] to check.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionBasis {
    /// Shape: (D, K)
    vectors: Array2<f64>,
    /// Real parts of the selected eigenvalues, descending. Shape: (K)
    eigenvalues: Array1<f64>,
    /// Position of each selected pair in the solver output.
    solver_indices: Vec<usize>,
    warnings: Vec<NumericalHealthWarning>,
}

impl ProjectionBasis {
    /// Number of basis vectors K.
    pub fn k(&self) -> usize {
        self.vectors.ncols()
    }

    /// Feature dimensionality D.
    pub fn dimension(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn vectors(&self) -> &Array2<f64> {
        &self.vectors
    }

    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    pub fn solver_indices(&self) -> &[usize] {
        &self.solver_indices
    }

    pub fn warnings(&self) -> &[NumericalHealthWarning] {
        &self.warnings
    }

    /// The first `count` columns (capped at K), e.g. the leading eigenfaces handed
    /// to a renderer. This is a view; the basis itself is never altered.
    pub fn leading_columns(&self, count: usize) -> ArrayView2<'_, f64> {
        self.vectors.slice(s![.., ..count.min(self.k())])
    }

    /// `||BᵀB - I||_F`.
    pub fn orthogonality_error(&self) -> f64 {
        compute_orthogonality_error(&self.vectors.view())
    }

    /// Largest absolute dot product between two distinct columns.
    pub fn max_cross_dot(&self) -> f64 {
        max_off_diagonal_dot(&self.vectors.view())
    }
}

/// Ranks eigenpairs and cuts the basis at K.
#[derive(Debug, Clone, Default)]
pub struct SubspaceSelector {
    config: SelectorConfig,
}

impl SubspaceSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Selects the K eigenvectors with the largest eigenvalues (real parts).
    ///
    /// # Errors
    /// `OutOfRangeK` unless `1 <= k <= D`.
    pub fn select(&self, pairs: &EigenPairs, k: usize) -> Result<ProjectionBasis> {
        let d = pairs.len();
        if k == 0 || k > d {
            return Err(EigenfaceError::OutOfRangeK { k, max: d });
        }

        let order = rank_eigenpairs(pairs);
        let selected = &order[..k];
        let values = pairs.eigenvalues();

        let mut warnings = Vec::new();
        let largest = values[order[0]].abs();
        let value_imag_limit = self.config.imaginary_tolerance * largest.max(1.0);
        for &index in selected {
            let eigenvalue_imag = pairs.eigenvalues_imag()[index];
            let eigenvector_imag_norm = pairs.eigenvector_imag_norms()[index];
            if eigenvalue_imag.abs() > value_imag_limit
                || eigenvector_imag_norm > self.config.imaginary_tolerance
            {
                warnings.push(NumericalHealthWarning::ImaginaryComponent {
                    solver_index: index,
                    eigenvalue_imag,
                    eigenvector_imag_norm,
                });
            }
        }
        if k < d {
            let kept = values[order[k - 1]];
            let dropped = values[order[k]];
            let floor = largest.max(f64::MIN_POSITIVE);
            if relative_gap(kept, dropped, floor) <= self.config.degeneracy_tolerance {
                warnings.push(NumericalHealthWarning::NearDuplicateEigenvalues {
                    k,
                    kept,
                    dropped,
                });
            }
        }
        for warning in &warnings {
            warn!("{}", warning);
        }

        let vectors = pairs.eigenvectors().select(Axis(1), selected);
        let eigenvalues = selected.iter().map(|&i| values[i]).collect::<Array1<f64>>();
        debug!("Selected basis of shape {:?} for K = {}", vectors.dim(), k);

        Ok(ProjectionBasis {
            vectors,
            eigenvalues,
            solver_indices: selected.to_vec(),
            warnings,
        })
    }
}

/// Selects with the default tolerances.
pub fn select(pairs: &EigenPairs, k: usize) -> Result<ProjectionBasis> {
    SubspaceSelector::default().select(pairs, k)
}

/// Solver indices ordered by descending eigenvalue real part.
/// The sort is stable, so equal eigenvalues keep their solver order.
pub fn rank_eigenpairs(pairs: &EigenPairs) -> Vec<usize> {
    let values = pairs.eigenvalues();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::EigenSolverKind;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_linalg::c64;

    fn diagonal_pairs(values: Array1<f64>) -> EigenPairs {
        let d = values.len();
        EigenPairs::from_real(values, Array2::eye(d), EigenSolverKind::Symmetric).unwrap()
    }

    #[test]
    fn test_select_orders_by_descending_eigenvalue() {
        let pairs = diagonal_pairs(array![1.0, 5.0, 3.0, 4.0]);
        let basis = select(&pairs, 3).unwrap();
        assert_eq!(basis.solver_indices(), &[1, 3, 2]);
        assert_eq!(basis.eigenvalues(), &array![5.0, 4.0, 3.0]);
        assert_eq!(basis.vectors().dim(), (4, 3));
        assert_abs_diff_eq!(basis.vectors()[[1, 0]], 1.0);
        assert_abs_diff_eq!(basis.vectors()[[3, 1]], 1.0);
    }

    #[test]
    fn test_ties_keep_solver_order() {
        let pairs = diagonal_pairs(array![2.0, 7.0, 2.0, 7.0, 2.0]);
        assert_eq!(rank_eigenpairs(&pairs), vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn test_k_out_of_range() {
        let pairs = diagonal_pairs(array![1.0, 2.0]);
        assert_eq!(
            select(&pairs, 0).unwrap_err(),
            EigenfaceError::OutOfRangeK { k: 0, max: 2 }
        );
        assert_eq!(
            select(&pairs, 3).unwrap_err(),
            EigenfaceError::OutOfRangeK { k: 3, max: 2 }
        );
        assert_eq!(select(&pairs, 2).unwrap().k(), 2);
    }

    #[test]
    fn test_imaginary_component_is_flagged_and_real_part_used() {
        let values = array![c64::new(4.0, 0.5), c64::new(1.0, 0.0)];
        let vectors = array![
            [c64::new(1.0, 0.0), c64::new(0.0, 0.0)],
            [c64::new(0.0, 0.0), c64::new(1.0, 0.0)]
        ];
        let pairs = EigenPairs::from_complex(values, vectors, EigenSolverKind::General).unwrap();
        let basis = select(&pairs, 1).unwrap();
        assert_eq!(basis.eigenvalues(), &array![4.0]);
        assert_eq!(basis.warnings().len(), 1);
        assert!(matches!(
            basis.warnings()[0],
            NumericalHealthWarning::ImaginaryComponent { solver_index: 0, .. }
        ));
    }

    #[test]
    fn test_negligible_imaginary_component_is_not_flagged() {
        let values = array![c64::new(4.0, 1e-14), c64::new(1.0, 0.0)];
        let vectors = Array2::<f64>::eye(2).mapv(|v| c64::new(v, 0.0));
        let pairs = EigenPairs::from_complex(values, vectors, EigenSolverKind::General).unwrap();
        assert!(select(&pairs, 2).unwrap().warnings().is_empty());
    }

    #[test]
    fn test_near_duplicate_at_cut_is_flagged() {
        let pairs = diagonal_pairs(array![3.0, 1.0, 3.0]);
        let basis = select(&pairs, 1).unwrap();
        assert_eq!(basis.solver_indices(), &[0]);
        assert!(matches!(
            basis.warnings()[0],
            NumericalHealthWarning::NearDuplicateEigenvalues { k: 1, .. }
        ));
        assert!(select(&pairs, 2).unwrap().warnings().is_empty());
    }

    #[test]
    fn test_leading_columns_caps_at_k() {
        let pairs = diagonal_pairs(array![1.0, 2.0, 3.0]);
        let basis = select(&pairs, 2).unwrap();
        assert_eq!(basis.leading_columns(10).dim(), (3, 2));
        assert_eq!(basis.leading_columns(1).dim(), (3, 1));
        assert_abs_diff_eq!(basis.orthogonality_error(), 0.0, epsilon = 1e-15);
    }
}
