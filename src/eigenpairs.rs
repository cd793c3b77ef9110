// src/eigenpairs.rs

use crate::error::{EigenfaceError, Result};
use crate::trainer::EigenSolverKind;
use ndarray::{Array1, Array2, Axis};
use ndarray_linalg::c64;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// The full eigendecomposition of a training covariance matrix.
///
/// Pairs are kept in the order the solver produced them; ranking happens later,
/// per K, in the selector. The value is immutable once built so a single
/// decomposition can be shared read-only across a whole sweep.
///
/// Real parts are stored directly. When the general solver is used, the
/// imaginary part of each eigenvalue and the norm of the imaginary part of each
/// eigenvector are kept alongside so the selector can flag them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EigenPairs {
    /// Real parts of the eigenvalues, solver order. Shape: (D)
    eigenvalues: Array1<f64>,
    /// Imaginary parts of the eigenvalues. Shape: (D)
    eigenvalues_imag: Array1<f64>,
    /// Real parts of the eigenvectors as columns. Shape: (D, D)
    eigenvectors: Array2<f64>,
    /// Euclidean norm of each eigenvector's imaginary part. Shape: (D)
    eigenvector_imag_norms: Array1<f64>,
    solver: EigenSolverKind,
}

impl EigenPairs {
    /// Builds eigenpairs from a real-valued decomposition.
    ///
    /// # Errors
    /// `ShapeMismatch` if `eigenvectors` is not D×D with D = `eigenvalues.len()`,
    /// `EmptyInput` if D = 0, `ComputeFailure` on non-finite entries.
    pub fn from_real(
        eigenvalues: Array1<f64>,
        eigenvectors: Array2<f64>,
        solver: EigenSolverKind,
    ) -> Result<Self> {
        let d = eigenvalues.len();
        let pairs = Self {
            eigenvalues,
            eigenvalues_imag: Array1::zeros(d),
            eigenvectors,
            eigenvector_imag_norms: Array1::zeros(d),
            solver,
        };
        pairs.validate()?;
        Ok(pairs)
    }

    /// Builds eigenpairs from a complex decomposition, splitting real and imaginary parts.
    pub fn from_complex(
        eigenvalues: Array1<c64>,
        eigenvectors: Array2<c64>,
        solver: EigenSolverKind,
    ) -> Result<Self> {
        let eigenvector_imag_norms = eigenvectors
            .map_axis(Axis(0), |column| column.iter().map(|z| z.im * z.im).sum::<f64>().sqrt());
        let pairs = Self {
            eigenvalues: eigenvalues.mapv(|z| z.re),
            eigenvalues_imag: eigenvalues.mapv(|z| z.im),
            eigenvectors: eigenvectors.mapv(|z| z.re),
            eigenvector_imag_norms,
            solver,
        };
        pairs.validate()?;
        Ok(pairs)
    }

    fn validate(&self) -> Result<()> {
        let d = self.eigenvalues.len();
        if d == 0 {
            return Err(EigenfaceError::EmptyInput(
                "eigendecomposition has zero eigenpairs".into(),
            ));
        }
        if self.eigenvectors.dim() != (d, d) {
            return Err(EigenfaceError::shape(
                "eigenpairs",
                (d, d),
                self.eigenvectors.dim(),
            ));
        }
        if self.eigenvalues_imag.len() != d || self.eigenvector_imag_norms.len() != d {
            return Err(EigenfaceError::shape(
                "eigenpairs imaginary parts",
                d,
                (self.eigenvalues_imag.len(), self.eigenvector_imag_norms.len()),
            ));
        }
        let all_finite = self.eigenvalues.iter().all(|v| v.is_finite())
            && self.eigenvalues_imag.iter().all(|v| v.is_finite())
            && self.eigenvectors.iter().all(|v| v.is_finite())
            && self.eigenvector_imag_norms.iter().all(|v| v.is_finite());
        if !all_finite {
            return Err(EigenfaceError::ComputeFailure(
                "eigendecomposition produced non-finite values".into(),
            ));
        }
        Ok(())
    }

    /// Number of eigenpairs, equal to the feature dimensionality D.
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Always false for a validated value; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Feature dimensionality D.
    pub fn dimension(&self) -> usize {
        self.eigenvectors.nrows()
    }

    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    pub fn eigenvalues_imag(&self) -> &Array1<f64> {
        &self.eigenvalues_imag
    }

    /// Eigenvectors as columns; column `i` pairs with `eigenvalues()[i]`.
    pub fn eigenvectors(&self) -> &Array2<f64> {
        &self.eigenvectors
    }

    pub fn eigenvector_imag_norms(&self) -> &Array1<f64> {
        &self.eigenvector_imag_norms
    }

    pub fn solver(&self) -> EigenSolverKind {
        self.solver
    }

    /// Saves the eigenpairs to a file using bincode.
    ///
    /// The buffered writer is flushed before returning so that write failures
    /// surface as `Persistence` errors instead of being lost on drop.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            EigenfaceError::Persistence(format!("failed to create file at {:?}: {}", path, e))
        })?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| {
                EigenfaceError::Persistence(format!("failed to serialize eigenpairs: {}", e))
            })?;
        writer.flush().map_err(|e| {
            EigenfaceError::Persistence(format!("failed to write eigenpairs to {:?}: {}", path, e))
        })?;
        Ok(())
    }

    /// Loads eigenpairs previously written by [`EigenPairs::save`].
    ///
    /// The loaded value goes through the same shape and finiteness checks as a
    /// freshly computed one.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            EigenfaceError::Persistence(format!("failed to open file at {:?}: {}", path, e))
        })?;
        let mut reader = BufReader::new(file);
        let pairs: EigenPairs =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard()).map_err(
                |e| EigenfaceError::Persistence(format!("failed to deserialize eigenpairs: {}", e)),
            )?;
        pairs.validate()?;
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_real_rejects_non_square_vectors() {
        let err = EigenPairs::from_real(
            array![1.0, 2.0],
            Array2::zeros((2, 3)),
            EigenSolverKind::Symmetric,
        )
        .unwrap_err();
        assert!(matches!(err, EigenfaceError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_from_real_rejects_nan() {
        let err = EigenPairs::from_real(
            array![1.0, f64::NAN],
            Array2::eye(2),
            EigenSolverKind::Symmetric,
        )
        .unwrap_err();
        assert!(matches!(err, EigenfaceError::ComputeFailure(_)));
    }

    #[test]
    fn test_from_complex_splits_parts() {
        let values = array![c64::new(2.0, 0.5), c64::new(1.0, 0.0)];
        let vectors = array![
            [c64::new(1.0, 0.0), c64::new(0.0, 0.0)],
            [c64::new(0.0, 0.0), c64::new(1.0, 0.0)]
        ];
        let pairs = EigenPairs::from_complex(values, vectors, EigenSolverKind::General).unwrap();
        assert_eq!(pairs.eigenvalues(), &array![2.0, 1.0]);
        assert_eq!(pairs.eigenvalues_imag(), &array![0.5, 0.0]);
        assert_eq!(pairs.eigenvector_imag_norms(), &array![0.0, 0.0]);
        assert_eq!(pairs.solver(), EigenSolverKind::General);
    }

    #[test]
    fn test_save_load_round_trip() {
        let pairs = EigenPairs::from_real(
            array![3.0, 1.0, 2.0],
            Array2::eye(3),
            EigenSolverKind::Symmetric,
        )
        .unwrap();
        let file = NamedTempFile::new().unwrap();
        pairs.save(file.path()).unwrap();
        let loaded = EigenPairs::load(file.path()).unwrap();
        assert_eq!(pairs, loaded);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_save_reports_write_failure() {
        // /dev/full accepts the open but fails every write with ENOSPC.
        let pairs = EigenPairs::from_real(
            array![3.0, 1.0, 2.0],
            Array2::eye(3),
            EigenSolverKind::Symmetric,
        )
        .unwrap();
        let err = pairs.save("/dev/full").unwrap_err();
        assert!(matches!(err, EigenfaceError::Persistence(_)), "got {:?}", err);
    }

    #[test]
    fn test_load_missing_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EigenPairs::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, EigenfaceError::Persistence(_)));
    }
}
