// src/linalg_backends.rs

use ndarray::{Array1, Array2};
use ndarray_linalg::{c64, Eig as NdLinalgEig, Eigh as NdLinalgEigh, UPLO};
use std::error::Error;
use std::marker::PhantomData;

/// Boxed backend error, thread-safe so decompositions can run on worker threads.
pub type BackendError = Box<dyn Error + Send + Sync + 'static>;

// --- Trait Definitions ---

/// Output of a symmetric eigendecomposition.
#[derive(Debug)]
pub struct EighOutput<F: 'static> {
    /// Eigenvalues in the order the solver returned them (LAPACK: ascending).
    pub eigenvalues: Array1<F>,
    /// Eigenvectors as columns of the matrix.
    /// eigenvectors.column(i) corresponds to eigenvalues[i].
    pub eigenvectors: Array2<F>,
}

/// Output of a general (non-symmetric) eigendecomposition.
/// Eigenvalues and eigenvectors are complex; for a symmetric input the imaginary
/// parts should vanish up to rounding.
#[derive(Debug)]
pub struct EigOutput {
    /// Eigenvalues in solver order (no ordering guarantee).
    pub eigenvalues: Array1<c64>,
    /// Right eigenvectors as columns.
    pub eigenvectors: Array2<c64>,
}

/// Trait for symmetric eigendecomposition (LAPACK DSYEVD through ndarray-linalg).
/// Implementers expect `matrix` to be symmetric and only read its upper triangle.
pub trait BackendEigh<F: 'static + Copy + Send + Sync> {
    fn eigh_upper(&self, matrix: &Array2<F>) -> Result<EighOutput<F>, BackendError>;
}

/// Trait for general eigendecomposition (LAPACK DGEEV through ndarray-linalg).
pub trait BackendEig {
    fn eig_general(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError>;
}

// --- NdarrayLinAlgBackend Implementation ---

#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

// Helper to convert ndarray-linalg's error to BackendError
fn to_dyn_error<E: Error + Send + Sync + 'static>(e: E) -> BackendError {
    Box::new(e)
}

impl BackendEigh<f64> for NdarrayLinAlgBackend {
    fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput<f64>, BackendError> {
        let (eigenvalues, eigenvectors) = matrix.eigh(UPLO::Upper).map_err(to_dyn_error)?;
        Ok(EighOutput { eigenvalues, eigenvectors })
    }
}

impl BackendEig for NdarrayLinAlgBackend {
    fn eig_general(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError> {
        let (eigenvalues, eigenvectors) = matrix.eig().map_err(to_dyn_error)?;
        Ok(EigOutput { eigenvalues, eigenvectors })
    }
}

// --- LinAlgBackendProvider Dispatch ---

/// Dispatches to the linear algebra backend selected at compile time.
/// The LAPACK provider itself (OpenBLAS or MKL, static or system) is chosen
/// through the crate's `backend_*` features.
#[derive(Debug, Default, Copy, Clone)]
pub struct LinAlgBackendProvider<F: 'static + Copy + Send + Sync> {
    _phantom: PhantomData<F>,
}

impl<F: 'static + Copy + Send + Sync> LinAlgBackendProvider<F> {
    pub fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

impl<F> BackendEigh<F> for LinAlgBackendProvider<F>
where
    F: 'static + Copy + Send + Sync,
    NdarrayLinAlgBackend: BackendEigh<F>,
{
    fn eigh_upper(&self, matrix: &Array2<F>) -> Result<EighOutput<F>, BackendError> {
        NdarrayLinAlgBackend.eigh_upper(matrix)
    }
}

impl BackendEig for LinAlgBackendProvider<f64> {
    fn eig_general(&self, matrix: &Array2<f64>) -> Result<EigOutput, BackendError> {
        NdarrayLinAlgBackend.eig_general(matrix)
    }
}
