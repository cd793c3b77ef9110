// src/trainer.rs

use crate::eigenpairs::EigenPairs;
use crate::error::{EigenfaceError, Result};
use crate::linalg_backends::{BackendEig, BackendEigh, LinAlgBackendProvider};
use log::{debug, info, warn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Which LAPACK routine decomposes the covariance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EigenSolverKind {
    /// Symmetric solver (`syevd`). Real eigenvalues, orthonormal eigenvectors.
    #[default]
    Symmetric,
    /// General solver (`geev`). Complex output; rounding can leave small
    /// imaginary parts even though the covariance is symmetric.
    General,
}

/// Configuration for [`Trainer`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub solver: EigenSolverKind,
    /// Wall-clock limit for the eigendecomposition, the only step that is cubic in D.
    /// `None` waits indefinitely.
    pub eigendecomposition_timeout: Option<Duration>,
}

/// Computes the full eigendecomposition of the training covariance matrix.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Centers `training_images` with `mean`, builds the D×D pixel covariance and
    /// returns all D eigenpairs in solver order.
    ///
    /// * `training_images` - shape (M, D), one flattened image per row.
    /// * `mean` - shape (D), the mean over the full dataset, supplied externally.
    ///
    /// # Errors
    /// `EmptyInput` for M = 0 or D = 0, `ShapeMismatch` if `mean.len() != D`,
    /// `ComputeFailure` if the solver fails, times out, or returns non-finite values.
    pub fn train(&self, training_images: &Array2<f64>, mean: &Array1<f64>) -> Result<EigenPairs> {
        let (n_images, n_pixels) = training_images.dim();
        if n_images == 0 || n_pixels == 0 {
            return Err(EigenfaceError::EmptyInput(format!(
                "training matrix has shape ({}, {})",
                n_images, n_pixels
            )));
        }
        if mean.len() != n_pixels {
            return Err(EigenfaceError::shape("train: mean vector", n_pixels, mean.len()));
        }
        info!(
            "Training eigenface subspace on {} images with {} pixels each.",
            n_images, n_pixels
        );

        let covariance_start_time = Instant::now();
        let covariance = covariance_matrix(training_images, mean);
        info!(
            "Computed {}x{} covariance matrix in {:?}",
            n_pixels,
            n_pixels,
            covariance_start_time.elapsed()
        );

        let decomposition_start_time = Instant::now();
        let pairs = self.decompose(covariance)?;
        info!(
            "Computed {:?} eigendecomposition ({} pairs) in {:?}",
            self.config.solver,
            pairs.len(),
            decomposition_start_time.elapsed()
        );
        Ok(pairs)
    }

    fn decompose(&self, covariance: Array2<f64>) -> Result<EigenPairs> {
        let solver = self.config.solver;
        match self.config.eigendecomposition_timeout {
            None => decompose_with(solver, &covariance),
            Some(limit) => run_with_deadline(limit, move || decompose_with(solver, &covariance)),
        }
    }
}

/// Runs `job` on a named worker thread and waits at most `limit` for its result.
///
/// The worker is detached on timeout; LAPACK calls cannot be interrupted.
fn run_with_deadline<F>(limit: Duration, job: F) -> Result<EigenPairs>
where
    F: FnOnce() -> Result<EigenPairs> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("eigendecomposition".into())
        .spawn(move || {
            let _ = sender.send(job());
        })
        .map_err(|e| {
            EigenfaceError::ComputeFailure(format!(
                "failed to spawn eigendecomposition worker: {}",
                e
            ))
        })?;

    match receiver.recv_timeout(limit) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => {
            warn!("Eigendecomposition did not finish within {:?}; abandoning worker.", limit);
            Err(EigenfaceError::ComputeFailure(format!(
                "eigendecomposition exceeded timeout of {:?}",
                limit
            )))
        }
        Err(RecvTimeoutError::Disconnected) => Err(EigenfaceError::ComputeFailure(
            "eigendecomposition worker exited without a result".into(),
        )),
    }
}

/// Trains with the default configuration (symmetric solver, no timeout).
pub fn train(training_images: &Array2<f64>, mean: &Array1<f64>) -> Result<EigenPairs> {
    Trainer::default().train(training_images, mean)
}

/// Sample covariance over pixel columns: `Xcᵀ·Xc / (M - 1)`, where `Xc` is the
/// training matrix centered by `mean`. With a single image the divisor is 1.
pub fn covariance_matrix(training_images: &Array2<f64>, mean: &Array1<f64>) -> Array2<f64> {
    let n_images = training_images.nrows();
    let centered = training_images - mean;
    debug!("Centered training matrix shape: {:?}", centered.dim());
    let mut covariance = centered.t().dot(&centered);
    covariance /= n_images.saturating_sub(1).max(1) as f64;
    covariance
}

fn decompose_with(solver: EigenSolverKind, covariance: &Array2<f64>) -> Result<EigenPairs> {
    let backend = LinAlgBackendProvider::<f64>::new();
    match solver {
        EigenSolverKind::Symmetric => {
            let out = backend.eigh_upper(covariance).map_err(|e| {
                EigenfaceError::ComputeFailure(format!(
                    "eigen decomposition of covariance matrix failed: {}",
                    e
                ))
            })?;
            EigenPairs::from_real(out.eigenvalues, out.eigenvectors, solver)
        }
        EigenSolverKind::General => {
            let out = backend.eig_general(covariance).map_err(|e| {
                EigenfaceError::ComputeFailure(format!(
                    "general eigen decomposition of covariance matrix failed: {}",
                    e
                ))
            })?;
            EigenPairs::from_complex(out.eigenvalues, out.eigenvectors, solver)
        }
    }
}
