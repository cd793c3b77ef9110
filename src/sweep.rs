// src/sweep.rs

use crate::diagnostics::NumericalHealthWarning;
use crate::eigenpairs::EigenPairs;
use crate::error::{EigenfaceError, Result};
use crate::evaluate::{reconstruct_and_evaluate, ErrorNormalization, ReconstructionResult};
use crate::selector::{ProjectionBasis, SelectorConfig, SubspaceSelector};
use log::{info, trace, warn};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for [`SweepDriver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub normalization: ErrorNormalization,
    /// Evaluate K values on the rayon thread pool. Output order is unaffected.
    pub parallel: bool,
    pub selector: SelectorConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            normalization: ErrorNormalization::PerImage,
            parallel: true,
            selector: SelectorConfig::default(),
        }
    }
}

/// Outcome of one K in a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepEntry {
    pub k: usize,
    /// Reconstruction error, or the error that stopped this K.
    pub outcome: std::result::Result<f64, EigenfaceError>,
    /// Numerical health findings from selecting this K's basis.
    pub warnings: Vec<NumericalHealthWarning>,
}

impl SweepEntry {
    pub fn error(&self) -> Option<f64> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs select → reconstruct → evaluate for each requested K.
#[derive(Debug, Clone, Default)]
pub struct SweepDriver {
    config: SweepConfig,
}

impl SweepDriver {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Selects the K-basis, reconstructs `test_images` through it and scores them.
    ///
    /// # Errors
    /// Any error from selection, reconstruction or evaluation, unchanged.
    pub fn run_k(
        &self,
        pairs: &EigenPairs,
        test_images: &Array2<f64>,
        mean: &Array1<f64>,
        k: usize,
    ) -> Result<(ProjectionBasis, ReconstructionResult)> {
        let basis = SubspaceSelector::new(self.config.selector).select(pairs, k)?;
        let result =
            reconstruct_and_evaluate(test_images, mean, &basis, self.config.normalization)?;
        Ok((basis, result))
    }

    fn sweep_entry(
        &self,
        pairs: &EigenPairs,
        test_images: &Array2<f64>,
        mean: &Array1<f64>,
        k: usize,
    ) -> (SweepEntry, Option<ProjectionBasis>) {
        match self.run_k(pairs, test_images, mean, k) {
            Ok((basis, result)) => {
                trace!("K = {}: error = {}", k, result.error);
                let entry = SweepEntry {
                    k,
                    outcome: Ok(result.error),
                    warnings: basis.warnings().to_vec(),
                };
                (entry, Some(basis))
            }
            Err(e) => {
                warn!("K = {} failed: {}", k, e);
                let entry = SweepEntry {
                    k,
                    outcome: Err(e),
                    warnings: Vec::new(),
                };
                (entry, None)
            }
        }
    }

    /// Computes the reconstruction error of `test_images` for every K in `ks`.
    ///
    /// The output has one entry per element of `ks`, in the same order,
    /// duplicates included. A K that fails records its error in its entry and
    /// the remaining K values are still computed.
    ///
    /// # Errors
    /// Shape problems with `test_images` or `mean` would fail every K the same
    /// way, so they are reported once for the whole call: `ShapeMismatch` if D
    /// disagrees with the eigenpairs, `EmptyInput` if there are no test images.
    pub fn sweep(
        &self,
        pairs: &EigenPairs,
        test_images: &Array2<f64>,
        mean: &Array1<f64>,
        ks: &[usize],
    ) -> Result<Vec<SweepEntry>> {
        let entries = self
            .sweep_with_bases(pairs, test_images, mean, ks)?
            .into_iter()
            .map(|(entry, _)| entry)
            .collect();
        Ok(entries)
    }

    /// Like [`SweepDriver::sweep`], but also hands back the basis selected for
    /// each K. The basis is `Some` exactly when the entry succeeded.
    pub fn sweep_with_bases(
        &self,
        pairs: &EigenPairs,
        test_images: &Array2<f64>,
        mean: &Array1<f64>,
        ks: &[usize],
    ) -> Result<Vec<(SweepEntry, Option<ProjectionBasis>)>> {
        let d = pairs.dimension();
        if test_images.ncols() != d {
            return Err(EigenfaceError::shape("sweep: test image width", d, test_images.ncols()));
        }
        if mean.len() != d {
            return Err(EigenfaceError::shape("sweep: mean vector", d, mean.len()));
        }
        if test_images.nrows() == 0 {
            return Err(EigenfaceError::EmptyInput("sweep: no test images".into()));
        }

        info!(
            "Sweeping {} K values over {} test images ({}).",
            ks.len(),
            test_images.nrows(),
            if self.config.parallel { "parallel" } else { "sequential" }
        );
        let sweep_start_time = Instant::now();
        let results: Vec<(SweepEntry, Option<ProjectionBasis>)> = if self.config.parallel {
            ks.par_iter()
                .map(|&k| self.sweep_entry(pairs, test_images, mean, k))
                .collect()
        } else {
            ks.iter()
                .map(|&k| self.sweep_entry(pairs, test_images, mean, k))
                .collect()
        };
        let failures = results.iter().filter(|(entry, _)| !entry.is_ok()).count();
        info!(
            "Sweep finished in {:?}: {} succeeded, {} failed.",
            sweep_start_time.elapsed(),
            results.len() - failures,
            failures
        );
        Ok(results)
    }
}

/// Sweeps with the default configuration.
pub fn sweep(
    pairs: &EigenPairs,
    test_images: &Array2<f64>,
    mean: &Array1<f64>,
    ks: &[usize],
) -> Result<Vec<SweepEntry>> {
    SweepDriver::default().sweep(pairs, test_images, mean, ks)
}
