// src/experiment.rs

use crate::dataset::DatasetProvider;
use crate::eigenpairs::EigenPairs;
use crate::error::{EigenfaceError, Result};
use crate::reconstruct::reconstruct;
use crate::selector::SubspaceSelector;
use crate::sweep::{SweepConfig, SweepDriver, SweepEntry};
use crate::trainer::{Trainer, TrainerConfig};
use log::info;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Everything needed to run train → sweep over a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub trainer: TrainerConfig,
    pub sweep: SweepConfig,
    /// K values to evaluate, in reporting order.
    pub ks: Vec<usize>,
    /// Number of leading eigenfaces to return for display.
    pub eigenface_preview: usize,
    /// Test-row indices whose reconstructions are returned for every successful K.
    pub reconstruction_preview: Vec<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            trainer: TrainerConfig::default(),
            sweep: SweepConfig::default(),
            ks: vec![10, 50, 100, 200, 300, 400, 500],
            eigenface_preview: 10,
            reconstruction_preview: Vec::new(),
        }
    }
}

/// Reconstructions of the preview rows at one K, unclipped.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReconstruction {
    pub k: usize,
    /// Shape: (preview rows, D)
    pub images: Array2<f64>,
}

/// Results of one experiment run.
#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub eigen_pairs: EigenPairs,
    /// Leading eigenfaces as columns. Shape: (D, min(eigenface_preview, D))
    pub eigenfaces: Array2<f64>,
    /// (K, error) in the order of `ExperimentConfig::ks`.
    pub curve: Vec<SweepEntry>,
    pub reconstructions: Vec<PreviewReconstruction>,
}

impl ExperimentReport {
    /// `(K, error)` pairs of the K values that succeeded, for plotting.
    pub fn error_curve(&self) -> Vec<(usize, f64)> {
        self.curve
            .iter()
            .filter_map(|entry| entry.error().map(|error| (entry.k, error)))
            .collect()
    }
}

/// Trains on a dataset and evaluates reconstruction error over a list of K.
#[derive(Debug, Clone, Default)]
pub struct Experiment {
    config: ExperimentConfig,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn run<P: DatasetProvider>(&self, dataset: &P) -> Result<ExperimentReport> {
        let run_start_time = Instant::now();
        let test_images = dataset.testing_images();
        let mean = dataset.mean();
        if let Some(&bad) = self
            .config
            .reconstruction_preview
            .iter()
            .find(|&&row| row >= test_images.nrows())
        {
            return Err(EigenfaceError::shape(
                "experiment: preview row index",
                format!("< {}", test_images.nrows()),
                bad,
            ));
        }

        let eigen_pairs =
            Trainer::new(self.config.trainer.clone()).train(dataset.training_images(), mean)?;
        let driver = SweepDriver::new(self.config.sweep.clone());
        let swept = driver.sweep_with_bases(&eigen_pairs, test_images, mean, &self.config.ks)?;

        let preview_count = self.config.eigenface_preview.min(eigen_pairs.len());
        let eigenfaces = if preview_count == 0 {
            Array2::zeros((eigen_pairs.dimension(), 0))
        } else {
            SubspaceSelector::new(self.config.sweep.selector)
                .select(&eigen_pairs, preview_count)?
                .leading_columns(preview_count)
                .to_owned()
        };

        let mut reconstructions = Vec::new();
        if !self.config.reconstruction_preview.is_empty() {
            let preview_rows = test_images.select(Axis(0), &self.config.reconstruction_preview);
            for (entry, basis) in &swept {
                if let Some(basis) = basis {
                    reconstructions.push(PreviewReconstruction {
                        k: entry.k,
                        images: reconstruct(&preview_rows, mean, basis.vectors())?,
                    });
                }
            }
        }
        let curve: Vec<SweepEntry> = swept.into_iter().map(|(entry, _)| entry).collect();

        info!("Experiment finished in {:?}", run_start_time.elapsed());
        Ok(ExperimentReport {
            eigen_pairs,
            eigenfaces,
            curve,
            reconstructions,
        })
    }
}
