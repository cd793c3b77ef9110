// src/dataset.rs

use crate::error::{EigenfaceError, Result};
use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Supplies the matrices the eigenface pipeline consumes.
///
/// Implementors own dataset acquisition, decoding and the train/test split.
/// All three accessors must agree on the pixel count D = height × width.
pub trait DatasetProvider: Sync {
    /// Training images, shape (M_train, D).
    fn training_images(&self) -> &Array2<f64>;

    /// Held-out images, shape (M_test, D).
    fn testing_images(&self) -> &Array2<f64>;

    /// Mean over the full dataset, computed before splitting. Shape: (D)
    fn mean(&self) -> &Array1<f64>;

    /// (height, width) of a single image.
    fn image_shape(&self) -> (usize, usize);

    fn num_pixels(&self) -> usize {
        let (height, width) = self.image_shape();
        height * width
    }
}

/// How many images the split holds out for testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TestSize {
    Count(usize),
    /// Fraction of all images, rounded to the nearest count.
    Fraction(f64),
}

/// Seeded train/test split parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub test_size: TestSize,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            test_size: TestSize::Fraction(0.2),
            seed: 2025,
        }
    }
}

impl SplitConfig {
    fn test_count(&self, n_images: usize) -> Result<usize> {
        let count = match self.test_size {
            TestSize::Count(count) => count,
            TestSize::Fraction(fraction) => {
                if !(fraction.is_finite() && fraction > 0.0 && fraction < 1.0) {
                    return Err(EigenfaceError::InvalidConfig(format!(
                        "test fraction {} must lie strictly between 0 and 1",
                        fraction
                    )));
                }
                ((n_images as f64) * fraction).round() as usize
            }
        };
        if count == 0 || count >= n_images {
            return Err(EigenfaceError::InvalidConfig(format!(
                "split of {} images with {} held out leaves an empty train or test set",
                n_images, count
            )));
        }
        Ok(count)
    }
}

/// An in-memory dataset of equally sized grayscale images.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    training: Array2<f64>,
    testing: Array2<f64>,
    mean: Array1<f64>,
    image_shape: (usize, usize),
}

impl InMemoryDataset {
    /// Builds a dataset from 8-bit pixel rows of `image_shape` = (height, width).
    ///
    /// The mean is taken over all images before the split. Rows are shuffled
    /// with a `ChaCha8Rng` seeded from `split.seed`; the first held-out count
    /// become the test set, the rest the training set.
    pub fn from_pixels(
        images: &[Vec<u8>],
        image_shape: (usize, usize),
        split: SplitConfig,
    ) -> Result<Self> {
        let n_pixels = image_shape.0 * image_shape.1;
        if images.is_empty() || n_pixels == 0 {
            return Err(EigenfaceError::EmptyInput(format!(
                "{} images of shape {:?}",
                images.len(),
                image_shape
            )));
        }
        if let Some(bad) = images.iter().find(|image| image.len() != n_pixels) {
            return Err(EigenfaceError::shape("dataset: image length", n_pixels, bad.len()));
        }

        let all_images =
            Array2::from_shape_fn((images.len(), n_pixels), |(i, j)| f64::from(images[i][j]));
        let mean = all_images
            .mean_axis(Axis(0))
            .ok_or_else(|| EigenfaceError::EmptyInput("cannot average zero images".into()))?;

        let test_count = split.test_count(images.len())?;
        let mut order: Vec<usize> = (0..images.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(split.seed);
        order.shuffle(&mut rng);
        debug!("Split order for seed {}: {:?}", split.seed, order);

        let testing = all_images.select(Axis(0), &order[..test_count]);
        let training = all_images.select(Axis(0), &order[test_count..]);
        info!(
            "Split {} images into {} training and {} testing (seed {}).",
            images.len(),
            training.nrows(),
            testing.nrows(),
            split.seed
        );

        Ok(Self {
            training,
            testing,
            mean,
            image_shape,
        })
    }

    /// Wraps matrices that were split elsewhere, checking that D agrees everywhere.
    pub fn from_matrices(
        training: Array2<f64>,
        testing: Array2<f64>,
        mean: Array1<f64>,
        image_shape: (usize, usize),
    ) -> Result<Self> {
        let n_pixels = image_shape.0 * image_shape.1;
        if training.ncols() != n_pixels {
            return Err(EigenfaceError::shape(
                "dataset: training width",
                n_pixels,
                training.ncols(),
            ));
        }
        if testing.ncols() != n_pixels {
            return Err(EigenfaceError::shape("dataset: testing width", n_pixels, testing.ncols()));
        }
        if mean.len() != n_pixels {
            return Err(EigenfaceError::shape("dataset: mean vector", n_pixels, mean.len()));
        }
        Ok(Self {
            training,
            testing,
            mean,
            image_shape,
        })
    }
}

impl DatasetProvider for InMemoryDataset {
    fn training_images(&self) -> &Array2<f64> {
        &self.training
    }

    fn testing_images(&self) -> &Array2<f64> {
        &self.testing
    }

    fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    fn image_shape(&self) -> (usize, usize) {
        self.image_shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp_images(count: usize, n_pixels: usize) -> Vec<Vec<u8>> {
        (0..count)
            .map(|i| (0..n_pixels).map(|j| ((i * 13 + j * 7) % 256) as u8).collect())
            .collect()
    }

    #[test]
    fn test_split_sizes_and_mean_over_full_dataset() {
        let images = ramp_images(10, 6);
        let dataset = InMemoryDataset::from_pixels(
            &images,
            (2, 3),
            SplitConfig {
                test_size: TestSize::Count(3),
                seed: 7,
            },
        )
        .unwrap();
        assert_eq!(dataset.training_images().dim(), (7, 6));
        assert_eq!(dataset.testing_images().dim(), (3, 6));
        assert_eq!(dataset.num_pixels(), 6);

        let expected_first = images.iter().map(|img| img[0] as f64).sum::<f64>() / 10.0;
        assert_abs_diff_eq!(dataset.mean()[0], expected_first, epsilon = 1e-12);
    }

    #[test]
    fn test_same_seed_same_split() {
        let images = ramp_images(12, 4);
        let split = SplitConfig {
            test_size: TestSize::Fraction(0.25),
            seed: 99,
        };
        let a = InMemoryDataset::from_pixels(&images, (2, 2), split).unwrap();
        let b = InMemoryDataset::from_pixels(&images, (2, 2), split).unwrap();
        assert_eq!(a.testing_images(), b.testing_images());
        assert_eq!(a.training_images(), b.training_images());
        assert_eq!(a.testing_images().nrows(), 3);
    }

    #[test]
    fn test_ragged_images_rejected() {
        let mut images = ramp_images(4, 4);
        images[2].pop();
        let err =
            InMemoryDataset::from_pixels(&images, (2, 2), SplitConfig::default()).unwrap_err();
        assert!(matches!(err, EigenfaceError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_split_that_empties_a_side_is_rejected() {
        let images = ramp_images(3, 4);
        let split = SplitConfig {
            test_size: TestSize::Count(3),
            seed: 1,
        };
        assert!(matches!(
            InMemoryDataset::from_pixels(&images, (2, 2), split).unwrap_err(),
            EigenfaceError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_out_of_range_fraction_is_invalid_config() {
        let images = ramp_images(10, 4);
        for fraction in [1.5, 0.0, -0.2, f64::NAN] {
            let split = SplitConfig {
                test_size: TestSize::Fraction(fraction),
                seed: 3,
            };
            let err = InMemoryDataset::from_pixels(&images, (2, 2), split).unwrap_err();
            assert!(
                matches!(err, EigenfaceError::InvalidConfig(_)),
                "fraction {} gave {:?}",
                fraction,
                err
            );
        }
    }

    #[test]
    fn test_from_matrices_checks_widths() {
        let err = InMemoryDataset::from_matrices(
            Array2::zeros((3, 4)),
            Array2::zeros((1, 5)),
            Array1::zeros(4),
            (2, 2),
        )
        .unwrap_err();
        assert!(matches!(err, EigenfaceError::ShapeMismatch { .. }));
    }
}
