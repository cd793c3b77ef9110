// Eigenface subspaces via principal component analysis

#![doc = include_str!("../README.md")]

pub mod dataset;
pub mod diagnostics;
pub mod display;
pub mod eigenpairs;
pub mod error;
pub mod evaluate;
pub mod experiment;
pub mod linalg_backends;
pub mod reconstruct;
pub mod selector;
pub mod sweep;
pub mod trainer;

pub use dataset::{DatasetProvider, InMemoryDataset, SplitConfig, TestSize};
pub use diagnostics::NumericalHealthWarning;
pub use eigenpairs::EigenPairs;
pub use error::{EigenfaceError, Result};
pub use evaluate::{evaluate, ErrorNormalization, ReconstructionResult};
pub use experiment::{Experiment, ExperimentConfig, ExperimentReport, PreviewReconstruction};
pub use reconstruct::{project, reconstruct};
pub use selector::{select, ProjectionBasis, SelectorConfig, SubspaceSelector};
pub use sweep::{sweep, SweepConfig, SweepDriver, SweepEntry};
pub use trainer::{train, EigenSolverKind, Trainer, TrainerConfig};
