//! # GTZAN Semi-Supervised Learning
//!
//! A Rust library for semi-supervised music genre classification using the Burn framework.
//! Trains a CNN over GTZAN spectrogram images from a small labeled subset plus
//! a large unlabeled pool, pairing every training step at a fixed
//! labeled/unlabeled ratio and mixing the combined batch with mixup.
//!
//! ## Features
//!
//! - **Semi-supervised mixup training** with an eternal labeled stream, fixed-ratio
//!   batch pairing, and one shared mixup draw per step across all augmented views
//! - **Burn framework** for portable, efficient neural network training and inference
//! - **Supervised baseline** over the same splits for like-for-like comparison
//! - **GTZAN dataset** support with 10 genre classes rendered as spectrograms
//!
//! ## Modules
//!
//! - `dataset`: Disk loading, label-file splits, augmented multi-view items, batchers
//! - `sampler`: Eternal shuffled sampling and fixed-ratio batch pairing
//! - `model`: CNN architecture built with Burn
//! - `training`: Semi-supervised and supervised loops, mixup, LR scheduling
//! - `inference`: Evaluation and embedding extraction
//! - `utils`: Logging, metrics, and error handling
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gtzan_ssl::backend::TrainingBackend;
//! use gtzan_ssl::config::SemiSupervisedConfig;
//! use gtzan_ssl::training::{run_semi_supervised, ConsoleSink};
//!
//! let config = SemiSupervisedConfig::default();
//! let mut sink = ConsoleSink::new();
//! run_semi_supervised::<TrainingBackend>(
//!     "data/gtzan/train",
//!     "data/gtzan/test",
//!     "data/gtzan/labels/train.txt",
//!     &config,
//!     "output/run1",
//!     &mut sink,
//! )?;
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod sampler;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
pub use config::{SemiSupervisedConfig, SupervisedConfig};
pub use dataset::loader::{DatasetStats, GtzanDataset};
pub use dataset::split::IndexSplit;
pub use dataset::{
    EvalBatch, EvalBatcher, EvalItem, MultiViewBatch, MultiViewBatcher, MultiViewDataset,
    MultiViewItem, SingleViewDataset, GENRES,
};
pub use inference::{evaluate, extract_features, EvalReport, FeatureMatrix};
pub use model::cnn::{GenreClassifier, GenreClassifierConfig};
pub use sampler::{EternalSampler, FixedRatioSampler};
pub use training::{
    run_semi_supervised, run_supervised, ConsoleSink, LrSchedule, MixupRng, NullSink,
    SemiSupervisedTrainer, SupervisedTrainer, TrainingSink,
};
pub use utils::error::{GtzanError, Result};

/// GTZAN genre classes (10 total)
pub const NUM_CLASSES: usize = 10;

/// Default image size for GTZAN spectrogram renders
pub const IMAGE_SIZE: usize = 128;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
