//! Model module for CNN architectures using the Burn framework
//!
//! This module provides:
//! - The genre classifier CNN over spectrogram images
//! - Model configuration and hyperparameters
//!
//! ## Architecture
//!
//! The model is a convolutional neural network designed for:
//! - 10-class music genre classification on GTZAN spectrograms
//! - Dual outputs: class logits plus a penultimate embedding for
//!   feature extraction and label propagation experiments

pub mod cnn;

// Re-export main types for convenience
pub use cnn::{ClassifierOutput, GenreClassifier, GenreClassifierConfig};

/// Default dropout rate for regularization
pub const DEFAULT_DROPOUT: f64 = 0.3;

/// Default number of classes for GTZAN
pub const DEFAULT_NUM_CLASSES: usize = 10;
