//! Index sampling for semi-supervised training
//!
//! Two layers: `EternalSampler` turns the small labeled pool into an
//! inexhaustible shuffled index stream, and `FixedRatioSampler` pairs it with
//! a finite per-epoch enumeration of the unlabeled pool so that every
//! training step sees the same labeled/unlabeled ratio.

pub mod eternal;
pub mod ratio;

pub use eternal::EternalSampler;
pub use ratio::{BatchPair, FixedRatioSampler};
