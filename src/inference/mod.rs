//! Forward-Only Passes
//!
//! Everything here runs the model without gradient tracking:
//!
//! - [`evaluate`]: top-1/top-k accuracy over a held-out split
//! - [`features`]: embedding extraction for downstream label propagation
//!
//! Both take the non-autodiff model; training code converts with
//! `model.valid()` before calling in.

pub mod evaluate;
pub mod features;

pub use evaluate::{evaluate, EvalReport};
pub use features::{extract_features, FeatureMatrix};
