//! Error Handling Module
//!
//! Defines custom error types for the GTZAN SSL library.
//! Uses thiserror for ergonomic error definitions.
//!
//! Configuration problems are surfaced before any training starts and are
//! never retried. Numerical failures carry the epoch and step at which they
//! occurred so a run can be reproduced.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for GTZAN SSL operations
#[derive(Error, Debug)]
pub enum GtzanError {
    /// Invalid configuration (bad batch ratio, alpha, rampdown horizon, empty index sets)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error with dataset operations (missing directories, malformed label files)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    Image(PathBuf, String),

    /// Numerical failure during training (non-finite loss or mixup coefficient).
    /// Propagated, never retried: a silent retry would break the shared-draw
    /// guarantee of the mixup step.
    #[error("Numerical error at epoch {epoch}, step {step}: {message}")]
    Numeric {
        epoch: usize,
        step: usize,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GtzanError {
    /// Shorthand for a numerical failure annotated with its position in the run
    pub fn numeric(epoch: usize, step: usize, message: impl Into<String>) -> Self {
        Self::Numeric {
            epoch,
            step,
            message: message.into(),
        }
    }
}

/// Convenience Result type for GTZAN SSL operations
pub type Result<T> = std::result::Result<T, GtzanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GtzanError::Config("labeled_batch_size must be smaller than batch_size".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: labeled_batch_size must be smaller than batch_size"
        );
    }

    #[test]
    fn test_image_error_includes_path() {
        let path = PathBuf::from("/data/gtzan/blues/blues.00001.png");
        let err = GtzanError::Image(path, "file not found".to_string());
        assert!(format!("{}", err).contains("blues.00001.png"));
    }

    #[test]
    fn test_numeric_error_carries_position() {
        let err = GtzanError::numeric(3, 17, "loss is NaN");
        let msg = format!("{}", err);
        assert!(msg.contains("epoch 3"));
        assert!(msg.contains("step 17"));
    }

    #[test]
    fn test_io_error_conversion() {
        fn read() -> Result<String> {
            let contents = std::fs::read_to_string("/definitely/not/a/file")?;
            Ok(contents)
        }
        assert!(matches!(read(), Err(GtzanError::Io(_))));
    }
}
