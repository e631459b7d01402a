//! Training Configuration Module
//!
//! Configuration structures for the semi-supervised and supervised training
//! paths. Every invalid combination is rejected by `validate()` before any
//! epoch starts; the training loops assume a validated config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{GtzanError, Result};

/// Configuration for semi-supervised mixup training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemiSupervisedConfig {
    /// Combined batch size (labeled + unlabeled) per step
    pub batch_size: usize,

    /// Labeled examples per step; the remaining `batch_size - labeled_batch_size`
    /// slots are filled from the unlabeled pool
    pub labeled_batch_size: usize,

    /// Number of independently augmented views per example
    pub aug_num: usize,

    /// Beta(alpha, alpha) parameter for the mixup coefficient
    pub alpha: f64,

    /// Base learning rate
    pub base_lr: f64,

    /// Weight decay (L2 regularization) for the optimizer
    pub weight_decay: f64,

    /// Number of training epochs
    pub epochs: usize,

    /// Cosine rampdown horizon in epochs; None disables the schedule.
    /// When set, must be >= `epochs` so the fractional epoch stays in range.
    pub rampdown_epochs: Option<usize>,

    /// k for the top-k evaluation metric (9 for the 10-genre setup)
    pub topk: usize,

    /// Random seed for shuffles and mixup draws
    pub seed: u64,
}

impl Default for SemiSupervisedConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            labeled_batch_size: 4,
            aug_num: 2,
            alpha: 1.0,
            base_lr: 5e-4,
            weight_decay: 1e-4,
            epochs: 30,
            rampdown_epochs: None,
            topk: 9,
            seed: 42,
        }
    }
}

impl SemiSupervisedConfig {
    /// Fast config for debugging and tests
    pub fn debug() -> Self {
        Self {
            batch_size: 8,
            labeled_batch_size: 2,
            aug_num: 2,
            alpha: 1.0,
            base_lr: 5e-4,
            weight_decay: 0.0,
            epochs: 2,
            rampdown_epochs: Some(2),
            topk: 9,
            seed: 42,
        }
    }

    /// Number of unlabeled examples per step
    pub fn unlabeled_batch_size(&self) -> usize {
        self.batch_size - self.labeled_batch_size
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(GtzanError::Config("batch_size must be greater than 0".to_string()));
        }

        if self.labeled_batch_size == 0 {
            return Err(GtzanError::Config(
                "labeled_batch_size must be greater than 0".to_string(),
            ));
        }

        if self.labeled_batch_size >= self.batch_size {
            return Err(GtzanError::Config(format!(
                "labeled_batch_size ({}) must be smaller than batch_size ({}) to leave room for unlabeled examples",
                self.labeled_batch_size, self.batch_size
            )));
        }

        if self.aug_num == 0 {
            return Err(GtzanError::Config("aug_num must be at least 1".to_string()));
        }

        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return Err(GtzanError::Config(format!(
                "alpha must be a positive finite number, got {}",
                self.alpha
            )));
        }

        if !(self.base_lr > 0.0 && self.base_lr.is_finite()) {
            return Err(GtzanError::Config(format!(
                "base_lr must be a positive finite number, got {}",
                self.base_lr
            )));
        }

        if self.weight_decay < 0.0 || !self.weight_decay.is_finite() {
            return Err(GtzanError::Config(format!(
                "weight_decay must be non-negative, got {}",
                self.weight_decay
            )));
        }

        if self.epochs == 0 {
            return Err(GtzanError::Config("epochs must be at least 1".to_string()));
        }

        if let Some(rampdown) = self.rampdown_epochs {
            if rampdown < self.epochs {
                return Err(GtzanError::Config(format!(
                    "rampdown_epochs ({}) must cover all {} training epochs",
                    rampdown, self.epochs
                )));
            }
        }

        if self.topk == 0 {
            return Err(GtzanError::Config("topk must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

/// Configuration for the supervised baseline path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisedConfig {
    /// Batch size
    pub batch_size: usize,

    /// Learning rate for the baseline Adam optimizer
    pub learning_rate: f64,

    /// Weight decay (L2 regularization)
    pub weight_decay: f64,

    /// Number of training epochs
    pub epochs: usize,

    /// Random seed for epoch shuffles
    pub seed: u64,
}

impl Default for SupervisedConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            learning_rate: 5e-4,
            weight_decay: 1e-4,
            epochs: 30,
            seed: 42,
        }
    }
}

impl SupervisedConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(GtzanError::Config("batch_size must be greater than 0".to_string()));
        }

        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(GtzanError::Config(format!(
                "learning_rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }

        if self.epochs == 0 {
            return Err(GtzanError::Config("epochs must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SemiSupervisedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.unlabeled_batch_size(), 12);
        assert_eq!(config.topk, 9);
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let config = SemiSupervisedConfig {
            labeled_batch_size: 16,
            batch_size: 16,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GtzanError::Config(_))));

        let config = SemiSupervisedConfig {
            labeled_batch_size: 20,
            batch_size: 16,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let config = SemiSupervisedConfig {
            alpha: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SemiSupervisedConfig {
            alpha: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rampdown_must_cover_epochs() {
        let config = SemiSupervisedConfig {
            epochs: 30,
            rampdown_epochs: Some(20),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SemiSupervisedConfig {
            epochs: 30,
            rampdown_epochs: Some(35),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_aug_num_zero_rejected() {
        let config = SemiSupervisedConfig {
            aug_num: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = SemiSupervisedConfig {
            batch_size: 32,
            labeled_batch_size: 8,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = SemiSupervisedConfig::load(&path).unwrap();
        assert_eq!(loaded.batch_size, 32);
        assert_eq!(loaded.labeled_batch_size, 8);
    }

    #[test]
    fn test_supervised_config() {
        let config = SupervisedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.learning_rate, 5e-4);

        let bad = SupervisedConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
