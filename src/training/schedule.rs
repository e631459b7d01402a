//! Learning Rate Schedule Module
//!
//! Cosine rampdown scheduling for the semi-supervised training loop. The
//! learning rate is recomputed at every training step from the fractional
//! epoch, so the decay is smooth within an epoch rather than stepped at
//! epoch boundaries.

use serde::{Deserialize, Serialize};

use crate::utils::error::{GtzanError, Result};

/// Cosine rampdown factor in [0, 1].
///
/// Returns `0.5 * (cos(pi * current / rampdown_length) + 1)`: 1.0 at the
/// start of training, 0.0 when `current` reaches `rampdown_length`.
/// `current` outside `[0, rampdown_length]` is a configuration error, not a
/// value to clamp; a caller that gets here has miscounted its epochs.
pub fn cosine_rampdown(current: f64, rampdown_length: f64) -> Result<f64> {
    if !(rampdown_length > 0.0 && rampdown_length.is_finite()) {
        return Err(GtzanError::Config(format!(
            "rampdown length must be a positive finite number, got {}",
            rampdown_length
        )));
    }

    if !(0.0..=rampdown_length).contains(&current) {
        return Err(GtzanError::Config(format!(
            "cosine rampdown position {} is outside [0, {}]",
            current, rampdown_length
        )));
    }

    Ok(0.5 * ((std::f64::consts::PI * current / rampdown_length).cos() + 1.0))
}

/// Learning rate schedule for semi-supervised training.
///
/// With `rampdown_epochs` set, the rate follows a cosine rampdown from
/// `base_lr` at epoch 0 towards zero at the rampdown horizon; without it the
/// rate stays constant at `base_lr`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LrSchedule {
    /// Learning rate at the start of training
    pub base_lr: f64,

    /// Cosine rampdown horizon in epochs; None keeps the rate constant
    pub rampdown_epochs: Option<usize>,
}

impl LrSchedule {
    /// Create a new schedule
    pub fn new(base_lr: f64, rampdown_epochs: Option<usize>) -> Self {
        Self {
            base_lr,
            rampdown_epochs,
        }
    }

    /// Learning rate for a specific step within an epoch.
    ///
    /// The schedule is evaluated at the fractional epoch
    /// `epoch + step / steps_per_epoch`, so consecutive steps see strictly
    /// decreasing rates rather than one rate per epoch.
    pub fn lr_at(&self, epoch: usize, step: usize, steps_per_epoch: usize) -> Result<f64> {
        let Some(rampdown) = self.rampdown_epochs else {
            return Ok(self.base_lr);
        };

        if steps_per_epoch == 0 {
            return Err(GtzanError::Config(
                "steps_per_epoch must be greater than 0".to_string(),
            ));
        }

        let fractional_epoch = epoch as f64 + (step as f64 / steps_per_epoch as f64);
        let factor = cosine_rampdown(fractional_epoch, rampdown as f64)?;
        Ok(self.base_lr * factor)
    }

    /// Get a description of the schedule
    pub fn description(&self) -> String {
        match self.rampdown_epochs {
            Some(rampdown) => format!(
                "Cosine Rampdown: base={:.6}, horizon={} epochs",
                self.base_lr, rampdown
            ),
            None => format!("Constant LR: {:.6}", self.base_lr),
        }
    }
}
