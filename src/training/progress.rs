//! Training Progress Reporting
//!
//! The training loops report through a sink trait instead of writing to the
//! console directly, so tests can run silently and capture the stream of
//! updates. `ConsoleSink` is the interactive implementation with an
//! indicatif progress bar per epoch.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// One per-step progress update
#[derive(Debug, Clone, PartialEq)]
pub struct StepUpdate {
    /// Epoch index (0-based)
    pub epoch: usize,
    /// Step index within the epoch (0-based)
    pub step: usize,
    /// Steps in this epoch
    pub steps_per_epoch: usize,
    /// Loss of this step
    pub loss: f64,
    /// Running average loss over the epoch so far
    pub avg_loss: f64,
    /// Learning rate used for this step
    pub lr: f64,
}

/// Receiver for training progress events.
///
/// All methods default to no-ops; implement only what the frontend needs.
pub trait TrainingSink {
    /// An epoch is about to start
    fn epoch_start(&mut self, _epoch: usize, _total_epochs: usize, _steps_per_epoch: usize) {}

    /// One training step finished
    fn step(&mut self, _update: &StepUpdate) {}

    /// An epoch finished with the given average loss
    fn epoch_end(&mut self, _epoch: usize, _avg_loss: f64) {}
}

/// Sink that discards all updates (tests, benchmarks)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TrainingSink for NullSink {}

/// Console sink with a per-epoch progress bar
#[derive(Debug, Default)]
pub struct ConsoleSink {
    bar: Option<ProgressBar>,
}

impl ConsoleSink {
    /// Create a new console sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrainingSink for ConsoleSink {
    fn epoch_start(&mut self, epoch: usize, total_epochs: usize, steps_per_epoch: usize) {
        println!(
            "{}",
            format!("Epoch {}/{}", epoch + 1, total_epochs).cyan().bold()
        );

        let bar = ProgressBar::new(steps_per_epoch as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        self.bar = Some(bar);
    }

    fn step(&mut self, update: &StepUpdate) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!(
                "loss = {:.4} (avg {:.4}), lr = {:.6}",
                update.loss, update.avg_loss, update.lr
            ));
            bar.inc(1);
        }
    }

    fn epoch_end(&mut self, _epoch: usize, avg_loss: f64) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        println!("  {} Avg Loss: {:.4}", "→".cyan(), avg_loss);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        epochs_started: Vec<usize>,
        steps: Vec<StepUpdate>,
        epochs_ended: Vec<(usize, f64)>,
    }

    impl TrainingSink for RecordingSink {
        fn epoch_start(&mut self, epoch: usize, _total: usize, _steps: usize) {
            self.epochs_started.push(epoch);
        }

        fn step(&mut self, update: &StepUpdate) {
            self.steps.push(update.clone());
        }

        fn epoch_end(&mut self, epoch: usize, avg_loss: f64) {
            self.epochs_ended.push((epoch, avg_loss));
        }
    }

    #[test]
    fn test_sink_receives_updates_in_order() {
        let mut sink = RecordingSink::default();

        sink.epoch_start(0, 2, 3);
        for step in 0..3 {
            sink.step(&StepUpdate {
                epoch: 0,
                step,
                steps_per_epoch: 3,
                loss: 1.0,
                avg_loss: 1.0,
                lr: 5e-4,
            });
        }
        sink.epoch_end(0, 1.0);

        assert_eq!(sink.epochs_started, vec![0]);
        assert_eq!(sink.steps.len(), 3);
        assert_eq!(sink.epochs_ended, vec![(0, 1.0)]);
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullSink;
        sink.epoch_start(0, 1, 1);
        sink.step(&StepUpdate {
            epoch: 0,
            step: 0,
            steps_per_epoch: 1,
            loss: 0.5,
            avg_loss: 0.5,
            lr: 1e-3,
        });
        sink.epoch_end(0, 0.5);
    }
}
