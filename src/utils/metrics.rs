//! Metrics Module
//!
//! Running meters and accuracy utilities shared by the training loops and the
//! evaluation pass:
//! - `RunningAverage`: size-weighted (sum, count) accumulator
//! - `MeterSet`: named collection of running averages
//! - `AccuracyTracker`: correct/total accuracy over an epoch
//! - `accuracy_topk`: top-k accuracy percentages for one batch of logits
//! - `hellinger`: distance between two discrete distributions

use std::collections::HashMap;

/// Running average for tracking metrics during training.
///
/// Updates can be weighted: `update(value, n)` counts `value` as the mean of
/// `n` samples, so per-batch percentages aggregate by batch size rather than
/// as an unweighted mean of batches.
#[derive(Debug, Clone, Default)]
pub struct RunningAverage {
    sum: f64,
    count: usize,
}

impl RunningAverage {
    /// Create a new running average
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single value
    pub fn add(&mut self, value: f64) {
        self.update(value, 1);
    }

    /// Add a value that represents the mean of `n` samples
    pub fn update(&mut self, value: f64, n: usize) {
        self.sum += value * n as f64;
        self.count += n;
    }

    /// Get the current average
    pub fn average(&self) -> f64 {
        if self.count > 0 {
            self.sum / self.count as f64
        } else {
            0.0
        }
    }

    /// Get the count
    pub fn count(&self) -> usize {
        self.count
    }

    /// Reset the running average
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

/// Named collection of running averages.
///
/// Created per epoch or per evaluation call, read at the end, then discarded.
#[derive(Debug, Clone, Default)]
pub struct MeterSet {
    meters: HashMap<String, RunningAverage>,
}

impl MeterSet {
    /// Create an empty meter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the named meter with a value representing `n` samples
    pub fn update(&mut self, name: &str, value: f64, n: usize) {
        self.meters
            .entry(name.to_string())
            .or_default()
            .update(value, n);
    }

    /// Average of the named meter, 0.0 if it was never updated
    pub fn average(&self, name: &str) -> f64 {
        self.meters.get(name).map_or(0.0, |m| m.average())
    }

    /// Sample count of the named meter
    pub fn count(&self, name: &str) -> usize {
        self.meters.get(name).map_or(0, |m| m.count())
    }

    /// Meter names in sorted order (for stable display)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.meters.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Accuracy tracker for training (correct / total)
#[derive(Debug, Clone, Default)]
pub struct AccuracyTracker {
    correct: usize,
    total: usize,
}

impl AccuracyTracker {
    /// Create a new accuracy tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a batch of predictions
    pub fn add_batch(&mut self, predictions: &[usize], ground_truth: &[usize]) {
        for (pred, gt) in predictions.iter().zip(ground_truth.iter()) {
            self.total += 1;
            if pred == gt {
                self.correct += 1;
            }
        }
    }

    /// Get the current accuracy
    pub fn accuracy(&self) -> f64 {
        if self.total > 0 {
            self.correct as f64 / self.total as f64
        } else {
            0.0
        }
    }

    /// Get the count
    pub fn count(&self) -> usize {
        self.total
    }

    /// Reset the tracker
    pub fn reset(&mut self) {
        self.correct = 0;
        self.total = 0;
    }
}

/// Top-k accuracy percentages for one batch.
///
/// `logits` holds one row of class scores per example; for each requested `k`
/// the result is the percentage of examples whose true label ranks among the
/// k highest-scoring classes.
pub fn accuracy_topk(logits: &[Vec<f32>], targets: &[usize], topk: &[usize]) -> Vec<f64> {
    let batch_size = targets.len();
    if batch_size == 0 {
        return vec![0.0; topk.len()];
    }

    let maxk = topk.iter().copied().max().unwrap_or(1);

    // Rank class indices per example by descending score, once for the largest k.
    let ranked: Vec<Vec<usize>> = logits
        .iter()
        .map(|row| {
            let mut indexed: Vec<(usize, f32)> =
                row.iter().enumerate().map(|(i, &p)| (i, p)).collect();
            indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
            indexed.iter().take(maxk).map(|(i, _)| *i).collect()
        })
        .collect();

    topk.iter()
        .map(|&k| {
            let correct = ranked
                .iter()
                .zip(targets.iter())
                .filter(|(top, &target)| top.iter().take(k).any(|&idx| idx == target))
                .count();
            correct as f64 * 100.0 / batch_size as f64
        })
        .collect()
}

/// Hellinger distance between two discrete probability distributions.
///
/// Used downstream of feature extraction to compare class distributions.
pub fn hellinger(p: &[f64], q: &[f64]) -> f64 {
    let sum: f64 = p
        .iter()
        .zip(q.iter())
        .map(|(&a, &b)| {
            let d = a.sqrt() - b.sqrt();
            d * d
        })
        .sum();
    sum.sqrt() / std::f64::consts::SQRT_2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_average_unweighted() {
        let mut avg = RunningAverage::new();

        avg.add(1.0);
        avg.add(2.0);
        avg.add(3.0);

        assert_eq!(avg.count(), 3);
        assert!((avg.average() - 2.0).abs() < 0.001);

        avg.reset();
        assert_eq!(avg.count(), 0);
        assert_eq!(avg.average(), 0.0);
    }

    #[test]
    fn test_running_average_weighted() {
        // Two batches: 80% over 10 samples, 100% over 5 samples.
        // The combined average weights by batch size: 13/15 correct.
        let mut avg = RunningAverage::new();
        avg.update(80.0, 10);
        avg.update(100.0, 5);

        assert_eq!(avg.count(), 15);
        assert!((avg.average() - 86.6666).abs() < 0.001);
    }

    #[test]
    fn test_meter_set() {
        let mut meters = MeterSet::new();
        meters.update("top1", 80.0, 10);
        meters.update("top1", 100.0, 5);
        meters.update("top9", 100.0, 15);

        assert!((meters.average("top1") - 86.6666).abs() < 0.001);
        assert_eq!(meters.count("top1"), 15);
        assert_eq!(meters.average("top9"), 100.0);
        assert_eq!(meters.average("missing"), 0.0);
        assert_eq!(meters.names(), vec!["top1", "top9"]);
    }

    #[test]
    fn test_accuracy_tracker() {
        let mut tracker = AccuracyTracker::new();

        tracker.add_batch(&[0, 1, 2], &[0, 1, 0]); // 2 correct out of 3

        assert_eq!(tracker.count(), 3);
        assert!((tracker.accuracy() - 2.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn test_accuracy_topk_all_correct() {
        let logits = vec![vec![0.9, 0.05, 0.05], vec![0.1, 0.8, 0.1]];
        let res = accuracy_topk(&logits, &[0, 1], &[1]);
        assert_eq!(res, vec![100.0]);
    }

    #[test]
    fn test_accuracy_topk_all_wrong() {
        let logits = vec![vec![0.9, 0.05, 0.05], vec![0.1, 0.8, 0.1]];
        let res = accuracy_topk(&logits, &[1, 0], &[1]);
        assert_eq!(res, vec![0.0]);
    }

    #[test]
    fn test_accuracy_topk_multiple_ks() {
        // Row 0's target ranks second, row 1's ranks first:
        // top-1 hits half the rows, top-2 hits them all.
        let logits = vec![vec![0.5, 0.3, 0.2], vec![0.1, 0.2, 0.7]];
        let res = accuracy_topk(&logits, &[1, 2], &[1, 2]);
        assert_eq!(res, vec![50.0, 100.0]);
    }

    #[test]
    fn test_hellinger() {
        let p = vec![0.5, 0.5];
        let q = vec![0.5, 0.5];
        assert!(hellinger(&p, &q).abs() < 1e-12);

        // Disjoint distributions are at maximal distance 1.
        let p = vec![1.0, 0.0];
        let q = vec![0.0, 1.0];
        assert!((hellinger(&p, &q) - 1.0).abs() < 1e-12);
    }
}
