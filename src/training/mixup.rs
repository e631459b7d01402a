//! Mixup Combination Module
//!
//! Builds the interpolated inputs and paired targets for one semi-supervised
//! training step. One `MixupDraw` (interpolation coefficient λ plus a
//! permutation π of the combined batch) is sampled per step and shared by
//! every augmented view and both loss terms; drawing per view would decouple
//! the views and break the convex combination of the two losses.

use burn::prelude::*;
use burn::tensor::activation::log_softmax;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution};

use crate::dataset::batcher::MultiViewBatch;
use crate::utils::error::{GtzanError, Result};

/// One per-step randomness draw: λ from Beta(α, α) plus a permutation of the
/// combined batch
#[derive(Debug, Clone, PartialEq)]
pub struct MixupDraw {
    /// Interpolation coefficient in [0, 1]
    pub lam: f64,
    /// Permutation over `0..batch_size`
    pub perm: Vec<usize>,
}

/// Source of per-step mixup draws.
///
/// Seeded once per training run; consecutive `draw` calls advance one
/// deterministic stream, so a run is reproducible from its seed.
#[derive(Debug, Clone)]
pub struct MixupRng {
    beta: Beta<f64>,
    batch_size: usize,
    rng: ChaCha8Rng,
}

impl MixupRng {
    /// Create a draw source for Beta(alpha, alpha) and the given combined
    /// batch size.
    ///
    /// `alpha` must be positive and finite; this is the only place it is
    /// checked, the per-step path assumes a valid distribution.
    pub fn new(alpha: f64, batch_size: usize, seed: u64) -> Result<Self> {
        if !(alpha > 0.0 && alpha.is_finite()) {
            return Err(GtzanError::Config(format!(
                "mixup alpha must be a positive finite number, got {}",
                alpha
            )));
        }

        if batch_size == 0 {
            return Err(GtzanError::Config(
                "mixup batch_size must be greater than 0".to_string(),
            ));
        }

        let beta = Beta::new(alpha, alpha).map_err(|e| {
            GtzanError::Config(format!("invalid Beta({}, {}) distribution: {}", alpha, alpha, e))
        })?;

        Ok(Self {
            beta,
            batch_size,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Sample the (λ, π) pair for one training step.
    ///
    /// A non-finite λ is a numerical failure at this (epoch, step) and is
    /// propagated; retrying would silently fork the random stream.
    pub fn draw(&mut self, epoch: usize, step: usize) -> Result<MixupDraw> {
        let lam = self.beta.sample(&mut self.rng);
        if !lam.is_finite() {
            return Err(GtzanError::numeric(
                epoch,
                step,
                format!("mixup coefficient is not finite: {}", lam),
            ));
        }

        let mut perm: Vec<usize> = (0..self.batch_size).collect();
        perm.shuffle(&mut self.rng);

        Ok(MixupDraw { lam, perm })
    }
}

/// Mixed inputs and paired targets for one training step
#[derive(Debug, Clone)]
pub struct MixedStep<B: Backend> {
    /// One mixed tensor per view index, each [batch_size, 3, H, W]
    pub views: Vec<Tensor<B, 4>>,
    /// Targets in batch order
    pub target_a: Tensor<B, 1, Int>,
    /// Targets in permuted order
    pub target_b: Tensor<B, 1, Int>,
    /// The shared interpolation coefficient
    pub lam: f64,
}

/// Combine a labeled and an unlabeled batch under one mixup draw.
///
/// For every view index v: `mixed_v = λ·x_v + (1-λ)·x_v[π]` where
/// `x_v = concat(labeled.views[v], unlabeled.views[v])`. The same π and λ
/// apply to all views, and the targets are permuted with the same π, so the
/// two loss terms stay paired row-for-row across views.
pub fn combine<B: Backend>(
    labeled: &MultiViewBatch<B>,
    unlabeled: &MultiViewBatch<B>,
    draw: &MixupDraw,
) -> Result<MixedStep<B>> {
    if labeled.num_views() == 0 || labeled.num_views() != unlabeled.num_views() {
        return Err(GtzanError::Config(format!(
            "view count mismatch: labeled batch has {}, unlabeled batch has {}",
            labeled.num_views(),
            unlabeled.num_views()
        )));
    }

    let combined = labeled.batch_size() + unlabeled.batch_size();
    if draw.perm.len() != combined {
        return Err(GtzanError::Config(format!(
            "permutation covers {} rows but the combined batch has {}",
            draw.perm.len(),
            combined
        )));
    }

    let device = labeled.targets.device();
    let perm_data: Vec<i64> = draw.perm.iter().map(|&i| i as i64).collect();
    let perm = Tensor::<B, 1, Int>::from_data(TensorData::new(perm_data, [combined]), &device);

    let target_a = Tensor::cat(
        vec![labeled.targets.clone(), unlabeled.targets.clone()],
        0,
    );
    let target_b = target_a.clone().select(0, perm.clone());

    let views = labeled
        .views
        .iter()
        .zip(unlabeled.views.iter())
        .map(|(l, u)| {
            let x = Tensor::cat(vec![l.clone(), u.clone()], 0);
            let permuted = x.clone().select(0, perm.clone());
            x.mul_scalar(draw.lam) + permuted.mul_scalar(1.0 - draw.lam)
        })
        .collect();

    Ok(MixedStep {
        views,
        target_a,
        target_b,
        lam: draw.lam,
    })
}

/// Elementwise cross-entropy: one loss value per example, shape [batch_size]
pub fn cross_entropy_each<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);
    let targets_expanded = targets.unsqueeze_dim::<2>(1);
    log_probs.gather(1, targets_expanded).squeeze::<1>(1).neg()
}

/// Mixup loss for one view: `λ·ce(pred, target_a) + (1-λ)·ce(pred, target_b)`,
/// each term the mean of the elementwise cross-entropy over the batch
pub fn mixup_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    target_a: Tensor<B, 1, Int>,
    target_b: Tensor<B, 1, Int>,
    lam: f64,
) -> Tensor<B, 1> {
    let loss_a = cross_entropy_each(logits.clone(), target_a).mean();
    let loss_b = cross_entropy_each(logits, target_b).mean();
    loss_a.mul_scalar(lam) + loss_b.mul_scalar(1.0 - lam)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::nn::loss::CrossEntropyLossConfig;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;
    type TestDevice = <TestBackend as Backend>::Device;

    fn constant_batch(fills: &[f32], labels: &[i64], views: usize, device: &TestDevice) -> MultiViewBatch<TestBackend> {
        let n = fills.len();
        let view_tensors = (0..views)
            .map(|_| {
                let data: Vec<f32> = fills.iter().flat_map(|&f| vec![f; 3 * 2 * 2]).collect();
                Tensor::from_floats(TensorData::new(data, [n, 3, 2, 2]), device)
            })
            .collect();

        MultiViewBatch {
            views: view_tensors,
            targets: Tensor::from_data(TensorData::new(labels.to_vec(), [n]), device),
        }
    }

    #[test]
    fn test_draw_permutation_is_valid() {
        let mut rng = MixupRng::new(1.0, 16, 42).unwrap();
        let draw = rng.draw(0, 0).unwrap();

        assert!((0.0..=1.0).contains(&draw.lam));

        let mut sorted = draw.perm.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_draws_are_deterministic() {
        let mut a = MixupRng::new(1.0, 8, 7).unwrap();
        let mut b = MixupRng::new(1.0, 8, 7).unwrap();

        for step in 0..5 {
            assert_eq!(a.draw(0, step).unwrap(), b.draw(0, step).unwrap());
        }
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        assert!(MixupRng::new(0.0, 16, 42).is_err());
        assert!(MixupRng::new(-1.0, 16, 42).is_err());
        assert!(MixupRng::new(f64::NAN, 16, 42).is_err());
        assert!(MixupRng::new(f64::INFINITY, 16, 42).is_err());
    }

    #[test]
    fn test_combine_applies_the_same_draw_to_every_view() {
        let device = TestDevice::default();
        let labeled = constant_batch(&[1.0, 2.0], &[0, 1], 2, &device);
        let unlabeled = constant_batch(&[3.0, 4.0], &[2, 3], 2, &device);

        let draw = MixupDraw {
            lam: 0.25,
            perm: vec![2, 0, 3, 1],
        };

        let step = combine(&labeled, &unlabeled, &draw).unwrap();
        assert_eq!(step.views.len(), 2);

        // Combined fills are [1, 2, 3, 4]; row i mixes fill[i] with fill[perm[i]]
        let expected = [
            0.25 * 1.0 + 0.75 * 3.0,
            0.25 * 2.0 + 0.75 * 1.0,
            0.25 * 3.0 + 0.75 * 4.0,
            0.25 * 4.0 + 0.75 * 2.0,
        ];

        for view in &step.views {
            let values: Vec<f32> = view.clone().into_data().to_vec().unwrap();
            for (row, &want) in expected.iter().enumerate() {
                for c in 0..12 {
                    assert!((values[row * 12 + c] - want).abs() < 1e-6);
                }
            }
        }

        let target_a: Vec<i64> = step.target_a.into_data().to_vec().unwrap();
        let target_b: Vec<i64> = step.target_b.into_data().to_vec().unwrap();
        assert_eq!(target_a, vec![0, 1, 2, 3]);
        assert_eq!(target_b, vec![2, 0, 3, 1]);
    }

    #[test]
    fn test_combine_view_count_mismatch_is_error() {
        let device = TestDevice::default();
        let labeled = constant_batch(&[1.0], &[0], 2, &device);
        let unlabeled = constant_batch(&[2.0], &[1], 3, &device);

        let draw = MixupDraw {
            lam: 0.5,
            perm: vec![1, 0],
        };

        assert!(combine(&labeled, &unlabeled, &draw).is_err());
    }

    #[test]
    fn test_combine_permutation_length_mismatch_is_error() {
        let device = TestDevice::default();
        let labeled = constant_batch(&[1.0], &[0], 2, &device);
        let unlabeled = constant_batch(&[2.0], &[1], 2, &device);

        let draw = MixupDraw {
            lam: 0.5,
            perm: vec![0, 1, 2],
        };

        assert!(combine(&labeled, &unlabeled, &draw).is_err());
    }

    #[test]
    fn test_mixup_loss_is_symmetric_in_lambda() {
        let device = TestDevice::default();
        let logits = Tensor::<TestBackend, 2>::from_floats(
            TensorData::new(vec![1.0f32, -0.5, 0.2, 0.0, 2.0, -1.0], [2, 3]),
            &device,
        );
        let a = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 1], [2]), &device);
        let b = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![2i64, 0], [2]), &device);

        let lhs: f32 = mixup_cross_entropy(logits.clone(), a.clone(), b.clone(), 0.3)
            .into_scalar()
            .elem();
        let rhs: f32 = mixup_cross_entropy(logits, b, a, 0.7).into_scalar().elem();

        assert!((lhs - rhs).abs() < 1e-6);
    }

    #[test]
    fn test_mixup_loss_with_equal_targets_matches_plain_ce() {
        let device = TestDevice::default();
        let logits = Tensor::<TestBackend, 2>::from_floats(
            TensorData::new(vec![0.5f32, 1.5, -0.3, 2.0, 0.1, 0.4], [2, 3]),
            &device,
        );
        let targets =
            Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![1i64, 0], [2]), &device);

        let mixed: f32 = mixup_cross_entropy(logits.clone(), targets.clone(), targets.clone(), 0.7)
            .into_scalar()
            .elem();

        let plain: f32 = CrossEntropyLossConfig::new()
            .init(&device)
            .forward(logits, targets)
            .into_scalar()
            .elem();

        assert!((mixed - plain).abs() < 1e-5);
    }

    #[test]
    fn test_elementwise_ce_matches_manual_value() {
        let device = TestDevice::default();

        // Uniform logits over 4 classes: every example's loss is ln(4)
        let logits = Tensor::<TestBackend, 2>::from_floats(
            TensorData::new(vec![0.0f32; 8], [2, 4]),
            &device,
        );
        let targets =
            Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![3i64, 1], [2]), &device);

        let each: Vec<f32> = cross_entropy_each(logits, targets)
            .into_data()
            .to_vec()
            .unwrap();

        for loss in each {
            assert!((loss - 4.0f32.ln()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mixup_loss_matches_manual_value() {
        let device = TestDevice::default();
        let rows: [[f32; 3]; 2] = [[1.0, 0.0, -1.0], [0.5, 2.0, 0.0]];
        let lam = 0.6;

        let logits = Tensor::<TestBackend, 2>::from_floats(
            TensorData::new(rows.concat(), [2, 3]),
            &device,
        );
        let a = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 1], [2]), &device);
        let b = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![2i64, 0], [2]), &device);

        // ce(row, t) = ln(sum_j exp(row[j])) - row[t], computed without log_softmax
        let ce = |row: &[f32; 3], t: usize| row.iter().map(|v| v.exp()).sum::<f32>().ln() - row[t];
        let mean_a = (ce(&rows[0], 0) + ce(&rows[1], 1)) / 2.0;
        let mean_b = (ce(&rows[0], 2) + ce(&rows[1], 0)) / 2.0;
        let want = lam as f32 * mean_a + (1.0 - lam as f32) * mean_b;

        let got: f32 = mixup_cross_entropy(logits, a, b, lam).into_scalar().elem();
        assert!((got - want).abs() < 1e-5);
    }
}
