//! Fixed-ratio batch pairing
//!
//! Each semi-supervised step consumes one labeled batch and one unlabeled
//! batch. The labeled side comes from an `EternalSampler` and never runs out;
//! the unlabeled side is a finite enumeration reshuffled once per epoch, and
//! its exhaustion is the signal that ends the epoch. Together the two sides
//! always add up to the configured combined batch size.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::sampler::eternal::EternalSampler;
use crate::utils::error::{GtzanError, Result};

/// One step's worth of example indices: labeled first, then unlabeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPair {
    pub labeled: Vec<usize>,
    pub unlabeled: Vec<usize>,
}

impl BatchPair {
    /// Combined number of indices in this pair
    pub fn len(&self) -> usize {
        self.labeled.len() + self.unlabeled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labeled.is_empty() && self.unlabeled.is_empty()
    }
}

/// Pairs an eternal labeled stream with a finite per-epoch unlabeled
/// enumeration at a fixed ratio.
#[derive(Debug, Clone)]
pub struct FixedRatioSampler {
    labeled: EternalSampler,
    unlabeled_pool: Vec<usize>,
    epoch_order: Vec<usize>,
    cursor: usize,
    labeled_batch_size: usize,
    unlabeled_batch_size: usize,
    rng: ChaCha8Rng,
}

impl FixedRatioSampler {
    /// Build a sampler over the two index pools.
    ///
    /// Fails when the ratio leaves no room for unlabeled examples
    /// (`labeled_batch_size >= batch_size`) or when either pool is empty.
    pub fn new(
        labeled_idx: Vec<usize>,
        unlabeled_idx: Vec<usize>,
        batch_size: usize,
        labeled_batch_size: usize,
        seed: u64,
    ) -> Result<Self> {
        if labeled_batch_size == 0 {
            return Err(GtzanError::Config(
                "labeled_batch_size must be greater than 0".to_string(),
            ));
        }

        if labeled_batch_size >= batch_size {
            return Err(GtzanError::Config(format!(
                "labeled_batch_size ({}) must be smaller than batch_size ({}) to leave room for unlabeled examples",
                labeled_batch_size, batch_size
            )));
        }

        if unlabeled_idx.is_empty() {
            return Err(GtzanError::Config(
                "unlabeled index set is empty".to_string(),
            ));
        }

        let unlabeled_batch_size = batch_size - labeled_batch_size;
        if unlabeled_idx.len() < unlabeled_batch_size {
            warn!(
                "unlabeled pool ({}) is smaller than the unlabeled batch size ({}); epochs will contain no steps",
                unlabeled_idx.len(),
                unlabeled_batch_size
            );
        }

        // The labeled stream and the epoch shuffle advance independently.
        let labeled = EternalSampler::new(labeled_idx, seed)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

        let mut epoch_order = unlabeled_idx.clone();
        epoch_order.shuffle(&mut rng);

        Ok(Self {
            labeled,
            unlabeled_pool: unlabeled_idx,
            epoch_order,
            cursor: 0,
            labeled_batch_size,
            unlabeled_batch_size,
            rng,
        })
    }

    /// Number of pairs one epoch yields: a full unlabeled batch per step,
    /// trailing remainder dropped.
    pub fn pairs_per_epoch(&self) -> usize {
        self.unlabeled_pool.len() / self.unlabeled_batch_size
    }

    /// Reshuffle the unlabeled enumeration for a new epoch.
    ///
    /// The eternal labeled stream is untouched: it keeps its position and is
    /// consumed continuously across epoch boundaries.
    pub fn begin_epoch(&mut self) {
        self.epoch_order.shuffle(&mut self.rng);
        self.cursor = 0;
    }

    /// Next (labeled, unlabeled) index-batch pair, or `None` once the
    /// unlabeled enumeration cannot fill another full batch. `None` is the
    /// epoch-boundary signal, not an error.
    pub fn next_pair(&mut self) -> Option<BatchPair> {
        if self.cursor + self.unlabeled_batch_size > self.epoch_order.len() {
            return None;
        }

        let unlabeled = self.epoch_order[self.cursor..self.cursor + self.unlabeled_batch_size].to_vec();
        self.cursor += self.unlabeled_batch_size;

        let labeled = self.labeled.next_batch(self.labeled_batch_size);

        Some(BatchPair { labeled, unlabeled })
    }

    /// Labeled indices per pair
    pub fn labeled_batch_size(&self) -> usize {
        self.labeled_batch_size
    }

    /// Unlabeled indices per pair
    pub fn unlabeled_batch_size(&self) -> usize {
        self.unlabeled_batch_size
    }
}
