//! Supervised Baseline Training
//!
//! Plain single-view cross-entropy training over labeled data, kept as the
//! comparison point for the mixup path. Each epoch visits the pool once in a
//! fresh shuffled order and drops a trailing remainder shorter than the batch
//! size. No mixup, no labeled/unlabeled ratio, constant learning rate.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    module::{AutodiffModule, Module},
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::{backend::AutodiffBackend, backend::Backend, ElementConversion},
};
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::SupervisedConfig;
use crate::dataset::batcher::EvalBatcher;
use crate::dataset::loader::GtzanDataset;
use crate::dataset::multiview::{EvalItem, SingleViewDataset};
use crate::dataset::split::IndexSplit;
use crate::dataset::GENRES;
use crate::inference::evaluate::evaluate;
use crate::model::cnn::{GenreClassifier, GenreClassifierConfig};
use crate::training::progress::{StepUpdate, TrainingSink};
use crate::utils::error::{GtzanError, Result};
use crate::utils::format_duration;
use crate::utils::metrics::{AccuracyTracker, RunningAverage};

/// Result of one supervised training epoch
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisedEpochReport {
    /// Epoch index (0-based)
    pub epoch: usize,
    /// Steps executed this epoch
    pub steps: usize,
    /// Average loss over the epoch
    pub avg_loss: f64,
    /// Running accuracy over the epoch's training batches, in percent
    pub accuracy: f64,
}

/// Supervised baseline trainer.
///
/// Holds the epoch-shuffle RNG so consecutive epochs visit the pool in
/// different orders while the whole run stays reproducible from one seed.
pub struct SupervisedTrainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<GenreClassifier<B>, B>,
{
    model: GenreClassifier<B>,
    optimizer: O,
    batcher: EvalBatcher<B>,
    lr: f64,
    batch_size: usize,
    epochs: usize,
    rng: ChaCha8Rng,
    device: B::Device,
}

impl<B, O> SupervisedTrainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<GenreClassifier<B>, B>,
{
    /// Build a trainer from a validated configuration.
    pub fn new(
        model: GenreClassifier<B>,
        optimizer: O,
        config: &SupervisedConfig,
        image_size: usize,
        device: B::Device,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            model,
            optimizer,
            batcher: EvalBatcher::with_image_size(device.clone(), image_size),
            lr: config.learning_rate,
            batch_size: config.batch_size,
            epochs: config.epochs,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            device,
        })
    }

    /// Run one epoch over `dataset` in a fresh shuffled order.
    ///
    /// A trailing remainder shorter than the batch size is dropped, so every
    /// optimizer step sees a full batch.
    pub fn train_epoch<D: Dataset<EvalItem>>(
        &mut self,
        epoch: usize,
        dataset: &D,
        sink: &mut dyn TrainingSink,
    ) -> Result<SupervisedEpochReport> {
        if dataset.len() < self.batch_size {
            return Err(GtzanError::Dataset(format!(
                "training pool has {} examples but the batch size is {}",
                dataset.len(),
                self.batch_size
            )));
        }

        let order = create_shuffled_indices(&mut self.rng, dataset.len());
        let steps_per_epoch = dataset.len() / self.batch_size;
        sink.epoch_start(epoch, self.epochs, steps_per_epoch);

        let mut meter = RunningAverage::new();
        let mut tracker = AccuracyTracker::new();

        for step in 0..steps_per_epoch {
            let indices = &order[step * self.batch_size..(step + 1) * self.batch_size];
            let items = indices
                .iter()
                .map(|&idx| {
                    dataset.get(idx).ok_or_else(|| {
                        GtzanError::Dataset(format!(
                            "index {} is out of range for the training dataset",
                            idx
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let batch = self.batcher.batch(items, &self.device);
            let output = self.model.forward(batch.images);

            let loss = CrossEntropyLossConfig::new()
                .init(&self.device)
                .forward(output.logits.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            if !loss_value.is_finite() {
                return Err(GtzanError::numeric(
                    epoch,
                    step,
                    format!("training loss is not finite: {}", loss_value),
                ));
            }

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &self.model);
            self.model = self.optimizer.step(self.lr, self.model.clone(), grads);

            let predictions: Vec<usize> = output
                .logits
                .argmax(1)
                .squeeze::<1>(1)
                .into_data()
                .iter::<i64>()
                .map(|v| v as usize)
                .collect();
            let truth: Vec<usize> = batch
                .targets
                .into_data()
                .iter::<i64>()
                .map(|v| v as usize)
                .collect();
            tracker.add_batch(&predictions, &truth);
            meter.add(loss_value);

            sink.step(&StepUpdate {
                epoch,
                step,
                steps_per_epoch,
                loss: loss_value,
                avg_loss: meter.average(),
                lr: self.lr,
            });
        }

        let avg_loss = meter.average();
        sink.epoch_end(epoch, avg_loss);

        Ok(SupervisedEpochReport {
            epoch,
            steps: steps_per_epoch,
            avg_loss,
            accuracy: tracker.accuracy() * 100.0,
        })
    }

    /// The model in its current training state
    pub fn model(&self) -> &GenreClassifier<B> {
        &self.model
    }

    /// Consume the trainer and return the trained model
    pub fn into_model(self) -> GenreClassifier<B> {
        self.model
    }
}

/// Fresh shuffled visiting order for one epoch
fn create_shuffled_indices(rng: &mut ChaCha8Rng, len: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    indices
}

/// Run supervised baseline training end to end.
///
/// When `labels_file` is given, training is restricted to the labeled subset
/// it marks, which makes the run directly comparable to a semi-supervised run
/// over the same split. Without it the whole training directory is used.
pub fn run_supervised<B: AutodiffBackend>(
    train_dir: &str,
    eval_dir: &str,
    labels_file: Option<&str>,
    config: &SupervisedConfig,
    output_dir: &str,
    sink: &mut dyn TrainingSink,
) -> anyhow::Result<()> {
    println!("{}", "Initializing Supervised Training...".green().bold());

    config.validate()?;

    let device = B::Device::default();
    println!("  Device: {:?}", device);

    if !Path::new(train_dir).exists() {
        println!(
            "{} Training directory not found: {}",
            "Error:".red(),
            train_dir
        );
        println!();
        println!("Expected layout:");
        println!("  {}/<genre>/*.png", train_dir);
        anyhow::bail!("training directory not found: {}", train_dir);
    }

    std::fs::create_dir_all(output_dir)?;

    println!("{}", "Loading Dataset...".cyan());
    let train_loader = GtzanDataset::from_directory(train_dir)?;
    let stats = train_loader.stats();
    stats.print();

    let image_size = train_loader.image_size.0 as usize;

    println!();
    println!("{}", "Pre-loading Training Data...".cyan().bold());
    let train_dataset = match labels_file {
        Some(labels) => {
            let split = IndexSplit::from_label_file(&train_loader, Path::new(labels))?;
            println!();
            print!("{}", split.stats(&train_loader));
            println!(
                "  Training on the {} labeled examples only",
                split.num_labeled()
            );
            SingleViewDataset::from_loader_indices(&train_loader, &split.labeled)?
        }
        None => SingleViewDataset::from_loader(&train_loader)?,
    };

    println!("{}", "Pre-loading Evaluation Data...".cyan().bold());
    let eval_loader = GtzanDataset::from_directory(eval_dir)?;
    let eval_dataset = SingleViewDataset::from_loader(&eval_loader)?;

    println!();
    println!("{}", "Creating Model...".cyan());
    let model_config = GenreClassifierConfig::new();
    let model = GenreClassifier::<B>::new(&model_config, &device);

    let optimizer = AdamConfig::new()
        .with_weight_decay(Some(burn::optim::decay::WeightDecayConfig::new(
            config.weight_decay as f32,
        )))
        .init();

    let mut trainer = SupervisedTrainer::new(model, optimizer, config, image_size, device)?;

    let topk = GENRES.len() - 1;

    println!();
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  🏷️  Training samples:   {}", train_dataset.len());
    println!("  🔄 Epochs:             {}", config.epochs);
    println!("  📦 Batch size:         {}", config.batch_size);
    println!("  📈 Learning rate:      {}", config.learning_rate);
    println!();

    println!("{}", "Starting Training...".green().bold());
    println!();

    let started = Instant::now();
    let mut best_top1 = 0.0f64;

    for epoch in 0..config.epochs {
        let report = trainer.train_epoch(epoch, &train_dataset, sink)?;

        let eval_device = <B::InnerBackend as Backend>::Device::default();
        let eval = evaluate(
            &trainer.model().clone().valid(),
            &eval_dataset,
            config.batch_size,
            image_size,
            topk,
            &eval_device,
        )?;

        let is_best = eval.top1 > best_top1;
        if is_best {
            best_top1 = eval.top1;
        }

        println!(
            "  {} Train accuracy: {:.2}% | Top-1: {:.2}% | Top-{}: {:.2}%{}",
            "→".cyan(),
            report.accuracy,
            eval.top1,
            eval.k,
            eval.topk,
            if is_best {
                " (best)".green().to_string()
            } else {
                String::new()
            }
        );
        println!();
    }

    println!("{}", "Saving Model...".cyan());
    let model_path = Path::new(output_dir).join("genre_classifier");
    let recorder = CompactRecorder::new();
    trainer
        .into_model()
        .save_file(&model_path, &recorder)
        .map_err(|e| anyhow::anyhow!("Failed to save model: {:?}", e))?;

    config
        .save(&Path::new(output_dir).join("training_config.json"))
        .context("failed to save training config")?;

    println!("  💾 Saved to: {:?}", model_path);
    println!();

    println!("{}", "Training Complete!".green().bold());
    println!("  ⏱  Total time: {}", format_duration(started.elapsed().as_secs_f64()));
    println!("  🎉 Best top-1 accuracy: {:.2}%", best_top1);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::progress::NullSink;
    use burn::backend::Autodiff;
    use burn_ndarray::NdArray;

    type TestBackend = Autodiff<NdArray<f32>>;

    struct LabeledPool {
        items: Vec<EvalItem>,
    }

    impl LabeledPool {
        fn new(n: usize) -> Self {
            let items = (0..n)
                .map(|i| EvalItem {
                    image: vec![0.05 * i as f32; 3 * 16 * 16],
                    label: i % 4,
                })
                .collect();
            Self { items }
        }
    }

    impl Dataset<EvalItem> for LabeledPool {
        fn get(&self, index: usize) -> Option<EvalItem> {
            self.items.get(index).cloned()
        }

        fn len(&self) -> usize {
            self.items.len()
        }
    }

    fn tiny_trainer(
        config: &SupervisedConfig,
    ) -> SupervisedTrainer<TestBackend, impl Optimizer<GenreClassifier<TestBackend>, TestBackend>>
    {
        let device = Default::default();
        let model_config = GenreClassifierConfig::new()
            .with_num_classes(4)
            .with_base_filters(2)
            .with_embed_dim(8);
        let model = GenreClassifier::<TestBackend>::new(&model_config, &device);
        let optimizer = AdamConfig::new().init();
        SupervisedTrainer::new(model, optimizer, config, 16, device).unwrap()
    }

    #[test]
    fn test_shuffled_indices_are_a_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let order = create_shuffled_indices(&mut rng, 50);

        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_consecutive_epochs_use_different_orders() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let first = create_shuffled_indices(&mut rng, 32);
        let second = create_shuffled_indices(&mut rng, 32);
        assert_ne!(first, second);
    }

    #[test]
    fn test_epoch_drops_trailing_remainder() {
        let config = SupervisedConfig {
            batch_size: 4,
            epochs: 1,
            weight_decay: 0.0,
            ..Default::default()
        };
        // 10 examples / batch 4 = 2 full steps, remainder of 2 dropped
        let dataset = LabeledPool::new(10);
        let mut trainer = tiny_trainer(&config);

        let report = trainer.train_epoch(0, &dataset, &mut NullSink).unwrap();
        assert_eq!(report.steps, 2);
        assert!(report.avg_loss.is_finite());
        assert!((0.0..=100.0).contains(&report.accuracy));
    }

    #[test]
    fn test_pool_smaller_than_batch_is_error() {
        let config = SupervisedConfig {
            batch_size: 8,
            epochs: 1,
            ..Default::default()
        };
        let dataset = LabeledPool::new(5);
        let mut trainer = tiny_trainer(&config);

        assert!(trainer.train_epoch(0, &dataset, &mut NullSink).is_err());
    }
}
