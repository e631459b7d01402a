//! Semi-Supervised Training Implementation
//!
//! The step runner pairs a labeled batch from the eternal stream with an
//! unlabeled batch from the per-epoch enumeration, mixes them under one
//! shared (λ, π) draw, and accumulates the mixup loss over all augmented
//! views before a single backward pass and optimizer update. The global step
//! counter advances by exactly one per step, independent of `aug_num`.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    module::{AutodiffModule, Module},
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::{backend::AutodiffBackend, backend::Backend, ElementConversion, Tensor},
};
use colored::Colorize;

use crate::config::SemiSupervisedConfig;
use crate::dataset::augment::SpectrogramAugment;
use crate::dataset::batcher::MultiViewBatcher;
use crate::dataset::loader::GtzanDataset;
use crate::dataset::multiview::{MultiViewDataset, MultiViewItem, SingleViewDataset};
use crate::dataset::split::IndexSplit;
use crate::inference::evaluate::evaluate;
use crate::model::cnn::{GenreClassifier, GenreClassifierConfig};
use crate::sampler::FixedRatioSampler;
use crate::training::mixup::{combine, mixup_cross_entropy, MixupRng};
use crate::training::progress::{StepUpdate, TrainingSink};
use crate::training::schedule::LrSchedule;
use crate::utils::error::{GtzanError, Result};
use crate::utils::format_duration;
use crate::utils::metrics::RunningAverage;

/// Result of one training epoch
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// Epoch index (0-based)
    pub epoch: usize,
    /// Steps executed this epoch
    pub steps: usize,
    /// Average loss over the epoch
    pub avg_loss: f64,
    /// Global step count after this epoch
    pub global_step: usize,
}

/// Semi-supervised trainer owning the model, optimizer, and all per-run
/// sampling state.
///
/// The trainer is created once per run; epochs share the eternal labeled
/// stream, the mixup draw stream, and the global step counter.
pub struct SemiSupervisedTrainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<GenreClassifier<B>, B>,
{
    model: GenreClassifier<B>,
    optimizer: O,
    sampler: FixedRatioSampler,
    mixup: MixupRng,
    schedule: LrSchedule,
    batcher: MultiViewBatcher<B>,
    aug_num: usize,
    epochs: usize,
    device: B::Device,
    global_step: usize,
}

impl<B, O> SemiSupervisedTrainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<GenreClassifier<B>, B>,
{
    /// Build a trainer from a validated configuration.
    ///
    /// The mixup stream is seeded from `config.seed + 2` so it is independent
    /// of the sampler's shuffles.
    pub fn new(
        model: GenreClassifier<B>,
        optimizer: O,
        sampler: FixedRatioSampler,
        config: &SemiSupervisedConfig,
        image_size: usize,
        device: B::Device,
    ) -> Result<Self> {
        config.validate()?;

        if sampler.labeled_batch_size() != config.labeled_batch_size
            || sampler.unlabeled_batch_size() != config.unlabeled_batch_size()
        {
            return Err(GtzanError::Config(format!(
                "sampler batch sizes ({} labeled + {} unlabeled) do not match the configuration ({} + {})",
                sampler.labeled_batch_size(),
                sampler.unlabeled_batch_size(),
                config.labeled_batch_size,
                config.unlabeled_batch_size()
            )));
        }

        let mixup = MixupRng::new(
            config.alpha,
            config.batch_size,
            config.seed.wrapping_add(2),
        )?;
        let schedule = LrSchedule::new(config.base_lr, config.rampdown_epochs);
        let batcher = MultiViewBatcher::with_image_size(device.clone(), image_size);

        Ok(Self {
            model,
            optimizer,
            sampler,
            mixup,
            schedule,
            batcher,
            aug_num: config.aug_num,
            epochs: config.epochs,
            device,
            global_step: 0,
        })
    }

    /// Run one training epoch over the unlabeled enumeration.
    ///
    /// `epoch` is passed explicitly; the trainer does not keep its own epoch
    /// counter, so callers can interleave evaluation or stop early without
    /// desynchronizing the schedule.
    pub fn train_epoch<D: Dataset<MultiViewItem>>(
        &mut self,
        epoch: usize,
        dataset: &D,
        sink: &mut dyn TrainingSink,
    ) -> Result<EpochReport> {
        let steps_per_epoch = self.sampler.pairs_per_epoch();
        sink.epoch_start(epoch, self.epochs, steps_per_epoch);

        let mut meter = RunningAverage::new();
        let mut step = 0usize;

        while let Some(pair) = self.sampler.next_pair() {
            let lr = self.schedule.lr_at(epoch, step, steps_per_epoch)?;

            let labeled_items = self.collect_items(dataset, &pair.labeled)?;
            let unlabeled_items = self.collect_items(dataset, &pair.unlabeled)?;
            let labeled = self.batcher.batch(labeled_items, &self.device);
            let unlabeled = self.batcher.batch(unlabeled_items, &self.device);

            // One draw per step, shared by every view and both loss terms
            let draw = self.mixup.draw(epoch, step)?;
            let mixed = combine(&labeled, &unlabeled, &draw)?;

            // Accumulate the view losses as a tensor sum so one backward
            // pass collects the gradients of all views
            let mut loss = Tensor::<B, 1>::zeros([1], &self.device);
            for view in &mixed.views {
                let output = self.model.forward(view.clone());
                loss = loss
                    + mixup_cross_entropy(
                        output.logits,
                        mixed.target_a.clone(),
                        mixed.target_b.clone(),
                        mixed.lam,
                    );
            }
            let loss = loss.div_scalar(self.aug_num as f64);

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
            self.model = self.optimizer.step(lr, self.model.clone(), grads);

            meter.add(loss_value);
            self.global_step += 1;

            sink.step(&StepUpdate {
                epoch,
                step,
                steps_per_epoch,
                loss: loss_value,
                avg_loss: meter.average(),
                lr,
            });

            step += 1;
        }

        // Re-arm the unlabeled enumeration; the labeled stream keeps going
        self.sampler.begin_epoch();

        let avg_loss = meter.average();
        sink.epoch_end(epoch, avg_loss);

        Ok(EpochReport {
            epoch,
            steps: step,
            avg_loss,
            global_step: self.global_step,
        })
    }

    fn collect_items<D: Dataset<MultiViewItem>>(
        &self,
        dataset: &D,
        indices: &[usize],
    ) -> Result<Vec<MultiViewItem>> {
        indices
            .iter()
            .map(|&idx| {
                let item = dataset.get(idx).ok_or_else(|| {
                    GtzanError::Dataset(format!(
                        "index {} is out of range for the training dataset",
                        idx
                    ))
                })?;

                if item.views.len() != self.aug_num {
                    return Err(GtzanError::Config(format!(
                        "dataset produced {} views per item but the trainer expects {}",
                        item.views.len(),
                        self.aug_num
                    )));
                }

                Ok(item)
            })
            .collect()
    }

    /// The model in its current training state
    pub fn model(&self) -> &GenreClassifier<B> {
        &self.model
    }

    /// Consume the trainer and return the trained model
    pub fn into_model(self) -> GenreClassifier<B> {
        self.model
    }

    /// Total optimizer updates performed so far
    pub fn global_step(&self) -> usize {
        self.global_step
    }

    /// Steps each epoch will run
    pub fn pairs_per_epoch(&self) -> usize {
        self.sampler.pairs_per_epoch()
    }
}

/// Run semi-supervised training end to end.
///
/// # Type Parameters
/// * `B` - The autodiff backend to use (e.g., `Autodiff<NdArray>` or `Autodiff<Cuda>`)
///
/// # Arguments
/// * `train_dir` - Training split directory (one subdirectory per genre)
/// * `eval_dir` - Held-out split directory for between-epoch evaluation
/// * `labels_file` - Label file marking the labeled subset of the training split
/// * `config` - Training configuration
/// * `output_dir` - Directory for the final model and config snapshot
/// * `sink` - Progress receiver
pub fn run_semi_supervised<B: AutodiffBackend>(
    train_dir: &str,
    eval_dir: &str,
    labels_file: &str,
    config: &SemiSupervisedConfig,
    output_dir: &str,
    sink: &mut dyn TrainingSink,
) -> anyhow::Result<()> {
    println!("{}", "Initializing Semi-Supervised Training...".green().bold());

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

    // Load the training split and its labeled/unlabeled partition
    println!("{}", "Loading Dataset...".cyan());
    let train_loader = GtzanDataset::from_directory(train_dir)?;
    let stats = train_loader.stats();
    stats.print();

    let split = IndexSplit::from_label_file(&train_loader, Path::new(labels_file))?;
    println!();
    print!("{}", split.stats(&train_loader));

    let image_size = train_loader.image_size.0 as usize;

    println!();
    println!("{}", "Pre-loading Training Data...".cyan().bold());
    let train_dataset = MultiViewDataset::from_loader(
        &train_loader,
        std::sync::Arc::new(SpectrogramAugment::with_defaults()),
        config.aug_num,
        config.seed,
    )?;

    println!("{}", "Pre-loading Evaluation Data...".cyan().bold());
    let eval_loader = GtzanDataset::from_directory(eval_dir)?;
    let eval_dataset = SingleViewDataset::from_loader(&eval_loader)?;

    // Model and optimizer
    println!();
    println!("{}", "Creating Model...".cyan());
    let model_config = GenreClassifierConfig::new();
    let model = GenreClassifier::<B>::new(&model_config, &device);

    let optimizer = AdamConfig::new()
        .with_weight_decay(Some(burn::optim::decay::WeightDecayConfig::new(
            config.weight_decay as f32,
        )))
        .init();

    let sampler = FixedRatioSampler::new(
        split.labeled.clone(),
        split.unlabeled.clone(),
        config.batch_size,
        config.labeled_batch_size,
        config.seed,
    )?;

    let mut trainer =
        SemiSupervisedTrainer::new(model, optimizer, sampler, config, image_size, device)?;

    println!();
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  🏷️  Labeled samples:    {}", split.num_labeled());
    println!("  📷 Unlabeled samples:  {}", split.num_unlabeled());
    println!("  🔄 Epochs:             {}", config.epochs);
    println!(
        "  📦 Batch size:         {} ({} labeled + {} unlabeled)",
        config.batch_size,
        config.labeled_batch_size,
        config.unlabeled_batch_size()
    );
    println!("  👁  Views per example:  {}", config.aug_num);
    println!("  🎲 Mixup alpha:        {}", config.alpha);
    println!("  📈 Schedule:           {}", LrSchedule::new(config.base_lr, config.rampdown_epochs).description());
    println!("  🪜 Steps per epoch:    {}", trainer.pairs_per_epoch());
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
            config.topk,
            &eval_device,
        )?;

        let is_best = eval.top1 > best_top1;
        if is_best {
            best_top1 = eval.top1;
        }

        println!(
            "  {} Top-1: {:.2}% | Top-{}: {:.2}% | {} steps total{}",
            "→".cyan(),
            eval.top1,
            eval.k,
            eval.topk,
            report.global_step,
            if is_best {
                " (best)".green().to_string()
            } else {
                String::new()
            }
        );
        println!();
    }

    // Save the final model and the config that produced it
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
