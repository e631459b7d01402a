//! Burn Dataset Integration for GTZAN
//!
//! Two dataset flavors back the training paths:
//!
//! - `MultiViewDataset`: every `get` produces `aug_num` independently
//!   transformed views of one spectrogram, sharing a single label. Indices
//!   match the loader's sample indices, so the batch samplers can address
//!   labeled and unlabeled pools directly.
//! - `SingleViewDataset`: eagerly preprocessed clean views for the supervised
//!   baseline, evaluation, and feature extraction.
//!
//! Images are decoded and resized once up front (parallel, with a progress
//! bar); the per-view transforms run on the cached decoded images.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use burn::data::dataset::Dataset;
use image::{DynamicImage, GenericImageView};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::dataset::augment::ViewTransform;
use crate::dataset::loader::GtzanDataset;
use crate::utils::error::{GtzanError, Result};

/// One training item: `aug_num` transformed views sharing one label
#[derive(Clone, Debug)]
pub struct MultiViewItem {
    /// Transformed views, each a flattened CHW float array [3 * H * W]
    pub views: Vec<Vec<f32>>,
    /// Genre label (0-9); meaningful for labeled samples only
    pub label: usize,
}

/// One evaluation item: a single clean view with its label
#[derive(Clone, Debug)]
pub struct EvalItem {
    /// Image data as flattened CHW float array [3 * H * W]
    pub image: Vec<f32>,
    /// Genre label (0-9)
    pub label: usize,
}

/// Convert a decoded image to CHW float data in [0, 1], resizing if needed
fn to_chw(img: &DynamicImage, image_size: usize) -> Vec<f32> {
    let size = image_size as u32;
    let rgb = if img.dimensions() == (size, size) {
        img.to_rgb8()
    } else {
        img.resize_exact(size, size, image::imageops::FilterType::Triangle)
            .to_rgb8()
    };

    let (width, height) = (image_size, image_size);
    let mut data = vec![0.0f32; 3 * height * width];
    for y in 0..height {
        for x in 0..width {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            data[y * width + x] = pixel[0] as f32 / 255.0;
            data[height * width + y * width + x] = pixel[1] as f32 / 255.0;
            data[2 * height * width + y * width + x] = pixel[2] as f32 / 255.0;
        }
    }

    data
}

/// Decode and resize all samples in parallel, failing on the first bad image.
///
/// Index correspondence with the loader is load-bearing: the split and the
/// batch samplers address samples by loader index, so a skipped image would
/// shift every index after it.
fn preload_images(dataset: &GtzanDataset) -> Result<Vec<(DynamicImage, usize)>> {
    let total = dataset.len();
    println!("  📦 Pre-loading {} spectrograms (parallel)...", total);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let loaded = AtomicUsize::new(0);

    let items: Result<Vec<_>> = dataset
        .samples
        .par_iter()
        .map(|sample| {
            let img = dataset.load_image(sample)?;
            let count = loaded.fetch_add(1, Ordering::Relaxed);
            if count % 100 == 0 {
                pb.set_position(count as u64);
            }
            Ok((img, sample.label))
        })
        .collect();

    let items = items?;
    pb.finish_with_message(format!("Loaded {} spectrograms", items.len()));

    Ok(items)
}

/// Training dataset producing `aug_num` transformed views per item
pub struct MultiViewDataset {
    items: Vec<(DynamicImage, usize)>,
    transform: Arc<dyn ViewTransform>,
    aug_num: usize,
    image_size: usize,
    seed: u64,
    /// Each `get` consumes one salt from this deterministic sequence
    draws: AtomicU64,
}

impl std::fmt::Debug for MultiViewDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiViewDataset")
            .field("len", &self.items.len())
            .field("aug_num", &self.aug_num)
            .field("image_size", &self.image_size)
            .finish()
    }
}

impl MultiViewDataset {
    /// Cache all images of a loader split and attach a view transform.
    ///
    /// Item indices equal the loader's sample indices.
    pub fn from_loader(
        dataset: &GtzanDataset,
        transform: Arc<dyn ViewTransform>,
        aug_num: usize,
        seed: u64,
    ) -> Result<Self> {
        let items = preload_images(dataset)?;

        Ok(Self {
            items,
            transform,
            aug_num,
            image_size: dataset.image_size.0 as usize,
            seed,
            draws: AtomicU64::new(0),
        })
    }

    /// Number of views generated per item
    pub fn aug_num(&self) -> usize {
        self.aug_num
    }

    /// Image side length in pixels
    pub fn image_size(&self) -> usize {
        self.image_size
    }
}

impl Dataset<MultiViewItem> for MultiViewDataset {
    fn get(&self, index: usize) -> Option<MultiViewItem> {
        let (image, label) = self.items.get(index)?;

        let salt = self.draws.fetch_add(1, Ordering::Relaxed);
        let mut rng =
            ChaCha8Rng::seed_from_u64(self.seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15));

        let views = (0..self.aug_num)
            .map(|_| {
                let view = self.transform.apply(image.clone(), &mut rng);
                to_chw(&view, self.image_size)
            })
            .collect();

        Some(MultiViewItem {
            views,
            label: *label,
        })
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Evaluation dataset with eagerly preprocessed clean views
#[derive(Clone)]
pub struct SingleViewDataset {
    items: Vec<EvalItem>,
    image_size: usize,
}

impl std::fmt::Debug for SingleViewDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleViewDataset")
            .field("len", &self.items.len())
            .field("image_size", &self.image_size)
            .finish()
    }
}

impl SingleViewDataset {
    /// Preprocess every sample of a loader split, preserving sample order
    pub fn from_loader(dataset: &GtzanDataset) -> Result<Self> {
        let images = preload_images(dataset)?;
        let image_size = dataset.image_size.0 as usize;

        let items = images
            .into_iter()
            .map(|(img, label)| EvalItem {
                image: to_chw(&img, image_size),
                label,
            })
            .collect();

        Ok(Self { items, image_size })
    }

    /// Preprocess only the given sample indices (e.g. the labeled pool)
    pub fn from_loader_indices(dataset: &GtzanDataset, indices: &[usize]) -> Result<Self> {
        let image_size = dataset.image_size.0 as usize;

        let items: Result<Vec<_>> = indices
            .par_iter()
            .map(|&idx| {
                let sample = dataset.samples.get(idx).ok_or_else(|| {
                    GtzanError::Dataset(format!(
                        "index {} is out of range for a dataset of {} samples",
                        idx,
                        dataset.len()
                    ))
                })?;
                let img = dataset.load_image(sample)?;
                Ok(EvalItem {
                    image: to_chw(&img, image_size),
                    label: sample.label,
                })
            })
            .collect();

        Ok(Self {
            items: items?,
            image_size,
        })
    }

    /// Image side length in pixels
    pub fn image_size(&self) -> usize {
        self.image_size
    }

    /// Labels of all items in dataset order
    pub fn labels(&self) -> Vec<usize> {
        self.items.iter().map(|item| item.label).collect()
    }
}

impl Dataset<EvalItem> for SingleViewDataset {
    fn get(&self, index: usize) -> Option<EvalItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
