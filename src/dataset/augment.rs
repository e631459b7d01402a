//! Spectrogram Augmentation Module
//!
//! Random view transforms for spectrogram images. The time axis runs along
//! the image width and the frequency axis along the height, so the transforms
//! are the spectrogram-safe ones: circular time shifts, time/frequency
//! masking, gain shifts, and additive noise. Flips and rotations are not
//! offered; they would scramble the time-frequency layout.
//!
//! # Usage
//!
//! - **Training**: each view of an example gets an independent random draw
//! - **Validation/Test**: use [`Identity`] (clean evaluation)

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// A view transform applied to one spectrogram image.
///
/// Implementations must be deterministic given the same image and RNG state;
/// the multi-view dataset relies on this to keep runs reproducible.
pub trait ViewTransform: Send + Sync {
    /// Transform an image using randomness from `rng`
    fn apply(&self, img: DynamicImage, rng: &mut ChaCha8Rng) -> DynamicImage;
}

/// Pass-through transform for evaluation views
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl ViewTransform for Identity {
    fn apply(&self, img: DynamicImage, _rng: &mut ChaCha8Rng) -> DynamicImage {
        img
    }
}

/// Configuration for spectrogram augmentation
#[derive(Clone, Debug)]
pub struct SpectrogramAugmentConfig {
    /// Maximum circular time shift as a fraction of the image width
    pub time_shift_frac: f32,
    /// Probability of applying a time shift
    pub time_shift_prob: f32,
    /// Maximum width of a time mask in pixels (0 = disabled)
    pub time_mask_width: u32,
    /// Probability of applying a time mask
    pub time_mask_prob: f32,
    /// Maximum height of a frequency mask in pixels (0 = disabled)
    pub freq_mask_height: u32,
    /// Probability of applying a frequency mask
    pub freq_mask_prob: f32,
    /// Gain adjustment range (+/- gain_delta of full scale)
    pub gain_delta: f32,
    /// Probability of applying a gain adjustment
    pub gain_prob: f32,
    /// Gaussian noise standard deviation in [0, 1] scale (0.0 = disabled)
    pub noise_std: f32,
    /// Probability of applying noise
    pub noise_prob: f32,
}

impl Default for SpectrogramAugmentConfig {
    fn default() -> Self {
        Self {
            time_shift_frac: 0.1,
            time_shift_prob: 0.5,
            time_mask_width: 16,
            time_mask_prob: 0.5,
            freq_mask_height: 12,
            freq_mask_prob: 0.5,
            gain_delta: 0.1,
            gain_prob: 0.3,
            noise_std: 0.0,
            noise_prob: 0.0,
        }
    }
}

impl SpectrogramAugmentConfig {
    /// Light preset: shifts only, no masking
    pub fn light() -> Self {
        Self {
            time_shift_frac: 0.05,
            time_shift_prob: 0.5,
            time_mask_width: 0,
            time_mask_prob: 0.0,
            freq_mask_height: 0,
            freq_mask_prob: 0.0,
            gain_delta: 0.05,
            gain_prob: 0.2,
            noise_std: 0.0,
            noise_prob: 0.0,
        }
    }

    /// Medium preset: shifts plus time/frequency masking
    pub fn medium() -> Self {
        Self::default()
    }

    /// Heavy preset: wider masks plus additive noise
    pub fn heavy() -> Self {
        Self {
            time_shift_frac: 0.15,
            time_shift_prob: 0.7,
            time_mask_width: 24,
            time_mask_prob: 0.7,
            freq_mask_height: 20,
            freq_mask_prob: 0.7,
            gain_delta: 0.15,
            gain_prob: 0.5,
            noise_std: 0.02,
            noise_prob: 0.2,
        }
    }

    /// Disable all augmentations
    pub fn none() -> Self {
        Self {
            time_shift_frac: 0.0,
            time_shift_prob: 0.0,
            time_mask_width: 0,
            time_mask_prob: 0.0,
            freq_mask_height: 0,
            freq_mask_prob: 0.0,
            gain_delta: 0.0,
            gain_prob: 0.0,
            noise_std: 0.0,
            noise_prob: 0.0,
        }
    }
}

/// Spectrogram augmenter that applies random transformations
#[derive(Clone, Debug)]
pub struct SpectrogramAugment {
    config: SpectrogramAugmentConfig,
}

impl SpectrogramAugment {
    /// Create a new augmenter with the given configuration
    pub fn new(config: SpectrogramAugmentConfig) -> Self {
        Self { config }
    }

    /// Create an augmenter with the default (medium) configuration
    pub fn with_defaults() -> Self {
        Self::new(SpectrogramAugmentConfig::default())
    }

    /// Circularly shift the image along the time axis
    fn time_shift(&self, img: &DynamicImage, shift: i32) -> DynamicImage {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 {
            return img.clone();
        }

        let mut output = ImageBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let src_x = (x as i64 - shift as i64).rem_euclid(width as i64) as u32;
                output.put_pixel(x, y, *rgb.get_pixel(src_x, y));
            }
        }

        DynamicImage::ImageRgb8(output)
    }

    /// Zero out a vertical band of columns (a span of time frames)
    fn time_mask(&self, img: &DynamicImage, start: u32, mask_width: u32) -> DynamicImage {
        let mut rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        for x in start..(start + mask_width).min(width) {
            for y in 0..height {
                rgb.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        DynamicImage::ImageRgb8(rgb)
    }

    /// Zero out a horizontal band of rows (a span of frequency bins)
    fn freq_mask(&self, img: &DynamicImage, start: u32, mask_height: u32) -> DynamicImage {
        let mut rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        for y in start..(start + mask_height).min(height) {
            for x in 0..width {
                rgb.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        DynamicImage::ImageRgb8(rgb)
    }

    /// Shift all intensities by delta (fraction of full scale)
    fn adjust_gain(&self, img: &DynamicImage, delta: f32) -> DynamicImage {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let delta_u8 = (delta * 255.0) as i32;

        let mut output = ImageBuffer::new(width, height);
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let r = (pixel[0] as i32 + delta_u8).clamp(0, 255) as u8;
            let g = (pixel[1] as i32 + delta_u8).clamp(0, 255) as u8;
            let b = (pixel[2] as i32 + delta_u8).clamp(0, 255) as u8;
            output.put_pixel(x, y, Rgb([r, g, b]));
        }

        DynamicImage::ImageRgb8(output)
    }

    /// Add Gaussian noise to all pixels
    fn apply_noise(&self, img: &DynamicImage, rng: &mut ChaCha8Rng) -> DynamicImage {
        let normal = match Normal::new(0.0f32, self.config.noise_std * 255.0) {
            Ok(normal) => normal,
            Err(_) => return img.clone(),
        };

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut output = ImageBuffer::new(width, height);
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let noise = normal.sample(rng);
            let r = (pixel[0] as f32 + noise).round().clamp(0.0, 255.0) as u8;
            let g = (pixel[1] as f32 + noise).round().clamp(0.0, 255.0) as u8;
            let b = (pixel[2] as f32 + noise).round().clamp(0.0, 255.0) as u8;
            output.put_pixel(x, y, Rgb([r, g, b]));
        }

        DynamicImage::ImageRgb8(output)
    }
}

impl ViewTransform for SpectrogramAugment {
    fn apply(&self, img: DynamicImage, rng: &mut ChaCha8Rng) -> DynamicImage {
        let mut result = img;
        let (width, height) = result.dimensions();

        // Circular time shift
        if self.config.time_shift_frac > 0.0 && rng.gen::<f32>() < self.config.time_shift_prob {
            let max_shift = (self.config.time_shift_frac * width as f32) as i32;
            if max_shift > 0 {
                let shift = rng.gen_range(-max_shift..=max_shift);
                result = self.time_shift(&result, shift);
            }
        }

        // Time mask
        if self.config.time_mask_width > 0 && rng.gen::<f32>() < self.config.time_mask_prob {
            let mask_width = rng.gen_range(1..=self.config.time_mask_width).min(width);
            let start = rng.gen_range(0..width.saturating_sub(mask_width).max(1));
            result = self.time_mask(&result, start, mask_width);
        }

        // Frequency mask
        if self.config.freq_mask_height > 0 && rng.gen::<f32>() < self.config.freq_mask_prob {
            let mask_height = rng.gen_range(1..=self.config.freq_mask_height).min(height);
            let start = rng.gen_range(0..height.saturating_sub(mask_height).max(1));
            result = self.freq_mask(&result, start, mask_height);
        }

        // Gain shift
        if self.config.gain_delta > 0.0 && rng.gen::<f32>() < self.config.gain_prob {
            let delta = rng.gen_range(-self.config.gain_delta..=self.config.gain_delta);
            result = self.adjust_gain(&result, delta);
        }

        // Additive noise
        if self.config.noise_std > 0.0 && rng.gen::<f32>() < self.config.noise_prob {
            result = self.apply_noise(&result, rng);
        }

        result
    }
}
