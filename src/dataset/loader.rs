//! GTZAN Spectrogram Dataset Loader
//!
//! Loads the GTZAN genre dataset from disk. Each genre lives in its own
//! subdirectory of spectrogram images; labels are assigned by sorting the
//! genre names so the same directory tree always produces the same indices.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{GtzanError, Result};
use crate::IMAGE_SIZE;

/// Image extensions accepted by the loader
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// A single spectrogram sample with its label and metadata
#[derive(Debug, Clone)]
pub struct GtzanSample {
    /// Path to the spectrogram image file
    pub path: PathBuf,
    /// Genre label index (0-9)
    pub label: usize,
    /// Genre name (e.g., "blues")
    pub genre: String,
    /// Unique sample ID
    pub id: usize,
}

/// GTZAN spectrogram dataset with lazy image loading
#[derive(Debug)]
pub struct GtzanDataset {
    /// Root directory of this split
    pub root_dir: PathBuf,
    /// All samples in the split
    pub samples: Vec<GtzanSample>,
    /// Genre names in label order
    pub genres: Vec<String>,
    /// Mapping from genre name to label index
    pub class_to_idx: HashMap<String, usize>,
    /// Target image size (width, height)
    pub image_size: (u32, u32),
}

impl GtzanDataset {
    /// Load a dataset split from a directory.
    ///
    /// The directory should be structured as:
    /// ```text
    /// root_dir/
    /// ├── blues/
    /// │   ├── blues.00000.png
    /// │   └── blues.00001.png
    /// ├── classical/
    /// │   └── ...
    /// └── ...
    /// ```
    pub fn from_directory<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        Self::from_directory_with_size(root_dir, IMAGE_SIZE as u32)
    }

    /// Load a dataset split with a non-default image size
    pub fn from_directory_with_size<P: AsRef<Path>>(root_dir: P, image_size: u32) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        info!("Loading GTZAN dataset from: {:?}", root_dir);

        if !root_dir.exists() {
            return Err(GtzanError::Dataset(format!(
                "dataset directory does not exist: {}",
                root_dir.display()
            )));
        }

        // Discover genre directories; sorting fixes the label order
        let mut genres: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    genres.push(name.to_string());
                }
            }
        }
        genres.sort();

        if genres.is_empty() {
            return Err(GtzanError::Dataset(format!(
                "no genre directories found in {}",
                root_dir.display()
            )));
        }

        info!("Found {} genres", genres.len());

        let class_to_idx: HashMap<String, usize> = genres
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let mut samples = Vec::new();
        let mut sample_id: usize = 0;

        for genre in &genres {
            let genre_dir = root_dir.join(genre);
            let label = class_to_idx[genre];
            let before = samples.len();

            for entry in WalkDir::new(&genre_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path().to_path_buf();

                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                        samples.push(GtzanSample {
                            path,
                            label,
                            genre: genre.clone(),
                            id: sample_id,
                        });
                        sample_id += 1;
                    }
                }
            }

            debug!(
                "Genre '{}' (label {}): {} samples",
                genre,
                label,
                samples.len() - before
            );
        }

        if samples.is_empty() {
            return Err(GtzanError::Dataset(format!(
                "no spectrogram images found under {}",
                root_dir.display()
            )));
        }

        info!("Loaded {} total samples", samples.len());

        Ok(Self {
            root_dir,
            samples,
            genres,
            class_to_idx,
            image_size: (image_size, image_size),
        })
    }

    /// Get the number of samples in the split
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the split is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the number of genres
    pub fn num_classes(&self) -> usize {
        self.genres.len()
    }

    /// Genre name for a label index
    pub fn genre_name(&self, label: usize) -> Option<&str> {
        self.genres.get(label).map(|s| s.as_str())
    }

    /// Load a sample's image from disk and resize it to the target size
    pub fn load_image(&self, sample: &GtzanSample) -> Result<DynamicImage> {
        let img = ImageReader::open(&sample.path)
            .map_err(|e| GtzanError::Image(sample.path.clone(), e.to_string()))?
            .decode()
            .map_err(|e| GtzanError::Image(sample.path.clone(), e.to_string()))?;

        Ok(img.resize_exact(
            self.image_size.0,
            self.image_size.1,
            image::imageops::FilterType::Triangle,
        ))
    }

    /// Convert a resized image to CHW float data normalized to [0, 1]
    pub fn to_chw(&self, img: &DynamicImage) -> Vec<f32> {
        let rgb = img.to_rgb8();
        let (width, height) = (self.image_size.0 as usize, self.image_size.1 as usize);
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

    /// Number of samples per genre, indexed by label
    pub fn class_distribution(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes()];
        for sample in &self.samples {
            counts[sample.label] += 1;
        }
        counts
    }

    /// Get statistics about the split
    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            total_samples: self.samples.len(),
            num_classes: self.num_classes(),
            class_counts: self.class_distribution(),
            genres: self.genres.clone(),
        }
    }
}

/// Statistics about a dataset split
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub num_classes: usize,
    pub class_counts: Vec<usize>,
    pub genres: Vec<String>,
}

impl DatasetStats {
    /// Print statistics to console
    pub fn print(&self) {
        println!("\n📊 Dataset Statistics:");
        println!("  Total samples: {}", self.total_samples);
        println!("  Number of genres: {}", self.num_classes);
        println!("\n  Samples per genre:");

        for (idx, genre) in self.genres.iter().enumerate() {
            let count = self.class_counts[idx];
            let bar_len = (count as f32 / self.total_samples.max(1) as f32 * 40.0) as usize;
            let bar: String = "█".repeat(bar_len);
            println!("    {:2}. {:12} {:5} {}", idx, genre, count, bar);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    pub(crate) fn write_test_image(path: &Path, width: u32, height: u32, fill: u8) {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb([fill, fill, fill]));
        DynamicImage::ImageRgb8(buffer).save(path).unwrap();
    }

    pub(crate) fn make_split(dir: &Path, genres: &[(&str, usize)]) {
        for (genre, count) in genres {
            let genre_dir = dir.join(genre);
            std::fs::create_dir_all(&genre_dir).unwrap();
            for i in 0..*count {
                let name = format!("{}.{:05}.png", genre, i);
                write_test_image(&genre_dir.join(name), 32, 32, (i * 7 % 256) as u8);
            }
        }
    }

    #[test]
    fn test_from_directory_sorts_genres() {
        let dir = tempfile::tempdir().unwrap();
        make_split(dir.path(), &[("rock", 2), ("blues", 3), ("jazz", 1)]);

        let dataset = GtzanDataset::from_directory_with_size(dir.path(), 32).unwrap();

        assert_eq!(dataset.genres, vec!["blues", "jazz", "rock"]);
        assert_eq!(dataset.len(), 6);
        assert_eq!(dataset.class_distribution(), vec![3, 1, 2]);
        assert_eq!(dataset.class_to_idx["rock"], 2);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let result = GtzanDataset::from_directory("/definitely/not/a/dataset");
        assert!(matches!(result, Err(GtzanError::Dataset(_))));
    }

    #[test]
    fn test_empty_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = GtzanDataset::from_directory(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_non_image_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        make_split(dir.path(), &[("blues", 2)]);
        std::fs::write(dir.path().join("blues").join("notes.txt"), "not an image").unwrap();

        let dataset = GtzanDataset::from_directory_with_size(dir.path(), 32).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_load_image_chw() {
        let dir = tempfile::tempdir().unwrap();
        make_split(dir.path(), &[("blues", 1)]);

        let dataset = GtzanDataset::from_directory_with_size(dir.path(), 16).unwrap();
        let img = dataset.load_image(&dataset.samples[0]).unwrap();
        let data = dataset.to_chw(&img);

        assert_eq!(data.len(), 3 * 16 * 16);
        assert!(data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_load_image_failure_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        make_split(dir.path(), &[("blues", 1)]);

        let dataset = GtzanDataset::from_directory_with_size(dir.path(), 16).unwrap();
        let mut sample = dataset.samples[0].clone();
        sample.path = dir.path().join("blues").join("missing.png");

        let err = dataset.load_image(&sample).unwrap_err();
        assert!(format!("{}", err).contains("missing.png"));
    }
}
