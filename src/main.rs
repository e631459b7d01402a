//! GTZAN Semi-Supervised Learning CLI
//!
//! Entry point for training, evaluating, and probing the music genre
//! classification system built on the Burn framework.

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use gtzan_ssl::backend::TrainingBackend;
use gtzan_ssl::training::{ConsoleSink, NullSink, TrainingSink};
use gtzan_ssl::utils::logging::{init_logging, LogConfig};
use gtzan_ssl::{SemiSupervisedConfig, SupervisedConfig};

/// GTZAN Semi-Supervised Music Genre Classification
///
/// Trains a CNN over GTZAN spectrogram images from a small labeled subset and
/// a large unlabeled pool, using fixed-ratio batch pairing and mixup.
#[derive(Parser, Debug)]
#[command(name = "gtzan_ssl")]
#[command(version = "0.1.0")]
#[command(about = "Semi-supervised music genre classification with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train with semi-supervised mixup over labeled + unlabeled data
    Train {
        /// Training split directory (one subdirectory per genre)
        #[arg(short, long, default_value = "data/gtzan/train")]
        data_dir: String,

        /// Held-out split directory for between-epoch evaluation
        #[arg(long, default_value = "data/gtzan/test")]
        eval_dir: String,

        /// Label file marking the labeled subset (`<file_name> <genre>` lines)
        #[arg(short, long, default_value = "data/gtzan/labels/train.txt")]
        labels: String,

        /// Number of training epochs
        #[arg(short, long, default_value = "30")]
        epochs: usize,

        /// Combined batch size (labeled + unlabeled)
        #[arg(short, long, default_value = "16")]
        batch_size: usize,

        /// Labeled examples per batch
        #[arg(long, default_value = "4")]
        labeled_batch_size: usize,

        /// Augmented views per example
        #[arg(long, default_value = "2")]
        aug_num: usize,

        /// Beta(alpha, alpha) parameter for mixup
        #[arg(long, default_value = "1.0")]
        alpha: f64,

        /// Base learning rate
        #[arg(short, long, default_value = "0.0005")]
        learning_rate: f64,

        /// Weight decay (L2 regularization)
        #[arg(long, default_value = "0.0001")]
        weight_decay: f64,

        /// Cosine rampdown horizon in epochs (>= epochs); omit for a constant rate
        #[arg(long)]
        rampdown_epochs: Option<usize>,

        /// k for the top-k evaluation metric
        #[arg(long, default_value = "9")]
        topk: usize,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output directory for the trained model
        #[arg(short, long, default_value = "output/ssl")]
        output_dir: String,

        /// Show a per-step progress bar
        #[arg(long, default_value = "false")]
        progress: bool,
    },

    /// Train the supervised baseline (no unlabeled data, no mixup)
    TrainSupervised {
        /// Training split directory (one subdirectory per genre)
        #[arg(short, long, default_value = "data/gtzan/train")]
        data_dir: String,

        /// Held-out split directory for between-epoch evaluation
        #[arg(long, default_value = "data/gtzan/test")]
        eval_dir: String,

        /// Optional label file; when given, trains on the labeled subset only
        #[arg(short, long)]
        labels: Option<String>,

        /// Number of training epochs
        #[arg(short, long, default_value = "30")]
        epochs: usize,

        /// Batch size
        #[arg(short, long, default_value = "16")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value = "0.0005")]
        learning_rate: f64,

        /// Weight decay (L2 regularization)
        #[arg(long, default_value = "0.0001")]
        weight_decay: f64,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output directory for the trained model
        #[arg(short, long, default_value = "output/supervised")]
        output_dir: String,

        /// Show a per-step progress bar
        #[arg(long, default_value = "false")]
        progress: bool,
    },

    /// Evaluate a trained model on a dataset split
    Evaluate {
        /// Split directory to evaluate on
        #[arg(short, long, default_value = "data/gtzan/test")]
        data_dir: String,

        /// Path to the trained model
        #[arg(short, long)]
        model: String,

        /// Batch size for evaluation
        #[arg(short, long, default_value = "16")]
        batch_size: usize,

        /// k for the top-k metric
        #[arg(long, default_value = "9")]
        topk: usize,
    },

    /// Extract penultimate embeddings for downstream label propagation
    ExtractFeatures {
        /// Split directory to extract from
        #[arg(short, long, default_value = "data/gtzan/train")]
        data_dir: String,

        /// Path to the trained model
        #[arg(short, long)]
        model: String,

        /// Output JSON file for the feature matrix
        #[arg(short, long, default_value = "output/features.json")]
        output: String,

        /// Batch size for extraction
        #[arg(short, long, default_value = "16")]
        batch_size: usize,
    },

    /// Show dataset statistics
    Stats {
        /// Path to a dataset split directory
        #[arg(short, long, default_value = "data/gtzan/train")]
        data_dir: String,

        /// Optional label file; when given, also shows the labeled/unlabeled split
        #[arg(short, long)]
        labels: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            data_dir,
            eval_dir,
            labels,
            epochs,
            batch_size,
            labeled_batch_size,
            aug_num,
            alpha,
            learning_rate,
            weight_decay,
            rampdown_epochs,
            topk,
            seed,
            output_dir,
            progress,
        } => {
            let config = SemiSupervisedConfig {
                batch_size,
                labeled_batch_size,
                aug_num,
                alpha,
                base_lr: learning_rate,
                weight_decay,
                epochs,
                rampdown_epochs,
                topk,
                seed,
            };

            let mut sink = make_sink(progress);
            gtzan_ssl::training::run_semi_supervised::<TrainingBackend>(
                &data_dir,
                &eval_dir,
                &labels,
                &config,
                &output_dir,
                sink.as_mut(),
            )?;
        }

        Commands::TrainSupervised {
            data_dir,
            eval_dir,
            labels,
            epochs,
            batch_size,
            learning_rate,
            weight_decay,
            seed,
            output_dir,
            progress,
        } => {
            let config = SupervisedConfig {
                batch_size,
                learning_rate,
                weight_decay,
                epochs,
                seed,
            };

            let mut sink = make_sink(progress);
            gtzan_ssl::training::run_supervised::<TrainingBackend>(
                &data_dir,
                &eval_dir,
                labels.as_deref(),
                &config,
                &output_dir,
                sink.as_mut(),
            )?;
        }

        Commands::Evaluate {
            data_dir,
            model,
            batch_size,
            topk,
        } => {
            cmd_evaluate(&data_dir, &model, batch_size, topk)?;
        }

        Commands::ExtractFeatures {
            data_dir,
            model,
            output,
            batch_size,
        } => {
            cmd_extract_features(&data_dir, &model, &output, batch_size)?;
        }

        Commands::Stats { data_dir, labels } => {
            cmd_stats(&data_dir, labels.as_deref())?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔═══════════════════════════════════════════════════════════╗
 ║   🎵 GTZAN Semi-Supervised Learning                        ║
 ║   Music Genre Classification with Burn + Rust              ║
 ║   Mixup over Labeled + Unlabeled Spectrograms              ║
 ╚═══════════════════════════════════════════════════════════╝
  "#
        .green()
    );
}

fn make_sink(progress: bool) -> Box<dyn TrainingSink> {
    if progress {
        Box::new(ConsoleSink::new())
    } else {
        Box::new(NullSink)
    }
}

fn cmd_evaluate(data_dir: &str, model_path: &str, batch_size: usize, topk: usize) -> Result<()> {
    use burn::module::Module;
    use burn::record::CompactRecorder;
    use gtzan_ssl::backend::{backend_name, default_device, DefaultBackend};
    use gtzan_ssl::dataset::multiview::SingleViewDataset;
    use gtzan_ssl::inference::evaluate;
    use gtzan_ssl::model::cnn::{GenreClassifier, GenreClassifierConfig};
    use gtzan_ssl::GtzanDataset;

    info!("Evaluating model");
    info!("  Data: {}", data_dir);
    info!("  Model: {}", model_path);

    println!("{}", "Evaluation Configuration:".cyan().bold());
    println!("  📂 Data:    {}", data_dir);
    println!("  🧠 Model:   {}", model_path);
    println!("  🖥  Backend: {}", backend_name());
    println!();

    if !Path::new(data_dir).exists() {
        println!("{} Data directory not found: {}", "Error:".red(), data_dir);
        return Ok(());
    }

    if !Path::new(model_path).exists() {
        println!("{} Model file not found: {}", "Error:".red(), model_path);
        println!();
        println!("Train a model first:");
        println!("  gtzan_ssl train --output-dir output/ssl");
        return Ok(());
    }

    println!("{}", "Loading model...".cyan());
    let device = default_device();
    let config = GenreClassifierConfig::new();
    let model: GenreClassifier<DefaultBackend> = GenreClassifier::new(&config, &device);
    let recorder = CompactRecorder::new();
    let model = model
        .load_file(model_path, &recorder, &device)
        .map_err(|e| anyhow::anyhow!("Failed to load model: {:?}", e))?;

    println!("{}", "Loading dataset...".cyan());
    let loader = GtzanDataset::from_directory(data_dir)?;
    let image_size = loader.image_size.0 as usize;
    let dataset = SingleViewDataset::from_loader(&loader)?;

    println!("{}", "Evaluating...".cyan());
    let report = evaluate(&model, &dataset, batch_size, image_size, topk, &device)?;

    println!();
    println!("{}", "Results:".green().bold());
    println!("  🎯 Top-1 accuracy: {:.2}%", report.top1);
    println!("  🎯 Top-{} accuracy: {:.2}%", report.k, report.topk);
    println!("  📊 Samples:        {}", report.samples);

    Ok(())
}

fn cmd_extract_features(
    data_dir: &str,
    model_path: &str,
    output: &str,
    batch_size: usize,
) -> Result<()> {
    use burn::module::Module;
    use burn::record::CompactRecorder;
    use gtzan_ssl::backend::{backend_name, default_device, DefaultBackend};
    use gtzan_ssl::dataset::multiview::SingleViewDataset;
    use gtzan_ssl::inference::extract_features;
    use gtzan_ssl::model::cnn::{GenreClassifier, GenreClassifierConfig};
    use gtzan_ssl::GtzanDataset;

    info!("Extracting features");
    info!("  Data: {}", data_dir);
    info!("  Model: {}", model_path);
    info!("  Output: {}", output);

    println!("{}", "Feature Extraction:".cyan().bold());
    println!("  📂 Data:    {}", data_dir);
    println!("  🧠 Model:   {}", model_path);
    println!("  🖥  Backend: {}", backend_name());
    println!();

    if !Path::new(data_dir).exists() {
        println!("{} Data directory not found: {}", "Error:".red(), data_dir);
        return Ok(());
    }

    if !Path::new(model_path).exists() {
        println!("{} Model file not found: {}", "Error:".red(), model_path);
        return Ok(());
    }

    println!("{}", "Loading model...".cyan());
    let device = default_device();
    let config = GenreClassifierConfig::new();
    let model: GenreClassifier<DefaultBackend> = GenreClassifier::new(&config, &device);
    let recorder = CompactRecorder::new();
    let model = model
        .load_file(model_path, &recorder, &device)
        .map_err(|e| anyhow::anyhow!("Failed to load model: {:?}", e))?;

    println!("{}", "Loading dataset...".cyan());
    let loader = GtzanDataset::from_directory(data_dir)?;
    let image_size = loader.image_size.0 as usize;
    let dataset = SingleViewDataset::from_loader(&loader)?;

    println!("{}", "Extracting...".cyan());
    let matrix = extract_features(&model, &dataset, batch_size, image_size, &device)?;

    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    matrix.save(Path::new(output))?;

    println!();
    println!("{}", "Extraction Complete!".green().bold());
    println!("  📐 Rows:      {}", matrix.len());
    println!("  📏 Dimension: {}", matrix.dim());
    println!("  💾 Saved to:  {}", output);

    Ok(())
}

fn cmd_stats(data_dir: &str, labels: Option<&str>) -> Result<()> {
    use gtzan_ssl::dataset::split::IndexSplit;
    use gtzan_ssl::GtzanDataset;

    info!("Computing dataset statistics for: {}", data_dir);

    if !Path::new(data_dir).exists() {
        println!(
            "{} Dataset directory not found: {}",
            "Error:".red(),
            data_dir
        );
        println!();
        println!("Expected layout:");
        println!("  {}/", data_dir);
        println!("  ├── blues/");
        println!("  │   └── *.png");
        println!("  ├── classical/");
        println!("  └── ...");
        return Ok(());
    }

    match GtzanDataset::from_directory(data_dir) {
        Ok(dataset) => {
            let stats = dataset.stats();
            stats.print();

            if let Some(labels_path) = labels {
                match IndexSplit::from_label_file(&dataset, Path::new(labels_path)) {
                    Ok(split) => {
                        println!();
                        print!("{}", split.stats(&dataset));
                    }
                    Err(e) => {
                        println!("{} Failed to read label file: {}", "Error:".red(), e);
                    }
                }
            }
        }
        Err(e) => {
            println!("{} Failed to load dataset: {}", "Error:".red(), e);
        }
    }

    Ok(())
}
