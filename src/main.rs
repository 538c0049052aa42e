//! DCGAN for Fashion-MNIST image generation
//!
//! Main entry point providing CLI interface for:
//! - Previewing the training data
//! - Training the DCGAN model
//! - Generating sample grids and latent sweeps from a trained generator

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ndarray::s;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use fashion_dcgan::{
    data::{class_name, normalize_images, DataLoader, FashionMnist},
    model::DCGAN,
    training::{GanMonitor, MetricsCsvMonitor, Trainer, TrainingConfig},
    utils::{load_generator_artifact, save_frames, save_grid, Config, PixelBatch},
};

/// DCGAN for synthetic Fashion-MNIST images
#[derive(Parser)]
#[command(name = "fashion_dcgan")]
#[command(version = "0.1.0")]
#[command(about = "Train a DCGAN on Fashion-MNIST and sample from it")]
struct Cli {
    /// Path to configuration file (.json or .toml)
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SweepMode {
    /// An independent random latent vector per frame
    Random,
    /// Linear path between two random latent vectors
    Interpolate,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize default configuration file
    Init {
        /// Output configuration file path
        #[arg(short, long, default_value = "config.json")]
        output: String,
    },

    /// Render the first training images as a grid
    Preview {
        /// Directory holding the IDX files (overrides config)
        #[arg(short, long)]
        data: Option<String>,

        /// Number of images to show
        #[arg(short, long, default_value = "12")]
        num_images: usize,

        /// Output PNG path
        #[arg(short, long, default_value = "output/preview.png")]
        output: String,
    },

    /// Train the DCGAN model
    Train {
        /// Directory holding the IDX files (overrides config)
        #[arg(short, long)]
        data: Option<String>,

        /// Number of epochs (overrides config)
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Random seed (overrides config)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Generate a grid of images from fresh noise
    Generate {
        /// Path to trained generator weights
        #[arg(short, long)]
        model: Option<String>,

        /// Number of images to generate
        #[arg(short, long, default_value = "16", value_parser = clap::value_parser!(i64).range(1..))]
        num_samples: i64,

        /// Output PNG path
        #[arg(short, long, default_value = "output/generated.png")]
        output: String,
    },

    /// Write single-image frames walking the latent space
    Sweep {
        /// Path to trained generator weights
        #[arg(short, long)]
        model: Option<String>,

        /// Number of frames
        #[arg(short, long, default_value = "30", value_parser = clap::value_parser!(i64).range(1..))]
        frames: i64,

        /// How latent vectors are chosen per frame
        #[arg(long, value_enum, default_value = "random")]
        mode: SweepMode,

        /// Output directory for the frames
        #[arg(short, long, default_value = "output/sweep")]
        output: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { output } => {
            init_config(&output)?;
        }
        Commands::Preview {
            data,
            num_images,
            output,
        } => {
            let config = load_config(&cli.config)?;
            preview_dataset(&config, data, num_images, &output)?;
        }
        Commands::Train { data, epochs, seed } => {
            let config = load_config(&cli.config)?;
            train_model(config, data, epochs, seed)?;
        }
        Commands::Generate {
            model,
            num_samples,
            output,
        } => {
            let config = load_config(&cli.config)?;
            generate_grid(&config, model, num_samples, &output)?;
        }
        Commands::Sweep {
            model,
            frames,
            mode,
            output,
        } => {
            let config = load_config(&cli.config)?;
            latent_sweep(&config, model, frames, mode, &output)?;
        }
    }

    Ok(())
}

/// Load configuration, falling back to defaults when the file is missing
fn load_config(config_path: &str) -> Result<Config> {
    let config = if Path::new(config_path).exists() {
        Config::load(config_path).with_context(|| format!("failed to load {config_path}"))?
    } else {
        info!("Config file not found, using defaults");
        Config::default()
    };
    config.validate()?;
    Ok(config)
}

/// Show the first training images and their classes
fn preview_dataset(
    config: &Config,
    data_dir: Option<String>,
    num_images: usize,
    output_path: &str,
) -> Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let dataset = FashionMnist::load_train(&data_dir)
        .with_context(|| format!("failed to load training data from {data_dir}"))?;

    let n = num_images.min(dataset.len());
    let images = dataset.images.slice(s![..n, .., ..]).to_owned();
    let grid = PixelBatch::from_grayscale(&images).to_grid(n, config.monitor.grid_cols)?;

    create_parent(output_path)?;
    grid.save(output_path)?;

    for (i, &label) in dataset.labels.iter().take(n).enumerate() {
        info!("  {:2}: {}", i, class_name(label).unwrap_or("unknown"));
    }
    info!("Saved preview of {} images to {}", n, output_path);

    Ok(())
}

/// Train the DCGAN model
fn train_model(
    mut config: Config,
    data_dir: Option<String>,
    epochs: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    if let Some(epochs) = epochs {
        config.training.epochs = epochs;
    }
    if seed.is_some() {
        config.training.seed = seed;
    }
    if let Some(seed) = config.training.seed {
        tch::manual_seed(seed as i64);
        info!("Using seed {}", seed);
    }

    // Determine device
    let device = config.get_device();
    info!("Using device: {:?}", device);

    // Load and preprocess data
    let data_dir = data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let dataset = FashionMnist::load_train(&data_dir)
        .with_context(|| format!("failed to load training data from {data_dir}"))?;
    info!("Loaded {} training images", dataset.len());

    let mut data_loader = DataLoader::new(
        normalize_images(&dataset.images),
        config.data.batch_size,
        config.data.shuffle,
        config.data.drop_last,
        config.training.seed,
    )?;

    // Create model
    let model = DCGAN::from_config(&config.model, device)?;

    let output_dir = PathBuf::from(&config.training.output_dir);
    std::fs::create_dir_all(&output_dir)?;

    // Create trainer
    let training_config = TrainingConfig {
        epochs: config.training.epochs,
        gen_adam: config.training.gen_adam(),
        disc_adam: config.training.disc_adam(),
        ..Default::default()
    };

    let mut trainer = Trainer::new(training_config);
    trainer.add_monitor(GanMonitor::new(
        &model,
        config.model.clone(),
        &config.monitor,
        &output_dir,
    ));
    trainer.add_monitor(MetricsCsvMonitor::new(output_dir.join("metrics.csv")));

    // Train
    let metrics = match trainer.fit(&model, &mut data_loader) {
        Err(e) if e.is_divergence() => {
            error!("Training diverged, consider lowering the learning rates");
            return Err(e.into());
        }
        result => result?,
    };

    info!(
        "Training complete. Final G_loss: {:.4}, D_loss: {:.4}",
        metrics.latest_gen_loss().unwrap_or(0.0),
        metrics.latest_disc_loss().unwrap_or(0.0)
    );

    Ok(())
}

fn load_trained(config: &Config, model_path: Option<String>) -> Result<DCGAN> {
    let model_path = model_path.map(PathBuf::from).unwrap_or_else(|| {
        Path::new(&config.training.output_dir).join("generator.ot")
    });

    let (model, meta) = load_generator_artifact(&model_path, Some(&config.model), config.get_device())
        .with_context(|| format!("failed to load generator from {}", model_path.display()))?;

    if let Some(meta) = meta {
        info!(
            "Loaded generator trained for {} epochs ({})",
            meta.epochs, meta.timestamp
        );
    }

    Ok(model)
}

/// Generate a grid from fresh noise
fn generate_grid(
    config: &Config,
    model_path: Option<String>,
    num_samples: i64,
    output_path: &str,
) -> Result<()> {
    let model = load_trained(config, model_path)?;

    info!("Generating {} synthetic images", num_samples);
    let samples = model.generate(num_samples);

    save_grid(&samples, num_samples as usize, config.monitor.grid_cols, output_path)?;
    info!("Saved grid to {}", output_path);

    Ok(())
}

/// Write one frame per latent vector
fn latent_sweep(
    config: &Config,
    model_path: Option<String>,
    frames: i64,
    mode: SweepMode,
    output_dir: &str,
) -> Result<()> {
    let model = load_trained(config, model_path)?;

    let images = match mode {
        SweepMode::Random => model.generate(frames),
        SweepMode::Interpolate => {
            let endpoints = model.sample_latent(2);
            model.interpolate(&endpoints.get(0), &endpoints.get(1), frames)?
        }
    };

    let paths = save_frames(&images, output_dir)?;
    info!("Saved {} frames to {}", paths.len(), output_dir);

    Ok(())
}

fn create_parent(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Initialize default configuration file
fn init_config(output_path: &str) -> Result<()> {
    let config = Config::default();
    config.save(output_path)?;

    info!("Created default configuration at {}", output_path);
    Ok(())
}
