//! Observers fired by the training loop
//!
//! Monitors only read the model. They render samples and write artifacts;
//! they never change parameters or optimizer state.

use std::path::{Path, PathBuf};

use tch::Tensor;
use tracing::{debug, info};

use super::metrics::{EpochLogs, TrainingMetrics};
use crate::error::Result;
use crate::model::DCGAN;
use crate::utils::{save_generator_artifact, save_grid, GeneratorMeta, ModelConfig, MonitorConfig};

/// Hook invoked by [`Trainer::fit`](super::Trainer::fit) at epoch boundaries
pub trait EpochMonitor {
    /// Called after every epoch with the zero-based epoch index
    fn on_epoch_end(&mut self, epoch: usize, model: &DCGAN, logs: &EpochLogs) -> Result<()>;

    /// Called once after the final epoch
    fn on_train_end(&mut self, _model: &DCGAN, _history: &TrainingMetrics) -> Result<()> {
        Ok(())
    }
}

/// Renders a fixed latent seed every epoch and saves the generator at the end
pub struct GanMonitor {
    seed: Tensor,
    num_img: usize,
    grid_cols: usize,
    samples_dir: PathBuf,
    generator_path: PathBuf,
    model_config: ModelConfig,
}

impl GanMonitor {
    /// Create a monitor writing into `output_dir`
    ///
    /// The latent seed is drawn once here, so every epoch renders the same
    /// points of latent space.
    pub fn new<P: AsRef<Path>>(
        model: &DCGAN,
        model_config: ModelConfig,
        config: &MonitorConfig,
        output_dir: P,
    ) -> Self {
        let output_dir = output_dir.as_ref();
        Self {
            seed: model.sample_latent(config.seed_size),
            num_img: config.num_img,
            grid_cols: config.grid_cols,
            samples_dir: output_dir.join("samples"),
            generator_path: output_dir.join("generator.ot"),
            model_config,
        }
    }

    /// The fixed latent seed
    pub fn seed(&self) -> &Tensor {
        &self.seed
    }

    /// Where the epoch grid for `epoch` is written
    pub fn sample_path(&self, epoch: usize) -> PathBuf {
        self.samples_dir.join(format!("epoch_{:03}.png", epoch + 1))
    }

    /// Where the generator is written at the end of training
    pub fn generator_path(&self) -> &Path {
        &self.generator_path
    }
}

impl EpochMonitor for GanMonitor {
    fn on_epoch_end(&mut self, epoch: usize, model: &DCGAN, _logs: &EpochLogs) -> Result<()> {
        let images = model.generate_from_noise(&self.seed);
        let path = self.sample_path(epoch);
        save_grid(&images, self.num_img, self.grid_cols, &path)?;
        debug!("Saved samples to {}", path.display());
        Ok(())
    }

    fn on_train_end(&mut self, model: &DCGAN, history: &TrainingMetrics) -> Result<()> {
        let meta = GeneratorMeta::new(
            self.model_config.clone(),
            history.num_epochs(),
            history.latest_gen_loss(),
            history.latest_disc_loss(),
        );
        save_generator_artifact(model, &meta, &self.generator_path)?;
        info!("Generator written to {}", self.generator_path.display());
        Ok(())
    }
}

/// Writes the metrics history to CSV after every epoch
pub struct MetricsCsvMonitor {
    path: PathBuf,
    history: TrainingMetrics,
}

impl MetricsCsvMonitor {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            history: TrainingMetrics::new(),
        }
    }
}

impl EpochMonitor for MetricsCsvMonitor {
    fn on_epoch_end(&mut self, _epoch: usize, _model: &DCGAN, logs: &EpochLogs) -> Result<()> {
        self.history.record_epoch(logs);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.history.save_csv(&self.path)
    }
}
