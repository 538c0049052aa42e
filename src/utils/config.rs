//! Configuration management
//!
//! Provides unified configuration for the entire DCGAN pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DcganError, Result};
use crate::model::AdamConfig;
use crate::training::MIN_BATCH_SIZE;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data configuration
    pub data: DataConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Training configuration
    pub training: TrainingConfigFile,
    /// Sample rendering configuration
    pub monitor: MonitorConfig,
}

/// Data-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the IDX files
    pub data_dir: String,
    /// Batch size
    pub batch_size: usize,
    /// Shuffle images every epoch
    pub shuffle: bool,
    /// Drop the final incomplete batch
    pub drop_last: bool,
}

/// Model-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Latent dimension size
    pub latent_dim: i64,
    /// Height and width of the images
    pub image_size: i64,
    /// Image channels (1 for grayscale)
    pub channels: i64,
    /// Number of up/down-sampling stages in each network
    pub num_layers: usize,
    /// Filters of the generator's projected feature map
    pub gen_base_filters: i64,
    /// Filters of the discriminator's first convolution
    pub disc_base_filters: i64,
    /// Dropout rate for discriminator
    pub dropout: f64,
    /// LeakyReLU slope for discriminator
    pub leaky_slope: f64,
    /// Std of the generator's convolution kernel init
    pub weight_init_std: f64,
}

/// Training-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfigFile {
    /// Number of epochs
    pub epochs: usize,
    /// Generator learning rate
    pub gen_lr: f64,
    /// Discriminator learning rate
    pub disc_lr: f64,
    /// Adam first-moment decay
    pub beta1: f64,
    /// Adam second-moment decay
    pub beta2: f64,
    /// Seed for libtorch and the data loader; unseeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Output directory for the generator, metrics and samples
    pub output_dir: String,
    /// Device: "cpu" or "cuda"
    pub device: String,
}

/// Per-epoch sample rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Number of latent vectors in the fixed seed
    pub seed_size: i64,
    /// Number of images rendered from the seed
    pub num_img: usize,
    /// Columns of the rendered grid
    pub grid_cols: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                data_dir: "data/fashion".to_string(),
                batch_size: 32,
                shuffle: true,
                drop_last: false,
            },
            model: ModelConfig {
                latent_dim: 100,
                image_size: 28,
                channels: 1,
                num_layers: 2,
                gen_base_filters: 256,
                disc_base_filters: 64,
                dropout: 0.3,
                leaky_slope: 0.2,
                weight_init_std: 0.02,
            },
            training: TrainingConfigFile {
                epochs: 10,
                gen_lr: 2e-4,
                disc_lr: 2e-4,
                beta1: 0.5,
                beta2: 0.999,
                seed: None,
                output_dir: "output".to_string(),
                device: "cpu".to_string(),
            },
            monitor: MonitorConfig {
                seed_size: 16,
                num_img: 16,
                grid_cols: 4,
            },
        }
    }
}

impl ModelConfig {
    /// Validate model dimensions
    pub fn validate(&self) -> Result<()> {
        if self.latent_dim <= 0 {
            return Err(invalid("latent dimension must be > 0"));
        }
        if self.image_size <= 0 || self.channels <= 0 {
            return Err(invalid("image size and channels must be > 0"));
        }
        if self.num_layers == 0 || self.num_layers > 8 {
            return Err(invalid("num_layers must be between 1 and 8"));
        }
        let scale = 1i64 << self.num_layers;
        if self.image_size % scale != 0 {
            return Err(invalid(format!(
                "image size {} is not divisible by 2^{}",
                self.image_size, self.num_layers
            )));
        }
        if self.gen_base_filters < scale {
            return Err(invalid(format!(
                "generator base filters {} cannot be halved {} times",
                self.gen_base_filters, self.num_layers
            )));
        }
        if self.disc_base_filters <= 0 {
            return Err(invalid("discriminator base filters must be > 0"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(invalid("dropout must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.leaky_slope) {
            return Err(invalid("leaky slope must be in [0, 1)"));
        }
        Ok(())
    }
}

impl TrainingConfigFile {
    /// Generator optimizer settings
    pub fn gen_adam(&self) -> AdamConfig {
        AdamConfig {
            lr: self.gen_lr,
            beta1: self.beta1,
            beta2: self.beta2,
        }
    }

    /// Discriminator optimizer settings
    pub fn disc_adam(&self) -> AdamConfig {
        AdamConfig {
            lr: self.disc_lr,
            beta1: self.beta1,
            beta2: self.beta2,
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `.toml` or JSON depending on the extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if is_toml(path.as_ref()) {
            Self::from_toml(path)
        } else {
            Self::from_json(path)
        }
    }

    /// Save as `.toml` or JSON depending on the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if is_toml(path.as_ref()) {
            self.save_toml(path)
        } else {
            self.save_json(path)
        }
    }

    /// Get device from configuration
    pub fn get_device(&self) -> tch::Device {
        match self.training.device.to_lowercase().as_str() {
            "cuda" | "gpu" => {
                if tch::Cuda::is_available() {
                    tch::Device::Cuda(0)
                } else {
                    tracing::warn!("CUDA requested but not available, falling back to CPU");
                    tch::Device::Cpu
                }
            }
            _ => tch::Device::Cpu,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.data.batch_size < MIN_BATCH_SIZE {
            return Err(invalid(format!(
                "batch size must be at least {MIN_BATCH_SIZE}, got {}",
                self.data.batch_size
            )));
        }
        self.model.validate()?;
        if self.training.epochs == 0 {
            return Err(invalid("number of epochs must be > 0"));
        }
        if self.training.gen_lr <= 0.0 || self.training.disc_lr <= 0.0 {
            return Err(invalid("learning rates must be > 0"));
        }
        if self.monitor.grid_cols == 0 {
            return Err(invalid("grid columns must be > 0"));
        }
        if self.monitor.num_img as i64 > self.monitor.seed_size {
            return Err(invalid(format!(
                "cannot render {} images from a seed of {}",
                self.monitor.num_img, self.monitor.seed_size
            )));
        }
        Ok(())
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

fn invalid(msg: impl Into<String>) -> DcganError {
    DcganError::Config(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.model.latent_dim, 100);
        assert_eq!(config.data.batch_size, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.training.seed = Some(42);

        for name in ["config.json", "config.toml"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(Config::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.data.batch_size = 0;
        assert!(config.validate().is_err());
        config.data.batch_size = 1;
        assert!(matches!(config.validate(), Err(DcganError::Config(_))));
        config.data.batch_size = 2;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.model.image_size = 30;
        assert!(matches!(config.validate(), Err(DcganError::Config(_))));

        let mut config = Config::default();
        config.monitor.num_img = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_adam_settings() {
        let config = Config::default();
        let adam = config.training.gen_adam();
        assert_eq!(adam, AdamConfig::default());
    }
}
