//! Generator artifact save/load utilities
//!
//! The trained generator is written as a single weights file with a JSON
//! sidecar (`<name>.json`) recording the model configuration, so the
//! generator can be rebuilt later without the original config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DcganError, Result};
use crate::model::DCGAN;
use crate::utils::ModelConfig;

/// Sidecar metadata for a saved generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorMeta {
    /// Number of epochs trained
    pub epochs: usize,
    /// Mean generator loss of the last epoch
    pub g_loss: Option<f64>,
    /// Mean discriminator loss of the last epoch
    pub d_loss: Option<f64>,
    /// Timestamp of the save
    pub timestamp: String,
    /// Model configuration the weights belong to
    pub model: ModelConfig,
}

impl GeneratorMeta {
    pub fn new(model: ModelConfig, epochs: usize, g_loss: Option<f64>, d_loss: Option<f64>) -> Self {
        Self {
            epochs,
            g_loss,
            d_loss,
            timestamp: chrono::Utc::now().to_rfc3339(),
            model,
        }
    }
}

/// Path of the sidecar that accompanies `weights_path`
pub fn meta_path(weights_path: &Path) -> PathBuf {
    weights_path.with_extension("json")
}

/// Save generator weights plus metadata sidecar
///
/// # Returns
///
/// Path of the sidecar file
pub fn save_generator_artifact<P: AsRef<Path>>(
    model: &DCGAN,
    meta: &GeneratorMeta,
    weights_path: P,
) -> Result<PathBuf> {
    let weights_path = weights_path.as_ref();
    if let Some(parent) = weights_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    model.save_generator(weights_path)?;

    let sidecar = meta_path(weights_path);
    std::fs::write(&sidecar, serde_json::to_string_pretty(meta)?)?;

    tracing::info!("Saved generator to {}", weights_path.display());
    Ok(sidecar)
}

/// Load generator metadata
pub fn load_generator_meta<P: AsRef<Path>>(weights_path: P) -> Result<GeneratorMeta> {
    let content = std::fs::read_to_string(meta_path(weights_path.as_ref()))?;
    Ok(serde_json::from_str(&content)?)
}

/// Rebuild a DCGAN from a saved generator
///
/// Only the generator is restored; the discriminator keeps fresh weights.
/// When `fallback` is given it is used if the sidecar is missing.
pub fn load_generator_artifact<P: AsRef<Path>>(
    weights_path: P,
    fallback: Option<&ModelConfig>,
    device: tch::Device,
) -> Result<(DCGAN, Option<GeneratorMeta>)> {
    let weights_path = weights_path.as_ref();
    if !weights_path.exists() {
        return Err(DcganError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("generator weights not found at {}", weights_path.display()),
        )));
    }

    let meta = if meta_path(weights_path).exists() {
        Some(load_generator_meta(weights_path)?)
    } else {
        None
    };

    let model_config = match (&meta, fallback) {
        (Some(meta), _) => meta.model.clone(),
        (None, Some(config)) => {
            tracing::warn!("No sidecar for {}, using configured model", weights_path.display());
            config.clone()
        }
        (None, None) => {
            return Err(DcganError::Config(format!(
                "no metadata found for {}",
                weights_path.display()
            )))
        }
    };

    let mut model = DCGAN::from_config(&model_config, device)?;
    model.load_generator(weights_path)?;

    tracing::info!("Loaded generator from {}", weights_path.display());
    Ok((model, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parameters_equal;
    use crate::utils::Config;
    use tch::Device;

    #[test]
    fn test_meta_serialization() {
        let meta = GeneratorMeta::new(Config::default().model, 10, Some(0.9), Some(0.6));

        let json = serde_json::to_string(&meta).unwrap();
        let loaded: GeneratorMeta = serde_json::from_str(&json).unwrap();

        assert_eq!(meta, loaded);
    }

    #[test]
    fn test_artifact_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("nested").join("generator.ot");

        let mut model_config = Config::default().model;
        model_config.latent_dim = 8;
        model_config.gen_base_filters = 16;
        model_config.disc_base_filters = 4;

        let model = DCGAN::from_config(&model_config, Device::Cpu).unwrap();
        let meta = GeneratorMeta::new(model_config.clone(), 1, None, None);
        let sidecar = save_generator_artifact(&model, &meta, &weights).unwrap();
        assert_eq!(sidecar, dir.path().join("nested").join("generator.json"));

        let (loaded, loaded_meta) = load_generator_artifact(&weights, None, Device::Cpu).unwrap();
        assert_eq!(loaded_meta.unwrap().model, model_config);
        assert_eq!(loaded.latent_dim(), 8);
        assert!(parameters_equal(
            &model.generator_parameters(),
            &loaded.generator_parameters()
        ));
    }

    #[test]
    fn test_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_generator_artifact(dir.path().join("none.ot"), None, Device::Cpu);
        assert!(result.is_err());
    }
}
