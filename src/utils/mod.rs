//! Utility module with helper functions
//!
//! This module provides:
//! - Configuration handling
//! - Generator artifact save/load
//! - Visualization helpers

mod artifact;
mod config;
mod visualize;

pub use artifact::{
    load_generator_artifact, load_generator_meta, meta_path, save_generator_artifact, GeneratorMeta,
};
pub use config::{
    Config, DataConfig, ModelConfig, MonitorConfig, TrainingConfigFile,
};
pub use visualize::{save_frames, save_grid, PixelBatch, GRID_PADDING};
