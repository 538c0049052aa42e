//! Training module for DCGAN
//!
//! This module provides:
//! - Training loop implementation
//! - Loss functions (Binary Cross Entropy)
//! - Running means and per-epoch metrics
//! - Epoch monitors for samples and artifacts

mod losses;
mod metrics;
mod monitor;
mod trainer;

pub use losses::{bce_with_logits, discriminator_loss, generator_loss, FAKE_LABEL, REAL_LABEL};
pub use metrics::{EpochLogs, MeanMetric, TrainingMetrics};
pub use monitor::{EpochMonitor, GanMonitor, MetricsCsvMonitor};
pub use trainer::{
    discriminator_step, generator_step, train_step, DiscriminatorStep, GanOptimizers, StepLosses,
    Trainer, TrainingConfig, MIN_BATCH_SIZE,
};
