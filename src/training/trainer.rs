//! Training loop implementation for DCGAN
//!
//! Every step updates the discriminator first and then the generator against
//! the freshly updated discriminator. Each network has its own optimizer, so
//! the generator sub-step can only move generator parameters.

use indicatif::{ProgressBar, ProgressStyle};
use tch::{nn, Kind, Tensor};
use tracing::{debug, info, warn};

use super::losses::{discriminator_loss, generator_loss};
use super::metrics::{EpochLogs, MeanMetric, TrainingMetrics};
use super::monitor::EpochMonitor;
use crate::data::{batch_to_tensor, DataLoader};
use crate::error::{DcganError, Result};
use crate::model::{AdamConfig, DCGAN};

/// Smallest batch train-mode batch norm can normalize
pub const MIN_BATCH_SIZE: usize = 2;

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Optimizer settings for the generator
    pub gen_adam: AdamConfig,
    /// Optimizer settings for the discriminator
    pub disc_adam: AdamConfig,
    /// Epoch window of the mode collapse heuristic
    pub collapse_window: usize,
    /// Draw a progress bar per epoch
    pub show_progress: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            gen_adam: AdamConfig::default(),
            disc_adam: AdamConfig::default(),
            collapse_window: 10,
            show_progress: true,
        }
    }
}

/// The two independent optimizers
pub struct GanOptimizers {
    pub generator: nn::Optimizer,
    pub discriminator: nn::Optimizer,
}

impl GanOptimizers {
    pub fn new(model: &DCGAN, config: &TrainingConfig) -> Result<Self> {
        Ok(Self {
            generator: model.gen_optimizer(&config.gen_adam)?,
            discriminator: model.disc_optimizer(&config.disc_adam)?,
        })
    }
}

/// Outcome of a discriminator update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscriminatorStep {
    pub d_loss: f64,
    pub real_acc: f64,
    pub fake_acc: f64,
}

/// Losses of one training step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLosses {
    pub d_loss: f64,
    pub g_loss: f64,
}

/// Update the discriminator on a real batch and a generated batch
///
/// `fake` is detached here, so no gradient reaches the generator.
pub fn discriminator_step(
    model: &DCGAN,
    disc_opt: &mut nn::Optimizer,
    real: &Tensor,
    fake: &Tensor,
) -> DiscriminatorStep {
    let real_output = model.discriminator.forward_t(real, true);
    let fake_output = model.discriminator.forward_t(&fake.detach(), true);

    let d_loss = discriminator_loss(&real_output, &fake_output);

    disc_opt.zero_grad();
    d_loss.backward();
    disc_opt.step();

    // sigmoid(x) >= 0.5 <=> x >= 0
    let real_acc = real_output.ge(0.0).to_kind(Kind::Float).mean(Kind::Float);
    let fake_acc = fake_output.lt(0.0).to_kind(Kind::Float).mean(Kind::Float);

    DiscriminatorStep {
        d_loss: d_loss.double_value(&[]),
        real_acc: real_acc.double_value(&[]),
        fake_acc: fake_acc.double_value(&[]),
    }
}

/// Update the generator by re-scoring `fake` with the current discriminator
///
/// Gradients also land on the discriminator's variables, but only the
/// generator's optimizer is stepped; the discriminator's own `zero_grad`
/// clears them before its next update.
pub fn generator_step(model: &DCGAN, gen_opt: &mut nn::Optimizer, fake: &Tensor) -> f64 {
    let fake_output = model.discriminator.forward_t(fake, true);
    let g_loss = generator_loss(&fake_output);

    gen_opt.zero_grad();
    g_loss.backward();
    gen_opt.step();

    g_loss.double_value(&[])
}

/// One adversarial step on a batch of real images, returning raw losses
///
/// The batch must be (batch, height, width, channels) with at least
/// [`MIN_BATCH_SIZE`] images.
pub fn train_step(
    model: &DCGAN,
    opts: &mut GanOptimizers,
    real: &Tensor,
) -> Result<(DiscriminatorStep, f64)> {
    model.check_image_batch(real)?;
    let batch_size = real.size()[0];
    if (batch_size as usize) < MIN_BATCH_SIZE {
        return Err(DcganError::BatchTooSmall {
            size: batch_size as usize,
            min: MIN_BATCH_SIZE,
        });
    }

    let noise = model.sample_latent(batch_size);
    let fake = model.generator.forward_t(&noise, true);

    let disc = discriminator_step(model, &mut opts.discriminator, real, &fake);
    let g_loss = generator_step(model, &mut opts.generator, &fake);

    Ok((disc, g_loss))
}

/// DCGAN Trainer
pub struct Trainer {
    config: TrainingConfig,
    metrics: TrainingMetrics,
    monitors: Vec<Box<dyn EpochMonitor>>,
    d_loss: MeanMetric,
    g_loss: MeanMetric,
    real_acc: MeanMetric,
    fake_acc: MeanMetric,
    epoch: usize,
    step: usize,
}

impl Trainer {
    /// Create a new trainer
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            metrics: TrainingMetrics::new(),
            monitors: Vec::new(),
            d_loss: MeanMetric::new(),
            g_loss: MeanMetric::new(),
            real_acc: MeanMetric::new(),
            fake_acc: MeanMetric::new(),
            epoch: 0,
            step: 0,
        }
    }

    /// Register a monitor fired at the end of each epoch
    pub fn add_monitor<M: EpochMonitor + 'static>(&mut self, monitor: M) {
        self.monitors.push(Box::new(monitor));
    }

    /// Run one training step and fold its losses into the running means
    ///
    /// # Returns
    ///
    /// Running means of both losses since the start of the epoch
    pub fn train_step(
        &mut self,
        model: &DCGAN,
        opts: &mut GanOptimizers,
        real: &Tensor,
    ) -> Result<StepLosses> {
        let (disc, g_loss) = train_step(model, opts, real)?;
        self.step += 1;

        if !disc.d_loss.is_finite() || !g_loss.is_finite() {
            return Err(DcganError::NonFiniteLoss {
                epoch: self.epoch + 1,
                step: self.step,
                d_loss: disc.d_loss,
                g_loss,
            });
        }

        self.d_loss.update(disc.d_loss);
        self.g_loss.update(g_loss);
        self.real_acc.update(disc.real_acc);
        self.fake_acc.update(disc.fake_acc);

        Ok(StepLosses {
            d_loss: self.d_loss.result(),
            g_loss: self.g_loss.result(),
        })
    }

    fn reset_running_means(&mut self) {
        self.d_loss.reset();
        self.g_loss.reset();
        self.real_acc.reset();
        self.fake_acc.reset();
        self.step = 0;
    }

    fn epoch_logs(&self) -> EpochLogs {
        EpochLogs {
            d_loss: self.d_loss.result(),
            g_loss: self.g_loss.result(),
            real_acc: self.real_acc.result(),
            fake_acc: self.fake_acc.result(),
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb
    }

    /// Train the DCGAN model
    ///
    /// # Arguments
    ///
    /// * `model` - DCGAN model to train
    /// * `data_loader` - DataLoader providing (batch, height, width, channels) images
    ///
    /// # Returns
    ///
    /// Per-epoch training metrics
    pub fn fit(&mut self, model: &DCGAN, data_loader: &mut DataLoader) -> Result<&TrainingMetrics> {
        let (h, w, c) = data_loader.image_shape();
        let expected = model.image_shape();
        if [h as i64, w as i64, c as i64] != expected {
            return Err(DcganError::shape_mismatch(&expected, &[h as i64, w as i64, c as i64]));
        }

        if data_loader.batch_size() < MIN_BATCH_SIZE {
            return Err(DcganError::BatchTooSmall {
                size: data_loader.batch_size(),
                min: MIN_BATCH_SIZE,
            });
        }

        let mut opts = GanOptimizers::new(model, &self.config)?;
        let num_batches = data_loader.num_batches();

        info!(
            "Starting training for {} epochs, {} batches per epoch",
            self.config.epochs, num_batches
        );

        for epoch in 0..self.config.epochs {
            self.epoch = epoch;
            self.reset_running_means();

            let pb = self.progress_bar(num_batches);

            for batch in data_loader.iter() {
                // Only a trailing partial batch can be this small
                if batch.shape()[0] < MIN_BATCH_SIZE {
                    warn!("Skipping batch of {} image", batch.shape()[0]);
                    pb.inc(1);
                    continue;
                }

                let real = batch_to_tensor(&batch, model.device);
                let losses = self.train_step(model, &mut opts, &real)?;

                pb.set_message(format!("d_loss: {:.4}, g_loss: {:.4}", losses.d_loss, losses.g_loss));
                pb.inc(1);
            }

            pb.finish_with_message("done");

            if self.d_loss.count() == 0 {
                return Err(DcganError::EmptyDataset);
            }

            let logs = self.epoch_logs();
            self.metrics.record_epoch(&logs);

            info!(
                "Epoch {}/{}: d_loss={:.4}, g_loss={:.4}, real_acc={:.2}%, fake_acc={:.2}%",
                epoch + 1,
                self.config.epochs,
                logs.d_loss,
                logs.g_loss,
                logs.real_acc * 100.0,
                logs.fake_acc * 100.0
            );

            if self.metrics.check_mode_collapse(self.config.collapse_window) {
                warn!("Possible mode collapse detected! Consider adjusting learning rates.");
            }

            for monitor in self.monitors.iter_mut() {
                monitor.on_epoch_end(epoch, model, &logs)?;
            }
        }

        debug!("Running {} train-end hooks", self.monitors.len());
        for monitor in self.monitors.iter_mut() {
            monitor.on_train_end(model, &self.metrics)?;
        }

        Ok(&self.metrics)
    }

    /// Get training metrics
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Get configuration
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }
}
