//! Training metrics for monitoring GAN progress
//!
//! Provides running means for per-step reporting and a per-epoch history.

use std::path::Path;

use crate::error::Result;

/// Running mean of every value seen since the last reset
#[derive(Debug, Clone, Default)]
pub struct MeanMetric {
    total: f64,
    count: usize,
}

impl MeanMetric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    pub fn update(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    /// Current mean, 0.0 when nothing has been recorded
    pub fn result(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }

    /// Number of values recorded since the last reset
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn reset(&mut self) {
        self.total = 0.0;
        self.count = 0;
    }
}

/// Epoch means reported to monitors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochLogs {
    pub d_loss: f64,
    pub g_loss: f64,
    /// Fraction of real images the discriminator scored above 0.5
    pub real_acc: f64,
    /// Fraction of generated images the discriminator scored below 0.5
    pub fake_acc: f64,
}

/// Metrics collected during training, one entry per epoch
#[derive(Debug, Clone, Default)]
pub struct TrainingMetrics {
    /// Generator losses per epoch
    pub gen_losses: Vec<f64>,
    /// Discriminator losses per epoch
    pub disc_losses: Vec<f64>,
    /// Discriminator accuracy on real images
    pub disc_real_acc: Vec<f64>,
    /// Discriminator accuracy on fake images
    pub disc_fake_acc: Vec<f64>,
}

impl TrainingMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record epoch metrics
    pub fn record_epoch(&mut self, logs: &EpochLogs) {
        self.gen_losses.push(logs.g_loss);
        self.disc_losses.push(logs.d_loss);
        self.disc_real_acc.push(logs.real_acc);
        self.disc_fake_acc.push(logs.fake_acc);
    }

    /// Get number of recorded epochs
    pub fn num_epochs(&self) -> usize {
        self.gen_losses.len()
    }

    /// Get latest generator loss
    pub fn latest_gen_loss(&self) -> Option<f64> {
        self.gen_losses.last().copied()
    }

    /// Get latest discriminator loss
    pub fn latest_disc_loss(&self) -> Option<f64> {
        self.disc_losses.last().copied()
    }

    /// Calculate moving average of generator loss
    pub fn gen_loss_ma(&self, window: usize) -> f64 {
        moving_average(&self.gen_losses, window)
    }

    /// Calculate moving average of discriminator loss
    pub fn disc_loss_ma(&self, window: usize) -> f64 {
        moving_average(&self.disc_losses, window)
    }

    /// Check if training appears to have collapsed
    ///
    /// Mode collapse indicators:
    /// - Discriminator loss very low (can easily distinguish)
    /// - Generator loss very high (can't fool discriminator)
    pub fn check_mode_collapse(&self, window: usize) -> bool {
        if self.num_epochs() < window {
            return false;
        }

        self.disc_loss_ma(window) < 0.1 && self.gen_loss_ma(window) > 5.0
    }

    /// Save metrics to CSV file
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(["epoch", "d_loss", "g_loss", "real_acc", "fake_acc"])?;

        // Rows stop at the shortest series
        let rows = self
            .disc_losses
            .iter()
            .zip(&self.gen_losses)
            .zip(self.disc_real_acc.iter().zip(&self.disc_fake_acc));

        for (i, ((d_loss, g_loss), (real_acc, fake_acc))) in rows.enumerate() {
            writer.write_record([
                (i + 1).to_string(),
                d_loss.to_string(),
                g_loss.to_string(),
                real_acc.to_string(),
                fake_acc.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Load metrics from CSV file
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut metrics = Self::new();

        for result in reader.deserialize() {
            let (_epoch, d_loss, g_loss, real_acc, fake_acc): (usize, f64, f64, f64, f64) = result?;
            metrics.record_epoch(&EpochLogs {
                d_loss,
                g_loss,
                real_acc,
                fake_acc,
            });
        }

        Ok(metrics)
    }
}

/// Calculate moving average of last `window` values
fn moving_average(values: &[f64], window: usize) -> f64 {
    if values.is_empty() || window == 0 {
        return 0.0;
    }

    let n = window.min(values.len());
    let sum: f64 = values.iter().rev().take(n).sum();
    sum / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logs(d_loss: f64, g_loss: f64) -> EpochLogs {
        EpochLogs {
            d_loss,
            g_loss,
            real_acc: 0.5,
            fake_acc: 0.5,
        }
    }

    #[test]
    fn test_mean_metric() {
        let mut mean = MeanMetric::new();
        assert_eq!(mean.result(), 0.0);

        mean.update(1.0);
        mean.update(2.0);
        mean.update(6.0);
        assert_eq!(mean.result(), 3.0);
        assert_eq!(mean.count(), 3);

        mean.reset();
        assert_eq!(mean.count(), 0);
        mean.update(0.5);
        assert_eq!(mean.result(), 0.5);
    }

    #[test]
    fn test_training_metrics() {
        let mut metrics = TrainingMetrics::new();

        metrics.record_epoch(&logs(0.8, 1.5));
        metrics.record_epoch(&logs(0.75, 1.3));

        assert_eq!(metrics.num_epochs(), 2);
        assert_eq!(metrics.latest_gen_loss(), Some(1.3));
        assert_eq!(metrics.latest_disc_loss(), Some(0.75));
        assert_eq!(metrics.gen_loss_ma(1), 1.3);
    }

    #[test]
    fn test_mode_collapse() {
        let mut metrics = TrainingMetrics::new();
        for _ in 0..3 {
            metrics.record_epoch(&logs(0.01, 8.0));
        }

        assert!(!metrics.check_mode_collapse(5));
        assert!(metrics.check_mode_collapse(3));
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut metrics = TrainingMetrics::new();
        metrics.record_epoch(&logs(0.69, 0.71));
        metrics.record_epoch(&logs(0.6, 0.9));
        metrics.save_csv(&path).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("epoch,d_loss,g_loss"));

        let loaded = TrainingMetrics::load_csv(&path).unwrap();
        assert_eq!(loaded.gen_losses, metrics.gen_losses);
        assert_eq!(loaded.disc_losses, metrics.disc_losses);
    }

    #[test]
    fn test_save_csv_with_ragged_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut metrics = TrainingMetrics::new();
        metrics.record_epoch(&logs(0.69, 0.71));
        metrics.record_epoch(&logs(0.6, 0.9));
        metrics.gen_losses.push(1.2);
        metrics.disc_fake_acc.pop();

        metrics.save_csv(&path).unwrap();
        let loaded = TrainingMetrics::load_csv(&path).unwrap();
        assert_eq!(loaded.num_epochs(), 1);
        assert_eq!(loaded.gen_losses, vec![0.71]);
    }
}
