//! Loss functions for GAN training
//!
//! Binary cross entropy on discriminator logits. Working on logits instead of
//! sigmoid outputs gives the same loss without saturating at 0 or 1.

use tch::{Reduction, Tensor};

/// Label for real images
pub const REAL_LABEL: f64 = 1.0;
/// Label for generated images
pub const FAKE_LABEL: f64 = 0.0;

/// Mean binary cross entropy of `logits` against a constant target
pub fn bce_with_logits(logits: &Tensor, target: f64) -> Tensor {
    let targets = Tensor::full_like(logits, target);
    logits.binary_cross_entropy_with_logits::<Tensor>(&targets, None, None, Reduction::Mean)
}

/// Generator loss: -log(D(G(z)))
///
/// The generator wants the discriminator to output 1 (real) for fake images.
///
/// # Arguments
///
/// * `fake_output` - Discriminator output on generated images (logits)
pub fn generator_loss(fake_output: &Tensor) -> Tensor {
    bce_with_logits(fake_output, REAL_LABEL)
}

/// Discriminator loss: mean of the real-image and fake-image cross entropies
///
/// # Arguments
///
/// * `real_output` - Discriminator output on real images (logits)
/// * `fake_output` - Discriminator output on generated images (logits)
pub fn discriminator_loss(real_output: &Tensor, fake_output: &Tensor) -> Tensor {
    let real_loss = bce_with_logits(real_output, REAL_LABEL);
    let fake_loss = bce_with_logits(fake_output, FAKE_LABEL);
    (real_loss + fake_loss) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tch::{Device, Kind};

    #[test]
    fn test_generator_loss() {
        let fake_output = Tensor::randn([4, 1], (Kind::Float, Device::Cpu));
        let loss = generator_loss(&fake_output);

        assert_eq!(loss.size(), Vec::<i64>::new());
        assert!(loss.double_value(&[]) > 0.0);
    }

    #[test]
    fn test_uninformed_discriminator() {
        // Logit 0 means probability 0.5 everywhere: every term is ln 2
        let zeros = Tensor::zeros([4, 1], (Kind::Float, Device::Cpu));

        let d_loss = discriminator_loss(&zeros, &zeros).double_value(&[]);
        let g_loss = generator_loss(&zeros).double_value(&[]);

        assert_relative_eq!(d_loss, std::f64::consts::LN_2, epsilon = 1e-6);
        assert_relative_eq!(g_loss, std::f64::consts::LN_2, epsilon = 1e-6);
    }

    #[test]
    fn test_perfect_discriminator() {
        // Perfect discriminator: high confidence on real, low on fake
        let real_output = Tensor::full([4, 1], 10.0, (Kind::Float, Device::Cpu));
        let fake_output = Tensor::full([4, 1], -10.0, (Kind::Float, Device::Cpu));

        assert!(discriminator_loss(&real_output, &fake_output).double_value(&[]) < 0.1);
        // and the generator is losing badly
        assert!(generator_loss(&fake_output).double_value(&[]) > 5.0);
    }

    #[test]
    fn test_matches_probability_form() {
        let logits = Tensor::from_slice(&[-2.0f32, 0.5, 3.0]);
        let probs = logits.sigmoid();
        let expected = -(probs.log().mean(Kind::Float)).double_value(&[]);

        assert_relative_eq!(
            bce_with_logits(&logits, REAL_LABEL).double_value(&[]),
            expected,
            epsilon = 1e-5
        );
    }
}
