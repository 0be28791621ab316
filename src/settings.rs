use crate::error::{Result, ShowerError};

/// What the driver does when the sampler runs out of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustionPolicy {
    /// Keep the particle, terminal with no children.
    #[default]
    EndWithoutSecondaries,
    /// Remove the particle from the returned population.
    DropParticle,
    /// Fail the whole shower.
    Abort,
}

/// Run parameters for a shower.
#[derive(Debug, Clone)]
pub struct ShowerSettings {
    /// Particles at or below this energy are not tracked [GeV]
    pub min_energy: f64,
    /// Outer rejection-sampling attempts, each a batch of `neval` draws
    pub max_attempts: usize,
    /// Multiplier on the tabulated peak bound
    pub peak_scale: f64,
    /// Continuous energy loss for charged particles
    pub energy_loss: bool,
    /// Multiple scattering for charged particles
    pub multiple_scattering: bool,
    /// Store the sampler's evaluation count as the child weight
    pub record_sample_counts: bool,
    pub exhaustion_policy: ExhaustionPolicy,
    pub seed: Option<u64>,
}

impl Default for ShowerSettings {
    fn default() -> Self {
        Self {
            min_energy: 0.010,
            max_attempts: 10_000,
            peak_scale: 1.0,
            energy_loss: true,
            multiple_scattering: true,
            record_sample_counts: false,
            exhaustion_policy: ExhaustionPolicy::default(),
            seed: None,
        }
    }
}

impl ShowerSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_energy.is_finite() && self.min_energy > 0.0) {
            return Err(ShowerError::InvalidSettings(format!(
                "min_energy must be positive, got {}",
                self.min_energy
            )));
        }
        if self.max_attempts == 0 {
            return Err(ShowerError::InvalidSettings(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !(self.peak_scale.is_finite() && self.peak_scale > 0.0) {
            return Err(ShowerError::InvalidSettings(format!(
                "peak_scale must be positive, got {}",
                self.peak_scale
            )));
        }
        Ok(())
    }
}
