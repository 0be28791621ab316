// Propagation of one particle to its next hard interaction
use crate::cross_section::ProcessRates;
use crate::error::{Result, ShowerError};
use crate::particle::{EndState, Fate, FourMomentum, Particle, Species};
use crate::physics::scatter_direction;
use crate::settings::ShowerSettings;
use nalgebra::Vector3;
use rand::Rng;

/// Bounds of the divisor applied to the mean free path for one step
const STEP_DIVISOR_MIN: f64 = 6.0;
const STEP_DIVISOR_MAX: f64 = 20.0;

/// Result of moving a particle once.
#[derive(Debug, Clone, PartialEq)]
pub enum Propagation {
    /// Nothing more happens to the particle.
    Terminal(EndState),
    /// A hard interaction is due at `rf` with incident momentum `pf`.
    Interaction { rf: Vector3<f64>, pf: FourMomentum },
}

/// Moves particles through one homogeneous material.
///
/// Photons, and charged particles when continuous losses are off, take a
/// single exponential draw against the mean free path. Charged particles
/// otherwise walk in steps of a fraction of the local mean free path, losing
/// `dE/dx` along the way, so the rate follows the falling energy.
#[derive(Debug, Clone)]
pub struct Transport {
    rates: ProcessRates,
    min_energy: f64,
    energy_loss: bool,
    multiple_scattering: bool,
    /// GeV/m
    dedx: f64,
    /// m
    radiation_length: f64,
}

impl Transport {
    pub fn new(rates: ProcessRates, settings: &ShowerSettings) -> Self {
        let material = rates.material();
        let dedx = material.dedx();
        let radiation_length = material.radiation_length();
        Self {
            rates,
            min_energy: settings.min_energy,
            energy_loss: settings.energy_loss,
            multiple_scattering: settings.multiple_scattering,
            dedx,
            radiation_length,
        }
    }

    pub fn rates(&self) -> &ProcessRates {
        &self.rates
    }

    pub fn min_energy(&self) -> f64 {
        self.min_energy
    }

    /// Energy below which `species` cannot interact.
    pub fn threshold(&self, species: Species) -> f64 {
        self.rates.threshold(species.processes())
    }

    /// Mean free path [m] of `species` at `energy`.
    pub fn mean_free_path(&self, species: Species, energy: f64) -> f64 {
        self.rates.mean_free_path(species.processes(), energy)
    }

    pub fn propagate<R: Rng + ?Sized>(&self, particle: &Particle, rng: &mut R) -> Result<Propagation> {
        let p0 = particle.p0;
        let energy = p0.e;
        if self.threshold(particle.species) > energy || energy <= self.min_energy {
            return Ok(Propagation::Terminal(EndState {
                rf: particle.r0,
                pf: Some(p0),
                fate: Fate::BelowThreshold,
            }));
        }
        let direction = p0
            .direction()
            .ok_or(ShowerError::DegenerateDirection { id: particle.id })?;

        if particle.species.is_charged() && self.energy_loss && self.dedx > 0.0 {
            Ok(self.step_with_losses(particle, &direction, rng))
        } else {
            Ok(self.exponential_flight(particle, &direction, rng))
        }
    }

    fn exponential_flight<R: Rng + ?Sized>(
        &self,
        particle: &Particle,
        direction: &Vector3<f64>,
        rng: &mut R,
    ) -> Propagation {
        let p0 = particle.p0;
        let mfp = self.mean_free_path(particle.species, p0.e);
        if !mfp.is_finite() {
            return Propagation::Terminal(EndState {
                rf: particle.r0,
                pf: Some(p0),
                fate: Fate::Transparent,
            });
        }
        let distance = -mfp * (1.0 - rng.gen::<f64>()).ln();
        let (path_dir, out_dir) = self.deflect(particle, direction, distance, rng);
        Propagation::Interaction {
            rf: particle.r0 + path_dir * distance,
            pf: FourMomentum::on_shell(p0.e, particle.mass, &out_dir),
        }
    }

    fn step_with_losses<R: Rng + ?Sized>(
        &self,
        particle: &Particle,
        direction: &Vector3<f64>,
        rng: &mut R,
    ) -> Propagation {
        let species = particle.species;
        let floor = self
            .threshold(species)
            .max(self.min_energy)
            .max(particle.mass);
        let mut energy = particle.p0.e;
        let mut travelled = 0.0;

        loop {
            let mfp = self.mean_free_path(species, energy);
            if !mfp.is_finite() {
                travelled += ((energy - floor) / self.dedx).max(0.0);
                return self.ranged_out(particle, direction, travelled, floor, rng);
            }
            let step = mfp / rng.gen_range(STEP_DIVISOR_MIN..STEP_DIVISOR_MAX);
            let survival = (-step / mfp).exp();
            if rng.gen::<f64>() > survival {
                // interaction inside this step, truncated exponential position
                let within = -mfp * (1.0 - rng.gen::<f64>() * (1.0 - survival)).ln();
                let at_interaction = energy - within * self.dedx;
                if at_interaction <= floor {
                    travelled += (energy - floor) / self.dedx;
                    return self.ranged_out(particle, direction, travelled, floor, rng);
                }
                travelled += within;
                let (path_dir, out_dir) = self.deflect(particle, direction, travelled, rng);
                return Propagation::Interaction {
                    rf: particle.r0 + path_dir * travelled,
                    pf: FourMomentum::on_shell(at_interaction, particle.mass, &out_dir),
                };
            }
            let next = energy - step * self.dedx;
            if next <= floor {
                travelled += (energy - floor) / self.dedx;
                return self.ranged_out(particle, direction, travelled, floor, rng);
            }
            travelled += step;
            energy = next;
        }
    }

    fn ranged_out<R: Rng + ?Sized>(
        &self,
        particle: &Particle,
        direction: &Vector3<f64>,
        travelled: f64,
        residual_energy: f64,
        rng: &mut R,
    ) -> Propagation {
        let (path_dir, _) = self.deflect(particle, direction, travelled, rng);
        Propagation::Terminal(EndState {
            rf: particle.r0 + path_dir * travelled,
            pf: None,
            fate: Fate::RangedOut { residual_energy },
        })
    }

    /// Path direction and outgoing direction after `path` meters. Without
    /// scattering both are the incident direction.
    fn deflect<R: Rng + ?Sized>(
        &self,
        particle: &Particle,
        direction: &Vector3<f64>,
        path: f64,
        rng: &mut R,
    ) -> (Vector3<f64>, Vector3<f64>) {
        if !(self.multiple_scattering && particle.species.is_charged()) {
            return (*direction, *direction);
        }
        let momentum = particle.p0.momentum();
        let beta = momentum / particle.p0.e;
        let out = scatter_direction(direction, momentum, beta, path, self.radiation_length, rng);
        let path_dir = (direction + out).try_normalize(0.0).unwrap_or(*direction);
        (path_dir, out)
    }
}
