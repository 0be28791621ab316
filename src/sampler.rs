// Unweighted final-state draws by rejection against the ladder maps
use crate::differential::{differential, form_factor_ratio};
use crate::error::{Result, ShowerError};
use crate::kinematics::EventInfo;
use crate::ladder::SampleLadder;
use crate::library::LadderProvider;
use crate::material::Material;
use crate::process::Process;
use crate::settings::ShowerSettings;
use log::{debug, warn};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Relative tolerance when comparing the configured dark mass to a ladder's
const DARK_MASS_TOLERANCE: f64 = 1e-9;

/// An accepted point in the unit hypercube.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub variables: Vec<f64>,
    /// Differential evaluations spent before acceptance
    pub evaluations: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Drawn(Draw),
    /// The attempt budget ran out without an acceptance.
    Exhausted { evaluations: u64 },
    /// Incident energy below the lowest rung; the process cannot fire.
    OutOfRange,
}

impl SampleOutcome {
    pub fn draw(self) -> Option<Draw> {
        match self {
            SampleOutcome::Drawn(draw) => Some(draw),
            _ => None,
        }
    }
}

/// Rejection sampler over a set of process ladders in one material.
///
/// A candidate `x` drawn from a rung's map with Jacobian `jac` carries weight
/// `jac / neval`. It is accepted when `peak * peak_scale * U` falls below
/// `weight * dsigma(x) * F(x)`, where `F` rescales hydrogen-trained maps to
/// the target's screening. One attempt spends a batch of `neval` candidates.
#[derive(Debug, Clone)]
pub struct Sampler {
    ladders: HashMap<Process, Arc<SampleLadder>>,
    target_z: f64,
    dark_mass: f64,
    max_attempts: usize,
    peak_scale: f64,
}

impl Sampler {
    pub fn build<P: LadderProvider + ?Sized>(
        provider: &P,
        processes: &[Process],
        material: &Material,
        settings: &ShowerSettings,
        dark_mass: Option<f64>,
    ) -> Result<Self> {
        settings.validate()?;
        let mut ladders = HashMap::new();
        for &process in processes {
            let ladder = provider.ladder(process)?;
            if process.is_dark() {
                let mass = dark_mass.ok_or_else(|| {
                    ShowerError::InvalidSettings(format!("{} needs a dark vector mass", process))
                })?;
                if let Some(trained) = ladder.dark_mass() {
                    if (trained - mass).abs() > DARK_MASS_TOLERANCE * trained.max(mass) {
                        return Err(ShowerError::InvalidTable {
                            process: process.name().to_string(),
                            reason: format!(
                                "ladder trained for dark mass {} GeV, configured {} GeV",
                                trained, mass
                            ),
                        });
                    }
                }
            }
            ladders.insert(process, ladder);
        }
        Ok(Self {
            ladders,
            target_z: material.z,
            dark_mass: dark_mass.unwrap_or(0.0),
            max_attempts: settings.max_attempts,
            peak_scale: settings.peak_scale,
        })
    }

    pub fn ladder(&self, process: Process) -> Option<&Arc<SampleLadder>> {
        self.ladders.get(&process)
    }

    /// Lowest energy at which `process` can be sampled.
    pub fn min_energy(&self, process: Process) -> Option<f64> {
        self.ladders.get(&process).map(|l| l.min_energy())
    }

    pub fn event(&self, process: Process, energy: f64) -> Option<EventInfo> {
        self.ladders.get(&process).map(|ladder| {
            EventInfo::new(energy, self.target_z)
                .with_dark_mass(self.dark_mass)
                .with_lower_cutoff(ladder.lower_cutoff())
        })
    }

    /// Draw one unweighted point for `process` at `energy`.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        process: Process,
        energy: f64,
        rng: &mut R,
    ) -> Result<SampleOutcome> {
        let ladder = self
            .ladders
            .get(&process)
            .ok_or(ShowerError::MissingLadder(process))?;
        let Some(entry) = ladder.entry_for(energy) else {
            return Ok(SampleOutcome::OutOfRange);
        };
        let event = EventInfo::new(energy, self.target_z)
            .with_dark_mass(self.dark_mass)
            .with_lower_cutoff(ladder.lower_cutoff());

        let bound = entry.peak * self.peak_scale;
        let neval = entry.neval as f64;
        let mut x = vec![0.0; process.dimension()];
        let mut evaluations: u64 = 0;
        let mut anomalies: u64 = 0;
        let mut overshoots: u64 = 0;

        for _ in 0..self.max_attempts {
            for _ in 0..entry.neval {
                let jac = entry.map.sample(rng, &mut x);
                evaluations += 1;
                let density = differential(process, &event, &x) * form_factor_ratio(process, &event, &x);
                if !is_usable_density(density) {
                    anomalies += 1;
                    continue;
                }
                let weight = jac / neval * density;
                if weight > bound {
                    overshoots += 1;
                }
                if bound * rng.gen::<f64>() < weight {
                    report_anomalies(process, energy, anomalies, overshoots);
                    return Ok(SampleOutcome::Drawn(Draw {
                        variables: x,
                        evaluations,
                    }));
                }
            }
        }

        report_anomalies(process, energy, anomalies, overshoots);
        warn!(
            "{} sampling exhausted at {:.4e} GeV after {} evaluations",
            process, energy, evaluations
        );
        Ok(SampleOutcome::Exhausted { evaluations })
    }
}

/// Densities that can take part in the acceptance test.
fn is_usable_density(density: f64) -> bool {
    density.is_finite() && density >= 0.0
}

fn report_anomalies(process: Process, energy: f64, anomalies: u64, overshoots: u64) {
    if anomalies > 0 {
        warn!(
            "{} at {:.4e} GeV: {} negative or non-finite differential evaluations",
            process, energy, anomalies
        );
    }
    if overshoots > 0 {
        debug!(
            "{} at {:.4e} GeV: {} candidates above the peak bound",
            process, energy, overshoots
        );
    }
}
