// Standard Model shower driver
use crate::constants::CM_TO_M;
use crate::cross_section::ProcessRates;
use crate::error::{Result, ShowerError};
use crate::fast_rng::ShowerRng;
use crate::kinematics::{lab_rotation, reconstruct, to_lab};
use crate::library::{CrossSectionProvider, LadderProvider};
use crate::material::Material;
use crate::particle::{EndState, Fate, FourMomentum, Particle, SeedParticle, Species};
use crate::population::ShowerPopulation;
use crate::process::Process;
use crate::sampler::{SampleOutcome, Sampler};
use crate::settings::{ExhaustionPolicy, ShowerSettings};
use crate::transport::{Propagation, Transport};
use log::{debug, info, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::f64::consts::TAU;

/// What a due interaction produced.
#[derive(Debug, Clone)]
pub(crate) enum Branch {
    Secondaries {
        process: Process,
        products: [Species; 2],
        legs: [FourMomentum; 2],
        weight: f64,
    },
    NoViable,
    Dropped,
}

/// Electromagnetic shower in one target material.
///
/// Holds the interpolated rates and sampling ladders for the six Standard
/// Model processes. These are read-only after construction, so one `Shower`
/// can generate any number of independent showers.
#[derive(Debug, Clone)]
pub struct Shower {
    settings: ShowerSettings,
    transport: Transport,
    sampler: Sampler,
}

impl Shower {
    pub fn new<P>(provider: &P, material: &Material, settings: ShowerSettings) -> Result<Self>
    where
        P: CrossSectionProvider + LadderProvider + ?Sized,
    {
        settings.validate()?;
        let rates = ProcessRates::build(provider, material, &Process::STANDARD)?;
        let sampler = Sampler::build(provider, &Process::STANDARD, material, &settings, None)?;
        Ok(Self {
            transport: Transport::new(rates, &settings),
            sampler,
            settings,
        })
    }

    pub fn for_material<P>(provider: &P, material: &str, settings: ShowerSettings) -> Result<Self>
    where
        P: CrossSectionProvider + LadderProvider + ?Sized,
    {
        Self::new(provider, &Material::from_name(material)?, settings)
    }

    pub fn settings(&self) -> &ShowerSettings {
        &self.settings
    }

    pub fn material(&self) -> &Material {
        self.transport.rates().material()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Mean free path [m] of `species` at `energy`; infinite when nothing can happen.
    pub fn mean_free_path(&self, species: Species, energy: f64) -> f64 {
        self.transport.mean_free_path(species, energy)
    }

    /// Interaction rate [1/m] of one process at `energy`.
    pub fn rate(&self, process: Process, energy: f64) -> f64 {
        self.transport.rates().n_sigma(process, energy) / CM_TO_M
    }

    /// Energy below which `species` is not propagated further.
    pub fn threshold(&self, species: Species) -> f64 {
        self.transport.threshold(species)
    }

    /// Run a full shower, seeding the generator from the settings.
    pub fn generate_shower(&self, seed: &SeedParticle) -> Result<Vec<Particle>> {
        let mut rng = ShowerRng::from_seed_option(self.settings.seed);
        self.generate_shower_with_rng(seed, &mut rng)
    }

    /// Run a full shower with an explicit random source.
    ///
    /// Returns every particle created, in creation order, each with its
    /// terminal state attached.
    pub fn generate_shower_with_rng<R: Rng + ?Sized>(
        &self,
        seed: &SeedParticle,
        rng: &mut R,
    ) -> Result<Vec<Particle>> {
        info!(
            "starting {} shower at {:.4e} GeV in {}",
            seed.species,
            seed.momentum.e,
            self.material().name
        );
        let mut population = ShowerPopulation::seeded(Particle::seed(seed));
        let mut interactions = 0usize;

        while let Some(idx) = population.next_pending() {
            let Some(particle) = population.get(idx) else {
                break;
            };
            let (end, children) = match self.transport.propagate(particle, rng)? {
                Propagation::Terminal(end) => (end, Vec::new()),
                Propagation::Interaction { rf, pf } => {
                    let branch = self.interact(particle.species, particle.id, &pf, rng)?;
                    let fate = match &branch {
                        Branch::Secondaries { process, .. } => Fate::Interacted { process: *process },
                        Branch::NoViable => Fate::NoViableSecondaries,
                        Branch::Dropped => Fate::Dropped,
                    };
                    let end = EndState {
                        rf,
                        pf: Some(pf),
                        fate,
                    };
                    let mut parent = particle.clone();
                    parent.finish(end.clone())?;
                    (end, self.children(&parent, branch)?)
                }
            };
            if let Fate::Interacted { .. } = end.fate {
                interactions += 1;
            }
            if let Some(particle) = population.get_mut(idx) {
                particle.finish(end)?;
            }
            for child in children {
                population.push(child);
            }
        }
        debug_assert!(population.all_ended());

        let particles = population.into_particles();
        info!(
            "shower finished: {} particles, {} interactions",
            particles.len(),
            interactions
        );
        Ok(particles)
    }

    /// Pick a process for a particle about to interact and draw its final state.
    pub(crate) fn interact<R: Rng + ?Sized>(
        &self,
        species: Species,
        id: u128,
        pf: &FourMomentum,
        rng: &mut R,
    ) -> Result<Branch> {
        let energy = pf.e;
        let processes = species.processes();
        let rates = self.transport.rates();
        let weights: Vec<f64> = processes.iter().map(|&p| rates.n_sigma(p, energy)).collect();
        let total: f64 = weights.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            debug!("{} {} at {:.4e} GeV: no process has a rate", species, id, energy);
            return Ok(Branch::NoViable);
        }
        let process = match WeightedIndex::new(&weights) {
            Ok(dist) => processes[dist.sample(rng)],
            Err(err) => {
                warn!("{} {}: bad process weights {:?}: {}", species, id, weights, err);
                return Ok(Branch::NoViable);
            }
        };
        self.final_state(species, id, process, pf, rng)
    }

    /// Sample `process` for an incident `pf` and rotate the legs into the lab.
    pub(crate) fn final_state<R: Rng + ?Sized>(
        &self,
        species: Species,
        id: u128,
        process: Process,
        pf: &FourMomentum,
        rng: &mut R,
    ) -> Result<Branch> {
        final_state(&self.sampler, &self.settings, species, id, process, pf, rng)
    }

    fn children(&self, parent: &Particle, branch: Branch) -> Result<Vec<Particle>> {
        let Branch::Secondaries {
            process,
            products,
            legs,
            weight,
        } = branch
        else {
            return Ok(Vec::new());
        };
        let mut children = Vec::with_capacity(2);
        for (slot, (species, leg)) in products.into_iter().zip(legs).enumerate() {
            if leg.e > self.settings.min_energy {
                children.push(Particle::child(
                    parent,
                    slot as u8,
                    species,
                    leg,
                    species.mass(0.0),
                    process,
                    weight,
                )?);
            }
        }
        Ok(children)
    }
}

/// Shared by the Standard Model and dark drivers: draw, reconstruct, rotate.
pub(crate) fn final_state<R: Rng + ?Sized>(
    sampler: &Sampler,
    settings: &ShowerSettings,
    species: Species,
    id: u128,
    process: Process,
    pf: &FourMomentum,
    rng: &mut R,
) -> Result<Branch> {
    let energy = pf.e;
    let draw = match sampler.draw(process, energy, rng)? {
        SampleOutcome::Drawn(draw) => draw,
        SampleOutcome::OutOfRange => {
            debug!("{} {}: {} closed at {:.4e} GeV", species, id, process, energy);
            return Ok(Branch::NoViable);
        }
        SampleOutcome::Exhausted { evaluations } => {
            return match settings.exhaustion_policy {
                ExhaustionPolicy::EndWithoutSecondaries => Ok(Branch::NoViable),
                ExhaustionPolicy::DropParticle => Ok(Branch::Dropped),
                ExhaustionPolicy::Abort => Err(ShowerError::SamplingExhausted {
                    process,
                    energy,
                    evaluations,
                }),
            };
        }
    };
    let Some(event) = sampler.event(process, energy) else {
        return Err(ShowerError::MissingLadder(process));
    };
    let Some(local) = reconstruct(process, &event, &draw.variables) else {
        warn!(
            "{} {}: {} draw {:?} has no physical final state at {:.4e} GeV",
            species, id, process, draw.variables, energy
        );
        return Ok(Branch::NoViable);
    };
    let rotation = lab_rotation(&pf.p, id)?;
    let legs = to_lab(local, &rotation, rng.gen_range(0.0..TAU));
    let weight = if settings.record_sample_counts {
        draw.evaluations as f64
    } else {
        1.0
    };
    debug!(
        "{} {} at {:.4e} GeV: {} -> {:.4e} + {:.4e} GeV",
        species, id, energy, process, legs[0].e, legs[1].e
    );
    Ok(Branch::Secondaries {
        process,
        products: process.products(species),
        legs,
        weight,
    })
}
