// Dark vector emission on top of a Standard Model shower
use crate::cross_section::ProcessRates;
use crate::error::{Result, ShowerError};
use crate::fast_rng::ShowerRng;
use crate::library::{CrossSectionProvider, LadderProvider};
use crate::material::Material;
use crate::particle::{EndState, Fate, Particle, SeedParticle, Species};
use crate::process::Process;
use crate::sampler::Sampler;
use crate::settings::ShowerSettings;
use crate::shower::{final_state, Branch, Shower};
use log::{debug, info};
use rand::Rng;

/// Where the Standard Model shower comes from.
#[derive(Debug, Clone)]
pub enum DarkShowerSource {
    /// A shower generated earlier.
    Existing(Vec<Particle>),
    /// Generate the shower first, from this seed.
    Seed(SeedParticle),
}

/// Revisits every particle of a Standard Model shower and lets it emit at
/// most one dark vector, weighted by the dark-to-Standard-Model rate ratio.
///
/// The dark vectors are returned apart from the Standard Model particles and
/// are not propagated.
#[derive(Debug, Clone)]
pub struct DarkShower {
    shower: Shower,
    dark_rates: ProcessRates,
    dark_sampler: Sampler,
    dark_mass: f64,
}

impl DarkShower {
    pub fn new<P>(
        provider: &P,
        material: &Material,
        settings: ShowerSettings,
        dark_mass: f64,
    ) -> Result<Self>
    where
        P: CrossSectionProvider + LadderProvider + ?Sized,
    {
        if !(dark_mass.is_finite() && dark_mass > 0.0) {
            return Err(ShowerError::InvalidSettings(format!(
                "dark vector mass must be positive, got {}",
                dark_mass
            )));
        }
        let dark_rates = ProcessRates::build(provider, material, &Process::DARK)?;
        let dark_sampler = Sampler::build(provider, &Process::DARK, material, &settings, Some(dark_mass))?;
        let shower = Shower::new(provider, material, settings)?;
        Ok(Self {
            shower,
            dark_rates,
            dark_sampler,
            dark_mass,
        })
    }

    pub fn shower(&self) -> &Shower {
        &self.shower
    }

    pub fn dark_mass(&self) -> f64 {
        self.dark_mass
    }

    /// Lowest energy at which `species` can emit a dark vector.
    pub fn dark_threshold(&self, species: Species) -> f64 {
        species
            .dark_processes()
            .iter()
            .map(|&p| self.dark_rates.process_threshold(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Ratio of the dark rate to the competing Standard Model rate.
    ///
    /// Zero when the Standard Model rate vanishes.
    pub fn bsm_weight(&self, species: Species, energy: f64) -> f64 {
        let sm_rates = self.shower.transport().rates();
        let (dark, standard): (f64, f64) = match species {
            Species::Photon => (
                self.dark_term(Process::DarkCompton, energy),
                rate_term(sm_rates, Process::PairProd, energy) + rate_term(sm_rates, Process::Compton, energy),
            ),
            Species::Electron => (
                self.dark_term(Process::DarkBrem, energy),
                rate_term(sm_rates, Process::Brem, energy),
            ),
            Species::Positron => (
                self.dark_term(Process::DarkBrem, energy)
                    + self.dark_term(Process::DarkAnnihilation, energy),
                rate_term(sm_rates, Process::Brem, energy)
                    + rate_term(sm_rates, Process::Annihilation, energy)
                    + rate_term(sm_rates, Process::Bhabha, energy),
            ),
            Species::DarkVector => (0.0, 0.0),
        };
        if standard > 0.0 && standard.is_finite() {
            dark / standard
        } else {
            0.0
        }
    }

    /// Which dark process fires for `species`; `None` if none is open.
    pub fn choose_dark_process<R: Rng + ?Sized>(
        &self,
        species: Species,
        energy: f64,
        rng: &mut R,
    ) -> Option<Process> {
        match species {
            Species::Photon => Some(Process::DarkCompton),
            Species::Electron => Some(Process::DarkBrem),
            Species::Positron => {
                if energy < self.dark_rates.process_threshold(Process::DarkAnnihilation) {
                    return Some(Process::DarkBrem);
                }
                let brem = self.dark_term(Process::DarkBrem, energy);
                let ann = self.dark_term(Process::DarkAnnihilation, energy);
                let total = brem + ann;
                if !(total > 0.0 && total.is_finite()) {
                    return None;
                }
                if rng.gen::<f64>() < brem / total {
                    Some(Process::DarkBrem)
                } else {
                    Some(Process::DarkAnnihilation)
                }
            }
            Species::DarkVector => None,
        }
    }

    pub fn generate_dark_shower(&self, source: DarkShowerSource) -> Result<(Vec<Particle>, Vec<Particle>)> {
        let mut rng = ShowerRng::from_seed_option(self.shower.settings().seed);
        self.generate_dark_shower_with_rng(source, &mut rng)
    }

    /// The Standard Model shower and the dark vectors its particles emitted.
    pub fn generate_dark_shower_with_rng<R: Rng + ?Sized>(
        &self,
        source: DarkShowerSource,
        rng: &mut R,
    ) -> Result<(Vec<Particle>, Vec<Particle>)> {
        let particles = match source {
            DarkShowerSource::Existing(particles) => particles,
            DarkShowerSource::Seed(seed) => self.shower.generate_shower_with_rng(&seed, rng)?,
        };
        info!(
            "dark emission over {} particles, m_V = {} GeV",
            particles.len(),
            self.dark_mass
        );

        let mut dark = Vec::new();
        for particle in &particles {
            if let Some(vector) = self.emit(particle, rng)? {
                dark.push(vector);
            }
        }
        info!("{} dark vectors emitted", dark.len());
        Ok((particles, dark))
    }

    fn emit<R: Rng + ?Sized>(&self, particle: &Particle, rng: &mut R) -> Result<Option<Particle>> {
        let Some(pf) = particle.pf() else {
            return Ok(None);
        };
        let species = particle.species;
        let energy = pf.e;
        if energy < self.dark_threshold(species) {
            return Ok(None);
        }
        let weight = self.bsm_weight(species, energy);
        if !(weight > 0.0 && weight.is_finite()) {
            return Ok(None);
        }
        let Some(process) = self.choose_dark_process(species, energy, rng) else {
            return Ok(None);
        };
        let branch = final_state(
            &self.dark_sampler,
            self.shower.settings(),
            species,
            particle.id,
            process,
            pf,
            rng,
        )?;
        let Branch::Secondaries { legs, .. } = branch else {
            debug!("{} {}: no {} final state", species, particle.id, process);
            return Ok(None);
        };
        let slot = match process {
            Process::DarkCompton => 0,
            _ => 1,
        };
        let mut vector = Particle::child(
            particle,
            slot,
            Species::DarkVector,
            legs[1],
            self.dark_mass,
            process,
            weight,
        )?;
        vector.finish(EndState {
            rf: vector.r0,
            pf: Some(vector.p0),
            fate: Fate::Transparent,
        })?;
        Ok(Some(vector))
    }

    fn dark_term(&self, process: Process, energy: f64) -> f64 {
        rate_term(&self.dark_rates, process, energy)
    }
}

/// n*sigma of one process, zero below its own table threshold.
fn rate_term(rates: &ProcessRates, process: Process, energy: f64) -> f64 {
    if energy < rates.process_threshold(process) {
        0.0
    } else {
        rates.n_sigma(process, energy)
    }
}
