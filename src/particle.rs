use crate::constants::{M_ELECTRON, PDG_DARK_VECTOR, PDG_ELECTRON, PDG_PHOTON, PDG_POSITRON};
use crate::error::{Result, ShowerError};
use crate::process::Process;
use nalgebra::Vector3;
use std::fmt;

/// Particle species tracked by the shower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    Electron,
    Positron,
    Photon,
    DarkVector,
}

impl Species {
    pub fn pdg(self) -> i32 {
        match self {
            Species::Electron => PDG_ELECTRON,
            Species::Positron => PDG_POSITRON,
            Species::Photon => PDG_PHOTON,
            Species::DarkVector => PDG_DARK_VECTOR,
        }
    }

    pub fn from_pdg(code: i32) -> Option<Self> {
        match code {
            PDG_ELECTRON => Some(Species::Electron),
            PDG_POSITRON => Some(Species::Positron),
            PDG_PHOTON => Some(Species::Photon),
            PDG_DARK_VECTOR => Some(Species::DarkVector),
            _ => None,
        }
    }

    /// Rest mass in GeV. The dark vector mass is a run parameter, so it is
    /// passed in rather than stored here.
    pub fn mass(self, dark_mass: f64) -> f64 {
        match self {
            Species::Electron | Species::Positron => M_ELECTRON,
            Species::Photon => 0.0,
            Species::DarkVector => dark_mass,
        }
    }

    pub fn is_charged(self) -> bool {
        matches!(self, Species::Electron | Species::Positron)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Species::Electron => "e-",
            Species::Positron => "e+",
            Species::Photon => "gamma",
            Species::DarkVector => "V",
        };
        f.write_str(name)
    }
}

/// Energy and 3-momentum, GeV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FourMomentum {
    pub e: f64,
    pub p: Vector3<f64>,
}

impl FourMomentum {
    pub fn new(e: f64, px: f64, py: f64, pz: f64) -> Self {
        Self {
            e,
            p: Vector3::new(px, py, pz),
        }
    }

    /// On-shell four-momentum of a particle of `mass` moving along `direction`.
    pub fn on_shell(energy: f64, mass: f64, direction: &Vector3<f64>) -> Self {
        let p_mag = (energy * energy - mass * mass).max(0.0).sqrt();
        Self {
            e: energy,
            p: direction * p_mag,
        }
    }

    pub fn momentum(&self) -> f64 {
        self.p.norm()
    }

    /// Invariant mass; clamps tiny negative m^2 from rounding to zero.
    pub fn mass(&self) -> f64 {
        (self.e * self.e - self.p.norm_squared()).max(0.0).sqrt()
    }

    /// Unit direction, or `None` for zero 3-momentum.
    pub fn direction(&self) -> Option<Vector3<f64>> {
        let norm = self.p.norm();
        if norm > 0.0 && norm.is_finite() {
            Some(self.p / norm)
        } else {
            None
        }
    }
}

/// How propagation (and, for interacting particles, branching) ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fate {
    /// Already below the species or global threshold; nothing changed.
    BelowThreshold,
    /// Continuous losses exhausted the energy before a hard interaction.
    RangedOut { residual_energy: f64 },
    /// No process has a non-zero rate at this energy.
    Transparent,
    /// A hard interaction fired and secondaries were generated.
    Interacted { process: Process },
    /// An interaction was due but no secondaries could be produced.
    NoViableSecondaries,
    /// Removed from the output by the sampling exhaustion policy.
    Dropped,
}

/// Terminal state of a propagated particle. Set exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct EndState {
    pub rf: Vector3<f64>,
    /// Final four-momentum; `None` when the particle ranged out.
    pub pf: Option<FourMomentum>,
    pub fate: Fate,
}

impl EndState {
    /// Energy the particle finished with.
    pub fn final_energy(&self) -> f64 {
        match (&self.pf, self.fate) {
            (Some(pf), _) => pf.e,
            (None, Fate::RangedOut { residual_energy }) => residual_energy,
            (None, _) => 0.0,
        }
    }
}

/// The incident particle a shower starts from.
#[derive(Debug, Clone)]
pub struct SeedParticle {
    pub species: Species,
    pub momentum: FourMomentum,
    pub position: Vector3<f64>,
    /// PDG code recorded as the seed's parent (e.g. a decaying meson)
    pub parent_pdg: i32,
}

impl SeedParticle {
    /// Seed from a raw PDG code; only shower species are accepted.
    pub fn new(pdg: i32, momentum: FourMomentum, parent_pdg: i32) -> Result<Self> {
        let species = match Species::from_pdg(pdg) {
            Some(s) if s != Species::DarkVector => s,
            _ => return Err(ShowerError::UnknownSpecies(pdg)),
        };
        Ok(Self {
            species,
            momentum,
            position: Vector3::zeros(),
            parent_pdg,
        })
    }

    pub fn at(mut self, position: Vector3<f64>) -> Self {
        self.position = position;
        self
    }
}

/// One leg of a shower.
///
/// The creation state (`p0`, `r0`, lineage) is fixed at construction; the
/// terminal state is attached once by [`Particle::finish`].
#[derive(Debug, Clone)]
pub struct Particle {
    pub species: Species,
    pub p0: FourMomentum,
    pub r0: Vector3<f64>,
    pub id: u128,
    pub parent_id: u128,
    pub parent_pdg: i32,
    pub generation: u32,
    /// Process that created this particle; `None` for the seed
    pub creator: Option<Process>,
    pub weight: f64,
    pub mass: f64,
    end: Option<EndState>,
}

impl Particle {
    pub fn seed(seed: &SeedParticle) -> Self {
        Self {
            species: seed.species,
            p0: seed.momentum,
            r0: seed.position,
            id: 1,
            parent_id: 0,
            parent_pdg: seed.parent_pdg,
            generation: 0,
            creator: None,
            weight: 1.0,
            mass: seed.species.mass(0.0),
            end: None,
        }
    }

    /// A secondary of `parent`. `slot` is 0 or 1 and picks the even or odd id.
    pub fn child(
        parent: &Particle,
        slot: u8,
        species: Species,
        p0: FourMomentum,
        mass: f64,
        creator: Process,
        weight: f64,
    ) -> Result<Self> {
        let id = parent
            .id
            .checked_mul(2)
            .and_then(|v| v.checked_add(u128::from(slot & 1)))
            .ok_or(ShowerError::IdOverflow {
                parent_id: parent.id,
            })?;
        let r0 = parent.end.as_ref().map(|e| e.rf).unwrap_or(parent.r0);
        Ok(Self {
            species,
            p0,
            r0,
            id,
            parent_id: parent.id,
            parent_pdg: parent.species.pdg(),
            generation: parent.generation + 1,
            creator: Some(creator),
            weight,
            mass,
            end: None,
        })
    }

    pub fn pdg(&self) -> i32 {
        self.species.pdg()
    }

    pub fn ended(&self) -> bool {
        self.end.is_some()
    }

    pub fn end(&self) -> Option<&EndState> {
        self.end.as_ref()
    }

    pub fn pf(&self) -> Option<&FourMomentum> {
        self.end.as_ref().and_then(|e| e.pf.as_ref())
    }

    pub fn rf(&self) -> Option<&Vector3<f64>> {
        self.end.as_ref().map(|e| &e.rf)
    }

    /// Attach the terminal state. Fails if one is already attached.
    pub fn finish(&mut self, end: EndState) -> Result<()> {
        if self.end.is_some() {
            return Err(ShowerError::AlreadyEnded(self.id));
        }
        self.end = Some(end);
        Ok(())
    }
}
