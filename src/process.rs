// Registry of the interaction processes a shower can apply
use crate::error::ShowerError;
use crate::particle::Species;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Process {
    Brem,
    PairProd,
    Annihilation,
    Compton,
    Moller,
    Bhabha,
    DarkBrem,
    DarkAnnihilation,
    DarkCompton,
}

/// Which scatterers a process's number density counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Nuclei,
    Electrons,
}

/// Nuclear form factor applied when reusing a hydrogen-trained map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFactor {
    Unity,
    ElasticScreening,
}

const PHOTON_MENU: &[Process] = &[Process::PairProd, Process::Compton];
const ELECTRON_MENU: &[Process] = &[Process::Brem, Process::Moller];
const POSITRON_MENU: &[Process] = &[Process::Brem, Process::Annihilation, Process::Bhabha];

const DARK_PHOTON_MENU: &[Process] = &[Process::DarkCompton];
const DARK_ELECTRON_MENU: &[Process] = &[Process::DarkBrem];
const DARK_POSITRON_MENU: &[Process] = &[Process::DarkBrem, Process::DarkAnnihilation];

impl Process {
    pub const ALL: [Process; 9] = [
        Process::Brem,
        Process::PairProd,
        Process::Annihilation,
        Process::Compton,
        Process::Moller,
        Process::Bhabha,
        Process::DarkBrem,
        Process::DarkAnnihilation,
        Process::DarkCompton,
    ];

    pub const STANDARD: [Process; 6] = [
        Process::Brem,
        Process::PairProd,
        Process::Annihilation,
        Process::Compton,
        Process::Moller,
        Process::Bhabha,
    ];

    pub const DARK: [Process; 3] = [
        Process::DarkBrem,
        Process::DarkAnnihilation,
        Process::DarkCompton,
    ];

    /// Name used in table files and configuration keys.
    pub fn name(self) -> &'static str {
        match self {
            Process::Brem => "Brem",
            Process::PairProd => "PairProd",
            Process::Annihilation => "Ann",
            Process::Compton => "Comp",
            Process::Moller => "Moller",
            Process::Bhabha => "Bhabha",
            Process::DarkBrem => "DarkBrem",
            Process::DarkAnnihilation => "DarkAnn",
            Process::DarkCompton => "DarkComp",
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(
            self,
            Process::DarkBrem | Process::DarkAnnihilation | Process::DarkCompton
        )
    }

    pub fn target(self) -> TargetKind {
        match self {
            Process::Brem | Process::PairProd | Process::DarkBrem => TargetKind::Nuclei,
            _ => TargetKind::Electrons,
        }
    }

    pub fn form_factor(self) -> FormFactor {
        match self.target() {
            TargetKind::Nuclei => FormFactor::ElasticScreening,
            TargetKind::Electrons => FormFactor::Unity,
        }
    }

    /// Number of sampling variables, each in the unit interval.
    pub fn dimension(self) -> usize {
        match self.target() {
            TargetKind::Nuclei => 4,
            TargetKind::Electrons => 1,
        }
    }

    /// Species the process can act on.
    pub fn incident(self) -> &'static [Species] {
        match self {
            Process::Brem | Process::DarkBrem => &[Species::Electron, Species::Positron],
            Process::PairProd | Process::Compton | Process::DarkCompton => &[Species::Photon],
            Process::Annihilation | Process::Bhabha | Process::DarkAnnihilation => {
                &[Species::Positron]
            }
            Process::Moller => &[Species::Electron],
        }
    }

    /// Species of the two outgoing legs, in reconstruction order.
    pub fn products(self, incident: Species) -> [Species; 2] {
        match self {
            Process::Brem => [incident, Species::Photon],
            Process::PairProd => [Species::Positron, Species::Electron],
            Process::Annihilation => [Species::Photon, Species::Photon],
            Process::Compton => [Species::Electron, Species::Photon],
            Process::Moller | Process::Bhabha => [incident, Species::Electron],
            Process::DarkBrem => [incident, Species::DarkVector],
            Process::DarkAnnihilation => [Species::Photon, Species::DarkVector],
            Process::DarkCompton => [Species::Electron, Species::DarkVector],
        }
    }
}

impl Species {
    /// Standard Model processes available to this species.
    pub fn processes(self) -> &'static [Process] {
        match self {
            Species::Photon => PHOTON_MENU,
            Species::Electron => ELECTRON_MENU,
            Species::Positron => POSITRON_MENU,
            Species::DarkVector => &[],
        }
    }

    /// Dark-vector emission analogues available to this species.
    pub fn dark_processes(self) -> &'static [Process] {
        match self {
            Species::Photon => DARK_PHOTON_MENU,
            Species::Electron => DARK_ELECTRON_MENU,
            Species::Positron => DARK_POSITRON_MENU,
            Species::DarkVector => &[],
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Process {
    type Err = ShowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Process::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| ShowerError::UnknownProcess(s.to_string()))
    }
}
