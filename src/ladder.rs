// Energy-bucketed ladders of precomputed sampling maps
use crate::adaptive_map::{check_map, AdaptiveMap};
use crate::error::{Result, ShowerError};
use crate::process::Process;
use crate::utilities::{bucket_index, log_bucket_index, uniform_log_step};
use serde::{Deserialize, Serialize};

/// One rung of a ladder: the map trained at `energy` and its acceptance bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderEntry {
    /// Incident energy the map was trained at [GeV]
    pub energy: f64,
    /// Largest `weight * differential` seen while training
    pub peak: f64,
    /// Draws per attempt
    pub neval: usize,
    pub map: AdaptiveMap,
}

/// On-disk form of a ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderData {
    /// Lower kinematic cutoff the maps were trained with [GeV]
    #[serde(default)]
    pub lower_cutoff: f64,
    #[serde(default)]
    pub dark_mass: Option<f64>,
    pub entries: Vec<LadderEntry>,
}

#[derive(Debug, Clone)]
pub struct SampleLadder {
    process: Process,
    lower_cutoff: f64,
    dark_mass: Option<f64>,
    entries: Vec<LadderEntry>,
    energies: Vec<f64>,
    log_grid: Option<(f64, f64)>,
}

impl SampleLadder {
    pub fn new(process: Process, data: LadderData) -> Result<Self> {
        let invalid = |reason: String| ShowerError::InvalidTable {
            process: process.name().to_string(),
            reason,
        };
        if data.entries.is_empty() {
            return Err(invalid("ladder has no entries".to_string()));
        }
        if !(data.lower_cutoff.is_finite() && data.lower_cutoff >= 0.0) {
            return Err(invalid(format!("lower cutoff {} is invalid", data.lower_cutoff)));
        }
        let needs_cutoff = matches!(process, Process::Brem | Process::Moller | Process::Bhabha);
        if needs_cutoff && data.lower_cutoff <= 0.0 {
            return Err(invalid("process needs a positive lower cutoff".to_string()));
        }
        if let Some(m) = data.dark_mass {
            if !(m.is_finite() && m > 0.0) {
                return Err(invalid(format!("dark mass {} is invalid", m)));
            }
        }
        for (i, entry) in data.entries.iter().enumerate() {
            if !(entry.energy.is_finite() && entry.energy > 0.0) {
                return Err(invalid(format!("entry {} has energy {}", i, entry.energy)));
            }
            if i > 0 && entry.energy <= data.entries[i - 1].energy {
                return Err(invalid(format!(
                    "ladder energies not strictly increasing at entry {}",
                    i
                )));
            }
            if !(entry.peak.is_finite() && entry.peak > 0.0) {
                return Err(invalid(format!("entry {} has peak {}", i, entry.peak)));
            }
            if entry.neval == 0 {
                return Err(invalid(format!("entry {} has zero neval", i)));
            }
            check_map(&entry.map, process.name(), process.dimension())?;
        }
        let energies: Vec<f64> = data.entries.iter().map(|e| e.energy).collect();
        let log_grid = uniform_log_step(&energies);
        Ok(Self {
            process,
            lower_cutoff: data.lower_cutoff,
            dark_mass: data.dark_mass,
            entries: data.entries,
            energies,
            log_grid,
        })
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn lower_cutoff(&self) -> f64 {
        self.lower_cutoff
    }

    pub fn dark_mass(&self) -> Option<f64> {
        self.dark_mass
    }

    pub fn entries(&self) -> &[LadderEntry] {
        &self.entries
    }

    pub fn min_energy(&self) -> f64 {
        self.energies[0]
    }

    /// The rung at or below `energy`; the top rung for energies past the end,
    /// `None` below the first rung.
    pub fn entry_for(&self, energy: f64) -> Option<&LadderEntry> {
        let idx = match self.log_grid {
            Some((start, step)) => log_bucket_index(&self.energies, start, step, energy),
            None => bucket_index(&self.energies, energy),
        }?;
        self.entries.get(idx)
    }

    pub fn to_data(&self) -> LadderData {
        LadderData {
            lower_cutoff: self.lower_cutoff,
            dark_mass: self.dark_mass,
            entries: self.entries.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(energy: f64) -> LadderEntry {
        LadderEntry {
            energy,
            peak: 1.0,
            neval: 100,
            map: AdaptiveMap::uniform(1, 4),
        }
    }

    #[test]
    fn test_entry_selection() {
        let data = LadderData {
            lower_cutoff: 0.0,
            dark_mass: None,
            entries: vec![entry(0.01), entry(0.1), entry(1.0), entry(10.0)],
        };
        let ladder = SampleLadder::new(Process::Compton, data).unwrap();
        assert!(ladder.entry_for(0.009).is_none());
        assert_eq!(ladder.entry_for(0.01).unwrap().energy, 0.01);
        assert_eq!(ladder.entry_for(0.5).unwrap().energy, 0.1);
        assert_eq!(ladder.entry_for(1.0).unwrap().energy, 1.0);
        assert_eq!(ladder.entry_for(5000.0).unwrap().energy, 10.0);
    }

    #[test]
    fn test_rejects_dimension_mismatch() {
        let data = LadderData {
            lower_cutoff: 0.001,
            dark_mass: None,
            entries: vec![entry(0.01)],
        };
        assert!(matches!(
            SampleLadder::new(Process::Brem, data),
            Err(ShowerError::InvalidTable { .. })
        ));
    }

    #[test]
    fn test_rejects_unordered_or_unbounded_entries() {
        let mut bad_peak = entry(0.1);
        bad_peak.peak = 0.0;
        for entries in [vec![entry(0.1), entry(0.1)], vec![bad_peak], vec![]] {
            let data = LadderData {
                lower_cutoff: 0.0,
                dark_mass: None,
                entries,
            };
            assert!(SampleLadder::new(Process::Moller, data).is_err());
        }
    }
}
