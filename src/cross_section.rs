// Tabulated total cross sections and the interaction rates built from them
use crate::constants::{CM_TO_M, GEV_SQ_CM2};
use crate::error::{Result, ShowerError};
use crate::library::CrossSectionProvider;
use crate::material::Material;
use crate::process::{Process, TargetKind};
use crate::utilities::{
    interpolate_in_bucket, interpolate_linear_or_zero, log_bucket_index, uniform_log_step,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Total cross section of one process in one material, per scatterer.
///
/// Energies [GeV] are strictly increasing and cross sections [GeV^-2] are
/// non-negative. Evaluation is piecewise linear and exactly zero outside the
/// tabulated range.
#[derive(Debug, Clone)]
pub struct CrossSectionTable {
    process: Process,
    energies: Vec<f64>,
    values: Vec<f64>,
    log_grid: Option<(f64, f64)>,
}

impl CrossSectionTable {
    pub fn new(process: Process, pairs: &[[f64; 2]]) -> Result<Self> {
        let invalid = |reason: String| ShowerError::InvalidTable {
            process: process.name().to_string(),
            reason,
        };
        if pairs.len() < 2 {
            return Err(invalid(format!(
                "cross section table needs at least 2 points, got {}",
                pairs.len()
            )));
        }
        for (i, pair) in pairs.iter().enumerate() {
            let [e, s] = *pair;
            if !(e.is_finite() && e > 0.0) {
                return Err(invalid(format!("energy {} at row {} is not positive", e, i)));
            }
            if !(s.is_finite() && s >= 0.0) {
                return Err(invalid(format!("cross section {} at row {} is negative", s, i)));
            }
            if i > 0 && e <= pairs[i - 1][0] {
                return Err(invalid(format!(
                    "energies not strictly increasing at row {}",
                    i
                )));
            }
        }
        let energies: Vec<f64> = pairs.iter().map(|p| p[0]).collect();
        let values = pairs.iter().map(|p| p[1]).collect();
        let log_grid = uniform_log_step(&energies);
        Ok(Self {
            process,
            energies,
            values,
            log_grid,
        })
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn min_energy(&self) -> f64 {
        self.energies[0]
    }

    pub fn max_energy(&self) -> f64 {
        self.energies[self.energies.len() - 1]
    }

    /// Cross section per scatterer [GeV^-2] at `energy`.
    pub fn evaluate(&self, energy: f64) -> f64 {
        match self.log_grid {
            Some((start, step)) => {
                match log_bucket_index(&self.energies, start, step, energy) {
                    Some(idx) => interpolate_in_bucket(&self.energies, &self.values, idx, energy),
                    None => 0.0,
                }
            }
            None => interpolate_linear_or_zero(&self.energies, &self.values, energy),
        }
    }
}

/// A cross section table scaled by the material's scatterer density.
#[derive(Debug, Clone)]
pub struct CrossSectionInterpolant {
    table: Arc<CrossSectionTable>,
    /// scatterers/cm3 * cm2/GeV^-2
    scale: f64,
}

impl CrossSectionInterpolant {
    pub fn new(table: Arc<CrossSectionTable>, material: &Material) -> Self {
        let density = match table.process().target() {
            TargetKind::Nuclei => material.nuclear_density(),
            TargetKind::Electrons => material.electron_density(),
        };
        Self {
            table,
            scale: density * GEV_SQ_CM2,
        }
    }

    pub fn table(&self) -> &CrossSectionTable {
        &self.table
    }

    /// Lowest tabulated energy; below it the rate is zero.
    pub fn threshold(&self) -> f64 {
        self.table.min_energy()
    }

    /// Cross section per scatterer [GeV^-2]
    pub fn sigma(&self, energy: f64) -> f64 {
        self.table.evaluate(energy)
    }

    /// Interaction rate n*sigma [1/cm]
    pub fn n_sigma(&self, energy: f64) -> f64 {
        self.scale * self.table.evaluate(energy)
    }
}

/// Interpolants for a set of processes in one material.
#[derive(Debug, Clone)]
pub struct ProcessRates {
    material: Material,
    rates: HashMap<Process, CrossSectionInterpolant>,
}

impl ProcessRates {
    pub fn build<P: CrossSectionProvider + ?Sized>(
        provider: &P,
        material: &Material,
        processes: &[Process],
    ) -> Result<Self> {
        let mut rates = HashMap::new();
        for &process in processes {
            let table = provider.cross_section_table(process, &material.name)?;
            rates.insert(process, CrossSectionInterpolant::new(table, material));
        }
        Ok(Self {
            material: material.clone(),
            rates,
        })
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn get(&self, process: Process) -> Option<&CrossSectionInterpolant> {
        self.rates.get(&process)
    }

    /// n*sigma [1/cm]; zero for processes that were not loaded
    pub fn n_sigma(&self, process: Process, energy: f64) -> f64 {
        self.rates
            .get(&process)
            .map_or(0.0, |r| r.n_sigma(energy))
    }

    /// Cross section per scatterer [GeV^-2], zero below the process threshold
    pub fn sigma(&self, process: Process, energy: f64) -> f64 {
        self.rates.get(&process).map_or(0.0, |r| r.sigma(energy))
    }

    pub fn total_n_sigma(&self, processes: &[Process], energy: f64) -> f64 {
        processes.iter().map(|&p| self.n_sigma(p, energy)).sum()
    }

    /// Largest of the processes' lowest tabulated energies.
    pub fn threshold(&self, processes: &[Process]) -> f64 {
        processes
            .iter()
            .filter_map(|p| self.rates.get(p))
            .map(|r| r.threshold())
            .fold(0.0, f64::max)
    }

    pub fn process_threshold(&self, process: Process) -> f64 {
        self.rates.get(&process).map_or(f64::INFINITY, |r| r.threshold())
    }

    /// Mean free path [m]; infinite where nothing can happen.
    pub fn mean_free_path(&self, processes: &[Process], energy: f64) -> f64 {
        let total = self.total_n_sigma(processes, energy);
        if total > 0.0 && total.is_finite() {
            CM_TO_M / total
        } else {
            f64::INFINITY
        }
    }
}
