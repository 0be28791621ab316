// Synthetic in-memory tables for integration tests
#![allow(dead_code)]

use emshower::differential::{differential, form_factor_ratio};
use emshower::{
    AdaptiveMap, CrossSectionTable, EventInfo, FourMomentum, LadderData, LadderEntry, Material,
    Process, ProcessTables, SampleLadder, SeedParticle, ShowerSettings, TableLibrary,
};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

pub const MATERIAL: &str = "graphite";
pub const DARK_MASS: f64 = 0.02;
pub const LOWER_CUTOFF: f64 = 1e-3;
pub const TABLE_MIN: f64 = 0.02;
pub const DARK_TABLE_MIN: f64 = 1.0;
pub const TABLE_MAX: f64 = 100.0;
pub const MIN_ENERGY: f64 = 0.05;
pub const NEVAL: usize = 100;

static LIBRARY: Lazy<TableLibrary> = Lazy::new(|| {
    let mut library = TableLibrary::new();
    for process in Process::ALL {
        library.insert(process_tables(process));
    }
    library
});

/// Every process for graphite, built once per test binary.
pub fn library() -> &'static TableLibrary {
    &LIBRARY
}

pub fn material() -> Material {
    Material::from_name(MATERIAL).unwrap()
}

pub fn settings(seed: u64) -> ShowerSettings {
    ShowerSettings {
        min_energy: MIN_ENERGY,
        seed: Some(seed),
        ..Default::default()
    }
}

pub fn log_space(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let (a, b) = (lo.log10(), hi.log10());
    (0..n)
        .map(|i| 10f64.powf(a + (b - a) * i as f64 / (n - 1) as f64))
        .collect()
}

/// Flat per-scatterer cross sections [GeV^-2], mean free paths of a few cm.
pub fn total_cross_section(process: Process) -> f64 {
    match process {
        Process::Brem => 3000.0,
        Process::PairProd => 2500.0,
        Process::Compton => 300.0,
        Process::Moller => 200.0,
        Process::Bhabha => 200.0,
        Process::Annihilation => 100.0,
        Process::DarkBrem => 1.0,
        Process::DarkAnnihilation => 0.1,
        Process::DarkCompton => 0.1,
    }
}

pub fn table_min(process: Process) -> f64 {
    if process.is_dark() {
        DARK_TABLE_MIN
    } else {
        TABLE_MIN
    }
}

pub fn lower_cutoff(process: Process) -> f64 {
    match process {
        Process::Brem | Process::Moller | Process::Bhabha => LOWER_CUTOFF,
        _ => 0.0,
    }
}

pub fn event(process: Process, energy: f64) -> EventInfo {
    EventInfo::new(energy, material().z)
        .with_dark_mass(DARK_MASS)
        .with_lower_cutoff(lower_cutoff(process))
}

/// Largest `weight * dsigma * F` found by scanning random points, with headroom.
pub fn calibrate_peak(process: Process, energy: f64, map: &AdaptiveMap, neval: usize, rng: &mut StdRng) -> f64 {
    let event = event(process, energy);
    let mut x = vec![0.0; process.dimension()];
    let mut peak: f64 = 0.0;
    for _ in 0..10_000 {
        let jac = map.sample(rng, &mut x);
        let value = jac / neval as f64 * differential(process, &event, &x) * form_factor_ratio(process, &event, &x);
        if value.is_finite() {
            peak = peak.max(value);
        }
    }
    (1.2 * peak).max(1e-30)
}

pub fn ladder_data(process: Process, rungs: &[f64]) -> LadderData {
    let mut rng = StdRng::seed_from_u64(0x5eed ^ process as u64);
    let entries = rungs
        .iter()
        .map(|&energy| {
            let map = AdaptiveMap::uniform(process.dimension(), 8);
            let peak = calibrate_peak(process, energy, &map, NEVAL, &mut rng);
            LadderEntry {
                energy,
                peak,
                neval: NEVAL,
                map,
            }
        })
        .collect();
    LadderData {
        lower_cutoff: lower_cutoff(process),
        dark_mass: process.is_dark().then_some(DARK_MASS),
        entries,
    }
}

pub fn cross_section_table(process: Process) -> CrossSectionTable {
    let sigma = total_cross_section(process);
    let pairs: Vec<[f64; 2]> = log_space(table_min(process), TABLE_MAX, 12)
        .into_iter()
        .map(|e| [e, sigma])
        .collect();
    CrossSectionTable::new(process, &pairs).unwrap()
}

pub fn process_tables(process: Process) -> ProcessTables {
    let rungs = log_space(table_min(process), TABLE_MAX, 13);
    let ladder = SampleLadder::new(process, ladder_data(process, &rungs)).unwrap();
    let cross_sections = HashMap::from([(MATERIAL.to_string(), cross_section_table(process))]);
    ProcessTables::new(process, cross_sections, ladder).unwrap()
}

/// A seed moving along `direction` (normalized here).
pub fn seed_along(pdg: i32, energy: f64, direction: [f64; 3]) -> SeedParticle {
    let mass = if pdg == 22 { 0.0 } else { emshower::constants::M_ELECTRON };
    let dir = nalgebra::Vector3::from(direction).normalize();
    SeedParticle::new(pdg, FourMomentum::on_shell(energy, mass, &dir), 0).unwrap()
}

pub fn seed(pdg: i32, energy: f64) -> SeedParticle {
    seed_along(pdg, energy, [0.0, 0.0, 1.0])
}

pub fn random_direction(rng: &mut StdRng) -> [f64; 3] {
    let mu: f64 = rng.gen_range(-1.0..1.0);
    let phi: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let s = (1.0 - mu * mu).sqrt();
    [s * phi.cos(), s * phi.sin(), mu]
}

/// Route `log` output through the test harness; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
