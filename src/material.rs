// Target materials for shower transport
use crate::constants::{CM_TO_M, M_PROTON_GRAMS};
use crate::error::{Result, ShowerError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A homogeneous target the shower develops in.
///
/// Only bulk properties enter the transport: the nuclear charge and mass
/// number set the number densities the tabulated cross sections are scaled
/// by, the density sets the continuous energy loss, and the radiation length
/// sets the multiple scattering width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Nuclear charge Z
    pub z: f64,
    /// Mass number A
    pub a: f64,
    /// Atomic mass [u]
    pub mass: f64,
    /// Density [g/cm3]
    pub density: f64,
}

/// (name, Z, A, atomic mass, density g/cm3)
const TARGETS: &[(&str, f64, f64, f64, f64)] = &[
    ("graphite", 6.0, 12.0, 11.178, 2.210),
    ("lead", 82.0, 207.0, 207.2, 11.35),
    ("iron", 26.0, 56.0, 55.845, 8.00),
    ("hydrogen", 1.0, 1.0, 1.0, 1.0),
    ("aluminum", 13.0, 27.0, 26.9815385, 2.699),
    ("tungsten", 74.0, 183.84, 183.84, 19.3),
    ("molybdenum", 42.0, 95.95, 95.95, 10.2),
];

impl Material {
    /// Look up one of the built-in targets by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        let key = name.trim().to_lowercase();
        TARGETS
            .iter()
            .find(|(n, ..)| *n == key)
            .map(|&(n, z, a, mass, density)| Material {
                name: n.to_string(),
                z,
                a,
                mass,
                density,
            })
            .ok_or_else(|| ShowerError::UnknownMaterial(name.to_string()))
    }

    /// The material sampling maps are trained on.
    pub fn reference() -> Self {
        Material {
            name: "hydrogen".to_string(),
            z: 1.0,
            a: 1.0,
            mass: 1.0,
            density: 1.0,
        }
    }

    pub fn known_names() -> Vec<&'static str> {
        TARGETS.iter().map(|(n, ..)| *n).collect()
    }

    /// Nuclei per cm3
    pub fn nuclear_density(&self) -> f64 {
        self.density / M_PROTON_GRAMS / self.a
    }

    /// Electrons per cm3
    pub fn electron_density(&self) -> f64 {
        self.nuclear_density() * self.z
    }

    /// Continuous energy loss in MeV/cm
    pub fn dedx_mev_per_cm(&self) -> f64 {
        2.0 * self.density
    }

    /// Continuous energy loss in GeV/m
    pub fn dedx(&self) -> f64 {
        self.dedx_mev_per_cm() * 1.0e-3 / CM_TO_M
    }

    /// Radiation length in meters (Dahl's fit)
    pub fn radiation_length(&self) -> f64 {
        let z = self.z;
        let x0_g_cm2 = 716.4 * self.a / (z * (z + 1.0) * (287.0 / z.sqrt()).ln());
        x0_g_cm2 / self.density * CM_TO_M
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Z={}, A={})", self.name, self.z, self.a)
    }
}
