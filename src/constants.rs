// Physical constants in GeV-based natural units; lengths in meters unless noted

pub const ALPHA_EM: f64 = 1.0 / 137.035999;
/// Electron mass [GeV]
pub const M_ELECTRON: f64 = 0.51099895e-3;
/// Proton mass [g], used to turn mass densities into number densities
pub const M_PROTON_GRAMS: f64 = 1.67262192369e-24;
/// hbar*c [GeV cm]
pub const HBARC: f64 = 0.1973269804e-13;
/// Converts a cross section in GeV^-2 to cm^2
pub const GEV_SQ_CM2: f64 = HBARC * HBARC;
pub const CM_TO_M: f64 = 0.01;

pub const PDG_ELECTRON: i32 = 11;
pub const PDG_POSITRON: i32 = -11;
pub const PDG_PHOTON: i32 = 22;
pub const PDG_DARK_VECTOR: i32 = 4900022;

/// Highland multiple scattering scale [GeV]
pub const HIGHLAND_SCALE: f64 = 13.6e-3;
