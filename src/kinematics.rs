// Final-state reconstruction from sampled variables
//
// Every process samples a point in the unit hypercube. The helpers here turn
// that point into physical variables (energies, angles, the Jacobian of the
// change of variables) and from there into the two outgoing four-momenta in
// the local frame: incident particle along +z, target at rest.

use crate::constants::M_ELECTRON;
use crate::error::{Result, ShowerError};
use crate::particle::FourMomentum;
use crate::process::Process;
use nalgebra::{Rotation3, Vector3};
use std::f64::consts::PI;

/// What the differential cross sections and reconstruction need to know about
/// one interaction besides the sampled variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventInfo {
    /// Incident energy [GeV]
    pub energy: f64,
    /// Target nuclear charge
    pub target_z: f64,
    /// Dark vector mass [GeV]; ignored by Standard Model processes
    pub dark_mass: f64,
    /// Lower kinematic cutoff the sampling maps were trained with [GeV]
    pub lower_cutoff: f64,
}

impl EventInfo {
    pub fn new(energy: f64, target_z: f64) -> Self {
        Self {
            energy,
            target_z,
            dark_mass: 0.0,
            lower_cutoff: 0.0,
        }
    }

    pub fn with_dark_mass(mut self, dark_mass: f64) -> Self {
        self.dark_mass = dark_mass;
        self
    }

    pub fn with_lower_cutoff(mut self, lower_cutoff: f64) -> Self {
        self.lower_cutoff = lower_cutoff;
        self
    }

    /// Same event on a different target.
    pub fn on_target(mut self, target_z: f64) -> Self {
        self.target_z = target_z;
        self
    }
}

/// Radiative emission off a lepton in the nuclear field (Brem, DarkBrem).
///
/// `d` and `dp` are the scaled angles of the incoming and outgoing lepton
/// relative to the emitted boson; `phi` is their relative azimuth.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EmissionVars {
    pub ep: f64,
    pub w: f64,
    pub epp: f64,
    pub d: f64,
    pub dp: f64,
    pub phi: f64,
    pub jacobian: f64,
}

/// Pair conversion in the nuclear field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PairVars {
    pub w: f64,
    pub epp: f64,
    pub epm: f64,
    pub dp: f64,
    pub dm: f64,
    pub phi: f64,
    pub jacobian: f64,
}

pub(crate) fn brem_vars(event: &EventInfo, x: &[f64]) -> Option<EmissionVars> {
    let me = M_ELECTRON;
    let ep = event.energy;
    let w_min = event.lower_cutoff;
    let w_max = ep - me;
    if !(w_min > 0.0 && w_max > w_min) {
        return None;
    }
    let d_max = (ep / me).sqrt();
    let w = w_min + x[0] * (w_max - w_min);
    Some(EmissionVars {
        ep,
        w,
        epp: ep - w,
        d: x[1] * d_max,
        dp: x[2] * d_max,
        phi: 2.0 * PI * x[3],
        jacobian: (w_max - w_min) * d_max * d_max * 2.0 * PI,
    })
}

pub(crate) fn dark_brem_vars(event: &EventInfo, x: &[f64]) -> Option<EmissionVars> {
    let me = M_ELECTRON;
    let mv = event.dark_mass;
    let ep = event.energy;
    let w_max = ep - me;
    if !(mv > 0.0 && w_max > mv) {
        return None;
    }
    let d_max = (ep / mv).sqrt();
    let w = mv + x[0] * (w_max - mv);
    Some(EmissionVars {
        ep,
        w,
        epp: ep - w,
        d: x[1] * d_max,
        dp: x[2] * d_max,
        phi: 2.0 * PI * x[3],
        jacobian: (w_max - mv) * d_max * d_max * 2.0 * PI,
    })
}

pub(crate) fn pair_vars(event: &EventInfo, x: &[f64]) -> Option<PairVars> {
    let me = M_ELECTRON;
    let w = event.energy;
    if w <= 2.0 * me {
        return None;
    }
    let d_max = (w / me).sqrt();
    let epp = me + x[0] * (w - 2.0 * me);
    Some(PairVars {
        w,
        epp,
        epm: w - epp,
        dp: x[1] * d_max,
        dm: x[2] * d_max,
        phi: 2.0 * PI * x[3],
        jacobian: (w - 2.0 * me) * d_max * d_max * 2.0 * PI,
    })
}

/// CM scattering cosine and its Jacobian for the one-variable processes.
///
/// Moller and Bhabha keep both outgoing leptons above the lower cutoff in
/// kinetic energy, which bounds |cos| away from one.
pub(crate) fn cosine_var(process: Process, event: &EventInfo, x: &[f64]) -> Option<(f64, f64)> {
    match process {
        Process::Moller | Process::Bhabha => {
            let kinetic = event.energy - M_ELECTRON;
            if !(kinetic > 0.0 && event.lower_cutoff > 0.0) {
                return None;
            }
            let c_max = 1.0 - 2.0 * event.lower_cutoff / kinetic;
            if c_max <= 0.0 {
                return None;
            }
            Some((-c_max + 2.0 * c_max * x[0], 2.0 * c_max))
        }
        _ => Some((-1.0 + 2.0 * x[0], 2.0)),
    }
}

/// Masses of (projectile, target, first product, second product).
fn two_body_masses(process: Process, dark_mass: f64) -> (f64, f64, f64, f64) {
    let me = M_ELECTRON;
    match process {
        Process::Compton => (0.0, me, me, 0.0),
        Process::DarkCompton => (0.0, me, me, dark_mass),
        Process::Annihilation => (me, me, 0.0, 0.0),
        Process::DarkAnnihilation => (me, me, 0.0, dark_mass),
        _ => (me, me, me, me),
    }
}

/// Two-body scattering of a projectile of energy `e_a` off a target at rest.
///
/// `cos_cm` is the CM polar angle of the first product relative to the
/// projectile; the second recoils opposite. Both are boosted back along z.
/// `None` when the channel is closed.
pub fn two_body(e_a: f64, m_a: f64, m_b: f64, m_c: f64, m_d: f64, cos_cm: f64) -> Option<[FourMomentum; 2]> {
    let s = m_a * m_a + m_b * m_b + 2.0 * e_a * m_b;
    let lambda = (s - (m_c + m_d).powi(2)) * (s - (m_c - m_d).powi(2));
    if !(lambda >= 0.0) || s <= 0.0 {
        return None;
    }
    let rs = s.sqrt();
    let p_star = lambda.sqrt() / (2.0 * rs);
    let e_c = (s + m_c * m_c - m_d * m_d) / (2.0 * rs);
    let e_d = (s + m_d * m_d - m_c * m_c) / (2.0 * rs);

    let p_a = (e_a * e_a - m_a * m_a).max(0.0).sqrt();
    let beta = p_a / (e_a + m_b);
    let gamma = (e_a + m_b) / rs;

    let ct = cos_cm.clamp(-1.0, 1.0);
    let st = (1.0 - ct * ct).sqrt();
    let boost = |e: f64, px: f64, pz: f64| {
        FourMomentum::new(gamma * (e + beta * pz), px, 0.0, gamma * (pz + beta * e))
    };
    Some([
        boost(e_c, p_star * st, p_star * ct),
        boost(e_d, -p_star * st, -p_star * ct),
    ])
}

/// Lepton and boson from an emission: boson at angle theta from the incoming
/// lepton, outgoing lepton at theta' from the boson with relative azimuth phi.
fn emission_legs(v: &EmissionVars, boson_mass: f64, theta: f64, theta_p: f64) -> [FourMomentum; 2] {
    let me = M_ELECTRON;
    let (st, ct) = theta.min(PI).sin_cos();
    let (stp, ctp) = theta_p.min(PI).sin_cos();
    let (sph, cph) = v.phi.sin_cos();

    let k = (v.w * v.w - boson_mass * boson_mass).max(0.0).sqrt();
    let pp = (v.epp * v.epp - me * me).max(0.0).sqrt();

    let boson_dir = Vector3::new(-st, 0.0, ct);
    let lepton_dir = Vector3::new(
        stp * cph * ct - ctp * st,
        stp * sph,
        stp * cph * st + ctp * ct,
    );
    [
        FourMomentum {
            e: v.epp,
            p: lepton_dir * pp,
        },
        FourMomentum {
            e: v.w,
            p: boson_dir * k,
        },
    ]
}

/// Outgoing four-momenta in the local frame, in the order given by
/// [`Process::products`]. `None` when the variables fall outside the open
/// phase space at this energy, or `x` does not have `process.dimension()`
/// entries.
pub fn reconstruct(process: Process, event: &EventInfo, x: &[f64]) -> Option<[FourMomentum; 2]> {
    if x.len() != process.dimension() {
        return None;
    }
    let me = M_ELECTRON;
    match process {
        Process::Brem => {
            let v = brem_vars(event, x)?;
            let theta = v.d * me / v.ep;
            let theta_p = v.dp * me / v.epp;
            Some(emission_legs(&v, 0.0, theta, theta_p))
        }
        Process::DarkBrem => {
            let v = dark_brem_vars(event, x)?;
            let mv = event.dark_mass;
            let theta = mv / v.w * (v.epp / v.ep).sqrt() * v.d;
            let theta_p = mv / v.w * (v.ep / v.epp).sqrt() * v.dp;
            Some(emission_legs(&v, mv, theta, theta_p))
        }
        Process::PairProd => {
            let v = pair_vars(event, x)?;
            let (stp, ctp) = (v.dp * me / v.epp).min(PI).sin_cos();
            let (stm, ctm) = (v.dm * me / v.epm).min(PI).sin_cos();
            let (sph, cph) = v.phi.sin_cos();
            let pp = (v.epp * v.epp - me * me).max(0.0).sqrt();
            let pm = (v.epm * v.epm - me * me).max(0.0).sqrt();
            Some([
                FourMomentum::new(v.epp, pp * stp, 0.0, pp * ctp),
                FourMomentum::new(v.epm, pm * stm * cph, pm * stm * sph, pm * ctm),
            ])
        }
        _ => {
            let (ct, _) = cosine_var(process, event, x)?;
            let (m_a, m_b, m_c, m_d) = two_body_masses(process, event.dark_mass);
            two_body(event.energy, m_a, m_b, m_c, m_d, ct)
        }
    }
}

/// Squared 3-momentum absorbed by the nucleus, for form factor evaluation.
pub fn momentum_transfer_sq(process: Process, event: &EventInfo, x: &[f64]) -> Option<f64> {
    let [a, b] = reconstruct(process, event, x)?;
    let incident_mass = match process {
        Process::PairProd | Process::Compton | Process::DarkCompton => 0.0,
        _ => M_ELECTRON,
    };
    let p_in = (event.energy * event.energy - incident_mass * incident_mass)
        .max(0.0)
        .sqrt();
    let q = Vector3::new(0.0, 0.0, p_in) - a.p - b.p;
    Some(q.norm_squared())
}

/// Rotation taking the local +z axis onto `direction`: `Rz(phi) * Ry(theta)`.
///
/// On the z axis the azimuth is taken as zero, giving the identity along +z
/// and a half turn about y along -z. Zero momentum has no direction.
pub fn lab_rotation(direction: &Vector3<f64>, id: u128) -> Result<Rotation3<f64>> {
    let norm = direction.norm();
    if !(norm > 0.0 && norm.is_finite()) {
        return Err(ShowerError::DegenerateDirection { id });
    }
    let theta = (direction.z / norm).clamp(-1.0, 1.0).acos();
    let phi = if direction.x == 0.0 && direction.y == 0.0 {
        0.0
    } else {
        direction.y.atan2(direction.x)
    };
    Ok(Rotation3::from_axis_angle(&Vector3::z_axis(), phi)
        * Rotation3::from_axis_angle(&Vector3::y_axis(), theta))
}

/// Spin a local-frame pair about z by `azimuth`, then rotate into the lab.
pub fn to_lab(legs: [FourMomentum; 2], rotation: &Rotation3<f64>, azimuth: f64) -> [FourMomentum; 2] {
    let spin = Rotation3::from_axis_angle(&Vector3::z_axis(), azimuth);
    let full = rotation * spin;
    legs.map(|fm| FourMomentum {
        e: fm.e,
        p: full * fm.p,
    })
}
