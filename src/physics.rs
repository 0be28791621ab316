use crate::constants::HIGHLAND_SCALE;
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Rotate a direction by polar cosine `mu` and azimuth `phi` about itself.
pub fn rotate_direction_3d(u_old: &Vector3<f64>, mu: f64, phi: f64) -> Vector3<f64> {
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    // Find a perpendicular vector to u_old
    let perp = if u_old.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(u_old).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(u_old).normalize()
    };
    let ortho = u_old.cross(&perp);

    mu * u_old + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho
}

/// Highland width of the projected scattering angle [rad].
///
/// `momentum` in GeV, `path` and `radiation_length` in meters. Zero for a
/// vanishing path.
pub fn highland_theta0(momentum: f64, beta: f64, path: f64, radiation_length: f64) -> f64 {
    if !(path > 0.0 && momentum > 0.0 && beta > 0.0 && radiation_length > 0.0) {
        return 0.0;
    }
    let t = path / radiation_length;
    let theta0 = HIGHLAND_SCALE / (beta * momentum) * t.sqrt() * (1.0 + 0.038 * t.ln());
    theta0.max(0.0)
}

/// Direction after multiple scattering over `path`.
///
/// The two projected angles are independent Gaussians of width theta0; their
/// quadrature sum is the polar deflection.
pub fn scatter_direction<R: Rng + ?Sized>(
    u: &Vector3<f64>,
    momentum: f64,
    beta: f64,
    path: f64,
    radiation_length: f64,
    rng: &mut R,
) -> Vector3<f64> {
    let theta0 = highland_theta0(momentum, beta, path, radiation_length);
    let normal = match Normal::new(0.0, theta0) {
        Ok(n) if theta0 > 0.0 && theta0.is_finite() => n,
        _ => return *u,
    };
    let theta_x = normal.sample(rng);
    let theta_y = normal.sample(rng);
    let theta = theta_x.hypot(theta_y).min(std::f64::consts::PI);
    let phi = theta_y.atan2(theta_x);
    rotate_direction_3d(u, theta.cos(), phi).normalize()
}
