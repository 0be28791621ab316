// Separable piecewise-linear importance-sampling map (VEGAS grid)
use crate::error::{Result, ShowerError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Maps the unit hypercube onto itself, one grid per dimension.
///
/// Each grid has `N + 1` strictly increasing nodes spanning `[0, 1]`. A
/// uniform `y` falls in increment `i = floor(y N)` and maps linearly into
/// `[g_i, g_{i+1}]`, so narrow increments concentrate points where the
/// integrand is large. The Jacobian of the map is `prod_d N (g_{i+1} - g_i)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveMap {
    pub grid: Vec<Vec<f64>>,
}

impl AdaptiveMap {
    /// Identity map with `increments` equal bins per dimension.
    pub fn uniform(dimension: usize, increments: usize) -> Self {
        let n = increments.max(1);
        let nodes: Vec<f64> = (0..=n).map(|i| i as f64 / n as f64).collect();
        Self {
            grid: vec![nodes; dimension],
        }
    }

    pub fn dimension(&self) -> usize {
        self.grid.len()
    }

    /// Reject grids that are empty, leave `[0, 1]` or are not strictly increasing.
    pub fn validate(&self, process: &str) -> Result<()> {
        let invalid = |reason: String| ShowerError::InvalidTable {
            process: process.to_string(),
            reason,
        };
        if self.grid.is_empty() {
            return Err(invalid("map has no dimensions".to_string()));
        }
        for (d, nodes) in self.grid.iter().enumerate() {
            if nodes.len() < 2 {
                return Err(invalid(format!("dimension {} has fewer than 2 nodes", d)));
            }
            if nodes.iter().any(|g| !(0.0..=1.0).contains(g)) {
                return Err(invalid(format!("dimension {} has nodes outside [0, 1]", d)));
            }
            if nodes.windows(2).any(|w| w[1] <= w[0]) {
                return Err(invalid(format!("dimension {} nodes are not strictly increasing", d)));
            }
        }
        Ok(())
    }

    /// Map `y` into `x` (written in place) and return the Jacobian.
    pub fn map(&self, y: &[f64], x: &mut [f64]) -> f64 {
        let mut jac = 1.0;
        for (d, nodes) in self.grid.iter().enumerate() {
            let n = nodes.len() - 1;
            let scaled = y[d] * n as f64;
            let i = (scaled.floor() as usize).min(n - 1);
            let frac = scaled - i as f64;
            let width = nodes[i + 1] - nodes[i];
            x[d] = nodes[i] + frac * width;
            jac *= n as f64 * width;
        }
        jac
    }

    /// Draw one point and its Jacobian.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, x: &mut [f64]) -> f64 {
        let mut y = [0.0f64; 8];
        let dim = self.dimension();
        if dim <= y.len() {
            for v in y.iter_mut().take(dim) {
                *v = rng.gen::<f64>();
            }
            self.map(&y[..dim], x)
        } else {
            let y: Vec<f64> = (0..dim).map(|_| rng.gen::<f64>()).collect();
            self.map(&y, x)
        }
    }
}

/// Check a deserialized map against the dimension a process expects.
pub(crate) fn check_map(map: &AdaptiveMap, process: &str, dimension: usize) -> Result<()> {
    map.validate(process)?;
    if map.dimension() != dimension {
        return Err(ShowerError::InvalidTable {
            process: process.to_string(),
            reason: format!(
                "map has {} dimensions, process samples {}",
                map.dimension(),
                dimension
            ),
        });
    }
    Ok(())
}
