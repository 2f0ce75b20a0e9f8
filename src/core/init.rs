//! Initial positions and velocities.

use crate::core::geometry::{dot, PeriodicBox};
use crate::core::particle::{DIM, SIGMA};
use crate::error::{Error, Result};
use log::{debug, info};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// How the disks are laid out at t = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitialConfiguration {
    /// Random sequential placement with a bounded number of attempts per disk.
    Fluid,
    /// Square grid of ceil(sqrt(N)) columns.
    Rectangular,
    /// Triangular lattice: the square grid with alternate rows shifted by half a cell.
    #[default]
    Hexagonal,
}

impl InitialConfiguration {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fluid" | "f" | "random" => Some(Self::Fluid),
            "rectangular" | "r" | "square" => Some(Self::Rectangular),
            "hexagonal" | "h" | "triangular" => Some(Self::Hexagonal),
            _ => None,
        }
    }

    pub fn positions<R: Rng>(
        self,
        n: usize,
        bx: &PeriodicBox,
        attempts: usize,
        rng: &mut R,
    ) -> Result<Vec<[f64; DIM]>> {
        let positions = match self {
            Self::Fluid => random_fluid(n, bx, attempts, rng)?,
            Self::Rectangular => lattice(n, bx, |_row| 0.5),
            Self::Hexagonal => lattice(n, bx, |row| if row % 2 == 0 { 0.25 } else { 0.75 }),
        };
        debug!("placed {n} disks as {self:?}");
        Ok(positions)
    }
}

/// Columns per row for a near-square grid holding `n` sites.
fn columns(n: usize) -> usize {
    let mut nx = (0.01 + (n as f64).sqrt()) as usize;
    if nx * nx < n {
        nx += 1;
    }
    nx.max(1)
}

fn lattice(n: usize, bx: &PeriodicBox, x_offset: impl Fn(usize) -> f64) -> Vec<[f64; DIM]> {
    let nx = columns(n);
    let ax = bx.lx / nx as f64;
    let ay = bx.ly / nx as f64;
    (0..n)
        .map(|k| {
            let (col, row) = (k % nx, k / nx);
            [(col as f64 + x_offset(row)) * ax, (row as f64 + 0.5) * ay]
        })
        .collect()
}

fn random_fluid<R: Rng>(
    n: usize,
    bx: &PeriodicBox,
    attempts: usize,
    rng: &mut R,
) -> Result<Vec<[f64; DIM]>> {
    let mut placed: Vec<[f64; DIM]> = Vec::with_capacity(n);
    for particle in 0..n {
        let mut tries = 0usize;
        let r = loop {
            if tries >= attempts {
                return Err(Error::GenerationFailed { particle, attempts });
            }
            tries += 1;
            let r = [rng.random::<f64>() * bx.lx, rng.random::<f64>() * bx.ly];
            let r = bx.wrap(r);
            let clear = placed.iter().all(|q| {
                let d = bx.separation(r, *q);
                dot(&d, &d) >= SIGMA * SIGMA
            });
            if clear {
                break r;
            }
        };
        placed.push(r);
    }
    Ok(placed)
}

/// Gaussian velocities with zero total momentum, rescaled so the kinetic
/// energy per disk equals `temperature` (k = m = 1 in 2D).
pub fn thermal_velocities<R: Rng>(
    n: usize,
    temperature: f64,
    rng: &mut R,
) -> Result<Vec<[f64; DIM]>> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(Error::InvalidParam(format!(
            "temperature must be finite and > 0 (got {temperature})"
        )));
    }
    if n < 2 {
        return Err(Error::InvalidParam(
            "need at least 2 disks to zero the momentum".into(),
        ));
    }
    let normal = Normal::new(0.0, temperature.sqrt())
        .map_err(|e| Error::InvalidParam(format!("velocity distribution: {e}")))?;
    let mut v: Vec<[f64; DIM]> = (0..n)
        .map(|_| [normal.sample(rng), normal.sample(rng)])
        .collect();

    let mut cm = [0.0_f64; DIM];
    for vi in &v {
        for k in 0..DIM {
            cm[k] += vi[k] / n as f64;
        }
    }
    let mut ke = 0.0;
    for vi in v.iter_mut() {
        for k in 0..DIM {
            vi[k] -= cm[k];
        }
        ke += 0.5 * dot(vi, vi);
    }
    let ke_per_disk = ke / n as f64;
    if ke_per_disk <= 0.0 {
        return Err(Error::MathError(
            "drawn velocities have zero kinetic energy".into(),
        ));
    }
    let scale = (temperature / ke_per_disk).sqrt();
    for vi in v.iter_mut() {
        vi.iter_mut().for_each(|c| *c *= scale);
    }
    info!("drew {n} velocities at T = {temperature}");
    Ok(v)
}
