//! Mean-squared-displacement bookkeeping.
//!
//! Displacements are integrated from velocities, never wrapped, so they
//! keep counting through the periodic boundaries. The tracking window of
//! length `window` is split into `bins` equal lags; after each free flight
//! the summed squared displacement is added to the bin of the time
//! elapsed since the window opened. A flight that would overrun the window
//! restarts it instead, zeroing every displacement.

use crate::core::particle::{Particle, DIM};
use crate::error::{Error, Result};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Displacements {
    window: f64,
    bin_width: f64,
    elapsed: f64,
    dr: Vec<[f64; DIM]>,
    sum_sq: Vec<[f64; DIM]>,
    samples: Vec<u64>,
}

/// Snapshot of the binned MSD, normalised per particle and per sample.
/// Bins that have never been visited report 0 and `samples == 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsdSample {
    pub times: Vec<f64>,
    pub dx2: Vec<f64>,
    pub dy2: Vec<f64>,
    pub samples: Vec<u64>,
}

impl Displacements {
    pub fn new(n: usize, window: f64, bins: usize) -> Result<Self> {
        if !window.is_finite() || window <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "msd window must be finite and > 0 (got {window})"
            )));
        }
        if bins == 0 {
            return Err(Error::InvalidParam("msd bins must be > 0".into()));
        }
        Ok(Self {
            window,
            bin_width: window / bins as f64,
            elapsed: 0.0,
            dr: vec![[0.0; DIM]; n],
            sum_sq: vec![[0.0; DIM]; bins],
            samples: vec![0; bins],
        })
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn bins(&self) -> usize {
        self.samples.len()
    }

    /// Time since the current window opened.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Unwrapped displacement of each particle since the window opened.
    pub fn displacements(&self) -> &[[f64; DIM]] {
        &self.dr
    }

    /// Account for `dt` of free flight at the particles' current velocities.
    pub fn record(&mut self, dt: f64, particles: &[Particle]) {
        if self.elapsed + dt < self.window {
            self.elapsed += dt;
            let bin = ((self.elapsed / self.bin_width) as usize).min(self.bins() - 1);
            self.samples[bin] += 1;
            for (d, p) in self.dr.iter_mut().zip(particles) {
                for k in 0..DIM {
                    d[k] += p.v[k] * dt;
                    self.sum_sq[bin][k] += d[k] * d[k];
                }
            }
        } else {
            self.restart_window();
        }
    }

    /// Drop the displacements of the current window.
    pub fn restart_window(&mut self) {
        self.elapsed = 0.0;
        self.dr.iter_mut().for_each(|d| *d = [0.0; DIM]);
    }

    /// Clear the accumulated bins as well as the current window.
    pub fn reset(&mut self) {
        self.restart_window();
        self.sum_sq.iter_mut().for_each(|s| *s = [0.0; DIM]);
        self.samples.iter_mut().for_each(|c| *c = 0);
    }

    pub fn sample(&self) -> MsdSample {
        let n = self.dr.len().max(1) as f64;
        let mut out = MsdSample {
            times: Vec::with_capacity(self.bins()),
            dx2: Vec::with_capacity(self.bins()),
            dy2: Vec::with_capacity(self.bins()),
            samples: self.samples.clone(),
        };
        for (b, (s, &c)) in self.sum_sq.iter().zip(&self.samples).enumerate() {
            out.times.push((b as f64 + 0.5) * self.bin_width);
            if c == 0 {
                out.dx2.push(0.0);
                out.dy2.push(0.0);
            } else {
                let norm = c as f64 * n;
                out.dx2.push(s[0] / norm);
                out.dy2.push(s[1] / norm);
            }
        }
        out
    }
}

impl MsdSample {
    /// Self-diffusion constants (D_x, D_y) from a least-squares fit of
    /// <dx^2> = 2 D t through the origin, over visited bins only.
    pub fn diffusion_constants(&self) -> Option<(f64, f64)> {
        let mut t2 = 0.0;
        let mut xt = 0.0;
        let mut yt = 0.0;
        for (((&t, &x2), &y2), &c) in self
            .times
            .iter()
            .zip(&self.dx2)
            .zip(&self.dy2)
            .zip(&self.samples)
        {
            if c > 0 {
                t2 += t * t;
                xt += t * x2;
                yt += t * y2;
            }
        }
        (t2 > 0.0).then(|| (0.5 * xt / t2, 0.5 * yt / t2))
    }
}
