//! Run statistics accumulated from the event stream.
//!
//! `Observables` is the typed replacement for an ad hoc accumulator map:
//! it drives the engine one collision at a time and folds each
//! `EventRecord` into time averages, histograms and g(r).

use crate::config::SimConfig;
use crate::core::geometry::PeriodicBox;
use crate::core::{EventRecord, Particle, Simulation};
use crate::error::{Error, Result};
use serde::Serialize;
use std::f64::consts::PI;

/// Fixed-width histogram over [lo, lo + width * bins). Out-of-range
/// samples are counted separately.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    lo: f64,
    width: f64,
    counts: Vec<f64>,
    outside: u64,
}

impl Histogram {
    pub fn new(lo: f64, width: f64, bins: usize) -> Result<Self> {
        if !lo.is_finite() || !width.is_finite() || width <= 0.0 || bins == 0 {
            return Err(Error::InvalidParam(format!(
                "histogram needs finite lo, width > 0 and bins > 0 (got {lo}, {width}, {bins})"
            )));
        }
        Ok(Self {
            lo,
            width,
            counts: vec![0.0; bins],
            outside: 0,
        })
    }

    pub fn add(&mut self, x: f64) {
        let b = ((x - self.lo) / self.width).floor();
        if b >= 0.0 && (b as usize) < self.counts.len() {
            self.counts[b as usize] += 1.0;
        } else {
            self.outside += 1;
        }
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn outside(&self) -> u64 {
        self.outside
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Bin edges, `bins + 1` values.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.counts.len())
            .map(|b| self.lo + b as f64 * self.width)
            .collect()
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.counts.len())
            .map(|b| self.lo + (b as f64 + 0.5) * self.width)
            .collect()
    }

    pub fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0.0);
        self.outside = 0;
    }
}

/// Pair-distance histogram for the radial distribution function, out to
/// half the shorter box edge.
#[derive(Debug, Clone)]
pub struct RadialDistribution {
    pairs: Histogram,
    updates: u64,
}

impl RadialDistribution {
    pub fn new(bx: &PeriodicBox, bin_width: f64) -> Result<Self> {
        let r_max = 0.5 * bx.lx.min(bx.ly);
        let bins = (r_max / bin_width) as usize;
        Ok(Self {
            pairs: Histogram::new(0.0, bin_width, bins.max(1))?,
            updates: 0,
        })
    }

    pub fn accumulate(&mut self, particles: &[Particle], bx: &PeriodicBox) {
        for (i, a) in particles.iter().enumerate() {
            for b in &particles[i + 1..] {
                self.pairs.add(bx.distance(a.r, b.r));
            }
        }
        self.updates += 1;
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// (r, g(r)) with r the inner edge of each shell; empty before the first update.
    pub fn normalized(&self, n: usize, area: f64) -> Vec<(f64, f64)> {
        if self.updates == 0 || n == 0 {
            return Vec::new();
        }
        let rho = n as f64 / area;
        let dr = self.pairs.width;
        self.pairs
            .edges()
            .iter()
            .zip(self.pairs.counts())
            .map(|(&r, &c)| {
                let shell = PI * ((r + dr).powi(2) - r * r);
                (r, c / (shell * rho * self.updates as f64 * n as f64 * 0.5))
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
        self.updates = 0;
    }
}

/// Relative kinetic-energy variance treated as round-off.
const KE_VARIANCE_FLOOR: f64 = 1e-10;

/// Time-averaged thermodynamics and histograms of a run.
#[derive(Debug, Clone)]
pub struct Observables {
    n: usize,
    area: f64,
    time: f64,
    ke_dt: f64,
    ke_sum: f64,
    ke2_sum: f64,
    virial_sum: f64,
    collisions: u64,
    window_time: f64,
    window_virial: f64,
    window_ke_dt: f64,
    rdf_every: usize,
    velocity: Histogram,
    collision_time: Histogram,
    rdf: RadialDistribution,
}

/// Summary of the accumulated statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub time: f64,
    pub collisions: u64,
    pub density: f64,
    pub temperature: f64,
    pub mean_temperature: Option<f64>,
    /// PA / NkT from the virial theorem.
    pub pressure: Option<f64>,
    /// PA / NkT over the collisions since the previous report.
    pub recent_pressure: Option<f64>,
    pub heat_capacity: Option<f64>,
    pub mean_collision_time: Option<f64>,
    pub mean_free_path: Option<f64>,
    pub diffusion_x: Option<f64>,
    pub diffusion_y: Option<f64>,
}

impl Observables {
    pub fn new(config: &SimConfig, sim: &Simulation) -> Result<Self> {
        let vmax = config.velocity_max;
        let vbins = (2.0 * vmax / config.velocity_bin_width).ceil() as usize;
        Ok(Self {
            n: sim.num_particles(),
            area: sim.periodic_box().area(),
            time: 0.0,
            ke_dt: 0.0,
            ke_sum: 0.0,
            ke2_sum: 0.0,
            virial_sum: 0.0,
            collisions: 0,
            window_time: 0.0,
            window_virial: 0.0,
            window_ke_dt: 0.0,
            rdf_every: config.rdf_every.max(1),
            velocity: Histogram::new(-vmax, config.velocity_bin_width, vbins.max(1))?,
            collision_time: Histogram::new(
                0.0,
                config.collision_time_bin_width,
                config.collision_time_bins,
            )?,
            rdf: RadialDistribution::new(sim.periodic_box(), config.rdf_bin_width)?,
        })
    }

    /// Advance `sim` by one collision and fold it into the averages.
    pub fn step(&mut self, sim: &mut Simulation) -> Result<EventRecord> {
        let ke = sim.kinetic_energy();
        let ev = sim.step()?;

        self.time += ev.dt;
        self.ke_dt += ke * ev.dt;
        self.window_time += ev.dt;
        self.window_ke_dt += ke * ev.dt;
        self.virial_sum += ev.virial;
        self.window_virial += ev.virial;
        self.collisions += 1;

        let ke_after = sim.kinetic_energy();
        self.ke_sum += ke_after;
        self.ke2_sum += ke_after * ke_after;

        self.collision_time.add(ev.dt);
        for p in &sim.particles {
            self.velocity.add(p.v[0]);
        }
        if self.collisions % self.rdf_every as u64 == 0 {
            self.rdf.accumulate(&sim.particles, sim.periodic_box());
        }
        Ok(ev)
    }

    pub fn run(&mut self, sim: &mut Simulation, count: usize) -> Result<()> {
        for _ in 0..count {
            self.step(sim)?;
        }
        Ok(())
    }

    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub fn velocity_histogram(&self) -> &Histogram {
        &self.velocity
    }

    pub fn collision_time_histogram(&self) -> &Histogram {
        &self.collision_time
    }

    pub fn rdf(&self) -> Vec<(f64, f64)> {
        self.rdf.normalized(self.n, self.area)
    }

    /// Time-averaged kinetic energy per disk.
    pub fn mean_temperature(&self) -> Option<f64> {
        (self.time > 0.0).then(|| self.ke_dt / (self.time * self.n as f64))
    }

    /// PA / NkT = 1 + sum(virial) / (2 N T t).
    pub fn pressure(&self) -> Option<f64> {
        let t = self.mean_temperature()?;
        reduced_pressure(self.virial_sum, t, self.n, self.time)
    }

    /// Heat capacity per the temperature fluctuation formula, from the
    /// per-collision kinetic energy samples.
    ///
    /// Elastic collisions keep the kinetic energy constant, so for an
    /// isolated run the fluctuations are pure round-off and the formula is
    /// undefined (the ideal 2D value is C = N). `None` is returned whenever
    /// the relative variance is below `KE_VARIANCE_FLOOR`; a value only
    /// appears when the kinetic energy was changed from outside, e.g. by
    /// `Simulation::set_velocities` between steps.
    pub fn heat_capacity(&self) -> Option<f64> {
        if self.collisions == 0 {
            return None;
        }
        let steps = self.collisions as f64;
        let n = self.n as f64;
        let mean = self.ke_sum / steps;
        let var = self.ke2_sum / steps - mean * mean;
        if mean <= 0.0 || var <= KE_VARIANCE_FLOOR * mean * mean {
            return None;
        }
        let t = mean / n;
        let denom = var / (n * t * t) - 1.0;
        (denom != 0.0).then(|| n / denom)
    }

    /// Summarise, then start a new window for `recent_pressure`.
    pub fn report(&mut self, sim: &Simulation) -> Report {
        let recent_pressure = if self.window_time > 0.0 {
            let t = self.window_ke_dt / (self.window_time * self.n as f64);
            reduced_pressure(self.window_virial, t, self.n, self.window_time)
        } else {
            None
        };
        self.window_time = 0.0;
        self.window_virial = 0.0;
        self.window_ke_dt = 0.0;

        let diffusion = sim.msd_sample().diffusion_constants();
        Report {
            time: self.time,
            collisions: self.collisions,
            density: self.n as f64 / self.area,
            temperature: sim.kinetic_energy() / self.n as f64,
            mean_temperature: self.mean_temperature(),
            pressure: self.pressure(),
            recent_pressure,
            heat_capacity: self.heat_capacity(),
            mean_collision_time: (self.collisions > 0)
                .then(|| self.n as f64 * self.time / self.collisions as f64),
            mean_free_path: sim.mean_free_path(),
            diffusion_x: diffusion.map(|d| d.0),
            diffusion_y: diffusion.map(|d| d.1),
        }
    }

    /// Zero every accumulator, including the engine's mean-free-path counters.
    pub fn reset(&mut self, sim: &mut Simulation) {
        self.time = 0.0;
        self.ke_dt = 0.0;
        self.ke_sum = 0.0;
        self.ke2_sum = 0.0;
        self.virial_sum = 0.0;
        self.collisions = 0;
        self.window_time = 0.0;
        self.window_virial = 0.0;
        self.window_ke_dt = 0.0;
        self.velocity.clear();
        self.collision_time.clear();
        self.rdf.clear();
        sim.reset_counters();
    }
}

fn reduced_pressure(virial: f64, temperature: f64, n: usize, time: f64) -> Option<f64> {
    (temperature > 0.0 && time > 0.0)
        .then(|| 1.0 + 0.5 * virial / (temperature * n as f64 * time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_bins_and_edges() -> Result<()> {
        let mut h = Histogram::new(-1.0, 0.5, 4)?;
        for x in [-1.0, -0.6, 0.1, 0.99, 1.0, -3.0] {
            h.add(x);
        }
        assert_eq!(h.counts(), &[2.0, 0.0, 1.0, 1.0]);
        assert_eq!(h.outside(), 2);
        assert_eq!(h.edges(), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(h.centers()[0], -0.75);
        h.clear();
        assert_eq!(h.total(), 0.0);
        Ok(())
    }

    #[test]
    fn histogram_rejects_zero_width() {
        assert!(Histogram::new(0.0, 0.0, 10).is_err());
        assert!(Histogram::new(0.0, 1.0, 0).is_err());
    }

    #[test]
    fn rdf_of_two_disks_peaks_at_their_distance() -> Result<()> {
        let bx = PeriodicBox::new(10.0, 10.0)?;
        let ps = vec![
            Particle::new(0, [2.0, 2.0], [0.0, 0.0])?,
            Particle::new(1, [3.25, 2.0], [0.0, 0.0])?,
        ];
        let mut g = RadialDistribution::new(&bx, 0.5)?;
        g.accumulate(&ps, &bx);
        let gn = g.normalized(2, bx.area());
        assert_eq!(gn.len(), 10);
        let peak = gn
            .iter()
            .enumerate()
            .max_by(|a, b| a.1 .1.total_cmp(&b.1 .1))
            .map(|(k, _)| k);
        assert_eq!(peak, Some(2));
        Ok(())
    }

    #[test]
    fn pressure_formula() {
        let p = reduced_pressure(4.0, 1.0, 2, 1.0).expect("defined");
        assert!((p - 2.0).abs() < 1e-12);
        assert_eq!(reduced_pressure(1.0, 1.0, 2, 0.0), None);
    }
}
