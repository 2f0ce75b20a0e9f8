use crate::core::event::{EventRecord, Prediction};
use crate::core::geometry::{dot, PeriodicBox};
use crate::core::msd::{Displacements, MsdSample};
use crate::core::particle::{Particle, DIM, SIGMA};
use crate::core::schedule::Schedule;
use crate::error::{Error, Result};
use log::{debug, trace};

/// Small numeric tolerance for time and geometric checks.
const EPS_TIME: f64 = 1e-12;

/// Allowed interpenetration when validating a configuration.
const EPS_OVERLAP: f64 = 1e-9;

/// Default number of MSD lag bins.
pub const DEFAULT_MSD_BINS: usize = 20;

/// Event-driven hard-disk gas in a periodic box.
///
/// Each `step` jumps the clock to the earliest predicted contact, moves
/// every disk ballistically to that instant, applies the elastic impulse to
/// the colliding pair and repairs the prediction table. Positions always lie
/// inside the box after a step.
#[derive(Debug, Clone)]
pub struct Simulation {
    time_now: f64,
    bx: PeriodicBox,
    pub particles: Vec<Particle>,
    schedule: Schedule,
    msd: Displacements,
    last_collision: Vec<f64>,
    free_path_sum: f64,
    collisions: u64,
}

impl Simulation {
    /// Set up the engine from explicit positions and velocities.
    ///
    /// Positions are folded into the box; any pair closer than σ under the
    /// minimum-image convention is rejected. `msd_window` defaults to
    /// `2 Lx / T` with T the kinetic temperature of `velocities`.
    pub fn new(
        positions: &[[f64; DIM]],
        velocities: &[[f64; DIM]],
        lx: f64,
        ly: f64,
        msd_window: Option<f64>,
        msd_bins: usize,
    ) -> Result<Self> {
        let n = positions.len();
        if n < 2 {
            return Err(Error::InvalidParam(format!(
                "need at least 2 disks (got {n})"
            )));
        }
        if velocities.len() != n {
            return Err(Error::InvalidParam(format!(
                "got {n} positions but {} velocities",
                velocities.len()
            )));
        }
        let bx = PeriodicBox::new(lx, ly)?;

        let mut particles = Vec::with_capacity(n);
        for (id, (r, v)) in positions.iter().zip(velocities).enumerate() {
            let mut p = Particle::new(id as u32, *r, *v)?;
            p.r = bx.wrap(p.r);
            particles.push(p);
        }
        check_overlaps(&particles, &bx)?;

        let window = match msd_window {
            Some(w) => w,
            None => {
                let ke: f64 = particles.iter().map(|p| p.kinetic_energy()).sum();
                let t = ke / n as f64;
                if t <= 0.0 {
                    return Err(Error::InvalidParam(
                        "msd window needs a moving system or an explicit value".into(),
                    ));
                }
                2.0 * lx / t
            }
        };
        let msd = Displacements::new(n, window, msd_bins)?;
        let schedule = Schedule::build(&particles, &bx)?;
        debug!(
            "simulation ready: {n} disks in {lx} x {ly}, msd window {window:.3} over {msd_bins} bins"
        );

        Ok(Self {
            time_now: 0.0,
            bx,
            particles,
            schedule,
            msd,
            last_collision: vec![0.0; n],
            free_path_sum: 0.0,
            collisions: 0,
        })
    }

    /// Returns current simulation time.
    pub fn time(&self) -> f64 {
        self.time_now
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn periodic_box(&self) -> &PeriodicBox {
        &self.bx
    }

    /// Positions as a Vec of fixed-size arrays.
    pub fn positions(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.r).collect()
    }

    /// Velocities as a Vec of fixed-size arrays.
    pub fn velocities(&self) -> Vec<[f64; DIM]> {
        self.particles.iter().map(|p| p.v).collect()
    }

    /// Read-only view of the prediction table (diagnostics).
    pub fn predictions(&self) -> &[Option<Prediction>] {
        self.schedule.rows()
    }

    /// Time until the next predicted collision, if any.
    pub fn next_event_time(&self) -> Option<f64> {
        self.schedule.next_event().map(|(dt, _, _)| dt)
    }

    /// Total kinetic energy.
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }

    /// Total momentum (unit masses).
    pub fn total_momentum(&self) -> [f64; DIM] {
        let mut p = [0.0; DIM];
        for q in &self.particles {
            for (pk, vk) in p.iter_mut().zip(q.v) {
                *pk += vk;
            }
        }
        p
    }

    /// Number of collisions since construction or the last `reset_counters`.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    /// Mean distance flown between successive collisions of a disk.
    pub fn mean_free_path(&self) -> Option<f64> {
        (self.collisions > 0).then(|| 0.5 * self.free_path_sum / self.collisions as f64)
    }

    /// Mean time between successive collisions of a disk.
    pub fn mean_free_time(&self) -> Option<f64> {
        (self.collisions > 0)
            .then(|| self.num_particles() as f64 * self.time_now / self.collisions as f64)
    }

    pub fn msd_sample(&self) -> MsdSample {
        self.msd.sample()
    }

    /// Clear the mean-free-path statistics and MSD bins; the clock keeps running.
    pub fn reset_counters(&mut self) {
        self.collisions = 0;
        self.free_path_sum = 0.0;
        self.last_collision.iter_mut().for_each(|t| *t = self.time_now);
        self.msd.reset();
    }

    /// Process exactly one collision.
    pub fn step(&mut self) -> Result<EventRecord> {
        let (dt, i, j) = self.schedule.next_event().ok_or(Error::NoCollision)?;
        self.drift_all(dt)?;
        self.track_free_paths(i, j);

        let virial = self.resolve_p2p(i, j)?;
        self.particles[i].bump_collision_count();
        self.particles[j].bump_collision_count();
        self.collisions += 1;

        self.schedule
            .invalidate_around(i, j, &self.particles, &self.bx)?;

        trace!(
            "t={:.6} dt={dt:.6} collision {i}-{j} virial={virial:.6}",
            self.time_now
        );
        Ok(EventRecord {
            time: self.time_now,
            dt,
            i,
            j,
            virial,
        })
    }

    /// Run `count` collisions, returning their records.
    pub fn run(&mut self, count: usize) -> Result<Vec<EventRecord>> {
        (0..count).map(|_| self.step()).collect()
    }

    /// Advance the simulation to `target_time` (must be >= current time),
    /// handling every collision on the way and free-flying the remainder.
    pub fn advance_to(&mut self, target_time: f64) -> Result<()> {
        if !target_time.is_finite() {
            return Err(Error::InvalidParam("target_time must be finite".into()));
        }
        if target_time < self.time_now - EPS_TIME {
            return Err(Error::InvalidParam(
                "target_time cannot be earlier than current time".into(),
            ));
        }
        while self.time_now + EPS_TIME < target_time {
            let remaining = target_time - self.time_now;
            match self.next_event_time() {
                Some(dt) if dt <= remaining => {
                    self.step()?;
                }
                _ => {
                    self.drift_all(remaining)?;
                    break;
                }
            }
        }
        Ok(())
    }

    /// Free flight for `dt` without any collision. `dt` may not pass the
    /// next predicted contact.
    pub fn drift(&mut self, dt: f64) -> Result<()> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(Error::InvalidParam(format!(
                "drift time must be finite and >= 0 (got {dt})"
            )));
        }
        if let Some(next) = self.next_event_time() {
            if dt > next + EPS_TIME {
                return Err(Error::InvalidParam(format!(
                    "drift of {dt} passes the next collision at {next}"
                )));
            }
        }
        self.drift_all(dt)
    }

    /// Replace every position, then rebuild the prediction table.
    pub fn set_positions(&mut self, positions: &[[f64; DIM]]) -> Result<()> {
        self.check_len(positions.len())?;
        let mut moved = self.particles.clone();
        for (p, r) in moved.iter_mut().zip(positions) {
            p.set_position(*r)?;
            p.r = self.bx.wrap(p.r);
        }
        check_overlaps(&moved, &self.bx)?;
        self.particles = moved;
        self.rebuild_schedule()
    }

    /// Replace every velocity, then rebuild the prediction table.
    pub fn set_velocities(&mut self, velocities: &[[f64; DIM]]) -> Result<()> {
        self.check_len(velocities.len())?;
        for (p, v) in self.particles.iter_mut().zip(velocities) {
            p.set_velocity(*v)?;
        }
        self.rebuild_schedule()
    }

    /// Rebuild the prediction table from the current particle states.
    pub fn rebuild_schedule(&mut self) -> Result<()> {
        self.schedule = Schedule::build(&self.particles, &self.bx)?;
        Ok(())
    }

    /// Recompute one row of the prediction table (diagnostics and tests).
    pub fn rebuild_from(&mut self, i: usize) -> Result<()> {
        self.check_index(i)?;
        self.schedule.rebuild_from(i, &self.particles, &self.bx)
    }

    // ============ Internal helpers ============

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.particles.len() {
            return Err(Error::InvalidParam(format!(
                "expected {} entries, got {len}",
                self.particles.len()
            )));
        }
        Ok(())
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.particles.len() {
            return Err(Error::InvalidParam(format!(
                "particle index {i} out of range 0..{}",
                self.particles.len()
            )));
        }
        Ok(())
    }

    /// Move every disk by `dt`, fold it back into the box, count the
    /// predictions down and feed the unwrapped displacement tracker.
    fn drift_all(&mut self, dt: f64) -> Result<()> {
        if dt <= 0.0 {
            return Ok(());
        }
        self.msd.record(dt, &self.particles);
        for p in &mut self.particles {
            let mut r = p.r;
            for (rk, vk) in r.iter_mut().zip(p.v) {
                *rk += vk * dt;
            }
            p.r = self.bx.wrap(r);
        }
        self.schedule.elapse(dt)?;
        self.time_now += dt;
        Ok(())
    }

    /// Add the distance each partner flew since its previous collision,
    /// using the pre-collision velocities.
    fn track_free_paths(&mut self, i: usize, j: usize) {
        for k in [i, j] {
            let flight = self.time_now - self.last_collision[k];
            self.free_path_sum += self.particles[k].speed_squared().sqrt() * flight;
            self.last_collision[k] = self.time_now;
        }
    }

    /// Resolve an elastic equal-mass collision between disks i and j and
    /// return the virial contribution (impulse . separation).
    ///
    /// The prediction table is not touched; `step` repairs it afterwards,
    /// direct callers must `rebuild_schedule`.
    pub fn resolve_p2p(&mut self, i: usize, j: usize) -> Result<f64> {
        self.check_index(i)?;
        self.check_index(j)?;
        if i == j {
            return Err(Error::InvalidParam(format!("disk {i} cannot collide with itself")));
        }
        let d = self.bx.separation(self.particles[i].r, self.particles[j].r);
        let dist = dot(&d, &d).sqrt();
        if dist <= EPS_TIME {
            return Err(Error::MathError(format!(
                "degenerate contact normal between disks {i} and {j}"
            )));
        }
        let n = [d[0] / dist, d[1] / dist];

        let mut u = [0.0_f64; DIM];
        for ((uk, &vi), &vj) in u
            .iter_mut()
            .zip(self.particles[i].v.iter())
            .zip(self.particles[j].v.iter())
        {
            *uk = vi - vj;
        }
        let factor = dot(&u, &n);

        // Only the normal component of the relative velocity is exchanged
        for (k, &nk) in n.iter().enumerate() {
            self.particles[i].v[k] -= factor * nk;
            self.particles[j].v[k] += factor * nk;
        }
        Ok(-factor * dist)
    }
}

fn check_overlaps(particles: &[Particle], bx: &PeriodicBox) -> Result<()> {
    let min = SIGMA - EPS_OVERLAP;
    for (i, a) in particles.iter().enumerate() {
        for (j, b) in particles.iter().enumerate().skip(i + 1) {
            let distance = bx.distance(a.r, b.r);
            if distance < min {
                return Err(Error::Overlap { i, j, distance });
            }
        }
    }
    Ok(())
}
