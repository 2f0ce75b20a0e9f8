//! Per-particle collision prediction table.
//!
//! Row `i` holds the earliest contact predicted between `i` and any
//! higher-indexed disk (the uplist), possibly lowered later by a
//! lower-indexed row's partner changing (the downlist). Every unordered
//! pair is therefore owned by the row of its smaller index. The last row
//! has no higher neighbours and stays empty.

use crate::core::event::Prediction;
use crate::core::geometry::PeriodicBox;
use crate::core::particle::Particle;
use crate::core::predict::time_to_contact;
use crate::error::{Error, Result};
use log::debug;

#[derive(Debug, Clone)]
pub struct Schedule {
    rows: Vec<Option<Prediction>>,
}

impl Schedule {
    /// Populate every row once (O(N^2)).
    pub fn build(particles: &[Particle], bx: &PeriodicBox) -> Result<Self> {
        if particles.len() < 2 {
            return Err(Error::InvalidParam(format!(
                "event scheduling needs at least 2 particles (got {})",
                particles.len()
            )));
        }
        let mut schedule = Self {
            rows: vec![None; particles.len()],
        };
        for i in 0..particles.len() {
            schedule.rebuild_from(i, particles, bx)?;
        }
        debug!(
            "built prediction table for {} disks ({} rows with a partner)",
            particles.len(),
            schedule.rows.iter().filter(|r| r.is_some()).count()
        );
        Ok(schedule)
    }

    /// Read-only view of the table.
    pub fn rows(&self) -> &[Option<Prediction>] {
        &self.rows
    }

    pub fn get(&self, i: usize) -> Option<Prediction> {
        self.rows.get(i).copied().flatten()
    }

    /// Recompute row `i` from scratch against every `j > i`.
    pub fn rebuild_from(
        &mut self,
        i: usize,
        particles: &[Particle],
        bx: &PeriodicBox,
    ) -> Result<()> {
        self.check_row(i, particles)?;
        self.rows[i] = None;
        for j in (i + 1)..particles.len() {
            self.offer(i, j, particles, bx)?;
        }
        Ok(())
    }

    /// Let every row `i < j` consider `j` as a candidate partner.
    pub fn backfill_into(
        &mut self,
        j: usize,
        particles: &[Particle],
        bx: &PeriodicBox,
    ) -> Result<()> {
        self.check_row(j, particles)?;
        for i in 0..j {
            self.offer(i, j, particles, bx)?;
        }
        Ok(())
    }

    /// Repair the table after `i` and `j` collided.
    ///
    /// Rows belonging to `i` or `j`, and rows whose partner is `i` or `j`,
    /// are stale and rebuilt; then `i` and `j` are offered to every lower row.
    pub fn invalidate_around(
        &mut self,
        i: usize,
        j: usize,
        particles: &[Particle],
        bx: &PeriodicBox,
    ) -> Result<()> {
        for k in 0..self.rows.len() {
            let stale = k == i
                || k == j
                || self.rows[k].is_some_and(|p| p.partner == i || p.partner == j);
            if stale {
                self.rebuild_from(k, particles, bx)?;
            }
        }
        self.backfill_into(i, particles, bx)?;
        self.backfill_into(j, particles, bx)?;
        Ok(())
    }

    /// Earliest predicted event as `(dt, i, partner)`. Equal times resolve
    /// to the lowest row index.
    pub fn next_event(&self) -> Option<(f64, usize, usize)> {
        let mut best: Option<(usize, Prediction)> = None;
        for (k, row) in self.rows.iter().enumerate() {
            if let Some(p) = row {
                if best.is_none_or(|(_, b)| p.time < b.time) {
                    best = Some((k, *p));
                }
            }
        }
        best.map(|(k, p)| (p.time_f64(), k, p.partner))
    }

    /// Shift every prediction by `dt` of elapsed free flight.
    pub fn elapse(&mut self, dt: f64) -> Result<()> {
        for p in self.rows.iter_mut().flatten() {
            *p = p.elapsed(dt)?;
        }
        Ok(())
    }

    /// Lower row `i` to the `i`-`j` contact if it is strictly earlier.
    fn offer(
        &mut self,
        i: usize,
        j: usize,
        particles: &[Particle],
        bx: &PeriodicBox,
    ) -> Result<()> {
        if let Some(t) = time_to_contact(&particles[i], &particles[j], bx)? {
            if self.rows[i].is_none_or(|p| t < p.time_f64()) {
                self.rows[i] = Some(Prediction::new(t, j)?);
            }
        }
        Ok(())
    }

    fn check_row(&self, i: usize, particles: &[Particle]) -> Result<()> {
        if particles.len() != self.rows.len() {
            return Err(Error::InvalidParam(format!(
                "table has {} rows but {} particles were given",
                self.rows.len(),
                particles.len()
            )));
        }
        if i >= self.rows.len() {
            return Err(Error::InvalidParam(format!(
                "row {i} out of range 0..{}",
                self.rows.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disks(layout: &[([f64; 2], [f64; 2])]) -> Vec<Particle> {
        layout
            .iter()
            .enumerate()
            .map(|(k, (r, v))| Particle::new(k as u32, *r, *v).unwrap())
            .collect()
    }

    #[test]
    fn build_requires_two_particles() -> Result<()> {
        let bx = PeriodicBox::new(10.0, 10.0)?;
        let one = disks(&[([1.0, 1.0], [1.0, 0.0])]);
        assert!(Schedule::build(&one, &bx).is_err());
        Ok(())
    }

    #[test]
    fn last_row_stays_empty() -> Result<()> {
        let bx = PeriodicBox::new(10.0, 10.0)?;
        let ps = disks(&[([2.0, 5.0], [1.0, 0.0]), ([8.0, 5.0], [-1.0, 0.0])]);
        let s = Schedule::build(&ps, &bx)?;
        assert!(s.get(1).is_none());
        let p = s.get(0).expect("row 0 predicts the head-on hit");
        assert_eq!(p.partner, 1);
        assert!((p.time_f64() - 2.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn rebuild_is_idempotent() -> Result<()> {
        let bx = PeriodicBox::new(12.0, 12.0)?;
        let ps = disks(&[
            ([1.0, 1.0], [0.4, 0.9]),
            ([4.0, 2.0], [-0.3, 0.2]),
            ([7.0, 6.0], [0.8, -0.5]),
            ([3.0, 9.0], [-0.6, -0.1]),
        ]);
        let mut s = Schedule::build(&ps, &bx)?;
        for i in 0..ps.len() {
            s.rebuild_from(i, &ps, &bx)?;
            let first = s.get(i);
            s.rebuild_from(i, &ps, &bx)?;
            assert_eq!(first, s.get(i));
        }
        Ok(())
    }

    #[test]
    fn next_event_breaks_ties_by_lowest_row() -> Result<()> {
        let bx = PeriodicBox::new(30.0, 30.0)?;
        // two identical head-on pairs far apart: rows 0 and 2 tie
        let ps = disks(&[
            ([2.0, 5.0], [1.0, 0.0]),
            ([8.0, 5.0], [-1.0, 0.0]),
            ([2.0, 20.0], [1.0, 0.0]),
            ([8.0, 20.0], [-1.0, 0.0]),
        ]);
        let s = Schedule::build(&ps, &bx)?;
        let (dt, i, j) = s.next_event().expect("event");
        assert!((dt - 2.5).abs() < 1e-12);
        assert_eq!((i, j), (0, 1));
        Ok(())
    }

    #[test]
    fn backfill_lowers_earlier_rows() -> Result<()> {
        let bx = PeriodicBox::new(20.0, 20.0)?;
        let mut ps = disks(&[
            ([2.0, 5.0], [0.0, 0.0]),
            ([10.0, 15.0], [0.0, 0.0]),
            ([6.0, 5.0], [0.0, 0.0]),
        ]);
        let mut s = Schedule::build(&ps, &bx)?;
        assert!(s.next_event().is_none());
        // disk 2 starts moving towards disk 0
        ps[2].v = [-1.0, 0.0];
        s.rebuild_from(2, &ps, &bx)?;
        assert!(s.get(0).is_none());
        s.backfill_into(2, &ps, &bx)?;
        let p = s.get(0).expect("row 0 now sees disk 2");
        assert_eq!(p.partner, 2);
        assert!((p.time_f64() - 3.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn elapse_shifts_all_rows() -> Result<()> {
        let bx = PeriodicBox::new(10.0, 10.0)?;
        let ps = disks(&[([2.0, 5.0], [1.0, 0.0]), ([8.0, 5.0], [-1.0, 0.0])]);
        let mut s = Schedule::build(&ps, &bx)?;
        s.elapse(1.0)?;
        let (dt, _, _) = s.next_event().expect("event");
        assert!((dt - 1.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn out_of_range_rows_are_rejected() -> Result<()> {
        let bx = PeriodicBox::new(10.0, 10.0)?;
        let ps = disks(&[([2.0, 5.0], [1.0, 0.0]), ([8.0, 5.0], [-1.0, 0.0])]);
        let mut s = Schedule::build(&ps, &bx)?;
        assert!(matches!(s.rebuild_from(2, &ps, &bx), Err(Error::InvalidParam(_))));
        assert!(matches!(s.backfill_into(5, &ps, &bx), Err(Error::InvalidParam(_))));
        assert!(matches!(s.rebuild_from(0, &ps[..1], &bx), Err(Error::InvalidParam(_))));
        assert_eq!(s.get(0).map(|p| p.partner), Some(1));
        Ok(())
    }
}
