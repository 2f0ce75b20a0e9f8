use crate::error::{Error, Result};

/// Fixed spatial dimension (2D disks).
pub const DIM: usize = 2;

/// Contact distance between two disk centres (sum of radii, unit diameter).
pub const SIGMA: f64 = 1.0;

/// A hard disk of unit diameter and unit mass.
///
/// Fields:
/// - `id`: stable identifier, equal to the index in the particle array
/// - `r`: position [x, y], kept inside the periodic box
/// - `v`: velocity [vx, vy]
/// - `collision_count`: incremented each time the disk takes part in a collision
#[derive(Debug, Clone)]
pub struct Particle {
    /// Stable particle identifier.
    pub id: u32,
    /// Position (x, y).
    pub r: [f64; DIM],
    /// Velocity (vx, vy).
    pub v: [f64; DIM],
    /// Collision participation counter.
    pub collision_count: u64,
}

impl Particle {
    /// Create a new disk after validating that every component is finite.
    pub fn new(id: u32, r: [f64; DIM], v: [f64; DIM]) -> Result<Self> {
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam(format!(
                "position of disk {id} must be finite"
            )));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam(format!(
                "velocity of disk {id} must be finite"
            )));
        }
        Ok(Self {
            id,
            r,
            v,
            collision_count: 0,
        })
    }

    #[inline]
    pub fn bump_collision_count(&mut self) {
        self.collision_count = self.collision_count.saturating_add(1);
    }

    /// Kinetic energy 1/2 |v|^2 (unit mass).
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.speed_squared()
    }

    #[inline]
    pub fn speed_squared(&self) -> f64 {
        self.v.iter().map(|&c| c * c).sum()
    }

    /// Set position (validated as finite).
    pub fn set_position(&mut self, r: [f64; DIM]) -> Result<()> {
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        self.r = r;
        Ok(())
    }

    /// Set velocity (validated as finite).
    pub fn set_velocity(&mut self, v: [f64; DIM]) -> Result<()> {
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        self.v = v;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_particle_ok() -> Result<()> {
        let p = Particle::new(1, [0.5, 1.0], [2.0, -3.0])?;
        assert_eq!(p.id, 1);
        assert_eq!(p.r, [0.5, 1.0]);
        assert_eq!(p.v, [2.0, -3.0]);
        assert_eq!(p.collision_count, 0);
        Ok(())
    }

    #[test]
    fn non_finite_velocity_rejected() {
        let err = Particle::new(3, [0.0, 0.0], [f64::NAN, 0.0]).unwrap_err();
        assert!(err.to_string().contains("velocity of disk 3"));
    }

    #[test]
    fn kinetic_energy_computed() -> Result<()> {
        // v = (3,4), |v|^2 = 25
        let p = Particle::new(7, [0.0, 0.0], [3.0, 4.0])?;
        assert!((p.kinetic_energy() - 12.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn bump_collision_count() -> Result<()> {
        let mut p = Particle::new(1, [0.0, 0.0], [0.0, 0.0])?;
        p.bump_collision_count();
        p.bump_collision_count();
        assert_eq!(p.collision_count, 2);
        Ok(())
    }
}
