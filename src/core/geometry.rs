use crate::core::particle::{DIM, SIGMA};
use crate::error::{Error, Result};

/// Rectangular periodic box [0, Lx) x [0, Ly).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    pub lx: f64,
    pub ly: f64,
}

impl PeriodicBox {
    /// Both edges must be finite and at least 2σ so that a single periodic
    /// image of each neighbour can be in contact at a time.
    pub fn new(lx: f64, ly: f64) -> Result<Self> {
        for (name, l) in [("lx", lx), ("ly", ly)] {
            if !l.is_finite() || l < 2.0 * SIGMA {
                return Err(Error::InvalidParam(format!(
                    "{name} must be finite and >= {} (got {l})",
                    2.0 * SIGMA
                )));
            }
        }
        Ok(Self { lx, ly })
    }

    #[inline]
    pub fn lengths(&self) -> [f64; DIM] {
        [self.lx, self.ly]
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.lx * self.ly
    }

    /// Fold a position back into the box.
    #[inline]
    pub fn wrap(&self, r: [f64; DIM]) -> [f64; DIM] {
        [wrap(r[0], self.lx), wrap(r[1], self.ly)]
    }

    /// Minimum-image displacement a - b.
    #[inline]
    pub fn separation(&self, a: [f64; DIM], b: [f64; DIM]) -> [f64; DIM] {
        [
            separation(a[0] - b[0], self.lx),
            separation(a[1] - b[1], self.ly),
        ]
    }

    #[inline]
    pub fn distance(&self, a: [f64; DIM], b: [f64; DIM]) -> f64 {
        let d = self.separation(a, b);
        dot(&d, &d).sqrt()
    }
}

/// Periodic reduction of a coordinate into [0, l).
#[inline]
pub fn wrap(s: f64, l: f64) -> f64 {
    let r = s.rem_euclid(l);
    // rem_euclid rounds tiny negatives up to exactly l
    if r >= l {
        0.0
    } else {
        r
    }
}

/// Minimum-image reduction of a 1D separation into [-l/2, l/2].
#[inline]
pub fn separation(ds: f64, l: f64) -> f64 {
    ds - l * (ds / l).round()
}

#[inline]
pub fn dot(a: &[f64; DIM], b: &[f64; DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn sub(a: &[f64; DIM], b: &[f64; DIM]) -> [f64; DIM] {
    [a[0] - b[0], a[1] - b[1]]
}
