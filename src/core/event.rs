use crate::error::{Error, Result};
use ordered_float::NotNan;

/// One row of the prediction table: the earliest contact currently
/// predicted for a particle, measured from "now".
///
/// - `time`: time until contact (finite, non-NaN, >= 0).
/// - `partner`: index of the other disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub time: NotNan<f64>,
    pub partner: usize,
}

impl Prediction {
    /// Create a new prediction, validating that time is finite and non-NaN.
    pub fn new(time: f64, partner: usize) -> Result<Self> {
        if !time.is_finite() {
            return Err(Error::MathError(format!(
                "contact time with disk {partner} must be finite (got {time})"
            )));
        }
        let time = NotNan::new(time)
            .map_err(|_| Error::MathError("contact time cannot be NaN".into()))?;
        Ok(Self { time, partner })
    }

    /// Returns the raw f64 time to contact.
    #[inline]
    pub fn time_f64(&self) -> f64 {
        self.time.into_inner()
    }

    /// The same prediction after `dt` of free flight. Round-off can push the
    /// event that was just consumed slightly below zero; that is clamped.
    pub fn elapsed(self, dt: f64) -> Result<Self> {
        Self::new((self.time_f64() - dt).max(0.0), self.partner)
    }
}

/// What one call to `Simulation::step` did.
///
/// `dt` is the free-flight time consumed before the collision, `time` the
/// absolute clock afterwards, `virial` the pair's contribution to
/// sum(impulse . separation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRecord {
    pub time: f64,
    pub dt: f64,
    pub i: usize,
    pub j: usize,
    pub virial: f64,
}
