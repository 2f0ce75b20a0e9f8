//! Run parameters for a hard-disk simulation.

use crate::core::init::{thermal_velocities, InitialConfiguration};
use crate::core::{PeriodicBox, Simulation};
use crate::error::{Error, Result};
use log::info;
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters for building and driving a simulation.
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Number of disks.
    #[serde(alias = "N")]
    pub n: usize,
    /// Box width.
    #[serde(alias = "Lx")]
    pub lx: f64,
    /// Box height; `Lx * sqrt(3) / 2` when absent, which fits a triangular lattice.
    #[serde(alias = "Ly")]
    pub ly: Option<f64>,
    /// Kinetic energy per disk of the initial velocities.
    #[serde(alias = "targetTemperature")]
    pub target_temperature: f64,
    /// RNG seed; drawn from entropy when absent.
    pub seed: Option<u64>,
    /// MSD tracking horizon; `2 Lx / T` when absent.
    #[serde(alias = "msdWindow")]
    pub msd_window: Option<f64>,
    pub msd_bins: usize,
    pub initial: InitialConfiguration,
    /// Random-fluid placement tries per disk.
    pub placement_attempts: usize,

    /// Collisions to run in the batch driver.
    pub events: usize,
    /// Collisions between progress reports.
    pub report_every: usize,

    pub velocity_bin_width: f64,
    pub velocity_max: f64,
    pub collision_time_bin_width: f64,
    pub collision_time_bins: usize,
    pub rdf_bin_width: f64,
    /// Sample g(r) every this many collisions.
    pub rdf_every: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            n: 64,
            lx: 20.0,
            ly: None,
            target_temperature: 1.0,
            seed: None,
            msd_window: None,
            msd_bins: 20,
            initial: InitialConfiguration::Hexagonal,
            placement_attempts: 20,
            events: 1000,
            report_every: 100,
            velocity_bin_width: 0.1,
            velocity_max: 5.0,
            collision_time_bin_width: 0.01,
            collision_time_bins: 100,
            rdf_bin_width: 0.1,
            rdf_every: 1,
        }
    }
}

impl SimConfig {
    /// Load a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        info!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn box_height(&self) -> f64 {
        self.ly.unwrap_or(self.lx * 3f64.sqrt() / 2.0)
    }

    pub fn msd_window(&self) -> f64 {
        self.msd_window
            .unwrap_or(2.0 * self.lx / self.target_temperature)
    }

    pub fn density(&self) -> f64 {
        self.n as f64 / (self.lx * self.box_height())
    }

    pub fn validate(&self) -> Result<()> {
        if self.n < 2 {
            return Err(Error::InvalidParam(format!(
                "n must be >= 2 (got {})",
                self.n
            )));
        }
        PeriodicBox::new(self.lx, self.box_height())?;
        if !self.target_temperature.is_finite() || self.target_temperature <= 0.0 {
            return Err(Error::InvalidParam(
                "target_temperature must be finite and > 0".into(),
            ));
        }
        let window = self.msd_window();
        if !window.is_finite() || window <= 0.0 {
            return Err(Error::InvalidParam("msd_window must be finite and > 0".into()));
        }
        for (name, value) in [
            ("msd_bins", self.msd_bins),
            ("placement_attempts", self.placement_attempts),
            ("report_every", self.report_every),
            ("collision_time_bins", self.collision_time_bins),
            ("rdf_every", self.rdf_every),
        ] {
            if value == 0 {
                return Err(Error::InvalidParam(format!("{name} must be > 0")));
            }
        }
        for (name, value) in [
            ("velocity_bin_width", self.velocity_bin_width),
            ("velocity_max", self.velocity_max),
            ("collision_time_bin_width", self.collision_time_bin_width),
            ("rdf_bin_width", self.rdf_bin_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParam(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        Ok(())
    }

    /// Generate the initial state and build the engine.
    pub fn build(&self) -> Result<Simulation> {
        self.validate()?;
        let mut rng: StdRng = match self.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };
        let bx = PeriodicBox::new(self.lx, self.box_height())?;
        let positions =
            self.initial
                .positions(self.n, &bx, self.placement_attempts, &mut rng)?;
        let velocities = thermal_velocities(self.n, self.target_temperature, &mut rng)?;
        info!(
            "generated {:?} start: N = {}, {} x {:.4}, density {:.4}",
            self.initial,
            self.n,
            bx.lx,
            bx.ly,
            self.density()
        );
        Simulation::new(
            &positions,
            &velocities,
            bx.lx,
            bx.ly,
            Some(self.msd_window()),
            self.msd_bins,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() -> Result<()> {
        let c: SimConfig = serde_json::from_str("{}")?;
        assert_eq!(c, SimConfig::default());
        assert!((c.box_height() - 20.0 * 3f64.sqrt() / 2.0).abs() < 1e-12);
        assert!((c.msd_window() - 40.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn accepts_camel_case_aliases() -> Result<()> {
        let c: SimConfig = serde_json::from_str(
            r#"{"N": 16, "Lx": 12.0, "Ly": 10.0, "targetTemperature": 2.0,
                "seed": 7, "msdWindow": 6.0, "initial": "fluid"}"#,
        )?;
        assert_eq!(c.n, 16);
        assert_eq!(c.box_height(), 10.0);
        assert_eq!(c.target_temperature, 2.0);
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.msd_window(), 6.0);
        assert_eq!(c.initial, InitialConfiguration::Fluid);
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<SimConfig>(r#"{"temprature": 1.0}"#);
        assert!(err.is_err());
    }

    #[test]
    fn validate_catches_bad_values() {
        let c = SimConfig {
            n: 1,
            ..SimConfig::default()
        };
        assert!(c.validate().is_err());
        let c = SimConfig {
            lx: 1.0,
            ..SimConfig::default()
        };
        assert!(c.validate().is_err());
        let c = SimConfig {
            msd_bins: 0,
            ..SimConfig::default()
        };
        assert!(c.validate().is_err());
        let c = SimConfig {
            target_temperature: -1.0,
            ..SimConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn build_is_reproducible_with_seed() -> Result<()> {
        let c = SimConfig {
            seed: Some(2024),
            ..SimConfig::default()
        };
        let a = c.build()?;
        let b = c.build()?;
        assert_eq!(a.velocities(), b.velocities());
        assert_eq!(a.num_particles(), 64);
        Ok(())
    }
}
