//! Event-driven molecular dynamics of hard disks in a periodic box.
//!
//! The engine (`core::Simulation`) jumps from collision to collision using a
//! per-particle prediction table; `stats::Observables` turns the resulting
//! event stream into temperature, pressure, mean free path, diffusion
//! constants and distribution histograms. `config::SimConfig` builds a
//! ready-to-run system from a handful of parameters.

pub mod config;
pub mod core;
pub mod error;
pub mod stats;

#[cfg(feature = "python")]
mod python;

pub use crate::config::SimConfig;
pub use crate::core::{EventRecord, MsdSample, Simulation};
pub use crate::error::{Error, Result};
pub use crate::stats::{Observables, Report};
