//! Event-driven hard-disk molecular dynamics.
//!
//! Disks of unit diameter and mass fly ballistically in a periodic box
//! until the earliest predicted contact, where the pair exchanges the
//! normal component of its relative velocity.

pub mod event;
pub mod geometry;
pub mod init;
pub mod msd;
pub mod particle;
pub mod predict;
pub mod schedule;
pub mod sim;

pub use event::{EventRecord, Prediction};
pub use geometry::PeriodicBox;
pub use init::InitialConfiguration;
pub use msd::MsdSample;
pub use particle::Particle;
pub use schedule::Schedule;
pub use sim::Simulation;
