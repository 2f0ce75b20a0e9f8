//! Batch driver: `hdsim [config.json]`.
//!
//! Runs the configured number of collisions, logging a progress line every
//! `report_every` events (set `RUST_LOG=info` to see them), and prints the
//! final report as JSON.

use hdsim::{Observables, Result, SimConfig};
use log::{error, info};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("hdsim: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    config.validate()?;

    let mut sim = config.build()?;
    let mut observables = Observables::new(&config, &sim)?;

    let mut done = 0usize;
    let mut last = None;
    while done < config.events {
        let chunk = config.report_every.min(config.events - done);
        observables.run(&mut sim, chunk)?;
        done += chunk;
        let r = observables.report(&sim);
        info!(
            "{done}/{} collisions  t = {:.4}  T = {:.4}  PA/NkT = {}  mfp = {}",
            config.events,
            r.time,
            r.temperature,
            fmt_opt(r.recent_pressure),
            fmt_opt(r.mean_free_path),
        );
        last = Some(r);
    }

    let report = last.unwrap_or_else(|| observables.report(&sim));
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.4}"))
}
