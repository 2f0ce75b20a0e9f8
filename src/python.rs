use numpy::ndarray::{Array1, Array2};
use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::SimConfig;
use crate::core::init::InitialConfiguration;
use crate::core::particle::DIM;
use crate::core::Simulation;
use crate::stats::Observables;

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_array2(rows: &[[f64; DIM]]) -> Array2<f64> {
    let mut arr = Array2::<f64>::zeros((rows.len(), DIM));
    for (i, row) in rows.iter().enumerate() {
        for k in 0..DIM {
            arr[[i, k]] = row[k];
        }
    }
    arr
}

fn from_array2(arr: PyReadonlyArray2<'_, f64>, n: usize) -> PyResult<Vec<[f64; DIM]>> {
    let arr = arr.as_array();
    if arr.shape() != &[n, DIM] {
        return Err(py_err(format!(
            "expected shape ({n}, {DIM}), got {:?}",
            arr.shape()
        )));
    }
    Ok(arr.outer_iter().map(|row| [row[0], row[1]]).collect())
}

/// Python-facing wrapper around the hard-disk engine and its statistics.
#[pyclass]
pub struct HardDisks {
    sim: Simulation,
    observables: Observables,
}

#[pymethods]
impl HardDisks {
    /// Build a hard-disk fluid.
    ///
    /// Parameters
    /// - n: number of disks (>= 2)
    /// - lx: box width; ly defaults to lx * sqrt(3) / 2
    /// - temperature: kinetic energy per disk
    /// - seed: RNG seed (None for nondeterministic)
    /// - initial: "fluid", "rectangular" or "hexagonal"
    #[new]
    #[pyo3(signature = (n, lx, ly=None, temperature=1.0, seed=None, initial="hexagonal"))]
    fn new(
        n: usize,
        lx: f64,
        ly: Option<f64>,
        temperature: f64,
        seed: Option<u64>,
        initial: &str,
    ) -> PyResult<Self> {
        let initial = InitialConfiguration::from_str(initial)
            .ok_or_else(|| py_err(format!("unknown initial configuration '{initial}'")))?;
        let config = SimConfig {
            n,
            lx,
            ly,
            target_temperature: temperature,
            seed,
            initial,
            ..SimConfig::default()
        };
        let sim = config.build().map_err(py_err)?;
        let observables = Observables::new(&config, &sim).map_err(py_err)?;
        Ok(Self { sim, observables })
    }

    /// Run `events` collisions (releases the GIL during computation).
    fn step(&mut self, py: Python<'_>, events: usize) -> PyResult<()> {
        let Self { sim, observables } = self;
        py.detach(|| observables.run(sim, events)).map_err(py_err)
    }

    /// Advance to the given absolute time without collecting statistics.
    fn advance_to(&mut self, py: Python<'_>, target_time: f64) -> PyResult<()> {
        py.detach(|| self.sim.advance_to(target_time))
            .map_err(py_err)
    }

    fn time(&self) -> f64 {
        self.sim.time()
    }

    /// Positions as a NumPy array of shape (N, 2).
    fn get_positions<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        Ok(to_array2(&self.sim.positions()).into_pyarray(py).to_owned().into())
    }

    /// Velocities as a NumPy array of shape (N, 2).
    fn get_velocities<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        Ok(to_array2(&self.sim.velocities()).into_pyarray(py).to_owned().into())
    }

    fn set_positions<'py>(&mut self, positions: PyReadonlyArray2<'py, f64>) -> PyResult<()> {
        let rows = from_array2(positions, self.sim.num_particles())?;
        self.sim.set_positions(&rows).map_err(py_err)
    }

    fn set_velocities<'py>(&mut self, velocities: PyReadonlyArray2<'py, f64>) -> PyResult<()> {
        let rows = from_array2(velocities, self.sim.num_particles())?;
        self.sim.set_velocities(&rows).map_err(py_err)
    }

    /// Returns (times, <dx^2>, <dy^2>) as NumPy arrays.
    #[allow(clippy::type_complexity)]
    fn get_msd<'py>(
        &self,
        py: Python<'py>,
    ) -> (Py<PyArray1<f64>>, Py<PyArray1<f64>>, Py<PyArray1<f64>>) {
        let s = self.sim.msd_sample();
        (
            Array1::from(s.times).into_pyarray(py).to_owned().into(),
            Array1::from(s.dx2).into_pyarray(py).to_owned().into(),
            Array1::from(s.dy2).into_pyarray(py).to_owned().into(),
        )
    }

    fn mean_free_path(&self) -> Option<f64> {
        self.sim.mean_free_path()
    }

    fn kinetic_energy(&self) -> f64 {
        self.sim.kinetic_energy()
    }

    /// Summary statistics as a dict; starts a new recent-pressure window.
    fn report<'py>(&mut self, py: Python<'py>) -> PyResult<Py<PyDict>> {
        let r = self.observables.report(&self.sim);
        let out = PyDict::new(py);
        out.set_item("time", r.time)?;
        out.set_item("collisions", r.collisions)?;
        out.set_item("density", r.density)?;
        out.set_item("temperature", r.temperature)?;
        out.set_item("mean_temperature", r.mean_temperature)?;
        out.set_item("pressure", r.pressure)?;
        out.set_item("recent_pressure", r.recent_pressure)?;
        out.set_item("heat_capacity", r.heat_capacity)?;
        out.set_item("mean_collision_time", r.mean_collision_time)?;
        out.set_item("mean_free_path", r.mean_free_path)?;
        out.set_item("diffusion_x", r.diffusion_x)?;
        out.set_item("diffusion_y", r.diffusion_y)?;
        Ok(out.into())
    }

    /// Zero all accumulated statistics.
    fn reset(&mut self) {
        self.observables.reset(&mut self.sim);
    }
}

/// The hdsim Python module entry point.
#[pymodule]
fn hdsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<HardDisks>()?;
    Ok(())
}
