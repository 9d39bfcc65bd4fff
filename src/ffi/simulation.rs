//! PyO3 wrapper for the simulation engine.
//!
//! The external RL agent drives episodes through this class: it schedules
//! OD matrices and suspend points, calls `run` until the next yield, and
//! reads the report dict as its reward signal.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::orchestrator::{Report, RunState, Simulation, SimulationError};
use crate::models::event::Event;
use crate::config::SimulationConfig;

/// Python wrapper around one simulation instance.
///
/// # Example (from Python)
///
/// ```python
/// from transit_simulator_core_rs import Simulation
///
/// sim = Simulation("data/", config_json='{"start_time": 18000.0, ...}')
/// sim.add_od_matrix(18000.0, od_rows)
/// sim.schedule_suspend(21600.0)
/// report = sim.run()
/// print(report["total_delay"], report["is_finished"])
/// ```
#[pyclass(name = "Simulation")]
pub struct PySimulation {
    inner: Simulation,
}

/// Map engine errors onto Python exception types: bad inputs become
/// `ValueError`, episode-aborting invariant violations `RuntimeError`.
fn to_py_err(err: SimulationError) -> PyErr {
    match err {
        SimulationError::InvalidConfig(_)
        | SimulationError::Load(_)
        | SimulationError::OdShape { .. }
        | SimulationError::UnknownStation { .. }
        | SimulationError::EventInPast { .. }
        | SimulationError::InjectionBeforeServiceStart { .. } => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn report_to_py<'py>(py: Python<'py>, report: &Report) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("is_finished", report.is_finished)?;
    dict.set_item("total_travel_time", report.total_travel_time)?;
    dict.set_item("total_delay", report.total_delay)?;
    dict.set_item("num_departed", report.num_departed)?;
    dict.set_item("num_arrived", report.num_arrived)?;
    Ok(dict)
}

#[pymethods]
impl PySimulation {
    /// Load the static tables from `data_dir` and build a simulation.
    ///
    /// `config_json`, when given, is a JSON object deserialized into the
    /// engine configuration; omitted fields fall back to the defaults.
    #[new]
    #[pyo3(signature = (data_dir, config_json = None))]
    fn new(data_dir: &str, config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => serde_json::from_str::<SimulationConfig>(json)
                .map_err(|e| PyValueError::new_err(format!("invalid config JSON: {e}")))?,
            None => SimulationConfig::default(),
        };
        let inner = Simulation::from_data_dir(data_dir, config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Reset to the start-of-episode state (the RNG keeps its stream; use
    /// `reseed` for reproducible episodes).
    fn reset(&mut self) {
        self.inner.reset();
    }

    /// Reseed the simulation-owned RNG.
    fn reseed(&mut self, seed: u64) {
        self.inner.reseed(seed);
    }

    /// Advance until the next suspend point, the horizon, or an empty
    /// event queue; returns the report dict.
    fn run<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let report = self.inner.run().map_err(to_py_err)?;
        report_to_py(py, &report)
    }

    /// Current report snapshot without advancing the clock.
    fn report<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        report_to_py(py, &self.inner.report())
    }

    /// Inject passengers at the current simulation time.
    #[pyo3(signature = (from_station, to_station, num))]
    fn add_passengers(&mut self, from_station: usize, to_station: usize, num: u32) -> PyResult<()> {
        self.inner
            .add_passengers(from_station, to_station, num)
            .map_err(to_py_err)
    }

    /// Schedule a full origin×destination matrix injection at `time`.
    fn add_od_matrix(&mut self, time: f64, matrix: Vec<Vec<u32>>) -> PyResult<()> {
        self.inner
            .add_event(time, Event::NewOd { matrix })
            .map_err(to_py_err)
    }

    /// Schedule a suspend (yield) point at `time`.
    fn schedule_suspend(&mut self, time: f64) -> PyResult<()> {
        self.inner.add_event(time, Event::Suspend).map_err(to_py_err)
    }

    /// Current simulation time in seconds since midnight.
    fn get_time(&self) -> f64 {
        self.inner.get_time()
    }

    /// Wait integral accumulated at one station/direction.
    fn get_station_delay(&self, station: usize, direction: usize) -> PyResult<f64> {
        self.inner
            .get_station_delay(station, direction)
            .ok_or_else(|| PyValueError::new_err("unknown station or direction"))
    }

    /// Passengers ever enqueued at one station/direction.
    fn get_station_pass(&self, station: usize, direction: usize) -> PyResult<u64> {
        self.inner
            .get_station_pass(station, direction)
            .ok_or_else(|| PyValueError::new_err("unknown station or direction"))
    }

    /// Passengers currently waiting at one station/direction.
    fn get_station_waiting_passengers(&self, station: usize, direction: usize) -> PyResult<u32> {
        self.inner
            .get_station_waiting_passengers(station, direction)
            .ok_or_else(|| PyValueError::new_err("unknown station or direction"))
    }

    /// Loop state as a short string: "idle", "running", "suspended",
    /// "finished".
    fn run_state(&self) -> &'static str {
        match self.inner.run_state() {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Suspended => "suspended",
            RunState::Finished => "finished",
        }
    }
}
