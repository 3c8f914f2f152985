// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the flux-driven Hasegawa-Wakatani
//! kernel, for driving it from a Python adaptive integrator.
//!
//! # FFI Safety
//!
//! - `rhs` releases the GIL while evaluating; the evaluator is immutable.
//! - Configuration and layout errors → `ValueError`; non-finite
//!   derivatives → `ArithmeticError`.
//! - All config validated before storage (`SimulationConfig::validate()`).
//!
//! Install: `pip install -e crates/fdhw-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from fdhw_kernel import FdhwConfig, RustRhsEvaluator, RustDiagnostics
//!
//! cfg = FdhwConfig(npx=256, npy=256)
//! ev = RustRhsEvaluator(cfg)
//! y0 = ev.initial_state()
//! dydt = ev.rhs(0.0, y0)
//! ```

use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex64;
use pyo3::exceptions::{PyArithmeticError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use fdhw_diagnostics::{
    DiagnosticKind, Diagnostics, DiagnosticsRecorder, FieldSnapshot, ReducedSnapshot, Schedule,
};
use fdhw_physics::RhsEvaluator;
use fdhw_types::{
    EnergyRecord, FdhwError, FluxRecord, ProfileRecord, ProgressRecord, SimulationConfig,
};

fn to_py_err(e: FdhwError) -> PyErr {
    match &e {
        FdhwError::NumericalInstability { .. } => PyArithmeticError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn rows(a: &Array2<Complex64>) -> Vec<Vec<Complex64>> {
    a.outer_iter().map(|r| r.to_vec()).collect()
}

// ─── Record → dict ──────────────────────────────────────────────────

fn energy_dict<'py>(py: Python<'py>, r: &EnergyRecord) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("t", r.t)?;
    dict.set_item("K", r.k)?;
    dict.set_item("W", r.w)?;
    dict.set_item("N", r.n)?;
    Ok(dict)
}

fn flux_dict<'py>(py: Python<'py>, r: &FluxRecord) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("t", r.t)?;
    dict.set_item("Gam", r.gam.clone())?;
    dict.set_item("Pi", r.pi.clone())?;
    dict.set_item("R", r.r.clone())?;
    Ok(dict)
}

fn profile_dict<'py>(py: Python<'py>, r: &ProfileRecord) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("t", r.t)?;
    dict.set_item("ur", r.u_r.clone())?;
    dict.set_item("nr", r.n_r.clone())?;
    Ok(dict)
}

fn progress_dict<'py>(py: Python<'py>, r: &ProgressRecord) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("t", r.t)?;
    dict.set_item("elapsed_secs", r.elapsed_secs)?;
    dict.set_item("Ktot", r.k_total)?;
    dict.set_item("zonal_fraction", r.zonal_fraction)?;
    dict.set_item("kappa", r.kappa)?;
    dict.set_item("line", r.to_string())?;
    Ok(dict)
}

fn fields_dict<'py>(py: Python<'py>, r: &FieldSnapshot) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("t", r.t)?;
    dict.set_item("phik", rows(&r.phik))?;
    dict.set_item("nk", rows(&r.nk))?;
    dict.set_item("ur", r.u_r.clone())?;
    dict.set_item("nr", r.n_r.clone())?;
    Ok(dict)
}

fn reduced_dict<'py>(py: Python<'py>, r: &ReducedSnapshot) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("t", r.t)?;
    dict.set_item("phik", rows(&r.phik))?;
    dict.set_item("nk", rows(&r.nk))?;
    Ok(dict)
}

fn kind_name(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::Fields => "fields",
        DiagnosticKind::Profiles => "profiles",
        DiagnosticKind::Reduced => "reduced",
        DiagnosticKind::Energies => "energies",
        DiagnosticKind::Fluxes => "fluxes",
        DiagnosticKind::Show => "show",
    }
}

// ─── PyFdhwConfig ───────────────────────────────────────────────────

/// Python-visible run configuration.
#[pyclass(name = "FdhwConfig")]
#[derive(Clone)]
struct PyFdhwConfig {
    inner: SimulationConfig,
}

#[pymethods]
impl PyFdhwConfig {
    #[new]
    #[pyo3(signature = (
        npx = 512,
        npy = 512,
        lx = None,
        ly = None,
        c = 0.05,
        nu = 4e-2,
        d = 4e-2,
        mupen = None,
        t0 = 0.0,
        t1 = 200.0,
        dtstep = 0.1,
        dtshow = 1.0,
        dtsave = 0.1,
        seed = 0,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        npx: usize,
        npy: usize,
        lx: Option<f64>,
        ly: Option<f64>,
        c: f64,
        nu: f64,
        d: f64,
        mupen: Option<f64>,
        t0: f64,
        t1: f64,
        dtstep: f64,
        dtshow: f64,
        dtsave: f64,
        seed: u64,
    ) -> PyResult<Self> {
        let mut config = SimulationConfig::default();
        config.grid.npx = npx;
        config.grid.npy = npy;
        config.grid.lx = lx.unwrap_or(config.grid.lx);
        config.grid.ly = ly.unwrap_or(config.grid.ly);
        config.physics.c = c;
        config.physics.nu = nu;
        config.physics.d = d;
        if let Some(mupen) = mupen {
            let mut buffer = config.buffer();
            buffer.mupen = mupen;
            config.buffer = Some(buffer);
        }
        config.time.t0 = t0;
        config.time.t1 = t1;
        config.time.dtstep = dtstep;
        config.time.dtshow = dtshow;
        config.time.dtsave = dtsave;
        config.initial.seed = seed;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = SimulationConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(to_py_err)
    }

    /// Parameter record as saved alongside a run.
    fn params<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let cfg = &self.inner;
        let buffer = cfg.buffer();
        let dict = PyDict::new(py);
        dict.set_item("C", cfg.physics.c)?;
        dict.set_item("kap_init", cfg.physics.kappa_init)?;
        dict.set_item("nu", cfg.physics.nu)?;
        dict.set_item("D", cfg.physics.d)?;
        dict.set_item("Lx", cfg.grid.lx)?;
        dict.set_item("Ly", cfg.grid.ly)?;
        dict.set_item("Npx", cfg.grid.npx)?;
        dict.set_item("Npy", cfg.grid.npy)?;
        dict.set_item("mupen", buffer.mupen)?;
        dict.set_item(
            "indices",
            (buffer.il, buffer.im1, buffer.i1, buffer.i2, buffer.im2, buffer.ir),
        )?;
        dict.set_item("sigS", buffer.sig_s)?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        let g = &self.inner.grid;
        let p = &self.inner.physics;
        format!(
            "FdhwConfig(npx={}, npy={}, lx={:.4}, ly={:.4}, C={}, nu={}, D={})",
            g.npx, g.npy, g.lx, g.ly, p.c, p.nu, p.d
        )
    }
}

// ─── RustRhsEvaluator ───────────────────────────────────────────────

/// Right-hand side `dy/dt = rhs(t, y)` on the flat real state.
#[pyclass(name = "RustRhsEvaluator")]
struct PyRhsEvaluator {
    inner: Arc<RhsEvaluator>,
    config: SimulationConfig,
}

#[pymethods]
impl PyRhsEvaluator {
    #[new]
    fn new(config: PyRef<'_, PyFdhwConfig>) -> PyResult<Self> {
        let inner = RhsEvaluator::from_config(&config.inner).map_err(to_py_err)?;
        Ok(Self {
            inner: Arc::new(inner),
            config: config.inner.clone(),
        })
    }

    /// Evaluate the derivative. The GIL is released during evaluation.
    fn rhs(&self, py: Python<'_>, t: f64, y: Vec<f64>) -> PyResult<Vec<f64>> {
        let ev = Arc::clone(&self.inner);
        py.allow_threads(move || ev.rhs(t, &y)).map_err(to_py_err)
    }

    /// Flat initial state of the configured initial condition.
    fn initial_state(&self) -> PyResult<Vec<f64>> {
        self.inner
            .initial_flat_state(&self.config)
            .map_err(to_py_err)
    }

    /// Length of the flat state.
    #[getter]
    fn state_len(&self) -> usize {
        self.inner.layout().len()
    }

    #[getter]
    fn n_modes(&self) -> usize {
        self.inner.grid().mode_count()
    }

    #[getter]
    fn n_zonal(&self) -> usize {
        self.inner.grid().zonal_count()
    }

    #[getter]
    fn x(&self) -> Vec<f64> {
        self.inner.grid().x.clone()
    }

    /// Background gradient and zonal density perturbation of a state.
    fn decompose<'py>(&self, py: Python<'py>, y: Vec<f64>) -> PyResult<Bound<'py, PyDict>> {
        let state = self.inner.layout().decode(&y).map_err(to_py_err)?;
        let dec = self
            .inner
            .decomposer()
            .decompose(&state.n_r)
            .map_err(to_py_err)?;
        let dict = PyDict::new(py);
        dict.set_item("nbar", dec.n_bar)?;
        dict.set_item("kappa", dec.kappa)?;
        dict.set_item("mean_offset", dec.mean_offset)?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        let g = self.inner.grid();
        format!(
            "RustRhsEvaluator({}x{}, modes={}, state_len={})",
            g.npx,
            g.npy,
            g.mode_count(),
            self.inner.layout().len()
        )
    }
}

// ─── RustDiagnostics ────────────────────────────────────────────────

/// Scheduled diagnostics for an integrator's step callback.
#[pyclass(name = "RustDiagnostics")]
struct PyDiagnostics {
    inner: DiagnosticsRecorder,
}

#[pymethods]
impl PyDiagnostics {
    #[new]
    #[pyo3(signature = (evaluator, reduced_columns = 10))]
    fn new(evaluator: PyRef<'_, PyRhsEvaluator>, reduced_columns: usize) -> PyResult<Self> {
        let schedule = Schedule::from_time_config(&evaluator.config.time).map_err(to_py_err)?;
        let diagnostics =
            Diagnostics::new(Arc::clone(&evaluator.inner)).with_reduced_columns(reduced_columns);
        Ok(Self {
            inner: DiagnosticsRecorder::new(diagnostics, schedule),
        })
    }

    /// Record everything due at `t`. Returns the names of what was computed.
    fn observe(&self, t: f64, y: Vec<f64>) -> PyResult<Vec<&'static str>> {
        let due = self.inner.observe(t, &y).map_err(to_py_err)?;
        Ok(due.into_iter().map(kind_name).collect())
    }

    fn energies<'py>(&self, py: Python<'py>, t: f64, y: Vec<f64>) -> PyResult<Bound<'py, PyDict>> {
        let r = self.inner.diagnostics().energies(t, &y).map_err(to_py_err)?;
        energy_dict(py, &r)
    }

    fn fluxes<'py>(&self, py: Python<'py>, t: f64, y: Vec<f64>) -> PyResult<Bound<'py, PyDict>> {
        let r = self.inner.diagnostics().fluxes(t, &y).map_err(to_py_err)?;
        flux_dict(py, &r)
    }

    fn progress<'py>(&self, py: Python<'py>, t: f64, y: Vec<f64>) -> PyResult<Bound<'py, PyDict>> {
        let r = self.inner.diagnostics().progress(t, &y).map_err(to_py_err)?;
        progress_dict(py, &r)
    }

    fn fields<'py>(&self, py: Python<'py>, t: f64, y: Vec<f64>) -> PyResult<Bound<'py, PyDict>> {
        let r = self.inner.diagnostics().fields(t, &y).map_err(to_py_err)?;
        fields_dict(py, &r)
    }

    /// Padded wavenumber tables `(kxp, kyp, ksqrp)` as nested lists.
    fn wavenumbers(&self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let s = self.inner.diagnostics().spectrum();
        let nested = |a: &Array2<f64>| -> Vec<Vec<f64>> {
            a.outer_iter().map(|r| r.to_vec()).collect()
        };
        (nested(&s.kxp), nested(&s.kyp), nested(&s.ksqrp))
    }

    /// Buffered records since the last drain, grouped by kind.
    fn drain<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let set = self.inner.drain();
        let out = PyDict::new(py);

        let list = PyList::empty(py);
        for r in &set.fields {
            list.append(fields_dict(py, r)?)?;
        }
        out.set_item("fields", list)?;

        let list = PyList::empty(py);
        for r in &set.profiles {
            list.append(profile_dict(py, r)?)?;
        }
        out.set_item("profiles", list)?;

        let list = PyList::empty(py);
        for r in &set.reduced {
            list.append(reduced_dict(py, r)?)?;
        }
        out.set_item("reduced", list)?;

        let list = PyList::empty(py);
        for r in &set.energies {
            list.append(energy_dict(py, r)?)?;
        }
        out.set_item("energies", list)?;

        let list = PyList::empty(py);
        for r in &set.fluxes {
            list.append(flux_dict(py, r)?)?;
        }
        out.set_item("fluxes", list)?;

        let list = PyList::empty(py);
        for r in &set.progress {
            list.append(progress_dict(py, r)?)?;
        }
        out.set_item("progress", list)?;

        Ok(out)
    }

    /// Last observed `(t, y)`, or None before the first observation.
    fn last(&self) -> Option<(f64, Vec<f64>)> {
        self.inner.last_state()
    }

    #[getter]
    fn pending(&self) -> usize {
        self.inner.pending()
    }
}

// ─── Module Registration ────────────────────────────────────────────

/// FDHW Kernel — flux-driven Hasegawa-Wakatani right-hand side.
///
/// - `FdhwConfig` — configuration
/// - `RustRhsEvaluator` — `rhs(t, y)` and the initial state
/// - `RustDiagnostics` — snapshots, fluxes, energies, progress line
#[pymodule]
fn fdhw_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFdhwConfig>()?;
    m.add_class::<PyRhsEvaluator>()?;
    m.add_class::<PyDiagnostics>()?;
    Ok(())
}
