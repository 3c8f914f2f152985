// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Right-Hand Side Evaluator
// ─────────────────────────────────────────────────────────────────────
//! Time derivative of the flux-driven Hasegawa-Wakatani system.
//!
//! Spectral part, on every retained mode:
//!
//!   dφ_k/dt = -(kx·ky·F[φx² - φy²] + (ky² - kx²)·F[φx·φy]) / k²
//!   dn_k/dt = i·kx·F[φy·n] - i·ky·F[φx·n]
//!
//! and on ky > 0 only:
//!
//!   dφ_k/dt += -C(φ_k - n_k)/k² + μ(i·kx·F[(1-ψ)φx] + i·ky·F[(1-ψ)φy])/k² - ν·k²·φ_k
//!   dn_k/dt += C(φ_k - n_k) - i·κ·ky·φ_k - μ·F[(1-ψ)n] - D·k²·n_k
//!
//! Radial part: zonal slices projected back to profiles and masked by ψ,
//! no-slip friction on u_r in the buffers, Gaussian boundary sources,
//! and a restoring force pulling n_r toward the shifted reference shape.

use ndarray::Array2;
use num_complex::Complex64;

use fdhw_spectral::{BufferIndices, Grid, SpectralTransform};
use fdhw_types::{BufferConfig, FdhwError, FdhwResult, PhysicsParams, SimulationConfig};

use crate::gates::GateSet;
use crate::initial::{background_profiles, initial_state};
use crate::profile::ProfileDecomposer;
use crate::state::{State, StateLayout};

/// Full mode vectors rebuilt from a state.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeBundle {
    /// Potential over every retained mode.
    pub phik: Vec<Complex64>,
    /// Density over every retained mode.
    pub nk: Vec<Complex64>,
    /// Background gradient extracted from n_r.
    pub kappa: f64,
}

/// Immutable RHS of one run, shared by reference across integrator stages.
pub struct RhsEvaluator {
    grid: Grid,
    transform: SpectralTransform,
    gates: GateSet,
    decomposer: ProfileDecomposer,
    layout: StateLayout,
    physics: PhysicsParams,
    mupen: f64,
    /// Gaussian centred on x[i1], cut to zero from x[i2] on.
    source_left: Vec<f64>,
    /// Gaussian centred on x[i2].
    source_right: Vec<f64>,
    /// Reference density shape for the buffer restoring force.
    n_r0: Vec<f64>,
}

impl RhsEvaluator {
    /// `buffer` must resolve to the same indices the grid was built with;
    /// it contributes `mupen` and `sig_s`.
    pub fn new(
        grid: Grid,
        physics: PhysicsParams,
        buffer: &BufferConfig,
        n_r0: Vec<f64>,
    ) -> FdhwResult<Self> {
        let resolved = BufferIndices::resolve(buffer, grid.npx)?;
        if resolved != grid.buffer {
            return Err(FdhwError::Configuration(format!(
                "buffer indices {resolved:?} disagree with the grid's {:?}",
                grid.buffer
            )));
        }
        if n_r0.len() != grid.npx {
            return Err(FdhwError::Configuration(format!(
                "reference profile has {} samples, grid has npx={}",
                n_r0.len(),
                grid.npx
            )));
        }
        if !(buffer.sig_s.is_finite() && buffer.sig_s > 0.0) {
            return Err(FdhwError::Configuration(format!(
                "sig_s must be finite and > 0, got {}",
                buffer.sig_s
            )));
        }
        if !(buffer.mupen.is_finite() && buffer.mupen >= 0.0) {
            return Err(FdhwError::Configuration(format!(
                "mupen must be finite and >= 0, got {}",
                buffer.mupen
            )));
        }

        let b = grid.buffer;
        let gaussian = |xc: f64| -> Vec<f64> {
            grid.x
                .iter()
                .map(|&x| (-(x - xc).powi(2) / (2.0 * buffer.sig_s * buffer.sig_s)).exp())
                .collect()
        };
        let mut source_left = gaussian(grid.x[b.i1]);
        let source_right = gaussian(grid.x[b.i2]);
        let overlap = source_left[b.i2];
        if overlap >= 0.5 {
            return Err(FdhwError::Configuration(format!(
                "sig_s={} is too wide: boundary sources overlap ({overlap:.3}) across the domain",
                buffer.sig_s
            )));
        }
        if overlap > 1e-6 {
            log::warn!("boundary sources overlap by {overlap:.3e}; left source cut at x[i2]");
        }
        source_left[b.i2..].iter_mut().for_each(|g| *g = 0.0);
        if n_r0.windows(2).any(|w| w[1] > w[0]) {
            log::warn!("reference density profile is not monotonically decreasing");
        }

        log::info!(
            "rhs evaluator: C={}, nu={}, D={}, mupen={}, sig_s={:.4}, {} reals per state",
            physics.c,
            physics.nu,
            physics.d,
            buffer.mupen,
            buffer.sig_s,
            StateLayout::new(&grid).len()
        );

        Ok(Self {
            transform: SpectralTransform::new(&grid),
            gates: GateSet::new(&grid),
            decomposer: ProfileDecomposer::new(&grid),
            layout: StateLayout::new(&grid),
            physics,
            mupen: buffer.mupen,
            source_left,
            source_right,
            n_r0,
            grid,
        })
    }

    /// Validate the configuration, build the grid, and use the configured
    /// initial density profile as the buffer reference.
    pub fn from_config(config: &SimulationConfig) -> FdhwResult<Self> {
        let grid = Grid::from_config(config)?;
        let (_, n_r0) = background_profiles(&grid, config.initial.density_profile);
        Self::new(grid, config.physics, &config.buffer(), n_r0)
    }

    /// Flat initial state for the configured initial condition.
    pub fn initial_flat_state(&self, config: &SimulationConfig) -> FdhwResult<Vec<f64>> {
        self.layout.encode(&initial_state(&self.grid, &config.initial))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn transform(&self) -> &SpectralTransform {
        &self.transform
    }

    pub fn decomposer(&self) -> &ProfileDecomposer {
        &self.decomposer
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// `rhs(t, y) -> dy/dt` on flat buffers. Fails on a layout mismatch or a
    /// non-finite derivative; never mutates `y`.
    pub fn rhs(&self, t: f64, y: &[f64]) -> FdhwResult<Vec<f64>> {
        let state = self.layout.decode(y)?;
        let dydt = self.layout.encode(&self.derivative(&state)?)?;
        if let Some((index, &value)) = dydt.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            log::error!("rhs at t={t}: non-finite derivative {value} at flat index {index}");
            return Err(FdhwError::NumericalInstability { t, index, value });
        }
        Ok(dydt)
    }

    /// Zonal modes from the profiles, turbulent modes from the state.
    pub fn reconstruct(&self, state: &State) -> FdhwResult<ModeBundle> {
        self.layout.check(state)?;
        let g = &self.grid;
        let iu = Complex64::i();

        let dec = self.decomposer.decompose(&state.n_r)?;
        let u_bar = self.decomposer.flatten_velocity(&state.u_r);
        let u_zonal = self.transform.forward1d(&u_bar)?;
        let n_zonal = self.transform.forward1d(&dec.n_bar)?;

        let mut phik = vec![Complex64::default(); g.mode_count()];
        let mut nk = vec![Complex64::default(); g.mode_count()];
        for (j, &m) in g.zonal.iter().enumerate() {
            phik[m] = -iu * u_zonal[j] / g.kx_zonal[j];
            nk[m] = n_zonal[j];
        }
        for (j, &m) in g.turbulent.iter().enumerate() {
            phik[m] = state.phik_turb[j];
            nk[m] = state.nk_turb[j];
        }
        Ok(ModeBundle {
            phik,
            nk,
            kappa: dec.kappa,
        })
    }

    /// Structured derivative of `state`.
    #[allow(clippy::needless_range_loop)]
    pub fn derivative(&self, state: &State) -> FdhwResult<State> {
        let g = &self.grid;
        let t = &self.transform;
        let iu = Complex64::i();
        let PhysicsParams { c, nu, d, .. } = self.physics;
        let mupen = self.mupen;

        let ModeBundle { phik, nk, kappa } = self.reconstruct(state)?;

        let dx_k: Vec<Complex64> = phik.iter().zip(&g.kx).map(|(&p, &k)| iu * k * p).collect();
        let dy_k: Vec<Complex64> = phik.iter().zip(&g.ky).map(|(&p, &k)| iu * k * p).collect();
        let dxphi = t.inverse2d(&dx_k)?;
        let dyphi = t.inverse2d(&dy_k)?;
        let n = t.inverse2d(&nk)?;

        let f_sq = t.forward2d(&(&dxphi * &dxphi - &dyphi * &dyphi))?;
        let f_cross = t.forward2d(&(&dxphi * &dyphi))?;
        let f_yn = t.forward2d(&(&dyphi * &n))?;
        let f_xn = t.forward2d(&(&dxphi * &n))?;

        let outside: &Array2<f64> = &self.gates.outside_2d;
        let f_pen_x = t.forward2d(&(outside * &dxphi))?;
        let f_pen_y = t.forward2d(&(outside * &dyphi))?;
        let f_pen_n = t.forward2d(&(outside * &n))?;

        let mut dphik = Vec::with_capacity(g.mode_count());
        let mut dnk = Vec::with_capacity(g.mode_count());
        for m in 0..g.mode_count() {
            let (kx, ky, k2) = (g.kx[m], g.ky[m], g.ksqr[m]);

            let mut dphi = -(f_sq[m] * (kx * ky) + f_cross[m] * (ky * ky - kx * kx)) / k2;
            let mut dn = iu * kx * f_yn[m] - iu * ky * f_xn[m];

            if ky > 0.0 {
                let coupling = (phik[m] - nk[m]) * c;
                dphi += -coupling / k2;
                dn += coupling - iu * (kappa * ky) * phik[m];

                dphi += (iu * kx * f_pen_x[m] + iu * ky * f_pen_y[m]) * (mupen / k2)
                    - phik[m] * (k2 * nu);
                dn += -f_pen_n[m] * mupen - nk[m] * (k2 * d);
            }
            dphik.push(dphi);
            dnk.push(dn);
        }

        let du_zonal: Vec<Complex64> = g
            .zonal
            .iter()
            .zip(&g.kx_zonal)
            .map(|(&m, &k)| iu * k * dphik[m])
            .collect();
        let dn_zonal: Vec<Complex64> = g.zonal.iter().map(|&m| dnk[m]).collect();

        let psi = &self.gates.psi_1d;
        let mut du_r: Vec<f64> = t
            .inverse1d(&du_zonal)?
            .iter()
            .zip(psi)
            .map(|(v, p)| v * p)
            .collect();
        let mut dn_r: Vec<f64> = t
            .inverse1d(&dn_zonal)?
            .iter()
            .zip(psi)
            .map(|(v, p)| v * p)
            .collect();

        for ((du, &u), &p) in du_r.iter_mut().zip(&state.u_r).zip(psi) {
            *du -= mupen * (1.0 - p) * u;
        }
        self.boundary_sources(&mut dn_r);
        self.restoring_force(&state.n_r, &mut dn_r);

        Ok(State {
            u_r: du_r,
            n_r: dn_r,
            phik_turb: g.turbulent.iter().map(|&m| dphik[m]).collect(),
            nk_turb: g.turbulent.iter().map(|&m| dnk[m]).collect(),
        })
    }

    /// Remove the derivative at x[i2] with a Gaussian sink scaled by
    /// `dn_r[i2]` and re-inject the same amplitude at x[i1]: fixed flux on
    /// the right, floating value on the left. Leaves `dn_r[i2] == 0`.
    pub fn boundary_sources(&self, dn_r: &mut [f64]) {
        let amp = dn_r[self.grid.buffer.i2];
        for ((d, &l), &r) in dn_r
            .iter_mut()
            .zip(&self.source_left)
            .zip(&self.source_right)
        {
            *d += amp * (l - r);
        }
    }

    /// Penalise n_r in each buffer toward `n_r0` shifted to the current
    /// boundary value.
    #[allow(clippy::needless_range_loop)]
    pub fn restoring_force(&self, n_r: &[f64], dn_r: &mut [f64]) {
        let (i1, i2) = (self.grid.buffer.i1, self.grid.buffer.i2);
        let n0 = &self.n_r0;
        for i in 0..dn_r.len() {
            let target_left = n0[i] - n0[i1] + n_r[i1];
            let target_right = n0[i] - n0[i2] + n_r[i2];
            dn_r[i] -= self.mupen
                * (self.gates.h1[i] * (n_r[i] - target_left)
                    + self.gates.h2[i] * (n_r[i] - target_right));
        }
    }
}
