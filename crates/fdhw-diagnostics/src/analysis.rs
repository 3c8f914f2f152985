// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Flux and Energy Analysis
// ─────────────────────────────────────────────────────────────────────
//! Diagnostics computed from a flat state.
//!
//!   Γ(x) = -⟨∂yφ · n⟩_y
//!   Π(x) =  ⟨∂yφ · ∇²φ⟩_y   (with ∇²φ taken as k²φ_k, matching the saved convention)
//!   R(x) =  ⟨∂yφ · ∂xφ⟩_y
//!
//!   K = Σ k²|φ_k|²,  W = Σ k⁴|φ_k|²,  N = Σ |n_k|²   over the padded half-spectrum

use std::sync::Arc;
use std::time::Instant;

use ndarray::{Array2, Axis};
use num_complex::Complex64;

use fdhw_physics::{ModeBundle, RhsEvaluator, State};
use fdhw_spectral::{Grid, SpectralTransform};
use fdhw_types::{EnergyRecord, FdhwResult, FluxRecord, ProfileRecord, ProgressRecord};

use crate::spectrum::{FieldSnapshot, PaddedSpectrum, ReducedSnapshot};

/// Number of ky columns kept in a reduced snapshot by default.
pub const DEFAULT_REDUCED_COLUMNS: usize = 10;

/// `(K, W, N)` of padded fields.
pub fn energies_of(
    spectrum: &PaddedSpectrum,
    phikp: &Array2<Complex64>,
    nkp: &Array2<Complex64>,
) -> (f64, f64, f64) {
    let mut k = 0.0;
    let mut w = 0.0;
    for (&ks, p) in spectrum.ksqrp.iter().zip(phikp.iter()) {
        let e = ks * p.norm_sqr();
        k += e;
        w += ks * e;
    }
    let n = nkp.iter().map(|c| c.norm_sqr()).sum();
    (k, w, n)
}

/// `(Γ, Π, R)` radial profiles of full mode vectors.
pub fn fluxes_of(
    grid: &Grid,
    transform: &SpectralTransform,
    phik: &[Complex64],
    nk: &[Complex64],
) -> FdhwResult<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let iu = Complex64::i();
    let spectral = |f: &dyn Fn(usize) -> Complex64| -> Vec<Complex64> {
        (0..grid.mode_count()).map(f).collect()
    };
    let dyphi = transform.inverse2d(&spectral(&|m| iu * grid.ky[m] * phik[m]))?;
    let dxphi = transform.inverse2d(&spectral(&|m| iu * grid.kx[m] * phik[m]))?;
    let vort = transform.inverse2d(&spectral(&|m| phik[m] * grid.ksqr[m]))?;
    let n = transform.inverse2d(nk)?;

    let y_mean = |a: &Array2<f64>| -> Vec<f64> {
        let npy = a.ncols() as f64;
        (&dyphi * a).sum_axis(Axis(1)).iter().map(|v| v / npy).collect()
    };
    let gam = y_mean(&n).into_iter().map(|v| -v).collect();
    Ok((gam, y_mean(&vort), y_mean(&dxphi)))
}

/// Computes every saved quantity from `(t, y)`.
pub struct Diagnostics {
    evaluator: Arc<RhsEvaluator>,
    spectrum: PaddedSpectrum,
    reduced_columns: usize,
    started: Instant,
}

impl Diagnostics {
    pub fn new(evaluator: Arc<RhsEvaluator>) -> Self {
        let spectrum = PaddedSpectrum::new(evaluator.grid());
        Self {
            evaluator,
            spectrum,
            reduced_columns: DEFAULT_REDUCED_COLUMNS,
            started: Instant::now(),
        }
    }

    pub fn with_reduced_columns(mut self, n: usize) -> Self {
        self.reduced_columns = n;
        self
    }

    pub fn evaluator(&self) -> &RhsEvaluator {
        &self.evaluator
    }

    pub fn spectrum(&self) -> &PaddedSpectrum {
        &self.spectrum
    }

    fn expand(&self, y: &[f64]) -> FdhwResult<(State, ModeBundle)> {
        let state = self.evaluator.layout().decode(y)?;
        let bundle = self.evaluator.reconstruct(&state)?;
        Ok((state, bundle))
    }

    pub fn fields(&self, t: f64, y: &[f64]) -> FdhwResult<FieldSnapshot> {
        let (state, bundle) = self.expand(y)?;
        Ok(FieldSnapshot {
            t,
            phik: self.spectrum.scatter(&bundle.phik)?,
            nk: self.spectrum.scatter(&bundle.nk)?,
            u_r: state.u_r,
            n_r: state.n_r,
        })
    }

    pub fn reduced(&self, t: f64, y: &[f64]) -> FdhwResult<ReducedSnapshot> {
        Ok(self.fields(t, y)?.reduced(self.reduced_columns))
    }

    pub fn profiles(&self, t: f64, y: &[f64]) -> FdhwResult<ProfileRecord> {
        let state = self.evaluator.layout().decode(y)?;
        Ok(ProfileRecord {
            t,
            u_r: state.u_r,
            n_r: state.n_r,
        })
    }

    pub fn energies(&self, t: f64, y: &[f64]) -> FdhwResult<EnergyRecord> {
        let (_, bundle) = self.expand(y)?;
        let phikp = self.spectrum.scatter(&bundle.phik)?;
        let nkp = self.spectrum.scatter(&bundle.nk)?;
        let (k, w, n) = energies_of(&self.spectrum, &phikp, &nkp);
        Ok(EnergyRecord { t, k, w, n })
    }

    pub fn fluxes(&self, t: f64, y: &[f64]) -> FdhwResult<FluxRecord> {
        let (_, bundle) = self.expand(y)?;
        let ev = &self.evaluator;
        let (gam, pi, r) = fluxes_of(ev.grid(), ev.transform(), &bundle.phik, &bundle.nk)?;
        Ok(FluxRecord { t, gam, pi, r })
    }

    /// Progress line; also logged at info level.
    pub fn progress(&self, t: f64, y: &[f64]) -> FdhwResult<ProgressRecord> {
        let (_, bundle) = self.expand(y)?;
        let g = self.evaluator.grid();
        let k_total = bundle
            .phik
            .iter()
            .zip(&g.ksqr)
            .map(|(p, k)| k * p.norm_sqr())
            .sum();
        let k_zonal = g
            .zonal
            .iter()
            .zip(&g.kx_zonal)
            .map(|(&m, kx)| (bundle.phik[m] * kx).norm_sqr())
            .sum();
        let record = ProgressRecord::new(
            t,
            self.started.elapsed().as_secs_f64(),
            k_total,
            k_zonal,
            bundle.kappa,
        );
        log::info!("{record}");
        Ok(record)
    }
}
