// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Simulation Configuration
// ─────────────────────────────────────────────────────────────────────
//! Runtime configuration for a flux-driven Hasegawa-Wakatani run.
//!
//! Grid, physics, buffer geometry, time range and initial condition.
//! Buffer indices are signed offsets: negative values count from the
//! end of the radial axis and are resolved when the grid is built.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{FdhwError, FdhwResult};

/// Padded real-space resolution and box size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Padded radial resolution. Default: 512.
    pub npx: usize,
    /// Padded poloidal resolution. Default: 512.
    pub npy: usize,
    /// Radial box length. Default: 32π.
    pub lx: f64,
    /// Poloidal box length. Default: 32π.
    pub ly: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            npx: 512,
            npy: 512,
            lx: 32.0 * PI,
            ly: 32.0 * PI,
        }
    }
}

/// Physical coefficients of the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Adiabaticity parameter C. Default: 0.05.
    pub c: f64,
    /// Nominal background density gradient. Default: 1.0.
    /// Informational only: recorded with the run parameters, never read by
    /// the evaluator, which derives the instantaneous gradient from n_r.
    pub kappa_init: f64,
    /// Viscosity acting on turbulent potential modes. Default: 4e-2.
    pub nu: f64,
    /// Particle diffusion acting on turbulent density modes. Default: 4e-2.
    pub d: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            c: 0.05,
            kappa_init: 1.0,
            nu: 4e-2,
            d: 4e-2,
        }
    }
}

/// Buffer geometry and penalisation.
///
/// Ordering once resolved: `il < im1 < i1 < i2 < im2 < ir`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Gate is exactly 0 at and left of this index.
    pub il: i64,
    /// Left edge of the physical domain (gate exactly 1 from here).
    pub i1: i64,
    /// Right edge of the physical domain.
    pub i2: i64,
    /// Gate is exactly 0 at and right of this index.
    pub ir: i64,
    /// Start of the zonal-profile flattening on the left.
    pub im1: i64,
    /// Start of the zonal-profile flattening on the right.
    pub im2: i64,
    /// Penalisation (friction) coefficient. Default: 100.
    pub mupen: f64,
    /// Width of the artificial boundary sources. Default: 5·lx/npx.
    pub sig_s: f64,
}

impl BufferConfig {
    /// Default buffer layout for a radial resolution `npx` and box length `lx`.
    pub fn for_resolution(npx: usize, lx: f64) -> Self {
        let edge = (npx / 128) as i64;
        let i1 = (npx / 8) as i64;
        let i2 = -i1;
        Self {
            il: edge,
            i1,
            i2,
            // `-0` would alias the first sample, so fall back to the last one.
            ir: if edge == 0 { -1 } else { -edge },
            im1: i1 / 2,
            im2: i2 / 2,
            mupen: 1e2,
            sig_s: 5.0 * lx / npx.max(1) as f64,
        }
    }
}

/// Integration range and callback cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    pub t0: f64,
    pub t1: f64,
    /// Maximum internal step of the integrator. Default: 0.1.
    pub dtstep: f64,
    /// Progress-line interval. Default: 1.0.
    pub dtshow: f64,
    /// Diagnostics interval. Default: 0.1.
    pub dtsave: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            t0: 0.0,
            t1: 200.0,
            dtstep: 0.1,
            dtshow: 1.0,
            dtsave: 0.1,
        }
    }
}

/// Shape of the initial radial density profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityProfile {
    /// `lx·(tanh((1 − 3x/(2lx))·4)/2 + 0.75)`
    Tanh,
    /// `lx − x`
    Linear,
}

/// Initial condition: background profiles plus random-phase spectral seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialCondition {
    pub density_profile: DensityProfile,
    /// Gaussian envelope width in integer wavenumbers. Default: 10.
    pub spectral_width: f64,
    /// Envelope peak amplitude. Default: 1e-4.
    pub spectral_amplitude: f64,
    /// RNG seed for the random phases.
    pub seed: u64,
}

impl Default for InitialCondition {
    fn default() -> Self {
        Self {
            density_profile: DensityProfile::Tanh,
            spectral_width: 10.0,
            spectral_amplitude: 1e-4,
            seed: 0,
        }
    }
}

/// Full configuration surface of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub physics: PhysicsParams,
    /// Buffer layout; `None` selects [`BufferConfig::for_resolution`].
    pub buffer: Option<BufferConfig>,
    pub time: TimeConfig,
    pub initial: InitialCondition,
}

impl SimulationConfig {
    /// Effective buffer layout for this grid.
    pub fn buffer(&self) -> BufferConfig {
        self.buffer
            .unwrap_or_else(|| BufferConfig::for_resolution(self.grid.npx, self.grid.lx))
    }

    /// Validate configuration parameters.
    ///
    /// Buffer index ordering is checked when the grid is built, since it
    /// needs the resolved absolute positions.
    pub fn validate(&self) -> FdhwResult<()> {
        let g = &self.grid;
        for (name, n) in [("npx", g.npx), ("npy", g.npy)] {
            if n < 8 || n % 2 != 0 {
                return Err(FdhwError::Configuration(format!(
                    "{name} must be even and >= 8, got {n}"
                )));
            }
        }
        for (name, l) in [("lx", g.lx), ("ly", g.ly)] {
            if !(l.is_finite() && l > 0.0) {
                return Err(FdhwError::Configuration(format!(
                    "{name} must be finite and > 0, got {l}"
                )));
            }
        }

        let p = &self.physics;
        for (name, v) in [("c", p.c), ("nu", p.nu), ("d", p.d)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(FdhwError::Configuration(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        if !p.kappa_init.is_finite() {
            return Err(FdhwError::Configuration(format!(
                "kappa_init must be finite, got {}",
                p.kappa_init
            )));
        }

        let b = self.buffer();
        if !(b.mupen.is_finite() && b.mupen >= 0.0) {
            return Err(FdhwError::Configuration(format!(
                "mupen must be finite and >= 0, got {}",
                b.mupen
            )));
        }
        if !(b.sig_s.is_finite() && b.sig_s > 0.0) {
            return Err(FdhwError::Configuration(format!(
                "sig_s must be finite and > 0, got {}",
                b.sig_s
            )));
        }
        let dx = g.lx / g.npx as f64;
        if b.sig_s < dx {
            log::warn!(
                "sig_s={:.4} is narrower than one grid cell (dx={dx:.4}); boundary sources are under-resolved",
                b.sig_s
            );
        }

        let t = &self.time;
        if !(t.t0.is_finite() && t.t1.is_finite() && t.t1 > t.t0) {
            return Err(FdhwError::Configuration(format!(
                "time range must satisfy t1 > t0, got [{}, {}]",
                t.t0, t.t1
            )));
        }
        for (name, v) in [("dtstep", t.dtstep), ("dtshow", t.dtshow), ("dtsave", t.dtsave)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(FdhwError::Configuration(format!(
                    "{name} must be finite and > 0, got {v}"
                )));
            }
        }

        let ic = &self.initial;
        if !(ic.spectral_width.is_finite() && ic.spectral_width > 0.0) {
            return Err(FdhwError::Configuration(format!(
                "spectral_width must be finite and > 0, got {}",
                ic.spectral_width
            )));
        }
        if !(ic.spectral_amplitude.is_finite() && ic.spectral_amplitude >= 0.0) {
            return Err(FdhwError::Configuration(format!(
                "spectral_amplitude must be finite and >= 0, got {}",
                ic.spectral_amplitude
            )));
        }
        Ok(())
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> FdhwResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| FdhwError::Configuration(format!("JSON parse error: {e}")))
    }

    /// Serialise to a JSON string.
    pub fn to_json(&self) -> FdhwResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FdhwError::Configuration(format!("JSON encode error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        SimulationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_buffer_layout_512() {
        let b = BufferConfig::for_resolution(512, 32.0 * PI);
        assert_eq!((b.il, b.i1, b.i2, b.ir), (4, 64, -64, -4));
        assert_eq!((b.im1, b.im2), (32, -32));
        assert!((b.sig_s - 5.0 * 32.0 * PI / 512.0).abs() < 1e-12);
        assert_eq!(b.mupen, 100.0);
    }

    #[test]
    fn test_small_grid_right_edge_not_aliased() {
        let b = BufferConfig::for_resolution(64, 10.0);
        assert_eq!(b.il, 0);
        assert_eq!(b.ir, -1);
    }

    #[test]
    fn test_odd_resolution_rejected() {
        let mut cfg = SimulationConfig::default();
        cfg.grid.npx = 511;
        assert!(matches!(cfg.validate(), Err(FdhwError::Configuration(_))));
    }

    #[test]
    fn test_zero_box_rejected() {
        let mut cfg = SimulationConfig::default();
        cfg.grid.ly = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_negative_viscosity_rejected() {
        let mut cfg = SimulationConfig::default();
        cfg.physics.nu = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_inverted_time_range_rejected() {
        let mut cfg = SimulationConfig::default();
        cfg.time.t1 = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let cfg = SimulationConfig::from_json(
            r#"{"grid": {"npx": 64, "npy": 64, "lx": 10.0, "ly": 10.0}, "physics": {"c": 0.1, "kappa_init": 1.0, "nu": 0.0, "d": 0.0}}"#,
        )
        .unwrap();
        assert_eq!(cfg.grid.npx, 64);
        assert_eq!(cfg.physics.c, 0.1);
        assert_eq!(cfg.time, TimeConfig::default());
        assert_eq!(cfg.buffer(), BufferConfig::for_resolution(64, 10.0));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut cfg = SimulationConfig::default();
        cfg.initial.density_profile = DensityProfile::Linear;
        let back = SimulationConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_json_garbage_rejected() {
        assert!(matches!(
            SimulationConfig::from_json("{not json"),
            Err(FdhwError::Configuration(_))
        ));
    }
}
