// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Diagnostic Records
// ─────────────────────────────────────────────────────────────────────
//! Serialisable records handed to the persistence collaborator.
//!
//! The layout on disk is the collaborator's business; these are plain
//! values with serde derives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Global spectral energies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    pub t: f64,
    /// Kinetic energy Σ k²|φ_k|² over the padded half-spectrum.
    pub k: f64,
    /// Kinetic enstrophy Σ k⁴|φ_k|².
    pub w: f64,
    /// Density fluctuation energy Σ |n_k|².
    pub n: f64,
}

/// Poloidally averaged radial flux profiles (length `npx` each).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxRecord {
    pub t: f64,
    /// Particle flux Γ(x).
    pub gam: Vec<f64>,
    /// Vorticity flux Π(x).
    pub pi: Vec<f64>,
    /// Reynolds stress R(x).
    pub r: Vec<f64>,
}

/// Raw radial profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub t: f64,
    pub u_r: Vec<f64>,
    pub n_r: Vec<f64>,
}

/// One progress line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub t: f64,
    /// Wall-clock seconds since the run started.
    pub elapsed_secs: f64,
    /// Σ k²|φ_k|² over the compact mode set.
    pub k_total: f64,
    /// Zonal share of `k_total`, in [0, 1].
    pub zonal_fraction: f64,
    /// Instantaneous background gradient.
    pub kappa: f64,
}

impl ProgressRecord {
    pub fn new(t: f64, elapsed_secs: f64, k_total: f64, k_zonal: f64, kappa: f64) -> Self {
        let zonal_fraction = if k_total > 0.0 && k_total.is_finite() {
            (k_zonal / k_total).clamp(0.0, 1.0)
        } else {
            log::warn!("progress at t={t}: total energy {k_total} is not positive, zonal fraction set to 0");
            0.0
        };
        Self {
            t,
            elapsed_secs,
            k_total,
            zonal_fraction,
            kappa,
        }
    }
}

impl fmt::Display for ProgressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:.6}, {:.6} secs elapsed., Ktot={:.6e}, Kbar/Ktot={:.1}%, kap={:.6}",
            self.t,
            self.elapsed_secs,
            self.k_total,
            self.zonal_fraction * 100.0,
            self.kappa
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zonal_fraction() {
        let p = ProgressRecord::new(1.0, 0.5, 4.0, 1.0, 0.9);
        assert!((p.zonal_fraction - 0.25).abs() < 1e-12);
        let line = p.to_string();
        assert!(line.contains("Kbar/Ktot=25.0%"), "{line}");
        assert!(line.contains("kap=0.9"), "{line}");
    }

    #[test]
    fn test_zero_energy_fraction_is_zero() {
        let p = ProgressRecord::new(0.0, 0.0, 0.0, 0.0, 1.0);
        assert_eq!(p.zonal_fraction, 0.0);
    }

    #[test]
    fn test_flux_record_serde() {
        let r = FluxRecord {
            t: 0.1,
            gam: vec![1.0, 2.0],
            pi: vec![0.0, 0.0],
            r: vec![-1.0, 1.0],
        };
        let json = serde_json::to_string(&r).unwrap();
        let back: FluxRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
