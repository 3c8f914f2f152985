// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Zonal Profile Decomposition
// ─────────────────────────────────────────────────────────────────────
//! Split a radial density profile into a background gradient and a
//! zero-mean zonal perturbation that is flat inside the buffers.
//!
//!   κ      = -(n[i2] - n[i1]) / (x[i2] - x[i1])
//!   n_raw  = n + κ·(x - x[i2]) - n[i2]
//!   n_off  = mean of n_raw at {0, im1, im2, npx-1}
//!   n_flat = (n_raw - n_off)·gate(il, im1, im2, ir) + n_off
//!   n̄      = n_flat - mean(n_flat)

use fdhw_spectral::{BufferIndices, Grid};
use fdhw_types::{FdhwError, FdhwResult};

use crate::gates::smooth_gate;

/// Result of [`ProfileDecomposer::decompose`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Zero-mean zonal perturbation.
    pub n_bar: Vec<f64>,
    /// Instantaneous background gradient between i1 and i2.
    pub kappa: f64,
    /// Mean removed from the flattened perturbation.
    pub mean_offset: f64,
}

/// Extracts zonal profiles; holds the flattening gate of the grid.
#[derive(Debug, Clone)]
pub struct ProfileDecomposer {
    x: Vec<f64>,
    idx: BufferIndices,
    flatten: Vec<f64>,
}

impl ProfileDecomposer {
    pub fn new(grid: &Grid) -> Self {
        let b = grid.buffer;
        Self {
            x: grid.x.clone(),
            idx: b,
            flatten: smooth_gate(&grid.x, b.il, b.im1, b.im2, b.ir),
        }
    }

    pub fn decompose(&self, n_r: &[f64]) -> FdhwResult<Decomposition> {
        let npx = self.x.len();
        if n_r.len() != npx {
            return Err(FdhwError::StateLayout {
                expected: npx,
                found: n_r.len(),
            });
        }
        let BufferIndices { i1, i2, im1, im2, .. } = self.idx;
        let x = &self.x;

        let kappa = -(n_r[i2] - n_r[i1]) / (x[i2] - x[i1]);
        let raw: Vec<f64> = n_r
            .iter()
            .zip(x)
            .map(|(&n, &xi)| n - (-kappa * (xi - x[i2]) + n_r[i2]))
            .collect();

        let n_off = (raw[0] + raw[im1] + raw[im2] + raw[npx - 1]) / 4.0;
        let flat: Vec<f64> = raw
            .iter()
            .zip(&self.flatten)
            .map(|(&r, &g)| (r - n_off) * g + n_off)
            .collect();

        let mean_offset = flat.iter().sum::<f64>() / npx as f64;
        Ok(Decomposition {
            n_bar: flat.iter().map(|v| v - mean_offset).collect(),
            kappa,
            mean_offset,
        })
    }

    /// Apply the same flattening to the velocity profile (no background term).
    pub fn flatten_velocity(&self, u_r: &[f64]) -> Vec<f64> {
        u_r.iter().zip(&self.flatten).map(|(u, g)| u * g).collect()
    }
}

#[cfg(test)]
mod tests {
    use fdhw_types::{BufferConfig, GridConfig};

    use super::*;

    fn grid() -> Grid {
        let cfg = GridConfig {
            npx: 128,
            npy: 16,
            lx: 50.0,
            ly: 10.0,
        };
        Grid::new(&cfg, &BufferConfig::for_resolution(128, 50.0)).unwrap()
    }

    #[test]
    fn test_linear_profile_has_exact_kappa_and_no_zonal_part() {
        let g = grid();
        let dec = ProfileDecomposer::new(&g);
        let n_r: Vec<f64> = g.x.iter().map(|x| 50.0 - 0.8 * x).collect();
        let d = dec.decompose(&n_r).unwrap();
        assert!((d.kappa - 0.8).abs() < 1e-12, "kappa={}", d.kappa);
        assert!(d.n_bar.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_zero_mean_for_arbitrary_profile() {
        let g = grid();
        let dec = ProfileDecomposer::new(&g);
        let n_r: Vec<f64> = g
            .x
            .iter()
            .map(|x| 30.0 * (x * 0.3).sin() + (x * 1.7).cos() * 4.0 + x * x * 0.01)
            .collect();
        let d = dec.decompose(&n_r).unwrap();
        let mean = d.n_bar.iter().sum::<f64>() / d.n_bar.len() as f64;
        assert!(mean.abs() < 1e-12, "mean={mean}");
    }

    #[test]
    fn test_flat_in_buffer() {
        let g = grid();
        let b = g.buffer;
        let dec = ProfileDecomposer::new(&g);
        let n_r: Vec<f64> = g.x.iter().map(|x| (x * 0.5).sin()).collect();
        let d = dec.decompose(&n_r).unwrap();
        // At and beyond il / ir the perturbation equals the constant offset.
        let left = d.n_bar[0];
        for i in 0..=b.il {
            assert!((d.n_bar[i] - left).abs() < 1e-12);
        }
        for i in b.ir..g.npx {
            assert!((d.n_bar[i] - left).abs() < 1e-12);
        }
    }

    #[test]
    fn test_interior_untouched_up_to_constant() {
        let g = grid();
        let b = g.buffer;
        let dec = ProfileDecomposer::new(&g);
        let n_r: Vec<f64> = g.x.iter().map(|x| 10.0 - 0.2 * x + (x * 0.9).sin()).collect();
        let d = dec.decompose(&n_r).unwrap();
        // Between im1 and im2 the gate is 1, so n_bar = raw - mean.
        let raw = |i: usize| n_r[i] + d.kappa * (g.x[i] - g.x[b.i2]) - n_r[b.i2];
        let shift = raw(b.i1) - d.n_bar[b.i1];
        for i in b.im1..=b.im2 {
            assert!((raw(i) - d.n_bar[i] - shift).abs() < 1e-12, "i={i}");
        }
        assert!((shift - d.mean_offset).abs() < 1e-12);
    }

    #[test]
    fn test_flatten_velocity() {
        let g = grid();
        let dec = ProfileDecomposer::new(&g);
        let u = vec![2.0; g.npx];
        let ub = dec.flatten_velocity(&u);
        assert_eq!(ub[0], 0.0);
        assert_eq!(ub[g.npx / 2], 2.0);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let g = grid();
        let dec = ProfileDecomposer::new(&g);
        assert!(dec.decompose(&[1.0; 3]).is_err());
    }
}
