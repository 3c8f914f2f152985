// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Spectral Transforms
// ─────────────────────────────────────────────────────────────────────
//! Forward/inverse transforms between real arrays and the compact
//! dealiased mode vector of a [`Grid`].
//!
//! Normalisation is "forward": the forward transform carries 1/N and
//! the inverse is unscaled, so a retained coefficient c at (kx, ky)
//! contributes `c·e^{i(kx·x + ky·y)} + c.c.` to the real field.
//!
//! Plans are built once and shared; every call allocates its own
//! buffers, so a transform is safe to use from several threads.

use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use fdhw_types::{FdhwError, FdhwResult};

use crate::grid::Grid;

/// Pseudo-spectral transform pair bound to one grid.
pub struct SpectralTransform {
    npx: usize,
    npy: usize,
    /// hx = nx/2, hy = ny/2.
    hx: usize,
    hy: usize,
    /// Half-spectrum row of each retained mode (kx mod npx).
    mode_rows: Vec<usize>,
    /// Half-spectrum column of each retained mode (ky ≥ 0).
    mode_cols: Vec<usize>,
    n_zonal: usize,
    fft_x: Arc<dyn Fft<f64>>,
    ifft_x: Arc<dyn Fft<f64>>,
    fft_y: Arc<dyn Fft<f64>>,
    ifft_y: Arc<dyn Fft<f64>>,
}

impl SpectralTransform {
    pub fn new(grid: &Grid) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let npx = grid.npx;
        let mode_rows = grid
            .lkx
            .iter()
            .map(|&k| k.rem_euclid(npx as i64) as usize)
            .collect();
        let mode_cols = grid.lky.iter().map(|&k| k as usize).collect();
        Self {
            npx,
            npy: grid.npy,
            hx: grid.nx / 2,
            hy: grid.ny / 2,
            mode_rows,
            mode_cols,
            n_zonal: grid.zonal_count(),
            fft_x: planner.plan_fft_forward(npx),
            ifft_x: planner.plan_fft_inverse(npx),
            fft_y: planner.plan_fft_forward(grid.npy),
            ifft_y: planner.plan_fft_inverse(grid.npy),
        }
    }

    pub fn mode_count(&self) -> usize {
        self.mode_rows.len()
    }

    /// 2D real-to-complex transform truncated to the retained modes.
    ///
    /// `(npx, npy)` real field → compact mode vector.
    pub fn forward2d(&self, field: &Array2<f64>) -> FdhwResult<Vec<Complex64>> {
        let (npx, npy) = (self.npx, self.npy);
        if field.dim() != (npx, npy) {
            return Err(FdhwError::TransformConsistency {
                context: "forward2d",
                expected: npx * npy,
                found: field.len(),
            });
        }

        // Along y, keeping only the retained ky columns.
        let mut half = Array2::<Complex64>::zeros((npx, self.hy));
        let mut row_buf = vec![Complex64::default(); npy];
        for (i, row) in field.outer_iter().enumerate() {
            for (b, &v) in row_buf.iter_mut().zip(row.iter()) {
                *b = Complex64::new(v, 0.0);
            }
            self.fft_y.process(&mut row_buf);
            for ky in 0..self.hy {
                half[[i, ky]] = row_buf[ky];
            }
        }

        // Along x, column by column.
        let mut col_buf = vec![Complex64::default(); npx];
        for ky in 0..self.hy {
            for (i, b) in col_buf.iter_mut().enumerate() {
                *b = half[[i, ky]];
            }
            self.fft_x.process(&mut col_buf);
            for (i, &b) in col_buf.iter().enumerate() {
                half[[i, ky]] = b;
            }
        }

        let scale = 1.0 / (npx * npy) as f64;
        Ok(self
            .mode_rows
            .iter()
            .zip(&self.mode_cols)
            .map(|(&r, &c)| half[[r, c]] * scale)
            .collect())
    }

    /// Inverse of [`forward2d`](Self::forward2d): zero-pads discarded modes,
    /// restores the conjugate ky = 0 rows, returns the `(npx, npy)` real field.
    pub fn inverse2d(&self, modes: &[Complex64]) -> FdhwResult<Array2<f64>> {
        let (npx, npy) = (self.npx, self.npy);
        if modes.len() != self.mode_count() {
            return Err(FdhwError::TransformConsistency {
                context: "inverse2d",
                expected: self.mode_count(),
                found: modes.len(),
            });
        }

        let mut half = Array2::<Complex64>::zeros((npx, self.hy));
        for ((&r, &c), &v) in self.mode_rows.iter().zip(&self.mode_cols).zip(modes) {
            half[[r, c]] = v;
        }
        for kx in 1..self.hx {
            half[[npx - kx, 0]] = half[[kx, 0]].conj();
        }

        let mut col_buf = vec![Complex64::default(); npx];
        for ky in 0..self.hy {
            for (i, b) in col_buf.iter_mut().enumerate() {
                *b = half[[i, ky]];
            }
            self.ifft_x.process(&mut col_buf);
            for (i, &b) in col_buf.iter().enumerate() {
                half[[i, ky]] = b;
            }
        }

        // Hermitian extension along y; the Nyquist column is never retained.
        let mut out = Array2::<f64>::zeros((npx, npy));
        let mut row_buf = vec![Complex64::default(); npy];
        for (i, mut row) in out.outer_iter_mut().enumerate() {
            row_buf.fill(Complex64::default());
            row_buf[0] = Complex64::new(half[[i, 0]].re, 0.0);
            for ky in 1..self.hy {
                row_buf[ky] = half[[i, ky]];
                row_buf[npy - ky] = half[[i, ky]].conj();
            }
            self.ifft_y.process(&mut row_buf);
            for (o, b) in row.iter_mut().zip(&row_buf) {
                *o = b.re;
            }
        }
        Ok(out)
    }

    /// 1D real-to-complex transform of a radial profile, keeping the
    /// non-mean modes kx = 1 .. hx-1 (the zonal slice).
    pub fn forward1d(&self, profile: &[f64]) -> FdhwResult<Vec<Complex64>> {
        if profile.len() != self.npx {
            return Err(FdhwError::TransformConsistency {
                context: "forward1d",
                expected: self.npx,
                found: profile.len(),
            });
        }
        let mut buf: Vec<Complex64> = profile.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.fft_x.process(&mut buf);
        let scale = 1.0 / self.npx as f64;
        Ok(buf[1..self.hx].iter().map(|&c| c * scale).collect())
    }

    /// Inverse of [`forward1d`](Self::forward1d): zonal slice → real profile.
    pub fn inverse1d(&self, zonal: &[Complex64]) -> FdhwResult<Vec<f64>> {
        if zonal.len() != self.n_zonal {
            return Err(FdhwError::TransformConsistency {
                context: "inverse1d",
                expected: self.n_zonal,
                found: zonal.len(),
            });
        }
        let npx = self.npx;
        let mut buf = vec![Complex64::default(); npx];
        for (k, &c) in zonal.iter().enumerate().map(|(j, c)| (j + 1, c)) {
            buf[k] = c;
            buf[npx - k] = c.conj();
        }
        self.ifft_x.process(&mut buf);
        Ok(buf.iter().map(|c| c.re).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{PI, TAU};

    use fdhw_types::{BufferConfig, GridConfig};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn grid(npx: usize, npy: usize) -> Grid {
        let cfg = GridConfig {
            npx,
            npy,
            lx: 32.0 * PI,
            ly: 20.0 * PI,
        };
        let buffer = BufferConfig {
            il: 1,
            im1: 2,
            i1: 4,
            i2: -5,
            im2: -3,
            ir: -2,
            mupen: 1e2,
            sig_s: 5.0,
        };
        Grid::new(&cfg, &buffer).unwrap()
    }

    fn random_modes(n: usize, seed: u64) -> Vec<Complex64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect()
    }

    fn max_abs_diff(a: &[Complex64], b: &[Complex64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (*x - *y).norm()).fold(0.0, f64::max)
    }

    #[test]
    fn test_single_mode_normalisation() {
        let g = grid(32, 24);
        let t = SpectralTransform::new(&g);
        // cos(2π(2i/npx + 1j/npy)) = ½e^{iθ} + c.c.
        let field = Array2::from_shape_fn((32, 24), |(i, j)| {
            (TAU * (2.0 * i as f64 / 32.0 + j as f64 / 24.0)).cos()
        });
        let modes = t.forward2d(&field).unwrap();
        for (m, c) in modes.iter().enumerate() {
            let expected = if g.lkx[m] == 2 && g.lky[m] == 1 { 0.5 } else { 0.0 };
            assert!(
                (*c - Complex64::new(expected, 0.0)).norm() < 1e-12,
                "mode ({}, {}) = {c}",
                g.lkx[m],
                g.lky[m]
            );
        }
    }

    #[test]
    fn test_roundtrip_modes_2d() {
        let g = grid(32, 32);
        let t = SpectralTransform::new(&g);
        let modes = random_modes(g.mode_count(), 7);
        let field = t.inverse2d(&modes).unwrap();
        let back = t.forward2d(&field).unwrap();
        assert!(max_abs_diff(&modes, &back) < 1e-12);
    }

    #[test]
    fn test_roundtrip_field_2d() {
        let g = grid(32, 24);
        let t = SpectralTransform::new(&g);
        // Field built only from resolvable frequencies.
        let field = Array2::from_shape_fn((32, 24), |(i, j)| {
            let x = TAU * i as f64 / 32.0;
            let y = TAU * j as f64 / 24.0;
            (3.0 * x).sin() + 0.5 * (x - 2.0 * y).cos() + 0.25 * (5.0 * y).sin()
        });
        let back = t.inverse2d(&t.forward2d(&field).unwrap()).unwrap();
        let err = (&back - &field).mapv(f64::abs).fold(0.0, |a: f64, &b| a.max(b));
        assert!(err < 1e-12, "roundtrip error {err}");
    }

    #[test]
    fn test_inverse_is_real_and_hermitian_consistent() {
        let g = grid(32, 32);
        let t = SpectralTransform::new(&g);
        let mut modes = vec![Complex64::default(); g.mode_count()];
        let z = g.zonal[2]; // kx = 3, ky = 0
        modes[z] = Complex64::new(0.0, -0.5);
        let field = t.inverse2d(&modes).unwrap();
        // -½i·e^{ikx} + c.c. = sin(kx), constant in y
        for i in 0..32 {
            let expected = (TAU * 3.0 * i as f64 / 32.0).sin();
            for j in 0..32 {
                assert!((field[[i, j]] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_linearity_2d() {
        let g = grid(32, 32);
        let t = SpectralTransform::new(&g);
        let mut rng = StdRng::seed_from_u64(3);
        let f = Array2::from_shape_fn((32, 32), |_| rng.gen_range(-1.0..1.0));
        let h = Array2::from_shape_fn((32, 32), |_| rng.gen_range(-1.0..1.0));
        let (a, b) = (2.5, -0.75);
        let lhs = t.forward2d(&(&f * a + &h * b)).unwrap();
        let ff = t.forward2d(&f).unwrap();
        let fh = t.forward2d(&h).unwrap();
        let rhs: Vec<Complex64> = ff.iter().zip(&fh).map(|(x, y)| *x * a + *y * b).collect();
        assert!(max_abs_diff(&lhs, &rhs) < 1e-12);
    }

    #[test]
    fn test_high_frequencies_discarded() {
        let g = grid(32, 32);
        let t = SpectralTransform::new(&g);
        // kx = 12 and ky = 11 are both beyond the hx = hy = 10 cutoff.
        let field = Array2::from_shape_fn((32, 32), |(i, j)| {
            (TAU * 12.0 * i as f64 / 32.0).cos() + (TAU * 11.0 * j as f64 / 32.0).sin()
        });
        let modes = t.forward2d(&field).unwrap();
        assert!(modes.iter().all(|c| c.norm() < 1e-12));
    }

    #[test]
    fn test_roundtrip_1d() {
        let g = grid(32, 32);
        let t = SpectralTransform::new(&g);
        let zonal = random_modes(g.zonal_count(), 11);
        let profile = t.inverse1d(&zonal).unwrap();
        assert_eq!(profile.len(), 32);
        let back = t.forward1d(&profile).unwrap();
        assert!(max_abs_diff(&zonal, &back) < 1e-12);
    }

    #[test]
    fn test_forward1d_drops_mean_and_matches_2d() {
        let g = grid(32, 32);
        let t = SpectralTransform::new(&g);
        let profile: Vec<f64> = (0..32)
            .map(|i| 4.0 + (TAU * 2.0 * i as f64 / 32.0).cos())
            .collect();
        let zonal = t.forward1d(&profile).unwrap();
        assert!((zonal[1] - Complex64::new(0.5, 0.0)).norm() < 1e-12);
        let field = Array2::from_shape_fn((32, 32), |(i, _)| profile[i]);
        let modes = t.forward2d(&field).unwrap();
        for (j, &m) in g.zonal.iter().enumerate() {
            assert!((modes[m] - zonal[j]).norm() < 1e-12);
        }
    }

    #[test]
    fn test_length_mismatch_is_consistency_error() {
        let g = grid(32, 32);
        let t = SpectralTransform::new(&g);
        assert!(matches!(
            t.inverse2d(&[Complex64::default(); 3]),
            Err(FdhwError::TransformConsistency { context: "inverse2d", .. })
        ));
        assert!(t.forward1d(&[0.0; 31]).is_err());
        assert!(t.inverse1d(&[Complex64::default(); 4]).is_err());
        assert!(t.forward2d(&Array2::zeros((32, 30))).is_err());
    }
}
