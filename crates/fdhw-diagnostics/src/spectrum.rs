// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Padded Half-Spectrum
// ─────────────────────────────────────────────────────────────────────
//! Storage layout for saved fields: an `nx × (ny/2 + 1)` complex array
//! indexed by (kx row, ky column), negative kx in the upper rows, with
//! the ky = 0 negative-kx entries holding the conjugates of the positive
//! ones. The Nyquist row and column stay zero.

use std::f64::consts::TAU;

use ndarray::{s, Array2};
use num_complex::Complex64;

use fdhw_spectral::Grid;
use fdhw_types::{FdhwError, FdhwResult};

/// Wavenumber tables and scatter map of the padded layout.
#[derive(Debug, Clone)]
pub struct PaddedSpectrum {
    nx: usize,
    ncol: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    pub kxp: Array2<f64>,
    pub kyp: Array2<f64>,
    pub ksqrp: Array2<f64>,
}

impl PaddedSpectrum {
    pub fn new(grid: &Grid) -> Self {
        let (nx, hx) = (grid.nx, grid.nx / 2);
        let ncol = grid.ny / 2 + 1;
        let (dkx, dky) = (TAU / grid.lx, TAU / grid.ly);

        let rows = grid
            .lkx
            .iter()
            .map(|&k| if k >= 0 { k as usize } else { (nx as i64 + k) as usize })
            .collect();
        let cols = grid.lky.iter().map(|&k| k as usize).collect();

        let kxp = Array2::from_shape_fn((nx, ncol), |(r, _)| {
            let k = if r <= hx { r as f64 } else { r as f64 - nx as f64 };
            k * dkx
        });
        let kyp = Array2::from_shape_fn((nx, ncol), |(_, c)| c as f64 * dky);
        let ksqrp = &kxp * &kxp + &kyp * &kyp;

        Self {
            nx,
            ncol,
            rows,
            cols,
            kxp,
            kyp,
            ksqrp,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ncol)
    }

    /// Compact mode vector → padded array with the conjugate ky = 0 rows.
    pub fn scatter(&self, modes: &[Complex64]) -> FdhwResult<Array2<Complex64>> {
        if modes.len() != self.rows.len() {
            return Err(FdhwError::TransformConsistency {
                context: "padded scatter",
                expected: self.rows.len(),
                found: modes.len(),
            });
        }
        let mut out = Array2::<Complex64>::zeros((self.nx, self.ncol));
        for ((&r, &c), &v) in self.rows.iter().zip(&self.cols).zip(modes) {
            out[[r, c]] = v;
        }
        for kx in 1..self.nx / 2 {
            out[[self.nx - kx, 0]] = out[[kx, 0]].conj();
        }
        Ok(out)
    }
}

/// Full padded fields plus radial profiles at one time.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSnapshot {
    pub t: f64,
    pub phik: Array2<Complex64>,
    pub nk: Array2<Complex64>,
    pub u_r: Vec<f64>,
    pub n_r: Vec<f64>,
}

/// The first few ky columns of a [`FieldSnapshot`]: every zonal mode and
/// the large-scale turbulent ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedSnapshot {
    pub t: f64,
    pub phik: Array2<Complex64>,
    pub nk: Array2<Complex64>,
}

impl FieldSnapshot {
    /// Keep `n_ky` columns (clamped to the available ones).
    pub fn reduced(&self, n_ky: usize) -> ReducedSnapshot {
        let n = n_ky.min(self.phik.ncols());
        ReducedSnapshot {
            t: self.t,
            phik: self.phik.slice(s![.., ..n]).to_owned(),
            nk: self.nk.slice(s![.., ..n]).to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use fdhw_types::{BufferConfig, GridConfig};

    use super::*;

    fn grid() -> Grid {
        let cfg = GridConfig {
            npx: 32,
            npy: 32,
            lx: 32.0 * PI,
            ly: 16.0 * PI,
        };
        Grid::new(&cfg, &BufferConfig::for_resolution(32, cfg.lx)).unwrap()
    }

    #[test]
    fn test_shape_is_half_spectrum() {
        let g = grid();
        assert_eq!(PaddedSpectrum::new(&g).shape(), (g.nx, g.ny / 2 + 1));
    }

    #[test]
    fn test_modes_land_on_matching_wavenumbers() {
        let g = grid();
        let p = PaddedSpectrum::new(&g);
        let modes: Vec<Complex64> = (0..g.mode_count())
            .map(|m| Complex64::new(m as f64 + 1.0, -(m as f64)))
            .collect();
        let out = p.scatter(&modes).unwrap();
        for (m, v) in modes.iter().enumerate() {
            let hit = out
                .indexed_iter()
                .filter(|(_, c)| **c == *v)
                .map(|(idx, _)| idx)
                .collect::<Vec<_>>();
            assert_eq!(hit.len(), 1, "mode {m} placed {} times", hit.len());
            let (r, c) = hit[0];
            assert!((p.kxp[[r, c]] - g.kx[m]).abs() < 1e-12, "kx of mode {m}");
            assert!((p.kyp[[r, c]] - g.ky[m]).abs() < 1e-12, "ky of mode {m}");
            assert!((p.ksqrp[[r, c]] - g.ksqr[m]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_conjugate_rows_and_empty_nyquist() {
        let g = grid();
        let p = PaddedSpectrum::new(&g);
        let modes = vec![Complex64::new(1.0, 2.0); g.mode_count()];
        let out = p.scatter(&modes).unwrap();
        let hx = g.nx / 2;
        for kx in 1..hx {
            assert_eq!(out[[g.nx - kx, 0]], out[[kx, 0]].conj());
        }
        assert!(out.row(hx).iter().all(|c| *c == Complex64::default()));
        assert!(out.column(g.ny / 2).iter().all(|c| *c == Complex64::default()));
        assert_eq!(out[[0, 0]], Complex64::default());
    }

    #[test]
    fn test_scatter_rejects_wrong_length() {
        let p = PaddedSpectrum::new(&grid());
        assert!(p.scatter(&[Complex64::default(); 3]).is_err());
    }

    #[test]
    fn test_reduced_keeps_leading_columns() {
        let g = grid();
        let p = PaddedSpectrum::new(&g);
        let modes = vec![Complex64::new(0.5, 0.0); g.mode_count()];
        let phik = p.scatter(&modes).unwrap();
        let snap = FieldSnapshot {
            t: 1.0,
            nk: phik.clone(),
            phik,
            u_r: vec![0.0; g.npx],
            n_r: vec![0.0; g.npx],
        };
        let red = snap.reduced(4);
        assert_eq!(red.phik.dim(), (g.nx, 4));
        assert_eq!(red.phik.column(3), snap.phik.column(3));
        assert_eq!(snap.reduced(100).phik.ncols(), g.ny / 2 + 1);
    }
}
