// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Gate Functions
// ─────────────────────────────────────────────────────────────────────
//! Smooth masks for the buffer zones.
//!
//!   bump(y) = exp(-1/y) for y > 0, else 0
//!   jump(y) = bump(y) / (bump(y) + bump(1-y)), clamped to 0/1 outside (0, 1)
//!
//! `smooth_gate` is exactly 1 on [x_i1, x_i2], exactly 0 outside
//! (x_il, x_ir), with `jump` transitions in between.

use ndarray::Array2;

use fdhw_spectral::Grid;

/// C^∞ function, identically zero for y ≤ 0.
#[inline]
pub fn bump(y: f64) -> f64 {
    if y > 0.0 {
        (-1.0 / y).exp()
    } else {
        0.0
    }
}

/// Smooth monotone step from 0 (y ≤ 0) to 1 (y ≥ 1).
#[inline]
pub fn jump(y: f64) -> f64 {
    if y <= 0.0 {
        0.0
    } else if y >= 1.0 {
        1.0
    } else {
        let a = bump(y);
        a / (a + bump(1.0 - y))
    }
}

/// Gate over the samples `x`: 0 up to `il`, rising to 1 at `i1`,
/// flat until `i2`, falling to 0 at `ir`.
pub fn smooth_gate(x: &[f64], il: usize, i1: usize, i2: usize, ir: usize) -> Vec<f64> {
    debug_assert!(il < i1 && i1 <= i2 && i2 < ir && ir < x.len());
    let (xl, x1, x2, xr) = (x[il], x[i1], x[i2], x[ir]);
    x.iter()
        .enumerate()
        .map(|(i, &xi)| {
            if i <= il || i >= ir {
                0.0
            } else if i < i1 {
                jump((xi - xl) / (x1 - xl))
            } else if i <= i2 {
                1.0
            } else {
                jump((xr - xi) / (xr - x2))
            }
        })
        .collect()
}

/// Fixed masks of a run, built once from the grid.
#[derive(Debug, Clone)]
pub struct GateSet {
    /// 1 in the physical domain, smoothly 0 in the buffers.
    pub psi_1d: Vec<f64>,
    /// `1 - psi_1d` broadcast along y, the region where fluctuations are
    /// penalised.
    pub outside_2d: Array2<f64>,
    /// 1 only in the left buffer.
    pub h1: Vec<f64>,
    /// 1 only in the right buffer.
    pub h2: Vec<f64>,
}

impl GateSet {
    pub fn new(grid: &Grid) -> Self {
        let b = grid.buffer;
        let x = &grid.x;
        let psi_1d = smooth_gate(x, b.il, b.i1, b.i2, b.ir);
        let outside_2d = Array2::from_shape_fn((grid.npx, grid.npy), |(i, _)| 1.0 - psi_1d[i]);
        let h1 = psi_1d
            .iter()
            .enumerate()
            .map(|(i, p)| if i < b.i1 { 1.0 - p } else { 0.0 })
            .collect();
        let h2 = psi_1d
            .iter()
            .enumerate()
            .map(|(i, p)| if i > b.i2 { 1.0 - p } else { 0.0 })
            .collect();
        Self {
            psi_1d,
            outside_2d,
            h1,
            h2,
        }
    }
}
