// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Grid
// ─────────────────────────────────────────────────────────────────────
//! Real-space axes, wavenumbers of the dealiased mode set, and the
//! zonal/turbulent partition.
//!
//! With `hx = nx/2`, `hy = ny/2` the compact mode vector is laid out as
//! three blocks, ky running fastest inside each kx row:
//!
//!   1. kx = 0,                ky = 1 .. hy-1
//!   2. kx = 1 .. hx-1,        ky = 0 .. hy-1
//!   3. kx = -(hx-1) .. -1,    ky = 1 .. hy-1
//!
//! The (0, 0) mean is absent, so k² > 0 on every retained mode. Modes
//! with ky = 0 live only in block 2; they are the zonal modes.

use std::f64::consts::TAU;

use fdhw_types::{BufferConfig, FdhwError, FdhwResult, GridConfig, SimulationConfig};

/// Buffer indices resolved to absolute radial positions.
///
/// Invariant: `il < im1 < i1 < i2 < im2 < ir < npx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferIndices {
    pub il: usize,
    pub im1: usize,
    pub i1: usize,
    pub i2: usize,
    pub im2: usize,
    pub ir: usize,
}

impl BufferIndices {
    /// Resolve signed offsets against an axis of length `n` and check ordering.
    pub fn resolve(buffer: &BufferConfig, n: usize) -> FdhwResult<Self> {
        let idx = Self {
            il: resolve_index("il", buffer.il, n)?,
            im1: resolve_index("im1", buffer.im1, n)?,
            i1: resolve_index("i1", buffer.i1, n)?,
            i2: resolve_index("i2", buffer.i2, n)?,
            im2: resolve_index("im2", buffer.im2, n)?,
            ir: resolve_index("ir", buffer.ir, n)?,
        };
        let ordered = [idx.il, idx.im1, idx.i1, idx.i2, idx.im2, idx.ir];
        if ordered.windows(2).any(|w| w[0] >= w[1]) {
            return Err(FdhwError::Configuration(format!(
                "buffer indices must satisfy il < im1 < i1 < i2 < im2 < ir, got {ordered:?} (npx={n})"
            )));
        }
        Ok(idx)
    }
}

fn resolve_index(name: &str, offset: i64, n: usize) -> FdhwResult<usize> {
    let abs = if offset < 0 { n as i64 + offset } else { offset };
    if abs < 0 || abs >= n as i64 {
        return Err(FdhwError::Configuration(format!(
            "buffer index {name}={offset} is out of range for npx={n}"
        )));
    }
    Ok(abs as usize)
}

/// Immutable discretisation shared by every RHS evaluation.
#[derive(Debug, Clone)]
pub struct Grid {
    pub npx: usize,
    pub npy: usize,
    pub lx: f64,
    pub ly: f64,
    /// Dealiased resolution: largest even number ≤ 2/3 of the padded one.
    pub nx: usize,
    pub ny: usize,
    /// Radial sample positions `i·lx/npx`.
    pub x: Vec<f64>,
    /// Integer wavenumbers of each retained mode.
    pub lkx: Vec<i64>,
    pub lky: Vec<i64>,
    /// Physical wavenumbers of each retained mode.
    pub kx: Vec<f64>,
    pub ky: Vec<f64>,
    pub ksqr: Vec<f64>,
    /// Positions of the ky = 0 modes, ordered by increasing kx > 0.
    pub zonal: Vec<usize>,
    /// Every other position, ascending.
    pub turbulent: Vec<usize>,
    /// `kx` restricted to `zonal`.
    pub kx_zonal: Vec<f64>,
    pub buffer: BufferIndices,
}

impl Grid {
    /// Build the grid; fails on ill-ordered buffer indices or bad resolution.
    pub fn new(grid: &GridConfig, buffer: &BufferConfig) -> FdhwResult<Self> {
        let GridConfig { npx, npy, lx, ly } = *grid;
        if npx < 8 || npy < 8 || npx % 2 != 0 || npy % 2 != 0 {
            return Err(FdhwError::Configuration(format!(
                "resolution must be even and >= 8 in both directions, got {npx}x{npy}"
            )));
        }
        if !(lx.is_finite() && lx > 0.0 && ly.is_finite() && ly > 0.0) {
            return Err(FdhwError::Configuration(format!(
                "box size must be finite and positive, got {lx}x{ly}"
            )));
        }
        let buffer = BufferIndices::resolve(buffer, npx)?;

        let nx = 2 * (npx / 3);
        let ny = 2 * (npy / 3);
        let (lkx, lky) = dealiased_modes(nx, ny);
        let (dkx, dky) = (TAU / lx, TAU / ly);
        let kx: Vec<f64> = lkx.iter().map(|&k| k as f64 * dkx).collect();
        let ky: Vec<f64> = lky.iter().map(|&k| k as f64 * dky).collect();
        let ksqr: Vec<f64> = kx.iter().zip(&ky).map(|(a, b)| a * a + b * b).collect();

        let (zonal, turbulent): (Vec<usize>, Vec<usize>) =
            (0..lkx.len()).partition(|&m| lky[m] == 0);
        let kx_zonal = zonal.iter().map(|&m| kx[m]).collect();

        let x = (0..npx).map(|i| i as f64 * lx / npx as f64).collect();

        log::info!(
            "grid {npx}x{npy} (dealiased {nx}x{ny}): {} modes, {} zonal, buffer {:?}",
            lkx.len(),
            zonal.len(),
            buffer
        );

        Ok(Self {
            npx,
            npy,
            lx,
            ly,
            nx,
            ny,
            x,
            lkx,
            lky,
            kx,
            ky,
            ksqr,
            zonal,
            turbulent,
            kx_zonal,
            buffer,
        })
    }

    /// Validate the configuration and build its grid.
    pub fn from_config(config: &SimulationConfig) -> FdhwResult<Self> {
        config.validate()?;
        Self::new(&config.grid, &config.buffer())
    }

    /// Number of retained modes.
    pub fn mode_count(&self) -> usize {
        self.kx.len()
    }

    pub fn zonal_count(&self) -> usize {
        self.zonal.len()
    }

    pub fn turbulent_count(&self) -> usize {
        self.turbulent.len()
    }
}

/// Integer wavenumbers `(lkx, lky)` of the compact mode set, in storage order.
pub fn dealiased_modes(nx: usize, ny: usize) -> (Vec<i64>, Vec<i64>) {
    let hx = (nx / 2) as i64;
    let hy = (ny / 2) as i64;
    let mut lkx = Vec::new();
    let mut lky = Vec::new();

    for ky in 1..hy {
        lkx.push(0);
        lky.push(ky);
    }
    for kx in 1..hx {
        for ky in 0..hy {
            lkx.push(kx);
            lky.push(ky);
        }
    }
    for kx in -(hx - 1)..0 {
        for ky in 1..hy {
            lkx.push(kx);
            lky.push(ky);
        }
    }
    (lkx, lky)
}
