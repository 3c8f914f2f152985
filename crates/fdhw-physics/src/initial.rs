// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Initial Condition
// ─────────────────────────────────────────────────────────────────────
//! Background profiles and the random-phase spectral seed.
//!
//! Seed amplitude on integer wavenumbers (lkx, lky):
//!
//!   A · exp(-(lkx² + lky²) / (2w²)) · exp(2πi·U[0, 1))
//!
//! with independent phases for φ_k and n_k, kept on turbulent modes only.

use std::f64::consts::TAU;

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fdhw_spectral::Grid;
use fdhw_types::{DensityProfile, InitialCondition};

use crate::state::State;

/// Initial `(u_r0, n_r0)`: flat velocity and the chosen density shape.
pub fn background_profiles(grid: &Grid, profile: DensityProfile) -> (Vec<f64>, Vec<f64>) {
    let lx = grid.lx;
    let u_r0 = vec![0.0; grid.npx];
    let n_r0 = grid
        .x
        .iter()
        .map(|&x| match profile {
            DensityProfile::Tanh => lx * (((1.0 - 1.5 * x / lx) * 4.0).tanh() / 2.0 + 0.75),
            DensityProfile::Linear => lx - x,
        })
        .collect();
    (u_r0, n_r0)
}

/// Random-phase `(φ_k, n_k)` on the turbulent modes.
pub fn spectral_seed(grid: &Grid, ic: &InitialCondition) -> (Vec<Complex64>, Vec<Complex64>) {
    let mut rng = StdRng::seed_from_u64(ic.seed);
    let w2 = 2.0 * ic.spectral_width * ic.spectral_width;
    let envelope: Vec<f64> = grid
        .lkx
        .iter()
        .zip(&grid.lky)
        .map(|(&kx, &ky)| ic.spectral_amplitude * (-((kx * kx + ky * ky) as f64) / w2).exp())
        .collect();

    let draw = |rng: &mut StdRng| -> Vec<Complex64> {
        envelope
            .iter()
            .map(|&a| Complex64::from_polar(a, TAU * rng.gen::<f64>()))
            .collect()
    };
    let phik = draw(&mut rng);
    let nk = draw(&mut rng);

    (
        grid.turbulent.iter().map(|&m| phik[m]).collect(),
        grid.turbulent.iter().map(|&m| nk[m]).collect(),
    )
}

/// Complete initial state of a run.
pub fn initial_state(grid: &Grid, ic: &InitialCondition) -> State {
    let (u_r, n_r) = background_profiles(grid, ic.density_profile);
    let (phik_turb, nk_turb) = spectral_seed(grid, ic);
    State {
        u_r,
        n_r,
        phik_turb,
        nk_turb,
    }
}
