// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Hybrid State Vector
// ─────────────────────────────────────────────────────────────────────
//! Structured view of the integration variable and its flat encoding.
//!
//! Flat layout, all reals:
//!
//! ```text
//! [ u_r (npx) | n_r (npx) | re,im of φ_k turbulent (T pairs) | re,im of n_k turbulent (T pairs) ]
//! ```
//!
//! Encoding and decoding copy; the flat buffer is never reinterpreted.

use num_complex::Complex64;

use fdhw_spectral::Grid;
use fdhw_types::{FdhwError, FdhwResult};

/// Radial profiles plus turbulent spectral coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// Zonal velocity profile.
    pub u_r: Vec<f64>,
    /// Density profile, background included.
    pub n_r: Vec<f64>,
    /// Potential coefficients on the turbulent modes.
    pub phik_turb: Vec<Complex64>,
    /// Density coefficients on the turbulent modes.
    pub nk_turb: Vec<Complex64>,
}

impl State {
    /// All-zero state for a layout.
    pub fn zeros(layout: &StateLayout) -> Self {
        Self {
            u_r: vec![0.0; layout.npx],
            n_r: vec![0.0; layout.npx],
            phik_turb: vec![Complex64::default(); layout.n_turb],
            nk_turb: vec![Complex64::default(); layout.n_turb],
        }
    }
}

/// Sizes of the flat buffer for one grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateLayout {
    pub npx: usize,
    pub n_turb: usize,
}

impl StateLayout {
    pub fn new(grid: &Grid) -> Self {
        Self {
            npx: grid.npx,
            n_turb: grid.turbulent_count(),
        }
    }

    /// Number of reals in the flat buffer.
    pub fn len(&self) -> usize {
        2 * self.npx + 4 * self.n_turb
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn decode(&self, flat: &[f64]) -> FdhwResult<State> {
        if flat.len() != self.len() {
            return Err(FdhwError::StateLayout {
                expected: self.len(),
                found: flat.len(),
            });
        }
        let (npx, t) = (self.npx, self.n_turb);
        let (radial, spectral) = flat.split_at(2 * npx);
        let (phi, n) = spectral.split_at(2 * t);
        let pairs = |s: &[f64]| -> Vec<Complex64> {
            s.chunks_exact(2).map(|c| Complex64::new(c[0], c[1])).collect()
        };
        Ok(State {
            u_r: radial[..npx].to_vec(),
            n_r: radial[npx..].to_vec(),
            phik_turb: pairs(phi),
            nk_turb: pairs(n),
        })
    }

    /// Check that every field of `state` has this layout's length.
    pub fn check(&self, state: &State) -> FdhwResult<()> {
        let lens = [
            (state.u_r.len(), self.npx),
            (state.n_r.len(), self.npx),
            (state.phik_turb.len(), self.n_turb),
            (state.nk_turb.len(), self.n_turb),
        ];
        match lens.iter().find(|(f, e)| f != e) {
            Some(&(found, expected)) => Err(FdhwError::StateLayout { expected, found }),
            None => Ok(()),
        }
    }

    pub fn encode(&self, state: &State) -> FdhwResult<Vec<f64>> {
        self.check(state)?;
        let mut flat = Vec::with_capacity(self.len());
        flat.extend_from_slice(&state.u_r);
        flat.extend_from_slice(&state.n_r);
        for c in state.phik_turb.iter().chain(&state.nk_turb) {
            flat.push(c.re);
            flat.push(c.im);
        }
        Ok(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StateLayout {
        StateLayout { npx: 4, n_turb: 3 }
    }

    fn sample() -> State {
        State {
            u_r: vec![0.1, 0.2, 0.3, 0.4],
            n_r: vec![4.0, 3.0, 2.0, 1.0],
            phik_turb: vec![
                Complex64::new(1.0, -1.0),
                Complex64::new(2.0, -2.0),
                Complex64::new(3.0, -3.0),
            ],
            nk_turb: vec![
                Complex64::new(-1.0, 0.5),
                Complex64::new(0.0, 0.0),
                Complex64::new(1e-9, 7.0),
            ],
        }
    }

    #[test]
    fn test_layout_length() {
        assert_eq!(layout().len(), 2 * 4 + 4 * 3);
    }

    #[test]
    fn test_encode_positions() {
        let flat = layout().encode(&sample()).unwrap();
        assert_eq!(&flat[..4], &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(&flat[4..8], &[4.0, 3.0, 2.0, 1.0]);
        assert_eq!(&flat[8..10], &[1.0, -1.0]);
        assert_eq!(&flat[14..16], &[-1.0, 0.5]);
        assert_eq!(flat[19], 7.0);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let s = sample();
        let back = layout().decode(&layout().encode(&s).unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_wrong_flat_length_rejected() {
        assert_eq!(
            layout().decode(&[0.0; 5]),
            Err(FdhwError::StateLayout {
                expected: 20,
                found: 5
            })
        );
    }

    #[test]
    fn test_wrong_field_length_rejected() {
        let mut s = sample();
        s.nk_turb.pop();
        assert!(matches!(
            layout().encode(&s),
            Err(FdhwError::StateLayout { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_zeros() {
        let z = State::zeros(&layout());
        assert_eq!(layout().encode(&z).unwrap(), vec![0.0; 20]);
    }
}
