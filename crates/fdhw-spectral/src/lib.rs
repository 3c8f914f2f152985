// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Spectral Discretisation
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Dealiased pseudo-spectral discretisation of a box that is periodic
//! in both directions, with a buffer zone carved out of the radial axis.
//!
//! Architecture:
//!   - Grid: real-space axes, compact mode set (2/3 rule), zonal and
//!     turbulent index partition, resolved buffer indices
//!   - SpectralTransform: forward/inverse 2D and 1D transforms between
//!     real arrays and the compact mode vector, forward-normalised

pub mod grid;
pub mod transform;

pub use grid::{BufferIndices, Grid};
pub use transform::SpectralTransform;
