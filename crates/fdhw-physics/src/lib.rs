// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Physics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Flux-driven Hasegawa-Wakatani physics: buffer gates, zonal profile
//! decomposition, the hybrid state layout, and the right-hand side
//! handed to the time integrator.
//!
//! Per evaluation:
//!   1. Decode the flat state into radial profiles + turbulent modes
//!   2. Decompose the density profile (zonal part, background gradient)
//!   3. Rebuild the full mode vectors from profiles and turbulent modes
//!   4. Nonlinear E×B terms in real space, back to modes
//!   5. Linear drive, dissipation and penalisation on ky > 0
//!   6. Zonal derivatives → radial profile derivatives
//!   7. Buffer friction, boundary sources and restoring force
//!   8. Encode the derivative

pub mod gates;
pub mod initial;
pub mod integrator;
pub mod profile;
pub mod rhs;
pub mod state;

pub use gates::{bump, jump, smooth_gate, GateSet};
pub use initial::{background_profiles, initial_state, spectral_seed};
pub use integrator::{OdeSystem, Rk4Integrator, ScheduledHook};
pub use profile::{Decomposition, ProfileDecomposer};
pub use rhs::{ModeBundle, RhsEvaluator};
pub use state::{State, StateLayout};
