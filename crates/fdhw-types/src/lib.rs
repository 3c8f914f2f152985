// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! flux-driven Hasegawa-Wakatani kernel.

pub mod config;
pub mod error;
pub mod records;

pub use config::{
    BufferConfig, DensityProfile, GridConfig, InitialCondition, PhysicsParams, SimulationConfig,
    TimeConfig,
};
pub use error::{FdhwError, FdhwResult};
pub use records::{EnergyRecord, FluxRecord, ProfileRecord, ProgressRecord};
