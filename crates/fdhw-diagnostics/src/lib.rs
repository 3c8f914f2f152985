// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Diagnostics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Read side of a run: everything computed from `(t, y)` for the
//! persistence collaborator.
//!
//! - Padded half-spectrum snapshots and their reduced form
//! - Poloidally averaged fluxes Γ, Π, R
//! - Energies K, W, N and the progress line
//! - Interval scheduling and a thread-safe record buffer

pub mod analysis;
pub mod recorder;
pub mod spectrum;

pub use analysis::{energies_of, fluxes_of, Diagnostics};
pub use recorder::{DiagnosticKind, DiagnosticsRecorder, RecordSet, Schedule};
pub use spectrum::{FieldSnapshot, PaddedSpectrum, ReducedSnapshot};
