// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Scheduled Recording
// ─────────────────────────────────────────────────────────────────────
//! Interval scheduling of diagnostics and a record buffer drained by the
//! persistence collaborator.
//!
//! The integrator reports accepted `(t, y)` pairs through
//! [`DiagnosticsRecorder::observe`]; every kind whose next multiple of its
//! interval has been reached is computed once and buffered. Missed
//! multiples (steps longer than the interval) are not replayed.
//!
//! Thread-safe: schedule and buffer are guarded by `parking_lot::Mutex`.

use parking_lot::Mutex;

use fdhw_types::{
    EnergyRecord, FdhwError, FdhwResult, FluxRecord, ProfileRecord, ProgressRecord, TimeConfig,
};

use crate::analysis::Diagnostics;
use crate::spectrum::{FieldSnapshot, ReducedSnapshot};

/// What to compute at a scheduled time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Fields,
    Profiles,
    Reduced,
    Energies,
    Fluxes,
    Show,
}

#[derive(Debug, Clone)]
struct Entry {
    kind: DiagnosticKind,
    interval: f64,
    fired: u64,
}

/// `(interval, kind)` pairs anchored at `t0`.
///
/// Driven by observed times only, so it works behind an adaptive
/// integrator whose steps cannot be clipped to save times. The built-in
/// RK4 driver lands on hook times instead (`fdhw_physics::ScheduledHook`).
#[derive(Debug, Clone)]
pub struct Schedule {
    t0: f64,
    entries: Vec<Entry>,
}

impl Schedule {
    pub fn new(t0: f64) -> Self {
        Self {
            t0,
            entries: Vec::new(),
        }
    }

    pub fn every(mut self, interval: f64, kind: DiagnosticKind) -> FdhwResult<Self> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(FdhwError::Configuration(format!(
                "{kind:?} interval must be finite and > 0, got {interval}"
            )));
        }
        self.entries.push(Entry {
            kind,
            interval,
            fired: 0,
        });
        Ok(self)
    }

    /// Every saved kind at `dtsave`, the progress line at `dtshow`.
    pub fn from_time_config(time: &TimeConfig) -> FdhwResult<Self> {
        use DiagnosticKind::*;
        let mut schedule = Self::new(time.t0);
        for kind in [Fields, Profiles, Reduced, Energies, Fluxes] {
            schedule = schedule.every(time.dtsave, kind)?;
        }
        schedule.every(time.dtshow, Show)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kinds due at `t`, advancing each past `t`.
    pub fn due(&mut self, t: f64) -> Vec<DiagnosticKind> {
        let mut out = Vec::new();
        for e in &mut self.entries {
            let tol = 1e-9 * e.interval;
            let next = self.t0 + e.fired as f64 * e.interval;
            if next <= t + tol {
                out.push(e.kind);
                let passed = ((t + tol - self.t0) / e.interval).floor().max(0.0) as u64;
                e.fired = passed + 1;
            }
        }
        out
    }
}

/// Everything recorded since the last drain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub fields: Vec<FieldSnapshot>,
    pub profiles: Vec<ProfileRecord>,
    pub reduced: Vec<ReducedSnapshot>,
    pub energies: Vec<EnergyRecord>,
    pub fluxes: Vec<FluxRecord>,
    pub progress: Vec<ProgressRecord>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.fields.len()
            + self.profiles.len()
            + self.reduced.len()
            + self.energies.len()
            + self.fluxes.len()
            + self.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared sink for the integrator's step callback.
pub struct DiagnosticsRecorder {
    diagnostics: Diagnostics,
    schedule: Mutex<Schedule>,
    records: Mutex<RecordSet>,
    last: Mutex<Option<(f64, Vec<f64>)>>,
}

impl DiagnosticsRecorder {
    pub fn new(diagnostics: Diagnostics, schedule: Schedule) -> Self {
        Self {
            diagnostics,
            schedule: Mutex::new(schedule),
            records: Mutex::new(RecordSet::default()),
            last: Mutex::new(None),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Record whatever is due at `t`; returns the kinds computed.
    pub fn observe(&self, t: f64, y: &[f64]) -> FdhwResult<Vec<DiagnosticKind>> {
        let due = self.schedule.lock().due(t);
        for &kind in &due {
            self.record(kind, t, y)?;
        }
        *self.last.lock() = Some((t, y.to_vec()));
        Ok(due)
    }

    /// Compute one kind now, regardless of the schedule.
    pub fn record(&self, kind: DiagnosticKind, t: f64, y: &[f64]) -> FdhwResult<()> {
        let d = &self.diagnostics;
        match kind {
            DiagnosticKind::Fields => {
                let v = d.fields(t, y)?;
                self.records.lock().fields.push(v);
            }
            DiagnosticKind::Profiles => {
                let v = d.profiles(t, y)?;
                self.records.lock().profiles.push(v);
            }
            DiagnosticKind::Reduced => {
                let v = d.reduced(t, y)?;
                self.records.lock().reduced.push(v);
            }
            DiagnosticKind::Energies => {
                let v = d.energies(t, y)?;
                self.records.lock().energies.push(v);
            }
            DiagnosticKind::Fluxes => {
                let v = d.fluxes(t, y)?;
                self.records.lock().fluxes.push(v);
            }
            DiagnosticKind::Show => {
                let v = d.progress(t, y)?;
                self.records.lock().progress.push(v);
            }
        }
        Ok(())
    }

    /// Take the buffered records, leaving the buffer empty.
    pub fn drain(&self) -> RecordSet {
        std::mem::take(&mut *self.records.lock())
    }

    pub fn pending(&self) -> usize {
        self.records.lock().len()
    }

    /// Most recent observed `(t, y)`, for restarting a run.
    pub fn last_state(&self) -> Option<(f64, Vec<f64>)> {
        self.last.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use std::sync::Arc;

    use fdhw_physics::RhsEvaluator;
    use fdhw_types::{GridConfig, InitialCondition, SimulationConfig};

    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            grid: GridConfig {
                npx: 32,
                npy: 32,
                lx: 32.0 * PI,
                ly: 32.0 * PI,
            },
            initial: InitialCondition {
                spectral_amplitude: 1e-3,
                ..InitialCondition::default()
            },
            ..SimulationConfig::default()
        }
    }

    fn recorder(schedule: Schedule) -> (DiagnosticsRecorder, Vec<f64>) {
        let cfg = config();
        let ev = Arc::new(RhsEvaluator::from_config(&cfg).unwrap());
        let y = ev.initial_flat_state(&cfg).unwrap();
        (DiagnosticsRecorder::new(Diagnostics::new(ev), schedule), y)
    }

    #[test]
    fn test_due_fires_once_per_crossing() {
        let mut s = Schedule::new(1.0).every(0.5, DiagnosticKind::Energies).unwrap();
        assert_eq!(s.due(1.0), vec![DiagnosticKind::Energies]);
        assert!(s.due(1.2).is_empty());
        assert_eq!(s.due(1.5), vec![DiagnosticKind::Energies]);
        assert!(s.due(1.5).is_empty());
        // A long step skips 2.0 and 2.5 but fires once.
        assert_eq!(s.due(2.7), vec![DiagnosticKind::Energies]);
        assert!(s.due(2.9).is_empty());
        assert_eq!(s.due(3.0), vec![DiagnosticKind::Energies]);
    }

    #[test]
    fn test_due_tolerates_rounding() {
        let mut s = Schedule::new(0.0).every(0.1, DiagnosticKind::Show).unwrap();
        s.due(0.0);
        // 0.7 - 0.6 lands just below 0.1.
        assert_eq!(s.due(0.7 - 0.6).len(), 1);
        assert_eq!(s.due(0.2).len(), 1);
    }

    #[test]
    fn test_from_time_config() {
        let time = TimeConfig {
            dtsave: 0.1,
            dtshow: 1.0,
            ..TimeConfig::default()
        };
        let mut s = Schedule::from_time_config(&time).unwrap();
        assert_eq!(s.len(), 6);
        assert_eq!(s.due(0.0).len(), 6);
        assert_eq!(
            s.due(0.1),
            vec![
                DiagnosticKind::Fields,
                DiagnosticKind::Profiles,
                DiagnosticKind::Reduced,
                DiagnosticKind::Energies,
                DiagnosticKind::Fluxes,
            ]
        );
        assert!(Schedule::new(0.0).every(0.0, DiagnosticKind::Show).is_err());
    }

    #[test]
    fn test_observe_and_drain() {
        let time = TimeConfig::default();
        let (rec, y) = recorder(Schedule::from_time_config(&time).unwrap());
        assert_eq!(rec.observe(0.0, &y).unwrap().len(), 6);
        assert_eq!(rec.observe(0.05, &y).unwrap().len(), 0);
        assert_eq!(rec.observe(0.1, &y).unwrap().len(), 5);
        assert_eq!(rec.pending(), 11);

        let set = rec.drain();
        assert_eq!(set.energies.len(), 2);
        assert_eq!(set.progress.len(), 1);
        assert_eq!(set.fields[1].t, 0.1);
        assert!(set.energies[0].k > 0.0);
        assert!(rec.drain().is_empty());
        assert_eq!(rec.last_state().map(|(t, _)| t), Some(0.1));
    }

    #[test]
    fn test_observe_from_threads() {
        let schedule = Schedule::new(0.0)
            .every(1.0, DiagnosticKind::Energies)
            .unwrap();
        let (rec, y) = recorder(schedule);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    rec.record(DiagnosticKind::Profiles, 0.0, &y).unwrap();
                });
            }
        });
        assert_eq!(rec.drain().profiles.len(), 4);
    }

    #[test]
    fn test_observe_propagates_layout_error() {
        let schedule = Schedule::new(0.0).every(1.0, DiagnosticKind::Fluxes).unwrap();
        let (rec, _) = recorder(schedule);
        assert!(rec.observe(0.0, &[1.0, 2.0]).is_err());
        assert_eq!(rec.pending(), 0);
    }
}
