// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Reference Integrator
// ─────────────────────────────────────────────────────────────────────
//! Fixed-step classical Runge-Kutta driver for any [`OdeSystem`], with
//! callbacks scheduled at `t0 + j·interval`.
//!
//! Production runs hand [`RhsEvaluator::rhs`] to an adaptive external
//! integrator; this one exists for smoke runs, benches and tests.

use fdhw_types::{FdhwError, FdhwResult};

use crate::rhs::RhsEvaluator;

/// `dy/dt = f(t, y)` on a flat real buffer.
pub trait OdeSystem {
    /// Length of `y`.
    fn dim(&self) -> usize;
    fn rhs(&self, t: f64, y: &[f64]) -> FdhwResult<Vec<f64>>;
}

impl OdeSystem for RhsEvaluator {
    fn dim(&self) -> usize {
        self.layout().len()
    }

    fn rhs(&self, t: f64, y: &[f64]) -> FdhwResult<Vec<f64>> {
        RhsEvaluator::rhs(self, t, y)
    }
}

type HookFn<'a> = Box<dyn FnMut(f64, &[f64]) -> FdhwResult<()> + 'a>;

/// Callback invoked on the integration variable at a fixed cadence.
///
/// [`Rk4Integrator::run`] shortens steps so every scheduled time is hit
/// exactly. Observers of an external integrator that chooses its own steps
/// use `fdhw_diagnostics::Schedule` instead, which fires once per crossing.
pub struct ScheduledHook<'a> {
    interval: f64,
    start: f64,
    fired: u64,
    action: HookFn<'a>,
}

impl<'a> ScheduledHook<'a> {
    pub fn new<F>(interval: f64, action: F) -> FdhwResult<Self>
    where
        F: FnMut(f64, &[f64]) -> FdhwResult<()> + 'a,
    {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(FdhwError::Configuration(format!(
                "hook interval must be finite and > 0, got {interval}"
            )));
        }
        Ok(Self {
            interval,
            start: 0.0,
            fired: 0,
            action: Box::new(action),
        })
    }

    /// Number of times the hook has run in the current integration.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    fn reset(&mut self, t0: f64) {
        self.start = t0;
        self.fired = 0;
    }

    fn next(&self) -> f64 {
        self.start + self.fired as f64 * self.interval
    }
}

/// Classical RK4 with a maximum step `dtstep`; steps are shortened to land
/// on hook times and on the final time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rk4Integrator {
    pub dtstep: f64,
}

impl Rk4Integrator {
    pub fn new(dtstep: f64) -> FdhwResult<Self> {
        if !(dtstep.is_finite() && dtstep > 0.0) {
            return Err(FdhwError::Configuration(format!(
                "dtstep must be finite and > 0, got {dtstep}"
            )));
        }
        Ok(Self { dtstep })
    }

    /// One RK4 step of size `h` from `(t, y)`.
    pub fn step<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        y: &[f64],
        h: f64,
    ) -> FdhwResult<Vec<f64>> {
        let axpy = |a: f64, k: &[f64]| -> Vec<f64> {
            y.iter().zip(k).map(|(yi, ki)| yi + a * ki).collect()
        };
        let k1 = system.rhs(t, y)?;
        let k2 = system.rhs(t + 0.5 * h, &axpy(0.5 * h, &k1))?;
        let k3 = system.rhs(t + 0.5 * h, &axpy(0.5 * h, &k2))?;
        let k4 = system.rhs(t + h, &axpy(h, &k3))?;
        Ok(y
            .iter()
            .enumerate()
            .map(|(i, yi)| yi + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
            .collect())
    }

    /// Integrate from `t0` to `t1`, firing every hook at `t0` and at each
    /// of its scheduled times up to and including `t1`. Returns `y(t1)`.
    pub fn run<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t0: f64,
        t1: f64,
        y0: Vec<f64>,
        hooks: &mut [ScheduledHook<'_>],
    ) -> FdhwResult<Vec<f64>> {
        if !(t0.is_finite() && t1.is_finite() && t1 >= t0) {
            return Err(FdhwError::Configuration(format!(
                "integration range must satisfy t0 <= t1, got [{t0}, {t1}]"
            )));
        }
        if y0.len() != system.dim() {
            return Err(FdhwError::StateLayout {
                expected: system.dim(),
                found: y0.len(),
            });
        }
        for hook in hooks.iter_mut() {
            hook.reset(t0);
        }

        let eps = 1e-9 * self.dtstep;
        let mut t = t0;
        let mut y = y0;
        let mut steps = 0usize;
        loop {
            for hook in hooks.iter_mut() {
                if hook.next() <= t + eps {
                    (hook.action)(t, &y)?;
                    hook.fired += 1;
                }
            }
            if t >= t1 - eps {
                break;
            }

            let mut target = (t + self.dtstep).min(t1);
            for hook in hooks.iter() {
                target = target.min(hook.next());
            }
            y = self.step(system, t, &y, target - t)?;
            t = target;
            steps += 1;
        }
        log::debug!("rk4: {steps} steps over [{t0}, {t1}]");
        Ok(y)
    }
}
