// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — RHS Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for one right-hand side evaluation and one
//! reference RK4 step.

use std::f64::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fdhw_physics::{RhsEvaluator, Rk4Integrator};
use fdhw_types::{GridConfig, InitialCondition, SimulationConfig};

fn make_config(n: usize) -> SimulationConfig {
    SimulationConfig {
        grid: GridConfig {
            npx: n,
            npy: n,
            lx: 32.0 * PI,
            ly: 32.0 * PI,
        },
        initial: InitialCondition {
            spectral_amplitude: 1e-2,
            ..InitialCondition::default()
        },
        ..SimulationConfig::default()
    }
}

// ── RhsEvaluator.rhs() ──────────────────────────────────────────────

fn bench_rhs(c: &mut Criterion) {
    for n in [64, 256] {
        let cfg = make_config(n);
        let ev = RhsEvaluator::from_config(&cfg).unwrap();
        let y = ev.initial_flat_state(&cfg).unwrap();
        c.bench_function(&format!("rhs_{n}"), |b| {
            b.iter(|| ev.rhs(black_box(0.0), black_box(&y)).unwrap())
        });
    }
}

// ── Rk4Integrator.step() ────────────────────────────────────────────

fn bench_rk4_step(c: &mut Criterion) {
    let cfg = make_config(128);
    let ev = RhsEvaluator::from_config(&cfg).unwrap();
    let y = ev.initial_flat_state(&cfg).unwrap();
    let integ = Rk4Integrator::new(cfg.time.dtstep).unwrap();
    c.bench_function("rk4_step_128", |b| {
        b.iter(|| integ.step(&ev, 0.0, black_box(&y), 0.1).unwrap())
    });
}

criterion_group!(benches, bench_rhs, bench_rk4_step);
criterion_main!(benches);
