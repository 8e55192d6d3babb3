//! Characteristic function benchmarks.
//!
//! Run with:
//! ```bash
//! cargo bench --bench rcbdd
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use rcbdd_rs::circuit::Circuit;
use rcbdd_rs::embed::{embed_pla, EmbeddingSettings, EmbeddingStrategy, PlaSpecification};
use rcbdd_rs::gate::{Control, Gate};
use rcbdd_rs::rcbdd::{Rcbdd, VariableOrder};
use rcbdd_rs::simulation::circuit_to_permutation;

fn random_circuit(lines: usize, gates: usize, seed: u64) -> Circuit {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut circuit = Circuit::new(lines);
    for _ in 0..gates {
        let target = rng.random_range(0..lines);
        let controls: Vec<Control> = (0..lines)
            .filter(|&l| l != target)
            .filter_map(|l| {
                rng.random_bool(0.3)
                    .then(|| Control::new(l, rng.random_bool(0.8)))
            })
            .collect();
        circuit
            .append_gate(Gate::toffoli(controls, target))
            .expect("gate fits");
    }
    circuit
}

fn rcbdd(lines: usize, order: VariableOrder) -> Rcbdd {
    let mut cf: Rcbdd = Rcbdd::new();
    cf.initialize_manager();
    cf.create_variables(lines, order).expect("fresh manager");
    cf
}

// ============================================================================
// Benchmark: χ construction, interleaved vs blocked order
// ============================================================================

fn bench_create_from_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("rcbdd/create_from_circuit");
    group.sample_size(10);

    for lines in [8, 12, 16] {
        let circuit = random_circuit(lines, 4 * lines, 42);
        for order in [VariableOrder::Interleaved, VariableOrder::Blocked] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", order), lines),
                &circuit,
                |b, circuit| {
                    b.iter(|| {
                        let cf = rcbdd(lines, order);
                        cf.create_from_circuit(circuit).expect("unlimited budget")
                    });
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: explicit simulation, for comparison
// ============================================================================

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rcbdd/simulation");

    for lines in [8, 12, 16] {
        let circuit = random_circuit(lines, 4 * lines, 42);
        group.bench_with_input(BenchmarkId::new("permutation", lines), &circuit, |b, circuit| {
            b.iter(|| circuit_to_permutation(circuit).expect("few lines"));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: PLA embedding
// ============================================================================

fn random_spec(n: usize, m: usize, seed: u64) -> PlaSpecification {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let bits = |p: u64, w: usize| -> String {
        (0..w).map(|i| if (p >> i) & 1 == 1 { '1' } else { '0' }).collect()
    };
    let mut spec = PlaSpecification::new(n, m);
    for x in 0..1u64 << n {
        let fx = rng.random_range(0..1u64 << m);
        spec.add_cube(&bits(x, n), &bits(fx, m)).expect("cube width");
    }
    spec
}

fn bench_embedding(c: &mut Criterion) {
    let mut group = c.benchmark_group("rcbdd/embed_pla");
    group.sample_size(10);

    for n in [4, 6, 8] {
        let spec = random_spec(n, 3, 7);
        for strategy in [EmbeddingStrategy::Bennett, EmbeddingStrategy::MinimalGarbage] {
            let settings = EmbeddingSettings {
                strategy,
                ..Default::default()
            };
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), n),
                &spec,
                |b, spec| {
                    b.iter(|| {
                        let mut cf: Rcbdd = Rcbdd::new();
                        embed_pla(&mut cf, spec, &settings).expect("total function")
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_create_from_circuit,
    bench_simulation,
    bench_embedding,
);

criterion_main!(benches);
