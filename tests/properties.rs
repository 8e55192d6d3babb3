//! Randomized agreement between the symbolic and the explicit views of circuits.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use test_log::test;

use rcbdd_rs::circuit::Circuit;
use rcbdd_rs::embed::{embed_pla, EmbeddingSettings, EmbeddingStrategy, PlaSpecification};
use rcbdd_rs::gate::{Control, Gate, Line};
use rcbdd_rs::permutation::{identity_permutation, is_permutation};
use rcbdd_rs::rcbdd::{Rcbdd, VariableOrder};
use rcbdd_rs::simulation::circuit_to_permutation;
use rcbdd_rs::transform::{
    concat, fredkin_gates_to_toffoli, negative_controls_to_positive, reverse_circuit,
};

const SEEDS: u64 = 20;

fn random_controls(rng: &mut impl Rng, lines: usize, exclude: &[Line]) -> Vec<Control> {
    (0..lines)
        .filter(|l| !exclude.contains(l))
        .filter_map(|l| {
            rng.random_bool(0.4)
                .then(|| Control::new(l, rng.random_bool(0.7)))
        })
        .collect()
}

fn random_gate(rng: &mut impl Rng, lines: usize) -> Gate {
    let t0 = rng.random_range(0..lines);
    if lines >= 2 && rng.random_bool(0.3) {
        let mut t1 = rng.random_range(0..lines - 1);
        if t1 >= t0 {
            t1 += 1;
        }
        Gate::fredkin(random_controls(rng, lines, &[t0, t1]), t0, t1)
    } else {
        Gate::toffoli(random_controls(rng, lines, &[t0]), t0)
    }
}

fn random_circuit(rng: &mut impl Rng, lines: usize, gates: usize) -> Circuit {
    let mut circuit = Circuit::new(lines);
    for _ in 0..gates {
        circuit.append_gate(random_gate(rng, lines)).unwrap();
    }
    circuit
}

fn rcbdd(lines: usize, order: VariableOrder) -> Rcbdd {
    let mut cf: Rcbdd = Rcbdd::new();
    cf.initialize_manager();
    cf.create_variables(lines, order).unwrap();
    cf
}

#[test]
fn test_simulation_is_a_permutation() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let lines = rng.random_range(1..=6);
        let circuit = random_circuit(&mut rng, lines, 12);
        let perm = circuit_to_permutation(&circuit).unwrap();
        assert!(is_permutation(&perm), "seed {}", seed);
    }
}

#[test]
fn test_chi_agrees_with_simulation() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let lines = rng.random_range(1..=6);
        let circuit = random_circuit(&mut rng, lines, 10);
        let expected = circuit_to_permutation(&circuit).unwrap();

        for order in [VariableOrder::Interleaved, VariableOrder::Blocked] {
            let cf = rcbdd(lines, order);
            let chi = cf.create_from_circuit(&circuit).unwrap();
            assert!(cf.is_bijection(chi).unwrap(), "seed {}", seed);
            assert_eq!(cf.to_permutation(chi).unwrap(), expected, "seed {}", seed);
        }
    }
}

#[test]
fn test_circuit_then_reverse_is_identity() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let lines = rng.random_range(1..=8);
        let circuit = random_circuit(&mut rng, lines, 15);
        let cf = rcbdd(lines, VariableOrder::Interleaved);

        let round_trip = concat(&circuit, &reverse_circuit(&circuit)).unwrap();
        assert!(cf.is_identity(&round_trip).unwrap(), "seed {}", seed);

        let chi = cf.create_from_circuit(&circuit).unwrap();
        let reversed = cf.create_from_circuit(&reverse_circuit(&circuit)).unwrap();
        assert_eq!(cf.invert(chi).unwrap(), reversed, "seed {}", seed);
    }
}

#[test]
fn test_rewrites_preserve_chi() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let lines = rng.random_range(2..=7);
        let circuit = random_circuit(&mut rng, lines, 10);
        let cf = rcbdd(lines, VariableOrder::Interleaved);

        let chi = cf.create_from_circuit(&circuit).unwrap();
        let toffoli_only = fredkin_gates_to_toffoli(&circuit);
        let positive_only = negative_controls_to_positive(&circuit);
        assert_eq!(cf.create_from_circuit(&toffoli_only).unwrap(), chi, "seed {}", seed);
        assert_eq!(cf.create_from_circuit(&positive_only).unwrap(), chi, "seed {}", seed);
    }
}

#[test]
fn test_to_circuit_round_trip() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let lines = rng.random_range(1..=6);
        let circuit = random_circuit(&mut rng, lines, 10);

        for order in [VariableOrder::Interleaved, VariableOrder::Blocked] {
            let cf = rcbdd(lines, order);
            let chi = cf.create_from_circuit(&circuit).unwrap();
            let synthesized = cf.to_circuit(chi).unwrap();
            assert!(synthesized.iter().all(Gate::is_toffoli));
            assert_eq!(cf.create_from_circuit(&synthesized).unwrap(), chi, "seed {}", seed);
            assert_eq!(
                circuit_to_permutation(&synthesized).unwrap(),
                circuit_to_permutation(&circuit).unwrap(),
                "seed {}",
                seed
            );
        }
    }
}

#[test]
fn test_identity_permutation_round_trip() {
    let cf = rcbdd(5, VariableOrder::Blocked);
    let chi = cf.create_from_permutation(&identity_permutation(32)).unwrap();
    assert!(cf.is_identity_chi(chi).unwrap());
    assert_eq!(chi, cf.identity().unwrap());
}

fn pattern_string(pattern: u64, width: usize) -> String {
    (0..width)
        .map(|i| if (pattern >> i) & 1 == 1 { '1' } else { '0' })
        .collect()
}

#[test]
fn test_embedding_reproduces_random_functions() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n = rng.random_range(1..=4);
        let m = rng.random_range(1..=3);
        let table: Vec<u64> = (0..1u64 << n)
            .map(|_| rng.random_range(0..1u64 << m))
            .collect();

        let mut spec = PlaSpecification::new(n, m);
        for (x, &fx) in table.iter().enumerate() {
            spec.add_cube(&pattern_string(x as u64, n), &pattern_string(fx, m))
                .unwrap();
        }

        for strategy in [EmbeddingStrategy::Bennett, EmbeddingStrategy::MinimalGarbage] {
            let settings = EmbeddingSettings {
                strategy,
                constant_value: rng.random_bool(0.5),
                ..Default::default()
            };
            let mut cf: Rcbdd = Rcbdd::new();
            let stats = embed_pla(&mut cf, &spec, &settings).unwrap();
            assert!(stats.lines >= n.max(m));
            assert_eq!(stats.constant_lines, stats.lines - n);
            assert_eq!(stats.garbage_lines, stats.lines - m);

            let chi = cf.chi().unwrap();
            assert!(cf.is_bijection(chi).unwrap(), "seed {} {:?}", seed, strategy);
            let perm = cf.to_permutation(chi).unwrap();
            let constants = stats.constant_lines;
            let fill = if settings.constant_value {
                (1u64 << constants) - 1
            } else {
                0
            };
            let outputs = (1u64 << m) - 1;
            for (x, &fx) in table.iter().enumerate() {
                let input = fill | ((x as u64) << constants);
                assert_eq!(perm[input as usize] & outputs, fx, "seed {} {:?}", seed, strategy);
            }
        }
    }
}

/// Every control assignment (absent, positive, negative) over `free` lines.
fn all_controls(free: &[Line]) -> Vec<Vec<Control>> {
    let mut result = vec![Vec::new()];
    for &l in free {
        result = result
            .into_iter()
            .flat_map(|controls: Vec<Control>| {
                let mut positive = controls.clone();
                positive.push(Control::positive(l));
                let mut negative = controls.clone();
                negative.push(Control::negative(l));
                [controls, positive, negative]
            })
            .collect();
    }
    result
}

fn all_gates(lines: usize) -> Vec<Gate> {
    let mut gates = Vec::new();
    for t in 0..lines {
        let free: Vec<Line> = (0..lines).filter(|&l| l != t).collect();
        gates.extend(all_controls(&free).into_iter().map(|c| Gate::toffoli(c, t)));
    }
    for t0 in 0..lines {
        for t1 in t0 + 1..lines {
            let free: Vec<Line> = (0..lines).filter(|&l| l != t0 && l != t1).collect();
            gates.extend(
                all_controls(&free)
                    .into_iter()
                    .map(|c| Gate::fredkin(c, t0, t1)),
            );
        }
    }
    gates
}

#[test]
fn test_every_gate_on_four_lines() {
    let gates = all_gates(4);
    assert_eq!(gates.len(), 4 * 27 + 6 * 9);

    for order in [VariableOrder::Interleaved, VariableOrder::Blocked] {
        let cf = rcbdd(4, order);
        let mut circuit = Circuit::new(4);
        for gate in &gates {
            let mut single = Circuit::new(4);
            single.append_gate(gate.clone()).unwrap();
            let chi = cf.create_from_gate(gate).unwrap();
            assert_eq!(chi, cf.create_from_circuit(&single).unwrap(), "{} {:?}", gate, order);
            assert_eq!(
                cf.to_permutation(chi).unwrap(),
                circuit_to_permutation(&single).unwrap(),
                "{} {:?}",
                gate,
                order
            );

            circuit.append_gate(gate.clone()).unwrap();
            let chi = cf.create_from_circuit(&circuit).unwrap();
            assert_eq!(
                cf.to_permutation(chi).unwrap(),
                circuit_to_permutation(&circuit).unwrap(),
                "after {} gates, last {} {:?}",
                circuit.num_gates(),
                gate,
                order
            );
        }
    }
}
