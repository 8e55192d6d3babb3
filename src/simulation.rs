//! Bit-parallel evaluation of gates and circuits on single patterns.

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::gate::Gate;
use crate::permutation::MAX_EXPLICIT_LINES;

pub fn simulate_gate(gate: &Gate, pattern: u64) -> u64 {
    if !gate.is_active(pattern) {
        return pattern;
    }
    match gate {
        Gate::Toffoli { target, .. } => pattern ^ (1 << target),
        Gate::Fredkin { targets, .. } => {
            let [t0, t1] = *targets;
            let b0 = (pattern >> t0) & 1;
            let b1 = (pattern >> t1) & 1;
            if b0 == b1 {
                pattern
            } else {
                pattern ^ (1 << t0) ^ (1 << t1)
            }
        }
    }
}

/// Push `pattern` through all gates of `circuit`, first gate first.
pub fn simulate(circuit: &Circuit, pattern: u64) -> u64 {
    circuit
        .iter()
        .fold(pattern, |acc, gate| simulate_gate(gate, acc))
}

/// The permutation realized by `circuit`, by exhaustive simulation.
pub fn circuit_to_permutation(circuit: &Circuit) -> Result<Vec<u64>> {
    let lines = circuit.lines();
    if lines > MAX_EXPLICIT_LINES {
        return Err(Error::TooManyLines {
            lines,
            max: MAX_EXPLICIT_LINES,
        });
    }
    Ok((0..1u64 << lines)
        .map(|pattern| simulate(circuit, pattern))
        .collect())
}
