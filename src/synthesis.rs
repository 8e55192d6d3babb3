//! Circuits from explicit permutations.

use log::debug;

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::gate::{Control, Gate};
use crate::permutation::{is_permutation, MAX_EXPLICIT_LINES};

pub trait TruthTableSynthesis {
    /// A circuit over `lines` lines realizing `perm`, which has `2^lines` entries.
    fn synthesize(&self, perm: &[u64], lines: usize) -> Result<Circuit>;
}

/// Realizes each transposition of the permutation with a small gate block.
///
/// Simple and complete, not size-optimal.
#[derive(Debug, Copy, Clone, Default)]
pub struct TranspositionBasedSynthesis;

impl TruthTableSynthesis for TranspositionBasedSynthesis {
    fn synthesize(&self, perm: &[u64], lines: usize) -> Result<Circuit> {
        if lines > MAX_EXPLICIT_LINES {
            return Err(Error::TooManyLines {
                lines,
                max: MAX_EXPLICIT_LINES,
            });
        }
        if perm.len() != 1 << lines {
            return Err(Error::NotAPermutation(format!(
                "expected {} entries for {} lines, got {}",
                1u64 << lines,
                lines,
                perm.len()
            )));
        }
        if !is_permutation(perm) {
            return Err(Error::NotAPermutation(
                "some value occurs more than once".to_string(),
            ));
        }

        // Undo `perm` step by step: fix pattern i by swapping the values i and cur[i].
        let mut cur = perm.to_vec();
        let mut pos = vec![0; perm.len()];
        for (i, &v) in cur.iter().enumerate() {
            pos[v as usize] = i;
        }

        let mut undo = Circuit::new(lines);
        for i in 0..perm.len() {
            let v = cur[i];
            if v == i as u64 {
                continue;
            }
            for gate in transposition_gates(lines, v, i as u64) {
                undo.push_gate(gate);
            }
            let k = pos[i];
            cur[k] = v;
            cur[i] = i as u64;
            pos[v as usize] = k;
            pos[i] = i;
        }

        // Every block is a palindrome of involutions, so reversing the gate list inverts it.
        let mut circuit = undo.empty_like();
        for gate in undo.iter().rev() {
            circuit.push_gate(gate.clone());
        }
        debug!(
            "synthesized {} gates for a permutation on {} lines",
            circuit.num_gates(),
            lines
        );
        Ok(circuit)
    }
}

/// Gates exchanging patterns `a` and `b` and fixing every other pattern.
pub fn transposition_gates(lines: usize, a: u64, b: u64) -> Vec<Gate> {
    if a == b {
        return Vec::new();
    }
    let bit = |p: u64, l: usize| (p >> l) & 1 == 1;
    let diff = a ^ b;
    let pivot = diff.trailing_zeros() as usize;

    // Map b onto a with the pivot bit flipped.
    let fan: Vec<Gate> = (0..lines)
        .filter(|&l| l != pivot && bit(diff, l))
        .map(|l| Gate::toffoli([Control::new(pivot, bit(b, pivot))], l))
        .collect();
    // Flip the pivot bit exactly on a and its neighbour.
    let swap = Gate::toffoli(
        (0..lines)
            .filter(|&l| l != pivot)
            .map(|l| Control::new(l, bit(a, l))),
        pivot,
    );

    let mut gates = fan.clone();
    gates.push(swap);
    gates.extend(fan);
    gates
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::permutation::transposition;
    use crate::simulation::circuit_to_permutation;

    #[test]
    fn test_transposition_gates() {
        for (a, b) in [(0, 7), (3, 5), (6, 1), (2, 3)] {
            let mut c = Circuit::new(3);
            for g in transposition_gates(3, a, b) {
                c.append_gate(g).unwrap();
            }
            assert_eq!(circuit_to_permutation(&c).unwrap(), transposition(8, a, b));
        }
    }

    #[test]
    fn test_synthesize() {
        let perm = vec![1, 2, 3, 0, 5, 7, 4, 6];
        let c = TranspositionBasedSynthesis.synthesize(&perm, 3).unwrap();
        assert_eq!(circuit_to_permutation(&c).unwrap(), perm);
    }

    #[test]
    fn test_identity_is_empty() {
        let perm: Vec<u64> = (0..16).collect();
        let c = TranspositionBasedSynthesis.synthesize(&perm, 4).unwrap();
        assert_eq!(c.num_gates(), 0);
        assert_eq!(c.lines(), 4);
    }

    #[test]
    fn test_rejects_non_permutations() {
        assert!(matches!(
            TranspositionBasedSynthesis.synthesize(&[0, 0, 1, 2], 2),
            Err(Error::NotAPermutation(_))
        ));
        assert!(matches!(
            TranspositionBasedSynthesis.synthesize(&[0, 1], 2),
            Err(Error::NotAPermutation(_))
        ));
    }
}
