//! Explicit permutations of `0..2^n`, stored as image tables.
//!
//! `perm[i]` is the image of pattern `i`; bit `k` of a pattern is line `k`.

use std::collections::HashSet;

/// Largest line count for which `2^lines` patterns are enumerated explicitly.
pub const MAX_EXPLICIT_LINES: usize = 20;

pub fn identity_permutation(len: usize) -> Vec<u64> {
    (0..len as u64).collect()
}

/// Every value in `0..perm.len()` occurs exactly once.
pub fn is_permutation(perm: &[u64]) -> bool {
    let mut seen = vec![false; perm.len()];
    for &v in perm {
        match seen.get_mut(v as usize) {
            Some(s) if !*s => *s = true,
            _ => return false,
        }
    }
    true
}

/// # Panics
///
/// Panics if `perm` is not a permutation.
pub fn permutation_invert(perm: &[u64]) -> Vec<u64> {
    assert!(is_permutation(perm), "Not a permutation: {:?}", perm);
    let mut inverse = vec![0; perm.len()];
    for (i, &v) in perm.iter().enumerate() {
        inverse[v as usize] = i as u64;
    }
    inverse
}

/// Apply `first`, then `second`.
///
/// # Panics
///
/// Panics if the lengths differ.
pub fn permutation_multiply(first: &[u64], second: &[u64]) -> Vec<u64> {
    assert_eq!(first.len(), second.len());
    first.iter().map(|&v| second[v as usize]).collect()
}

/// Cycle decomposition, fixed points omitted. Each cycle starts at its smallest element.
pub fn permutation_to_cycles(perm: &[u64]) -> Vec<Vec<u64>> {
    let mut visited: HashSet<u64> = HashSet::new();
    let mut cycles = Vec::new();
    for start in 0..perm.len() as u64 {
        if perm[start as usize] == start || visited.contains(&start) {
            continue;
        }
        let mut cycle = vec![start];
        visited.insert(start);
        let mut next = perm[start as usize];
        while next != start {
            visited.insert(next);
            cycle.push(next);
            next = perm[next as usize];
        }
        cycles.push(cycle);
    }
    cycles
}

pub fn is_involution(perm: &[u64]) -> bool {
    perm.iter()
        .enumerate()
        .all(|(i, &v)| perm.get(v as usize) == Some(&(i as u64)))
}

/// Transpositions whose composition, applied left to right, yields `perm`.
pub fn permutation_to_transpositions(perm: &[u64]) -> Vec<(u64, u64)> {
    let mut transpositions = Vec::new();
    for cycle in permutation_to_cycles(perm) {
        // (c0 c1 ... ck) is (c0 c1), then (c0 c2), ..., then (c0 ck)
        for &c in cycle[1..].iter() {
            transpositions.push((cycle[0], c));
        }
    }
    transpositions
}

/// The permutation swapping `a` and `b`.
pub fn transposition(len: usize, a: u64, b: u64) -> Vec<u64> {
    let mut perm = identity_permutation(len);
    perm.swap(a as usize, b as usize);
    perm
}
