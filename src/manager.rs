//! The decision-diagram interface used by the characteristic-function layer.
//!
//! Everything above this trait only needs constants, fresh variables,
//! `ite`, negation, existential quantification and a few queries.
//! The remaining operations are derived from those.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

pub trait DecisionDiagram: Default {
    type Node: Copy + Eq + Hash + Debug + Display;

    fn zero(&self) -> Self::Node;
    fn one(&self) -> Self::Node;

    /// Allocate a fresh variable below all existing ones and return its positive literal.
    fn new_var(&self) -> Self::Node;
    fn num_vars(&self) -> usize;

    fn ite(&self, f: Self::Node, g: Self::Node, h: Self::Node) -> Self::Node;
    fn not(&self, f: Self::Node) -> Self::Node;

    /// Existential quantification over `vars`, given as positive variable literals.
    fn exists(&self, f: Self::Node, vars: &[Self::Node]) -> Self::Node;

    fn equal(&self, f: Self::Node, g: Self::Node) -> bool {
        f == g
    }

    /// Number of nodes reachable from `f`.
    fn size(&self, f: Self::Node) -> usize;
    /// Number of live nodes in the manager.
    fn num_nodes(&self) -> usize;
    fn sat_count(&self, f: Self::Node, num_vars: usize) -> BigUint;

    /// Free every node not reachable from `roots`.
    fn collect_garbage(&self, roots: &[Self::Node]);

    fn is_zero(&self, f: Self::Node) -> bool {
        self.equal(f, self.zero())
    }
    fn is_one(&self, f: Self::Node) -> bool {
        self.equal(f, self.one())
    }

    fn constant(&self, value: bool) -> Self::Node {
        if value {
            self.one()
        } else {
            self.zero()
        }
    }

    /// `var` if `polarity` is true, `¬var` otherwise.
    fn literal(&self, var: Self::Node, polarity: bool) -> Self::Node {
        if polarity {
            var
        } else {
            self.not(var)
        }
    }

    fn and(&self, f: Self::Node, g: Self::Node) -> Self::Node {
        self.ite(f, g, self.zero())
    }
    fn or(&self, f: Self::Node, g: Self::Node) -> Self::Node {
        self.ite(f, self.one(), g)
    }
    fn xor(&self, f: Self::Node, g: Self::Node) -> Self::Node {
        self.ite(f, self.not(g), g)
    }
    fn xnor(&self, f: Self::Node, g: Self::Node) -> Self::Node {
        self.ite(f, g, self.not(g))
    }

    fn and_many(&self, fs: impl IntoIterator<Item = Self::Node>) -> Self::Node {
        fs.into_iter().fold(self.one(), |acc, f| self.and(acc, f))
    }
    fn or_many(&self, fs: impl IntoIterator<Item = Self::Node>) -> Self::Node {
        fs.into_iter().fold(self.zero(), |acc, f| self.or(acc, f))
    }

    /// Conjunction of literals `(var, polarity)`.
    fn cube(&self, literals: impl IntoIterator<Item = (Self::Node, bool)>) -> Self::Node {
        self.and_many(
            literals
                .into_iter()
                .map(|(var, polarity)| self.literal(var, polarity)),
        )
    }

    /// Conjunction fixing each of `vars` to the matching bit of `pattern` (bit `k` for `vars[k]`).
    fn minterm(&self, vars: &[Self::Node], pattern: u64) -> Self::Node {
        self.cube(
            vars.iter()
                .enumerate()
                .map(|(k, &var)| (var, (pattern >> k) & 1 == 1)),
        )
    }

    /// `f` restricted to `var = value`.
    fn cofactor(&self, f: Self::Node, var: Self::Node, value: bool) -> Self::Node {
        let restricted = self.and(f, self.literal(var, value));
        self.exists(restricted, &[var])
    }

    /// Substitute `g` for `var` in `f`.
    fn compose(&self, f: Self::Node, var: Self::Node, g: Self::Node) -> Self::Node {
        let f1 = self.cofactor(f, var, true);
        let f0 = self.cofactor(f, var, false);
        self.ite(g, f1, f0)
    }

    /// Simultaneously substitute `a := b` and `b := a` in `f`.
    fn swap_variables(&self, f: Self::Node, a: Self::Node, b: Self::Node) -> Self::Node {
        if a == b {
            return f;
        }
        let fa0 = self.cofactor(f, a, false);
        let fa1 = self.cofactor(f, a, true);
        let f00 = self.cofactor(fa0, b, false);
        let f01 = self.cofactor(fa0, b, true);
        let f10 = self.cofactor(fa1, b, false);
        let f11 = self.cofactor(fa1, b, true);
        // (a, b) = (p, q) reads f at (a, b) = (q, p)
        let when_a = self.ite(b, f11, f01);
        let when_not_a = self.ite(b, f10, f00);
        self.ite(a, when_a, when_not_a)
    }

    /// Some assignment to `vars` (bit `k` for `vars[k]`) compatible with `f`,
    /// or `None` if `f` is unsatisfiable.
    fn pick_one_minterm(&self, f: Self::Node, vars: &[Self::Node]) -> Option<u64> {
        if self.is_zero(f) {
            return None;
        }
        let mut current = f;
        let mut pattern = 0;
        for (k, &var) in vars.iter().enumerate() {
            let high = self.and(current, var);
            if self.is_zero(high) {
                current = self.and(current, self.not(var));
            } else {
                current = high;
                pattern |= 1 << k;
            }
        }
        Some(pattern)
    }
}

impl DecisionDiagram for Bdd {
    type Node = Ref;

    fn zero(&self) -> Ref {
        self.zero
    }
    fn one(&self) -> Ref {
        self.one
    }

    fn new_var(&self) -> Ref {
        self.new_variable()
    }
    fn num_vars(&self) -> usize {
        Bdd::num_vars(self)
    }

    fn ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        self.apply_ite(f, g, h)
    }
    fn not(&self, f: Ref) -> Ref {
        self.apply_not(f)
    }

    fn exists(&self, f: Ref, vars: &[Ref]) -> Ref {
        let variables: Vec<u32> = vars
            .iter()
            .map(|&var| {
                assert!(
                    !var.is_negated() && !self.is_terminal(var),
                    "Quantified node {} is not a positive variable literal",
                    var
                );
                self.variable(var.index())
            })
            .collect();
        Bdd::exists(self, f, variables)
    }

    fn size(&self, f: Ref) -> usize {
        Bdd::size(self, f)
    }
    fn num_nodes(&self) -> usize {
        Bdd::num_nodes(self)
    }
    fn sat_count(&self, f: Ref, num_vars: usize) -> BigUint {
        Bdd::sat_count(self, f, num_vars)
    }

    fn collect_garbage(&self, roots: &[Ref]) {
        Bdd::collect_garbage(self, roots)
    }

    fn and(&self, f: Ref, g: Ref) -> Ref {
        self.apply_and(f, g)
    }
    fn or(&self, f: Ref, g: Ref) -> Ref {
        self.apply_or(f, g)
    }
    fn xor(&self, f: Ref, g: Ref) -> Ref {
        self.apply_xor(f, g)
    }
    fn xnor(&self, f: Ref, g: Ref) -> Ref {
        self.apply_eq(f, g)
    }

    fn pick_one_minterm(&self, f: Ref, vars: &[Ref]) -> Option<u64> {
        let path = self.one_sat(f)?;
        let mut pattern = 0;
        for (k, &var) in vars.iter().enumerate() {
            let v = self.variable(var.index());
            if path.iter().any(|&(u, value)| u == v && value) {
                pattern |= 1 << k;
            }
        }
        Some(pattern)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_cofactor_and_compose() {
        let dd = Bdd::default();
        let a = dd.new_var();
        let b = dd.new_var();
        let c = dd.new_var();
        let f = dd.ite(a, b, c);
        assert_eq!(dd.cofactor(f, a, true), b);
        assert_eq!(dd.cofactor(f, a, false), c);
        // f[a := ¬a] = ite(a, c, b)
        assert_eq!(dd.compose(f, a, dd.not(a)), dd.ite(a, c, b));
        // f[b := c] = ite(a, c, c) = c
        assert_eq!(dd.compose(f, b, c), c);
    }

    #[test]
    fn test_swap_variables() {
        let dd = Bdd::default();
        let a = dd.new_var();
        let b = dd.new_var();
        let c = dd.new_var();
        let f = dd.and(a, dd.not(b));
        assert_eq!(dd.swap_variables(f, a, b), dd.and(b, dd.not(a)));
        let g = dd.xor(a, c);
        assert_eq!(dd.swap_variables(g, a, b), dd.xor(b, c));
        assert_eq!(dd.swap_variables(g, a, a), g);
    }

    #[test]
    fn test_minterm_and_pick() {
        let dd = Bdd::default();
        let vars: Vec<Ref> = (0..4).map(|_| dd.new_var()).collect();
        let m = dd.minterm(&vars, 0b1010);
        assert_eq!(dd.sat_count(m, 4), BigUint::from(1u32));
        assert_eq!(dd.pick_one_minterm(m, &vars), Some(0b1010));
        assert_eq!(dd.pick_one_minterm(dd.zero(), &vars), None);
    }

    #[test]
    fn test_picked_minterm_satisfies() {
        let dd = Bdd::default();
        let vars: Vec<Ref> = (0..3).map(|_| dd.new_var()).collect();
        let f = dd.and(dd.xor(vars[0], vars[1]), dd.not(vars[2]));
        let picked = dd.pick_one_minterm(f, &vars).unwrap();
        let m = dd.minterm(&vars, picked);
        assert!(!dd.is_zero(dd.and(f, m)));
    }

    #[test]
    fn test_many() {
        let dd = Bdd::default();
        let vars: Vec<Ref> = (0..3).map(|_| dd.new_var()).collect();
        assert_eq!(dd.and_many([]), dd.one());
        assert_eq!(dd.or_many([]), dd.zero());
        let all = dd.and_many(vars.iter().copied());
        assert_eq!(all, dd.minterm(&vars, 0b111));
        let any = dd.or_many(vars.iter().copied());
        assert_eq!(dd.not(any), dd.minterm(&vars, 0));
    }
}
