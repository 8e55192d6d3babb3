//! Symbolic synthesis of Toffoli circuits from characteristic functions.
//!
//! Lines are fixed one at a time. For line `v`, a left gate controlled by the
//! other inputs and a right gate controlled by the other outputs, both with
//! target `v`, are chosen such that the remaining function maps `x_v` to
//! `y_v = x_v`. Gates on later lines keep that property, so once every line is
//! fixed the remaining function is the identity. The circuit is then the left
//! gates in order followed by the right gates in reverse order.
//!
//! Two inputs that differ only in `x_v` form a left block, two outputs that
//! differ only in `y_v` form a right block. Flipping `x_v` on a set of left
//! blocks (or `y_v` on a set of right blocks) is a single gate, whose control
//! function is emitted as one Toffoli gate per disjoint cube.

use log::{debug, info, warn};

use crate::budget::Budget;
use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::gate::{Control, Gate, Line};
use crate::manager::DecisionDiagram;
use crate::rcbdd::Rcbdd;

/// Patterns are handled as `u64` while resolving cycles.
pub const MAX_SYMBOLIC_LINES: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct RcbddSynthesis {
    /// Checked against the size of the intermediate χ after every resolution step.
    pub budget: Budget,
}

impl RcbddSynthesis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(budget: Budget) -> Self {
        Self { budget }
    }

    /// A circuit realizing `chi`, carrying the metadata of `cf`.
    pub fn synthesize<M: DecisionDiagram>(&self, cf: &Rcbdd<M>, chi: M::Node) -> Result<Circuit> {
        let manager = cf.manager()?;
        let lines = cf.num_vars();
        if cf.created_lines().is_none() {
            return Err(Error::VariablesNotCreated);
        }
        if lines > MAX_SYMBOLIC_LINES {
            return Err(Error::TooManyLines {
                lines,
                max: MAX_SYMBOLIC_LINES,
            });
        }
        if !cf.is_bijection(chi)? {
            return Err(Error::NotAPermutation(
                "characteristic function is not a bijection".to_string(),
            ));
        }

        let mut state = Synthesizer {
            cf,
            manager,
            budget: &self.budget,
            f: chi,
            left: Vec::new(),
            right: Vec::new(),
            walks: 0,
        };
        for v in 0..lines {
            state.fix_line(v)?;
        }
        debug_assert!(cf.is_identity_chi(state.f).unwrap_or(false));

        let mut circuit = Circuit::new(lines);
        for gate in state.left.into_iter().chain(state.right.into_iter().rev()) {
            circuit.push_gate(gate);
        }
        cf.copy_meta_data(&mut circuit)?;
        info!(
            "Synthesized {} gates on {} lines from χ ({} cycle walks)",
            circuit.num_gates(),
            lines,
            state.walks
        );
        Ok(circuit)
    }
}

struct Synthesizer<'a, M: DecisionDiagram> {
    cf: &'a Rcbdd<M>,
    manager: &'a M,
    budget: &'a Budget,
    /// Remaining function between the left and the right gates.
    f: M::Node,
    left: Vec<Gate>,
    right: Vec<Gate>,
    walks: usize,
}

impl<M: DecisionDiagram> Synthesizer<'_, M> {
    fn check_budget(&self, v: Line) -> Result<()> {
        let nodes = if self.budget.node_limit.is_some() {
            self.manager.size(self.f)
        } else {
            0
        };
        self.budget.check(nodes).inspect_err(|err| {
            warn!("rcbdd_synthesis: stopped at line {}: {}", v, err)
        })
    }

    fn fix_line(&mut self, v: Line) -> Result<()> {
        let cf = self.cf;
        let manager = self.manager;

        // Left blocks whose inputs both change line v.
        let pp = cf.cofactor(self.f, v, true, false)?;
        let np = cf.cofactor(self.f, v, false, true)?;
        let lf = manager.and(cf.remove_ys(pp)?, cf.remove_ys(np)?);
        self.apply_left(v, lf);

        // Right blocks whose outputs are both reached with line v changed.
        let pp = cf.cofactor(self.f, v, true, false)?;
        let np = cf.cofactor(self.f, v, false, true)?;
        let rf = manager.and(cf.remove_xs(pp)?, cf.remove_xs(np)?);
        self.apply_right(v, rf);
        self.check_budget(v)?;

        // Longer cycles, one at a time.
        loop {
            let pp = cf.cofactor(self.f, v, true, false)?;
            if manager.is_zero(pp) {
                break;
            }
            let x = manager
                .pick_one_minterm(cf.remove_ys(pp)?, cf.xs())
                .ok_or_else(|| Error::NotAPermutation("empty cofactor".to_string()))?;
            self.walk(v, x | (1 << v))?;
            self.check_budget(v)?;
        }
        debug!("rcbdd_synthesis: line {} fixed, χ has {} nodes", v, manager.size(self.f));
        Ok(())
    }

    /// Starting from input `x` (with `x_v = 1`, mapped to `y_v = 0`), alternately
    /// flip its left block and the right block of its partner's image until an
    /// input with `x_v = 0` mapped to `y_v = 1` is reached. Both gates together
    /// fix two inputs and leave every other input as it was.
    fn walk(&mut self, v: Line, x: u64) -> Result<()> {
        let cf = self.cf;
        let manager = self.manager;
        let bit = 1u64 << v;

        let mut left_blocks = manager.zero();
        let mut right_blocks = manager.zero();
        let mut x = x;
        loop {
            left_blocks = manager.or(left_blocks, block(manager, cf.xs(), v, x));
            let y = self.image(x ^ bit)?;
            if y & bit != 0 {
                break;
            }
            right_blocks = manager.or(right_blocks, block(manager, cf.ys(), v, y));
            x = self.preimage(y ^ bit)?;
            if x & bit == 0 {
                break;
            }
        }
        self.walks += 1;

        self.apply_left(v, left_blocks);
        self.apply_right(v, right_blocks);
        Ok(())
    }

    fn image(&self, x: u64) -> Result<u64> {
        let (cf, manager) = (self.cf, self.manager);
        let restricted = manager.and(self.f, manager.minterm(cf.xs(), x));
        manager
            .pick_one_minterm(manager.exists(restricted, cf.xs()), cf.ys())
            .ok_or_else(|| Error::NotAPermutation(format!("input {} has no image", x)))
    }

    fn preimage(&self, y: u64) -> Result<u64> {
        let (cf, manager) = (self.cf, self.manager);
        let restricted = manager.and(self.f, manager.minterm(cf.ys(), y));
        manager
            .pick_one_minterm(manager.exists(restricted, cf.ys()), cf.xs())
            .ok_or_else(|| Error::NotAPermutation(format!("output {} has no preimage", y)))
    }

    /// Precede the remaining function by a gate flipping `x_v` where `control` holds.
    fn apply_left(&mut self, v: Line, control: M::Node) {
        if self.manager.is_zero(control) {
            return;
        }
        self.f = flip_where(self.manager, self.f, self.cf.x(v), control);
        self.left.extend(toffoli_gates(self.manager, control, self.cf.xs(), v));
    }

    /// Follow the remaining function by a gate flipping `y_v` where `control` holds.
    fn apply_right(&mut self, v: Line, control: M::Node) {
        if self.manager.is_zero(control) {
            return;
        }
        self.f = flip_where(self.manager, self.f, self.cf.y(v), control);
        self.right.extend(toffoli_gates(self.manager, control, self.cf.ys(), v));
    }
}

/// `f` with `var` negated wherever `control` holds; `control` must not depend on `var`.
fn flip_where<M: DecisionDiagram>(manager: &M, f: M::Node, var: M::Node, control: M::Node) -> M::Node {
    let flipped = manager.compose(f, var, manager.not(var));
    manager.ite(control, flipped, f)
}

/// The block of `pattern` over `vars`: every variable but line `v` fixed.
fn block<M: DecisionDiagram>(manager: &M, vars: &[M::Node], v: Line, pattern: u64) -> M::Node {
    manager.cube(
        vars.iter()
            .enumerate()
            .filter(|&(k, _)| k != v)
            .map(|(k, &var)| (var, (pattern >> k) & 1 == 1)),
    )
}

/// One Toffoli gate with target `target` per disjoint cube of `control` over `vars`.
fn toffoli_gates<M: DecisionDiagram>(
    manager: &M,
    control: M::Node,
    vars: &[M::Node],
    target: Line,
) -> Vec<Gate> {
    let mut gates = Vec::new();
    let mut cube = Vec::new();
    collect_cubes(manager, control, vars, 0, &mut cube, &mut |controls: &[Control]| {
        gates.push(Gate::toffoli(controls.iter().copied(), target))
    });
    gates
}

fn collect_cubes<M: DecisionDiagram>(
    manager: &M,
    f: M::Node,
    vars: &[M::Node],
    k: Line,
    cube: &mut Vec<Control>,
    emit: &mut dyn FnMut(&[Control]),
) {
    if manager.is_zero(f) {
        return;
    }
    if manager.is_one(f) {
        emit(cube.as_slice());
        return;
    }
    let Some(&var) = vars.get(k) else {
        return;
    };
    let f0 = manager.cofactor(f, var, false);
    let f1 = manager.cofactor(f, var, true);
    if manager.equal(f0, f1) {
        collect_cubes(manager, f0, vars, k + 1, cube, emit);
        return;
    }
    cube.push(Control::negative(k));
    collect_cubes(manager, f0, vars, k + 1, cube, emit);
    cube.pop();
    cube.push(Control::positive(k));
    collect_cubes(manager, f1, vars, k + 1, cube, emit);
    cube.pop();
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::budget::CancellationToken;
    use crate::rcbdd::VariableOrder;
    use crate::simulation::circuit_to_permutation;

    fn rcbdd(lines: usize) -> Rcbdd {
        let mut r = Rcbdd::new();
        r.initialize_manager();
        r.create_variables(lines, VariableOrder::Interleaved).unwrap();
        r
    }

    #[test]
    fn test_identity_needs_no_gates() {
        let r = rcbdd(3);
        let c = RcbddSynthesis::new()
            .synthesize(&r, r.identity().unwrap())
            .unwrap();
        assert_eq!(c.lines(), 3);
        assert!(c.is_empty());
    }

    #[test]
    fn test_single_line() {
        let r = rcbdd(1);
        let chi = r.create_from_permutation(&[1, 0]).unwrap();
        let c = RcbddSynthesis::new().synthesize(&r, chi).unwrap();
        assert_eq!(c.gates(), &[Gate::not(0)]);
    }

    #[test]
    fn test_cycles() {
        let r = rcbdd(3);
        for perm in [
            vec![7, 0, 1, 2, 3, 4, 5, 6],
            vec![1, 2, 3, 0, 5, 7, 4, 6],
            vec![0, 1, 2, 4, 3, 5, 6, 7],
            vec![6, 3, 0, 5, 2, 7, 4, 1],
        ] {
            let chi = r.create_from_permutation(&perm).unwrap();
            let c = RcbddSynthesis::new().synthesize(&r, chi).unwrap();
            assert!(c.iter().all(Gate::is_toffoli));
            assert_eq!(circuit_to_permutation(&c).unwrap(), perm);
            assert_eq!(r.create_from_circuit(&c).unwrap(), chi);
        }
    }

    #[test]
    fn test_every_permutation_of_two_lines() {
        let r = rcbdd(2);
        let mut perms = vec![vec![]];
        for value in 0..4u64 {
            perms = perms
                .into_iter()
                .flat_map(|p: Vec<u64>| {
                    (0..=p.len()).map(move |i| {
                        let mut q = p.clone();
                        q.insert(i, value);
                        q
                    })
                })
                .collect();
        }
        assert_eq!(perms.len(), 24);
        for perm in perms {
            let chi = r.create_from_permutation(&perm).unwrap();
            let c = RcbddSynthesis::new().synthesize(&r, chi).unwrap();
            assert_eq!(circuit_to_permutation(&c).unwrap(), perm, "{:?}", perm);
        }
    }

    #[test]
    fn test_block_cubes() {
        let r = rcbdd(3);
        let m = r.manager().unwrap();
        // x0 | (~x0 & x2), as disjoint cubes
        let control = m.or(r.x(0), r.x(2));
        let gates = toffoli_gates(m, control, r.xs(), 1);
        assert_eq!(
            gates,
            vec![
                Gate::toffoli([Control::negative(0), Control::positive(2)], 1),
                Gate::toffoli([Control::positive(0)], 1),
            ]
        );
        assert_eq!(toffoli_gates(m, m.one(), r.xs(), 2), vec![Gate::not(2)]);
    }

    #[test]
    fn test_rejects_non_bijection() {
        let r = rcbdd(2);
        let m = r.manager().unwrap();
        let chi = m.and(r.identity().unwrap(), m.not(r.x(0)));
        assert!(matches!(
            RcbddSynthesis::new().synthesize(&r, chi),
            Err(Error::NotAPermutation(_))
        ));
    }

    #[test]
    fn test_cancelled() {
        let r = rcbdd(3);
        let chi = r.create_from_permutation(&[7, 0, 1, 2, 3, 4, 5, 6]).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let synthesis = RcbddSynthesis::with_budget(Budget::default().with_cancellation(token));
        assert!(matches!(synthesis.synthesize(&r, chi), Err(Error::Cancelled)));
    }
}
