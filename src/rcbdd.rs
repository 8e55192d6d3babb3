//! Characteristic functions of reversible functions.
//!
//! For an `n`-line function, χ(x, y) is a BDD over `2n` variables:
//! `x_i` is line `i` before, `y_i` is line `i` after the modeled transformation,
//! and χ(x, y) = 1 iff the function maps pattern `x` to pattern `y`.
//!
//! Optional temporary variables `z_i` allow relational composition of two
//! characteristic functions.
//!
//! After an embedding, the first `n - num_inputs` input lines are constants
//! and the last `num_inputs` lines carry the primary inputs; the first
//! `num_outputs` output lines carry the results and the rest are garbage.

use std::path::Path;

use log::{debug, info, warn};
use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::budget::Budget;
use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::gate::{Control, Gate, Line};
use crate::manager::DecisionDiagram;
use crate::permutation::{is_permutation, MAX_EXPLICIT_LINES};
use crate::rcbdd_synthesis::RcbddSynthesis;
use crate::synthesis::TruthTableSynthesis;

/// Order of the `2n` variables in the manager.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum VariableOrder {
    /// `x0 < y0 < x1 < y1 < ...` (with `z_i` right after `y_i`)
    #[default]
    Interleaved,
    /// `x0 < x1 < ... < y0 < y1 < ...` (then `z0 < z1 < ...`)
    Blocked,
}

pub struct Rcbdd<M: DecisionDiagram = Bdd> {
    manager: Option<M>,
    lines: Option<usize>,
    xs: Vec<M::Node>,
    ys: Vec<M::Node>,
    zs: Vec<M::Node>,
    chi: Option<M::Node>,
    num_inputs: usize,
    num_outputs: usize,
    constant_value: bool,
    input_labels: Vec<String>,
    output_labels: Vec<String>,
}

impl<M: DecisionDiagram> Default for Rcbdd<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: DecisionDiagram> Rcbdd<M> {
    /// An instance without a manager; call [`Rcbdd::initialize_manager`] next.
    pub fn new() -> Self {
        Self {
            manager: None,
            lines: None,
            xs: Vec::new(),
            ys: Vec::new(),
            zs: Vec::new(),
            chi: None,
            num_inputs: 0,
            num_outputs: 0,
            constant_value: false,
            input_labels: Vec::new(),
            output_labels: Vec::new(),
        }
    }

    /// An instance owning the given manager.
    pub fn with_manager(manager: M) -> Self {
        Self {
            manager: Some(manager),
            ..Self::new()
        }
    }

    /// Create the owned manager unless one is present already.
    pub fn initialize_manager(&mut self) {
        if self.manager.is_none() {
            debug!("Initializing decision diagram manager");
            self.manager = Some(M::default());
        }
    }

    pub fn manager(&self) -> Result<&M> {
        self.manager.as_ref().ok_or(Error::ManagerNotInitialized)
    }

    pub(crate) fn take_manager(&mut self) -> Option<M> {
        self.manager.take()
    }

    /// Number of lines, if variables were created.
    pub fn created_lines(&self) -> Option<usize> {
        self.lines
    }

    fn context(&self) -> Result<(&M, usize)> {
        let manager = self.manager()?;
        let lines = self.lines.ok_or(Error::VariablesNotCreated)?;
        Ok((manager, lines))
    }

    /// Allocate the `x_i`/`y_i` pair for each of `n` lines. Allowed once per instance.
    pub fn create_variables(&mut self, n: usize, order: VariableOrder) -> Result<()> {
        self.allocate_variables(n, order, false)
    }

    /// Like [`Rcbdd::create_variables`], also allocating a temporary `z_i` per line,
    /// as needed by [`Rcbdd::compose`].
    pub fn create_variables_with_tmp(&mut self, n: usize, order: VariableOrder) -> Result<()> {
        self.allocate_variables(n, order, true)
    }

    fn allocate_variables(&mut self, n: usize, order: VariableOrder, tmp: bool) -> Result<()> {
        let manager = self.manager.as_ref().ok_or(Error::ManagerNotInitialized)?;
        if let Some(lines) = self.lines {
            return Err(Error::VariablesAlreadyCreated(lines));
        }

        match order {
            VariableOrder::Interleaved => {
                for _ in 0..n {
                    self.xs.push(manager.new_var());
                    self.ys.push(manager.new_var());
                    if tmp {
                        self.zs.push(manager.new_var());
                    }
                }
            }
            VariableOrder::Blocked => {
                self.xs = (0..n).map(|_| manager.new_var()).collect();
                self.ys = (0..n).map(|_| manager.new_var()).collect();
                if tmp {
                    self.zs = (0..n).map(|_| manager.new_var()).collect();
                }
            }
        }
        debug!(
            "Created {} variables for {} lines ({:?})",
            self.xs.len() + self.ys.len() + self.zs.len(),
            n,
            order
        );

        self.lines = Some(n);
        self.num_inputs = n;
        self.num_outputs = n;
        Ok(())
    }

    /// Number of lines, zero before [`Rcbdd::create_variables`].
    pub fn num_vars(&self) -> usize {
        self.lines.unwrap_or(0)
    }

    /// # Panics
    ///
    /// Panics if `i` is not a line.
    pub fn x(&self, i: Line) -> M::Node {
        self.xs[i]
    }

    /// # Panics
    ///
    /// Panics if `i` is not a line.
    pub fn y(&self, i: Line) -> M::Node {
        self.ys[i]
    }

    /// # Panics
    ///
    /// Panics if `i` is not a line or no temporary variables were created.
    pub fn z(&self, i: Line) -> M::Node {
        self.zs[i]
    }

    pub fn xs(&self) -> &[M::Node] {
        &self.xs
    }

    pub fn ys(&self) -> &[M::Node] {
        &self.ys
    }

    /// Temporary variables; empty unless created with [`Rcbdd::create_variables_with_tmp`].
    pub fn zs(&self) -> &[M::Node] {
        &self.zs
    }

    pub fn chi(&self) -> Option<M::Node> {
        self.chi
    }

    pub fn set_chi(&mut self, chi: M::Node) {
        self.chi = Some(chi);
    }

    fn check_line(&self, line: Line) -> Result<()> {
        let lines = self.num_vars();
        if line < lines {
            Ok(())
        } else {
            Err(Error::LineOutOfRange { line, lines })
        }
    }

    /// The identity relation `AND_i (x_i ⟺ y_i)`.
    pub fn identity(&self) -> Result<M::Node> {
        let (manager, _) = self.context()?;
        Ok(manager.and_many(
            self.xs
                .iter()
                .zip(&self.ys)
                .map(|(&x, &y)| manager.xnor(x, y)),
        ))
    }

    fn control_function(&self, manager: &M, controls: &[Control], vars: &[M::Node]) -> M::Node {
        manager.cube(controls.iter().map(|c| (vars[c.line()], c.polarity())))
    }

    /// The relation of a single gate.
    pub fn create_from_gate(&self, gate: &Gate) -> Result<M::Node> {
        let (manager, lines) = self.context()?;
        for line in gate.lines() {
            self.check_line(line)?;
        }

        let active = self.control_function(manager, gate.controls(), &self.xs);
        let next = |i: Line| -> M::Node {
            let x = self.xs[i];
            match gate {
                Gate::Toffoli { target, .. } if *target == i => manager.xor(x, active),
                Gate::Fredkin { targets, .. } if targets[0] == i => {
                    manager.ite(active, self.xs[targets[1]], x)
                }
                Gate::Fredkin { targets, .. } if targets[1] == i => {
                    manager.ite(active, self.xs[targets[0]], x)
                }
                _ => x,
            }
        };
        Ok(manager.and_many((0..lines).map(|i| manager.xnor(self.ys[i], next(i)))))
    }

    /// Compose the effect of `gate` onto the relation `acc`.
    ///
    /// Every gate is an involution, so `acc'(x, y) = acc(x, g(y))`.
    fn apply_gate(&self, manager: &M, acc: M::Node, gate: &Gate) -> M::Node {
        let active = self.control_function(manager, gate.controls(), &self.ys);
        let updated = match gate {
            Gate::Toffoli { target, .. } => {
                let y = self.ys[*target];
                manager.compose(acc, y, manager.not(y))
            }
            Gate::Fredkin { targets, .. } => {
                manager.swap_variables(acc, self.ys[targets[0]], self.ys[targets[1]])
            }
        };
        manager.ite(active, updated, acc)
    }

    /// χ of `circuit`, which must have exactly as many lines as variables were created for.
    pub fn create_from_circuit(&self, circuit: &Circuit) -> Result<M::Node> {
        self.create_from_circuit_with_budget(circuit, &Budget::unlimited())
    }

    /// Like [`Rcbdd::create_from_circuit`], checking `budget` after every gate.
    pub fn create_from_circuit_with_budget(
        &self,
        circuit: &Circuit,
        budget: &Budget,
    ) -> Result<M::Node> {
        let (manager, lines) = self.context()?;
        if circuit.lines() != lines {
            return Err(Error::LineCountMismatch {
                expected: lines,
                actual: circuit.lines(),
            });
        }

        let mut acc = self.identity()?;
        for (i, gate) in circuit.iter().enumerate() {
            acc = self.apply_gate(manager, acc, gate);
            let nodes = if budget.node_limit.is_some() {
                manager.size(acc)
            } else {
                0
            };
            budget.check(nodes).inspect_err(|err| {
                warn!(
                    "create_from_circuit: stopped after {} of {} gates: {}",
                    i + 1,
                    circuit.num_gates(),
                    err
                )
            })?;
        }
        debug!(
            "create_from_circuit: {} gates, χ has {} nodes",
            circuit.num_gates(),
            manager.size(acc)
        );
        Ok(acc)
    }

    /// Function of the `x` variables given by `table` (bit `k` of its argument is line `k`).
    fn function_from_table(&self, manager: &M, table: &dyn Fn(u64) -> bool) -> M::Node {
        fn build<D: DecisionDiagram>(
            manager: &D,
            xs: &[D::Node],
            k: usize,
            prefix: u64,
            table: &dyn Fn(u64) -> bool,
        ) -> D::Node {
            if k == xs.len() {
                return manager.constant(table(prefix));
            }
            let high = build(manager, xs, k + 1, prefix | (1 << k), table);
            let low = build(manager, xs, k + 1, prefix, table);
            manager.ite(xs[k], high, low)
        }
        build(manager, &self.xs, 0, 0, table)
    }

    /// χ of an explicit permutation of `0..2^n`.
    pub fn create_from_permutation(&self, perm: &[u64]) -> Result<M::Node> {
        let (manager, lines) = self.context()?;
        if lines > MAX_EXPLICIT_LINES {
            return Err(Error::TooManyLines {
                lines,
                max: MAX_EXPLICIT_LINES,
            });
        }
        if perm.len() != 1 << lines {
            return Err(Error::NotAPermutation(format!(
                "expected {} entries, got {}",
                1u64 << lines,
                perm.len()
            )));
        }
        if !is_permutation(perm) {
            return Err(Error::NotAPermutation(
                "some value occurs more than once".to_string(),
            ));
        }

        let outputs = (0..lines).map(|j| {
            let f = self.function_from_table(manager, &|i: u64| (perm[i as usize] >> j) & 1 == 1);
            manager.xnor(self.ys[j], f)
        });
        Ok(manager.and_many(outputs))
    }

    pub fn is_identity_chi(&self, chi: M::Node) -> Result<bool> {
        let identity = self.identity()?;
        Ok(self.manager()?.equal(chi, identity))
    }

    /// Whether `circuit` realizes the identity.
    pub fn is_identity(&self, circuit: &Circuit) -> Result<bool> {
        let chi = self.create_from_circuit(circuit)?;
        self.is_identity_chi(chi)
    }

    /// χ of the inverse function: `x` and `y` exchanged.
    pub fn invert(&self, chi: M::Node) -> Result<M::Node> {
        let (manager, _) = self.context()?;
        Ok(self
            .xs
            .iter()
            .zip(&self.ys)
            .fold(chi, |acc, (&x, &y)| manager.swap_variables(acc, x, y)))
    }

    pub fn is_self_inverse(&self, chi: M::Node) -> Result<bool> {
        let inverse = self.invert(chi)?;
        Ok(self.manager()?.equal(chi, inverse))
    }

    pub fn remove_xs(&self, f: M::Node) -> Result<M::Node> {
        let (manager, _) = self.context()?;
        Ok(manager.exists(f, &self.xs))
    }

    pub fn remove_ys(&self, f: M::Node) -> Result<M::Node> {
        let (manager, _) = self.context()?;
        Ok(manager.exists(f, &self.ys))
    }

    fn tmp_context(&self) -> Result<&M> {
        let (manager, lines) = self.context()?;
        if self.zs.len() != lines {
            return Err(Error::TmpVariablesNotCreated);
        }
        Ok(manager)
    }

    pub fn remove_tmp(&self, f: M::Node) -> Result<M::Node> {
        let manager = self.tmp_context()?;
        Ok(manager.exists(f, &self.zs))
    }

    /// Rename `from` to `to` in `f`, which must not depend on `to`.
    fn rename(&self, manager: &M, f: M::Node, from: &[M::Node], to: &[M::Node]) -> M::Node {
        let linked = manager.and(
            f,
            manager.and_many(from.iter().zip(to).map(|(&a, &b)| manager.xnor(a, b))),
        );
        manager.exists(linked, from)
    }

    pub fn move_xs_to_tmp(&self, f: M::Node) -> Result<M::Node> {
        let manager = self.tmp_context()?;
        Ok(self.rename(manager, f, &self.xs, &self.zs))
    }

    pub fn move_ys_to_tmp(&self, f: M::Node) -> Result<M::Node> {
        let manager = self.tmp_context()?;
        Ok(self.rename(manager, f, &self.ys, &self.zs))
    }

    pub fn move_tmp_to_ys(&self, f: M::Node) -> Result<M::Node> {
        let manager = self.tmp_context()?;
        Ok(self.rename(manager, f, &self.zs, &self.ys))
    }

    /// Rename the `y` variables of `f`, which must not depend on `x`, to `x`.
    pub fn move_ys_to_xs(&self, f: M::Node) -> Result<M::Node> {
        let (manager, _) = self.context()?;
        Ok(self.rename(manager, f, &self.ys, &self.xs))
    }

    /// Relational product: `left` first, then `right`.
    ///
    /// ```text
    /// compose(l, r)(x, y) = ∃z. l(x, z) ∧ r(z, y)
    /// ```
    pub fn compose(&self, left: M::Node, right: M::Node) -> Result<M::Node> {
        let manager = self.tmp_context()?;
        let left = self.move_ys_to_tmp(left)?;
        let right = self.move_xs_to_tmp(right)?;
        Ok(manager.exists(manager.and(left, right), &self.zs))
    }

    /// `f` with `x_line := in_pol` and `y_line := out_pol`.
    pub fn cofactor(&self, f: M::Node, line: Line, in_pol: bool, out_pol: bool) -> Result<M::Node> {
        let (manager, _) = self.context()?;
        self.check_line(line)?;
        let f = manager.cofactor(f, self.xs[line], in_pol);
        Ok(manager.cofactor(f, self.ys[line], out_pol))
    }

    /// Every `x` has exactly one image and every `y` exactly one preimage.
    pub fn is_bijection(&self, chi: M::Node) -> Result<bool> {
        let (manager, lines) = self.context()?;
        let total = manager.is_one(self.remove_ys(chi)?);
        let onto = manager.is_one(self.remove_xs(chi)?);
        Ok(total && onto && manager.sat_count(chi, 2 * lines) == BigUint::from(1u32) << lines)
    }

    /// The explicit permutation encoded by `chi`.
    pub fn to_permutation(&self, chi: M::Node) -> Result<Vec<u64>> {
        let (manager, lines) = self.context()?;
        if lines > MAX_EXPLICIT_LINES {
            return Err(Error::TooManyLines {
                lines,
                max: MAX_EXPLICIT_LINES,
            });
        }

        let mut perm = Vec::with_capacity(1 << lines);
        for input in 0..1u64 << lines {
            let restricted = manager.and(chi, manager.minterm(&self.xs, input));
            let image = manager.exists(restricted, &self.xs);
            let output = manager.pick_one_minterm(image, &self.ys).ok_or_else(|| {
                Error::NotAPermutation(format!("input {} has no image", input))
            })?;
            if !manager.equal(image, manager.minterm(&self.ys, output)) {
                return Err(Error::NotAPermutation(format!(
                    "input {} has several images",
                    input
                )));
            }
            perm.push(output);
        }

        if !is_permutation(&perm) {
            return Err(Error::NotAPermutation(
                "two inputs share an image".to_string(),
            ));
        }
        Ok(perm)
    }

    /// A circuit realizing `chi`, carrying the embedding metadata.
    ///
    /// Works on χ directly, see [`RcbddSynthesis`].
    pub fn to_circuit(&self, chi: M::Node) -> Result<Circuit> {
        RcbddSynthesis::default().synthesize(self, chi)
    }

    /// A circuit realizing `chi`, built from its explicit permutation by `synthesis`.
    pub fn to_circuit_with(&self, chi: M::Node, synthesis: &impl TruthTableSynthesis) -> Result<Circuit> {
        let perm = self.to_permutation(chi)?;
        let mut circuit = synthesis.synthesize(&perm, self.num_vars())?;
        self.copy_meta_data(&mut circuit)?;
        info!(
            "Synthesized {} gates on {} lines",
            circuit.num_gates(),
            circuit.lines()
        );
        Ok(circuit)
    }

    /// Drop every node not reachable from the variables, the stored χ or `extra_roots`.
    pub fn collect_garbage(&self, extra_roots: &[M::Node]) -> Result<()> {
        let manager = self.manager()?;
        let mut roots: Vec<M::Node> = self
            .xs
            .iter()
            .chain(&self.ys)
            .chain(&self.zs)
            .copied()
            .collect();
        roots.extend(self.chi);
        roots.extend_from_slice(extra_roots);
        manager.collect_garbage(&roots);
        Ok(())
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn set_num_inputs(&mut self, num_inputs: usize) {
        self.num_inputs = num_inputs;
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn set_num_outputs(&mut self, num_outputs: usize) {
        self.num_outputs = num_outputs;
    }

    /// Value carried by the constant input lines.
    pub fn constant_value(&self) -> bool {
        self.constant_value
    }

    pub fn set_constant_value(&mut self, constant_value: bool) {
        self.constant_value = constant_value;
    }

    pub fn input_labels(&self) -> &[String] {
        &self.input_labels
    }

    pub fn set_input_labels(&mut self, labels: Vec<String>) {
        self.input_labels = labels;
    }

    pub fn output_labels(&self) -> &[String] {
        &self.output_labels
    }

    pub fn set_output_labels(&mut self, labels: Vec<String>) {
        self.output_labels = labels;
    }

    /// Number of constant input lines.
    pub fn num_constants(&self) -> usize {
        self.num_vars().saturating_sub(self.num_inputs)
    }

    /// Number of garbage output lines.
    pub fn num_garbage(&self) -> usize {
        self.num_vars().saturating_sub(self.num_outputs)
    }

    /// Input and output names of every line.
    fn line_names(&self) -> (Vec<String>, Vec<String>) {
        let lines = self.num_vars();
        let constant = if self.constant_value { "1" } else { "0" };
        let mut inputs = vec![constant.to_string(); lines];
        let offset = self.num_constants();
        for (k, label) in self.input_labels.iter().take(self.num_inputs).enumerate() {
            inputs[offset + k] = label.clone();
        }
        let mut outputs = vec!["-".to_string(); lines];
        for (k, label) in self.output_labels.iter().take(self.num_outputs).enumerate() {
            outputs[k] = label.clone();
        }
        (inputs, outputs)
    }

    /// Write line names, constants and garbage flags into `circuit`.
    pub fn copy_meta_data(&self, circuit: &mut Circuit) -> Result<()> {
        let lines = self.num_vars();
        circuit.set_lines(lines)?;

        let (inputs, outputs) = self.line_names();
        circuit.set_inputs(inputs)?;
        circuit.set_outputs(outputs)?;

        let constants = self.num_constants();
        circuit.set_constants(
            (0..lines)
                .map(|i| (i < constants).then_some(self.constant_value))
                .collect(),
        )?;
        circuit.set_garbage((0..lines).map(|i| i >= self.num_outputs).collect())?;
        Ok(())
    }

    fn pattern_bits(pattern: u64, lines: std::ops::Range<usize>) -> String {
        lines
            .map(|k| if (pattern >> k) & 1 == 1 { '1' } else { '0' })
            .collect()
    }

    /// Tabulate `chi` as rows `c..c x..x | y..y g..g`, one per input pattern.
    pub fn truth_table(&self, chi: M::Node) -> Result<String> {
        let perm = self.to_permutation(chi)?;
        let vars = self.num_vars();
        let (n, m) = (self.num_inputs.min(vars), self.num_outputs.min(vars));

        let mut out = String::new();
        out.push_str(&format!(
            "{} {} | {} {}\n",
            "c".repeat(vars - n),
            "x".repeat(n),
            "y".repeat(m),
            "g".repeat(vars - m)
        ));
        out.push_str(&format!("{}+{}\n", "-".repeat(vars + 2), "-".repeat(vars + 2)));
        for (input, &output) in perm.iter().enumerate() {
            let mut left = Self::pattern_bits(input as u64, 0..vars);
            left.insert(vars - n, ' ');
            let mut right = Self::pattern_bits(output, 0..vars);
            right.insert(m, ' ');
            out.push_str(&format!("{} | {}\n", left, right));
        }
        Ok(out)
    }

    /// PLA text of `chi`.
    ///
    /// With `full`, every line is listed as input and output. Otherwise only the
    /// primary inputs (with the constants fixed) and the non-garbage outputs are.
    pub fn pla_text(&self, chi: M::Node, full: bool) -> Result<String> {
        let perm = self.to_permutation(chi)?;
        let vars = self.num_vars();
        let (n, m) = (self.num_inputs.min(vars), self.num_outputs.min(vars));

        let mut out = String::new();
        if full {
            let (inputs, outputs) = self.line_names();
            out.push_str(&format!(".i {}\n.o {}\n", vars, vars));
            out.push_str(&format!(".ilb {}\n.ob {}\n", inputs.join(" "), outputs.join(" ")));
            for (input, &output) in perm.iter().enumerate() {
                out.push_str(&format!(
                    "{} {}\n",
                    Self::pattern_bits(input as u64, 0..vars),
                    Self::pattern_bits(output, 0..vars)
                ));
            }
        } else {
            out.push_str(&format!(".i {}\n.o {}\n", n, m));
            let labels = |names: &[String], count: usize| {
                names.iter().take(count).cloned().collect::<Vec<_>>().join(" ")
            };
            out.push_str(&format!(
                ".ilb {}\n.ob {}\n",
                labels(&self.input_labels, n),
                labels(&self.output_labels, m)
            ));
            let constants = vars - n;
            let constant_mask = if self.constant_value {
                (1u64 << constants) - 1
            } else {
                0
            };
            for x in 0..1u64 << n {
                let input = constant_mask | (x << constants);
                let output = perm[input as usize];
                out.push_str(&format!(
                    "{} {}\n",
                    Self::pattern_bits(input, constants..vars),
                    Self::pattern_bits(output, 0..m)
                ));
            }
        }
        out.push_str(".e\n");
        Ok(out)
    }

    pub fn write_pla(&self, chi: M::Node, path: impl AsRef<Path>, full: bool) -> Result<()> {
        let text = self.pla_text(chi, full)?;
        std::fs::write(path.as_ref(), text)?;
        debug!("Wrote PLA to {}", path.as_ref().display());
        Ok(())
    }
}
