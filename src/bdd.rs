//! Reduced ordered BDD manager with complemented edges.
//!
//! Variables are 1-indexed; a smaller index is closer to the root.
//! The terminal node lives at index 1: `one` is `@1`, `zero` is `~@1`.
//! The high edge of a stored node is never complemented.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::reference::Ref;
use crate::utils::{pairing2, pairing3, MyHash};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::positive(0),
            high: Ref::positive(0),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpKey {
    Ite(Ref, Ref, Ref),
    Exists(Ref, Ref),
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        match self {
            OpKey::Ite(f, g, h) => pairing3(
                f.unsigned() as u64,
                g.unsigned() as u64,
                h.unsigned() as u64,
            ),
            OpKey::Exists(f, cube) => pairing2(
                pairing2(f.unsigned() as u64, cube.unsigned() as u64),
                u32::MAX as u64,
            ),
        }
    }
}

/// Sizing of a fresh [`Bdd`] manager.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BddConfig {
    /// Node storage is pre-allocated for `2^initial_capacity_bits` nodes and grows on demand.
    pub initial_capacity_bits: usize,
    /// The computed table has `2^cache_bits` slots.
    pub cache_bits: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            initial_capacity_bits: 16,
            cache_bits: 16,
        }
    }
}

impl BddConfig {
    pub fn with_capacity_bits(mut self, bits: usize) -> Self {
        self.initial_capacity_bits = bits;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }
}

pub struct Bdd {
    nodes: RefCell<Vec<Node>>,
    free: RefCell<Vec<u32>>,
    unique: RefCell<HashMap<Node, u32>>,
    cache: RefCell<Cache<OpKey, Ref>>,
    num_vars: Cell<u32>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    pub fn new(storage_bits: usize) -> Self {
        Self::with_config(BddConfig::default().with_capacity_bits(storage_bits))
    }

    pub fn with_config(config: BddConfig) -> Self {
        assert!(
            config.initial_capacity_bits <= 31,
            "Storage bits should be in the range 0..=31"
        );

        let mut nodes = Vec::with_capacity(1 << config.initial_capacity_bits);
        // Index 0 is reserved, index 1 is the terminal node.
        nodes.push(Node::default());
        nodes.push(Node::default());
        let one = Ref::positive(1);
        let zero = -one;

        Self {
            nodes: RefCell::new(nodes),
            free: RefCell::new(Vec::new()),
            unique: RefCell::new(HashMap::new()),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            num_vars: Cell::new(0),
            zero,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::with_config(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bdd")
            .field("num_vars", &self.num_vars.get())
            .field("capacity", &self.nodes.borrow().capacity())
            .field("num_nodes", &self.num_nodes())
            .finish()
    }
}

impl Bdd {
    pub fn cache(&self) -> std::cell::Ref<'_, Cache<OpKey, Ref>> {
        self.cache.borrow()
    }

    pub fn variable(&self, index: usize) -> u32 {
        self.nodes.borrow()[index].variable
    }
    pub fn low(&self, index: usize) -> Ref {
        self.nodes.borrow()[index].low
    }
    pub fn high(&self, index: usize) -> Ref {
        self.nodes.borrow()[index].high
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == self.one.index()
    }

    /// Position of the node's variable in the order; terminals sit below every variable.
    fn level(&self, node: Ref) -> u32 {
        if self.is_terminal(node) {
            u32::MAX
        } else {
            self.variable(node.index())
        }
    }

    /// Number of variables allocated with [`Bdd::new_variable`] or [`Bdd::mk_var`].
    pub fn num_vars(&self) -> usize {
        self.num_vars.get() as usize
    }

    /// Number of live nodes, including the terminal.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len() - 1 - self.free.borrow().len()
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        debug!("mk(v = {}, low = {}, high = {})", v, low, high);

        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle canonicity
        if high.is_negated() {
            debug!("mk: restoring canonicity");
            return -self.mk_node(v, -low, -high);
        }

        // Handle duplicates
        if low == high {
            debug!("mk: duplicates {} == {}", low, high);
            return low;
        }

        let node = Node {
            variable: v,
            low,
            high,
        };
        if let Some(&i) = self.unique.borrow().get(&node) {
            return Ref::positive(i);
        }

        let reused = self.free.borrow_mut().pop();
        let i = match reused {
            Some(i) => {
                self.nodes.borrow_mut()[i as usize] = node;
                i
            }
            None => {
                let mut nodes = self.nodes.borrow_mut();
                assert!(nodes.len() < i32::MAX as usize, "Node storage is full");
                nodes.push(node);
                (nodes.len() - 1) as u32
            }
        };
        self.unique.borrow_mut().insert(node, i);
        Ref::positive(i)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");
        if v > self.num_vars.get() {
            self.num_vars.set(v);
        }
        self.mk_node(v, self.zero, self.one)
    }

    /// Allocate the next unused variable and return its positive literal.
    pub fn new_variable(&self) -> Ref {
        self.mk_var(self.num_vars.get() + 1)
    }

    /// Conjunction of the given variables, all in positive polarity.
    pub fn mk_cube(&self, variables: impl IntoIterator<Item = u32>) -> Ref {
        let mut variables: Vec<u32> = variables.into_iter().collect();
        variables.sort_unstable();
        variables.dedup();
        let mut res = self.one;
        for &v in variables.iter().rev() {
            res = self.mk_node(v, self.zero, res);
        }
        res
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        let i = node.index();
        if self.is_terminal(node) || v < self.variable(i) {
            return (node, node);
        }
        assert_eq!(v, self.variable(i));
        if node.is_negated() {
            (-self.low(i), -self.high(i))
        } else {
            (self.low(i), self.high(i))
        }
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // More base cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        //   ite(F,1,~F) => 1
        //   ite(F,F,1) => 1
        //   ite(F,~F,0) => 0
        //   ite(F,0,F) => 0
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }
        if self.is_one(g) && h == -f {
            return self.one;
        }
        if g == f && self.is_one(h) {
            return self.one;
        }
        if g == -f && self.is_zero(h) {
            return self.zero;
        }
        if self.is_zero(g) && h == f {
            return self.zero;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, self.one, h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero);
        }
        if g == -f {
            return self.apply_ite(f, self.zero, h);
        }
        if h == -f {
            return self.apply_ite(f, g, self.one);
        }

        let i = self.level(f);
        let j = self.level(g);
        let k = self.level(h);

        // Equivalent pairs (choose the one with the lowest variable):
        //   ite(F,1,H) == ite(H,1,F) == F ∨ H
        //   ite(F,G,0) == ite(G,F,0) == F ∧ G
        //   ite(F,G,1) == ite(~G,~F,1) == F -> G
        //   ite(F,0,H) == ite(~H,0,~F) == ~F ∧ H
        //   ite(F,G,~G) == ite(G,F,~F)
        if self.is_one(g) && k < i {
            return self.apply_ite(h, self.one, f);
        }
        if self.is_zero(h) && j < i {
            return self.apply_ite(g, f, self.zero);
        }
        if self.is_one(h) && j < i {
            return self.apply_ite(-g, -f, self.one);
        }
        if self.is_zero(g) && k < i {
            return self.apply_ite(-h, self.zero, -f);
        }
        if g == -h && j < i {
            return self.apply_ite(g, f, -f);
        }

        let (mut f, mut g, mut h) = (f, g, h);

        // ite(~F,G,H) => ite(F,H,G)
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }

        // ite(F,~G,H) => ~ite(F,G,~H)
        let mut n = false;
        if g.is_negated() {
            n = true;
            g = -g;
            h = -h;
        }

        let (f, g, h) = (f, g, h);

        let key = OpKey::Ite(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            debug!("cache: apply_ite(f = {}, g = {}, h = {}) -> {}", f, g, h, res);
            return if n { -res } else { res };
        }

        let m = i.min(j).min(k);
        debug!("min variable = {}", m);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);

        let res = self.mk_node(m, e, t);
        debug!("computed: apply_ite(f = {}, g = {}, h = {}) -> {}", f, g, h, res);
        self.cache.borrow_mut().insert(key, res);

        if n {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        debug!("apply_and(u = {}, v = {})", u, v);
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        debug!("apply_or(u = {}, v = {})", u, v);
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        debug!("apply_xor(u = {}, v = {})", u, v);
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        debug!("apply_eq(u = {}, v = {})", u, v);
        self.apply_ite(u, v, -v)
    }

    /// Existential quantification of `f` over the given variables.
    pub fn exists(&self, f: Ref, variables: impl IntoIterator<Item = u32>) -> Ref {
        let cube = self.mk_cube(variables);
        debug!("exists(f = {}, cube = {})", f, cube);
        self.exists_cube(f, cube)
    }

    fn exists_cube(&self, f: Ref, cube: Ref) -> Ref {
        if self.is_terminal(f) || self.is_one(cube) {
            return f;
        }

        let v = self.variable(f.index());

        // Skip the quantified variables above the top of f.
        let mut cube = cube;
        while !self.is_one(cube) && self.variable(cube.index()) < v {
            cube = self.high(cube.index());
        }
        if self.is_one(cube) {
            return f;
        }

        let key = OpKey::Exists(f, cube);
        if let Some(&res) = self.cache.borrow().get(&key) {
            debug!("cache: exists(f = {}, cube = {}) -> {}", f, cube, res);
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, v);
        let res = if self.variable(cube.index()) == v {
            let rest = self.high(cube.index());
            let e = self.exists_cube(f0, rest);
            if self.is_one(e) {
                self.one
            } else {
                let t = self.exists_cube(f1, rest);
                self.apply_or(e, t)
            }
        } else {
            let e = self.exists_cube(f0, cube);
            let t = self.exists_cube(f1, cube);
            self.mk_node(v, e, t)
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }

    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    /// Number of nodes reachable from `f`, including the terminal.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Free every node not reachable from `roots`.
    ///
    /// Handles not reachable from `roots` are invalid afterwards.
    pub fn collect_garbage(&self, roots: &[Ref]) {
        debug!("Collecting garbage...");

        self.cache.borrow_mut().clear();

        let alive = self.descendants(roots.iter().copied());

        let mut nodes = self.nodes.borrow_mut();
        let mut unique = self.unique.borrow_mut();
        let mut free = self.free.borrow_mut();
        let mut dropped = 0;
        for i in 2..nodes.len() {
            if nodes[i].variable != 0 && !alive.contains(&i) {
                unique.remove(&nodes[i]);
                nodes[i] = Node::default();
                free.push(i as u32);
                dropped += 1;
            }
        }
        debug!("Dropped {} nodes, {} alive", dropped, alive.len());
    }
}
