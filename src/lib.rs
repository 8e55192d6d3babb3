//! # rcbdd-rs: Reversible circuits and their characteristic BDDs
//!
//! **`rcbdd-rs`** models reversible circuits (NOT, CNOT, Toffoli and Fredkin gates over numbered lines)
//! and encodes the function of a circuit as a **characteristic function** χ(x, y) in a reduced ordered BDD
//! with complemented edges.
//!
//! ## What is an RCBDD?
//!
//! For an `n`-line reversible function `f`, the characteristic function is a Boolean function over `2n` variables,
//! one input variable `x_i` and one output variable `y_i` per line, with χ(x, y) = 1 exactly when `f(x) = y`.
//! Since BDDs are **canonical**, two circuits realize the same function iff their χ are the same node,
//! so equivalence, identity and self-inverse checks reduce to a handle comparison.
//!
//! ## Key Features
//!
//! - **Circuit model**: [`Gate`][crate::gate::Gate] is a closed enum with typed [`Control`][crate::gate::Control]s;
//!   [`Circuit`][crate::circuit::Circuit] keeps per-line names, constants and garbage flags.
//! - **Symbolic construction**: [`Rcbdd::create_from_circuit`][crate::rcbdd::Rcbdd::create_from_circuit] applies
//!   one gate at a time to the identity relation, with an optional node [`Budget`][crate::budget::Budget].
//! - **Embedding**: [`embed_pla`][crate::embed::embed_pla] turns an irreversible, already extended PLA
//!   specification into a reversible function by adding constant and garbage lines.
//! - **Pluggable engine**: everything above the [`DecisionDiagram`][crate::manager::DecisionDiagram] trait is
//!   generic over the decision diagram manager; [`Bdd`][crate::bdd::Bdd] is the default.
//!
//! ## Basic Usage
//!
//! ```rust
//! use rcbdd_rs::circuit::Circuit;
//! use rcbdd_rs::gate::Control;
//! use rcbdd_rs::rcbdd::{Rcbdd, VariableOrder};
//! use rcbdd_rs::transform::{concat, reverse_circuit};
//!
//! // 1. A 3-line circuit
//! let mut circuit = Circuit::new(3);
//! circuit.append_toffoli([Control::positive(0), Control::positive(1)], 2)?;
//! circuit.append_cnot(0, 1)?;
//!
//! // 2. A manager with a variable pair per line
//! let mut rcbdd: Rcbdd = Rcbdd::new();
//! rcbdd.initialize_manager();
//! rcbdd.create_variables(3, VariableOrder::Interleaved)?;
//!
//! // 3. Query the characteristic function
//! let chi = rcbdd.create_from_circuit(&circuit)?;
//! assert!(rcbdd.is_bijection(chi)?);
//! assert_eq!(rcbdd.to_permutation(chi)?, vec![0, 3, 2, 5, 4, 7, 6, 1]);
//!
//! // 4. A circuit followed by its reverse is the identity
//! let round_trip = concat(&circuit, &reverse_circuit(&circuit))?;
//! assert!(rcbdd.is_identity(&round_trip)?);
//! # Ok::<(), rcbdd_rs::error::Error>(())
//! ```
//!
//! ## Core Components
//!
//! - **[`rcbdd`]**: the characteristic function manager and its queries.
//! - **[`rcbdd_synthesis`]**: Toffoli circuits straight from a characteristic function.
//! - **[`embed`]**: PLA specifications and their reversible embeddings.
//! - **[`transform`]**, **[`simulation`]**, **[`synthesis`]**: explicit circuit rewriting and evaluation.
//! - **[`bdd`]**: the decision diagram engine.

pub mod bdd;
pub mod budget;
pub mod cache;
pub mod circuit;
pub mod embed;
pub mod error;
pub mod gate;
pub mod manager;
pub mod permutation;
pub mod print;
pub mod rcbdd;
pub mod rcbdd_synthesis;
pub mod reference;
pub mod sat;
pub mod simulation;
pub mod synthesis;
pub mod transform;
pub mod utils;
