//! Error type shared by the circuit model, the RCBDD core and the embedding.

use num_bigint::BigUint;
use thiserror::Error;

use crate::gate::Line;

#[derive(Debug, Error)]
pub enum Error {
    /// A construction method was called before `initialize_manager`.
    #[error("decision diagram manager is not initialized")]
    ManagerNotInitialized,

    /// `create_variables` was called a second time on the same manager.
    #[error("variables were already created for {0} lines")]
    VariablesAlreadyCreated(usize),

    /// An operation needs the `x`/`y` variables, but none were created yet.
    #[error("variables were not created")]
    VariablesNotCreated,

    /// Relational composition needs the temporary `z` variables.
    #[error("temporary variables were not created")]
    TmpVariablesNotCreated,

    #[error("line count mismatch: expected {expected}, got {actual}")]
    LineCountMismatch { expected: usize, actual: usize },

    #[error("line {line} is out of range for a circuit with {lines} lines")]
    LineOutOfRange { line: Line, lines: usize },

    /// `copy_circuit` would drop a line that a retained gate still needs.
    #[error("gate #{gate} needs line {line}, which is excluded by the line filter")]
    LineFilterMismatch { gate: usize, line: Line },

    #[error("line {0} occurs more than once in the line filter")]
    DuplicateFilterLine(Line),

    #[error("invalid cube: {0}")]
    InvalidCube(String),

    #[error("cube width mismatch: expected {expected}, got {actual}")]
    CubeWidthMismatch { expected: usize, actual: usize },

    /// Some input patterns are not covered by any cube.
    #[error("specification is not total: {uncovered} input patterns are unmapped")]
    NotTotal { uncovered: BigUint },

    /// Two overlapping cubes disagree on an output.
    #[error("specification is not single-valued: input {input} has conflicting outputs")]
    NotSingleValued { input: String },

    #[error("not a permutation: {0}")]
    NotAPermutation(String),

    /// Decision diagram blow-up: the node limit of the budget was exceeded.
    #[error("decision diagram too large ({nodes} nodes, limit {limit}), aborting")]
    ResourceExhausted { nodes: usize, limit: usize },

    #[error("operation was cancelled")]
    Cancelled,

    /// Explicit enumeration over `2^lines` patterns was requested for too many lines.
    #[error("too many lines for explicit enumeration: {lines} (max {max})")]
    TooManyLines { lines: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
