//! Exact CNOT synthesis by best-first search over label sets.
//!
//! The CnRy solver searches for the cheapest sequence of multi-controlled
//! bit flips and Y rotations that turns `|0…0⟩` into a state with the same
//! support as the target. Nodes of the search graph are [`CnRyState`]s (sets
//! of basis labels), edges are [`CnRyMove`]s, and the cost of a path is its
//! CNOT count. Once a path is found, [`solution_to_circuit`] replays it
//! backwards on the target amplitudes to recover the rotation angles.
//!
//! Nodes are stored as bitmasks, so the solver is limited to
//! [`MAX_SOLVER_QUBITS`] qubits.

pub mod emit;
pub mod log;
pub mod moves;
mod pqueue;
pub mod solver;
pub mod state;

use derive_more::{Display, Error, From};

pub use emit::solution_to_circuit;
pub use log::SearchLogger;
pub use moves::{get_all_moves, CnRyDirection, CnRyMove};
pub use solver::{cnry_solver, cnry_solver_with_log, CnRySolution, CnRySolver, SolverOptions};
pub use state::{CnRyState, MAX_SOLVER_QUBITS};

use crate::circuit::CircuitError;
use crate::state::StateError;

/// Errors that can occur when running the CnRy solver.
#[derive(Debug, Display, Clone, PartialEq, Error, From)]
#[non_exhaustive]
pub enum SolverError {
    /// The state has more qubits than a search node can represent.
    #[display("The solver supports at most {MAX_SOLVER_QUBITS} qubits, got {num_qubits}")]
    #[from(ignore)]
    TooManyQubits {
        /// The number of qubits of the state.
        num_qubits: usize,
    },
    /// No decomposition exists within the CNOT limit.
    #[display("No decomposition found within {cnot_limit} CNOTs")]
    #[from(ignore)]
    Infeasible {
        /// The CNOT limit of the search.
        cnot_limit: usize,
    },
    /// The queue emptied without reaching the target.
    #[display("The search space was exhausted without reaching the target")]
    SearchExhausted,
    /// A merge step needs more rotation angles than a single split can provide.
    #[display("Cannot emit a merge needing {num_angles} distinct rotation angles")]
    #[from(ignore)]
    UnsupportedSplit {
        /// The number of distinct angles.
        num_angles: usize,
    },
    /// A merge step of the trace did not merge any pair.
    #[display("The merge on qubit {pivot} does not merge any pair")]
    #[from(ignore)]
    MissingRotation {
        /// The pivot qubit of the move.
        pivot: usize,
    },
    /// The labels of the target do not match the solver or the trace.
    #[display("The target labels do not match the search")]
    LabelMismatch,
    /// The target is not a valid state.
    #[display("Invalid target state: {_0}")]
    InvalidTarget(StateError),
    /// The emitted gates do not fit the circuit.
    #[display("Invalid circuit: {_0}")]
    Circuit(CircuitError),
}
