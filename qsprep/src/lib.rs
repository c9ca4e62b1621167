//! qsprep: CNOT-efficient preparation of sparse real quantum states.
//!
//! Given a target state with real amplitudes, qsprep builds a circuit of
//! multi-controlled Y rotations and X gates preparing it from `|0…0⟩`,
//! trying to use as few CNOTs as possible.
//!
//! The crate has two synthesis engines:
//!
//! - [`cnry`] is an exact search. It runs Dijkstra over sets of basis labels,
//!   where every edge is a multi-controlled rotation weighted by its CNOT
//!   cost, and returns a provably minimal circuit for up to
//!   [`cnry::MAX_SOLVER_QUBITS`] qubits.
//! - [`prepare`] is a recursive planner for larger states. It removes
//!   unentangled qubits, merges labels or qubits one at a time, and hands
//!   small enough sub-problems to the exact search.
//!
//! # Example
//!
//! ```
//! use qsprep::prepare_state_from_amplitudes;
//!
//! // (|000⟩ + |100⟩) / √2: qubit 2 is in a product with the others.
//! let amplitudes = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
//! let circ = prepare_state_from_amplitudes(&amplitudes).unwrap();
//!
//! assert_eq!(circ.cnot_cost(), 0);
//! assert_eq!(circ.num_gates(), 1);
//! println!("{circ}");
//! ```

pub mod circuit;
pub mod cnry;
pub mod prepare;
pub mod state;

pub use circuit::{Circuit, CircuitError, Control, Gate, Rotation};
pub use cnry::{cnry_solver, CnRySolver, SolverError, SolverOptions};
pub use prepare::{
    prepare_state, prepare_state_from_amplitudes, prepare_state_with_stats, PrepareStateError,
    StatePreparationParameters, StatePreparationStatistics,
};
pub use state::{PureState, QState, StateError};
