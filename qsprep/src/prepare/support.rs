//! Support reduction: removing qubits that carry no entanglement.
//!
//! A support qubit in a product with the rest of the state is removed by a
//! single uncontrolled rotation. A support qubit that copies (or negates)
//! another one is made constant with one CNOT.

use itertools::Itertools;

use crate::circuit::{Control, Gate};
use crate::state::{McryOperator, PureState, QState};

/// Remove the separable and copied qubits from the support of `state`.
///
/// Returns the reduced state and the gates preparing `state` from it.
pub fn support_reduction(state: &QState) -> (QState, Vec<Gate>) {
    let mut state = state.clone();
    let mut gates = Vec::new();
    while let Some((reduced, gate)) = separable_qubit(&state).or_else(|| copied_qubit(&state)) {
        state = reduced;
        gates.push(gate);
    }
    gates.reverse();
    (state, gates)
}

/// Flip the single label of `state` down to `|0…0⟩`.
///
/// Returns the ground state, carrying the sign of the label, and the X gates
/// preparing `state` from it. Only defined on states of cardinality one.
pub fn x_reduction(state: &QState) -> (QState, Vec<Gate>) {
    debug_assert_eq!(state.get_sparsity(), 1);
    let num_qubits = state.num_qubits();
    let mut ground = QState::new(num_qubits);
    let mut gates = Vec::new();
    if let Some(ps) = state.pure_states().next() {
        gates.extend((0..num_qubits).filter(|&q| ps.bit(q)).map(Gate::x));
        ground.add_pure_state(PureState::new(0, ps.amplitude));
    }
    (ground, gates)
}

/// A support qubit whose value is independent from the others.
fn separable_qubit(state: &QState) -> Option<(QState, Gate)> {
    state
        .get_supports()
        .into_iter()
        .find_map(|q| McryOperator::merge0(q, vec![]).apply(state).ok())
}

/// A support qubit equal to (or the negation of) another support qubit on
/// every label.
fn copied_qubit(state: &QState) -> Option<(QState, Gate)> {
    let supports = state.get_supports();
    supports
        .iter()
        .copied()
        .tuple_combinations()
        .flat_map(|(a, b)| [(a, b), (b, a)])
        .find_map(|(control, target)| {
            let relation = state
                .pure_states()
                .map(|ps| ps.bit(control) == ps.bit(target))
                .all_equal_value()
                .ok()?;
            // Copies are cleared when the control is set, negations when it
            // is not.
            McryOperator::swap(target, vec![Control::new(control, relation)])
                .apply(state)
                .ok()
        })
}
