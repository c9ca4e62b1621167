//! Qubit reduction (n-flow): remove one qubit from the support.
//!
//! The chosen support qubit is rotated to zero on every label, with one
//! angle per value of the other support qubits. The rotations form a single
//! multiplexed Y rotation.

use itertools::Itertools;

use super::PrepareStateError;
use crate::circuit::Gate;
use crate::state::operator::{merge_rotation, ANGLE_TOLERANCE};
use crate::state::{PureState, QState};

/// Remove one support qubit of `state`.
///
/// The removed qubit is the one leaving the fewest labels, the highest one on
/// ties. Returns the reduced state and the gate preparing `state` from it.
///
/// # Errors
///
/// Fails if `state` has an empty support.
pub fn qubit_reduction(
    state: &QState,
    supports: &[usize],
) -> Result<(QState, Vec<Gate>), PrepareStateError> {
    let qubit = supports
        .iter()
        .copied()
        .min_by_key(|&q| (reduced_cardinality(state, q), std::cmp::Reverse(q)))
        .ok_or(PrepareStateError::Irreducible {
            cardinality: state.get_sparsity(),
        })?;
    let selects = supports.iter().copied().filter(|&q| q != qubit).collect_vec();
    tracing::trace!(
        target: crate::cnry::log::PROGRESS_TARGET,
        "n-flow: remove qubit {qubit} with {} select lines",
        selects.len()
    );

    let mut thetas = vec![0.0; 1 << selects.len()];
    let mut seen = vec![false; thetas.len()];
    let mut reduced = QState::new(state.num_qubits());
    let keys = state.labels().map(|l| l & !(1 << qubit)).unique().collect_vec();
    for key in keys {
        let a_neg = state.amplitude(key);
        let a_pos = state.amplitude(key | (1 << qubit));
        let (theta, merged) = merge_rotation(a_neg, a_pos, false);
        let pattern = selects
            .iter()
            .enumerate()
            .fold(0, |p, (j, &q)| p | ((key >> q & 1) << j));
        thetas[pattern] = theta;
        seen[pattern] = true;
        reduced.add_pure_state(PureState::new(key, merged));
    }

    let used = thetas
        .iter()
        .zip(&seen)
        .filter_map(|(&t, &s)| s.then_some(t))
        .collect_vec();
    let uniform = used
        .iter()
        .tuple_windows()
        .all(|(a, b)| (a - b).abs() <= ANGLE_TOLERANCE);
    let gate = match uniform {
        true => Gate::ry(used.first().copied().unwrap_or(0.0), qubit),
        false => Gate::multiplexed(selects, thetas, qubit)?,
    };
    Ok((reduced, vec![gate]))
}

/// Number of labels left once `qubit` is cleared.
fn reduced_cardinality(state: &QState, qubit: usize) -> usize {
    state.labels().map(|l| l & !(1 << qubit)).unique().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Circuit, Rotation};
    use crate::prepare::support::x_reduction;
    use approx::assert_abs_diff_eq;
    use cool_asserts::assert_matches;

    #[test]
    fn multiplexed_rotation() {
        let state = QState::from_amplitudes(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.1]).unwrap();
        let supports = state.get_supports();
        let (reduced, gates) = qubit_reduction(&state, &supports).unwrap();
        // Every qubit halves the cardinality: the highest one is removed.
        assert_eq!(reduced.get_sparsity(), 4);
        assert_eq!(gates.len(), 1);
        assert_eq!(gates[0].target(), 2);
        assert_matches!(gates[0].rotation(), Rotation::Multiplexed { selects, thetas } => {
            assert_eq!(selects, &vec![0, 1]);
            assert_eq!(thetas.len(), 4);
        });
        assert_eq!(gates[0].cnot_cost(), 4);
    }

    #[test]
    fn fewest_remaining_labels() {
        // Clearing qubit 0 merges {0, 1} and {4, 5}, clearing qubit 2 merges
        // {0, 4} and {1, 5}, clearing qubit 1 merges {0, 2} only.
        let state = QState::from_amplitudes(&[0.4, 0.4, 0.4, 0.0, 0.4, 0.4, 0.0, 0.0]).unwrap();
        assert_eq!(reduced_cardinality(&state, 0), 3);
        assert_eq!(reduced_cardinality(&state, 1), 4);
        assert_eq!(reduced_cardinality(&state, 2), 3);
        let (_, gates) = qubit_reduction(&state, &state.get_supports()).unwrap();
        assert_eq!(gates[0].target(), 2);
    }

    #[test]
    fn uniform_angles_need_no_multiplexor() {
        // (|0> + |1>) ⊗ (|0> + |1>) on qubits 0 and 1.
        let state = QState::from_amplitudes(&[0.5, 0.5, 0.5, 0.5]).unwrap();
        let (reduced, gates) = qubit_reduction(&state, &[0, 1]).unwrap();
        assert_eq!(reduced.get_sparsity(), 2);
        assert_eq!(gates[0].target(), 1);
        assert_matches!(gates[0].rotation(), Rotation::Ry(_));
        assert_eq!(gates[0].cnot_cost(), 0);
    }

    #[test]
    fn reduction_prepares_state() {
        let state =
            QState::from_amplitudes(&[0.3, -0.2, 0.0, 0.5, 0.1, 0.0, -0.6, 0.4]).unwrap();
        let mut current = state.clone();
        let mut gates = Vec::new();
        while current.get_sparsity() > 1 {
            let (next, step) = qubit_reduction(&current, &current.get_supports()).unwrap();
            gates.splice(0..0, step);
            current = next;
        }
        let (ground, xs) = x_reduction(&current);
        let mut circ = Circuit::new(3);
        circ.add_gates(xs).unwrap();
        circ.add_gates(gates).unwrap();
        let sign = ground.amplitude(0).signum();
        for (a, e) in circ.simulate().iter().zip(state.to_dense()) {
            assert_abs_diff_eq!(sign * a, e, epsilon = 1e-9);
        }
    }

    #[test]
    fn empty_support() {
        assert_matches!(
            qubit_reduction(&QState::ground_state(2), &[]),
            Err(PrepareStateError::Irreducible { cardinality: 1 })
        );
    }
}
