//! Gate emission from a CnRy search trace.
//!
//! The trace is undone step by step on the target amplitudes: every merge
//! folds the weight of a sibling pair into the label that was there before
//! the move, and records the rotation that splits it back. The gates are
//! collected from the target down to the seed and added to the circuit in
//! reverse.

use itertools::Itertools;

use super::moves::{CnRyDirection, CnRyMove};
use super::solver::CnRySolution;
use super::state::CnRyState;
use super::SolverError;
use crate::circuit::{Circuit, Control, Gate, Rotation};
use crate::state::operator::{merge_rotation, ANGLE_TOLERANCE};
use crate::state::QState;

/// Convert a search trace into a circuit preparing `final_state`.
///
/// `final_state` must hold exactly the labels of the solution's target. The
/// circuit prepares it up to a global sign.
///
/// # Errors
///
/// Fails with [`SolverError::UnsupportedSplit`] if a merge needs more than two
/// rotation angles, or if two angles cannot be told apart by a single extra
/// control.
pub fn solution_to_circuit(
    final_state: &QState,
    solution: &CnRySolution,
) -> Result<Circuit, SolverError> {
    let num_qubits = solution.num_qubits();
    if final_state.num_qubits() != num_qubits
        || CnRyState::from_qstate(final_state).as_ref() != Some(solution.target())
    {
        return Err(SolverError::LabelMismatch);
    }

    let mut amplitudes = final_state.to_dense();
    let mut gates = Vec::with_capacity(solution.steps().len());
    for (pred, mv) in solution.steps() {
        match mv.direction() {
            CnRyDirection::Swap => {
                undo_swap(&mut amplitudes, mv);
                gates.push(Gate::new(mv.pivot(), Rotation::Flip, mv.controls().to_vec()));
            }
            CnRyDirection::Merge => gates.extend(undo_merge(&mut amplitudes, pred, mv)?),
        }
    }
    tracing::debug!(
        target: super::log::LOG_TARGET,
        "emitted {} gates for a trace of cost {}",
        gates.len(),
        solution.cost()
    );

    let mut circuit = Circuit::new(num_qubits);
    circuit.add_gates(gates.into_iter().rev())?;
    Ok(circuit)
}

fn undo_swap(amplitudes: &mut [f64], mv: &CnRyMove) {
    let bit = 1 << mv.pivot();
    for label in 0..amplitudes.len() {
        if label & bit == 0 && mv.is_controlled(label) {
            amplitudes.swap(label, label | bit);
        }
    }
}

/// Merge every controlled pair into the label of `pred`, and return the
/// gates splitting them back.
fn undo_merge(
    amplitudes: &mut [f64],
    pred: &CnRyState,
    mv: &CnRyMove,
) -> Result<Vec<Gate>, SolverError> {
    let pivot = mv.pivot();
    let bit = 1 << pivot;

    // Pairs grouped by rotation angle: (θ, destination labels).
    let mut groups: Vec<(f64, Vec<usize>)> = Vec::new();
    for dst in pred.labels().filter(|&l| mv.is_controlled(l)) {
        let src = dst ^ bit;
        let to_one = dst & bit != 0;
        let (a_neg, a_pos) = match to_one {
            true => (amplitudes[src], amplitudes[dst]),
            false => (amplitudes[dst], amplitudes[src]),
        };
        let (theta, merged) = merge_rotation(a_neg, a_pos, to_one);
        amplitudes[dst] = merged;
        amplitudes[src] = 0.0;
        match groups
            .iter_mut()
            .find(|(t, _)| (t - theta).abs() <= ANGLE_TOLERANCE)
        {
            Some((_, labels)) => labels.push(dst),
            None => groups.push((theta, vec![dst])),
        }
    }

    match groups.as_slice() {
        [] => Err(SolverError::MissingRotation { pivot }),
        [(theta, _)] => Ok(vec![Gate::mcry(*theta, mv.controls().to_vec(), pivot)]),
        [(theta_a, labels_a), (theta_b, labels_b)] => {
            let num_qubits = amplitudes.len().trailing_zeros() as usize;
            let (select, phase_a) = split_qubit(num_qubits, mv, labels_a, labels_b)
                .ok_or(SolverError::UnsupportedSplit { num_angles: 2 })?;
            let (theta0, theta1) = match phase_a {
                false => (*theta_a, *theta_b),
                true => (*theta_b, *theta_a),
            };
            if mv.controls().is_empty() {
                return Ok(vec![Gate::multiplexy(theta0, theta1, select, pivot)]);
            }
            let with_select = |phase: bool| {
                let mut controls = mv.controls().to_vec();
                controls.push(Control::new(select, phase));
                controls
            };
            Ok(vec![
                Gate::mcry(theta0, with_select(false), pivot),
                Gate::mcry(theta1, with_select(true), pivot),
            ])
        }
        _ => Err(SolverError::UnsupportedSplit {
            num_angles: groups.len(),
        }),
    }
}

/// The lowest free qubit separating two groups of labels, and its value on
/// the first group.
fn split_qubit(
    num_qubits: usize,
    mv: &CnRyMove,
    labels_a: &[usize],
    labels_b: &[usize],
) -> Option<(usize, bool)> {
    let used = mv.controls().iter().map(|c| c.qubit).collect_vec();
    (0..num_qubits)
        .filter(|q| *q != mv.pivot() && !used.contains(q))
        .find_map(|q| {
            let bit = |l: &usize| (l >> q) & 1 == 1;
            let a = labels_a.iter().map(bit).all_equal_value().ok()?;
            let b = labels_b.iter().map(bit).all_equal_value().ok()?;
            (a != b).then_some((q, a))
        })
}
