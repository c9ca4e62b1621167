//! Cardinality reduction (m-flow): merge two labels into one.
//!
//! For a pair of labels and a pivot qubit on which they differ, CNOTs
//! controlled by the pivot first align the other differing bits, so that
//! the pair only differs on the pivot. A multi-controlled rotation, with
//! controls chosen to isolate the pair from every other label, then merges
//! it. The pair and pivot with the fewest CNOTs are used.

use itertools::Itertools;

use super::PrepareStateError;
use crate::circuit::cost::mcry_cnot_cost;
use crate::circuit::{Control, Gate};
use crate::state::{McryOperator, QState};

/// A planned merge of two labels.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MergePlan {
    pivot: usize,
    /// The pivot control of the aligning CNOTs.
    pivot_control: Control,
    /// Qubits aligned by CNOTs.
    cnot_targets: Vec<usize>,
    /// Controls isolating the aligned pair.
    controls: Vec<Control>,
    cost: usize,
}

/// Reduce the cardinality of `state` by one.
///
/// Returns the reduced state and the gates preparing `state` from it.
///
/// # Errors
///
/// Fails if `state` has fewer than two labels.
pub fn cardinality_reduction(state: &QState) -> Result<(QState, Vec<Gate>), PrepareStateError> {
    let plan = best_merge(state).ok_or(PrepareStateError::Irreducible {
        cardinality: state.get_sparsity(),
    })?;
    tracing::trace!(
        target: crate::cnry::log::PROGRESS_TARGET,
        "m-flow: merge along qubit {} with {} CNOTs",
        plan.pivot,
        plan.cost
    );

    let mut state = state.clone();
    let mut gates = Vec::with_capacity(plan.cnot_targets.len() + 1);
    for &target in &plan.cnot_targets {
        let (next, gate) = McryOperator::swap(target, vec![plan.pivot_control]).apply(&state)?;
        state = next;
        gates.push(gate);
    }
    let (state, gate) = McryOperator::merge0(plan.pivot, plan.controls).apply(&state)?;
    gates.push(gate);
    gates.reverse();
    Ok((state, gates))
}

/// The cheapest merge over all label pairs and pivots. Earlier candidates
/// win ties.
fn best_merge(state: &QState) -> Option<MergePlan> {
    let labels = state.labels().collect_vec();
    let mut best: Option<MergePlan> = None;
    for (&a, &b) in labels.iter().tuple_combinations() {
        let diff = a ^ b;
        for pivot in (0..state.num_qubits()).filter(|q| diff >> q & 1 == 1) {
            let bit = 1 << pivot;
            let pivot_control = Control::new(pivot, b & bit != 0);
            let cnot_targets = (0..state.num_qubits())
                .filter(|&q| q != pivot && diff >> q & 1 == 1)
                .collect_vec();

            // Labels after the aligning CNOTs.
            let aligned = labels
                .iter()
                .map(|&l| match pivot_control.is_satisfied(l) {
                    true => l ^ (diff & !bit),
                    false => l,
                })
                .collect_vec();
            let controls = isolating_controls(&aligned, a, pivot, state.num_qubits());
            let cost = cnot_targets.len() + mcry_cnot_cost(controls.len(), false);
            if best.as_ref().is_none_or(|p| cost < p.cost) {
                best = Some(MergePlan {
                    pivot,
                    pivot_control,
                    cnot_targets,
                    controls,
                    cost,
                });
            }
        }
    }
    best
}

/// Greedily pick controls, with the values of `label`, until no label other
/// than `label` and its sibling along `pivot` satisfies them.
fn isolating_controls(
    labels: &[usize],
    label: usize,
    pivot: usize,
    num_qubits: usize,
) -> Vec<Control> {
    let sibling = label ^ (1 << pivot);
    let mut remaining = labels
        .iter()
        .copied()
        .filter(|&l| l != label && l != sibling)
        .collect_vec();
    let mut controls: Vec<Control> = Vec::new();
    while !remaining.is_empty() {
        let excluded = |q: usize| {
            remaining
                .iter()
                .filter(|&&l| (l ^ label) >> q & 1 == 1)
                .count()
        };
        let Some(qubit) = (0..num_qubits)
            .filter(|&q| q != pivot && controls.iter().all(|c| c.qubit != q))
            .max_by_key(|&q| (excluded(q), std::cmp::Reverse(q)))
        else {
            break;
        };
        let control = Control::new(qubit, label >> qubit & 1 == 1);
        remaining.retain(|&l| control.is_satisfied(l));
        controls.push(control);
    }
    controls.sort();
    controls
}
