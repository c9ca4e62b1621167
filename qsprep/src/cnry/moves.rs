//! Edges of the CnRy search graph.
//!
//! The search runs from the seed `{0}` towards the target label set, so the
//! moves grow a node: a [`CnRyDirection::Swap`] moves the controlled labels
//! across the pivot qubit, and a [`CnRyDirection::Merge`] gives every
//! controlled label its sibling along the pivot. When the circuit is emitted
//! the trace is undone, which turns the latter into an actual merge of two
//! labels.

use derive_more::Display;
use itertools::Itertools;
use strum::{EnumIter, IntoEnumIterator};

use super::state::{CnRyState, MAX_SOLVER_QUBITS};
use crate::circuit::cost::mcry_cnot_cost;
use crate::circuit::Control;

/// Label masks with qubit `q` cleared, indexed by `q`.
const LOW: [u64; MAX_SOLVER_QUBITS] = {
    let mut masks = [0u64; MAX_SOLVER_QUBITS];
    let mut q = 0;
    while q < MAX_SOLVER_QUBITS {
        let mut label = 0;
        while label < 64 {
            if (label >> q) & 1 == 0 {
                masks[q] |= 1 << label;
            }
            label += 1;
        }
        q += 1;
    }
    masks
};

/// Move every label of `mask` to its sibling along `qubit`.
#[inline]
fn flip_pivot(mask: u64, qubit: usize) -> u64 {
    let shift = 1 << qubit;
    ((mask & LOW[qubit]) << shift) | ((mask & !LOW[qubit]) >> shift)
}

/// The kind of a search move.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum CnRyDirection {
    /// Controlled bit flip of the pivot.
    #[display("SWAP")]
    Swap,
    /// Controlled rotation populating the pivot siblings.
    #[display("MERGE")]
    Merge,
}

/// A single edge of the search graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CnRyMove {
    pivot: usize,
    direction: CnRyDirection,
    controls: Vec<Control>,
    control_mask: u64,
}

impl CnRyMove {
    /// Create a new move. The controls must not include the pivot.
    pub fn new(pivot: usize, direction: CnRyDirection, controls: Vec<Control>) -> Self {
        debug_assert!(pivot < MAX_SOLVER_QUBITS);
        debug_assert!(controls.iter().all(|c| c.qubit != pivot));
        let control_mask = controls.iter().fold(u64::MAX, |m, c| match c.phase {
            true => m & !LOW[c.qubit],
            false => m & LOW[c.qubit],
        });
        Self {
            pivot,
            direction,
            controls,
            control_mask,
        }
    }

    /// The pivot qubit.
    #[inline]
    pub fn pivot(&self) -> usize {
        self.pivot
    }

    /// The kind of move.
    #[inline]
    pub fn direction(&self) -> CnRyDirection {
        self.direction
    }

    /// The controls of the move.
    #[inline]
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Mask of the labels satisfying the controls.
    #[inline]
    pub fn control_mask(&self) -> u64 {
        self.control_mask
    }

    /// Whether `label` satisfies the controls.
    #[inline]
    pub fn is_controlled(&self, label: usize) -> bool {
        (self.control_mask >> label) & 1 == 1
    }

    /// The CNOT cost of the move.
    #[inline]
    pub fn cost(&self) -> usize {
        mcry_cnot_cost(self.controls.len(), self.direction == CnRyDirection::Swap)
    }

    /// The node reached by applying the move, or `None` if the move does not
    /// change `state` or cannot be applied to it.
    pub fn apply(&self, state: &CnRyState) -> Option<CnRyState> {
        let mask = state.mask();
        let controlled = mask & self.control_mask;
        if controlled == 0 {
            return None;
        }
        let moved = flip_pivot(controlled, self.pivot);
        let next = match self.direction {
            CnRyDirection::Swap => (mask & !self.control_mask) | moved,
            CnRyDirection::Merge => {
                if moved & mask != 0 {
                    return None;
                }
                mask | moved
            }
        };
        (next != mask).then(|| CnRyState::new(next, state.cost() + self.cost()))
    }
}

/// All the moves pivoting on `qubit` with at most `arity` controls.
///
/// Controls never include the pivot. The moves are enumerated lazily, by
/// increasing number of controls.
pub fn get_all_moves(
    num_qubits: usize,
    qubit: usize,
    arity: usize,
) -> impl Iterator<Item = CnRyMove> {
    let valid = qubit < num_qubits && num_qubits <= MAX_SOLVER_QUBITS;
    let others = (0..num_qubits).filter(|&q| q != qubit).collect_vec();
    let max_controls = if valid { arity.min(others.len()) } else { 0 };
    (0..=max_controls)
        .filter(move |_| valid)
        .flat_map(move |k| others.clone().into_iter().combinations(k))
        .flat_map(|qubits| {
            (0..1usize << qubits.len()).map(move |phases| {
                qubits
                    .iter()
                    .enumerate()
                    .map(|(j, &q)| Control::new(q, (phases >> j) & 1 == 1))
                    .collect_vec()
            })
        })
        .flat_map(move |controls| {
            CnRyDirection::iter().map(move |d| CnRyMove::new(qubit, d, controls.clone()))
        })
}
