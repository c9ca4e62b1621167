//! Search-space nodes of the CnRy solver.

use std::fmt;
use std::hash::{Hash, Hasher};

use itertools::Itertools;

use crate::state::QState;

/// The largest number of qubits a [`CnRyState`] can represent.
///
/// A node stores its label set as a bitmask over the `2^n` basis labels.
pub const MAX_SOLVER_QUBITS: usize = 6;

/// A node of the CnRy search: the set of basis labels holding weight, and the
/// CNOT cost accumulated to reach it.
///
/// Equality and hashing only consider the label set.
#[derive(Debug, Clone, Copy, Eq)]
pub struct CnRyState {
    mask: u64,
    cost: usize,
}

impl CnRyState {
    /// Create a node from a label bitmask.
    #[inline]
    pub fn new(mask: u64, cost: usize) -> Self {
        Self { mask, cost }
    }

    /// The seed node `{0}`.
    #[inline]
    pub fn initial() -> Self {
        Self::new(1, 0)
    }

    /// The node holding the labels of a sparse state, at zero cost.
    ///
    /// Returns `None` if the state does not fit in a bitmask.
    pub fn from_qstate(state: &QState) -> Option<Self> {
        if state.num_qubits() > MAX_SOLVER_QUBITS {
            return None;
        }
        Some(Self::from_labels(state.labels()))
    }

    /// The node holding the given labels, at zero cost.
    pub fn from_labels(labels: impl IntoIterator<Item = usize>) -> Self {
        let mask = labels.into_iter().fold(0, |m, l| m | (1u64 << l));
        Self::new(mask, 0)
    }

    /// The label bitmask.
    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// The accumulated CNOT cost.
    #[inline]
    pub fn cost(&self) -> usize {
        self.cost
    }

    /// Number of labels holding weight.
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Whether `label` holds weight.
    #[inline]
    pub fn contains(&self, label: usize) -> bool {
        label < 64 && (self.mask >> label) & 1 == 1
    }

    /// The labels holding weight, in ascending order.
    pub fn labels(&self) -> impl Iterator<Item = usize> {
        let mask = self.mask;
        (0..64).filter(move |l| (mask >> l) & 1 == 1)
    }
}

impl PartialEq for CnRyState {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask
    }
}

impl Hash for CnRyState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mask.hash(state);
    }
}

impl fmt::Display for CnRyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.labels().join(", "))
    }
}
