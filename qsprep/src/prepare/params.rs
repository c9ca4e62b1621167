//! Configuration of the state preparation planner.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::state::QState;

/// Options of the recursive state preparation.
///
/// Deserialisation fills missing fields with their default, so a partial
/// JSON object is a valid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatePreparationParameters {
    /// Try exact CNOT synthesis on small sub-problems.
    ///
    /// Defaults to `true`.
    pub enable_exact_synthesis: bool,
    /// Explore qubit reduction.
    ///
    /// Defaults to `false`.
    pub enable_n_flow: bool,
    /// Explore cardinality reduction.
    ///
    /// Defaults to `true`.
    pub enable_m_flow: bool,
    /// Decompose the gates into a CNOT-based gate set.
    ///
    /// Accepted for compatibility, the planner does not read it.
    pub enable_decomposition: bool,
    /// Run support reduction at every recursion level.
    ///
    /// Defaults to `true`.
    pub enable_compression: bool,
    /// Reindex the qubits before synthesis. Not supported: enabling it makes
    /// the planner fail.
    pub enable_reindex: bool,
    /// The largest support on which exact synthesis is attempted.
    ///
    /// Defaults to `4`.
    pub n_qubits_max: usize,
}

impl StatePreparationParameters {
    /// Exact synthesis is only attempted on states with at most this many
    /// labels.
    pub const EXACT_SYNTHESIS_DENSITY_THRESHOLD: usize = 100;
    /// The CNOT limit of the exact synthesis search.
    pub const EXACT_SYNTHESIS_CNOT_LIMIT: usize = 100;

    /// The default parameters for `state`.
    ///
    /// Only one of the two reduction branches is enabled, the one with the
    /// lower estimated CNOT count: `cardinality × num_qubits` for
    /// cardinality reduction against `2^num_qubits` for qubit reduction.
    pub fn for_state(state: &QState) -> Self {
        let num_qubits = state.num_qubits();
        let cardinality_estimate = state.get_sparsity().saturating_mul(num_qubits);
        let qubit_estimate = 1usize.checked_shl(num_qubits as u32).unwrap_or(usize::MAX);
        let sparse = cardinality_estimate < qubit_estimate;
        Self {
            enable_m_flow: sparse,
            enable_n_flow: !sparse,
            ..Default::default()
        }
    }

    /// Whether exact synthesis should be tried on a state with the given
    /// support size and cardinality.
    #[inline]
    pub fn should_attempt_exact_synthesis(&self, num_supports: usize, cardinality: usize) -> bool {
        self.enable_exact_synthesis
            && num_supports <= self.n_qubits_max
            && cardinality <= Self::EXACT_SYNTHESIS_DENSITY_THRESHOLD
    }
}

impl Default for StatePreparationParameters {
    fn default() -> Self {
        Self {
            enable_exact_synthesis: true,
            enable_n_flow: false,
            enable_m_flow: true,
            enable_decomposition: false,
            enable_compression: true,
            enable_reindex: false,
            n_qubits_max: 4,
        }
    }
}

/// Invalid planner configurations.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Qubit reindexing was requested.
    #[display("Qubit reindexing is not implemented")]
    ReindexUnsupported,
    /// Both reduction branches are disabled.
    #[display("No reduction method is enabled: enable m-flow or n-flow")]
    NoReductionMethod,
}
