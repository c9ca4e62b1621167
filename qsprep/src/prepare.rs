//! Recursive state preparation.
//!
//! The planner reduces a target state step by step down to a single basis
//! label, and emits the gates undoing each reduction. At every recursion
//! level it
//!
//! 1. removes separable and copied support qubits ([`support_reduction`]),
//! 2. stops if a single label is left ([`x_reduction`]),
//! 3. tries exact synthesis on small supports ([`exact_cnot_synthesis`]),
//! 4. otherwise recurses on a cardinality reduction (m-flow) and/or a qubit
//!    reduction (n-flow), and keeps the branch with the fewest CNOTs.
//!
//! Which branches run is configured with [`StatePreparationParameters`].

pub mod cardinality;
pub mod exact;
pub mod params;
pub mod qubit;
pub mod stats;
pub mod support;

use std::time::Instant;

use derive_more::{Display, Error, From};

pub use cardinality::cardinality_reduction;
pub use exact::exact_cnot_synthesis;
pub use params::{ConfigError, StatePreparationParameters};
pub use qubit::qubit_reduction;
pub use stats::{StatePreparationStatistics, SynthesisMethod};
pub use support::{support_reduction, x_reduction};

use crate::circuit::cost::gates_cnot_cost;
use crate::circuit::{Circuit, CircuitError, Gate};
use crate::cnry::log::{LOG_TARGET, PROGRESS_TARGET};
use crate::cnry::SolverError;
use crate::state::{OperatorError, QState, StateError};

/// Errors that can occur when preparing a state.
#[derive(Debug, Display, Clone, PartialEq, Error, From)]
#[non_exhaustive]
pub enum PrepareStateError {
    /// The planner configuration cannot be honoured.
    #[display("Invalid configuration: {_0}")]
    Config(ConfigError),
    /// The target is not a valid state.
    #[display("Invalid input state: {_0}")]
    InvalidState(StateError),
    /// Exact synthesis failed on an internal error.
    #[display("Exact synthesis failed: {_0}")]
    Solver(SolverError),
    /// A reduction step could not be applied.
    #[display("Reduction failed: {_0}")]
    Operator(OperatorError),
    /// The gates do not fit the circuit.
    #[display("Invalid circuit: {_0}")]
    Circuit(CircuitError),
    /// A reduction was requested on a state that cannot be reduced.
    #[display("Cannot reduce a state with {cardinality} labels")]
    #[from(ignore)]
    Irreducible {
        /// The cardinality of the state.
        cardinality: usize,
    },
}

/// Gates preparing a state, and their CNOT count.
type Candidate = (Vec<Gate>, usize);

/// Prepare `state` with the default parameters for it.
///
/// See [`StatePreparationParameters::for_state`].
pub fn prepare_state(state: &QState) -> Result<Circuit, PrepareStateError> {
    prepare_state_with_stats(state, None, &mut StatePreparationStatistics::new())
}

/// Prepare the state given by a dense amplitude vector.
///
/// The qubit count is `log2` of the vector length. The vector is normalised.
pub fn prepare_state_from_amplitudes(amplitudes: &[f64]) -> Result<Circuit, PrepareStateError> {
    prepare_state(&QState::from_amplitudes(amplitudes)?)
}

/// Prepare `state`, recording statistics in `stats`.
///
/// Without `params`, the defaults for `state` are used. The circuit prepares
/// `state` from `|0…0⟩` up to a global sign.
#[tracing::instrument(target = "qsprep::metrics", skip_all)]
pub fn prepare_state_with_stats(
    state: &QState,
    params: Option<&StatePreparationParameters>,
    stats: &mut StatePreparationStatistics,
) -> Result<Circuit, PrepareStateError> {
    let params = params
        .copied()
        .unwrap_or_else(|| StatePreparationParameters::for_state(state));
    tracing::debug!(target: LOG_TARGET, "preparing {state} with {params:?}");

    let start_time = Instant::now();
    let (gates, num_cnots) = prepare_state_rec(state, &params, stats)?;
    stats.set_time_total(start_time.elapsed());

    let mut circuit = Circuit::new(state.num_qubits());
    circuit.add_gates(gates)?;
    tracing::info!(
        target: LOG_TARGET,
        "prepared a state of {} labels on {} qubits with {num_cnots} CNOTs",
        state.get_sparsity(),
        state.num_qubits()
    );
    Ok(circuit)
}

/// One level of the recursive planner.
///
/// Returns the gates preparing `state` and their CNOT count.
pub fn prepare_state_rec(
    state: &QState,
    params: &StatePreparationParameters,
    stats: &mut StatePreparationStatistics,
) -> Result<Candidate, PrepareStateError> {
    let prev_num_supports = state.get_supports().len();
    let prev_cardinality = state.get_sparsity();

    let start_time = Instant::now();
    let (state, support_gates) = match params.enable_compression {
        true => support_reduction(state),
        false => (state.clone(), Vec::new()),
    };
    let support_time = start_time.elapsed();
    let support_cnots = gates_cnot_cost(&support_gates);

    if params.enable_reindex {
        return Err(ConfigError::ReindexUnsupported.into());
    }

    let supports = state.get_supports();
    let cardinality = state.get_sparsity();
    stats.record_support_reduction(
        support_time,
        prev_num_supports.saturating_sub(supports.len()),
        prev_cardinality.saturating_sub(cardinality),
    );
    tracing::trace!(target: PROGRESS_TARGET, "state: {state}");

    if cardinality == 1 {
        let (_, mut gates) = x_reduction(&state);
        gates.extend(support_gates);
        return Ok((gates, support_cnots));
    }

    if params.should_attempt_exact_synthesis(supports.len(), cardinality) {
        let start_time = Instant::now();
        let result = exact_cnot_synthesis(
            &state,
            StatePreparationParameters::EXACT_SYNTHESIS_CNOT_LIMIT,
        );
        stats.record_exact_synthesis(start_time.elapsed(), result.is_ok());
        match result {
            Ok(mut gates) => {
                let num_cnots = gates_cnot_cost(&gates) + support_cnots;
                gates.extend(support_gates);
                return Ok((gates, num_cnots));
            }
            Err(
                e @ (SolverError::Infeasible { .. }
                | SolverError::UnsupportedSplit { .. }
                | SolverError::TooManyQubits { .. }),
            ) => {
                tracing::debug!(target: LOG_TARGET, "exact synthesis skipped: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut candidates: Vec<(SynthesisMethod, Candidate)> = Vec::with_capacity(2);

    if params.enable_m_flow {
        let mut branch_stats = StatePreparationStatistics::new();
        let start_time = Instant::now();
        let (reduced, reduction_gates) = cardinality_reduction(&state)?;
        branch_stats.record_cardinality_reduction(start_time.elapsed());
        let (gates, num_cnots) = prepare_state_rec(&reduced, params, &mut branch_stats)?;
        *stats += branch_stats;
        candidates.push((
            SynthesisMethod::SparseQsp,
            assemble(gates, num_cnots, reduction_gates, &support_gates, support_cnots),
        ));
    }

    if params.enable_n_flow {
        let mut branch_stats = StatePreparationStatistics::new();
        let start_time = Instant::now();
        let (reduced, reduction_gates) = qubit_reduction(&state, &supports)?;
        branch_stats.record_qubit_reduction(start_time.elapsed());
        let (gates, num_cnots) = prepare_state_rec(&reduced, params, &mut branch_stats)?;
        *stats += branch_stats;
        candidates.push((
            SynthesisMethod::QubitReduction,
            assemble(gates, num_cnots, reduction_gates, &support_gates, support_cnots),
        ));
    }

    let worst = candidates.iter().map(|(_, (_, n))| *n).max();
    let (method, best) = candidates
        .into_iter()
        .min_by_key(|(_, (_, n))| *n)
        .ok_or(ConfigError::NoReductionMethod)?;
    stats.record_decision(method, worst.unwrap_or(best.1) - best.1);
    tracing::trace!(target: PROGRESS_TARGET, "selected {method} with {} CNOTs", best.1);
    Ok(best)
}

/// Concatenate the gates of a branch, in preparation order.
fn assemble(
    mut gates: Vec<Gate>,
    num_cnots: usize,
    reduction_gates: Vec<Gate>,
    support_gates: &[Gate],
    support_cnots: usize,
) -> Candidate {
    let num_cnots = num_cnots + gates_cnot_cost(&reduction_gates) + support_cnots;
    gates.extend(reduction_gates);
    gates.extend_from_slice(support_gates);
    (gates, num_cnots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_asserts::assert_matches;
    use rstest::rstest;

    fn state(amplitudes: &[f64]) -> QState {
        QState::from_amplitudes(amplitudes).unwrap()
    }

    #[test]
    fn reindex_is_rejected() {
        let params = StatePreparationParameters {
            enable_reindex: true,
            ..Default::default()
        };
        let mut stats = StatePreparationStatistics::new();
        assert_matches!(
            prepare_state_with_stats(&state(&[1.0, 1.0]), Some(&params), &mut stats),
            Err(PrepareStateError::Config(ConfigError::ReindexUnsupported))
        );
    }

    #[test]
    fn no_branch_enabled() {
        let params = StatePreparationParameters {
            enable_exact_synthesis: false,
            enable_m_flow: false,
            enable_n_flow: false,
            ..Default::default()
        };
        let mut stats = StatePreparationStatistics::new();
        let w = state(&[0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        assert_matches!(
            prepare_state_with_stats(&w, Some(&params), &mut stats),
            Err(PrepareStateError::Config(ConfigError::NoReductionMethod))
        );
        // Trivial states never reach the branch selection.
        let trivial = state(&[0.0, 0.0, 0.0, 1.0]);
        assert!(prepare_state_with_stats(&trivial, Some(&params), &mut stats).is_ok());
    }

    #[test]
    fn invalid_input() {
        assert_matches!(
            prepare_state_from_amplitudes(&[1.0, 0.0, 0.0]),
            Err(PrepareStateError::InvalidState(StateError::NotPowerOfTwo { .. }))
        );
    }

    #[rstest]
    #[case::m_flow(true, false, SynthesisMethod::SparseQsp)]
    #[case::n_flow(false, true, SynthesisMethod::QubitReduction)]
    fn single_branch_is_recorded(
        #[case] m_flow: bool,
        #[case] n_flow: bool,
        #[case] method: SynthesisMethod,
    ) {
        let params = StatePreparationParameters {
            enable_exact_synthesis: false,
            enable_m_flow: m_flow,
            enable_n_flow: n_flow,
            ..Default::default()
        };
        let mut stats = StatePreparationStatistics::new();
        let w = state(&[0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        prepare_state_with_stats(&w, Some(&params), &mut stats).unwrap();
        assert!(stats.method_count(method) > 0);
        assert_eq!(stats.num_methods().len(), 1);
        assert_eq!(stats.num_saved_gates_decision(), 0);
    }

    #[test]
    fn selection_keeps_cheapest_branch() {
        let w = state(&[0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        let cost = |m_flow: bool, n_flow: bool| {
            let params = StatePreparationParameters {
                enable_exact_synthesis: false,
                enable_m_flow: m_flow,
                enable_n_flow: n_flow,
                ..Default::default()
            };
            let mut stats = StatePreparationStatistics::new();
            let circ = prepare_state_with_stats(&w, Some(&params), &mut stats).unwrap();
            (circ.cnot_cost(), stats)
        };
        let (m_cost, _) = cost(true, false);
        let (n_cost, _) = cost(false, true);
        let (both_cost, stats) = cost(true, true);
        assert!(both_cost <= m_cost.min(n_cost));
        assert!(stats.num_methods().values().sum::<usize>() > 0);
    }
}
