//! The uniform-cost search of the CnRy solver.

use std::time::Instant;

use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::emit::solution_to_circuit;
use super::log::SearchLogger;
use super::moves::{get_all_moves, CnRyMove};
use super::pqueue::CnRyPQ;
use super::state::{CnRyState, MAX_SOLVER_QUBITS};
use super::SolverError;
use crate::circuit::Circuit;
use crate::state::QState;

/// Configuration options for the CnRy solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// The maximum number of controls of a move.
    ///
    /// Targets whose support needs more controls than this may be
    /// unreachable. Defaults to `1`.
    pub max_controls: usize,
    /// Nodes costing more CNOTs than this are not explored.
    ///
    /// Defaults to `None`, which means no limit.
    pub cnot_limit: Option<usize>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_controls: 1,
            cnot_limit: None,
        }
    }
}

/// A minimal-cost path of the search.
///
/// The steps are stored from the target back to the seed: each entry holds
/// the node a move was applied to and the move itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CnRySolution {
    num_qubits: usize,
    target: CnRyState,
    steps: Vec<(CnRyState, CnRyMove)>,
}

impl CnRySolution {
    /// Assemble a solution from steps ordered from the target back to the
    /// seed.
    pub(crate) fn from_steps(
        num_qubits: usize,
        target: CnRyState,
        steps: Vec<(CnRyState, CnRyMove)>,
    ) -> Self {
        Self {
            num_qubits,
            target,
            steps,
        }
    }

    /// The number of qubits of the search.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The target node, carrying the cost of the path.
    #[inline]
    pub fn target(&self) -> &CnRyState {
        &self.target
    }

    /// The CNOT cost of the path.
    #[inline]
    pub fn cost(&self) -> usize {
        self.target.cost()
    }

    /// The steps of the path, from the target back to the seed.
    #[inline]
    pub fn steps(&self) -> &[(CnRyState, CnRyMove)] {
        &self.steps
    }

    /// The nodes of the path from the seed to the target.
    pub fn path(&self) -> impl Iterator<Item = CnRyState> + '_ {
        self.steps
            .iter()
            .rev()
            .map(|(s, _)| *s)
            .chain(std::iter::once(self.target))
    }
}

/// The CnRy solver over a fixed number of qubits.
///
/// The moves are enumerated once, for every pivot qubit, when the solver is
/// created.
#[derive(Debug, Clone)]
pub struct CnRySolver {
    num_qubits: usize,
    options: SolverOptions,
    moves: Vec<CnRyMove>,
}

impl CnRySolver {
    /// Create a new solver.
    ///
    /// # Errors
    ///
    /// Fails if `num_qubits` exceeds [`MAX_SOLVER_QUBITS`].
    pub fn new(num_qubits: usize, options: SolverOptions) -> Result<Self, SolverError> {
        if num_qubits > MAX_SOLVER_QUBITS {
            return Err(SolverError::TooManyQubits { num_qubits });
        }
        let moves = (0..num_qubits)
            .flat_map(|q| get_all_moves(num_qubits, q, options.max_controls))
            .collect_vec();
        Ok(Self {
            num_qubits,
            options,
            moves,
        })
    }

    /// The solver options.
    #[inline]
    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// All the moves of the search graph.
    #[inline]
    pub fn moves(&self) -> &[CnRyMove] {
        &self.moves
    }

    /// Find a minimal-cost path from `{0}` to `target`.
    pub fn solve(&self, target: CnRyState) -> Result<CnRySolution, SolverError> {
        self.solve_with_log(target, Default::default())
    }

    /// Find a minimal-cost path from `{0}` to `target`, logging every
    /// finalised node.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Infeasible`] if the CNOT limit cut the search
    /// short, and [`SolverError::SearchExhausted`] if the target cannot be
    /// reached with the available moves.
    #[tracing::instrument(target = "qsprep::metrics", skip(self, logger))]
    pub fn solve_with_log(
        &self,
        target: CnRyState,
        mut logger: SearchLogger,
    ) -> Result<CnRySolution, SolverError> {
        let num_labels = 1u64.checked_shl(1 << self.num_qubits).unwrap_or(0);
        if target.mask() == 0 || (num_labels != 0 && target.mask() >= num_labels) {
            return Err(SolverError::LabelMismatch);
        }
        let start_time = Instant::now();
        let target_size = target.num_labels();

        let mut visited: FxHashSet<u64> = FxHashSet::default();
        let mut prev: FxHashMap<u64, (CnRyState, usize)> = FxHashMap::default();
        let mut pq = CnRyPQ::new();
        pq.push(CnRyState::initial());

        let mut limit_hit = false;
        let mut nodes_processed = 0;
        while let Some(state) = pq.pop() {
            if !visited.insert(state.mask()) {
                continue;
            }
            nodes_processed += 1;
            logger.log_node(&state, pq.len());

            if state == target {
                logger.log_processing_end(
                    nodes_processed,
                    prev.len() + 1,
                    Some(state.cost()),
                    start_time.elapsed(),
                );
                return self.trace_back(state, &prev);
            }

            let mut branching = 0;
            for (idx, mv) in self.moves.iter().enumerate() {
                let Some(next) = mv.apply(&state) else {
                    continue;
                };
                // Moves never remove labels, so larger nodes cannot reach
                // the target.
                if next.num_labels() > target_size || visited.contains(&next.mask()) {
                    continue;
                }
                if self.options.cnot_limit.is_some_and(|l| next.cost() > l) {
                    limit_hit = true;
                    continue;
                }
                if pq.push(next) {
                    prev.insert(next.mask(), (state, idx));
                    branching += 1;
                }
            }
            logger.register_branching_factor(branching);
            logger.log_progress(nodes_processed, pq.len(), prev.len() + 1);
        }

        logger.log_processing_end(nodes_processed, prev.len() + 1, None, start_time.elapsed());
        match self.options.cnot_limit {
            Some(cnot_limit) if limit_hit => Err(SolverError::Infeasible { cnot_limit }),
            _ => Err(SolverError::SearchExhausted),
        }
    }

    /// Walk the predecessor map from `target` back to the seed.
    fn trace_back(
        &self,
        target: CnRyState,
        prev: &FxHashMap<u64, (CnRyState, usize)>,
    ) -> Result<CnRySolution, SolverError> {
        let seed = CnRyState::initial();
        let mut steps = Vec::new();
        let mut current = target;
        while current != seed {
            let &(pred, idx) = prev
                .get(&current.mask())
                .ok_or(SolverError::SearchExhausted)?;
            steps.push((pred, self.moves[idx].clone()));
            current = pred;
        }
        Ok(CnRySolution::from_steps(self.num_qubits, target, steps))
    }
}

/// Synthesise a preparation circuit for a dense amplitude vector with the
/// CnRy solver.
///
/// The qubit count is `log2` of the vector length.
pub fn cnry_solver(amplitudes: &[f64], options: &SolverOptions) -> Result<Circuit, SolverError> {
    cnry_solver_with_log(amplitudes, options, Default::default())
}

/// Synthesise a preparation circuit for a dense amplitude vector with the
/// CnRy solver, logging the search with `logger`.
pub fn cnry_solver_with_log(
    amplitudes: &[f64],
    options: &SolverOptions,
    logger: SearchLogger,
) -> Result<Circuit, SolverError> {
    let state = QState::from_amplitudes(amplitudes)?;
    let target = CnRyState::from_qstate(&state).ok_or(SolverError::TooManyQubits {
        num_qubits: state.num_qubits(),
    })?;
    let solver = CnRySolver::new(state.num_qubits(), *options)?;
    let solution = solver.solve_with_log(target, logger)?;
    solution_to_circuit(&state, &solution)
}
