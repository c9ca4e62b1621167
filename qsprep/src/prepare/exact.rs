//! Exact CNOT synthesis of small sub-problems with the CnRy solver.

use itertools::Itertools;

use crate::circuit::Gate;
use crate::cnry::{solution_to_circuit, CnRySolver, CnRyState, SolverError, SolverOptions};
use crate::state::{PureState, QState};

/// Prepare `state` with a minimal number of CNOTs.
///
/// The state is projected onto its support qubits, solved there with moves
/// of any number of controls, and the gates are mapped back. Qubits outside
/// the support that are set on every label are flipped with X gates.
///
/// # Errors
///
/// Fails with [`SolverError::Infeasible`] when no circuit exists within
/// `cnot_limit` CNOTs, and with [`SolverError::TooManyQubits`] when the
/// support is too large for the solver.
pub fn exact_cnot_synthesis(state: &QState, cnot_limit: usize) -> Result<Vec<Gate>, SolverError> {
    let supports = state.get_supports();
    let projected = project(state, &supports);
    let target = CnRyState::from_qstate(&projected).ok_or(SolverError::TooManyQubits {
        num_qubits: supports.len(),
    })?;
    let options = SolverOptions {
        max_controls: supports.len().saturating_sub(1),
        cnot_limit: Some(cnot_limit),
    };
    let solver = CnRySolver::new(supports.len(), options)?;
    let solution = solver.solve(target)?;
    let circuit = solution_to_circuit(&projected, &solution)?;

    let mut gates = circuit
        .gates()
        .iter()
        .map(|g| g.remap(|q| supports[q]))
        .collect_vec();
    gates.extend(state.constant_ones().into_iter().map(Gate::x));
    Ok(gates)
}

/// Keep only the `supports` bits of every label, packed from bit 0.
fn project(state: &QState, supports: &[usize]) -> QState {
    QState::from_pure_states(
        state.pure_states().map(|ps| {
            let index = supports
                .iter()
                .enumerate()
                .fold(0, |acc, (j, &q)| acc | (usize::from(ps.bit(q)) << j));
            PureState::new(index, ps.amplitude)
        }),
        supports.len(),
    )
}
