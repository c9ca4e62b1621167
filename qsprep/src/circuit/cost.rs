//! CNOT cost model for multi-controlled rotations.

use super::Gate;

/// The number of CNOTs needed to implement a rotation with `num_controls`
/// controls.
///
/// Uncontrolled gates are free and a single-controlled flip is one CNOT.
/// Every other gate with `k` controls costs `2^k`.
#[inline]
pub fn mcry_cnot_cost(num_controls: usize, flip: bool) -> usize {
    match num_controls {
        0 => 0,
        1 if flip => 1,
        k => 1 << k,
    }
}

/// The total CNOT cost of a sequence of gates.
pub fn gates_cnot_cost<'a>(gates: impl IntoIterator<Item = &'a Gate>) -> usize {
    gates.into_iter().map(Gate::cnot_cost).sum()
}
