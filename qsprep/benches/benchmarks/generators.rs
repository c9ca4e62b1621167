use qsprep::{PureState, QState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The `n`-qubit W state, an equal superposition of the labels with a single
/// bit set.
pub fn w_state(num_qubits: usize) -> QState {
    let amplitude = (num_qubits as f64).sqrt().recip();
    QState::from_pure_states(
        (0..num_qubits).map(|q| PureState::new(1 << q, amplitude)),
        num_qubits,
    )
}

/// A random state with `cardinality` labels and signed amplitudes.
///
/// The generator is seeded, so the same arguments always give the same state.
pub fn random_sparse_state(num_qubits: usize, cardinality: usize, seed: u64) -> QState {
    let mut rng = StdRng::seed_from_u64(seed);
    let labels = rand::seq::index::sample(&mut rng, 1 << num_qubits, cardinality);
    let amplitudes = labels
        .into_iter()
        .map(|l| (l, rng.gen_range(-1.0..1.0)))
        .collect::<Vec<(usize, f64)>>();
    let norm = amplitudes.iter().map(|(_, a)| a * a).sum::<f64>().sqrt();
    QState::from_pure_states(
        amplitudes
            .into_iter()
            .map(|(l, a)| PureState::new(l, a / norm)),
        num_qubits,
    )
}
