//! End-to-end tests of the state preparation planner.

use approx::assert_abs_diff_eq;
use cool_asserts::assert_matches;
use qsprep::prepare::ConfigError;
use qsprep::{
    prepare_state, prepare_state_from_amplitudes, prepare_state_with_stats, Circuit,
    PrepareStateError, PureState, QState, StatePreparationParameters, StatePreparationStatistics,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

/// Check that `circ` prepares `state` up to a global sign.
fn assert_prepares(circ: &Circuit, state: &QState) {
    let expected = state.to_dense();
    let amplitudes = circ.simulate();
    assert_eq!(amplitudes.len(), expected.len());
    let overlap: f64 = amplitudes.iter().zip(&expected).map(|(a, e)| a * e).sum();
    let sign = overlap.signum();
    for (a, e) in amplitudes.iter().zip(&expected) {
        assert_abs_diff_eq!(sign * a, *e, epsilon = 1e-9);
    }
}

fn random_sparse_state(rng: &mut StdRng, num_qubits: usize, cardinality: usize) -> QState {
    let labels = rand::seq::index::sample(rng, 1 << num_qubits, cardinality);
    let pure_states = labels
        .into_iter()
        .map(|l| {
            let magnitude = rng.gen_range(0.1..1.0);
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            PureState::new(l, sign * magnitude)
        })
        .collect::<Vec<_>>();
    let norm = pure_states
        .iter()
        .map(|ps| ps.amplitude * ps.amplitude)
        .sum::<f64>()
        .sqrt();
    QState::from_pure_states(
        pure_states
            .into_iter()
            .map(|ps| PureState::new(ps.index, ps.amplitude / norm)),
        num_qubits,
    )
}

fn params(m_flow: bool, n_flow: bool) -> StatePreparationParameters {
    StatePreparationParameters {
        enable_m_flow: m_flow,
        enable_n_flow: n_flow,
        ..Default::default()
    }
}

#[test]
fn separable_superposition_is_free() {
    let h = std::f64::consts::FRAC_1_SQRT_2;
    let circ = prepare_state_from_amplitudes(&[h, 0.0, 0.0, 0.0, h, 0.0, 0.0, 0.0]).unwrap();
    assert_eq!(circ.cnot_cost(), 0);
    assert_eq!(circ.num_gates(), 1);
    let gate = &circ.gates()[0];
    assert_eq!(gate.target(), 2);
    assert!(gate.controls().is_empty());
    assert_prepares(&circ, &QState::from_amplitudes(&[h, 0.0, 0.0, 0.0, h, 0.0, 0.0, 0.0]).unwrap());
}

#[test]
fn copied_qubits() {
    let state = QState::from_amplitudes(&[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]).unwrap();

    // Two labels on three qubits: cardinality reduction is estimated cheaper.
    let defaults = StatePreparationParameters::for_state(&state);
    assert!(defaults.enable_m_flow);
    assert!(!defaults.enable_n_flow);

    let circ = prepare_state(&state).unwrap();
    // Below both the cardinality (2 x 3) and the qubit (2^3) estimates.
    assert!(circ.cnot_cost() <= 6);
    assert_prepares(&circ, &state);
}

#[rstest]
#[case::ground(vec![1.0, 0.0, 0.0, 0.0])]
#[case::single_label(vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0])]
#[case::negative(vec![0.0, 0.0, 0.0, -1.0])]
fn single_label_needs_no_cnot(#[case] amplitudes: Vec<f64>) {
    let state = QState::from_amplitudes(&amplitudes).unwrap();
    let circ = prepare_state(&state).unwrap();
    assert_eq!(circ.cnot_cost(), 0);
    assert!(circ.gates().iter().all(|g| g.controls().is_empty()));
    assert_prepares(&circ, &state);
}

#[test]
fn exact_synthesis_is_optimal() {
    // Even-parity superposition: every qubit is entangled with the others.
    let state = QState::from_amplitudes(&[0.5, 0.0, 0.0, 0.5, 0.0, 0.5, 0.5, 0.0]).unwrap();
    let mut stats = StatePreparationStatistics::new();
    let p = StatePreparationParameters {
        n_qubits_max: 3,
        ..Default::default()
    };
    let circ = prepare_state_with_stats(&state, Some(&p), &mut stats).unwrap();
    assert_eq!(circ.cnot_cost(), 2);
    assert_eq!(stats.num_exact_synthesis(), 1);
    assert_prepares(&circ, &state);

    let mut stats = StatePreparationStatistics::new();
    let p = StatePreparationParameters {
        enable_exact_synthesis: false,
        ..Default::default()
    };
    let circ = prepare_state_with_stats(&state, Some(&p), &mut stats).unwrap();
    assert_eq!(stats.num_exact_synthesis(), 0);
    assert!(circ.cnot_cost() >= 2);
    assert_prepares(&circ, &state);
}

#[test]
fn exact_synthesis_thresholds() {
    let p = StatePreparationParameters::default();
    let max = p.n_qubits_max;
    let density = StatePreparationParameters::EXACT_SYNTHESIS_DENSITY_THRESHOLD;
    assert!(p.should_attempt_exact_synthesis(max, density));
    assert!(!p.should_attempt_exact_synthesis(max + 1, density));
    assert!(!p.should_attempt_exact_synthesis(max, density + 1));
}

#[test]
fn selection_keeps_the_cheaper_branch() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..10 {
        let state = random_sparse_state(&mut rng, 5, 6);
        let run = |p: StatePreparationParameters| {
            let mut stats = StatePreparationStatistics::new();
            let circ = prepare_state_with_stats(&state, Some(&p), &mut stats).unwrap();
            assert_prepares(&circ, &state);
            circ.cnot_cost()
        };
        let m_cost = run(params(true, false));
        let n_cost = run(params(false, true));
        let cost = run(params(true, true));
        assert!(cost <= m_cost.min(n_cost));
    }
}

#[rstest]
#[case::defaults(None)]
#[case::m_flow(Some(params(true, false)))]
#[case::n_flow(Some(params(false, true)))]
#[case::both(Some(params(true, true)))]
#[case::heuristic_only(Some(StatePreparationParameters {
    enable_exact_synthesis: false,
    enable_n_flow: true,
    ..Default::default()
}))]
#[case::no_compression(Some(StatePreparationParameters {
    enable_compression: false,
    ..Default::default()
}))]
fn random_states_round_trip(#[case] p: Option<StatePreparationParameters>) {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..25 {
        let num_qubits = rng.gen_range(1..=6);
        let cardinality = rng.gen_range(1..=(1usize << num_qubits).min(8));
        let state = random_sparse_state(&mut rng, num_qubits, cardinality);
        let mut stats = StatePreparationStatistics::new();
        let circ = prepare_state_with_stats(&state, p.as_ref(), &mut stats)
            .unwrap_or_else(|e| panic!("failed to prepare {state}: {e}"));
        assert_eq!(circ.qubit_count(), num_qubits);
        assert_prepares(&circ, &state);
    }
}

#[test]
fn deterministic_output() {
    let mut rng = StdRng::seed_from_u64(99);
    let state = random_sparse_state(&mut rng, 6, 8);
    let p = params(true, true);
    let first = prepare_state_with_stats(&state, Some(&p), &mut StatePreparationStatistics::new())
        .unwrap();
    let second = prepare_state_with_stats(&state, Some(&p), &mut StatePreparationStatistics::new())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn configuration_errors() {
    let w = QState::from_amplitudes(&[0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
    let mut stats = StatePreparationStatistics::new();

    let reindex = StatePreparationParameters {
        enable_reindex: true,
        ..Default::default()
    };
    assert_matches!(
        prepare_state_with_stats(&w, Some(&reindex), &mut stats),
        Err(PrepareStateError::Config(ConfigError::ReindexUnsupported))
    );

    let no_branch = StatePreparationParameters {
        enable_exact_synthesis: false,
        ..params(false, false)
    };
    assert_matches!(
        prepare_state_with_stats(&w, Some(&no_branch), &mut stats),
        Err(PrepareStateError::Config(ConfigError::NoReductionMethod))
    );
}

#[test]
fn statistics_are_collected() {
    let mut rng = StdRng::seed_from_u64(5);
    let state = random_sparse_state(&mut rng, 6, 8);
    let mut stats = StatePreparationStatistics::new();
    prepare_state_with_stats(&state, Some(&params(true, true)), &mut stats).unwrap();
    assert!(stats.num_runs_support_reduction() > 0);
    let report = stats.to_string();
    assert!(report.contains("time_total"));
    assert!(report.contains("num_saved_gates_decision"));
    let json = serde_json::to_value(&stats).unwrap();
    assert!(json["num_methods"].is_object());
}
