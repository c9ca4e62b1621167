//! The CnRy search against exhaustive shortest paths on small move graphs.

use approx::assert_abs_diff_eq;
use cool_asserts::assert_matches;
use itertools::Itertools;
use qsprep::cnry::{
    cnry_solver, get_all_moves, CnRyMove, CnRySolver, CnRyState, SearchLogger, SolverError,
    SolverOptions,
};
use qsprep::QState;
use rstest::rstest;

/// Shortest distances from `{0}` to every label set, by Bellman-Ford
/// relaxation over the full move graph.
fn all_distances(moves: &[CnRyMove], num_qubits: usize) -> Vec<Option<usize>> {
    let num_masks = 1usize << (1 << num_qubits);
    let mut dist: Vec<Option<usize>> = vec![None; num_masks];
    dist[1] = Some(0);
    loop {
        let mut changed = false;
        for mask in 1..num_masks {
            let Some(d) = dist[mask] else {
                continue;
            };
            let state = CnRyState::new(mask as u64, d);
            for mv in moves {
                let Some(next) = mv.apply(&state) else {
                    continue;
                };
                let slot = &mut dist[next.mask() as usize];
                if slot.is_none_or(|old| next.cost() < old) {
                    *slot = Some(next.cost());
                    changed = true;
                }
            }
        }
        if !changed {
            return dist;
        }
    }
}

#[rstest]
#[case::two_qubits_cnot(2, 1)]
#[case::two_qubits_full(2, 2)]
#[case::three_qubits_cnot(3, 1)]
#[case::three_qubits_full(3, 2)]
fn search_is_optimal(#[case] num_qubits: usize, #[case] max_controls: usize) {
    let options = SolverOptions {
        max_controls,
        cnot_limit: None,
    };
    let solver = CnRySolver::new(num_qubits, options).unwrap();
    let moves = (0..num_qubits)
        .flat_map(|q| get_all_moves(num_qubits, q, max_controls))
        .collect_vec();
    assert_eq!(moves.len(), solver.moves().len());

    for (mask, dist) in all_distances(&moves, num_qubits).into_iter().enumerate() {
        let Some(dist) = dist else {
            continue;
        };
        let solution = solver.solve(CnRyState::new(mask as u64, 0)).unwrap();
        assert_eq!(solution.cost(), dist, "label set {mask:#b}");
    }
}

#[test]
fn unreachable_target() {
    // Without controls, no move entangles two qubits.
    let options = SolverOptions {
        max_controls: 0,
        cnot_limit: None,
    };
    let solver = CnRySolver::new(2, options).unwrap();
    assert_matches!(
        solver.solve(CnRyState::from_labels([0, 3])),
        Err(SolverError::SearchExhausted)
    );
}

#[rstest]
#[case::bell(vec![1.0, 0.0, 0.0, 1.0], 1)]
#[case::ghz(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0], 2)]
#[case::skewed_ghz(vec![0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.8], 2)]
#[case::product(vec![0.5, 0.5, 0.5, 0.5], 0)]
fn solver_circuits(#[case] amplitudes: Vec<f64>, #[case] cost: usize) {
    let circ = cnry_solver(&amplitudes, &SolverOptions::default()).unwrap();
    assert_eq!(circ.cnot_cost(), cost);

    let expected = QState::from_amplitudes(&amplitudes).unwrap().to_dense();
    let prepared = circ.simulate();
    let overlap: f64 = prepared.iter().zip(&expected).map(|(a, e)| a * e).sum();
    for (a, e) in prepared.iter().zip(&expected) {
        assert_abs_diff_eq!(overlap.signum() * a, *e, epsilon = 1e-9);
    }
}

#[test]
fn solver_input_errors() {
    assert_matches!(
        cnry_solver(&[1.0, 0.0, 1.0], &SolverOptions::default()),
        Err(SolverError::InvalidTarget(_))
    );
    assert_matches!(
        cnry_solver(&[1.0; 128], &SolverOptions::default()),
        Err(SolverError::TooManyQubits { num_qubits: 7 })
    );
}

#[test]
fn node_trace_is_flushed_on_failure() {
    let mut buf = Vec::new();
    let options = SolverOptions {
        max_controls: 2,
        cnot_limit: Some(1),
    };
    let solver = CnRySolver::new(3, options).unwrap();
    let target = CnRyState::from_labels([1, 2, 4]);
    let result = solver.solve_with_log(target, SearchLogger::new(&mut buf));
    assert_matches!(result, Err(SolverError::Infeasible { cnot_limit: 1 }));

    let trace = String::from_utf8(buf).unwrap();
    let mut lines = trace.lines();
    assert_eq!(lines.next(), Some("labels,cost,queue_size,time"));
    let rows = lines.collect_vec();
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|l| l.trim_start_matches('"').starts_with('{')));
}

#[test]
fn finalised_nodes_are_unique_and_ordered() {
    let mut buf = Vec::new();
    let options = SolverOptions {
        max_controls: 2,
        cnot_limit: None,
    };
    let solver = CnRySolver::new(3, options).unwrap();
    let solution = solver
        .solve_with_log(CnRyState::from_labels([1, 2, 4]), SearchLogger::new(&mut buf))
        .unwrap();

    let mut reader = csv::Reader::from_reader(buf.as_slice());
    assert_eq!(
        reader.headers().unwrap().iter().collect_vec(),
        vec!["labels", "cost", "queue_size", "time"]
    );
    let rows: Vec<(String, usize)> = reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].parse().unwrap())
        })
        .collect();

    assert!(!rows.is_empty());
    assert!(rows.iter().map(|(labels, _)| labels).all_unique());
    assert!(rows.iter().tuple_windows().all(|(a, b)| a.1 <= b.1));
    assert_eq!(rows.last().map(|(_, cost)| *cost), Some(solution.cost()));
}
