use std::hint::black_box;

use criterion::{criterion_group, BenchmarkId, Criterion};
use qsprep::cnry::{CnRySolver, CnRyState, SolverOptions};

use super::generators::w_state;

fn bench_solve_w_state(c: &mut Criterion) {
    let mut g = c.benchmark_group("solve a W state exactly");
    g.sample_size(10);

    for num_qubits in [3, 4] {
        for max_controls in [1, num_qubits - 1] {
            let options = SolverOptions {
                max_controls,
                cnot_limit: None,
            };
            let solver = CnRySolver::new(num_qubits, options).unwrap();
            let target = CnRyState::from_qstate(&w_state(num_qubits)).unwrap();
            g.bench_with_input(
                BenchmarkId::new(format!("cnry_{max_controls}_controls"), num_qubits),
                &target,
                |b, &target| b.iter(|| black_box(solver.solve(target))),
            );
        }
    }
    g.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets =
        bench_solve_w_state,
}
