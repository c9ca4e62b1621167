use std::hint::black_box;

use criterion::{criterion_group, AxisScale, BenchmarkId, Criterion, PlotConfiguration};
use qsprep::{prepare_state_with_stats, StatePreparationParameters, StatePreparationStatistics};

use super::generators::{random_sparse_state, w_state};

fn bench_prepare_w_state(c: &mut Criterion) {
    let mut g = c.benchmark_group("prepare a W state");
    g.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for num_qubits in [4, 8, 12] {
        g.bench_with_input(
            BenchmarkId::new("prepare_w_state", num_qubits),
            &num_qubits,
            |b, &num_qubits| {
                let state = w_state(num_qubits);
                b.iter(|| {
                    let mut stats = StatePreparationStatistics::new();
                    black_box(prepare_state_with_stats(&state, None, &mut stats))
                })
            },
        );
    }
    g.finish();
}

fn bench_prepare_sparse(c: &mut Criterion) {
    let mut g = c.benchmark_group("prepare a random sparse state");

    let params = StatePreparationParameters {
        enable_n_flow: true,
        ..Default::default()
    };
    for cardinality in [4, 8, 16] {
        g.bench_with_input(
            BenchmarkId::new("prepare_sparse", cardinality),
            &cardinality,
            |b, &cardinality| {
                let state = random_sparse_state(8, cardinality, 42);
                b.iter(|| {
                    let mut stats = StatePreparationStatistics::new();
                    black_box(prepare_state_with_stats(&state, Some(&params), &mut stats))
                })
            },
        );
    }
    g.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets =
        bench_prepare_w_state,
        bench_prepare_sparse,
}
