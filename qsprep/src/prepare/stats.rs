//! Statistics collected by the state preparation planner.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::time::Duration;

use serde::{Serialize, Serializer};
use strum::{EnumIter, IntoStaticStr};

use crate::cnry::log::LOG_TARGET;

/// The reduction branches the planner chooses between.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMethod {
    /// Cardinality reduction (m-flow).
    SparseQsp,
    /// Qubit reduction (n-flow).
    QubitReduction,
}

impl fmt::Display for SynthesisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(<&'static str>::from(self))
    }
}

/// Counters and timings of a state preparation run.
///
/// Every recursion branch accumulates into its own statistics, which are
/// added together where the planner selects between branches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatePreparationStatistics {
    #[serde(serialize_with = "as_secs")]
    time_total: Duration,
    num_runs_support_reduction: usize,
    num_reduced_supports: usize,
    num_reduced_density: usize,
    num_saved_gates_decision: usize,
    num_exact_synthesis: usize,
    num_methods: BTreeMap<SynthesisMethod, usize>,
    #[serde(serialize_with = "as_secs")]
    time_support_reduction: Duration,
    #[serde(serialize_with = "as_secs")]
    time_exact_cnot_synthesis: Duration,
    #[serde(serialize_with = "as_secs")]
    time_cardinality_reduction: Duration,
    #[serde(serialize_with = "as_secs")]
    time_qubit_decomposition: Duration,
}

impl StatePreparationStatistics {
    /// Empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall time of the whole run.
    pub fn time_total(&self) -> Duration {
        self.time_total
    }

    /// Number of recursion levels that ran support reduction.
    pub fn num_runs_support_reduction(&self) -> usize {
        self.num_runs_support_reduction
    }

    /// Number of support qubits removed by support reduction.
    pub fn num_reduced_supports(&self) -> usize {
        self.num_reduced_supports
    }

    /// Number of labels removed by support reduction.
    pub fn num_reduced_density(&self) -> usize {
        self.num_reduced_density
    }

    /// CNOTs saved by choosing the best branch over the worst one.
    pub fn num_saved_gates_decision(&self) -> usize {
        self.num_saved_gates_decision
    }

    /// Number of sub-problems solved by exact synthesis.
    pub fn num_exact_synthesis(&self) -> usize {
        self.num_exact_synthesis
    }

    /// How many times each branch was selected.
    pub fn num_methods(&self) -> &BTreeMap<SynthesisMethod, usize> {
        &self.num_methods
    }

    /// How many times `method` was selected.
    pub fn method_count(&self, method: SynthesisMethod) -> usize {
        self.num_methods.get(&method).copied().unwrap_or(0)
    }

    /// Time spent in support reduction.
    pub fn time_support_reduction(&self) -> Duration {
        self.time_support_reduction
    }

    /// Time spent in exact synthesis.
    pub fn time_exact_cnot_synthesis(&self) -> Duration {
        self.time_exact_cnot_synthesis
    }

    /// Time spent computing cardinality reductions.
    pub fn time_cardinality_reduction(&self) -> Duration {
        self.time_cardinality_reduction
    }

    /// Time spent computing qubit reductions.
    pub fn time_qubit_decomposition(&self) -> Duration {
        self.time_qubit_decomposition
    }

    /// Log the statistics.
    pub fn report(&self) {
        for line in self.to_string().lines() {
            tracing::info!(target: LOG_TARGET, "{line}");
        }
    }

    pub(super) fn set_time_total(&mut self, time: Duration) {
        self.time_total = time;
    }

    pub(super) fn record_support_reduction(
        &mut self,
        time: Duration,
        reduced_supports: usize,
        reduced_density: usize,
    ) {
        self.num_runs_support_reduction += 1;
        self.time_support_reduction += time;
        self.num_reduced_supports += reduced_supports;
        self.num_reduced_density += reduced_density;
    }

    pub(super) fn record_exact_synthesis(&mut self, time: Duration, success: bool) {
        self.time_exact_cnot_synthesis += time;
        if success {
            self.num_exact_synthesis += 1;
        }
    }

    pub(super) fn record_cardinality_reduction(&mut self, time: Duration) {
        self.time_cardinality_reduction += time;
    }

    pub(super) fn record_qubit_reduction(&mut self, time: Duration) {
        self.time_qubit_decomposition += time;
    }

    pub(super) fn record_decision(&mut self, method: SynthesisMethod, saved_gates: usize) {
        self.num_saved_gates_decision += saved_gates;
        *self.num_methods.entry(method).or_default() += 1;
    }
}

impl AddAssign for StatePreparationStatistics {
    fn add_assign(&mut self, rhs: Self) {
        self.time_total += rhs.time_total;
        self.num_runs_support_reduction += rhs.num_runs_support_reduction;
        self.num_reduced_supports += rhs.num_reduced_supports;
        self.num_reduced_density += rhs.num_reduced_density;
        self.num_saved_gates_decision += rhs.num_saved_gates_decision;
        self.num_exact_synthesis += rhs.num_exact_synthesis;
        for (method, count) in rhs.num_methods {
            *self.num_methods.entry(method).or_default() += count;
        }
        self.time_support_reduction += rhs.time_support_reduction;
        self.time_exact_cnot_synthesis += rhs.time_exact_cnot_synthesis;
        self.time_cardinality_reduction += rhs.time_cardinality_reduction;
        self.time_qubit_decomposition += rhs.time_qubit_decomposition;
    }
}

impl fmt::Display for StatePreparationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(80);
        writeln!(f, "{rule}")?;
        writeln!(f, "time_total: {:.2} sec", self.time_total.as_secs_f64())?;
        writeln!(f, "{rule}")?;
        writeln!(f, "num_runs_support_reduction: {}", self.num_runs_support_reduction)?;
        for (name, time) in [
            ("time_support_reduction", self.time_support_reduction),
            ("time_exact_cnot_synthesis", self.time_exact_cnot_synthesis),
            ("time_cardinality_reduction", self.time_cardinality_reduction),
            ("time_qubit_decomposition", self.time_qubit_decomposition),
        ] {
            writeln!(f, "{name}: {:.2} sec", time.as_secs_f64())?;
        }
        writeln!(f, "num_reduced_supports: {}", self.num_reduced_supports)?;
        writeln!(f, "num_reduced_density: {}", self.num_reduced_density)?;
        writeln!(f, "num_saved_gates_decision: {}", self.num_saved_gates_decision)?;
        writeln!(f, "num_exact_synthesis: {}", self.num_exact_synthesis)?;
        writeln!(f, "{rule}")?;
        for (method, num) in &self.num_methods {
            writeln!(f, "{method}: {num}")?;
        }
        write!(f, "{rule}")
    }
}

fn as_secs<S: Serializer>(time: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(time.as_secs_f64())
}
