mod tracing;

use crate::tracing::Tracer;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;
use qsprep::cnry::{cnry_solver_with_log, SearchLogger, SolverOptions};
use qsprep::{
    prepare_state_with_stats, Circuit, QState, StatePreparationParameters,
    StatePreparationStatistics,
};

/// Synthesise state preparation circuits with few CNOTs.
#[derive(Parser, Debug)]
#[clap(version = "1.0", long_about = None)]
#[clap(about = "Synthesise state preparation circuits with few CNOTs.")]
struct CmdLineArgs {
    /// Input state file.
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Input. A JSON array of 2^n real amplitudes."
    )]
    input: PathBuf,
    /// Output circuit file.
    #[arg(
        short,
        long,
        default_value = "out.json",
        value_name = "FILE",
        help = "Output. The preparation circuit in JSON format."
    )]
    output: PathBuf,
    /// Planner parameters file.
    #[arg(
        long,
        value_name = "PARAMS_FILE",
        help = "A JSON file of planner parameters. Missing fields take their default value."
    )]
    params: Option<PathBuf>,
    /// Log output file
    #[arg(
        short,
        long,
        default_value = "qsprep-synth.log",
        value_name = "LOGFILE",
        help = "Logfile to output the progress of the synthesis."
    )]
    logfile: Option<PathBuf>,
    /// Use the exact CnRy solver on the whole state.
    #[arg(
        long,
        help = "Run the exact CnRy solver on the whole state instead of the planner. Limited to 6 qubits."
    )]
    solver: bool,
    /// Maximum number of controls of the solver moves.
    #[arg(
        long = "max-controls",
        default_value = "1",
        value_name = "N",
        help = "The maximum number of controls of a solver move. Only used with `--solver`."
    )]
    max_controls: usize,
    /// CNOT limit of the solver.
    #[arg(
        long = "cnot-limit",
        value_name = "N",
        help = "Give up when no circuit exists within N CNOTs (default=None). Only used with `--solver`."
    )]
    cnot_limit: Option<usize>,
    /// Search node trace.
    #[arg(
        long,
        value_name = "CSV_FILE",
        help = "Record every node of the solver search to a CSV file. Only used with `--solver`."
    )]
    trace: Option<PathBuf>,
    /// Disable exact synthesis.
    #[arg(long = "no-exact", help = "Never run exact synthesis in the planner.")]
    no_exact: bool,
    /// Enable qubit reduction.
    #[arg(long = "n-flow", help = "Explore qubit reduction in the planner.")]
    n_flow: bool,
    /// Enable cardinality reduction.
    #[arg(long = "m-flow", help = "Explore cardinality reduction in the planner.")]
    m_flow: bool,
    /// Largest support handed to exact synthesis.
    #[arg(
        long = "n-qubits-max",
        value_name = "N",
        help = "The largest support on which the planner runs exact synthesis."
    )]
    n_qubits_max: Option<usize>,
}

impl CmdLineArgs {
    /// The planner parameters, or `None` to use the defaults for the state.
    fn parameters(&self) -> Result<Option<StatePreparationParameters>, Box<dyn std::error::Error>> {
        let mut params = match &self.params {
            Some(path) => {
                let reader = BufReader::new(File::open(path)?);
                Some(serde_json::from_reader::<_, StatePreparationParameters>(reader)?)
            }
            None => None,
        };
        let overridden = self.no_exact || self.n_flow || self.m_flow || self.n_qubits_max.is_some();
        if overridden {
            let p = params.get_or_insert_with(|| StatePreparationParameters {
                enable_m_flow: false,
                ..Default::default()
            });
            p.enable_exact_synthesis &= !self.no_exact;
            p.enable_n_flow |= self.n_flow;
            p.enable_m_flow |= self.m_flow;
            if let Some(n) = self.n_qubits_max {
                p.n_qubits_max = n;
            }
            // Flags that only restrict exact synthesis keep the default branch.
            if !p.enable_n_flow && !p.enable_m_flow {
                p.enable_m_flow = true;
            }
        }
        Ok(params)
    }
}

fn load_amplitudes(path: &Path) -> Result<Vec<f64>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn save_circuit(circ: &Circuit, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, circ)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = CmdLineArgs::parse();

    // Setup tracing subscribers for stdout and file logging.
    //
    // We need to keep the object around to keep the logging active.
    let _tracer = Tracer::setup_tracing(opts.logfile.clone())?;

    let amplitudes = load_amplitudes(&opts.input)?;

    let circ = if opts.solver {
        let options = SolverOptions {
            max_controls: opts.max_controls,
            cnot_limit: opts.cnot_limit,
        };
        let logger = match &opts.trace {
            Some(path) => SearchLogger::new(BufWriter::new(File::create(path)?)),
            None => SearchLogger::default(),
        };
        println!("Solving...");
        match cnry_solver_with_log(&amplitudes, &options, logger) {
            Ok(circ) => circ,
            Err(e) => {
                eprintln!("The solver failed: {e}");
                exit(1);
            }
        }
    } else {
        let state = QState::from_amplitudes(&amplitudes)?;
        let params = opts.parameters()?;
        let mut stats = StatePreparationStatistics::new();
        println!(
            "Preparing a state of {} labels on {} qubits...",
            state.get_sparsity(),
            state.num_qubits()
        );
        let circ = match prepare_state_with_stats(&state, params.as_ref(), &mut stats) {
            Ok(circ) => circ,
            Err(e) => {
                eprintln!("State preparation failed: {e}");
                exit(1);
            }
        };
        stats.report();
        circ
    };

    println!(
        "{} gates, {} CNOTs.",
        circ.num_gates(),
        circ.cnot_cost()
    );
    println!("Saving result");
    save_circuit(&circ, &opts.output)?;

    println!("Done.");
    Ok(())
}
