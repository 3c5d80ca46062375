use clap::Parser;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tur_chain::{
    turing_chain, ChainError, MachineCatalog, MachineLoader, Program, SyncConfig, TapeTuple,
    TuringMachine, DEFAULT_MAX_CYCLE_STEPS,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(group(clap::ArgGroup::new("source").required(true).args(["machine", "builtin", "list"])))]
struct Cli {
    /// The machine definition file (`.tm`) to execute
    #[clap(short, long)]
    machine: Option<PathBuf>,

    /// The name of an embedded machine
    #[clap(short, long)]
    builtin: Option<String>,

    /// List the embedded machines and exit
    #[clap(short, long)]
    list: bool,

    /// Number of Turing steps to advance the chain
    #[clap(short, long, default_value_t = 3)]
    steps: usize,

    /// Maximum elementary steps a level may take to finish simulating one step
    #[clap(long, default_value_t = DEFAULT_MAX_CYCLE_STEPS)]
    max_cycle_steps: usize,

    /// Print one JSON report per line
    #[clap(short, long)]
    json: bool,

    /// Print every level after each advance
    #[clap(short = 'd', long)]
    debug: bool,
}

/// Outcome of a single advance of the chain.
#[derive(Serialize)]
struct AdvanceReport {
    advance: usize,
    tuple: TapeTuple,
    counts: Vec<usize>,
    commutes: Vec<bool>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn run(cli: &Cli) -> Result<(), ChainError> {
    if cli.list {
        for (index, name) in MachineCatalog::list_names().iter().enumerate() {
            println!("{index}: {name}");
        }
        return Ok(());
    }

    let program = load(cli)?;
    tracing::info!(
        machine = %program.name,
        states = program.state_count(),
        tuple = %program.tape,
        "loaded machine"
    );

    let config = SyncConfig {
        max_cycle_steps: cli.max_cycle_steps,
    };
    let mut sync = turing_chain(program.machine(), config);
    sync.generate()?;

    if cli.debug && !cli.json {
        println!("{sync}\n");
    }

    for advance in 1..=cli.steps {
        let counts = sync.advance()?;
        let report = AdvanceReport {
            advance,
            tuple: base_tuple(&sync)?,
            counts,
            commutes: sync.compare()?,
        };

        if cli.json {
            let line = serde_json::to_string(&report)
                .map_err(|e| ChainError::ValidationError(e.to_string()))?;
            println!("{line}");
        } else {
            println!(
                "advance {}: {} steps {:?} commutes {:?}",
                report.advance, report.tuple, report.counts, report.commutes
            );
            if cli.debug {
                println!("{sync}\n");
            }
        }

        if report.commutes.iter().any(|commutes| !commutes) {
            tracing::warn!(advance, "levels diverged");
        }
    }

    Ok(())
}

fn load(cli: &Cli) -> Result<Program, ChainError> {
    match (&cli.machine, &cli.builtin) {
        (Some(path), _) => MachineLoader::load_machine(path),
        (None, Some(name)) => MachineCatalog::get_by_name(name),
        (None, None) => Err(ChainError::ValidationError(
            "Either --machine or --builtin is required".to_string(),
        )),
    }
}

fn base_tuple(sync: &tur_chain::Synchronizer) -> Result<TapeTuple, ChainError> {
    sync.model::<TuringMachine>(0)
        .ok_or(ChainError::LevelTypeMismatch(0))?
        .tape_tuple()
}
