mod cli;
mod cmd;
mod error;
mod format;
mod io;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use cli::{Cli, Command, OutputFormat, PathOrStdin, ScenarioCommand};

use crate::error::CliError;
use crate::format::FormatterConfig;
use crate::store::DirScenarioStore;

/// Installs the stderr log subscriber.
///
/// `WAITGRAPH_LOG` takes precedence; otherwise `--verbose` enables debug
/// output and `--quiet` limits logging to errors.
fn init_tracing(quiet: bool, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("WAITGRAPH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = FormatterConfig::from_flags(cli.format, cli.no_color, cli.quiet, cli.verbose);
    let max = cli.max_file_size;

    match &cli.command {
        Command::Detect { file } => {
            let processes = io::read_snapshot(file, max)?;
            cmd::detect::run(&processes, &config)
        }
        Command::Advise { file } => {
            let processes = io::read_snapshot(file, max)?;
            cmd::advise::run(&processes, &config)
        }
        Command::Resolve {
            file,
            until_safe,
            max_rounds,
        } => {
            let processes = io::read_snapshot(file, max)?;
            cmd::resolve::run(&processes, *until_safe, *max_rounds, &config)
        }
        Command::Validate { file } => {
            let processes = io::read_snapshot(file, max)?;
            cmd::validate::run(&processes, &config)
        }
        Command::Scenario { action } => {
            let mut store = DirScenarioStore::new(&cli.scenario_dir);
            tracing::debug!(dir = %store.dir().display(), "using scenario directory");
            cmd::scenario::run(action, &mut store, max, &config)
        }
        Command::Example { name, list } => cmd::example::run(name.as_deref(), *list, &config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}
