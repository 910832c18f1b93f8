//! Clap CLI definition: root struct, subcommands, and shared argument types.
use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// A CLI argument that is either a filesystem path or the stdin sentinel `"-"`.
#[derive(Clone, Debug)]
pub enum PathOrStdin {
    /// Read from standard input.
    Stdin,
    /// Read from the given filesystem path.
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(PathOrStdin::Stdin)
        } else {
            Ok(PathOrStdin::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for PathOrStdin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("-"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Output format for CLI commands.
///
/// `Human` writes plain text results to stdout and colored status lines to
/// stderr. `Json` writes a single JSON document to stdout (NDJSON for
/// validator diagnostics).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, optionally colored output (default).
    Human,
    /// Structured JSON output.
    Json,
}

/// Subcommands of `waitgraph scenario`.
#[derive(Subcommand)]
pub enum ScenarioCommand {
    /// Store a snapshot under a name, replacing any scenario of that name.
    Save {
        /// Scenario name.
        #[arg(value_name = "NAME")]
        name: String,
        /// Snapshot file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Free-form description.
        #[arg(long)]
        description: Option<String>,
        /// Declared process count (default: the number of processes).
        #[arg(long, value_name = "N")]
        process_count: Option<usize>,
        /// Declared resource count (default: the number of distinct resources).
        #[arg(long, value_name = "N")]
        resource_count: Option<usize>,
    },

    /// Print a stored scenario's processes as JSON.
    Load {
        /// Scenario name.
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List stored scenarios.
    List,

    /// Remove a stored scenario.
    Delete {
        /// Scenario name.
        #[arg(value_name = "NAME")]
        name: String,
    },
}

/// All top-level subcommands exposed by the `waitgraph` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Detect circular waits in a snapshot.
    Detect {
        /// Snapshot file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Detect circular waits and recommend a rollback for each.
    Advise {
        /// Snapshot file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Roll back pending requests to break deadlocks and print the new snapshot.
    Resolve {
        /// Snapshot file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Keep rolling back until no deadlock remains.
        #[arg(long)]
        until_safe: bool,
        /// Upper bound on rollbacks with `--until-safe` (default: unlimited).
        #[arg(long, value_name = "N", requires = "until_safe")]
        max_rounds: Option<usize>,
    },

    /// Check a snapshot for inconsistent or suspicious allocations.
    Validate {
        /// Snapshot file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
    },

    /// Manage named scenarios in the scenario directory.
    Scenario {
        /// Scenario action.
        #[command(subcommand)]
        action: ScenarioCommand,
    },

    /// Print a built-in example snapshot.
    Example {
        /// Example name (see `--list`).
        #[arg(value_name = "NAME", required_unless_present = "list")]
        name: Option<String>,
        /// List the available examples.
        #[arg(long, conflicts_with = "name")]
        list: bool,
    },
}

/// Root CLI struct for the `waitgraph` binary.
///
/// Global flags are marked `global = true` so clap accepts them after any
/// subcommand.
#[derive(Parser)]
#[command(
    name = "waitgraph",
    version,
    about = "Deadlock detector for resource-allocation snapshots",
    long_about = "Builds the resource-allocation graph of a process snapshot, reports\n\
                  every circular wait, and recommends which pending request to roll back."
)]
pub struct Cli {
    /// Active subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Output format: human (default) or json.
    #[arg(long, short = 'f', default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Suppress all stderr output except errors (incompatible with `--verbose`).
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Debug logging and timing on stderr (incompatible with `--quiet`).
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Maximum input size in bytes.
    ///
    /// Can also be set via `WAITGRAPH_MAX_FILE_SIZE`. Default: 16777216 (16 MiB).
    #[arg(
        long,
        global = true,
        env = "WAITGRAPH_MAX_FILE_SIZE",
        default_value = "16777216"
    )]
    pub max_file_size: u64,

    /// Disable ANSI color codes in human output.
    ///
    /// Also respects the `NO_COLOR` environment variable per
    /// <https://no-color.org>.
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Directory holding saved scenarios.
    #[arg(
        long,
        global = true,
        env = "WAITGRAPH_SCENARIO_DIR",
        default_value = ".waitgraph/scenarios"
    )]
    pub scenario_dir: PathBuf,
}
