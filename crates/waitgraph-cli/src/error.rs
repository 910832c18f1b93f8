/// CLI error types with associated exit codes.
///
/// Every [`CliError`] variant maps to a stable exit code via
/// [`CliError::exit_code`]:
///
/// - Exit code **2**: input failure. The input could not be read, decoded or
///   parsed, or the scenario store could not be accessed.
/// - Exit code **1**: logical outcome. The command ran to completion and the
///   answer is a failure (deadlock present, validation errors, unknown name).
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CliError
// ---------------------------------------------------------------------------

/// All error conditions the `waitgraph` binary can produce.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// A file argument does not exist.
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The process may not read a file.
    PermissionDenied {
        /// The unreadable path.
        path: PathBuf,
    },

    /// The input exceeds `--max-file-size`.
    FileTooLarge {
        /// `"-"` for stdin, otherwise the path.
        source: String,
        /// The configured limit in bytes.
        limit: u64,
        /// The actual size, when known (disk files only).
        actual: Option<u64>,
    },

    /// The input bytes are not valid UTF-8.
    InvalidUtf8 {
        /// `"-"` for stdin, otherwise the path.
        source: String,
        /// Offset of the first invalid byte.
        byte_offset: usize,
    },

    /// Reading stdin failed.
    StdinReadError {
        /// The underlying I/O error message.
        detail: String,
    },

    /// Any other I/O failure, including writes to stdout/stderr.
    IoError {
        /// What was being read or written.
        source: String,
        /// The underlying I/O error message.
        detail: String,
    },

    /// The input is not a snapshot document.
    ParseFailed {
        /// Parser message, including position when available.
        detail: String,
    },

    /// A scenario could not be built from the arguments.
    InvalidScenario {
        /// Why it was rejected.
        detail: String,
    },

    /// The scenario directory could not be read or written.
    StorageError {
        /// The underlying failure.
        detail: String,
    },

    // --- Exit code 1: logical outcomes ---
    /// Detection found at least one circular wait.
    ///
    /// The result has already been printed; this variant carries the exit
    /// code back to `main`.
    DeadlockDetected {
        /// Number of cycles reported.
        cycles: usize,
    },

    /// The snapshot validator found errors.
    ValidationErrors,

    /// No stored scenario has this name.
    ScenarioNotFound {
        /// The requested name.
        name: String,
    },

    /// No built-in preset has this name.
    UnknownPreset {
        /// The requested name.
        name: String,
    },
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::FileTooLarge { .. }
            | Self::InvalidUtf8 { .. }
            | Self::StdinReadError { .. }
            | Self::IoError { .. }
            | Self::ParseFailed { .. }
            | Self::InvalidScenario { .. }
            | Self::StorageError { .. } => 2,

            Self::DeadlockDetected { .. }
            | Self::ValidationErrors
            | Self::ScenarioNotFound { .. }
            | Self::UnknownPreset { .. } => 1,
        }
    }

    /// Returns the message `main` prints to stderr.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("error: file not found: {}", path.display())
            }
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: Some(actual),
            } => {
                format!("error: file too large: {source} is {actual} bytes, limit is {limit} bytes")
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: None,
            } => {
                format!("error: file too large: {source} exceeded limit of {limit} bytes")
            }
            Self::InvalidUtf8 {
                source,
                byte_offset,
            } => {
                format!(
                    "error: invalid UTF-8 in {source}: first invalid byte at offset {byte_offset}"
                )
            }
            Self::StdinReadError { detail } => {
                format!("error: failed to read stdin: {detail}")
            }
            Self::IoError { source, detail } => {
                format!("error: I/O error on {source}: {detail}")
            }
            Self::ParseFailed { detail } => {
                format!("error: not a valid snapshot: {detail}")
            }
            Self::InvalidScenario { detail } => {
                format!("error: invalid scenario: {detail}")
            }
            Self::StorageError { detail } => {
                format!("error: scenario store: {detail}")
            }
            Self::DeadlockDetected { cycles } => {
                format!("deadlock: {cycles} circular wait condition(s) found")
            }
            Self::ValidationErrors => {
                "error: snapshot validation failed with one or more errors".to_owned()
            }
            Self::ScenarioNotFound { name } => {
                format!("error: scenario \"{name}\" not found")
            }
            Self::UnknownPreset { name } => {
                format!("error: unknown example \"{name}\" (see `waitgraph example --list`)")
            }
        }
    }

    /// Wraps a write failure on `target` (`"stdout"` or `"stderr"`).
    pub fn write_failed(target: &str, e: &std::io::Error) -> Self {
        Self::IoError {
            source: target.to_owned(),
            detail: e.to_string(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

impl From<waitgraph_core::SnapshotParseError> for CliError {
    fn from(e: waitgraph_core::SnapshotParseError) -> Self {
        Self::ParseFailed {
            detail: e.to_string(),
        }
    }
}

impl From<waitgraph_core::ScenarioError> for CliError {
    fn from(e: waitgraph_core::ScenarioError) -> Self {
        use waitgraph_core::ScenarioError;
        match e {
            ScenarioError::NotFound(name) => Self::ScenarioNotFound { name },
            ScenarioError::EmptyName | ScenarioError::CapacityExceeded { .. } => {
                Self::InvalidScenario {
                    detail: e.to_string(),
                }
            }
            ScenarioError::Storage(detail) => Self::StorageError { detail },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
