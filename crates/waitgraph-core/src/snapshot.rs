/// Process snapshot records and JSON snapshot parsing.
///
/// A snapshot is an ordered list of [`ProcessSnapshot`] records describing,
/// at one point in time, which resources each process holds and which it is
/// waiting for. The order of the list is significant: it fixes the order in
/// which the graph builder creates nodes and therefore the order in which the
/// detector reports cycles.
///
/// [`parse_snapshot`] accepts three JSON shapes:
/// 1. a bare array of process records;
/// 2. an object with a `processes` array;
/// 3. a full scenario record (any object with a `processes` array).
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::newtypes::{NewtypeError, ProcessId, ResourceId};

// ---------------------------------------------------------------------------
// ProcessSnapshot
// ---------------------------------------------------------------------------

/// One process's allocation state at the moment the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessSnapshot {
    /// Unique identifier of the process within the snapshot.
    pub id: ProcessId,
    /// Resources currently granted to this process.
    #[serde(default)]
    pub holding: BTreeSet<ResourceId>,
    /// Resources this process is waiting for, oldest request first.
    #[serde(default)]
    pub requesting: Vec<ResourceId>,
}

impl ProcessSnapshot {
    /// Creates a process that holds nothing and requests nothing.
    pub fn new(id: ProcessId) -> Self {
        Self {
            id,
            holding: BTreeSet::new(),
            requesting: Vec::new(),
        }
    }

    /// Builds a process from raw string ids.
    ///
    /// # Errors
    ///
    /// Returns [`NewtypeError`] if any id fails identifier validation.
    pub fn from_strs(id: &str, holding: &[&str], requesting: &[&str]) -> Result<Self, NewtypeError> {
        Ok(Self {
            id: ProcessId::try_from(id)?,
            holding: holding
                .iter()
                .map(|r| ResourceId::try_from(*r))
                .collect::<Result<_, _>>()?,
            requesting: requesting
                .iter()
                .map(|r| ResourceId::try_from(*r))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Returns `true` if this process currently holds `resource`.
    pub fn holds(&self, resource: &ResourceId) -> bool {
        self.holding.contains(resource)
    }

    /// The most recent pending request, if any.
    pub fn last_request(&self) -> Option<&ResourceId> {
        self.requesting.last()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Errors produced while parsing a snapshot document.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotParseError {
    /// The input is not syntactically valid JSON.
    #[error("invalid JSON at line {line}, column {column}: {detail}")]
    Syntax {
        /// 1-based line of the error.
        line: usize,
        /// 1-based column of the error.
        column: usize,
        /// The underlying parser message.
        detail: String,
    },

    /// The JSON is valid but is neither an array nor an object with a
    /// `processes` array.
    #[error("expected an array of processes or an object with a \"processes\" array, got {found}")]
    UnexpectedShape {
        /// A short description of what was found instead.
        found: &'static str,
    },

    /// A process record is malformed (bad id, unknown field, wrong type).
    #[error("invalid process record: {0}")]
    InvalidProcess(String),
}

/// Parses a snapshot document into its ordered list of processes.
///
/// # Errors
///
/// - [`SnapshotParseError::Syntax`] if `content` is not valid JSON.
/// - [`SnapshotParseError::UnexpectedShape`] for any top-level value other
///   than an array or an object carrying `processes`.
/// - [`SnapshotParseError::InvalidProcess`] if a record fails to deserialize.
pub fn parse_snapshot(content: &str) -> Result<Vec<ProcessSnapshot>, SnapshotParseError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| SnapshotParseError::Syntax {
            line: e.line(),
            column: e.column(),
            detail: e.to_string(),
        })?;
    processes_from_value(value)
}

/// Extracts the process list from an already-parsed JSON value.
///
/// # Errors
///
/// Same as [`parse_snapshot`], minus syntax errors.
pub fn processes_from_value(
    value: serde_json::Value,
) -> Result<Vec<ProcessSnapshot>, SnapshotParseError> {
    let list = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => {
            map.remove("processes")
                .ok_or(SnapshotParseError::UnexpectedShape {
                    found: "an object without \"processes\"",
                })?
        }
        serde_json::Value::Null => {
            return Err(SnapshotParseError::UnexpectedShape { found: "null" });
        }
        serde_json::Value::Bool(_) => {
            return Err(SnapshotParseError::UnexpectedShape { found: "a boolean" });
        }
        serde_json::Value::Number(_) => {
            return Err(SnapshotParseError::UnexpectedShape { found: "a number" });
        }
        serde_json::Value::String(_) => {
            return Err(SnapshotParseError::UnexpectedShape { found: "a string" });
        }
    };

    serde_json::from_value(list).map_err(|e| SnapshotParseError::InvalidProcess(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
