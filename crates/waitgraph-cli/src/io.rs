/// Snapshot input: file and stdin reading with a size cap and UTF-8 check.
///
/// `waitgraph-core` never touches the filesystem; every snapshot the binary
/// analyses is read here. Disk files are size-checked via metadata before
/// any read; stdin is read through `Read::take` so the buffer is bounded.
use std::io::Read as _;
use std::path::Path;

use waitgraph_core::{ProcessSnapshot, parse_snapshot};

use crate::PathOrStdin;
use crate::error::CliError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reads the whole of `source` into a `String`.
///
/// # Errors
///
/// Returns a [`CliError`] with exit code 2 when the file is missing,
/// unreadable, larger than `max_size`, or not valid UTF-8.
pub fn read_input(source: &PathOrStdin, max_size: u64) -> Result<String, CliError> {
    match source {
        PathOrStdin::Path(path) => read_file(path, max_size),
        PathOrStdin::Stdin => read_stdin(max_size),
    }
}

/// Reads and parses a snapshot document from `source`.
///
/// # Errors
///
/// Everything [`read_input`] returns, plus [`CliError::ParseFailed`] when
/// the content is not a snapshot.
pub fn read_snapshot(source: &PathOrStdin, max_size: u64) -> Result<Vec<ProcessSnapshot>, CliError> {
    let content = read_input(source, max_size)?;
    let processes = parse_snapshot(&content)?;
    tracing::debug!(
        source = %source,
        bytes = content.len(),
        processes = processes.len(),
        "snapshot loaded"
    );
    Ok(processes)
}

// ---------------------------------------------------------------------------
// Disk files
// ---------------------------------------------------------------------------

fn read_file(path: &Path, max_size: u64) -> Result<String, CliError> {
    let file_size = std::fs::metadata(path)
        .map_err(|e| io_error_to_cli(&e, path))?
        .len();

    if file_size > max_size {
        return Err(CliError::FileTooLarge {
            source: path.display().to_string(),
            limit: max_size,
            actual: Some(file_size),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| io_error_to_cli(&e, path))?;
    bytes_to_string(bytes, &path.display().to_string())
}

/// Maps a disk I/O error to a [`CliError`].
fn io_error_to_cli(e: &std::io::Error, path: &Path) -> CliError {
    let kind = e.kind();
    if kind == std::io::ErrorKind::NotFound {
        CliError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else if kind == std::io::ErrorKind::PermissionDenied {
        CliError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stdin
// ---------------------------------------------------------------------------

/// Reads stdin, capped at `max_size` bytes.
///
/// Reads up to `max_size + 1` bytes so that a stream of exactly `max_size`
/// bytes is accepted and anything longer is rejected.
fn read_stdin(max_size: u64) -> Result<String, CliError> {
    let mut buf: Vec<u8> = Vec::new();
    std::io::stdin()
        .lock()
        .take(max_size.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| CliError::StdinReadError {
            detail: e.to_string(),
        })?;

    if buf.len() as u64 > max_size {
        return Err(CliError::FileTooLarge {
            source: "-".to_owned(),
            limit: max_size,
            actual: None,
        });
    }

    bytes_to_string(buf, "-")
}

// ---------------------------------------------------------------------------
// UTF-8
// ---------------------------------------------------------------------------

fn bytes_to_string(bytes: Vec<u8>, source_label: &str) -> Result<String, CliError> {
    String::from_utf8(bytes).map_err(|e| CliError::InvalidUtf8 {
        source: source_label.to_owned(),
        byte_offset: e.utf8_error().valid_up_to(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
