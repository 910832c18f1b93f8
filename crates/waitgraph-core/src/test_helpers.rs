//! Shared fixture constructors for unit tests across `waitgraph-core`.
//!
//! Compiled only in test builds. Integration tests under `tests/` define
//! their own helpers because they link against the non-test library build.
#![allow(clippy::expect_used)]

use crate::newtypes::{ProcessId, ResourceId};
use crate::snapshot::ProcessSnapshot;

/// Creates a [`ProcessId`], panicking on invalid input.
pub fn pid(s: &str) -> ProcessId {
    ProcessId::try_from(s).expect("valid ProcessId")
}

/// Creates a [`ResourceId`], panicking on invalid input.
pub fn rid(s: &str) -> ResourceId {
    ResourceId::try_from(s).expect("valid ResourceId")
}

/// Builds a [`ProcessSnapshot`] from string ids, panicking on invalid input.
pub fn proc(id: &str, holding: &[&str], requesting: &[&str]) -> ProcessSnapshot {
    ProcessSnapshot::from_strs(id, holding, requesting).expect("valid process")
}
