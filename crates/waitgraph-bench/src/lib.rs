//! Snapshot generator and benchmark utilities for waitgraph.
//!
//! This crate provides deterministic generation of resource-allocation
//! snapshots for benchmarking and property-based testing of `waitgraph-core`.

pub mod correctness;
pub mod generator;

pub use generator::{GeneratorConfig, SizeTier, generate_snapshot, snapshot_json};
