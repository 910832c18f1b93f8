/// Named snapshots and the storage seam for them.
///
/// A [`Scenario`] is a snapshot with a name, an optional description and the
/// process/resource counts it was authored for. Storage is behind the
/// [`ScenarioStore`] trait so the library stays free of I/O; the in-memory
/// implementation here backs tests and embedding hosts.
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::newtypes::ResourceId;
use crate::snapshot::ProcessSnapshot;

/// Errors from scenario construction and storage.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The name is empty or whitespace only.
    #[error("scenario name must not be empty")]
    EmptyName,

    /// No scenario with this name exists.
    #[error("scenario \"{0}\" not found")]
    NotFound(String),

    /// The snapshot uses more processes or resources than declared.
    #[error("scenario declares {declared} {kind} but uses {actual}")]
    CapacityExceeded {
        /// `"processes"` or `"resources"`.
        kind: &'static str,
        /// The declared count.
        declared: usize,
        /// The count actually used.
        actual: usize,
    },

    /// The backing store failed.
    #[error("scenario storage error: {0}")]
    Storage(String),
}

/// A named, described snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Display name; also the storage key.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Number of processes the scenario was authored for.
    pub process_count: usize,
    /// Number of distinct resources the scenario was authored for.
    pub resource_count: usize,
    /// The snapshot itself.
    pub processes: Vec<ProcessSnapshot>,
}

impl Scenario {
    /// Creates a scenario whose counts are taken from `processes`.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::EmptyName`] if `name` is blank.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        processes: Vec<ProcessSnapshot>,
    ) -> Result<Self, ScenarioError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ScenarioError::EmptyName);
        }
        Ok(Self {
            name,
            description,
            process_count: processes.len(),
            resource_count: distinct_resources(&processes),
            processes,
        })
    }

    /// Overrides the declared counts. Counts below what the snapshot uses
    /// are rejected by [`Scenario::check_capacity`].
    #[must_use]
    pub fn with_counts(mut self, process_count: usize, resource_count: usize) -> Self {
        self.process_count = process_count;
        self.resource_count = resource_count;
        self
    }

    /// Verifies the snapshot fits the declared counts.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::CapacityExceeded`] naming the first count exceeded.
    pub fn check_capacity(&self) -> Result<(), ScenarioError> {
        if self.processes.len() > self.process_count {
            return Err(ScenarioError::CapacityExceeded {
                kind: "processes",
                declared: self.process_count,
                actual: self.processes.len(),
            });
        }
        let resources = distinct_resources(&self.processes);
        if resources > self.resource_count {
            return Err(ScenarioError::CapacityExceeded {
                kind: "resources",
                declared: self.resource_count,
                actual: resources,
            });
        }
        Ok(())
    }
}

/// Number of distinct resources held or requested anywhere in the snapshot.
pub fn distinct_resources(processes: &[ProcessSnapshot]) -> usize {
    processes
        .iter()
        .flat_map(|p| p.holding.iter().chain(p.requesting.iter()))
        .collect::<BTreeSet<&ResourceId>>()
        .len()
}

/// Storage for scenarios, keyed by name.
pub trait ScenarioStore {
    /// Stores `scenario`, replacing any scenario with the same name.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Storage`] on backend failure, or
    /// [`ScenarioError::EmptyName`] for a blank name.
    fn save(&mut self, scenario: &Scenario) -> Result<(), ScenarioError>;

    /// Fetches a scenario by name.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::NotFound`] if no such scenario exists.
    fn load(&self, name: &str) -> Result<Scenario, ScenarioError>;

    /// All stored scenarios, sorted by name.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Storage`] on backend failure.
    fn list(&self) -> Result<Vec<Scenario>, ScenarioError>;

    /// Removes a scenario.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::NotFound`] if no such scenario exists.
    fn delete(&mut self, name: &str) -> Result<(), ScenarioError>;
}

/// A [`ScenarioStore`] held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScenarioStore {
    scenarios: BTreeMap<String, Scenario>,
}

impl InMemoryScenarioStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScenarioStore for InMemoryScenarioStore {
    fn save(&mut self, scenario: &Scenario) -> Result<(), ScenarioError> {
        if scenario.name.trim().is_empty() {
            return Err(ScenarioError::EmptyName);
        }
        self.scenarios
            .insert(scenario.name.clone(), scenario.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Scenario, ScenarioError> {
        self.scenarios
            .get(name)
            .cloned()
            .ok_or_else(|| ScenarioError::NotFound(name.to_owned()))
    }

    fn list(&self) -> Result<Vec<Scenario>, ScenarioError> {
        Ok(self.scenarios.values().cloned().collect())
    }

    fn delete(&mut self, name: &str) -> Result<(), ScenarioError> {
        self.scenarios
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ScenarioError::NotFound(name.to_owned()))
    }
}
