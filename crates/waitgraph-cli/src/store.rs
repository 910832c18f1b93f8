//! Directory-backed scenario storage.
//!
//! Each scenario is one pretty-printed JSON file named after a slug of the
//! scenario name. Saving an existing name overwrites its file.
use std::path::{Path, PathBuf};

use waitgraph_core::{Scenario, ScenarioError, ScenarioStore};

const MAX_SLUG_LEN: usize = 48;

/// Turns a scenario name into a file stem: lowercase ASCII alphanumerics,
/// runs of anything else collapsed to one `-`, trimmed, at most 48 chars.
///
/// Returns `None` when nothing alphanumeric remains.
pub fn slug(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            out.push('-');
            last_was_hyphen = true;
        }
    }
    out.truncate(MAX_SLUG_LEN);
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// A [`ScenarioStore`] over a directory of JSON files.
#[derive(Debug, Clone)]
pub struct DirScenarioStore {
    dir: PathBuf,
}

impl DirScenarioStore {
    /// Opens a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ScenarioError> {
        let stem = slug(name).ok_or(ScenarioError::EmptyName)?;
        Ok(self.dir.join(format!("{stem}.json")))
    }

    fn read(path: &Path) -> Result<Scenario, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|e| storage(path, &e))?;
        serde_json::from_str(&content)
            .map_err(|e| ScenarioError::Storage(format!("{}: {e}", path.display())))
    }
}

fn storage(path: &Path, e: &dyn std::fmt::Display) -> ScenarioError {
    ScenarioError::Storage(format!("{}: {e}", path.display()))
}

impl ScenarioStore for DirScenarioStore {
    fn save(&mut self, scenario: &Scenario) -> Result<(), ScenarioError> {
        let path = self.path_for(&scenario.name)?;
        if path.exists() {
            let existing = Self::read(&path)?;
            if existing.name != scenario.name {
                return Err(ScenarioError::Storage(format!(
                    "\"{}\" maps to the same file as existing scenario \"{}\"",
                    scenario.name, existing.name
                )));
            }
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| storage(&self.dir, &e))?;
        let json = serde_json::to_string_pretty(scenario).map_err(|e| storage(&path, &e))?;
        std::fs::write(&path, json + "\n").map_err(|e| storage(&path, &e))?;
        tracing::debug!(name = %scenario.name, path = %path.display(), "scenario saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Scenario, ScenarioError> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(ScenarioError::NotFound(name.to_owned()));
        }
        let scenario = Self::read(&path)?;
        if scenario.name != name {
            return Err(ScenarioError::NotFound(name.to_owned()));
        }
        Ok(scenario)
    }

    fn list(&self) -> Result<Vec<Scenario>, ScenarioError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|e| storage(&self.dir, &e))?;
        let mut scenarios = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| storage(&self.dir, &e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path) {
                Ok(s) => scenarios.push(s),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable scenario file"),
            }
        }
        scenarios.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scenarios)
    }

    fn delete(&mut self, name: &str) -> Result<(), ScenarioError> {
        // Goes through load so a slug shared with another name is not removed.
        self.load(name)?;
        let path = self.path_for(name)?;
        std::fs::remove_file(&path).map_err(|e| storage(&path, &e))?;
        tracing::debug!(name, path = %path.display(), "scenario deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use waitgraph_core::ProcessSnapshot;

    use super::*;

    fn scenario(name: &str) -> Scenario {
        let procs = vec![
            ProcessSnapshot::from_strs("P1", &["R1"], &["R2"]).expect("valid"),
            ProcessSnapshot::from_strs("P2", &["R2"], &["R1"]).expect("valid"),
        ];
        Scenario::new(name, None, procs).expect("valid scenario")
    }

    #[test]
    fn slug_rules() {
        assert_eq!(slug("Mutual Wait").as_deref(), Some("mutual-wait"));
        assert_eq!(slug("  --Two   Hops!! ").as_deref(), Some("two-hops"));
        assert_eq!(slug("!!!"), None);
        let long = "a".repeat(60);
        assert_eq!(slug(&long).map(|s| s.len()), Some(48));
        assert_eq!(
            slug(&format!("{} b", "a".repeat(47))).as_deref(),
            Some("a".repeat(47).as_str())
        );
    }

    #[test]
    fn save_load_list_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DirScenarioStore::new(dir.path().join("scenarios"));

        assert!(store.list().expect("list").is_empty());

        store.save(&scenario("Zeta Case")).expect("save");
        store.save(&scenario("alpha")).expect("save");
        assert!(dir.path().join("scenarios/zeta-case.json").is_file());

        let names: Vec<String> = store
            .list()
            .expect("list")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Zeta Case", "alpha"]);

        let loaded = store.load("Zeta Case").expect("load");
        assert_eq!(loaded.processes.len(), 2);

        store.delete("alpha").expect("delete");
        assert!(matches!(
            store.load("alpha"),
            Err(ScenarioError::NotFound(_))
        ));
    }

    #[test]
    fn resave_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DirScenarioStore::new(dir.path());
        store.save(&scenario("demo")).expect("save");
        let mut updated = scenario("demo");
        updated.description = Some("second".to_owned());
        store.save(&updated).expect("overwrite");
        assert_eq!(
            store.load("demo").expect("load").description.as_deref(),
            Some("second")
        );
        assert_eq!(store.list().expect("list").len(), 1);
    }

    #[test]
    fn slug_collision_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DirScenarioStore::new(dir.path());
        store.save(&scenario("Demo")).expect("save");
        let err = store.save(&scenario("demo")).expect_err("same slug");
        assert!(matches!(err, ScenarioError::Storage(_)));
        assert!(matches!(
            store.load("demo"),
            Err(ScenarioError::NotFound(_))
        ));
    }

    #[test]
    fn unsluggable_name_is_empty_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DirScenarioStore::new(dir.path());
        let s = Scenario::new("???", None, Vec::new()).expect("non-blank name");
        assert!(matches!(store.save(&s), Err(ScenarioError::EmptyName)));
    }

    #[test]
    fn missing_directory_lists_empty() {
        let store = DirScenarioStore::new("/no/such/waitgraph/dir");
        assert!(store.list().expect("list").is_empty());
        assert!(matches!(
            store.load("x"),
            Err(ScenarioError::NotFound(_))
        ));
    }
}
