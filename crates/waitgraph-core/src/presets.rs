/// Built-in example snapshots.
use crate::newtypes::NewtypeError;
use crate::snapshot::ProcessSnapshot;

/// `(id, holding, requesting)` for one process.
type Record = (&'static str, &'static [&'static str], &'static [&'static str]);

/// A named example snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    /// Lookup key, kebab-case.
    pub name: &'static str,
    /// One-line summary.
    pub description: &'static str,
    records: &'static [Record],
}

impl Preset {
    /// Builds the preset's snapshot.
    ///
    /// # Errors
    ///
    /// [`NewtypeError`] if a built-in id fails validation.
    pub fn processes(&self) -> Result<Vec<ProcessSnapshot>, NewtypeError> {
        self.records
            .iter()
            .map(|(id, holding, requesting)| ProcessSnapshot::from_strs(id, holding, requesting))
            .collect()
    }
}

/// Every built-in preset, in display order.
pub const PRESETS: [Preset; 5] = [
    Preset {
        name: "mutual-wait",
        description: "Two processes each hold what the other requests",
        records: &[("P1", &["R1"], &["R2"]), ("P2", &["R2"], &["R1"])],
    },
    Preset {
        name: "safe-chain",
        description: "A wait chain that ends in a process requesting nothing",
        records: &[
            ("P1", &["R1"], &["R2"]),
            ("P2", &["R2"], &["R3"]),
            ("P3", &["R3"], &[]),
        ],
    },
    Preset {
        name: "three-process-cycle",
        description: "Three processes in a circular wait",
        records: &[
            ("P1", &["R1"], &["R2"]),
            ("P2", &["R2"], &["R3"]),
            ("P3", &["R3"], &["R1"]),
        ],
    },
    Preset {
        name: "double-deadlock",
        description: "Two independent mutual waits",
        records: &[
            ("P1", &["R1"], &["R2"]),
            ("P2", &["R2"], &["R1"]),
            ("P3", &["R3"], &["R4"]),
            ("P4", &["R4"], &["R3"]),
        ],
    },
    Preset {
        name: "dining-philosophers",
        description: "Five philosophers each holding their left fork and waiting for the right",
        records: &[
            ("P1", &["F1"], &["F2"]),
            ("P2", &["F2"], &["F3"]),
            ("P3", &["F3"], &["F4"]),
            ("P4", &["F4"], &["F5"]),
            ("P5", &["F5"], &["F1"]),
        ],
    },
];

/// Looks up a preset by name.
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::detection::detect;

    #[test]
    fn every_preset_builds() {
        for preset in &PRESETS {
            let procs = preset.processes().expect("built-in ids are valid");
            assert!(!procs.is_empty(), "{} is empty", preset.name);
        }
    }

    #[test]
    fn presets_have_expected_outcomes() {
        let expected = [
            ("mutual-wait", 1),
            ("safe-chain", 0),
            ("three-process-cycle", 1),
            ("double-deadlock", 2),
            ("dining-philosophers", 1),
        ];
        for (name, cycles) in expected {
            let preset = find_preset(name).expect("preset exists");
            let result = detect(&preset.processes().expect("valid"));
            assert_eq!(result.cycles().len(), cycles, "{name}");
        }
    }

    #[test]
    fn dining_philosophers_ring_has_ten_nodes() {
        let preset = find_preset("dining-philosophers").expect("preset exists");
        let result = detect(&preset.processes().expect("valid"));
        assert_eq!(result.cycles()[0].open().len(), 10);
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(find_preset("nope").is_none());
    }
}
