//! Resource-allocation snapshot generator.
//!
//! Produces process snapshots with exclusive ownership (every resource has at
//! most one holder), random pending requests and, optionally, a number of
//! deliberately injected circular waits.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use waitgraph_core::{NewtypeError, ProcessId, ProcessSnapshot, ResourceId};

/// Configuration for the snapshot generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Seed for the random number generator (deterministic).
    pub seed: u64,
    /// Number of processes.
    pub num_processes: usize,
    /// Number of distinct resources.
    pub num_resources: usize,
    /// Resources granted to each process while free resources last.
    pub holds_per_process: usize,
    /// Probability that a process has background requests (0.0-1.0).
    pub request_probability: f64,
    /// Upper bound on background requests per process.
    pub max_requests: usize,
    /// Restrict background requests to free resources or resources held by
    /// a process with a higher index, which keeps them acyclic.
    pub hierarchical_requests: bool,
    /// Number of circular waits to inject.
    pub injected_cycles: usize,
    /// Processes per injected cycle (at least 2).
    pub cycle_length: usize,
}

/// Predefined size tiers for benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// 50 processes, 150 resources
    Small,
    /// 500 processes, 1500 resources
    Medium,
    /// 5000 processes, 15000 resources
    Large,
    /// 20000 processes, 60000 resources
    XLarge,
}

impl SizeTier {
    /// Returns the default `GeneratorConfig` for this size tier.
    ///
    /// Background requests are hierarchical, so the only circular waits are
    /// the injected ones.
    pub fn config(self, seed: u64) -> GeneratorConfig {
        let (num_processes, injected_cycles, cycle_length) = match self {
            SizeTier::Small => (50, 2, 3),
            SizeTier::Medium => (500, 8, 4),
            SizeTier::Large => (5_000, 25, 6),
            SizeTier::XLarge => (20_000, 50, 8),
        };
        GeneratorConfig {
            seed,
            num_processes,
            num_resources: num_processes * 3,
            holds_per_process: 2,
            request_probability: 0.6,
            max_requests: 3,
            hierarchical_requests: true,
            injected_cycles,
            cycle_length,
        }
    }

    /// The same tier with no injected cycles.
    pub fn safe_config(self, seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            injected_cycles: 0,
            ..self.config(seed)
        }
    }
}

/// Generates a snapshot from the given configuration.
///
/// Processes are named `P0..`, resources `R0..`. All randomness is
/// deterministic, seeded from `config.seed`.
///
/// # Errors
///
/// [`NewtypeError`] only if a generated id fails validation.
pub fn generate_snapshot(config: &GeneratorConfig) -> Result<Vec<ProcessSnapshot>, NewtypeError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (holding, requesting) = plan_allocation(config, &mut rng);

    holding
        .into_iter()
        .zip(requesting)
        .enumerate()
        .map(|(p, (held, requested))| {
            Ok(ProcessSnapshot {
                id: ProcessId::try_from(format!("P{p}").as_str())?,
                holding: held
                    .iter()
                    .map(|r| resource_id(*r))
                    .collect::<Result<BTreeSet<_>, _>>()?,
                requesting: requested
                    .iter()
                    .map(|r| resource_id(*r))
                    .collect::<Result<Vec<_>, _>>()?,
            })
        })
        .collect()
}

/// Serializes a snapshot to the JSON array accepted by the parser.
///
/// # Errors
///
/// Propagates `serde_json` serialization errors.
pub fn snapshot_json(processes: &[ProcessSnapshot]) -> serde_json::Result<String> {
    serde_json::to_string(processes)
}

fn resource_id(r: usize) -> Result<ResourceId, NewtypeError> {
    ResourceId::try_from(format!("R{r}").as_str())
}

type Allocation = (Vec<Vec<usize>>, Vec<Vec<usize>>);

fn plan_allocation(config: &GeneratorConfig, rng: &mut StdRng) -> Allocation {
    let n = config.num_processes;
    let mut holder: Vec<Option<usize>> = vec![None; config.num_resources];
    let mut holding: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut requesting: Vec<Vec<usize>> = vec![Vec::new(); n];

    let mut free: Vec<usize> = (0..config.num_resources).collect();
    free.shuffle(rng);
    let mut free = free.into_iter();
    'grant: for (p, held) in holding.iter_mut().enumerate() {
        for _ in 0..config.holds_per_process {
            let Some(r) = free.next() else {
                break 'grant;
            };
            holder[r] = Some(p);
            held.push(r);
        }
    }

    if config.num_resources > 0 {
        let probability = config.request_probability.clamp(0.0, 1.0);
        for (p, requests) in requesting.iter_mut().enumerate() {
            if !rng.gen_bool(probability) {
                continue;
            }
            let count = rng.gen_range(1..=config.max_requests.max(1));
            for _ in 0..count {
                let r = rng.gen_range(0..config.num_resources);
                let allowed = match holder[r] {
                    Some(h) => h != p && (!config.hierarchical_requests || h > p),
                    None => true,
                };
                if allowed && !requests.contains(&r) {
                    requests.push(r);
                }
            }
        }
    }

    // Injected cycles occupy consecutive process blocks from P0; each member
    // requests the first resource held by the next member.
    let len = config.cycle_length.max(2);
    for c in 0..config.injected_cycles {
        let members: Vec<usize> = (c * len..(c + 1) * len).filter(|&p| p < n).collect();
        if members.len() < 2 {
            break;
        }
        for (i, &p) in members.iter().enumerate() {
            let next = members[(i + 1) % members.len()];
            if let Some(&r) = holding[next].first() {
                if !requesting[p].contains(&r) {
                    requesting[p].push(r);
                }
            }
        }
    }

    (holding, requesting)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let config = SizeTier::Small.config(7);
        let a = generate_snapshot(&config).expect("generates");
        let b = generate_snapshot(&config).expect("generates");
        assert_eq!(a, b);
    }

    #[test]
    fn ownership_is_exclusive() {
        let procs = generate_snapshot(&SizeTier::Medium.config(3)).expect("generates");
        let mut seen = BTreeSet::new();
        for p in &procs {
            for r in &p.holding {
                assert!(seen.insert(r.clone()), "{r} held twice");
            }
        }
    }

    #[test]
    fn tier_sizes() {
        let procs = generate_snapshot(&SizeTier::Small.config(1)).expect("generates");
        assert_eq!(procs.len(), 50);
        assert!(procs.iter().all(|p| p.holding.len() == 2));
    }

    #[test]
    fn json_parses_back() {
        let procs = generate_snapshot(&SizeTier::Small.config(9)).expect("generates");
        let json = snapshot_json(&procs).expect("serializes");
        let parsed = waitgraph_core::parse_snapshot(&json).expect("parses");
        assert_eq!(parsed, procs);
    }
}
