/// Victim resolution: LIFO rollback of a pending request to break a cycle.
///
/// [`resolve_first_cycle`] is the single-step action: it targets the first
/// reported cycle, picks the first process on that cycle's path that still
/// has a pending request, and returns a new snapshot with that process's most
/// recent request removed. Nothing guarantees that other cycles disappear, so
/// callers re-run detection; [`resolve_until_safe`] does exactly that in a
/// bounded loop.
use serde::Serialize;

use crate::detection::{Cycle, DetectionResult, detect};
use crate::graph::GraphNode;
use crate::newtypes::{ProcessId, ResourceId};
use crate::snapshot::ProcessSnapshot;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of one rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The process whose request was rolled back.
    pub victim: ProcessId,
    /// The request that was removed.
    pub released: ResourceId,
    /// `true` if the removed request was the victim's wait edge inside the
    /// targeted cycle, so that cycle can no longer be reported.
    pub breaks_targeted_cycle: bool,
    /// The snapshot after the rollback. Input order is preserved.
    pub processes: Vec<ProcessSnapshot>,
}

/// One applied rollback inside a [`ResolutionPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionStep {
    /// The process whose request was rolled back.
    pub victim: ProcessId,
    /// The request that was removed.
    pub released: ResourceId,
    /// Whether the rollback broke the cycle it targeted.
    pub breaks_targeted_cycle: bool,
}

/// The result of repeatedly resolving until safe or out of rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionPlan {
    /// Rollbacks in the order they were applied.
    pub steps: Vec<ResolutionStep>,
    /// The snapshot after the last rollback.
    pub processes: Vec<ProcessSnapshot>,
    /// Detection over `processes`.
    pub result: DetectionResult,
}

impl ResolutionPlan {
    /// Returns `true` if the final snapshot has no deadlock.
    pub fn is_safe(&self) -> bool {
        !self.result.has_deadlock()
    }
}

// ---------------------------------------------------------------------------
// Rollback selection
// ---------------------------------------------------------------------------

/// Locates the request a LIFO rollback of `victim` would release.
///
/// Returns the index of the snapshot record that owns the request together
/// with the request itself. When the same id appears in several records, the
/// last record with a pending request owns the most recent one, matching the
/// order in which the graph builder appends wait edges.
pub fn pending_rollback<'a>(
    processes: &'a [ProcessSnapshot],
    victim: &ProcessId,
) -> Option<(usize, &'a ResourceId)> {
    processes
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, p)| &p.id == victim)
        .find_map(|(i, p)| p.last_request().map(|r| (i, r)))
}

/// Whether removing the last request of record `record` removes the victim's
/// outgoing edge inside `cycle`.
///
/// The edge survives when the same resource is still requested elsewhere by
/// the same process id, or when the request never produced an edge (the
/// process already holds the resource).
pub fn rollback_breaks_cycle(processes: &[ProcessSnapshot], record: usize, cycle: &Cycle) -> bool {
    let Some(owner) = processes.get(record) else {
        return false;
    };
    let Some(released) = owner.last_request() else {
        return false;
    };

    let closes_cycle = cycle.successor_of(&GraphNode::Process(owner.id.clone()))
        == Some(&GraphNode::Resource(released.clone()));
    if !closes_cycle {
        return false;
    }

    let still_requested = processes.iter().enumerate().any(|(i, p)| {
        if p.id != owner.id {
            return false;
        }
        let remaining = if i == record {
            &p.requesting[..p.requesting.len().saturating_sub(1)]
        } else {
            &p.requesting[..]
        };
        remaining.contains(released)
    });
    !still_requested
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Rolls back one request to break the first reported cycle.
///
/// Walks the first cycle's processes in path order and picks the first one
/// with a pending request; that process's most recent request is removed.
/// Returns `None` when `result` reports no deadlock or when no process on the
/// cycle has a request to give up.
pub fn resolve_first_cycle(
    processes: &[ProcessSnapshot],
    result: &DetectionResult,
) -> Option<Resolution> {
    let cycle = result.cycles().first()?;

    let (record, victim) = cycle
        .processes()
        .into_iter()
        .find_map(|pid| pending_rollback(processes, pid).map(|(i, _)| (i, pid.clone())))?;

    let breaks_targeted_cycle = rollback_breaks_cycle(processes, record, cycle);

    let mut next = processes.to_vec();
    let released = next.get_mut(record)?.requesting.pop()?;

    tracing::debug!(
        victim = %victim,
        released = %released,
        breaks_targeted_cycle,
        "rolled back most recent request"
    );

    Some(Resolution {
        victim,
        released,
        breaks_targeted_cycle,
        processes: next,
    })
}

/// Repeats detection and [`resolve_first_cycle`] until the snapshot is safe,
/// no further rollback is possible, or `max_rounds` rollbacks were applied.
///
/// Each round removes one pending request, so the loop always finishes within
/// the total number of requests in the input.
pub fn resolve_until_safe(processes: &[ProcessSnapshot], max_rounds: usize) -> ResolutionPlan {
    let mut current = processes.to_vec();
    let mut result = detect(&current);
    let mut steps = Vec::new();

    while result.has_deadlock() && steps.len() < max_rounds {
        let Some(resolution) = resolve_first_cycle(&current, &result) else {
            break;
        };
        steps.push(ResolutionStep {
            victim: resolution.victim,
            released: resolution.released,
            breaks_targeted_cycle: resolution.breaks_targeted_cycle,
        });
        current = resolution.processes;
        result = detect(&current);
    }

    tracing::debug!(
        rounds = steps.len(),
        safe = !result.has_deadlock(),
        "resolution loop finished"
    );

    ResolutionPlan {
        steps,
        processes: current,
        result,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::test_helpers::{pid, proc, rid};

    fn mutual_wait() -> Vec<ProcessSnapshot> {
        vec![proc("P1", &["R1"], &["R2"]), proc("P2", &["R2"], &["R1"])]
    }

    #[test]
    fn safe_result_yields_no_resolution() {
        let procs = vec![proc("P1", &["R1"], &["R2"]), proc("P2", &["R2"], &[])];
        let result = detect(&procs);
        assert!(resolve_first_cycle(&procs, &result).is_none());
    }

    #[test]
    fn mutual_wait_rolls_back_first_process() {
        let procs = mutual_wait();
        let result = detect(&procs);
        let res = resolve_first_cycle(&procs, &result).expect("deadlock has a victim");
        assert_eq!(res.victim, pid("P1"));
        assert_eq!(res.released, rid("R2"));
        assert!(res.breaks_targeted_cycle);
        assert!(res.processes[0].requesting.is_empty());
        assert_eq!(res.processes[1], procs[1]);
        assert!(!detect(&res.processes).has_deadlock());
    }

    #[test]
    fn lifo_removes_only_the_most_recent_request() {
        let procs = vec![
            proc("P1", &["R1"], &["R2", "R9"]),
            proc("P2", &["R2"], &["R1"]),
        ];
        let result = detect(&procs);
        let res = resolve_first_cycle(&procs, &result).expect("victim");
        assert_eq!(res.released, rid("R9"));
        assert_eq!(res.processes[0].requesting, vec![rid("R2")]);
        assert!(!res.breaks_targeted_cycle);
        assert!(detect(&res.processes).has_deadlock());
    }

    #[test]
    fn repeated_request_keeps_the_edge_alive() {
        let procs = vec![
            proc("P1", &["R1"], &["R2", "R2"]),
            proc("P2", &["R2"], &["R1"]),
        ];
        let result = detect(&procs);
        let res = resolve_first_cycle(&procs, &result).expect("victim");
        assert_eq!(res.released, rid("R2"));
        assert!(!res.breaks_targeted_cycle);
    }

    #[test]
    fn input_snapshot_is_untouched() {
        let procs = mutual_wait();
        let before = procs.clone();
        let result = detect(&procs);
        let _res = resolve_first_cycle(&procs, &result);
        assert_eq!(procs, before);
    }

    #[test]
    fn pending_rollback_prefers_last_duplicate_record() {
        let procs = vec![
            proc("P1", &[], &["R1"]),
            proc("P2", &[], &["R3"]),
            proc("P1", &[], &["R2"]),
        ];
        let (idx, r) = pending_rollback(&procs, &pid("P1")).expect("has request");
        assert_eq!(idx, 2);
        assert_eq!(r, &rid("R2"));
        assert!(pending_rollback(&procs, &pid("P9")).is_none());
    }

    #[test]
    fn until_safe_clears_double_deadlock() {
        let procs = vec![
            proc("P1", &["R1"], &["R2"]),
            proc("P2", &["R2"], &["R1"]),
            proc("P3", &["R3"], &["R4"]),
            proc("P4", &["R4"], &["R3"]),
        ];
        let plan = resolve_until_safe(&procs, 10);
        assert!(plan.is_safe());
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].victim, pid("P1"));
        assert_eq!(plan.steps[1].victim, pid("P3"));
    }

    #[test]
    fn until_safe_respects_round_limit() {
        let procs = vec![
            proc("P1", &["R1"], &["R2"]),
            proc("P2", &["R2"], &["R1"]),
            proc("P3", &["R3"], &["R4"]),
            proc("P4", &["R4"], &["R3"]),
        ];
        let plan = resolve_until_safe(&procs, 1);
        assert!(!plan.is_safe());
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.result.cycles().len(), 1);
    }

    #[test]
    fn until_safe_on_safe_input_is_a_no_op() {
        let procs = vec![proc("P1", &["R1"], &[])];
        let plan = resolve_until_safe(&procs, 5);
        assert!(plan.is_safe());
        assert!(plan.steps.is_empty());
        assert_eq!(plan.processes, procs);
    }
}
