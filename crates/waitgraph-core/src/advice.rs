/// Resolution advice for detected cycles.
///
/// [`recommend`] turns a cycle list into render-ready [`AdviceLine`]s. Per
/// cycle it picks the cheapest victim (fewest held resources, earliest on
/// the path on ties), names the request a LIFO rollback would release, and
/// states whether that rollback breaks the cycle.
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::detection::Cycle;
use crate::newtypes::{ProcessId, ResourceId};
use crate::resolution::{pending_rollback, rollback_breaks_cycle};
use crate::snapshot::ProcessSnapshot;

const HEADER_MARK: &str = "**";
const DETAIL_MARK: &str = "  • ";

// ---------------------------------------------------------------------------
// AdviceLine
// ---------------------------------------------------------------------------

/// One line of advice, tagged so renderers can style it without parsing.
///
/// JSON form: `{"kind": "header" | "detail", "text": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum AdviceLine {
    /// Section header, one per cycle.
    Header(String),
    /// Indented bullet under the preceding header.
    Detail(String),
}

impl AdviceLine {
    /// The line text without any marker.
    pub fn text(&self) -> &str {
        match self {
            Self::Header(t) | Self::Detail(t) => t,
        }
    }

    /// Returns `true` for header lines.
    pub fn is_header(&self) -> bool {
        matches!(self, Self::Header(_))
    }

    /// Renders the marker form: `**header**` or `  • detail`.
    pub fn marked(&self) -> String {
        match self {
            Self::Header(t) => format!("{HEADER_MARK}{t}{HEADER_MARK}"),
            Self::Detail(t) => format!("{DETAIL_MARK}{t}"),
        }
    }

    /// Parses the marker form produced by [`AdviceLine::marked`].
    ///
    /// Lines with neither marker are treated as details with surrounding
    /// whitespace trimmed.
    pub fn parse_marked(line: &str) -> Self {
        if let Some(inner) = line
            .strip_prefix(HEADER_MARK)
            .and_then(|rest| rest.strip_suffix(HEADER_MARK))
        {
            return Self::Header(inner.to_owned());
        }
        match line.strip_prefix(DETAIL_MARK) {
            Some(inner) => Self::Detail(inner.to_owned()),
            None => Self::Detail(line.trim().to_owned()),
        }
    }
}

impl fmt::Display for AdviceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

// ---------------------------------------------------------------------------
// Prevention strategies
// ---------------------------------------------------------------------------

/// General guidelines for avoiding circular waits, as `(title, description)`.
pub const PREVENTION_STRATEGIES: [(&str, &str); 5] = [
    (
        "Resource Ordering",
        "Acquire resources in one global order in every process, so no two \
         processes can each hold what the other needs next.",
    ),
    (
        "Timeout Mechanism",
        "Bound every acquisition with a timeout; on expiry release everything \
         held and retry later.",
    ),
    (
        "Request All Resources at Once",
        "Request the full set of needed resources up front instead of \
         incrementally, so no process is left partially allocated.",
    ),
    (
        "Avoid Hold and Wait",
        "Release held resources before asking for new ones, removing the \
         hold-and-wait condition a deadlock requires.",
    ),
    (
        "Use Lock Hierarchy",
        "Give each resource a level and only lock in increasing level order, \
         which imposes a total order on acquisitions.",
    ),
];

// ---------------------------------------------------------------------------
// Victim scoring
// ---------------------------------------------------------------------------

/// A process on a cycle, scored as a rollback candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The process.
    pub id: ProcessId,
    /// Number of resources it holds.
    pub cost: usize,
    /// Zero-based index among the cycle's processes, in path order.
    pub position: usize,
}

/// Distinct held resources per process id, merging duplicate records.
fn held_counts(processes: &[ProcessSnapshot]) -> HashMap<&ProcessId, usize> {
    let mut held: HashMap<&ProcessId, BTreeSet<&ResourceId>> = HashMap::new();
    for p in processes {
        held.entry(&p.id).or_default().extend(p.holding.iter());
    }
    held.into_iter().map(|(id, set)| (id, set.len())).collect()
}

/// Cycle processes ordered by (cost, position); the head is the victim.
fn rank(counts: &HashMap<&ProcessId, usize>, cycle: &Cycle) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = cycle
        .processes()
        .into_iter()
        .enumerate()
        .map(|(position, id)| Candidate {
            id: id.clone(),
            cost: counts.get(id).copied().unwrap_or(0),
            position,
        })
        .collect();
    ranked.sort_by_key(|c| (c.cost, c.position));
    ranked
}

/// Scores every process on `cycle` and returns them cheapest first.
///
/// Ordering is by cost, then by position, so the first element is the
/// victim [`recommend`] names.
pub fn rank_candidates(processes: &[ProcessSnapshot], cycle: &Cycle) -> Vec<Candidate> {
    rank(&held_counts(processes), cycle)
}

// ---------------------------------------------------------------------------
// recommend
// ---------------------------------------------------------------------------

/// Produces advice for each cycle, in detection order.
///
/// Cycles are numbered from 1. An empty cycle list yields no lines.
pub fn recommend(processes: &[ProcessSnapshot], cycles: &[Cycle]) -> Vec<AdviceLine> {
    let counts = held_counts(processes);
    let mut lines = Vec::new();

    for (n, cycle) in cycles.iter().enumerate() {
        let ranked = rank(&counts, cycle);
        let Some((victim, others)) = ranked.split_first() else {
            continue;
        };

        lines.push(AdviceLine::Header(format!(
            "Cycle {}: {} (victim: {})",
            n + 1,
            cycle,
            victim.id
        )));

        let rollback = pending_rollback(processes, &victim.id);
        match rollback {
            Some((_, request)) => lines.push(AdviceLine::Detail(format!(
                "Roll back {}'s most recent request for {}",
                victim.id, request
            ))),
            None => lines.push(AdviceLine::Detail(format!(
                "{} has no pending request to roll back",
                victim.id
            ))),
        }

        let mut cost_line = format!(
            "Rollback cost: {} holds {} resource(s)",
            victim.id, victim.cost
        );
        if !others.is_empty() {
            let listed: Vec<String> = others
                .iter()
                .map(|c| format!("{} holds {}", c.id, c.cost))
                .collect();
            cost_line.push_str("; other candidates: ");
            cost_line.push_str(&listed.join(", "));
        }
        lines.push(AdviceLine::Detail(cost_line));

        if let Some((record, request)) = rollback {
            if rollback_breaks_cycle(processes, record, cycle) {
                lines.push(AdviceLine::Detail(format!(
                    "Releasing the request for {request} removes {}'s wait inside this cycle and breaks it",
                    victim.id
                )));
            } else {
                lines.push(AdviceLine::Detail(format!(
                    "The request for {request} is not {}'s wait inside this cycle; further rollbacks of {} are needed to break it",
                    victim.id, victim.id
                )));
            }
        }

        if cycles.len() > 1 {
            lines.push(AdviceLine::Detail(
                "Other cycles may persist: re-run detection after this rollback".to_owned(),
            ));
        }
    }

    tracing::debug!(cycles = cycles.len(), lines = lines.len(), "advice generated");
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::detection::detect;
    use crate::test_helpers::{pid, proc};

    fn advise(procs: &[ProcessSnapshot]) -> Vec<AdviceLine> {
        let result = detect(procs);
        recommend(procs, result.cycles())
    }

    #[test]
    fn no_cycles_no_advice() {
        assert!(recommend(&[], &[]).is_empty());
        let safe = vec![proc("P1", &["R1"], &["R2"]), proc("P2", &["R2"], &[])];
        assert!(advise(&safe).is_empty());
    }

    #[test]
    fn mutual_wait_ties_go_to_first_on_path() {
        let procs = vec![proc("P1", &["R1"], &["R2"]), proc("P2", &["R2"], &["R1"])];
        let lines = advise(&procs);
        assert_eq!(
            lines[0],
            AdviceLine::Header("Cycle 1: P1 → R2 → P2 → R1 → P1 (victim: P1)".to_owned())
        );
        assert_eq!(
            lines[1].text(),
            "Roll back P1's most recent request for R2"
        );
        assert!(lines[2].text().contains("P2 holds 1"));
        assert!(lines[3].text().contains("breaks it"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn cheapest_process_is_chosen() {
        let procs = vec![
            proc("P1", &["R1", "R8", "R9"], &["R2"]),
            proc("P2", &["R2"], &["R1"]),
        ];
        let lines = advise(&procs);
        assert!(lines[0].text().ends_with("(victim: P2)"), "{}", lines[0]);
        assert!(lines[2].text().starts_with("Rollback cost: P2 holds 1"));
        assert!(lines[2].text().contains("P1 holds 3"));
    }

    #[test]
    fn stale_last_request_needs_further_rollbacks() {
        let procs = vec![
            proc("P1", &["R1"], &["R2", "R9"]),
            proc("P2", &["R2", "R7"], &["R1"]),
        ];
        let lines = advise(&procs);
        assert!(lines[0].text().ends_with("(victim: P1)"));
        assert!(lines[1].text().ends_with("for R9"));
        assert!(lines[3].text().contains("further rollbacks of P1"));
    }

    #[test]
    fn multiple_cycles_carry_rerun_reminder() {
        let procs = vec![
            proc("P1", &["R1"], &["R2"]),
            proc("P2", &["R2"], &["R1"]),
            proc("P3", &["R3"], &["R4"]),
            proc("P4", &["R4"], &["R3"]),
        ];
        let lines = advise(&procs);
        let headers: Vec<&AdviceLine> = lines.iter().filter(|l| l.is_header()).collect();
        assert_eq!(headers.len(), 2);
        assert!(headers[1].text().starts_with("Cycle 2:"));
        let reminders = lines
            .iter()
            .filter(|l| l.text().contains("re-run detection"))
            .count();
        assert_eq!(reminders, 2);
    }

    #[test]
    fn rank_candidates_orders_by_cost_then_position() {
        let procs = vec![
            proc("P1", &["R1", "R4"], &["R2"]),
            proc("P2", &["R2"], &["R3"]),
            proc("P3", &["R3"], &["R1"]),
        ];
        let result = detect(&procs);
        let ranked = rank_candidates(&procs, &result.cycles()[0]);
        let ids: Vec<&ProcessId> = ranked.iter().map(|c| &c.id).collect();
        assert_eq!(ids, vec![&pid("P2"), &pid("P3"), &pid("P1")]);
        assert_eq!(ranked[2].cost, 2);
    }

    #[test]
    fn recommend_names_the_head_of_the_ranking() {
        let procs = vec![
            proc("P1", &["R1", "R4"], &["R2"]),
            proc("P2", &["R2", "R5"], &["R3"]),
            proc("P3", &["R3"], &["R1"]),
            proc("P4", &["R6"], &["R7"]),
        ];
        let result = detect(&procs);
        let ranked = rank_candidates(&procs, &result.cycles()[0]);
        let lines = recommend(&procs, result.cycles());
        let header = lines[0].text();
        assert!(
            header.ends_with(&format!("(victim: {})", ranked[0].id)),
            "header: {header}"
        );
        assert_eq!(ranked[0].id, pid("P3"));
    }

    #[test]
    fn marked_form_round_trips() {
        let header = AdviceLine::Header("Cycle 1".to_owned());
        let detail = AdviceLine::Detail("do this".to_owned());
        assert_eq!(header.marked(), "**Cycle 1**");
        assert_eq!(detail.marked(), "  • do this");
        assert_eq!(AdviceLine::parse_marked(&header.marked()), header);
        assert_eq!(AdviceLine::parse_marked(&detail.marked()), detail);
        assert_eq!(
            AdviceLine::parse_marked("  plain  "),
            AdviceLine::Detail("plain".to_owned())
        );
    }

    #[test]
    fn json_form_is_kind_and_text() {
        let json = serde_json::to_value(AdviceLine::Header("h".to_owned())).expect("serialize");
        assert_eq!(json, serde_json::json!({"kind": "header", "text": "h"}));
        let back: AdviceLine =
            serde_json::from_value(serde_json::json!({"kind": "detail", "text": "d"}))
                .expect("deserialize");
        assert_eq!(back, AdviceLine::Detail("d".to_owned()));
    }

    #[test]
    fn five_prevention_strategies() {
        assert_eq!(PREVENTION_STRATEGIES.len(), 5);
        assert_eq!(PREVENTION_STRATEGIES[0].0, "Resource Ordering");
        assert_eq!(PREVENTION_STRATEGIES[4].0, "Use Lock Hierarchy");
    }
}
