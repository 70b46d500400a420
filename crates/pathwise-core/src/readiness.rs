//! Readiness classification.
//!
//! Every topic is exactly one of:
//! - **Done**: its completion flag is set.
//! - **Ready**: not done, and every transitive prerequisite is done.
//! - **Blocked**: not done, and some transitive prerequisite is not.
//!
//! Classification is recomputed on every render. Only the ancestor sets are
//! cached, on the [`Graph`] itself.

use crate::graph::Graph;
use crate::progress::CompletionSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Derived three-way state of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Done,
    Ready,
    Blocked,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Done => write!(f, "done"),
            Readiness::Ready => write!(f, "ready"),
            Readiness::Blocked => write!(f, "blocked"),
        }
    }
}

/// Count of topics per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub done: usize,
    pub ready: usize,
    pub blocked: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.done + self.ready + self.blocked
    }
}

/// Readiness of every topic in a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Classification {
    states: BTreeMap<String, Readiness>,
}

impl Classification {
    pub fn get(&self, topic: &str) -> Option<Readiness> {
        self.states.get(topic).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Readiness)> + '_ {
        self.states.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for state in self.states.values() {
            match state {
                Readiness::Done => tally.done += 1,
                Readiness::Ready => tally.ready += 1,
                Readiness::Blocked => tally.blocked += 1,
            }
        }
        tally
    }

    /// Share of done topics, rounded to a whole percent.
    pub fn percent(&self) -> u8 {
        let tally = self.tally();
        progress_percent(tally.done, tally.total())
    }
}

/// `100 * done / total`, rounded to nearest; `0` when `total` is zero.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (100.0 * done as f64 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Classify every node of `graph` against `completion`.
pub fn classify(graph: &Graph, completion: &CompletionSet) -> Classification {
    let states = graph
        .node_indices()
        .map(|idx| {
            let topic = graph.topic_at(idx);
            let state = if completion.is_done(&topic.id) {
                Readiness::Done
            } else if graph
                .ancestor_indices(idx)
                .iter()
                .all(|a| completion.is_done(&graph.topic_at(*a).id))
            {
                Readiness::Ready
            } else {
                Readiness::Blocked
            };
            debug!(topic = %topic.id, state = %state, "classified");
            (topic.id.clone(), state)
        })
        .collect();

    Classification { states }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, bool)]) -> CompletionSet {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn diamond() -> Graph {
        Graph::parse("A -> B; A -> C; B -> D; C -> D;").unwrap()
    }

    #[test]
    fn diamond_with_root_done() {
        let graph = diamond();
        let states = classify(
            &graph,
            &set(&[("A", true), ("B", false), ("C", false), ("D", false)]),
        );
        assert_eq!(states.get("A"), Some(Readiness::Done));
        assert_eq!(states.get("B"), Some(Readiness::Ready));
        assert_eq!(states.get("C"), Some(Readiness::Ready));
        assert_eq!(states.get("D"), Some(Readiness::Blocked));
    }

    #[test]
    fn blocked_by_any_incomplete_ancestor() {
        let graph = diamond();
        let states = classify(
            &graph,
            &set(&[("A", true), ("B", true), ("C", false), ("D", false)]),
        );
        assert_eq!(states.get("D"), Some(Readiness::Blocked));
    }

    #[test]
    fn transitive_ancestors_count() {
        // C's direct prerequisite is done, but its grandparent is not.
        let graph = Graph::parse("A -> B -> C").unwrap();
        let states = classify(&graph, &set(&[("A", false), ("B", true), ("C", false)]));
        assert_eq!(states.get("B"), Some(Readiness::Done));
        assert_eq!(states.get("C"), Some(Readiness::Blocked));
    }

    #[test]
    fn roots_are_ready_and_every_node_has_one_state() {
        let graph = Graph::parse("A; B -> C; D -> C; E").unwrap();
        let states = classify(&graph, &CompletionSet::for_graph(&graph));

        assert_eq!(states.len(), graph.node_count());
        for root in ["A", "B", "D", "E"] {
            assert_eq!(states.get(root), Some(Readiness::Ready), "{root}");
        }
        assert_eq!(states.get("C"), Some(Readiness::Blocked));
        assert_eq!(states.tally().total(), graph.node_count());
    }

    #[test]
    fn completing_last_topic_reaches_full_progress() {
        let graph = diamond();
        let mut completion = set(&[("A", true), ("B", true), ("C", true), ("D", false)]);
        assert_eq!(classify(&graph, &completion).get("D"), Some(Readiness::Ready));

        completion.toggle("D", true).unwrap();
        let states = classify(&graph, &completion);
        assert_eq!(states.get("D"), Some(Readiness::Done));
        assert_eq!(states.percent(), 100);
    }

    #[test]
    fn cycle_members_stay_blocked() {
        let graph = Graph::parse("Root -> A; A -> B; B -> A;").unwrap();
        let states = classify(&graph, &set(&[("Root", true), ("A", false), ("B", false)]));
        assert_eq!(states.get("A"), Some(Readiness::Blocked));
        assert_eq!(states.get("B"), Some(Readiness::Blocked));
    }

    #[test]
    fn percent_rounding() {
        assert_eq!(progress_percent(3, 4), 75);
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(4, 4), 100);
    }

    #[test]
    fn serializes_as_lowercase_map() {
        let graph = Graph::parse("A -> B").unwrap();
        let states = classify(&graph, &CompletionSet::for_graph(&graph));
        let json = serde_json::to_value(&states).unwrap();
        assert_eq!(json, serde_json::json!({"A": "ready", "B": "blocked"}));
    }
}
