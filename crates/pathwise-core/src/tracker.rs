//! Tracker: the per-request load → repair → classify → style sequence.
//!
//! A [`Tracker`] is built once at startup and shared by request handlers. It
//! holds no completion state of its own: every call reloads the subject's
//! completion set under that subject's lock. Parsed graphs are cached and
//! reused until the definition file's modification time changes.

use crate::error::{Error, GraphParseError, Result};
use crate::graph::Graph;
use crate::progress::{self, CompletionSet};
use crate::readiness::{classify, Classification, Tally};
use crate::render::{style, to_dot, DotStyle, RenderHints};
use crate::subject::{SubjectCatalog, SubjectLocks, SubjectPaths};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;
use tracing::{info, warn};

/// Everything needed to render one subject.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub subject: String,
    #[serde(skip)]
    pub graph: Arc<Graph>,
    pub progress: CompletionSet,
    pub states: Classification,
    pub hints: Vec<RenderHints>,
    pub percent: u8,
    pub tally: Tally,
    /// Why stored progress was regenerated during this request, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repaired: Option<String>,
    /// Non-fatal persistence failure during this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Snapshot {
    pub fn build(subject: &str, graph: Arc<Graph>, progress: CompletionSet) -> Self {
        let states = classify(&graph, &progress);
        let hints = style(&graph, &states);
        Self {
            subject: subject.to_string(),
            percent: states.percent(),
            tally: states.tally(),
            graph,
            progress,
            states,
            hints,
            repaired: None,
            warning: None,
        }
    }

    /// DOT document for the layout tool.
    pub fn dot(&self, style: &DotStyle) -> String {
        to_dot(&self.graph, &self.hints, style)
    }
}

#[derive(Debug)]
struct CachedGraph {
    modified: Option<SystemTime>,
    graph: Arc<Graph>,
}

/// Application-level entry point for reading and toggling progress.
#[derive(Debug)]
pub struct Tracker {
    catalog: SubjectCatalog,
    locks: SubjectLocks,
    graphs: Mutex<HashMap<String, CachedGraph>>,
}

impl Tracker {
    pub fn new(catalog: SubjectCatalog) -> Self {
        Self {
            catalog,
            locks: SubjectLocks::new(),
            graphs: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &SubjectCatalog {
        &self.catalog
    }

    pub fn subjects(&self) -> Result<Vec<String>> {
        self.catalog.subjects()
    }

    /// Current state of a subject, repairing its stored progress if needed.
    pub fn snapshot(&self, subject: &str) -> Result<Snapshot> {
        let paths = self.catalog.resolve(subject)?;
        let lock = self.locks.for_subject(subject);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let graph = self.graph(&paths)?;
        let report = progress::load(&paths.store(), &graph);

        let mut snapshot = Snapshot::build(subject, graph, report.completion);
        snapshot.repaired = report.repaired.map(|r| r.to_string());
        snapshot.warning = report.persist_error.map(|e| e.to_string());
        info!(
            subject,
            percent = snapshot.percent,
            done = snapshot.tally.done,
            ready = snapshot.tally.ready,
            blocked = snapshot.tally.blocked,
            "loaded subject"
        );
        Ok(snapshot)
    }

    /// Set one topic's completion flag and persist the whole set.
    ///
    /// The write finishes before this returns. A failed write is reported in
    /// [`Snapshot::warning`] while the snapshot still reflects the change.
    pub fn toggle(&self, subject: &str, topic: &str, completed: bool) -> Result<Snapshot> {
        let paths = self.catalog.resolve(subject)?;
        let lock = self.locks.for_subject(subject);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let graph = self.graph(&paths)?;
        let store = paths.store();
        let report = progress::load(&store, &graph);
        let mut completion = report.completion;

        completion
            .toggle(topic, completed)
            .map_err(|_| Error::unknown_topic(subject, topic))?;

        let persisted = progress::save(&store, &completion);
        match &persisted {
            Ok(()) => info!(subject, topic, completed, "updated topic"),
            Err(e) => warn!(subject, topic, completed, error = %e, "topic updated in memory only"),
        }

        let mut snapshot = Snapshot::build(subject, graph, completion);
        snapshot.repaired = report.repaired.map(|r| r.to_string());
        snapshot.warning = persisted
            .err()
            .or(report.persist_error)
            .map(|e| e.to_string());
        Ok(snapshot)
    }

    /// Parsed graph for a subject, reparsed only when the file changed.
    fn graph(&self, paths: &SubjectPaths) -> Result<Arc<Graph>> {
        let path = paths.graph_path();
        let graph_error = |source| Error::Graph {
            subject: paths.name.clone(),
            source,
        };
        let modified = fs::metadata(&path)
            .map_err(|source| {
                graph_error(GraphParseError::Unreadable {
                    path: path.clone(),
                    source,
                })
            })?
            .modified()
            .ok();

        {
            let cache = self.graphs.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(&paths.name) {
                if modified.is_some() && cached.modified == modified {
                    return Ok(cached.graph.clone());
                }
            }
        }

        let text = fs::read_to_string(&path).map_err(|source| {
            graph_error(GraphParseError::Unreadable {
                path: path.clone(),
                source,
            })
        })?;
        let graph = Arc::new(Graph::parse(&text).map_err(graph_error)?);
        info!(
            subject = %paths.name,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "parsed graph definition"
        );

        self.graphs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                paths.name.clone(),
                CachedGraph {
                    modified,
                    graph: graph.clone(),
                },
            );
        Ok(graph)
    }
}
