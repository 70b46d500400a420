//! Progress store: per-topic completion flags and their persistence.
//!
//! A [`CompletionSet`] is always kept in lock-step with the graph it
//! describes: [`load`] discards anything whose key set differs from the
//! graph's node set and writes a fresh all-`false` set in its place.

use crate::error::{PersistenceError, ProgressCorruption};
use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{info, warn};

/// Topic id → completed flag. Serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionSet(BTreeMap<String, bool>);

/// A toggle named a topic the set does not track.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown topic '{0}'")]
pub struct UnknownTopic(pub String);

impl CompletionSet {
    /// Every node of `graph`, none completed.
    pub fn for_graph(graph: &Graph) -> Self {
        Self(graph.nodes().map(|id| (id.to_string(), false)).collect())
    }

    pub fn get(&self, topic: &str) -> Option<bool> {
        self.0.get(topic).copied()
    }

    /// Completed flag; untracked topics count as not done.
    pub fn is_done(&self, topic: &str) -> bool {
        self.get(topic).unwrap_or(false)
    }

    /// Set one topic's flag, returning the previous value.
    pub fn toggle(&mut self, topic: &str, completed: bool) -> Result<bool, UnknownTopic> {
        match self.0.get_mut(topic) {
            Some(flag) => Ok(std::mem::replace(flag, completed)),
            None => Err(UnknownTopic(topic.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn done_count(&self) -> usize {
        self.0.values().filter(|done| **done).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Compare the key set against the graph's node set.
    pub fn mismatch(&self, graph: &Graph) -> Option<ProgressCorruption> {
        let missing: Vec<String> = graph
            .nodes()
            .filter(|id| !self.0.contains_key(*id))
            .map(str::to_string)
            .collect();
        let unexpected: Vec<String> = self
            .0
            .keys()
            .filter(|key| !graph.contains(key))
            .cloned()
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            None
        } else {
            Some(ProgressCorruption::KeyMismatch {
                missing,
                unexpected,
            })
        }
    }
}

impl FromIterator<(String, bool)> for CompletionSet {
    fn from_iter<T: IntoIterator<Item = (String, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Backing resource for one subject's completion set.
///
/// Reads and writes are wholesale; there are no partial updates.
pub trait ProgressStore {
    /// Human-readable location, used in logs and errors.
    fn location(&self) -> String;

    /// Stored contents, or `None` when nothing has been stored yet.
    fn read(&self) -> io::Result<Option<String>>;

    /// Replace the stored contents.
    fn write(&self, contents: &str) -> io::Result<()>;
}

/// One JSON file per subject, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ProgressStore for JsonFileStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Readers see either the old file or the new one, never a prefix.
        let staging = self.staging_path();
        {
            let mut file = File::create(&staging)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&staging, &self.path).inspect_err(|_| {
            let _ = fs::remove_file(&staging);
        })
    }
}

/// In-memory store, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: Mutex<Option<String>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            ..Self::default()
        }
    }

    /// Current stored text.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail with a permission error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ProgressStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "writes disabled",
            ));
        }
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Outcome of [`load`].
#[derive(Debug)]
pub struct LoadReport {
    pub completion: CompletionSet,
    /// Set when the stored data was discarded and regenerated.
    pub repaired: Option<ProgressCorruption>,
    /// Set when the regenerated set could not be written back.
    pub persist_error: Option<PersistenceError>,
}

/// Load the completion set for `graph`, regenerating it when needed.
///
/// Absent, unreadable, malformed, or out-of-sync data is replaced by an
/// all-`false` set, which is persisted before returning. A failed write
/// does not fail the load.
pub fn load<S: ProgressStore + ?Sized>(store: &S, graph: &Graph) -> LoadReport {
    let reason = match store.read() {
        Ok(Some(text)) => match serde_json::from_str::<CompletionSet>(&text) {
            Ok(set) => match set.mismatch(graph) {
                None => {
                    return LoadReport {
                        completion: set,
                        repaired: None,
                        persist_error: None,
                    }
                }
                Some(reason) => reason,
            },
            Err(e) => ProgressCorruption::Malformed(e.to_string()),
        },
        Ok(None) => ProgressCorruption::Missing,
        Err(e) => ProgressCorruption::Malformed(e.to_string()),
    };

    let location = store.location();
    match &reason {
        ProgressCorruption::Missing => {
            info!(store = %location, "no stored progress, creating defaults")
        }
        other => warn!(store = %location, reason = %other, "regenerating progress"),
    }

    let completion = CompletionSet::for_graph(graph);
    let persist_error = save(store, &completion).err();
    if let Some(err) = &persist_error {
        warn!(error = %err, "regenerated progress was not persisted");
    }

    LoadReport {
        completion,
        repaired: Some(reason),
        persist_error,
    }
}

/// Persist the whole set.
pub fn save<S: ProgressStore + ?Sized>(
    store: &S,
    completion: &CompletionSet,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(completion)
        .map_err(|e| PersistenceError::new(store.location(), io::Error::new(io::ErrorKind::InvalidData, e)))?;
    store
        .write(&json)
        .map_err(|e| PersistenceError::new(store.location(), e))
}
