//! Error types for Pathwise operations.
//!
//! Graph and persistence failures carry their own types so callers can decide
//! how fatal each one is. Completion-store corruption is not an error value at
//! all: it is repaired on load and reported through [`ProgressCorruption`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Pathwise operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the tracker.
#[derive(Debug, Error)]
pub enum Error {
    /// The subject's graph definition could not be used.
    #[error("graph definition for '{subject}' is unusable: {source}")]
    Graph {
        subject: String,
        #[source]
        source: GraphParseError,
    },

    /// Writing the completion set failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// No subject directory with this name exists.
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    /// The topic is not a node of the subject's graph.
    #[error("unknown topic '{topic}' in subject '{subject}'")]
    UnknownTopic { subject: String, topic: String },

    /// Listing the subjects root failed.
    #[error("cannot read subjects directory {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn unknown_subject(subject: impl Into<String>) -> Self {
        Error::UnknownSubject(subject.into())
    }

    pub fn unknown_topic(subject: impl Into<String>, topic: impl Into<String>) -> Self {
        Error::UnknownTopic {
            subject: subject.into(),
            topic: topic.into(),
        }
    }

    /// True for errors caused by the caller naming something that does not exist.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::UnknownSubject(_) | Error::UnknownTopic { .. })
    }
}

/// Failures turning a graph definition into a [`Graph`](crate::graph::Graph).
#[derive(Debug, Error)]
pub enum GraphParseError {
    /// The definition file could not be read.
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The definition declares no topics.
    #[error("graph definition contains no topics")]
    Empty,
}

/// A failed write of the completion set.
#[derive(Debug, Error)]
#[error("failed to persist progress to {location}: {source}")]
pub struct PersistenceError {
    pub location: String,
    #[source]
    pub source: std::io::Error,
}

impl PersistenceError {
    pub fn new(location: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            location: location.into(),
            source,
        }
    }
}

/// Why a stored completion set was discarded and regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressCorruption {
    /// Nothing was stored yet.
    #[error("no stored progress")]
    Missing,
    /// The stored content could not be read or decoded.
    #[error("stored progress is malformed: {0}")]
    Malformed(String),
    /// The stored keys differ from the graph's node set.
    #[error(
        "stored progress out of sync with graph (missing: [{}], unexpected: [{}])",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    KeyMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}
