//! Convenience re-exports for common Pathwise types.

pub use crate::error::{Error, GraphParseError, PersistenceError, ProgressCorruption, Result};
pub use crate::graph::{Graph, Topic};
pub use crate::progress::{CompletionSet, JsonFileStore, LoadReport, MemoryStore, ProgressStore};
pub use crate::readiness::{classify, progress_percent, Classification, Readiness, Tally};
pub use crate::render::{style, to_dot, DotStyle, FillColor, RenderHints};
pub use crate::subject::{SubjectCatalog, SubjectPaths};
pub use crate::tracker::{Snapshot, Tracker};
