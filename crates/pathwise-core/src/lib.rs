//! # Pathwise Core
//!
//! The prerequisite-graph progress engine behind Pathwise.
//!
//! - **graph**: parse a DOT-like definition into topics and prerequisite edges
//! - **progress**: per-topic completion flags, kept in sync with the graph
//! - **readiness**: classify each topic as done, ready, or blocked
//! - **render**: styling hints and DOT output for the layout tool
//! - **subject** / **tracker**: multi-subject storage and the request sequence
//!
//! ## Quick Start
//!
//! ```rust
//! use pathwise_core::prelude::*;
//!
//! let graph = Graph::parse("A -> B; A -> C; B -> D; C -> D;").unwrap();
//! let mut progress = CompletionSet::for_graph(&graph);
//! progress.toggle("A", true).unwrap();
//!
//! let states = classify(&graph, &progress);
//! assert_eq!(states.get("B"), Some(Readiness::Ready));
//! assert_eq!(states.get("D"), Some(Readiness::Blocked));
//! assert_eq!(states.percent(), 25);
//! ```

pub mod error;
pub mod graph;
pub mod progress;
pub mod readiness;
pub mod render;
pub mod subject;
pub mod tracker;
pub mod prelude;

pub use error::{Error, Result};
