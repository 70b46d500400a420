//! Subject catalog: one directory per subject under a common root.
//!
//! ```text
//! subjects/
//!   deep_learning/
//!     graph.txt       prerequisite graph definition
//!     progress.json   completion set
//! ```

use crate::error::{Error, Result};
use crate::progress::JsonFileStore;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// File name of a subject's graph definition.
pub const GRAPH_FILE: &str = "graph.txt";
/// File name of a subject's completion set.
pub const PROGRESS_FILE: &str = "progress.json";

/// Lists and resolves subjects under a root directory.
#[derive(Debug, Clone)]
pub struct SubjectCatalog {
    root: PathBuf,
}

impl SubjectCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all subject directories, sorted.
    pub fn subjects(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|source| Error::Catalog {
            path: self.root.clone(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Paths for a listed subject.
    ///
    /// Only names of existing subject directories resolve, so a name can
    /// never point outside the root.
    pub fn resolve(&self, name: &str) -> Result<SubjectPaths> {
        if name.is_empty() || !self.subjects()?.iter().any(|s| s == name) {
            return Err(Error::unknown_subject(name));
        }
        Ok(SubjectPaths {
            name: name.to_string(),
            dir: self.root.join(name),
        })
    }
}

/// Filesystem locations of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPaths {
    pub name: String,
    pub dir: PathBuf,
}

impl SubjectPaths {
    pub fn graph_path(&self) -> PathBuf {
        self.dir.join(GRAPH_FILE)
    }

    pub fn progress_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.progress_path())
    }
}

/// One lock per subject, created on first use.
///
/// Holding a subject's lock serializes every read-modify-write of its
/// completion set.
#[derive(Debug, Default)]
pub struct SubjectLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SubjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_subject(&self, subject: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(subject.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_directories_sorted() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("physics")).unwrap();
        fs::create_dir(root.path().join("deep_learning")).unwrap();
        fs::write(root.path().join("README.md"), "not a subject").unwrap();

        let catalog = SubjectCatalog::new(root.path());
        assert_eq!(catalog.subjects().unwrap(), vec!["deep_learning", "physics"]);
    }

    #[test]
    fn resolve_rejects_unknown_and_traversal() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("dl")).unwrap();
        let catalog = SubjectCatalog::new(root.path());

        let paths = catalog.resolve("dl").unwrap();
        assert_eq!(paths.graph_path(), root.path().join("dl").join(GRAPH_FILE));
        assert_eq!(paths.progress_path(), root.path().join("dl").join(PROGRESS_FILE));

        for bad in ["chemistry", "", "..", "../dl", "dl/.."] {
            assert!(
                matches!(catalog.resolve(bad), Err(Error::UnknownSubject(_))),
                "{bad:?} should not resolve"
            );
        }
    }

    #[test]
    fn missing_root_is_a_catalog_error() {
        let catalog = SubjectCatalog::new("/definitely/not/here");
        assert!(matches!(catalog.subjects(), Err(Error::Catalog { .. })));
    }

    #[test]
    fn locks_are_shared_per_subject() {
        let locks = SubjectLocks::new();
        let a1 = locks.for_subject("a");
        let a2 = locks.for_subject("a");
        let b = locks.for_subject("b");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }
}
