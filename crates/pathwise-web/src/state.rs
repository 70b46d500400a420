//! Application state for the web server.
//!
//! Tracker calls do blocking file I/O, so they run on the blocking pool.
//! Renders of the same subject are serialized because they share an output
//! image path.

use crate::config::Config;
use crate::error::ApiError;
use crate::layout::{GraphvizLayout, LayoutEngine};
use pathwise_core::prelude::{DotStyle, Snapshot, SubjectCatalog, Tracker};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};

/// Rendered graph for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// URL of the image, with a cache-busting version.
    pub graph_file: String,
    /// HTML `<map>` element; empty when layout failed.
    pub image_map: String,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    tracker: Arc<Tracker>,
    layout: Arc<dyn LayoutEngine>,
    static_dir: PathBuf,
    dot_style: Arc<DotStyle>,
    render_locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AppState {
    /// Build state from config, laying out with Graphviz.
    pub fn new(config: &Config) -> Self {
        let tracker = Tracker::new(SubjectCatalog::new(&config.storage.subjects_dir));
        let dot_style = DotStyle {
            rankdir: config.layout.rankdir.clone(),
            fontsize: config.layout.fontsize,
            ..DotStyle::default()
        };
        Self::with_layout(
            tracker,
            Arc::new(GraphvizLayout::new(&config.layout.dot_binary)),
            &config.storage.static_dir,
            dot_style,
        )
    }

    pub fn with_layout(
        tracker: Tracker,
        layout: Arc<dyn LayoutEngine>,
        static_dir: &Path,
        dot_style: DotStyle,
    ) -> Self {
        Self {
            tracker: Arc::new(tracker),
            layout,
            static_dir: static_dir.to_path_buf(),
            dot_style: Arc::new(dot_style),
            render_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Name of the `<map>` element the layout tool emits.
    pub fn map_name(&self) -> &str {
        &self.dot_style.name
    }

    pub async fn subjects(&self) -> Result<Vec<String>, ApiError> {
        let tracker = self.tracker.clone();
        blocking(move || tracker.subjects()).await
    }

    pub async fn snapshot(&self, subject: &str) -> Result<Snapshot, ApiError> {
        let tracker = self.tracker.clone();
        let subject = subject.to_string();
        blocking(move || tracker.snapshot(&subject)).await
    }

    pub async fn toggle(
        &self,
        subject: &str,
        topic: &str,
        completed: bool,
    ) -> Result<Snapshot, ApiError> {
        let tracker = self.tracker.clone();
        let subject = subject.to_string();
        let topic = topic.to_string();
        blocking(move || tracker.toggle(&subject, &topic, completed)).await
    }

    /// Lay out a snapshot into `<static>/<subject>_graph.png`.
    ///
    /// Layout failures are logged and yield an empty image map so the page
    /// still loads.
    pub async fn render(&self, snapshot: &Snapshot) -> Rendered {
        let file_name = format!("{}_graph.png", snapshot.subject);
        let image_path = self.static_dir.join(&file_name);
        let dot = snapshot.dot(&self.dot_style);

        let lock = self.render_lock(&snapshot.subject);
        let _guard = lock.lock().await;

        let image_map = match self.layout.render(&dot, &image_path).await {
            Ok(map) => {
                info!(subject = %snapshot.subject, path = %image_path.display(), "generated graph");
                map
            }
            Err(e) => {
                error!(subject = %snapshot.subject, error = %e, "graph layout failed");
                String::new()
            }
        };

        let version = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Rendered {
            graph_file: format!("/static/{}?v={}", file_name, version),
            image_map,
        }
    }

    fn render_lock(&self, subject: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .render_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(subject.to_string()).or_default().clone()
    }
}

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> pathwise_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("tracker task failed: {}", e)))?
        .map_err(ApiError::from)
}
