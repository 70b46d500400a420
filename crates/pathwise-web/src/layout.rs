//! Graph layout through an external tool.
//!
//! The core hands over a DOT document; the layout engine rasterizes it and
//! returns the client-side image map (`cmapx`) whose areas carry each topic's
//! `id`. The page binds clicks to those ids.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Lays out a DOT document into an image file plus an HTML image map.
#[async_trait]
pub trait LayoutEngine: Send + Sync {
    /// Write the rendered image to `image_path` and return the image map.
    async fn render(&self, dot: &str, image_path: &Path) -> Result<String>;
}

/// Graphviz `dot`, run once per output format.
#[derive(Debug, Clone)]
pub struct GraphvizLayout {
    binary: String,
}

impl GraphvizLayout {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, dot: &str, format: &str) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.binary)
            .arg(format!("-T{}", format))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.binary))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(dot.as_bytes())
                .await
                .context("Failed to send graph to layout tool")?;
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("{} did not finish", self.binary))?;
        if !output.status.success() {
            bail!(
                "{} -T{} exited with {}: {}",
                self.binary,
                format,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }
}

impl Default for GraphvizLayout {
    fn default() -> Self {
        Self::new("dot")
    }
}

#[async_trait]
impl LayoutEngine for GraphvizLayout {
    async fn render(&self, dot: &str, image_path: &Path) -> Result<String> {
        let png = self.run(dot, "png").await?;
        if let Some(parent) = image_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(image_path, &png)
            .await
            .with_context(|| format!("Failed to write {}", image_path.display()))?;
        debug!(path = %image_path.display(), bytes = png.len(), "wrote graph image");

        let map = self.run(dot, "cmapx").await?;
        Ok(String::from_utf8_lossy(&map).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let layout = GraphvizLayout::new("pathwise-no-such-layout-binary");
        let dir = tempfile::tempdir().unwrap();
        let err = layout
            .render("digraph { A }", &dir.path().join("g.png"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
        assert!(!dir.path().join("g.png").exists());
    }
}
