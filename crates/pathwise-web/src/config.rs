//! Configuration for the Pathwise web server.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name searched for in the current and parent directories.
pub const CONFIG_FILE: &str = "pathwise.toml";

/// Server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per subject.
    #[serde(default = "default_subjects_dir")]
    pub subjects_dir: PathBuf,
    /// Directory rendered images are written to and served from.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Graphviz `dot` executable.
    #[serde(default = "default_dot_binary")]
    pub dot_binary: String,
    #[serde(default = "default_rankdir")]
    pub rankdir: String,
    #[serde(default = "default_fontsize")]
    pub fontsize: u32,
}

// Default value functions
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 9696 }
fn default_subjects_dir() -> PathBuf { PathBuf::from("subjects") }
fn default_static_dir() -> PathBuf { PathBuf::from("static") }
fn default_dot_binary() -> String { "dot".to_string() }
fn default_rankdir() -> String { "TB".to_string() }
fn default_fontsize() -> u32 { 10 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            subjects_dir: default_subjects_dir(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            dot_binary: default_dot_binary(),
            rankdir: default_rankdir(),
            fontsize: default_fontsize(),
        }
    }
}

impl Config {
    /// Load config from an explicit path, or from `pathwise.toml` in the
    /// current or parent directories, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Self::from_file(path)
            }
            None => match find_config_file() {
                Some(path) => Self::from_file(&path),
                None => Ok(Config::default()),
            },
        }
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Find pathwise.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
