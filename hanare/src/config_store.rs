use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::EngineConfiguration;

pub const CONFIG_ENV: &str = "HANARE_CONFIG";

/// Source of the engine configuration, read at startup and on reload.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<EngineConfiguration>;
    fn path(&self) -> &Path;
}

/// JSON file store. A missing file means default settings.
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HANARE_CONFIG` if set, otherwise the first existing candidate from
    /// [`config_paths`], otherwise `~/.config/hanare/config.json`.
    pub fn discover() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::new(path);
        }
        let candidates = config_paths();
        let path = candidates
            .iter()
            .find(|p| p.exists())
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_else(|| PathBuf::from("hanare.json"));
        Self::new(path)
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> Result<EngineConfiguration> {
        if !self.path.exists() {
            tracing::info!("No config at {:?}, using defaults", self.path);
            return Ok(EngineConfiguration::default());
        }
        load_from(&self.path)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Candidate locations, most specific first:
/// `$XDG_CONFIG_HOME/hanare`, `~/.config/hanare`, then the platform config
/// dir (`~/Library/Application Support/hanare` on macOS).
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut push = |path: PathBuf| {
        if !paths.contains(&path) {
            paths.push(path);
        }
    };

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        push(PathBuf::from(xdg).join("hanare").join("config.json"));
    }
    if let Some(home) = dirs::home_dir() {
        push(home.join(".config").join("hanare").join("config.json"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        push(config_dir.join("hanare").join("config.json"));
    }
    paths
}

/// Parse and validate one configuration file.
pub fn load_from(path: &Path) -> Result<EngineConfiguration> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let config: EngineConfiguration =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {:?}", path))?;
    tracing::debug!("Loaded configuration from {:?}", path);
    Ok(config)
}
