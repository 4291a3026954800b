use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User preferences persisted in `prefs.toml`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  /// Invidious-compatible instance, e.g. `https://yewtu.be`.
  pub instance_url: Option<String>,
  /// Local proxy exposing `/search`, `/video_info` and `/comments`. Takes precedence over
  /// `instance_url` when set.
  pub proxy_url: Option<String>,
  pub locale: Option<String>,
  pub theme_name: Option<String>,
  pub display_mode: Option<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "ivs")
}

pub fn config_path() -> Option<PathBuf> {
  project_dirs().map(|d| d.config_dir().join("prefs.toml"))
}

/// Default location of the log file.
pub fn log_path() -> Option<PathBuf> {
  project_dirs().map(|d| d.data_local_dir().join("ivs.log"))
}

impl Config {
  pub fn load() -> Self {
    if let Some(path) = config_path()
      && let Ok(content) = std::fs::read_to_string(path)
      && let Ok(config) = Self::parse(&content)
    {
      return config;
    }
    Self::default()
  }

  pub fn parse(content: &str) -> Result<Self> {
    toml::from_str(content).context("Failed to parse prefs.toml")
  }

  pub fn save(&self) -> Result<()> {
    let path = config_path().context("No config directory for this platform")?;
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(self).context("Failed to serialize preferences")?;
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
  }
}
