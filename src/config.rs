//! Loader configuration describing directory layout and merge behaviour.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::project::AssetLayout;

/// File name searched for by [`LoaderConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "hrl.config.json";

/// Discoverable configuration for the loader.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
  /// Web root, relative to the directory the configuration was found in.
  pub public_root: String,
  /// Style sheet directory inside the web root.
  pub style_dir: String,
  /// Script directory inside the web root.
  pub script_dir: String,
  /// Cache directory created inside each kind's directory.
  pub cache_dir_name: String,
  /// Fold resolved assets into one cached bundle per kind.
  pub merge: bool,
  /// Compact style sheet bundles when writing them to the cache.
  pub compact_styles: bool,
  /// Extensions probed for style sheets.
  pub style_extensions: Vec<String>,
  /// Extensions probed for scripts.
  pub script_extensions: Vec<String>,
  /// Public URL prefix for style sheet tags.
  pub style_url_prefix: String,
  /// Public URL prefix for script tags.
  pub script_url_prefix: String,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      public_root: "webroot".into(),
      style_dir: "css".into(),
      script_dir: "js".into(),
      cache_dir_name: "c".into(),
      merge: true,
      compact_styles: true,
      style_extensions: vec![".css".into()],
      script_extensions: vec![".js".into()],
      style_url_prefix: "/css/".into(),
      script_url_prefix: "/js/".into(),
    }
  }
}

/// Errors that can occur while loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
  /// Failed to read the configuration file.
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the configuration JSON.
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl LoaderConfig {
  /// Load configuration from `dir`, falling back to defaults when the file is missing or
  /// invalid so rendering can proceed with the conventional layout.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    match Self::from_path(&candidate) {
      Ok(config) => config,
      Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
        Self::default()
      }
      Err(err) => {
        tracing::warn!(target: "hrl", "{err}; using default configuration");
        Self::default()
      }
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Resolve the layout with the web root taken relative to `base_dir`.
  pub fn to_layout(&self, base_dir: &Path) -> AssetLayout {
    AssetLayout {
      public_root: base_dir.join(&self.public_root),
      style_dir: self.style_dir.clone(),
      script_dir: self.script_dir.clone(),
      cache_dir_name: self.cache_dir_name.clone(),
      style_extensions: normalise_extensions(&self.style_extensions, ".css"),
      script_extensions: normalise_extensions(&self.script_extensions, ".js"),
    }
  }
}

/// Ensure every extension starts with a dot and that at least one remains.
fn normalise_extensions(values: &[String], fallback: &str) -> Vec<String> {
  let extensions: Vec<String> = values
    .iter()
    .map(|value| value.trim())
    .filter(|value| !value.is_empty())
    .map(|value| {
      if value.starts_with('.') {
        value.to_string()
      } else {
        format!(".{value}")
      }
    })
    .collect();

  if extensions.is_empty() {
    vec![fallback.to_string()]
  } else {
    extensions
  }
}

impl std::fmt::Display for ConfigError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Io { path, source } => {
        write!(f, "failed to read {}: {}", path.display(), source)
      }
      Self::Parse { path, source } => {
        write!(f, "failed to parse {}: {}", path.display(), source)
      }
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io { source, .. } => Some(source),
      Self::Parse { source, .. } => Some(source),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn discover_falls_back_to_defaults() {
    let temp = tempdir().expect("failed to create temp dir");
    let config = LoaderConfig::discover(temp.path());
    assert_eq!(config, LoaderConfig::default());
  }

  #[test]
  fn partial_file_keeps_remaining_defaults() {
    let temp = tempdir().expect("failed to create temp dir");
    fs::write(
      temp.path().join(DEFAULT_CONFIG_FILE),
      r#"{"public_root": "public", "merge": false, "style_extensions": ["css", ".scss"]}"#,
    )
    .expect("failed to write config");

    let config = LoaderConfig::discover(temp.path());
    assert_eq!(config.public_root, "public");
    assert!(!config.merge);
    assert_eq!(config.cache_dir_name, "c");

    let layout = config.to_layout(temp.path());
    assert_eq!(layout.public_root, temp.path().join("public"));
    assert_eq!(layout.style_extensions, vec![".css".to_string(), ".scss".to_string()]);
    assert_eq!(layout.script_extensions, vec![".js".to_string()]);
  }

  #[test]
  fn from_path_reports_parse_errors() {
    let temp = tempdir().expect("failed to create temp dir");
    let path = temp.path().join(DEFAULT_CONFIG_FILE);
    fs::write(&path, "{ not json").expect("failed to write config");

    let err = LoaderConfig::from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("failed to parse"));
    assert_eq!(LoaderConfig::discover(temp.path()), LoaderConfig::default());
  }

  #[test]
  fn empty_extension_list_keeps_kind_default() {
    assert_eq!(normalise_extensions(&[], ".js"), vec![".js".to_string()]);
  }
}
