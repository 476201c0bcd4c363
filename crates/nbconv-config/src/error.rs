use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while loading, overriding or writing nbconv configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read config file {}: {source}", path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to parse JSON config from {}: {source}", path.display())]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("Failed to parse TOML config from {}: {source}", path.display())]
  Toml {
    path:   PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("Unsupported config file format: {}", .0.display())]
  UnsupportedFile(PathBuf),

  #[error("Config file has no extension: {}", .0.display())]
  MissingExtension(PathBuf),

  /// A file passed explicitly with `--config-file` could not be loaded.
  #[error("Failed to load config from {}: {source}", path.display())]
  Load {
    path:   PathBuf,
    #[source]
    source: Box<Self>,
  },

  /// A `KEY=VALUE` override was malformed, named an unknown key or carried
  /// a value of the wrong type.
  #[error("Invalid config override: {0}")]
  Override(String),

  /// `nbconv init` was asked for a format other than TOML or JSON.
  #[error("Unsupported config format: {0}")]
  UnsupportedFormat(String),

  #[error("Failed to write default config to {}: {source}", path.display())]
  Write {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
}
