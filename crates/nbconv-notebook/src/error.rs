use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while loading a notebook document.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("Failed to read notebook {}: {source}", path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Malformed notebook JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Unsupported notebook format version: {0}")]
  UnsupportedVersion(u64),

  #[error("Malformed notebook: {0}")]
  Malformed(String),
}
