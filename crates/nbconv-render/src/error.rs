use std::{io, path::PathBuf};

use nbconv_notebook::LoadError;
use nbconv_pipeline::TransformError;
use thiserror::Error;

/// Error type for conversions.
#[derive(Debug, Error)]
pub enum ConvertError {
  #[error("Failed to load notebook: {0}")]
  Load(#[from] LoadError),

  #[error("Preprocessing failed: {0}")]
  Transform(#[from] TransformError),

  #[error(
    "Template '{name}' not found (searched: {})",
    .searched.join(", ")
  )]
  TemplateResolution { name: String, searched: Vec<String> },

  #[error("Template error: {0}")]
  Template(#[from] tera::Error),

  #[error("Conversion error: {0}")]
  Conversion(String),

  #[error("Failed to read {path}: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
}
