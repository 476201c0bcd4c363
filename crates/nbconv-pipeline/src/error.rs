use thiserror::Error;

/// Errors raised by cell transforms.
#[derive(Debug, Error)]
pub enum TransformError {
  #[error("Failed to decode '{kind}' payload in cell {index}: {source}")]
  Decode {
    kind:   String,
    index:  usize,
    #[source]
    source: base64::DecodeError,
  },

  #[error("Payload for '{kind}' in cell {index} is not text")]
  NonTextPayload { kind: String, index: usize },

  #[error(
    "Unknown transform '{0}'. Available transforms: coalesce_streams"
  )]
  UnknownTransform(String),

  #[error("Transform '{name}' failed: {message}")]
  Failed { name: String, message: String },
}
