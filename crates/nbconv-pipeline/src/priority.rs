use nbconv_notebook::Output;
use serde_json::{Map, Value};

/// Output kinds in the order a template should prefer them.
pub const DEFAULT_DISPLAY_PRIORITY: &[&str] =
  &["html", "pdf", "svg", "latex", "png", "jpg", "jpeg", "text"];

/// Ranked list of output kinds used to pick one representation of an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPriority {
  kinds: Vec<String>,
}

impl Default for DisplayPriority {
  fn default() -> Self {
    Self::new(DEFAULT_DISPLAY_PRIORITY.iter().map(ToString::to_string))
  }
}

impl DisplayPriority {
  pub fn new<I, S>(kinds: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      kinds: kinds.into_iter().map(Into::into).collect(),
    }
  }

  #[must_use]
  pub fn kinds(&self) -> &[String] {
    &self.kinds
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.kinds.is_empty()
  }

  /// First kind in priority order for which `has_kind` holds.
  pub fn select_by(&self, has_kind: impl Fn(&str) -> bool) -> Option<&str> {
    self
      .kinds
      .iter()
      .map(String::as_str)
      .find(|kind| has_kind(kind))
  }

  /// The representation of `output` to render, if any is acceptable.
  #[must_use]
  pub fn select(&self, output: &Output) -> Option<&str> {
    self.select_by(|kind| output.contains(kind))
  }

  /// Same as [`Self::select`] over a serialized output.
  #[must_use]
  pub fn select_in(&self, output: &Map<String, Value>) -> Option<&str> {
    self.select_by(|kind| output.contains_key(kind))
  }
}
