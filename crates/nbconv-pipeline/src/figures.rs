use std::collections::BTreeMap;

use log::trace;

/// Extracted payloads keyed by generated filename.
pub type ResourceMap = BTreeMap<String, FigureData>;

/// An extracted output payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FigureData {
  /// Decoded binary content (`png`, `jpeg`, `pdf`, ...).
  Binary(Vec<u8>),
  /// Text content kept as-is (`svg`, `html`, `latex`).
  Text(String),
}

impl FigureData {
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    match self {
      Self::Binary(bytes) => bytes,
      Self::Text(text) => text.as_bytes(),
    }
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.as_bytes().len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.as_bytes().is_empty()
  }
}

/// Generated filename for the `counter`-th figure of a given kind.
///
/// The counter is padded to two digits and widens past 99, so names stay
/// unique for any number of figures.
#[must_use]
pub fn figure_name(counter: usize, kind: &str) -> String {
  format!("_fig_{counter:02}.{kind}")
}

/// Per-conversion store of extracted payloads.
///
/// The figure counter lives here so that numbering runs across the whole
/// notebook rather than restarting per cell or worksheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FigureStore {
  resources: ResourceMap,
  counter:   usize,
}

impl FigureStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Store a figure under a freshly generated name and return that name.
  pub fn add_figure(&mut self, kind: &str, data: FigureData) -> String {
    let mut name = figure_name(self.counter, kind);
    self.counter += 1;
    while self.resources.contains_key(&name) {
      name = figure_name(self.counter, kind);
      self.counter += 1;
    }
    trace!("Extracted {name} ({} bytes)", data.len());
    self.resources.insert(name.clone(), data);
    name
  }

  /// Store a resource under an explicit name.
  pub fn insert(
    &mut self,
    name: impl Into<String>,
    data: FigureData,
  ) -> Option<FigureData> {
    self.resources.insert(name.into(), data)
  }

  #[must_use]
  pub fn get(&self, name: &str) -> Option<&FigureData> {
    self.resources.get(name)
  }

  #[must_use]
  pub fn contains(&self, name: &str) -> bool {
    self.resources.contains_key(name)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.resources.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.resources.is_empty()
  }

  /// Number of figure names generated so far.
  #[must_use]
  pub const fn counter(&self) -> usize {
    self.counter
  }

  #[must_use]
  pub const fn resources(&self) -> &ResourceMap {
    &self.resources
  }

  #[must_use]
  pub fn into_resources(self) -> ResourceMap {
    self.resources
  }
}
