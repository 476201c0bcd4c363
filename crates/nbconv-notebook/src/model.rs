//! Notebook document types.
//!
//! The tree mirrors the worksheet-based notebook layout. Every node keeps the
//! fields it does not model explicitly in an `extra` map so that nothing is
//! lost between reading and rendering, and so that preprocessing passes can
//! attach derived fields that templates read back.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Output kinds whose payload may be stored on disk as a list of lines.
pub const MULTILINE_KINDS: &[&str] = &[
  "text",
  "html",
  "latex",
  "svg",
  "png",
  "jpeg",
  "jpg",
  "pdf",
  "javascript",
  "json",
];

/// A complete notebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
  #[serde(default)]
  pub metadata: Map<String, Value>,

  /// Major format version the document was read from.
  pub nbformat: u64,

  #[serde(default)]
  pub nbformat_minor: u64,

  #[serde(default)]
  pub worksheets: Vec<Worksheet>,
}

impl Notebook {
  /// Create an empty notebook of the given worksheets.
  #[must_use]
  pub fn new(worksheets: Vec<Worksheet>) -> Self {
    Self {
      metadata: Map::new(),
      nbformat: 3,
      nbformat_minor: 0,
      worksheets,
    }
  }

  /// Notebook name from the metadata, if any.
  #[must_use]
  pub fn name(&self) -> Option<&str> {
    self.metadata.get("name").and_then(Value::as_str)
  }

  /// Total number of cells across all worksheets.
  #[must_use]
  pub fn cell_count(&self) -> usize {
    self.worksheets.iter().map(|ws| ws.cells.len()).sum()
  }

  /// Iterate over every cell in document order.
  pub fn cells(&self) -> impl Iterator<Item = &Cell> {
    self.worksheets.iter().flat_map(|ws| ws.cells.iter())
  }
}

/// An ordered group of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
  #[serde(default)]
  pub cells: Vec<Cell>,

  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub metadata: Map<String, Value>,
}

impl Worksheet {
  #[must_use]
  pub fn new(cells: Vec<Cell>) -> Self {
    Self {
      cells,
      metadata: Map::new(),
    }
  }
}

/// One unit of notebook content, tagged by `cell_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
  Code(CodeCell),
  Markdown(TextCell),
  Heading(HeadingCell),
  Raw(TextCell),
}

/// A code cell with its input and outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeCell {
  #[serde(default, deserialize_with = "multiline")]
  pub input: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub language: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub prompt_number: Option<u64>,

  #[serde(default)]
  pub outputs: Vec<Output>,

  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// A markdown or raw cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextCell {
  #[serde(default, deserialize_with = "multiline")]
  pub source: String,

  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// A heading cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingCell {
  #[serde(default, deserialize_with = "multiline")]
  pub source: String,

  #[serde(default = "default_heading_level")]
  pub level: u8,

  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

const fn default_heading_level() -> u8 {
  1
}

impl Cell {
  /// Build a code cell from its input and outputs.
  #[must_use]
  pub fn code(input: impl Into<String>, outputs: Vec<Output>) -> Self {
    Self::Code(CodeCell {
      input: input.into(),
      outputs,
      ..Default::default()
    })
  }

  #[must_use]
  pub fn markdown(source: impl Into<String>) -> Self {
    Self::Markdown(TextCell {
      source: source.into(),
      extra:  Map::new(),
    })
  }

  #[must_use]
  pub fn heading(source: impl Into<String>, level: u8) -> Self {
    Self::Heading(HeadingCell {
      source: source.into(),
      level,
      extra: Map::new(),
    })
  }

  #[must_use]
  pub fn raw(source: impl Into<String>) -> Self {
    Self::Raw(TextCell {
      source: source.into(),
      extra:  Map::new(),
    })
  }

  /// The `cell_type` tag of this cell.
  #[must_use]
  pub const fn cell_type(&self) -> &'static str {
    match self {
      Self::Code(_) => "code",
      Self::Markdown(_) => "markdown",
      Self::Heading(_) => "heading",
      Self::Raw(_) => "raw",
    }
  }

  /// The cell's text: input for code cells, source otherwise.
  #[must_use]
  pub fn source(&self) -> &str {
    match self {
      Self::Code(code) => &code.input,
      Self::Markdown(text) | Self::Raw(text) => &text.source,
      Self::Heading(heading) => &heading.source,
    }
  }

  /// Outputs of a code cell; empty for every other cell type.
  #[must_use]
  pub fn outputs(&self) -> &[Output] {
    match self {
      Self::Code(code) => &code.outputs,
      _ => &[],
    }
  }

  /// Mutable outputs of a code cell.
  pub const fn outputs_mut(&mut self) -> Option<&mut Vec<Output>> {
    match self {
      Self::Code(code) => Some(&mut code.outputs),
      _ => None,
    }
  }

  /// Fields not modelled explicitly, including derived annotations.
  #[must_use]
  pub const fn extra(&self) -> &Map<String, Value> {
    match self {
      Self::Code(code) => &code.extra,
      Self::Markdown(text) | Self::Raw(text) => &text.extra,
      Self::Heading(heading) => &heading.extra,
    }
  }

  pub const fn extra_mut(&mut self) -> &mut Map<String, Value> {
    match self {
      Self::Code(code) => &mut code.extra,
      Self::Markdown(text) | Self::Raw(text) => &mut text.extra,
      Self::Heading(heading) => &mut heading.extra,
    }
  }

  /// Attach a derived field that templates can read.
  pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<Value>) {
    self.extra_mut().insert(key.into(), value.into());
  }

  #[must_use]
  pub fn annotation(&self, key: &str) -> Option<&Value> {
    self.extra().get(key)
  }
}

/// Kind of an output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
  /// The value of the last expression of the cell.
  Pyout,
  DisplayData,
  Stream,
  Pyerr,
}

/// One output of a code cell.
///
/// Representation payloads live next to bookkeeping fields such as
/// `prompt_number` or `stream`, keyed by output kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOutput")]
pub struct Output {
  pub output_type: OutputType,

  #[serde(flatten)]
  pub data: Map<String, Value>,
}

impl Output {
  #[must_use]
  pub fn new(output_type: OutputType) -> Self {
    Self {
      output_type,
      data: Map::new(),
    }
  }

  /// Builder-style insert of a representation.
  #[must_use]
  pub fn with(mut self, kind: &str, value: impl Into<Value>) -> Self {
    self.data.insert(kind.to_string(), value.into());
    self
  }

  /// Whether this output is a result value, as opposed to stream, error or
  /// display output.
  #[must_use]
  pub fn is_result(&self) -> bool {
    self.output_type == OutputType::Pyout
  }

  #[must_use]
  pub fn contains(&self, kind: &str) -> bool {
    self.data.contains_key(kind)
  }

  #[must_use]
  pub fn get(&self, kind: &str) -> Option<&Value> {
    self.data.get(kind)
  }

  /// Payload of a kind as text.
  #[must_use]
  pub fn text(&self, kind: &str) -> Option<&str> {
    self.data.get(kind).and_then(Value::as_str)
  }

  pub fn insert(
    &mut self,
    kind: impl Into<String>,
    value: impl Into<Value>,
  ) -> Option<Value> {
    self.data.insert(kind.into(), value.into())
  }

  /// Stream name (`stdout`, `stderr`) of a stream output.
  #[must_use]
  pub fn stream_name(&self) -> Option<&str> {
    if self.output_type == OutputType::Stream {
      self.text("stream")
    } else {
      None
    }
  }
}

#[derive(Deserialize)]
struct RawOutput {
  output_type: OutputType,

  #[serde(flatten)]
  data: Map<String, Value>,
}

impl From<RawOutput> for Output {
  fn from(raw: RawOutput) -> Self {
    let mut data = raw.data;
    for kind in MULTILINE_KINDS {
      if let Some(joined) = data.get(*kind).and_then(join_lines) {
        data.insert((*kind).to_string(), Value::String(joined));
      }
    }
    Self {
      output_type: raw.output_type,
      data,
    }
  }
}

/// Join a list-of-lines payload, or `None` if the value is not one.
pub(crate) fn join_lines(value: &Value) -> Option<String> {
  let lines = value.as_array()?;
  lines
    .iter()
    .map(Value::as_str)
    .collect::<Option<Vec<_>>>()
    .map(|parts| parts.concat())
}

fn multiline<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Lines {
    One(String),
    Many(Vec<String>),
  }

  Ok(match Lines::deserialize(deserializer)? {
    Lines::One(text) => text,
    Lines::Many(lines) => lines.concat(),
  })
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use serde_json::json;

  use super::*;

  #[test]
  fn test_cell_roundtrips_tag_and_extra_fields() {
    let cell: Cell = serde_json::from_value(json!({
      "cell_type": "code",
      "input": ["x = 1\n", "x"],
      "language": "python",
      "collapsed": false,
      "outputs": []
    }))
    .expect("code cell");

    assert_eq!(cell.cell_type(), "code");
    assert_eq!(cell.source(), "x = 1\nx");
    assert_eq!(cell.extra().get("collapsed"), Some(&json!(false)));
    assert!(cell.extra().get("cell_type").is_none());

    let value = serde_json::to_value(&cell).expect("serialize");
    assert_eq!(value["cell_type"], "code");
    assert_eq!(value["collapsed"], false);
  }

  #[test]
  fn test_output_joins_multiline_payloads() {
    let output: Output = serde_json::from_value(json!({
      "output_type": "stream",
      "stream": "stdout",
      "text": ["a\n", "b\n"]
    }))
    .expect("stream output");

    assert_eq!(output.text("text"), Some("a\nb\n"));
    assert_eq!(output.stream_name(), Some("stdout"));
    assert!(!output.is_result());
  }

  #[test]
  fn test_annotations_are_serialized_with_the_cell() {
    let mut cell = Cell::markdown("*hi*");
    cell.annotate("haspyout", false);
    let value = serde_json::to_value(&cell).expect("serialize");
    assert_eq!(value["haspyout"], false);
    assert_eq!(value["source"], "*hi*");
  }
}
