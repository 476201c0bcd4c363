//! Cell-level transforms run by the [`Pipeline`](crate::Pipeline).

use base64::{Engine as _, engine::general_purpose::STANDARD};
use nbconv_notebook::{Cell, Output};

use crate::{
  error::TransformError,
  figures::{FigureData, FigureStore},
};

/// Output kinds that [`ExtractFigures`] pulls out of the tree.
pub const FIGURE_KINDS: &[&str] =
  &["html", "pdf", "svg", "latex", "png", "jpg", "jpeg"];

/// Kinds stored as base64 text that must be decoded to bytes.
pub const BINARY_KINDS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

/// Names accepted by [`builtin`].
pub const BUILTIN_TRANSFORMS: &[&str] = &["coalesce_streams"];

/// One unit of preprocessing applied to every cell of a notebook.
///
/// `apply` receives the cell, the figure store threaded through the run, and
/// the index of the cell within its worksheet. Whatever it returns replaces
/// the cell and the store. A transform must not drop or reorder cells; it
/// only sees one cell at a time.
pub trait CellTransform {
  /// Name used in logs and error messages.
  fn name(&self) -> &str;

  /// Transform a single cell.
  ///
  /// # Errors
  ///
  /// Returns [`TransformError`] if the cell cannot be transformed. The
  /// whole conversion fails with it.
  fn apply(
    &mut self,
    cell: Cell,
    figures: FigureStore,
    index: usize,
  ) -> Result<(Cell, FigureStore), TransformError>;
}

/// Marks each cell with its type and whether it produced a result value.
///
/// Sets `type` to the cell type and `haspyout` to `true` when any output is
/// a result value, so templates know up front whether to write an output
/// prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnnotateOutputFlag;

impl CellTransform for AnnotateOutputFlag {
  fn name(&self) -> &str {
    "annotate_output_flag"
  }

  fn apply(
    &mut self,
    mut cell: Cell,
    figures: FigureStore,
    _index: usize,
  ) -> Result<(Cell, FigureStore), TransformError> {
    let has_result = cell.outputs().iter().any(Output::is_result);
    cell.annotate("type", cell.cell_type());
    cell.annotate("haspyout", has_result);
    Ok((cell, figures))
  }
}

/// Moves figure payloads out of outputs and into the figure store.
///
/// Each extracted representation is replaced by its generated filename, and
/// the same filename is recorded under `key_<kind>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractFigures;

impl ExtractFigures {
  fn decode(
    kind: &str,
    payload: &str,
    index: usize,
  ) -> Result<FigureData, TransformError> {
    if !BINARY_KINDS.contains(&kind) {
      return Ok(FigureData::Text(payload.to_string()));
    }

    // Legacy payloads are wrapped at 76 columns.
    let compact: String =
      payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
      .decode(compact)
      .map(FigureData::Binary)
      .map_err(|source| {
        TransformError::Decode {
          kind: kind.to_string(),
          index,
          source,
        }
      })
  }
}

impl CellTransform for ExtractFigures {
  fn name(&self) -> &str {
    "extract_figures"
  }

  fn apply(
    &mut self,
    mut cell: Cell,
    mut figures: FigureStore,
    index: usize,
  ) -> Result<(Cell, FigureStore), TransformError> {
    let Some(outputs) = cell.outputs_mut() else {
      return Ok((cell, figures));
    };

    for output in outputs.iter_mut() {
      for kind in FIGURE_KINDS {
        let Some(payload) = output.get(kind) else {
          continue;
        };
        let payload = payload.as_str().ok_or_else(|| {
          TransformError::NonTextPayload {
            kind: (*kind).to_string(),
            index,
          }
        })?;

        let data = Self::decode(kind, payload, index)?;
        let name = figures.add_figure(kind, data);
        output.insert(*kind, name.clone());
        output.insert(format!("key_{kind}"), name);
      }
    }

    Ok((cell, figures))
  }
}

/// Merges consecutive stream outputs written to the same stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoalesceStreams;

impl CellTransform for CoalesceStreams {
  fn name(&self) -> &str {
    "coalesce_streams"
  }

  fn apply(
    &mut self,
    mut cell: Cell,
    figures: FigureStore,
    _index: usize,
  ) -> Result<(Cell, FigureStore), TransformError> {
    let Some(outputs) = cell.outputs_mut() else {
      return Ok((cell, figures));
    };

    let mut merged: Vec<Output> = Vec::with_capacity(outputs.len());
    for output in outputs.drain(..) {
      if let Some(last) = merged.last_mut()
        && output.stream_name().is_some()
        && last.stream_name() == output.stream_name()
      {
        let text = format!(
          "{}{}",
          last.text("text").unwrap_or_default(),
          output.text("text").unwrap_or_default()
        );
        last.insert("text", text);
        continue;
      }
      merged.push(output);
    }
    *outputs = merged;

    Ok((cell, figures))
  }
}

/// A transform backed by a closure.
pub struct FnTransform<F> {
  name: String,
  func: F,
}

impl<F> CellTransform for FnTransform<F>
where
  F: FnMut(Cell, FigureStore, usize) -> Result<(Cell, FigureStore), TransformError>,
{
  fn name(&self) -> &str {
    &self.name
  }

  fn apply(
    &mut self,
    cell: Cell,
    figures: FigureStore,
    index: usize,
  ) -> Result<(Cell, FigureStore), TransformError> {
    (self.func)(cell, figures, index)
  }
}

/// Wrap a closure as a named [`CellTransform`].
pub fn from_fn<F>(name: impl Into<String>, func: F) -> FnTransform<F>
where
  F: FnMut(Cell, FigureStore, usize) -> Result<(Cell, FigureStore), TransformError>,
{
  FnTransform {
    name: name.into(),
    func,
  }
}

/// Look up an optional built-in transform by name.
///
/// # Errors
///
/// Returns [`TransformError::UnknownTransform`] for names not listed in
/// [`BUILTIN_TRANSFORMS`].
pub fn builtin(name: &str) -> Result<Box<dyn CellTransform>, TransformError> {
  match name {
    "coalesce_streams" => Ok(Box::new(CoalesceStreams)),
    other => Err(TransformError::UnknownTransform(other.to_string())),
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use nbconv_notebook::OutputType;
  use serde_json::json;

  use super::*;

  fn stream(name: &str, text: &str) -> Output {
    Output::new(OutputType::Stream)
      .with("stream", name)
      .with("text", text)
  }

  #[test]
  fn test_annotate_sets_type_and_flag() {
    let cell = Cell::code("1", vec![
      stream("stdout", "x"),
      Output::new(OutputType::Pyout).with("text", "1"),
    ]);
    let (cell, _) = AnnotateOutputFlag
      .apply(cell, FigureStore::new(), 0)
      .expect("annotate");
    assert_eq!(cell.annotation("haspyout"), Some(&json!(true)));
    assert_eq!(cell.annotation("type"), Some(&json!("code")));

    let (cell, _) = AnnotateOutputFlag
      .apply(Cell::markdown("m"), FigureStore::new(), 1)
      .expect("annotate");
    assert_eq!(cell.annotation("haspyout"), Some(&json!(false)));
  }

  #[test]
  fn test_extract_rewrites_outputs_and_stores_payloads() {
    let cell = Cell::code("plot()", vec![
      Output::new(OutputType::DisplayData)
        .with("png", "AAEC")
        .with("svg", "<svg/>")
        .with("text", "<Figure>"),
    ]);
    let (cell, figures) = ExtractFigures
      .apply(cell, FigureStore::new(), 0)
      .expect("extract");

    let output = &cell.outputs()[0];
    assert_eq!(output.text("svg"), Some("_fig_00.svg"));
    assert_eq!(output.text("key_svg"), Some("_fig_00.svg"));
    assert_eq!(output.text("png"), Some("_fig_01.png"));
    assert_eq!(output.text("key_png"), Some("_fig_01.png"));
    assert_eq!(output.text("text"), Some("<Figure>"));

    assert_eq!(
      figures.get("_fig_01.png"),
      Some(&FigureData::Binary(vec![0, 1, 2]))
    );
    assert_eq!(
      figures.get("_fig_00.svg"),
      Some(&FigureData::Text("<svg/>".into()))
    );
  }

  #[test]
  fn test_extract_ignores_wrapped_base64() {
    let cell = Cell::code("", vec![
      Output::new(OutputType::DisplayData).with("png", "AAEC\nAwQF\n"),
    ]);
    let (_, figures) = ExtractFigures
      .apply(cell, FigureStore::new(), 0)
      .expect("extract");
    assert_eq!(
      figures.get("_fig_00.png").map(FigureData::as_bytes),
      Some(&[0_u8, 1, 2, 3, 4, 5][..])
    );
  }

  #[test]
  fn test_extract_reports_invalid_payloads() {
    let cell = Cell::code("", vec![
      Output::new(OutputType::DisplayData).with("png", "not base64!"),
    ]);
    let err = ExtractFigures
      .apply(cell, FigureStore::new(), 4)
      .expect_err("invalid base64");
    assert!(matches!(err, TransformError::Decode { index: 4, .. }));

    let cell = Cell::code("", vec![
      Output::new(OutputType::DisplayData).with("svg", json!({"a": 1})),
    ]);
    let err = ExtractFigures
      .apply(cell, FigureStore::new(), 2)
      .expect_err("non-text payload");
    assert!(matches!(err, TransformError::NonTextPayload { index: 2, .. }));
  }

  #[test]
  fn test_coalesce_merges_adjacent_streams_only() {
    let cell = Cell::code("", vec![
      stream("stdout", "a"),
      stream("stdout", "b"),
      stream("stderr", "c"),
      Output::new(OutputType::Pyout).with("text", "1"),
      stream("stdout", "d"),
    ]);
    let (cell, _) = CoalesceStreams
      .apply(cell, FigureStore::new(), 0)
      .expect("coalesce");

    let texts: Vec<_> = cell
      .outputs()
      .iter()
      .map(|o| o.text("text").unwrap_or_default())
      .collect();
    assert_eq!(texts, ["ab", "c", "1", "d"]);
  }

  #[test]
  fn test_builtin_lookup() {
    assert_eq!(
      builtin("coalesce_streams").expect("known").name(),
      "coalesce_streams"
    );
    assert!(matches!(
      builtin("nope"),
      Err(TransformError::UnknownTransform(name)) if name == "nope"
    ));
  }
}
