//! Reading notebook documents from disk or memory.
//!
//! Format version 3 maps directly onto the worksheet tree. Version 4 keeps
//! its cells at the top level and stores representations in mime bundles;
//! such documents are rewritten into a single worksheet with the v3 field
//! names before deserialization.

use std::{fs, path::Path};

use log::debug;
use serde_json::{Map, Value};

use crate::{error::LoadError, model::Notebook};

/// Read and parse a notebook file.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be read, is not valid JSON, or
/// is not a supported notebook format version.
pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Notebook, LoadError> {
  let path = path.as_ref();
  let content = fs::read_to_string(path).map_err(|source| {
    LoadError::Read {
      path: path.to_path_buf(),
      source,
    }
  })?;
  let notebook = read_str(&content)?;
  debug!(
    "Loaded {} ({} worksheets, {} cells)",
    path.display(),
    notebook.worksheets.len(),
    notebook.cell_count()
  );
  Ok(notebook)
}

/// Parse a notebook from its JSON text.
///
/// # Errors
///
/// Returns [`LoadError`] for malformed JSON or unsupported versions.
pub fn read_str(content: &str) -> Result<Notebook, LoadError> {
  let value: Value = serde_json::from_str(content)?;
  from_value(value)
}

/// Build a notebook from an already-parsed JSON value.
///
/// # Errors
///
/// Returns [`LoadError`] if the value is not a notebook object of a
/// supported version.
pub fn from_value(value: Value) -> Result<Notebook, LoadError> {
  let Value::Object(object) = value else {
    return Err(LoadError::Malformed(
      "top-level value is not an object".to_string(),
    ));
  };

  let version = object
    .get("nbformat")
    .and_then(Value::as_u64)
    .ok_or_else(|| {
      LoadError::Malformed("missing or invalid 'nbformat' field".to_string())
    })?;

  let object = match version {
    3 => object,
    4 => upgrade_cells_to_worksheet(object)?,
    other => return Err(LoadError::UnsupportedVersion(other)),
  };

  Ok(serde_json::from_value(Value::Object(object))?)
}

/// Rewrite a v4 document into the worksheet layout.
fn upgrade_cells_to_worksheet(
  mut object: Map<String, Value>,
) -> Result<Map<String, Value>, LoadError> {
  let cells = match object.remove("cells") {
    Some(Value::Array(cells)) => cells,
    Some(_) => {
      return Err(LoadError::Malformed("'cells' is not a list".to_string()));
    },
    None => Vec::new(),
  };

  let language = object.get("metadata").and_then(kernel_language);

  let cells = cells
    .into_iter()
    .map(|cell| convert_cell(cell, language.as_deref()))
    .collect::<Result<Vec<_>, _>>()?;

  let mut worksheet = Map::new();
  worksheet.insert("cells".to_string(), Value::Array(cells));
  object.insert(
    "worksheets".to_string(),
    Value::Array(vec![Value::Object(worksheet)]),
  );
  Ok(object)
}

fn kernel_language(metadata: &Value) -> Option<String> {
  metadata
    .pointer("/language_info/name")
    .or_else(|| metadata.pointer("/kernelspec/language"))
    .and_then(Value::as_str)
    .map(str::to_string)
}

fn convert_cell(
  cell: Value,
  language: Option<&str>,
) -> Result<Value, LoadError> {
  let Value::Object(mut cell) = cell else {
    return Err(LoadError::Malformed("cell is not an object".to_string()));
  };

  if cell.get("cell_type").and_then(Value::as_str) == Some("code") {
    if let Some(source) = cell.remove("source") {
      cell.insert("input".to_string(), source);
    }
    if let Some(count) = cell.remove("execution_count") {
      cell.insert("prompt_number".to_string(), count);
    }
    if let Some(language) = language {
      cell
        .entry("language")
        .or_insert_with(|| Value::String(language.to_string()));
    }
    let outputs = match cell.remove("outputs") {
      Some(Value::Array(outputs)) => outputs,
      _ => Vec::new(),
    };
    let outputs = outputs
      .into_iter()
      .map(convert_output)
      .collect::<Result<Vec<_>, _>>()?;
    cell.insert("outputs".to_string(), Value::Array(outputs));
  }

  Ok(Value::Object(cell))
}

fn convert_output(output: Value) -> Result<Value, LoadError> {
  let Value::Object(mut output) = output else {
    return Err(LoadError::Malformed("output is not an object".to_string()));
  };

  let output_type = output
    .get("output_type")
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_string();

  match output_type.as_str() {
    "execute_result" => {
      output.insert("output_type".to_string(), "pyout".into());
      if let Some(count) = output.remove("execution_count") {
        output.insert("prompt_number".to_string(), count);
      }
    },
    "error" => {
      output.insert("output_type".to_string(), "pyerr".into());
    },
    "stream" => {
      if let Some(name) = output.remove("name") {
        output.insert("stream".to_string(), name);
      }
    },
    "display_data" => {},
    other => {
      return Err(LoadError::Malformed(format!(
        "unknown output type '{other}'"
      )));
    },
  }

  if let Some(Value::Object(bundle)) = output.remove("data") {
    for (mime, payload) in bundle {
      match mime_to_kind(&mime) {
        Some(kind) => {
          output.insert(kind.to_string(), payload);
        },
        None => debug!("Dropping unsupported output representation {mime}"),
      }
    }
  }

  Ok(Value::Object(output))
}

/// Map a mime type to the output kind used by the worksheet layout.
#[must_use]
pub fn mime_to_kind(mime: &str) -> Option<&'static str> {
  match mime {
    "text/plain" => Some("text"),
    "text/html" => Some("html"),
    "text/latex" => Some("latex"),
    "text/markdown" => Some("markdown"),
    "image/png" => Some("png"),
    "image/jpeg" => Some("jpeg"),
    "image/svg+xml" => Some("svg"),
    "application/pdf" => Some("pdf"),
    "application/javascript" => Some("javascript"),
    "application/json" => Some("json"),
    _ => None,
  }
}
