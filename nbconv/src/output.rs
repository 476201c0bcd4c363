use std::{
  fs,
  io::{self, Write},
  path::{Path, PathBuf},
};

use color_eyre::eyre::{Context, Result};
use log::{debug, info};
use nbconv_pipeline::ResourceMap;

/// Write the converted document to `output`, or to stdout without one.
///
/// # Errors
///
/// Returns an error if the file or its parent directory cannot be created,
/// or if writing fails.
pub fn write_document(text: &str, output: Option<&Path>) -> Result<()> {
  let Some(path) = output else {
    let mut stdout = io::stdout().lock();
    stdout
      .write_all(text.as_bytes())
      .and_then(|()| stdout.flush())
      .wrap_err("Failed to write to stdout")?;
    return Ok(());
  };

  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create directory: {}", parent.display())
    })?;
  }
  fs::write(path, text)
    .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
  info!("Wrote {}", path.display());
  Ok(())
}

/// Write every extracted resource into `dir` under its generated name.
///
/// Returns the written paths in name order. Nothing is created when there
/// are no resources.
///
/// # Errors
///
/// Returns an error if the directory or a resource file cannot be written.
pub fn write_resources(
  resources: &ResourceMap,
  dir: &Path,
) -> Result<Vec<PathBuf>> {
  if resources.is_empty() {
    return Ok(Vec::new());
  }

  fs::create_dir_all(dir).wrap_err_with(|| {
    format!("Failed to create resource directory: {}", dir.display())
  })?;

  let mut written = Vec::with_capacity(resources.len());
  for (name, data) in resources {
    let path = dir.join(name);
    fs::write(&path, data.as_bytes())
      .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote resource {} ({} bytes)", path.display(), data.len());
    written.push(path);
  }

  info!("Wrote {} resources to {}", written.len(), dir.display());
  Ok(written)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use nbconv_pipeline::FigureData;
  use tempfile::tempdir;

  use super::*;

  #[test]
  fn test_write_resources_by_name() {
    let dir = tempdir().expect("tempdir");
    let target = dir.path().join("figs");

    let mut resources = ResourceMap::new();
    resources.insert("_fig_01.svg".into(), FigureData::Text("<svg/>".into()));
    resources.insert("_fig_00.png".into(), FigureData::Binary(vec![0, 159]));

    let written = write_resources(&resources, &target).expect("write");
    assert_eq!(written, [
      target.join("_fig_00.png"),
      target.join("_fig_01.svg")
    ]);
    assert_eq!(fs::read(&written[0]).expect("read"), [0, 159]);
    assert_eq!(fs::read_to_string(&written[1]).expect("read"), "<svg/>");
  }

  #[test]
  fn test_no_resources_creates_nothing() {
    let dir = tempdir().expect("tempdir");
    let target = dir.path().join("unused");
    let written =
      write_resources(&ResourceMap::new(), &target).expect("write");
    assert!(written.is_empty());
    assert!(!target.exists());
  }

  #[test]
  fn test_write_document_creates_parents() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("out/nested/doc.html");
    write_document("<p>hi</p>", Some(&path)).expect("write");
    assert_eq!(fs::read_to_string(path).expect("read"), "<p>hi</p>");
  }
}
