//! Templates and stylesheets embedded into nbconv at build time.
use std::{
  collections::HashMap,
  fs,
  io,
  path::{Path, PathBuf},
};

pub const NULL_TEMPLATE: &str = include_str!("../templates/skeleton/null.tpl");
pub const BASIC_TEMPLATE: &str = include_str!("../templates/basic.tpl");
pub const FULL_TEMPLATE: &str = include_str!("../templates/full.tpl");
pub const PYTHON_TEMPLATE: &str = include_str!("../templates/python.tpl");

pub const TEX_NULL_TEMPLATE: &str =
  include_str!("../templates/skeleton/tex/null.tplx");
pub const TEX_ARTICLE_TEMPLATE: &str =
  include_str!("../templates/tex/article.tplx");

pub const NOTEBOOK_CSS: &str = include_str!("../templates/notebook.css");

/// Every embedded file keyed by its path relative to the template root.
#[must_use]
pub fn all_templates() -> HashMap<&'static str, &'static str> {
  let mut templates = HashMap::new();
  templates.insert("skeleton/null.tpl", NULL_TEMPLATE);
  templates.insert("basic.tpl", BASIC_TEMPLATE);
  templates.insert("full.tpl", FULL_TEMPLATE);
  templates.insert("python.tpl", PYTHON_TEMPLATE);
  templates.insert("skeleton/tex/null.tplx", TEX_NULL_TEMPLATE);
  templates.insert("tex/article.tplx", TEX_ARTICLE_TEMPLATE);
  templates.insert("notebook.css", NOTEBOOK_CSS);
  templates
}

/// Embedded templates whose file name ends with `extension`, keyed by file
/// name without directories.
#[must_use]
pub fn templates_with_extension(
  extension: &str,
) -> HashMap<&'static str, &'static str> {
  all_templates()
    .into_iter()
    .filter(|(path, _)| path.ends_with(extension))
    .map(|(path, content)| {
      let name = path.rsplit('/').next().unwrap_or(path);
      (name, content)
    })
    .collect()
}

/// Write the embedded templates under `dir`, keeping their relative layout.
///
/// Existing files are left alone unless `force` is set. Returns the paths
/// that were written.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
pub fn export_templates(dir: &Path, force: bool) -> io::Result<Vec<PathBuf>> {
  let mut entries: Vec<_> = all_templates().into_iter().collect();
  entries.sort_unstable_by_key(|(path, _)| *path);

  let mut written = Vec::new();
  for (relative, content) in entries {
    let path = dir.join(relative);
    if path.exists() && !force {
      log::warn!("Skipping existing file {}", path.display());
      continue;
    }
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    log::debug!("Wrote {}", path.display());
    written.push(path);
  }
  Ok(written)
}
