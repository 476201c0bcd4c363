use std::{fs, path::Path};

use log::debug;
use nbconv_templates::NOTEBOOK_CSS;
use serde::Serialize;

use crate::error::ConvertError;

/// Static text inlined into rendered documents, exposed to templates as
/// `inlining`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaticIncludes {
  /// Stylesheets in the order they should appear.
  pub css: Vec<String>,
}

impl StaticIncludes {
  /// The embedded notebook stylesheet only.
  #[must_use]
  pub fn builtin() -> Self {
    Self {
      css: vec![NOTEBOOK_CSS.to_string()],
    }
  }

  #[must_use]
  pub fn with_stylesheet(mut self, css: impl Into<String>) -> Self {
    self.css.push(css.into());
    self
  }

  /// Append the contents of each file in `paths`.
  ///
  /// # Errors
  ///
  /// Returns [`ConvertError::Read`] for the first file that cannot be read.
  pub fn with_stylesheet_files<P: AsRef<Path>>(
    mut self,
    paths: &[P],
  ) -> Result<Self, ConvertError> {
    for path in paths {
      let path = path.as_ref();
      let css = fs::read_to_string(path).map_err(|source| {
        ConvertError::Read {
          path: path.to_path_buf(),
          source,
        }
      })?;
      debug!("Inlining stylesheet {}", path.display());
      self.css.push(css);
    }
    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;

  #[test]
  fn test_stylesheets_follow_builtin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let extra = dir.path().join("extra.css");
    fs::write(&extra, "p { color: red; }").expect("write");

    let includes = StaticIncludes::builtin()
      .with_stylesheet_files(&[&extra])
      .expect("stylesheets")
      .with_stylesheet("h1 {}");
    assert_eq!(includes.css.len(), 3);
    assert_eq!(includes.css[0], NOTEBOOK_CSS);
    assert_eq!(includes.css[1], "p { color: red; }");
  }

  #[test]
  fn test_missing_stylesheet_names_path() {
    let err = StaticIncludes::builtin()
      .with_stylesheet_files(&["does/not/exist.css"])
      .expect_err("missing");
    assert!(err.to_string().contains("does/not/exist.css"));
  }
}
