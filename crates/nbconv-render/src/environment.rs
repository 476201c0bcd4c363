//! Template syntax families.
use std::{
  fmt,
  path::{Path, PathBuf},
  str::FromStr,
};

use nbconv_pipeline::{DEFAULT_DISPLAY_PRIORITY, DisplayPriority};
use serde::{Deserialize, Serialize};

/// Display priority used by the tex environment when none is configured.
/// LaTeX cannot embed HTML, so LaTeX and PDF-friendly kinds come first.
pub const TEX_DISPLAY_PRIORITY: &[&str] =
  &["latex", "pdf", "png", "jpg", "jpeg", "svg", "text"];

/// Delimiter pairs of the tex environment and their engine equivalents.
const TEX_DELIMITERS: [(&str, &str, &str, &str); 3] = [
  ("(((", ")))", "{{", "}}"),
  ("((*", "*))", "{%", "%}"),
  ("((=", "=))", "{#", "#}"),
];

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TemplateEnvironment {
  /// HTML and plain-text templates using the engine's own delimiters.
  #[default]
  Standard,
  /// LaTeX templates with `((( )))`, `((* *))` and `((= =))` delimiters.
  Tex,
}

impl fmt::Display for TemplateEnvironment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Standard => write!(f, "standard"),
      Self::Tex => write!(f, "tex"),
    }
  }
}

impl FromStr for TemplateEnvironment {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "standard" | "html" => Ok(Self::Standard),
      "tex" | "latex" => Ok(Self::Tex),
      other => {
        Err(format!(
          "Unknown template environment '{other}', expected 'standard' or \
           'tex'"
        ))
      },
    }
  }
}

impl TemplateEnvironment {
  /// File extension of templates in this environment.
  #[must_use]
  pub const fn extension(self) -> &'static str {
    match self {
      Self::Standard => ".tpl",
      Self::Tex => ".tplx",
    }
  }

  #[must_use]
  pub const fn default_template(self) -> &'static str {
    match self {
      Self::Standard => "full",
      Self::Tex => "article",
    }
  }

  #[must_use]
  pub fn default_priority(self) -> DisplayPriority {
    match self {
      Self::Standard => {
        DisplayPriority::new(DEFAULT_DISPLAY_PRIORITY.iter().copied())
      },
      Self::Tex => DisplayPriority::new(TEX_DISPLAY_PRIORITY.iter().copied()),
    }
  }

  /// Directories under a user template directory, in lookup order.
  #[must_use]
  pub fn search_roots(self, dir: &Path) -> Vec<PathBuf> {
    match self {
      Self::Standard => vec![dir.to_path_buf(), dir.join("skeleton")],
      Self::Tex => vec![dir.join("tex"), dir.join("skeleton").join("tex")],
    }
  }

  /// Rewrite a template source into engine syntax.
  #[must_use]
  pub fn prepare(self, source: &str) -> String {
    match self {
      Self::Standard => source.to_string(),
      Self::Tex => translate_tex_delimiters(source),
    }
  }
}

/// Convert tex delimiters into engine delimiters.
///
/// Literal text that the engine would otherwise read as a tag, such as
/// `{#1}` or a `{` directly before a tag, is wrapped in a raw block.
#[must_use]
pub fn translate_tex_delimiters(source: &str) -> String {
  let mut out = String::with_capacity(source.len() + source.len() / 8);
  let mut rest = source;

  loop {
    let next = TEX_DELIMITERS
      .iter()
      .filter_map(|delims| rest.find(delims.0).map(|pos| (pos, delims)))
      .min_by_key(|(pos, _)| *pos);

    let Some((start, (open, close, engine_open, engine_close))) = next else {
      push_literal(&mut out, rest);
      break;
    };

    push_literal(&mut out, &rest[..start]);
    let inner = &rest[start + open.len()..];
    let Some(end) = inner.find(close) else {
      // Unterminated tag, keep it verbatim
      push_literal(&mut out, &rest[start..]);
      break;
    };

    out.push_str(engine_open);
    out.push_str(&inner[..end]);
    out.push_str(engine_close);
    rest = &inner[end + close.len()..];
  }

  out
}

fn push_literal(out: &mut String, text: &str) {
  let clashes = text.contains("{{")
    || text.contains("{%")
    || text.contains("{#")
    || text.ends_with('{');
  if clashes {
    out.push_str("{% raw %}");
    out.push_str(text);
    out.push_str("{% endraw %}");
  } else {
    out.push_str(text);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_translate_delimiters() {
    assert_eq!(
      translate_tex_delimiters("((* if x *))((( x )))((* endif *))"),
      "{% if x %}{{ x }}{% endif %}"
    );
    assert_eq!(translate_tex_delimiters("a ((= note =)) b"), "a {# note #} b");
  }

  #[test]
  fn test_literal_braces_are_protected() {
    assert_eq!(
      translate_tex_delimiters(r"\section{((( title )))}"),
      r"{% raw %}\section{{% endraw %}{{ title }}}"
    );
    assert_eq!(
      translate_tex_delimiters(r"\def\x#1{#1}"),
      r"{% raw %}\def\x#1{#1}{% endraw %}"
    );
    assert_eq!(translate_tex_delimiters("50% {a}"), "50% {a}");
  }

  #[test]
  fn test_unterminated_tag_stays_literal() {
    assert_eq!(translate_tex_delimiters("a ((( b"), "a ((( b");
  }

  #[test]
  fn test_environment_lookup() {
    assert_eq!(
      "tex".parse::<TemplateEnvironment>(),
      Ok(TemplateEnvironment::Tex)
    );
    assert!("pdf".parse::<TemplateEnvironment>().is_err());
    assert_eq!(TemplateEnvironment::Tex.extension(), ".tplx");
    assert_eq!(TemplateEnvironment::default().default_template(), "full");

    let roots = TemplateEnvironment::Tex.search_roots(Path::new("t"));
    assert_eq!(roots, [
      PathBuf::from("t/tex"),
      PathBuf::from("t/skeleton/tex")
    ]);
  }
}
