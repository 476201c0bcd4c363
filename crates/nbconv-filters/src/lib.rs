//! Text filters applied to notebook content while rendering.
//!
//! Every filter here is a plain function over strings, independent of any
//! template engine. The render crate registers them with its templates.
pub mod highlight;
pub mod latex;
pub mod markdown;
pub mod text;

pub use highlight::{HighlightError, Highlighter};
pub use latex::escape_tex;
pub use markdown::{markdown_to_html, markdown_to_latex};
pub use text::{ansi_to_html, indent, python_comment, rm_fake, strip_ansi};

/// A regex that matches nothing, used when a static pattern fails to compile.
#[allow(clippy::unwrap_used, reason = "Both patterns are constant and valid")]
pub(crate) fn never_matching_regex() -> regex::Regex {
  // `[^\s\S]` asserts something impossible
  regex::Regex::new(r"[^\s\S]")
    .unwrap_or_else(|_| regex::Regex::new(r"^\b$").unwrap())
}
