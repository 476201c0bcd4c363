//! Escaping of plain text for LaTeX output.
use std::sync::LazyLock;

use regex::Regex;

use crate::never_matching_regex;

/// Rewrite rules applied in order. Text produced by one rule is never seen
/// by a later one.
static LATEX_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
  [
    (r"\\", r"\textbackslash{}"),
    (r"([{}_#%&$])", r"\${1}"),
    (r"~", r"\~{}"),
    (r"\^", r"\^{}"),
    (r#"""#, "''"),
    (r"\.\.\.+", r"\ldots{}"),
  ]
  .into_iter()
  .map(|(pattern, replacement)| {
    let regex = Regex::new(pattern).unwrap_or_else(|e| {
      log::error!("Failed to compile LaTeX escape pattern {pattern}: {e}");
      never_matching_regex()
    });
    (regex, replacement)
  })
  .collect()
});

/// Escape the characters that LaTeX treats specially.
///
/// ```
/// assert_eq!(nbconv_filters::escape_tex("100% & $5"), r"100\% \& \$5");
/// ```
#[must_use]
pub fn escape_tex(text: &str) -> String {
  // (content, already escaped)
  let mut segments: Vec<(String, bool)> = vec![(text.to_string(), false)];

  for (pattern, replacement) in LATEX_RULES.iter() {
    let mut next = Vec::with_capacity(segments.len());
    for (segment, escaped) in segments {
      if escaped {
        next.push((segment, true));
        continue;
      }

      let mut last = 0;
      for caps in pattern.captures_iter(&segment) {
        let Some(found) = caps.get(0) else {
          continue;
        };
        if found.start() > last {
          next.push((segment[last..found.start()].to_string(), false));
        }
        let mut replaced = String::new();
        caps.expand(replacement, &mut replaced);
        next.push((replaced, true));
        last = found.end();
      }
      if last < segment.len() {
        next.push((segment[last..].to_string(), false));
      }
    }
    segments = next;
  }

  segments.into_iter().map(|(segment, _)| segment).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_escapes_reserved_characters() {
    assert_eq!(escape_tex("100% & $5"), r"100\% \& \$5");
    assert_eq!(escape_tex("a_b#c{d}"), r"a\_b\#c\{d\}");
  }

  #[test]
  fn test_backslash_output_is_not_reescaped() {
    assert_eq!(escape_tex(r"C:\dir"), r"C:\textbackslash{}dir");
    assert_eq!(escape_tex(r"\{"), r"\textbackslash{}\{");
  }

  #[test]
  fn test_tilde_caret_quotes_and_ellipsis() {
    assert_eq!(escape_tex("~/x^2"), r"\~{}/x\^{}2");
    assert_eq!(escape_tex(r#"say "hi""#), "say ''hi''");
    assert_eq!(escape_tex("wait..."), r"wait\ldots{}");
    assert_eq!(escape_tex("a..b"), "a..b");
  }

  #[test]
  fn test_plain_text_is_unchanged() {
    assert_eq!(escape_tex(""), "");
    assert_eq!(escape_tex("plain words, 42."), "plain words, 42.");
  }
}
