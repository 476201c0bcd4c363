//! Plain-text filters: comments, indentation and terminal escapes.
use std::{fmt::Write as _, sync::LazyLock};

use regex::Regex;

use crate::never_matching_regex;

/// Any CSI escape sequence.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\x1b\[(.*?)([@-~])").unwrap_or_else(|e| {
    log::error!("Failed to compile ANSI escape regex: {e}");
    never_matching_regex()
  })
});

/// SGR sequences only, with their parameter list captured.
static ANSI_COLOR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\x1b\[([\dA-Fa-f;]*?)m").unwrap_or_else(|e| {
    log::error!("Failed to compile ANSI color regex: {e}");
    never_matching_regex()
  })
});

/// Prefix every line with `# `.
#[must_use]
pub fn python_comment(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 8);
  for (i, line) in text.split('\n').enumerate() {
    if i > 0 {
      out.push('\n');
    }
    out.push_str("# ");
    out.push_str(line);
  }
  out
}

/// Indent every line by `spaces` spaces.
///
/// A trailing newline is kept without indenting the empty line after it.
#[must_use]
pub fn indent(text: &str, spaces: usize) -> String {
  let pad = " ".repeat(spaces);
  let mut out = String::with_capacity(text.len() + spaces * 4);
  for (i, line) in text.split('\n').enumerate() {
    if i > 0 {
      out.push('\n');
    }
    out.push_str(&pad);
    out.push_str(line);
  }
  if text.ends_with('\n') {
    out.truncate(out.len() - pad.len());
  }
  out
}

/// Drop the `/files/` prefix that notebook servers put on local links.
#[must_use]
pub fn rm_fake(text: &str) -> String {
  text.replace("/files/", "")
}

/// Remove terminal escape sequences.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
  ANSI_ESCAPE.replace_all(text, "").into_owned()
}

fn ansi_class(code: &str) -> Option<&'static str> {
  Some(match code {
    "30" => "ansiblack",
    "31" => "ansired",
    "32" => "ansigreen",
    "33" => "ansiyellow",
    "34" => "ansiblue",
    "35" => "ansipurple",
    "36" => "ansicyan",
    "37" => "ansigrey",
    "1" | "01" => "ansibold",
    _ => return None,
  })
}

/// HTML-escape `text` and turn color escapes into `<span class="ansi*">`.
///
/// Unknown codes are dropped. A reset closes the open span.
#[must_use]
pub fn ansi_to_html(text: &str) -> String {
  let escaped = html_escape::encode_text(text);
  let mut out = String::with_capacity(escaped.len());
  let mut last = 0;
  let mut open = false;

  for caps in ANSI_COLOR.captures_iter(&escaped) {
    let Some(found) = caps.get(0) else {
      continue;
    };
    out.push_str(&escaped[last..found.start()]);
    last = found.end();

    if open {
      out.push_str("</span>");
    }
    let params = caps.get(1).map_or("", |m| m.as_str());
    let classes: Vec<&str> = params.split(';').filter_map(ansi_class).collect();
    open = !classes.is_empty();
    if open {
      let _ = write!(out, "<span class=\"{}\">", classes.join(" "));
    }
  }
  out.push_str(&escaped[last..]);
  if open {
    out.push_str("</span>");
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_python_comment() {
    assert_eq!(python_comment("a\nb"), "# a\n# b");
    assert_eq!(python_comment(""), "# ");
  }

  #[test]
  fn test_indent_keeps_trailing_newline_bare() {
    assert_eq!(indent("a\nb", 4), "    a\n    b");
    assert_eq!(indent("a\n", 2), "  a\n");
    assert_eq!(indent("x", 0), "x");
  }

  #[test]
  fn test_rm_fake() {
    assert_eq!(rm_fake("see /files/plot.png"), "see plot.png");
  }

  #[test]
  fn test_strip_ansi() {
    assert_eq!(strip_ansi("\x1b[0;31mError\x1b[0m: bad"), "Error: bad");
    assert_eq!(strip_ansi("\x1b[2Kclean"), "clean");
  }

  #[test]
  fn test_ansi_to_html_wraps_colors() {
    assert_eq!(
      ansi_to_html("\x1b[31mred\x1b[0m plain"),
      "<span class=\"ansired\">red</span> plain"
    );
    assert_eq!(
      ansi_to_html("\x1b[01;32mok"),
      "<span class=\"ansibold ansigreen\">ok</span>"
    );
  }

  #[test]
  fn test_ansi_to_html_escapes_markup() {
    assert_eq!(ansi_to_html("a < b"), "a &lt; b");
    assert_eq!(ansi_to_html("a/b 'c' & \"d\""), "a/b 'c' &amp; \"d\"");
    assert_eq!(ansi_to_html("\x1b[99mx\x1b[0m"), "x");
  }
}
