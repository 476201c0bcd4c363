//! Markdown rendering for markdown cells, to HTML or to LaTeX.
use comrak::{
  Arena,
  nodes::{AstNode, ListType, NodeValue},
  options::Options,
  parse_document,
};

use crate::latex::escape_tex;

fn html_options() -> Options<'static> {
  let mut options = Options::default();
  options.extension.table = true;
  options.extension.strikethrough = true;
  options.extension.tasklist = true;
  options.extension.autolink = true;
  // Cells routinely embed raw HTML
  options.render.r#unsafe = true;
  options
}

fn latex_options() -> Options<'static> {
  let mut options = Options::default();
  options.extension.strikethrough = true;
  options.extension.math_dollars = true;
  options
}

/// Render markdown to an HTML fragment.
#[must_use]
pub fn markdown_to_html(text: &str) -> String {
  comrak::markdown_to_html(text, &html_options())
}

/// Render markdown to a LaTeX fragment.
///
/// Text is escaped with [`escape_tex`]. `$...$` and `$$...$$` math passes
/// through untouched and raw HTML is dropped.
#[must_use]
pub fn markdown_to_latex(text: &str) -> String {
  let arena = Arena::new();
  let options = latex_options();
  let root = parse_document(&arena, text, &options);

  let mut out = String::with_capacity(text.len() + text.len() / 4);
  render_latex(root, &mut out);
  out.trim_end().to_string()
}

fn render_children<'a>(node: &'a AstNode<'a>, out: &mut String) {
  for child in node.children() {
    render_latex(child, out);
  }
}

fn wrap<'a>(node: &'a AstNode<'a>, open: &str, close: &str, out: &mut String) {
  out.push_str(open);
  render_children(node, out);
  out.push_str(close);
}

/// Escape the characters that end or comment out a LaTeX URL argument.
fn escape_url(url: &str) -> String {
  url.replace('%', r"\%").replace('#', r"\#")
}

fn render_latex<'a>(node: &'a AstNode<'a>, out: &mut String) {
  match &node.data.borrow().value {
    NodeValue::Text(text) => out.push_str(&escape_tex(text)),
    NodeValue::Code(code) => {
      out.push_str(r"\texttt{");
      out.push_str(&escape_tex(&code.literal));
      out.push('}');
    },
    NodeValue::Math(math) => {
      if math.display_math {
        out.push_str(r"\[");
        out.push_str(&math.literal);
        out.push_str(r"\]");
      } else {
        out.push('$');
        out.push_str(&math.literal);
        out.push('$');
      }
    },
    NodeValue::SoftBreak => out.push('\n'),
    NodeValue::LineBreak => out.push_str("\\\\\n"),
    NodeValue::Emph => wrap(node, r"\emph{", "}", out),
    NodeValue::Strong => wrap(node, r"\textbf{", "}", out),
    NodeValue::Paragraph => wrap(node, "", "\n\n", out),
    NodeValue::Heading(heading) => {
      let command = match heading.level {
        1 => "section",
        2 => "subsection",
        3 => "subsubsection",
        4 => "paragraph",
        _ => "subparagraph",
      };
      wrap(node, &format!("\\{command}{{"), "}\n\n", out);
    },
    NodeValue::BlockQuote => {
      wrap(node, "\\begin{quote}\n", "\\end{quote}\n\n", out);
    },
    NodeValue::List(list) => {
      let env = if list.list_type == ListType::Ordered {
        "enumerate"
      } else {
        "itemize"
      };
      wrap(
        node,
        &format!("\\begin{{{env}}}\n"),
        &format!("\\end{{{env}}}\n\n"),
        out,
      );
    },
    NodeValue::Item(_) => wrap(node, r"\item ", "", out),
    NodeValue::CodeBlock(block) => {
      out.push_str("\\begin{verbatim}\n");
      out.push_str(&block.literal);
      if !block.literal.ends_with('\n') {
        out.push('\n');
      }
      out.push_str("\\end{verbatim}\n\n");
    },
    NodeValue::Link(link) => {
      let url = escape_url(&link.url);
      wrap(node, &format!("\\href{{{url}}}{{"), "}", out);
    },
    NodeValue::Image(image) => {
      out.push_str(r"\includegraphics{");
      out.push_str(&escape_url(&image.url));
      out.push('}');
    },
    NodeValue::ThematicBreak => {
      out.push_str("\\par\\noindent\\rule{\\textwidth}{0.4pt}\n\n");
    },
    NodeValue::HtmlBlock(_) | NodeValue::HtmlInline(_) => {},
    _ => render_children(node, out),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_markdown_to_html() {
    let html = markdown_to_html("# Title\n\nSome *text*.");
    assert!(html.contains("<h1>Title</h1>"));
    assert!(html.contains("<em>text</em>"));
  }

  #[test]
  fn test_markdown_to_html_keeps_raw_html() {
    let html = markdown_to_html("<div class=\"x\">hi</div>");
    assert!(html.contains("<div class=\"x\">hi</div>"));
  }

  #[test]
  fn test_markdown_to_latex_structure() {
    let tex = markdown_to_latex("## Costs\n\nIt is **100%** `done`.");
    assert_eq!(
      tex,
      "\\subsection{Costs}\n\nIt is \\textbf{100\\%} \\texttt{done}."
    );
  }

  #[test]
  fn test_markdown_to_latex_lists_and_math() {
    let tex = markdown_to_latex("1. first $x_1$\n2. second");
    assert!(tex.starts_with("\\begin{enumerate}"));
    assert!(tex.contains("\\item first $x_1$"));
    assert!(tex.ends_with("\\end{enumerate}"));
  }

  #[test]
  fn test_markdown_to_latex_code_block_is_verbatim() {
    let tex = markdown_to_latex("```\na_b & c\n```");
    assert_eq!(tex, "\\begin{verbatim}\na_b & c\n\\end{verbatim}");
  }

  #[test]
  fn test_markdown_to_latex_escapes_urls() {
    let tex =
      markdown_to_latex("![a](my%20plot_1.png) and [l](http://x/a%20b#top)");
    assert_eq!(
      tex,
      "\\includegraphics{my\\%20plot_1.png} and \\href{http://x/a\\%20b\\#top}{l}"
    );
  }
}
