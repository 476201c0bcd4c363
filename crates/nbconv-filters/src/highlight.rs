//! Syntax highlighting of code cells with syntect and the two-face syntax
//! and theme collections.
use std::sync::OnceLock;

use syntect::{
  highlighting::Theme,
  html::highlighted_html_for_string,
  parsing::SyntaxSet,
};
use two_face::{
  re_exports::syntect::highlighting::ThemeSet,
  theme::{EmbeddedLazyThemeSet, EmbeddedThemeName},
};

/// Theme used when none is configured or the configured one is unknown.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
  #[error("Highlighting failed for language '{language}': {message}")]
  Failed { language: String, message: String },
}

/// Renders code to HTML with inline styles.
#[derive(Debug, Clone)]
pub struct Highlighter {
  theme_name: String,
}

impl Default for Highlighter {
  fn default() -> Self {
    Self::new(None)
  }
}

impl Highlighter {
  #[must_use]
  pub fn new(theme_name: Option<String>) -> Self {
    Self {
      theme_name: theme_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_THEME.to_string()),
    }
  }

  #[must_use]
  pub fn theme_name(&self) -> &str {
    &self.theme_name
  }

  fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(two_face::syntax::extra_newlines)
  }

  fn theme_set() -> &'static EmbeddedLazyThemeSet {
    static THEME_SET: OnceLock<EmbeddedLazyThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(two_face::theme::extra)
  }

  fn default_theme_set() -> &'static ThemeSet {
    static DEFAULT_THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    DEFAULT_THEME_SET.get_or_init(ThemeSet::load_defaults)
  }

  fn embedded_theme(name: &str) -> Option<EmbeddedThemeName> {
    Some(match name {
      "Dracula" => EmbeddedThemeName::Dracula,
      "Github" => EmbeddedThemeName::Github,
      "GruvboxDark" => EmbeddedThemeName::GruvboxDark,
      "GruvboxLight" => EmbeddedThemeName::GruvboxLight,
      "MonokaiExtended" => EmbeddedThemeName::MonokaiExtended,
      "Nord" => EmbeddedThemeName::Nord,
      "OneHalfDark" => EmbeddedThemeName::OneHalfDark,
      "OneHalfLight" => EmbeddedThemeName::OneHalfLight,
      "SolarizedDark" => EmbeddedThemeName::SolarizedDark,
      "SolarizedLight" => EmbeddedThemeName::SolarizedLight,
      "TwoDark" => EmbeddedThemeName::TwoDark,
      "Zenburn" => EmbeddedThemeName::Zenburn,
      _ => return None,
    })
  }

  fn theme(&self) -> &'static Theme {
    let default_theme_set = Self::default_theme_set();
    if let Some(theme) = default_theme_set.themes.get(&self.theme_name) {
      return theme;
    }
    if let Some(name) = Self::embedded_theme(&self.theme_name) {
      return Self::theme_set().get(name);
    }

    log::warn!(
      "Unknown highlight theme '{}', using {DEFAULT_THEME}",
      self.theme_name
    );
    default_theme_set
      .themes
      .get(DEFAULT_THEME)
      .unwrap_or_else(|| Self::theme_set().get(EmbeddedThemeName::InspiredGithub))
  }

  /// Whether `language` resolves to a known syntax.
  #[must_use]
  pub fn supports(language: &str) -> bool {
    Self::syntax_set().find_syntax_by_token(language).is_some()
  }

  /// Highlight `code` as `language`, wrapped in `<div class="highlight">`.
  ///
  /// Unknown languages are rendered as plain text.
  ///
  /// # Errors
  ///
  /// Returns [`HighlightError`] if syntect fails on the input.
  pub fn highlight(
    &self,
    code: &str,
    language: &str,
  ) -> Result<String, HighlightError> {
    let syntax_set = Self::syntax_set();
    let syntax = syntax_set
      .find_syntax_by_token(language)
      .unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let html = highlighted_html_for_string(code, syntax_set, syntax, self.theme())
      .map_err(|e| {
        HighlightError::Failed {
          language: language.to_string(),
          message:  e.to_string(),
        }
      })?;
    Ok(format!("<div class=\"highlight\">{html}</div>"))
  }
}
