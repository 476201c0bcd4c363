use crate::error::ConfigError;

/// Default configuration in TOML, with every key explained.
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# nbconv configuration file

# Template syntax family: "standard" (HTML, scripts) or "tex" (LaTeX)
environment = "standard"

# Template to render with, without extension. Defaults to "full" for the
# standard environment and "article" for tex.
# template = "basic"

# Directory searched for templates before the embedded ones
# template_dir = "templates"

# Move figures out of the notebook and write them next to the output
extract_figures = false

# Directory extracted figures are written to
output_dir = "."

# Output kinds in order of preference. Defaults depend on the environment.
# display_priority = ["html", "pdf", "svg", "latex", "png", "jpg", "jpeg", "text"]

# Optional transforms run before the standard ones
# transforms = ["coalesce_streams"]

# Extra stylesheets inlined after the built-in one
# stylesheets = ["custom.css"]

# Syntax highlighting theme for code cells
# highlight_theme = "InspiredGitHub"
"#;

/// Default configuration in JSON.
pub const DEFAULT_JSON_TEMPLATE: &str = r#"{
  "environment": "standard",
  "extract_figures": false,
  "output_dir": ".",
  "display_priority": ["html", "pdf", "svg", "latex", "png", "jpg", "jpeg", "text"],
  "transforms": [],
  "stylesheets": [],
  "highlight_theme": "InspiredGitHub"
}
"#;

/// Get the default configuration for `format` (`toml` or `json`).
///
/// # Errors
///
/// Returns an error if the requested format is not supported.
pub fn get_template(format: &str) -> Result<&'static str, ConfigError> {
  match format.to_lowercase().as_str() {
    "toml" => Ok(DEFAULT_TOML_TEMPLATE),
    "json" => Ok(DEFAULT_JSON_TEMPLATE),
    _ => {
      Err(ConfigError::UnsupportedFormat(format.to_string()))
    },
  }
}
