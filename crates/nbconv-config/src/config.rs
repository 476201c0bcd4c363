use std::{
  fs,
  path::{Path, PathBuf},
  sync::OnceLock,
};

use log::{debug, info, warn};
use nbconv_macros::Configurable;
use nbconv_render::{ConverterOptions, TemplateEnvironment};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File names looked up in the working directory, in order.
const LOCAL_CONFIG_FILES: &[&str] = &[
  "nbconv.toml",
  "nbconv.json",
  ".nbconv.toml",
  ".nbconv.json",
  ".config/nbconv.toml",
  ".config/nbconv.json",
];

/// Configuration for a notebook conversion.
///
/// Loaded from TOML or JSON files and `KEY=VALUE` overrides, then turned
/// into [`ConverterOptions`] for the converter.
#[derive(Debug, Clone, Serialize, Deserialize, Configurable)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Template syntax family.
  #[config(key = "environment")]
  pub environment: TemplateEnvironment,

  /// Template name, with or without extension.
  #[config(key = "template", allow_empty)]
  pub template: Option<String>,

  /// Move figures out of the notebook into separate files.
  #[config(key = "extract_figures")]
  pub extract_figures: bool,

  /// Output kinds in order of preference.
  #[config(key = "display_priority", allow_empty)]
  pub display_priority: Option<Vec<String>>,

  /// Optional transforms to run before the standard ones.
  #[config(key = "transforms")]
  pub transforms: Vec<String>,

  /// Directory searched for templates before the embedded ones.
  #[config(key = "template_dir", allow_empty)]
  pub template_dir: Option<PathBuf>,

  /// Directory extracted figures are written to.
  #[config(key = "output_dir")]
  pub output_dir: PathBuf,

  /// Stylesheets inlined after the built-in one.
  #[config(key = "stylesheets")]
  pub stylesheets: Vec<PathBuf>,

  /// Syntax highlighting theme.
  #[config(key = "highlight_theme", allow_empty)]
  pub highlight_theme: Option<String>,

  #[deprecated(since = "0.2.0", note = "Use `stylesheets` instead")]
  #[config(
    key = "stylesheet",
    deprecated = "0.2.0",
    replacement = "stylesheets",
    allow_empty
  )]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stylesheet: Option<PathBuf>,
}

impl Default for Config {
  #[allow(deprecated)]
  fn default() -> Self {
    Self {
      environment:      TemplateEnvironment::default(),
      template:         None,
      extract_figures:  false,
      display_priority: None,
      transforms:       Vec::new(),
      template_dir:     None,
      output_dir:       PathBuf::from("."),
      stylesheets:      Vec::new(),
      highlight_theme:  None,
      stylesheet:       None,
    }
  }
}

impl Config {
  /// Load configuration from a TOML or JSON file, chosen by extension.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format
  /// is unsupported.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content =
      fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
      })?;

    let ext = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(str::to_lowercase);

    let config: Self = match ext.as_deref() {
      Some("json") => {
        serde_json::from_str(&content).map_err(|source| {
          ConfigError::Json {
            path: path.to_path_buf(),
            source,
          }
        })?
      },
      Some("toml") => {
        toml::from_str(&content).map_err(|source| {
          ConfigError::Toml {
            path: path.to_path_buf(),
            source,
          }
        })?
      },
      Some(_) => {
        return Err(ConfigError::UnsupportedFile(path.to_path_buf()));
      },
      None => {
        return Err(ConfigError::MissingExtension(path.to_path_buf()));
      },
    };

    #[allow(deprecated)]
    {
      if config.stylesheet.is_some() {
        warn!(
          "The 'stylesheet' config key in {} is deprecated since 0.2.0. Use \
           'stylesheets' instead.",
          path.display()
        );
      }
    }

    debug!("Loaded configuration from {}", path.display());
    Ok(config)
  }

  /// Build the effective configuration.
  ///
  /// Files in `config_files` are merged in order. Without any, a discovered
  /// config file is used if one exists, and the defaults otherwise.
  /// `config_overrides` are applied last.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded or an override is invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut config = if let Some((first, rest)) = config_files.split_first() {
      let mut merged = Self::load_explicit(first)?;
      for config_path in rest {
        let additional = Self::load_explicit(config_path)?;
        merged.merge(additional);
      }

      merged
    } else if let Some(found) = Self::find_config_file() {
      info!("Using config file {}", found.display());
      Self::from_file(&found)?
    } else {
      Self::default()
    };

    config.apply_overrides(config_overrides)?;
    Ok(config)
  }

  fn load_explicit(path: &Path) -> Result<Self, ConfigError> {
    Self::from_file(path).map_err(|source| {
      ConfigError::Load {
        path:   path.to_path_buf(),
        source: Box::new(source),
      }
    })
  }

  /// Apply `KEY=VALUE` overrides in order.
  ///
  /// # Errors
  ///
  /// Returns an error for malformed overrides, unknown keys and values that
  /// do not parse.
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Override(format!(
          "'{override_str}'. Expected KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  /// Merge another config into this one, with the other config's values
  /// taking precedence.
  ///
  /// Optional fields are replaced when the other config sets them, lists are
  /// appended to, and everything else is replaced.
  pub fn merge(&mut self, other: Self) {
    self.merge_fields(other);
  }

  /// Search for a config file in the working directory, then in
  /// `$XDG_CONFIG_HOME`, then in `~/.config/nbconv`.
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let current_dir = std::env::current_dir().ok()?;
        Self::find_config_file_in(
          &current_dir,
          std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
          std::env::var_os("HOME").map(PathBuf::from),
        )
      })
      .clone()
  }

  fn find_config_file_in(
    current_dir: &Path,
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
  ) -> Option<PathBuf> {
    let local = LOCAL_CONFIG_FILES.iter().map(|name| current_dir.join(name));
    let xdg = xdg_config_home.into_iter().flat_map(|dir| {
      ["nbconv.toml", "nbconv.json"].map(|name| dir.join(name))
    });
    let home = home.into_iter().flat_map(|dir| {
      let dir = dir.join(".config").join("nbconv");
      ["config.toml", "config.json"].map(|name| dir.join(name))
    });

    local.chain(xdg).chain(home).find(|path| path.is_file())
  }

  /// Stylesheets to inline, including the deprecated single `stylesheet`.
  #[must_use]
  pub fn stylesheet_paths(&self) -> Vec<PathBuf> {
    #[allow(deprecated)]
    let legacy = self.stylesheet.iter().cloned();
    legacy.chain(self.stylesheets.iter().cloned()).collect()
  }

  /// Options for a converter configured like this.
  #[must_use]
  pub fn to_converter_options(&self) -> ConverterOptions {
    ConverterOptions {
      environment:      self.environment,
      template:         self.template.clone(),
      extract_figures:  self.extract_figures,
      display_priority: self.display_priority.clone(),
      transforms:       self.transforms.clone(),
      template_dir:     self.template_dir.clone(),
      stylesheets:      self.stylesheet_paths(),
      highlight_theme:  self.highlight_theme.clone(),
    }
  }

  /// Generate a default configuration file with commented explanations.
  ///
  /// # Errors
  ///
  /// Returns an error if `format` is unsupported or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)?;

    fs::write(path, config_content).map_err(|source| {
      ConfigError::Write {
        path: path.to_path_buf(),
        source,
      }
    })?;

    info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}
