use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use nbconv_config::Config;
use nbconv_render::TemplateEnvironment;

/// Command line interface for nbconv
#[derive(Parser, Debug)]
#[command(author, version, about = "nbconv: notebook converter")]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times). Later files override earlier ones.
  #[arg(
    short = 'c',
    long = "config-file",
    global = true,
    action = clap::ArgAction::Append
  )]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", global = true, action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the nbconv CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Convert a notebook through a template.
  Convert(ConvertArgs),

  /// Initialize a new nbconv configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "nbconv.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Export the embedded templates to a directory for customization.
  Export {
    /// Output directory for template files.
    #[arg(short, long, default_value = "templates")]
    output_dir: PathBuf,

    /// Whether to overwrite existing files.
    #[arg(long)]
    force: bool,
  },
}

/// Arguments of `nbconv convert`.
#[derive(Args, Debug, Default)]
pub struct ConvertArgs {
  /// Notebook to convert.
  pub input: PathBuf,

  /// File to write the converted document to. Defaults to stdout.
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// Directory extracted figures are written to.
  #[arg(long = "resources-dir")]
  pub resources_dir: Option<PathBuf>,

  /// Template to render with, with or without extension.
  #[arg(short, long)]
  pub template: Option<String>,

  /// Use the LaTeX template environment.
  #[arg(long)]
  pub tex: bool,

  /// Write figures to separate files instead of embedding them.
  #[arg(long = "extract-figures")]
  pub extract_figures: bool,

  /// Directory searched for templates before the embedded ones.
  #[arg(long = "template-dir")]
  pub template_dir: Option<PathBuf>,

  /// Optional transform to run before the standard ones (can be specified
  /// multiple times).
  #[arg(long = "transform", action = clap::ArgAction::Append)]
  pub transforms: Vec<String>,

  /// Output kinds in order of preference, comma separated.
  #[arg(long, value_delimiter = ',')]
  pub priority: Option<Vec<String>>,
}

impl ConvertArgs {
  /// Layer the flags given on the command line over `config`.
  ///
  /// Flags that were not given leave the configured value alone.
  pub fn apply_to(&self, config: &mut Config) {
    if let Some(ref dir) = self.resources_dir {
      config.output_dir.clone_from(dir);
    }
    if self.template.is_some() {
      config.template.clone_from(&self.template);
    }
    if self.tex {
      config.environment = TemplateEnvironment::Tex;
    }
    if self.extract_figures {
      config.extract_figures = true;
    }
    if self.template_dir.is_some() {
      config.template_dir.clone_from(&self.template_dir);
    }
    config.transforms.extend(self.transforms.iter().cloned());
    if self.priority.is_some() {
      config.display_priority.clone_from(&self.priority);
    }
  }
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

#[cfg(test)]
mod tests {
  #![allow(
    clippy::expect_used,
    clippy::panic,
    clippy::field_reassign_with_default,
    reason = "Fine in tests"
  )]
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn test_cli_is_consistent() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_convert_flags_layer_over_config() {
    let cli = Cli::try_parse_from([
      "nbconv",
      "convert",
      "nb.ipynb",
      "--tex",
      "--extract-figures",
      "--priority",
      "latex,png,text",
      "--transform",
      "coalesce_streams",
      "--resources-dir",
      "figures",
      "--config",
      "template=article",
    ])
    .expect("valid arguments");
    assert_eq!(cli.config_overrides, ["template=article"]);

    let Commands::Convert(args) = cli.command else {
      panic!("expected convert");
    };
    assert_eq!(args.input, PathBuf::from("nb.ipynb"));

    let mut config = Config::default();
    config.transforms = vec!["from_file".into()];
    args.apply_to(&mut config);

    assert_eq!(config.environment, TemplateEnvironment::Tex);
    assert!(config.extract_figures);
    assert_eq!(config.output_dir, PathBuf::from("figures"));
    assert_eq!(config.transforms, ["from_file", "coalesce_streams"]);
    assert_eq!(
      config.display_priority,
      Some(vec!["latex".into(), "png".into(), "text".into()])
    );
  }

  #[test]
  fn test_absent_flags_keep_config() {
    let mut config = Config::default();
    config.template = Some("basic".into());
    config.extract_figures = true;

    ConvertArgs::default().apply_to(&mut config);
    assert_eq!(config.template.as_deref(), Some("basic"));
    assert!(config.extract_figures);
  }
}
