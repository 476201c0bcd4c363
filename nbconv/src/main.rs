use std::fs;

use color_eyre::eyre::{Context, Result, bail};
use log::{LevelFilter, info};
use nbconv::{
  cli::{Cli, Commands, ConvertArgs},
  output,
};
use nbconv_config::Config;
use nbconv_render::Converter;

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  match &cli.command {
    Commands::Init {
      output,
      format,
      force,
    } => {
      if output.exists() && !force {
        bail!(
          "Configuration file already exists: {}. Use --force to overwrite.",
          output.display()
        );
      }

      if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
      {
        fs::create_dir_all(parent).wrap_err_with(|| {
          format!("Failed to create directory: {}", parent.display())
        })?;
        info!("Created directory: {}", parent.display());
      }

      Config::generate_default_config(format, output).wrap_err_with(|| {
        format!("Failed to generate configuration file: {}", output.display())
      })?;
      Ok(())
    },

    Commands::Export { output_dir, force } => {
      let written = nbconv_templates::export_templates(output_dir, *force)
        .wrap_err_with(|| {
          format!("Failed to export templates to {}", output_dir.display())
        })?;
      info!(
        "Exported {} templates to {}",
        written.len(),
        output_dir.display()
      );
      Ok(())
    },

    Commands::Convert(args) => convert(&cli, args),
  }
}

/// Convert one notebook and write the document and its resources.
fn convert(cli: &Cli, args: &ConvertArgs) -> Result<()> {
  let mut config = Config::load(&cli.config_files, &cli.config_overrides)?;
  args.apply_to(&mut config);

  let mut converter = Converter::new(config.to_converter_options())?;
  converter
    .read(&args.input)
    .wrap_err_with(|| format!("Failed to read {}", args.input.display()))?;
  let (text, resources) = converter
    .convert()
    .wrap_err_with(|| format!("Failed to convert {}", args.input.display()))?;

  output::write_document(&text, args.output.as_deref())?;
  output::write_resources(&resources, &config.output_dir)?;
  Ok(())
}
