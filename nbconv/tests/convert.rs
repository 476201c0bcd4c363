#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]
use std::fs;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::Parser;
use nbconv::{
  cli::{Cli, Commands},
  output,
};
use nbconv_config::Config;
use nbconv_render::Converter;
use serde_json::json;
use tempfile::tempdir;

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 13, 10];

/// Run `nbconv convert` the way the binary does, minus logging setup.
fn run(args: &[&str]) -> String {
  let cli = Cli::try_parse_from(args).expect("valid arguments");
  let Commands::Convert(ref convert) = cli.command else {
    panic!("expected convert");
  };

  let mut config =
    Config::load(&cli.config_files, &cli.config_overrides).expect("config");
  convert.apply_to(&mut config);

  let mut converter =
    Converter::new(config.to_converter_options()).expect("converter");
  converter.read(&convert.input).expect("read");
  let (text, resources) = converter.convert().expect("convert");

  output::write_document(&text, convert.output.as_deref()).expect("write");
  output::write_resources(&resources, &config.output_dir)
    .expect("write resources");
  text
}

#[test]
fn convert_writes_document_and_figures() {
  let dir = tempdir().expect("tempdir");
  let input = dir.path().join("plots.ipynb");
  let notebook = json!({
    "nbformat": 3,
    "nbformat_minor": 0,
    "metadata": {"name": "plots"},
    "worksheets": [{"cells": [
      {
        "cell_type": "code",
        "language": "python",
        "input": "plot()",
        "prompt_number": 1,
        "outputs": [{
          "output_type": "display_data",
          "png": STANDARD.encode(PNG_BYTES),
          "text": "<Figure>"
        }]
      }
    ]}]
  });
  fs::write(&input, notebook.to_string()).expect("write notebook");

  let out = dir.path().join("site/plots.tex");
  let figures = dir.path().join("site/figures");
  let config_file = dir.path().join("nbconv.toml");
  fs::write(&config_file, "environment = \"tex\"\n").expect("write config");

  let text = run(&[
    "nbconv",
    "-c",
    config_file.to_str().expect("utf-8 path"),
    "convert",
    input.to_str().expect("utf-8 path"),
    "--extract-figures",
    "-o",
    out.to_str().expect("utf-8 path"),
    "--resources-dir",
    figures.to_str().expect("utf-8 path"),
  ]);

  assert!(text.contains(r"\includegraphics[width=0.8\textwidth]{_fig_00.png}"));
  assert_eq!(fs::read_to_string(&out).expect("read output"), text);
  assert_eq!(
    fs::read(figures.join("_fig_00.png")).expect("read figure"),
    PNG_BYTES
  );
}

#[test]
fn python_template_from_override() {
  let dir = tempdir().expect("tempdir");
  let input = dir.path().join("script.ipynb");
  let notebook = json!({
    "nbformat": 4,
    "nbformat_minor": 2,
    "metadata": {},
    "cells": [
      {"cell_type": "markdown", "metadata": {}, "source": ["Adds numbers"]},
      {
        "cell_type": "code",
        "metadata": {},
        "execution_count": 2,
        "source": ["1 + 1"],
        "outputs": []
      }
    ]
  });
  fs::write(&input, notebook.to_string()).expect("write notebook");
  let out = dir.path().join("script.py");

  let text = run(&[
    "nbconv",
    "--config",
    "template=python",
    "convert",
    input.to_str().expect("utf-8 path"),
    "-o",
    out.to_str().expect("utf-8 path"),
    "--resources-dir",
    dir.path().join("unused").to_str().expect("utf-8 path"),
  ]);

  assert!(text.starts_with("# coding: utf-8"));
  assert!(text.contains("# Adds numbers"));
  assert!(text.contains("# In[2]:\n\n1 + 1"));
  assert!(!dir.path().join("unused").exists());
}
