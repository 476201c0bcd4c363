//! The converter: read, preprocess and render one notebook.
use std::{
  collections::BTreeMap,
  fmt,
  fs,
  mem,
  path::{Path, PathBuf},
};

use log::{debug, warn};
use nbconv_filters::Highlighter;
use nbconv_notebook::{Notebook, read_path};
use nbconv_pipeline::{
  DisplayPriority,
  FigureStore,
  Pipeline,
  ResourceMap,
  builtin,
};
use tera::{Context, Tera};
use walkdir::WalkDir;

use crate::{
  environment::TemplateEnvironment,
  error::ConvertError,
  filters::FilterSet,
  includes::StaticIncludes,
};

/// Shown in resolution errors for the templates compiled into the binary.
const EMBEDDED_ROOT: &str = "<embedded>";

/// Options a [`Converter`] is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConverterOptions {
  pub environment:      TemplateEnvironment,
  /// Template name without extension. Defaults to the environment's
  /// default template.
  pub template:         Option<String>,
  pub extract_figures:  bool,
  /// Defaults to the environment's default priority.
  pub display_priority: Option<Vec<String>>,
  /// Built-in optional transforms to run before the standard ones.
  pub transforms:       Vec<String>,
  pub template_dir:     Option<PathBuf>,
  /// Extra stylesheets inlined after the embedded one.
  pub stylesheets:      Vec<PathBuf>,
  pub highlight_theme:  Option<String>,
}

impl ConverterOptions {
  /// The template name with any extension of the environment removed.
  #[must_use]
  pub fn template_name(&self) -> &str {
    self.template.as_deref().map_or_else(
      || self.environment.default_template(),
      |name| {
        name
          .strip_suffix(self.environment.extension())
          .unwrap_or(name)
      },
    )
  }

  /// # Errors
  ///
  /// Returns [`ConvertError::Conversion`] if the configured priority is
  /// empty.
  pub fn priority(&self) -> Result<DisplayPriority, ConvertError> {
    match &self.display_priority {
      None => Ok(self.environment.default_priority()),
      Some(kinds) if kinds.is_empty() => {
        Err(ConvertError::Conversion(
          "Display priority must list at least one output kind".to_string(),
        ))
      },
      Some(kinds) => Ok(DisplayPriority::new(kinds.iter().cloned())),
    }
  }
}

/// Where a converter is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterState {
  Empty,
  Loaded,
  Processed,
  Converted,
}

impl fmt::Display for ConverterState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Empty => "empty",
      Self::Loaded => "loaded",
      Self::Processed => "processed",
      Self::Converted => "converted",
    };
    f.write_str(name)
  }
}

enum Phase {
  Empty,
  Loaded(Notebook),
  Processed(Notebook, FigureStore),
  Converted,
}

impl Phase {
  const fn state(&self) -> ConverterState {
    match self {
      Self::Empty => ConverterState::Empty,
      Self::Loaded(_) => ConverterState::Loaded,
      Self::Processed(..) => ConverterState::Processed,
      Self::Converted => ConverterState::Converted,
    }
  }
}

/// Converts a single notebook.
///
/// The phases run in order: [`read`](Self::read) or [`load`](Self::load),
/// then [`process`](Self::process), then [`convert`](Self::convert). Each
/// runs once; calling one out of order fails with
/// [`ConvertError::Conversion`] and leaves the converter as it was. Use a
/// fresh converter per notebook.
pub struct Converter {
  options:  ConverterOptions,
  pipeline: Pipeline,
  filters:  FilterSet,
  includes: StaticIncludes,
  phase:    Phase,
}

impl Converter {
  /// Build a converter, inlining the embedded stylesheet followed by the
  /// configured ones.
  ///
  /// # Errors
  ///
  /// Fails on an unknown transform name, an empty display priority or an
  /// unreadable stylesheet.
  pub fn new(options: ConverterOptions) -> Result<Self, ConvertError> {
    let includes =
      StaticIncludes::builtin().with_stylesheet_files(&options.stylesheets)?;
    Self::with_includes(options, includes)
  }

  /// Build a converter with caller-provided static includes.
  ///
  /// # Errors
  ///
  /// Fails on an unknown transform name or an empty display priority.
  pub fn with_includes(
    options: ConverterOptions,
    includes: StaticIncludes,
  ) -> Result<Self, ConvertError> {
    let priority = options.priority()?;

    let mut builder =
      Pipeline::builder().extract_figures(options.extract_figures);
    for name in &options.transforms {
      builder = builder.prepend(builtin(name)?);
    }

    let filters = FilterSet::new(
      options.environment,
      priority,
      Highlighter::new(options.highlight_theme.clone()),
    );

    Ok(Self {
      pipeline: builder.build(),
      filters,
      includes,
      phase: Phase::Empty,
      options,
    })
  }

  /// Replace the preprocessing pipeline, for callers with their own
  /// transforms.
  #[must_use]
  pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
    self.pipeline = pipeline;
    self
  }

  #[must_use]
  pub const fn options(&self) -> &ConverterOptions {
    &self.options
  }

  #[must_use]
  pub const fn filters(&self) -> &FilterSet {
    &self.filters
  }

  #[must_use]
  pub const fn state(&self) -> ConverterState {
    self.phase.state()
  }

  /// The notebook, once loaded and until converted.
  #[must_use]
  pub const fn notebook(&self) -> Option<&Notebook> {
    match &self.phase {
      Phase::Loaded(notebook) | Phase::Processed(notebook, _) => Some(notebook),
      Phase::Empty | Phase::Converted => None,
    }
  }

  /// Resources collected by [`process`](Self::process), until converted.
  #[must_use]
  pub const fn figures(&self) -> Option<&FigureStore> {
    match &self.phase {
      Phase::Processed(_, figures) => Some(figures),
      _ => None,
    }
  }

  fn expect_state(
    &self,
    operation: &str,
    expected: ConverterState,
  ) -> Result<(), ConvertError> {
    let state = self.state();
    if state == expected {
      Ok(())
    } else {
      Err(ConvertError::Conversion(format!(
        "Cannot {operation} a {state} converter"
      )))
    }
  }

  /// Read and parse the notebook at `path`.
  ///
  /// # Errors
  ///
  /// Fails if a notebook was already loaded or the file cannot be read as a
  /// notebook.
  pub fn read<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConvertError> {
    self.expect_state("read into", ConverterState::Empty)?;
    let notebook = read_path(path)?;
    self.phase = Phase::Loaded(notebook);
    Ok(())
  }

  /// Use an already built notebook.
  ///
  /// # Errors
  ///
  /// Fails if a notebook was already loaded.
  pub fn load(&mut self, notebook: Notebook) -> Result<(), ConvertError> {
    self.expect_state("load into", ConverterState::Empty)?;
    debug!(
      "Loaded notebook with {} worksheets",
      notebook.worksheets.len()
    );
    self.phase = Phase::Loaded(notebook);
    Ok(())
  }

  /// Run the preprocessing pipeline.
  ///
  /// # Errors
  ///
  /// Fails if no notebook is loaded or it was already processed, and with
  /// [`ConvertError::Transform`] if a transform fails. A failed transform
  /// leaves the converter empty.
  pub fn process(&mut self) -> Result<(), ConvertError> {
    self.expect_state("process", ConverterState::Loaded)?;
    let Phase::Loaded(notebook) = mem::replace(&mut self.phase, Phase::Empty)
    else {
      return Err(ConvertError::Conversion(
        "Converter lost its notebook".to_string(),
      ));
    };

    let (notebook, figures) = self.pipeline.process(notebook)?;
    self.phase = Phase::Processed(notebook, figures);
    Ok(())
  }

  /// Render the notebook through the selected template.
  ///
  /// Processes first if [`process`](Self::process) was not called. Returns
  /// the rendered text and hands the collected resources to the caller.
  ///
  /// # Errors
  ///
  /// Fails if no notebook is loaded or it was already converted, if the
  /// template cannot be found, or if rendering fails.
  pub fn convert(&mut self) -> Result<(String, ResourceMap), ConvertError> {
    if self.state() == ConverterState::Loaded {
      self.process()?;
    }
    self.expect_state("convert", ConverterState::Processed)?;

    let Phase::Processed(notebook, _) = &self.phase else {
      return Err(ConvertError::Conversion(
        "Converter lost its notebook".to_string(),
      ));
    };
    let output = self.render(notebook)?;

    let Phase::Processed(_, figures) =
      mem::replace(&mut self.phase, Phase::Converted)
    else {
      return Err(ConvertError::Conversion(
        "Converter lost its notebook".to_string(),
      ));
    };
    Ok((output, figures.into_resources()))
  }

  fn render(&self, notebook: &Notebook) -> Result<String, ConvertError> {
    let (tera, name) = self.engine()?;

    let mut context = Context::new();
    context.insert("nb", notebook);
    context.insert("inlining", &self.includes);

    debug!("Rendering with template {name}");
    Ok(tera.render(&name, &context)?)
  }

  /// Build a template engine holding every template visible to this
  /// converter and return it with the name of the selected template.
  fn engine(&self) -> Result<(Tera, String), ConvertError> {
    let environment = self.options.environment;
    let extension = environment.extension();
    let name = format!("{}{extension}", self.options.template_name());

    let mut sources: BTreeMap<String, String> =
      nbconv_templates::templates_with_extension(extension)
        .into_iter()
        .map(|(file, content)| (file.to_string(), content.to_string()))
        .collect();

    let mut searched = Vec::new();
    if let Some(dir) = &self.options.template_dir {
      let roots = environment.search_roots(dir);
      searched.extend(roots.iter().map(|root| root.display().to_string()));
      // Earlier roots win, so load them last.
      for root in roots.iter().rev() {
        for (file, content) in read_templates(root, extension)? {
          if sources.insert(file.clone(), content).is_some() {
            warn!(
              "Template {} overrides the embedded {file}",
              root.join(&file).display()
            );
          }
        }
      }
    }
    searched.push(EMBEDDED_ROOT.to_string());

    if !sources.contains_key(&name) {
      return Err(ConvertError::TemplateResolution { name, searched });
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(
      sources
        .iter()
        .map(|(file, content)| (file.as_str(), environment.prepare(content))),
    )?;
    self.filters.install(&mut tera);
    Ok((tera, name))
  }
}

/// Templates directly inside `root` with the given extension.
fn read_templates(
  root: &Path,
  extension: &str,
) -> Result<Vec<(String, String)>, ConvertError> {
  if !root.is_dir() {
    return Ok(Vec::new());
  }

  let mut templates = Vec::new();
  for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
    let entry = entry.map_err(|e| {
      ConvertError::Io(e.into_io_error().unwrap_or_else(|| {
        std::io::Error::other(format!("Failed to walk {}", root.display()))
      }))
    })?;
    let path = entry.path();
    let Some(file) = path.file_name().and_then(|f| f.to_str()) else {
      continue;
    };
    if !entry.file_type().is_file() || !file.ends_with(extension) {
      continue;
    }

    let content = fs::read_to_string(path).map_err(|source| {
      ConvertError::Read {
        path: path.to_path_buf(),
        source,
      }
    })?;
    debug!("Found template {}", path.display());
    templates.push((file.to_string(), content));
  }
  Ok(templates)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]
  use nbconv_notebook::{Cell, Worksheet};

  use super::*;

  fn notebook() -> Notebook {
    Notebook::new(vec![Worksheet::new(vec![Cell::markdown("*hi*")])])
  }

  #[test]
  fn test_template_name_defaults_per_environment() {
    let mut options = ConverterOptions::default();
    assert_eq!(options.template_name(), "full");
    options.environment = TemplateEnvironment::Tex;
    assert_eq!(options.template_name(), "article");
    options.template = Some("article.tplx".into());
    assert_eq!(options.template_name(), "article");
  }

  #[test]
  fn test_priority_defaults_per_environment() {
    let mut options = ConverterOptions::default();
    let standard = options.priority().expect("priority");
    assert_eq!(standard.kinds()[0], "html");

    options.environment = TemplateEnvironment::Tex;
    let tex = options.priority().expect("priority");
    assert_eq!(tex.kinds(), [
      "latex", "pdf", "png", "jpg", "jpeg", "svg", "text"
    ]);

    options.display_priority = Some(vec!["svg".into(), "text".into()]);
    let custom = options.priority().expect("priority");
    assert_eq!(custom.kinds(), ["svg", "text"]);
  }

  #[test]
  fn test_rejects_bad_options() {
    let options = ConverterOptions {
      display_priority: Some(Vec::new()),
      ..ConverterOptions::default()
    };
    assert!(matches!(
      Converter::new(options),
      Err(ConvertError::Conversion(_))
    ));

    let options = ConverterOptions {
      transforms: vec!["nope".into()],
      ..ConverterOptions::default()
    };
    assert!(matches!(
      Converter::new(options),
      Err(ConvertError::Transform(_))
    ));
  }

  #[test]
  fn test_phases_run_in_order() {
    let mut converter =
      Converter::new(ConverterOptions::default()).expect("converter");
    assert_eq!(converter.state(), ConverterState::Empty);
    assert!(converter.process().is_err());
    assert!(converter.convert().is_err());
    assert_eq!(converter.state(), ConverterState::Empty);

    converter.load(notebook()).expect("load");
    assert!(converter.load(notebook()).is_err());
    assert_eq!(converter.state(), ConverterState::Loaded);

    converter.process().expect("process");
    assert!(converter.process().is_err());
    assert_eq!(converter.state(), ConverterState::Processed);
    assert!(converter.figures().is_some());

    converter.convert().expect("convert");
    assert_eq!(converter.state(), ConverterState::Converted);
    assert!(converter.notebook().is_none());
    let err = converter.convert().expect_err("second convert");
    assert_eq!(
      err.to_string(),
      "Conversion error: Cannot convert a converted converter"
    );
  }

  #[test]
  fn test_convert_processes_loaded_notebook() {
    let mut converter =
      Converter::new(ConverterOptions::default()).expect("converter");
    converter.load(notebook()).expect("load");
    let (html, resources) = converter.convert().expect("convert");
    assert!(html.contains("<em>hi</em>"));
    assert!(resources.is_empty());
  }

  #[test]
  fn test_missing_template_lists_search_roots() {
    let options = ConverterOptions {
      template: Some("nope".into()),
      template_dir: Some(PathBuf::from("tpl")),
      ..ConverterOptions::default()
    };
    let mut converter = Converter::new(options).expect("converter");
    converter.load(notebook()).expect("load");

    let Err(ConvertError::TemplateResolution { name, searched }) =
      converter.convert()
    else {
      panic!("expected a resolution error");
    };
    assert_eq!(name, "nope.tpl");
    assert_eq!(searched, ["tpl", "tpl/skeleton", EMBEDDED_ROOT]);
    assert_eq!(converter.state(), ConverterState::Processed);
  }
}
