use std::mem;

use log::debug;
use nbconv_notebook::Notebook;

use crate::{
  error::TransformError,
  figures::FigureStore,
  transform::{AnnotateOutputFlag, CellTransform, ExtractFigures},
};

/// Ordered chain of cell transforms.
///
/// Transforms run one after another; each one visits every cell of every
/// worksheet in document order before the next one starts, so a later
/// transform can rely on annotations an earlier one added to all cells.
pub struct Pipeline {
  transforms: Vec<Box<dyn CellTransform>>,
}

impl Pipeline {
  /// The standard chain: [`AnnotateOutputFlag`], followed by
  /// [`ExtractFigures`] when `extract_figures` is set.
  #[must_use]
  pub fn new(extract_figures: bool) -> Self {
    Self::builder().extract_figures(extract_figures).build()
  }

  #[must_use]
  pub fn builder() -> PipelineBuilder {
    PipelineBuilder::default()
  }

  /// Names of the transforms in run order.
  #[must_use]
  pub fn names(&self) -> Vec<&str> {
    self.transforms.iter().map(|t| t.name()).collect()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.transforms.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.transforms.is_empty()
  }

  /// Run every transform over the notebook.
  ///
  /// Returns the transformed notebook together with the figure store the
  /// transforms filled. The store starts empty on every call, but transforms
  /// are not idempotent: processing an already processed notebook extracts
  /// figures a second time.
  ///
  /// # Errors
  ///
  /// Returns the first [`TransformError`] raised by a transform.
  pub fn process(
    &mut self,
    mut notebook: Notebook,
  ) -> Result<(Notebook, FigureStore), TransformError> {
    let mut figures = FigureStore::new();

    for transform in &mut self.transforms {
      debug!("Running transform {}", transform.name());
      for worksheet in &mut notebook.worksheets {
        let cells = mem::take(&mut worksheet.cells);
        let mut processed = Vec::with_capacity(cells.len());
        for (index, cell) in cells.into_iter().enumerate() {
          let (cell, next) = transform.apply(cell, figures, index)?;
          figures = next;
          processed.push(cell);
        }
        worksheet.cells = processed;
      }
    }

    debug!(
      "Pipeline finished: {} cells, {} extracted resources",
      notebook.cell_count(),
      figures.len()
    );
    Ok((notebook, figures))
  }
}

/// Builder for a [`Pipeline`] with caller-supplied transforms around the
/// standard ones.
#[derive(Default)]
pub struct PipelineBuilder {
  before:          Vec<Box<dyn CellTransform>>,
  extract_figures: bool,
  after:           Vec<Box<dyn CellTransform>>,
}

impl PipelineBuilder {
  /// Run `transform` before the standard transforms.
  ///
  /// Prepended transforms keep the order in which they were added.
  #[must_use]
  pub fn prepend(mut self, transform: Box<dyn CellTransform>) -> Self {
    self.before.push(transform);
    self
  }

  /// Run `transform` after the standard transforms.
  #[must_use]
  pub fn append(mut self, transform: Box<dyn CellTransform>) -> Self {
    self.after.push(transform);
    self
  }

  #[must_use]
  pub fn extract_figures(mut self, enabled: bool) -> Self {
    self.extract_figures = enabled;
    self
  }

  #[must_use]
  pub fn build(self) -> Pipeline {
    let mut transforms = self.before;
    transforms.push(Box::new(AnnotateOutputFlag));
    if self.extract_figures {
      transforms.push(Box::new(ExtractFigures));
    }
    transforms.extend(self.after);
    Pipeline { transforms }
  }
}
