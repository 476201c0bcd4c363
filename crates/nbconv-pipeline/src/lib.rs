//! Preprocessing pipeline applied to a notebook before rendering.
//!
//! A [`Pipeline`] runs an ordered list of [`CellTransform`]s over every cell
//! of every worksheet. Transforms thread a [`FigureStore`] through the run,
//! which collects payloads pulled out of the tree (see [`ExtractFigures`]).
//! [`DisplayPriority`] picks the representation a template should render for
//! an output.

pub mod error;
pub mod figures;
pub mod pipeline;
pub mod priority;
pub mod transform;

pub use error::TransformError;
pub use figures::{FigureData, FigureStore, ResourceMap, figure_name};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use priority::{DEFAULT_DISPLAY_PRIORITY, DisplayPriority};
pub use transform::{
  AnnotateOutputFlag,
  BUILTIN_TRANSFORMS,
  CellTransform,
  CoalesceStreams,
  ExtractFigures,
  FnTransform,
  builtin,
  from_fn,
};
