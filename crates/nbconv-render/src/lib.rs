//! Rendering of preprocessed notebooks through templates.
//!
//! [`Converter`] ties the pieces together: it reads a notebook, runs the
//! preprocessing [`Pipeline`](nbconv_pipeline::Pipeline), and renders the
//! result with `tera`. Templates come from a user directory or from the
//! embedded set, in the syntax of a [`TemplateEnvironment`].

pub mod converter;
pub mod environment;
pub mod error;
pub mod filters;
pub mod includes;

pub use converter::{Converter, ConverterOptions, ConverterState};
pub use environment::{TemplateEnvironment, translate_tex_delimiters};
pub use error::ConvertError;
pub use filters::{Filter, FilterSet};
pub use includes::StaticIncludes;
