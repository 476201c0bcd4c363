//! In-memory notebook tree used by the nbconv pipeline.
//!
//! A [`Notebook`] is an ordered list of [`Worksheet`]s, each an ordered list
//! of [`Cell`]s. Code cells carry [`Output`]s, which map output kinds such as
//! `png` or `text` to their payloads.
//!
//! ```rust
//! use nbconv_notebook::read_str;
//!
//! let nb = read_str(
//!   r##"{"nbformat": 3, "nbformat_minor": 0, "metadata": {},
//!      "worksheets": [{"cells": [{"cell_type": "markdown", "source": "# Hi"}]}]}"##,
//! )
//! .expect("valid notebook");
//! assert_eq!(nb.cell_count(), 1);
//! ```

pub mod error;
pub mod model;
pub mod reader;

pub use error::LoadError;
pub use model::{
  Cell,
  CodeCell,
  HeadingCell,
  Notebook,
  Output,
  OutputType,
  TextCell,
  Worksheet,
};
pub use reader::{from_value, read_path, read_str};
