//! Expose nbconv's CLI internals for use in testing and tooling. The library
//! API of the converter lives in `nbconv-render`.
pub mod cli;
pub mod output;
