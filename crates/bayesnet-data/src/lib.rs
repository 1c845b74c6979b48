//! Discrete tabular datasets for Bayesian network learning.
//!
//! Provides nominal [`Attribute`] schemas, a validated row-major [`Dataset`]
//! with per-row weights and a designated class attribute, and the
//! [`DatasetBuilder`] used to assemble one.

mod attribute;
mod dataset;
mod error;

pub use attribute::Attribute;
pub use dataset::{Dataset, DatasetBuilder};
pub use error::DataError;
