//! AD-tree cached sufficient statistics for discrete datasets.
//!
//! An [`AdTree`] is built once over a [`Dataset`](bayesnet_data::Dataset)
//! and answers any contingency-table query (joint counts over a subset of
//! attributes) without rescanning the rows. Most-common values are left
//! implicit in every vary node and reconstructed by subtraction, which keeps
//! the tree sub-linear in size.
//!
//! The [`CountSource`] trait abstracts over count providers so callers can
//! switch between the tree and a plain row scan ([`ScanCounter`]).

mod config;
mod counts;
mod error;
mod node;
mod tree;

pub use config::AdTreeConfig;
pub use counts::{CountSource, ScanCounter, strides};
pub use error::AdTreeError;
pub use tree::AdTree;
