//! Configuration builder for AD-tree construction.

use bayesnet_data::Dataset;

use crate::tree::AdTree;

/// Configuration for building an [`AdTree`].
///
/// # Defaults
///
/// | Parameter        | Default |
/// |------------------|---------|
/// | `leaf_threshold` | 16      |
#[derive(Debug, Clone)]
pub struct AdTreeConfig {
    pub(crate) leaf_threshold: usize,
}

impl AdTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self { leaf_threshold: 16 }
    }

    /// Set the largest partition size stored as a leaf.
    ///
    /// Partitions with at most `leaf_threshold` records keep their value
    /// tuples and are counted by scanning; larger partitions are split into
    /// vary nodes. `0` stores only empty partitions as leaves.
    #[must_use]
    pub fn with_leaf_threshold(mut self, leaf_threshold: usize) -> Self {
        self.leaf_threshold = leaf_threshold;
        self
    }

    /// Return the leaf threshold.
    #[must_use]
    pub fn leaf_threshold(&self) -> usize {
        self.leaf_threshold
    }

    /// Build an AD-tree over every row of `data`.
    #[must_use]
    pub fn build(&self, data: &Dataset) -> AdTree {
        AdTree::build(data, self)
    }
}

impl Default for AdTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}
