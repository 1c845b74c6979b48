use std::fmt;

/// Index into the AD-tree node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the AD-tree arena.
///
/// Both variants cover the records that agree on the attribute values fixed
/// along the path from the root; `start_attribute` is the first attribute
/// that is still free.
#[derive(Debug, Clone)]
pub(crate) enum AdNode {
    /// A small partition kept verbatim.
    Leaf {
        /// Total weight of the records in the partition.
        count: f64,
        start_attribute: usize,
        /// Row-major values of attributes `start_attribute..`, one tuple per record.
        values: Vec<usize>,
        /// Weight of each stored record.
        weights: Vec<f64>,
    },
    /// A partition split by every free attribute.
    Branch {
        /// Total weight of the records in the partition.
        count: f64,
        start_attribute: usize,
        /// `vary[i]` splits on attribute `start_attribute + i`.
        vary: Vec<VaryNode>,
    },
}

impl AdNode {
    pub(crate) fn count(&self) -> f64 {
        match self {
            AdNode::Leaf { count, .. } | AdNode::Branch { count, .. } => *count,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, AdNode::Leaf { .. })
    }
}

/// Split of a partition by the values of one attribute.
///
/// The child for the most common value (MCV) is never materialized, nor are
/// children of values no record takes.
#[derive(Debug, Clone)]
pub(crate) struct VaryNode {
    pub(crate) mcv: usize,
    pub(crate) children: Vec<Option<NodeIndex>>,
}
