use std::ops::Range;

use bayesnet_data::Dataset;
use tracing::{debug, instrument};

use crate::{
    AdTreeConfig, AdTreeError,
    counts::{CountSource, validate_attributes, validate_buffer},
    node::{AdNode, NodeIndex, VaryNode},
};

/// An all-dimensions tree of cached counts over a dataset.
///
/// Stored as an arena-based `Vec<AdNode>`; the root is index 0. Built once
/// and read-only afterwards, it holds no reference to the source dataset.
#[derive(Debug, Clone)]
pub struct AdTree {
    nodes: Vec<AdNode>,
    cardinalities: Vec<usize>,
    leaf_threshold: usize,
}

impl AdTree {
    /// Build the tree over every row of `data`.
    ///
    /// Attributes are processed in schema order starting at index 0.
    #[instrument(skip(data, config), fields(n_rows = data.n_rows(), n_attributes = data.n_attributes()))]
    pub fn build(data: &Dataset, config: &AdTreeConfig) -> Self {
        let mut builder = Builder {
            data,
            leaf_threshold: config.leaf_threshold,
            arena: Vec::new(),
            scratch: (0..data.n_rows()).collect(),
        };
        let root = builder.build_node(0..data.n_rows(), 0);
        debug_assert_eq!(root.index(), 0);

        let tree = Self {
            nodes: builder.arena,
            cardinalities: data.cardinalities(),
            leaf_threshold: config.leaf_threshold,
        };
        debug!(
            n_nodes = tree.nodes.len(),
            n_leaves = tree.n_leaves(),
            "ad-tree built"
        );
        tree
    }

    /// Return the total weight of all rows.
    #[must_use]
    pub fn total_count(&self) -> f64 {
        self.nodes[0].count()
    }

    /// Return the number of nodes in the arena.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return `true` when the whole dataset was small enough to be one leaf.
    #[must_use]
    pub fn root_is_leaf(&self) -> bool {
        self.nodes[0].is_leaf()
    }

    /// Return the leaf threshold the tree was built with.
    #[must_use]
    pub fn leaf_threshold(&self) -> usize {
        self.leaf_threshold
    }

    /// Accumulate counts for a query into `counts`.
    ///
    /// `nodes` lists strictly ascending attribute indices and `offsets[i]` is
    /// the stride of `nodes[i]` in `counts`. Each matching record's weight is
    /// added to (or, with `subtract`, removed from) the cell
    /// `Σ offsets[i] · value(nodes[i])`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AdTreeError::AttributeOutOfRange`] | an index in `nodes` is unknown |
    /// | [`AdTreeError::DuplicateAttribute`] | an index repeats |
    /// | [`AdTreeError::NotAscending`] | `nodes` is not strictly ascending |
    /// | [`AdTreeError::OffsetCountMismatch`] | `offsets.len() != nodes.len()` |
    /// | [`AdTreeError::CountBufferTooSmall`] | `counts` cannot hold every addressed cell |
    pub fn get_counts(
        &self,
        counts: &mut [f64],
        nodes: &[usize],
        offsets: &[usize],
        subtract: bool,
    ) -> Result<(), AdTreeError> {
        validate_attributes(&self.cardinalities, nodes)?;
        if let Some(position) = nodes.windows(2).position(|w| w[0] >= w[1]) {
            return Err(AdTreeError::NotAscending {
                position: position + 1,
            });
        }
        validate_buffer(&self.cardinalities, nodes, offsets, counts.len())?;
        let query = Query {
            nodes,
            offsets,
        };
        self.node_counts(NodeIndex::new(0), counts, &query, 0, 0, subtract);
        Ok(())
    }

    fn node_counts(
        &self,
        index: NodeIndex,
        counts: &mut [f64],
        query: &Query<'_>,
        depth: usize,
        offset: usize,
        subtract: bool,
    ) {
        let node = &self.nodes[index.index()];
        if depth >= query.nodes.len() {
            accumulate(&mut counts[offset], node.count(), subtract);
            return;
        }
        match node {
            AdNode::Branch {
                start_attribute,
                vary,
                ..
            } => {
                let vary_node = &vary[query.nodes[depth] - start_attribute];
                self.vary_counts(vary_node, index, counts, query, depth, offset, subtract);
            }
            AdNode::Leaf {
                start_attribute,
                values,
                weights,
                ..
            } => {
                let width = self.cardinalities.len() - start_attribute;
                for (tuple, &weight) in values.chunks_exact(width.max(1)).zip(weights) {
                    let cell = query.nodes[depth..]
                        .iter()
                        .zip(&query.offsets[depth..])
                        .fold(offset, |acc, (&a, &o)| acc + o * tuple[a - start_attribute]);
                    accumulate(&mut counts[cell], weight, subtract);
                }
            }
        }
    }

    /// Walk one vary node. The MCV cell is the parent's restricted counts
    /// minus every materialized sibling's.
    #[allow(clippy::too_many_arguments)]
    fn vary_counts(
        &self,
        vary: &VaryNode,
        parent: NodeIndex,
        counts: &mut [f64],
        query: &Query<'_>,
        depth: usize,
        offset: usize,
        subtract: bool,
    ) {
        let stride = query.offsets[depth];
        for (value, child) in vary.children.iter().enumerate() {
            let child_offset = offset + stride * value;
            if value != vary.mcv {
                if let Some(child) = child {
                    self.node_counts(*child, counts, query, depth + 1, child_offset, subtract);
                }
                continue;
            }
            self.node_counts(parent, counts, query, depth + 1, child_offset, subtract);
            for (sibling_value, sibling) in vary.children.iter().enumerate() {
                if sibling_value == vary.mcv {
                    continue;
                }
                if let Some(sibling) = sibling {
                    self.node_counts(*sibling, counts, query, depth + 1, child_offset, !subtract);
                }
            }
        }
    }
}

impl CountSource for AdTree {
    fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    /// Sorts the query by attribute index (carrying strides along) before
    /// walking the tree, so any attribute order is accepted.
    fn add_counts(
        &self,
        counts: &mut [f64],
        attributes: &[usize],
        offsets: &[usize],
    ) -> Result<(), AdTreeError> {
        validate_attributes(&self.cardinalities, attributes)?;
        if attributes.len() != offsets.len() {
            return Err(AdTreeError::OffsetCountMismatch {
                nodes: attributes.len(),
                offsets: offsets.len(),
            });
        }
        let mut pairs: Vec<(usize, usize)> = attributes
            .iter()
            .copied()
            .zip(offsets.iter().copied())
            .collect();
        pairs.sort_unstable_by_key(|&(a, _)| a);
        let (nodes, sorted_offsets): (Vec<usize>, Vec<usize>) = pairs.into_iter().unzip();
        self.get_counts(counts, &nodes, &sorted_offsets, false)
    }
}

fn accumulate(cell: &mut f64, weight: f64, subtract: bool) {
    if subtract {
        *cell -= weight;
    } else {
        *cell += weight;
    }
}

struct Query<'q> {
    nodes: &'q [usize],
    offsets: &'q [usize],
}

/// Construction state: the node arena plus a stack-like scratch arena of
/// record indices. Every partition is a range of `scratch`; vary nodes
/// counting-sort their partition onto the top of the stack and pop it again
/// once their children are built.
struct Builder<'a> {
    data: &'a Dataset,
    leaf_threshold: usize,
    arena: Vec<AdNode>,
    scratch: Vec<usize>,
}

impl Builder<'_> {
    fn build_node(&mut self, records: Range<usize>, start_attribute: usize) -> NodeIndex {
        let count: f64 = self.scratch[records.clone()]
            .iter()
            .map(|&r| self.data.weight(r))
            .sum();

        if records.len() <= self.leaf_threshold {
            let mut values = Vec::with_capacity(
                records.len() * (self.data.n_attributes() - start_attribute),
            );
            let mut weights = Vec::with_capacity(records.len());
            for &r in &self.scratch[records] {
                values.extend_from_slice(&self.data.row(r)[start_attribute..]);
                weights.push(self.data.weight(r));
            }
            let idx = self.arena.len();
            self.arena.push(AdNode::Leaf {
                count,
                start_attribute,
                values,
                weights,
            });
            return NodeIndex::new(idx);
        }

        // Reserve the slot first so the node index precedes its children.
        let node_idx = self.arena.len();
        self.arena.push(AdNode::Branch {
            count,
            start_attribute,
            vary: Vec::new(),
        });

        let vary: Vec<VaryNode> = (start_attribute..self.data.n_attributes())
            .map(|attribute| self.build_vary(records.clone(), attribute))
            .collect();

        self.arena[node_idx] = AdNode::Branch {
            count,
            start_attribute,
            vary,
        };
        NodeIndex::new(node_idx)
    }

    fn build_vary(&mut self, records: Range<usize>, attribute: usize) -> VaryNode {
        let cardinality = self.data.cardinality(attribute);

        let mut sizes = vec![0usize; cardinality];
        for &r in &self.scratch[records.clone()] {
            sizes[self.data.value(r, attribute)] += 1;
        }

        // Most common value; the lowest index wins ties.
        let mut mcv = 0usize;
        for (value, &size) in sizes.iter().enumerate().skip(1) {
            if size > sizes[mcv] {
                mcv = value;
            }
        }

        let mut starts = vec![0usize; cardinality];
        for value in 1..cardinality {
            starts[value] = starts[value - 1] + sizes[value - 1];
        }

        let base = self.scratch.len();
        self.scratch.resize(base + records.len(), 0);
        let mut cursor = starts.clone();
        for k in records {
            let r = self.scratch[k];
            let value = self.data.value(r, attribute);
            self.scratch[base + cursor[value]] = r;
            cursor[value] += 1;
        }

        let mut children = Vec::with_capacity(cardinality);
        for value in 0..cardinality {
            if value == mcv || sizes[value] == 0 {
                children.push(None);
                continue;
            }
            let range = base + starts[value]..base + starts[value] + sizes[value];
            children.push(Some(self.build_node(range, attribute + 1)));
        }

        self.scratch.truncate(base);
        VaryNode { mcv, children }
    }
}

#[cfg(test)]
mod tests {
    use bayesnet_data::{Attribute, DatasetBuilder};

    use super::*;
    use crate::ScanCounter;

    fn dataset(rows: &[[usize; 3]]) -> Dataset {
        let attrs = vec![
            Attribute::with_cardinality("a", 2).unwrap(),
            Attribute::with_cardinality("b", 3).unwrap(),
            Attribute::with_cardinality("c", 2).unwrap(),
        ];
        let mut builder = DatasetBuilder::new(attrs).unwrap();
        for row in rows {
            builder.push_row(row).unwrap();
        }
        builder.build()
    }

    fn sample_rows() -> Vec<[usize; 3]> {
        vec![
            [0, 0, 0],
            [0, 1, 1],
            [1, 2, 0],
            [1, 2, 1],
            [0, 0, 1],
            [1, 1, 0],
            [0, 2, 0],
            [1, 0, 1],
            [0, 0, 0],
        ]
    }

    fn leaf_free() -> AdTreeConfig {
        AdTreeConfig::new().with_leaf_threshold(0)
    }

    #[test]
    fn total_count_matches_rows() {
        let data = dataset(&sample_rows());
        let tree = leaf_free().build(&data);
        assert_eq!(tree.total_count(), 9.0);
        assert_eq!(tree.counts(&[]).unwrap(), vec![9.0]);
    }

    #[test]
    fn single_attribute_marginal_uses_mcv_subtraction() {
        let data = dataset(&sample_rows());
        let tree = leaf_free().build(&data);
        // a: five 0s (MCV, implicit) and four 1s.
        assert_eq!(tree.counts(&[0]).unwrap(), vec![5.0, 4.0]);
        // b: 0 x4, 1 x2, 2 x3.
        assert_eq!(tree.counts(&[1]).unwrap(), vec![4.0, 2.0, 3.0]);
    }

    #[test]
    fn joint_counts_match_scan() {
        let data = dataset(&sample_rows());
        let scan = ScanCounter::new(&data);
        for threshold in [0, 1, 2, 4, 100] {
            let tree = AdTreeConfig::new().with_leaf_threshold(threshold).build(&data);
            for query in [vec![0, 1], vec![1, 2], vec![0, 2], vec![0, 1, 2], vec![2, 0]] {
                assert_eq!(
                    tree.counts(&query).unwrap(),
                    scan.counts(&query).unwrap(),
                    "threshold {threshold}, query {query:?}"
                );
            }
        }
    }

    #[test]
    fn subtract_mode_negates_counts() {
        let data = dataset(&sample_rows());
        let tree = leaf_free().build(&data);
        let mut counts = vec![0.0; 6];
        tree.get_counts(&mut counts, &[0, 1], &[3, 1], false).unwrap();
        tree.get_counts(&mut counts, &[0, 1], &[3, 1], true).unwrap();
        assert!(counts.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn count_delta_between_queries() {
        // Joint over (a, c) minus the same query restricted to b's layout is
        // expressible as add followed by subtract into one buffer.
        let data = dataset(&sample_rows());
        let tree = leaf_free().build(&data);
        let mut counts = vec![0.0; 2];
        tree.get_counts(&mut counts, &[0], &[1], false).unwrap();
        tree.get_counts(&mut counts, &[2], &[1], true).unwrap();
        // a = [5, 4], c = [5, 4]
        assert_eq!(counts, vec![0.0, 0.0]);
    }

    #[test]
    fn weighted_rows_accumulate_weights() {
        let attrs = vec![
            Attribute::with_cardinality("a", 2).unwrap(),
            Attribute::with_cardinality("b", 2).unwrap(),
        ];
        let mut builder = DatasetBuilder::new(attrs).unwrap();
        builder.push_weighted_row(&[0, 0], 0.5).unwrap();
        builder.push_weighted_row(&[0, 1], 1.5).unwrap();
        builder.push_weighted_row(&[1, 1], 2.0).unwrap();
        builder.push_weighted_row(&[0, 1], 0.25).unwrap();
        let data = builder.build();
        let tree = leaf_free().build(&data);
        assert_eq!(tree.counts(&[0, 1]).unwrap(), vec![0.5, 1.75, 0.0, 2.0]);
    }

    #[test]
    fn not_ascending_rejected() {
        let data = dataset(&sample_rows());
        let tree = leaf_free().build(&data);
        let mut counts = vec![0.0; 6];
        let err = tree.get_counts(&mut counts, &[1, 0], &[1, 3], false).unwrap_err();
        assert!(matches!(err, AdTreeError::NotAscending { position: 1 }));
    }

    #[test]
    fn offset_mismatch_rejected() {
        let data = dataset(&sample_rows());
        let tree = leaf_free().build(&data);
        let mut counts = vec![0.0; 6];
        let err = tree.get_counts(&mut counts, &[0, 1], &[3], false).unwrap_err();
        assert!(matches!(
            err,
            AdTreeError::OffsetCountMismatch { nodes: 2, offsets: 1 }
        ));
    }

    #[test]
    fn empty_dataset_builds_single_leaf() {
        let data = dataset(&[]);
        let tree = leaf_free().build(&data);
        assert!(tree.root_is_leaf());
        assert_eq!(tree.counts(&[0, 2]).unwrap(), vec![0.0; 4]);
    }

    #[test]
    fn leaf_threshold_boundary() {
        let rows = sample_rows();
        let threshold = 4;
        let config = AdTreeConfig::new().with_leaf_threshold(threshold);

        let below = config.build(&dataset(&rows[..threshold - 1]));
        assert!(below.root_is_leaf());
        assert_eq!(below.n_nodes(), 1);

        let at = config.build(&dataset(&rows[..threshold]));
        assert!(at.root_is_leaf());
        assert_eq!(at.n_nodes(), 1);

        let above = config.build(&dataset(&rows[..threshold + 1]));
        assert!(!above.root_is_leaf());
        assert!(above.n_nodes() > 1);
    }

    #[test]
    fn mcv_children_are_not_materialized() {
        // Every row identical: each vary node's only value is the MCV.
        let data = dataset(&[[1, 2, 0]; 5]);
        let tree = leaf_free().build(&data);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.counts(&[0, 1, 2]).unwrap()[3 * 2 + 2 * 2], 5.0);
    }
}
