use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use super::{SearchContext, SearchStrategy};
use crate::{SearchError, network::Network};

/// K2: greedy parent selection along a node ordering.
///
/// The ordering starts with the class followed by the other attributes in
/// schema order, optionally shuffled. Each node repeatedly adopts the
/// predecessor that most improves its local score, until nothing improves
/// or it has `max_parents` parents. Arcs always point forward in the
/// ordering.
///
/// # Defaults
///
/// | Parameter      | Default |
/// |----------------|---------|
/// | `max_parents`  | 1       |
/// | `random_order` | `false` |
/// | `seed`         | 1       |
#[derive(Debug, Clone)]
pub struct K2 {
    pub(crate) max_parents: usize,
    pub(crate) random_order: bool,
    pub(crate) seed: u64,
}

impl K2 {
    /// Create a K2 search with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_parents: 1,
            random_order: false,
            seed: 1,
        }
    }

    /// Set the maximum number of parents per node.
    #[must_use]
    pub fn with_max_parents(mut self, max_parents: usize) -> Self {
        self.max_parents = max_parents;
        self
    }

    /// Shuffle the node ordering before searching.
    #[must_use]
    pub fn with_random_order(mut self, random_order: bool) -> Self {
        self.random_order = random_order;
        self
    }

    /// Set the seed used to shuffle the ordering.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the maximum number of parents per node.
    #[must_use]
    pub fn max_parents(&self) -> usize {
        self.max_parents
    }

    /// Return whether the ordering is shuffled.
    #[must_use]
    pub fn random_order(&self) -> bool {
        self.random_order
    }

    /// Return the shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub(crate) fn validate(&self) -> Result<(), SearchError> {
        if self.max_parents == 0 {
            return Err(SearchError::InvalidMaxParents { max_parents: 0 });
        }
        Ok(())
    }

    /// Class first, then the remaining attributes in schema order.
    fn ordering(&self, n_nodes: usize, class_index: usize, keep_class_first: bool) -> Vec<usize> {
        let mut order = Vec::with_capacity(n_nodes);
        order.push(class_index);
        order.extend((0..n_nodes).filter(|&n| n != class_index));

        if self.random_order {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            let pinned = keep_class_first.then_some(0);
            for i in 0..n_nodes {
                let j = rng.gen_range(0..n_nodes);
                if Some(i) != pinned && Some(j) != pinned {
                    order.swap(i, j);
                }
            }
        }
        order
    }
}

impl Default for K2 {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchStrategy for K2 {
    fn name(&self) -> &'static str {
        "k2"
    }

    #[instrument(skip_all, fields(max_parents = self.max_parents))]
    fn search(&self, network: &mut Network, ctx: &SearchContext<'_>) -> Result<(), SearchError> {
        let n_nodes = network.n_nodes();
        let order = self.ordering(n_nodes, ctx.data.class_index(), ctx.init_as_naive_bayes);
        debug!(?order, "k2 ordering");

        for (position, &node) in order.iter().enumerate().skip(1) {
            let mut best_score = ctx.score.node_score(node, network.parents(node))?;
            while network.parents(node).len() < self.max_parents {
                let mut best_parent = None;
                for &candidate in &order[..position] {
                    if network.is_arc(node, candidate) {
                        continue;
                    }
                    let score =
                        ctx.score
                            .score_with_extra_parent(node, network.parents(node), candidate)?;
                    if score > best_score {
                        best_score = score;
                        best_parent = Some(candidate);
                    }
                }
                let Some(parent) = best_parent else {
                    break;
                };
                // Predecessors only, but the seed network may hold arcs that
                // point backwards in a shuffled ordering.
                if !network.can_add_arc(node, parent) {
                    break;
                }
                network.add_parent(node, parent);
                debug!(node, parent, score = best_score, "k2 added parent");
            }
        }
        Ok(())
    }
}
