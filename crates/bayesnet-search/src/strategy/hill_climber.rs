use tracing::{debug, info, instrument};

use super::{SearchContext, SearchStrategy};
use crate::{SearchError, network::Network, score::LocalScore};

/// Greedy local search over single-arc edits.
///
/// Each step evaluates every legal arc addition, every arc deletion, and
/// (optionally) every legal arc reversal, applies the one with the largest
/// score improvement, and stops when no edit improves the score. Score
/// deltas are cached per ordered node pair and refreshed only for the nodes
/// an applied edit touches.
///
/// # Defaults
///
/// | Parameter          | Default |
/// |--------------------|---------|
/// | `max_parents`      | 2       |
/// | `use_arc_reversal` | `false` |
#[derive(Debug, Clone)]
pub struct HillClimber {
    pub(crate) max_parents: usize,
    pub(crate) use_arc_reversal: bool,
}

impl HillClimber {
    /// Create a hill climber with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_parents: 2,
            use_arc_reversal: false,
        }
    }

    /// Set the maximum number of parents per node.
    #[must_use]
    pub fn with_max_parents(mut self, max_parents: usize) -> Self {
        self.max_parents = max_parents;
        self
    }

    /// Also consider reversing existing arcs.
    #[must_use]
    pub fn with_arc_reversal(mut self, use_arc_reversal: bool) -> Self {
        self.use_arc_reversal = use_arc_reversal;
        self
    }

    /// Return the maximum number of parents per node.
    #[must_use]
    pub fn max_parents(&self) -> usize {
        self.max_parents
    }

    /// Return whether arc reversal is considered.
    #[must_use]
    pub fn use_arc_reversal(&self) -> bool {
        self.use_arc_reversal
    }

    pub(crate) fn validate(&self) -> Result<(), SearchError> {
        if self.max_parents == 0 {
            return Err(SearchError::InvalidMaxParents { max_parents: 0 });
        }
        Ok(())
    }

    fn best_operation(&self, network: &Network, cache: &DeltaCache) -> Option<(Operation, f64)> {
        let n_nodes = network.n_nodes();
        let mut best: Option<(Operation, f64)> = None;
        let mut consider = |op: Operation, delta: f64| {
            if best.is_none_or(|(_, d)| delta > d) {
                best = Some((op, delta));
            }
        };

        for head in 0..n_nodes {
            if network.parents(head).len() < self.max_parents {
                for tail in 0..n_nodes {
                    if network.can_add_arc(head, tail) {
                        consider(Operation::Add { head, tail }, cache.add(head, tail));
                    }
                }
            }
        }

        for head in 0..n_nodes {
            for &tail in network.parents(head) {
                consider(Operation::Delete { head, tail }, cache.delete(head, tail));
            }
        }

        if self.use_arc_reversal {
            for head in 0..n_nodes {
                for &tail in network.parents(head) {
                    if network.parents(tail).len() < self.max_parents
                        && network.can_reverse_arc(head, tail)
                    {
                        // Delete tail -> head, add head -> tail.
                        let delta = cache.delete(head, tail) + cache.add(tail, head);
                        consider(Operation::Reverse { head, tail }, delta);
                    }
                }
            }
        }

        best
    }
}

impl Default for HillClimber {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchStrategy for HillClimber {
    fn name(&self) -> &'static str {
        "hill-climber"
    }

    #[instrument(skip_all, fields(max_parents = self.max_parents, reversal = self.use_arc_reversal))]
    fn search(&self, network: &mut Network, ctx: &SearchContext<'_>) -> Result<(), SearchError> {
        let mut cache = DeltaCache::new(network, ctx.score)?;
        let mut steps = 0usize;

        while let Some((op, delta)) = self.best_operation(network, &cache) {
            if delta <= 0.0 {
                break;
            }
            debug!(?op, delta, "applying operation");
            match op {
                Operation::Add { head, tail } => {
                    network.add_parent(head, tail);
                    cache.refresh(network, ctx.score, head)?;
                }
                Operation::Delete { head, tail } => {
                    network.delete_arc(head, tail)?;
                    cache.refresh(network, ctx.score, head)?;
                }
                Operation::Reverse { head, tail } => {
                    network.delete_arc(head, tail)?;
                    network.add_parent(tail, head);
                    cache.refresh(network, ctx.score, head)?;
                    cache.refresh(network, ctx.score, tail)?;
                }
            }
            steps += 1;
        }

        info!(steps, n_arcs = network.n_arcs(), "hill climbing converged");
        Ok(())
    }
}

/// A single-arc edit, described by the arc `tail -> head` it acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Add { head: usize, tail: usize },
    Delete { head: usize, tail: usize },
    Reverse { head: usize, tail: usize },
}

/// Score change of adding or deleting each arc, indexed `[tail * n + head]`.
struct DeltaCache {
    n_nodes: usize,
    add: Vec<f64>,
    delete: Vec<f64>,
}

impl DeltaCache {
    fn new(network: &Network, score: &dyn LocalScore) -> Result<Self, SearchError> {
        let n_nodes = network.n_nodes();
        let mut cache = Self {
            n_nodes,
            add: vec![0.0; n_nodes * n_nodes],
            delete: vec![0.0; n_nodes * n_nodes],
        };
        for head in 0..n_nodes {
            cache.refresh(network, score, head)?;
        }
        Ok(cache)
    }

    fn add(&self, head: usize, tail: usize) -> f64 {
        self.add[tail * self.n_nodes + head]
    }

    fn delete(&self, head: usize, tail: usize) -> f64 {
        self.delete[tail * self.n_nodes + head]
    }

    /// Recompute every delta whose arc ends in `head`.
    fn refresh(
        &mut self,
        network: &Network,
        score: &dyn LocalScore,
        head: usize,
    ) -> Result<(), SearchError> {
        let parents = network.parents(head);
        let base = score.node_score(head, parents)?;
        for tail in 0..self.n_nodes {
            if tail == head {
                continue;
            }
            let cell = tail * self.n_nodes + head;
            if parents.contains(&tail) {
                self.delete[cell] = score.score_with_missing_parent(head, parents, tail)? - base;
            } else {
                self.add[cell] = score.score_with_extra_parent(head, parents, tail)? - base;
            }
        }
        Ok(())
    }
}
