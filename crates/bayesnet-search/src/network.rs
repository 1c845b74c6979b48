//! Directed graph of per-node parent sets.

use bayesnet_data::Dataset;

use crate::{SearchError, legality, parent_set::ParentSet};

/// A Bayesian network structure: one [`ParentSet`] per attribute.
///
/// Arcs are written `tail -> head` (the tail is a parent of the head).
/// The validated mutators ([`Network::add_arc`], [`Network::reverse_arc`])
/// keep the graph acyclic; [`Network::add_parent`] is the unchecked
/// primitive for callers that have already established legality.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Network {
    cardinalities: Vec<usize>,
    parent_sets: Vec<ParentSet>,
}

impl Network {
    /// Create an arc-free network over attributes with the given cardinalities.
    #[must_use]
    pub fn new(cardinalities: Vec<usize>) -> Self {
        let parent_sets = vec![ParentSet::new(); cardinalities.len()];
        Self {
            cardinalities,
            parent_sets,
        }
    }

    /// Create an arc-free network over the attributes of `data`.
    #[must_use]
    pub fn for_dataset(data: &Dataset) -> Self {
        Self::new(data.cardinalities())
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.parent_sets.len()
    }

    /// Return the cardinality of `node`.
    #[must_use]
    pub fn cardinality(&self, node: usize) -> usize {
        self.cardinalities[node]
    }

    /// Return every node's cardinality.
    #[must_use]
    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    /// Return the parent set of `node`.
    #[must_use]
    pub fn parent_set(&self, node: usize) -> &ParentSet {
        &self.parent_sets[node]
    }

    /// Return the parents of `node` in insertion order.
    #[must_use]
    pub fn parents(&self, node: usize) -> &[usize] {
        self.parent_sets[node].parents()
    }

    /// Append `tail` to the parents of `head` without any legality check.
    pub fn add_parent(&mut self, head: usize, tail: usize) {
        debug_assert_ne!(head, tail, "self-loop on node {head}");
        let cardinality = self.cardinalities[tail];
        self.parent_sets[head].add_parent(tail, cardinality);
    }

    /// Remove the most recently added parent of `head`.
    pub fn delete_last_parent(&mut self, head: usize) -> Option<usize> {
        self.parent_sets[head].delete_last_parent()
    }

    /// Add the arc `tail -> head` after checking it keeps the graph acyclic.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::NodeOutOfRange`] | either endpoint is not a node |
    /// | [`SearchError::SelfLoop`] | `head == tail` |
    /// | [`SearchError::IllegalArc`] | the arc exists or would close a cycle |
    pub fn add_arc(&mut self, head: usize, tail: usize) -> Result<(), SearchError> {
        self.check_node(head)?;
        self.check_node(tail)?;
        if head == tail {
            return Err(SearchError::SelfLoop { node: head });
        }
        if !legality::can_add_arc(self, head, tail) {
            return Err(SearchError::IllegalArc { head, tail });
        }
        self.add_parent(head, tail);
        Ok(())
    }

    /// Remove the arc `tail -> head`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::NodeOutOfRange`] | either endpoint is not a node |
    /// | [`SearchError::NotAnArc`] | there is no such arc |
    pub fn delete_arc(&mut self, head: usize, tail: usize) -> Result<(), SearchError> {
        self.check_node(head)?;
        self.check_node(tail)?;
        if !self.parent_sets[head].delete_parent(tail) {
            return Err(SearchError::NotAnArc { head, tail });
        }
        Ok(())
    }

    /// Turn the arc `tail -> head` into `head -> tail`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::NodeOutOfRange`] | either endpoint is not a node |
    /// | [`SearchError::NotAnArc`] | there is no such arc |
    /// | [`SearchError::IllegalArc`] | the reversed arc would close a cycle |
    pub fn reverse_arc(&mut self, head: usize, tail: usize) -> Result<(), SearchError> {
        self.check_node(head)?;
        self.check_node(tail)?;
        if !legality::is_arc(self, head, tail) {
            return Err(SearchError::NotAnArc { head, tail });
        }
        if !legality::can_reverse_arc(self, head, tail) {
            return Err(SearchError::IllegalArc { head, tail });
        }
        self.parent_sets[head].delete_parent(tail);
        self.add_parent(tail, head);
        Ok(())
    }

    /// Return `true` when `tail` is a parent of `head`.
    #[must_use]
    pub fn is_arc(&self, head: usize, tail: usize) -> bool {
        legality::is_arc(self, head, tail)
    }

    /// See [`legality::can_add_arc`].
    #[must_use]
    pub fn can_add_arc(&self, head: usize, tail: usize) -> bool {
        legality::can_add_arc(self, head, tail)
    }

    /// See [`legality::can_reverse_arc`].
    #[must_use]
    pub fn can_reverse_arc(&self, head: usize, tail: usize) -> bool {
        legality::can_reverse_arc(self, head, tail)
    }

    /// Return every arc as `(tail, head)`, grouped by head in node order.
    #[must_use]
    pub fn arcs(&self) -> Vec<(usize, usize)> {
        self.parent_sets
            .iter()
            .enumerate()
            .flat_map(|(head, set)| set.parents().iter().map(move |&tail| (tail, head)))
            .collect()
    }

    /// Return the number of arcs.
    #[must_use]
    pub fn n_arcs(&self) -> usize {
        self.parent_sets.iter().map(ParentSet::len).sum()
    }

    /// Return a parents-first ordering of the nodes, or `None` on a cycle.
    #[must_use]
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        legality::topological_order(self)
    }

    /// Return `true` when the graph has no directed cycle.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_some()
    }

    /// Remove every arc.
    pub fn clear(&mut self) {
        self.parent_sets.iter_mut().for_each(ParentSet::clear);
    }

    /// Replace every parent set with those of `other`.
    pub(crate) fn copy_parent_sets_from(&mut self, other: &Network) {
        debug_assert_eq!(self.n_nodes(), other.n_nodes());
        self.parent_sets.clone_from(&other.parent_sets);
    }

    fn check_node(&self, node: usize) -> Result<(), SearchError> {
        if node >= self.n_nodes() {
            return Err(SearchError::NodeOutOfRange {
                node,
                n_nodes: self.n_nodes(),
            });
        }
        Ok(())
    }
}
