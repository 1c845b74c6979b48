/// Upper bound on the parent-cardinality product used to stop runaway
/// parent accumulation during Markov-blanket correction.
pub const MAX_PARENT_CARDINALITY: usize = 1024;

/// The parents of one node, in the order they were added.
///
/// Tracks the product of the parent cardinalities (the number of parent
/// configurations, 1 for a root node). Legality is not checked here: callers
/// must have ruled out self-loops, duplicates, and cycles beforehand.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParentSet {
    parents: Vec<usize>,
    parent_cardinalities: Vec<usize>,
    cardinality_of_parents: usize,
}

impl ParentSet {
    /// Create an empty parent set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parents: Vec::new(),
            parent_cardinalities: Vec::new(),
            cardinality_of_parents: 1,
        }
    }

    /// Append `parent`, which takes `cardinality` values.
    pub fn add_parent(&mut self, parent: usize, cardinality: usize) {
        debug_assert!(!self.contains(parent), "duplicate parent {parent}");
        self.parents.push(parent);
        self.parent_cardinalities.push(cardinality);
        self.cardinality_of_parents = self.cardinality_of_parents.saturating_mul(cardinality);
    }

    /// Remove the most recently added parent and return it.
    pub fn delete_last_parent(&mut self) -> Option<usize> {
        let parent = self.parents.pop()?;
        self.parent_cardinalities.pop();
        self.recompute_cardinality();
        Some(parent)
    }

    /// Remove `parent`, keeping the order of the others. Returns `false` when
    /// it was not a parent.
    pub fn delete_parent(&mut self, parent: usize) -> bool {
        let Some(pos) = self.parents.iter().position(|&p| p == parent) else {
            return false;
        };
        self.parents.remove(pos);
        self.parent_cardinalities.remove(pos);
        self.recompute_cardinality();
        true
    }

    /// Return `true` when `node` is a parent.
    #[must_use]
    pub fn contains(&self, node: usize) -> bool {
        self.parents.contains(&node)
    }

    /// Return the `i`-th parent in insertion order.
    #[must_use]
    pub fn parent(&self, i: usize) -> Option<usize> {
        self.parents.get(i).copied()
    }

    /// Return all parents in insertion order.
    #[must_use]
    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    /// Return the number of parents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Return `true` when the node has no parents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Return the product of the parent cardinalities.
    #[must_use]
    pub fn cardinality_of_parents(&self) -> usize {
        self.cardinality_of_parents
    }

    /// Remove every parent.
    pub fn clear(&mut self) {
        self.parents.clear();
        self.parent_cardinalities.clear();
        self.cardinality_of_parents = 1;
    }

    // Recomputed rather than divided so a saturated product recovers.
    fn recompute_cardinality(&mut self) {
        self.cardinality_of_parents = self
            .parent_cardinalities
            .iter()
            .fold(1usize, |acc, &c| acc.saturating_mul(c));
    }
}

impl Default for ParentSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_unit_cardinality() {
        let set = ParentSet::new();
        assert!(set.is_empty());
        assert_eq!(set.cardinality_of_parents(), 1);
    }

    #[test]
    fn cardinality_tracks_adds_and_deletes() {
        let mut set = ParentSet::new();
        set.add_parent(3, 2);
        set.add_parent(5, 4);
        assert_eq!(set.cardinality_of_parents(), 8);
        assert_eq!(set.len(), 2);
        assert_eq!(set.parent(1), Some(5));

        assert_eq!(set.delete_last_parent(), Some(5));
        assert_eq!(set.cardinality_of_parents(), 2);
        assert!(!set.contains(5));
    }

    #[test]
    fn add_then_delete_last_is_identity() {
        let mut set = ParentSet::new();
        set.add_parent(1, 3);
        let before = set.clone();
        set.add_parent(2, 2);
        set.delete_last_parent();
        assert_eq!(set, before);
    }

    #[test]
    fn delete_parent_keeps_order() {
        let mut set = ParentSet::new();
        set.add_parent(0, 2);
        set.add_parent(4, 3);
        set.add_parent(7, 5);
        assert!(set.delete_parent(4));
        assert_eq!(set.parents(), &[0, 7]);
        assert_eq!(set.cardinality_of_parents(), 10);
        assert!(!set.delete_parent(4));
    }

    #[test]
    fn delete_last_on_empty_is_none() {
        let mut set = ParentSet::new();
        assert_eq!(set.delete_last_parent(), None);
        assert_eq!(set.cardinality_of_parents(), 1);
    }
}
