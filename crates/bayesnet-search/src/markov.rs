//! Markov-blanket repair around a target node.

use tracing::{debug, instrument, warn};

use crate::{network::Network, parent_set::MAX_PARENT_CARDINALITY};

/// Arcs added (and nodes left out) by [`markov_blanket_correction`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MarkovCorrection {
    /// Arcs added, as `(tail, head)`.
    pub added: Vec<(usize, usize)>,
    /// Ancestors of the target that could not become its parents without
    /// exceeding [`MAX_PARENT_CARDINALITY`].
    pub skipped: Vec<usize>,
}

/// Return every node from which `target` can be reached, `target` included.
///
/// Computed as a fixed point of one-level backward expansion from
/// `{target}`. Membership is indexed by node.
#[must_use]
pub fn ancestors(network: &Network, target: usize) -> Vec<bool> {
    let mut member = vec![false; network.n_nodes()];
    let mut found = vec![target];
    member[target] = true;

    let mut old_size = 0;
    while old_size != found.len() {
        old_size = found.len();
        for i in 0..old_size {
            for &parent in network.parents(found[i]) {
                if !member[parent] {
                    member[parent] = true;
                    found.push(parent);
                }
            }
        }
    }
    member
}

/// Return `true` when `node` is in the Markov blanket of `target`: it is the
/// target, a parent, a child, or shares a child with the target.
#[must_use]
pub fn in_markov_blanket(network: &Network, target: usize, node: usize) -> bool {
    node == target
        || network.is_arc(target, node)
        || network.is_arc(node, target)
        || (0..network.n_nodes()).any(|child| {
            let set = network.parent_set(child);
            set.contains(node) && set.contains(target)
        })
}

/// Add arcs so that every node lies in the Markov blanket of `target`.
///
/// A node outside the blanket that is an ancestor of the target becomes a
/// parent of the target, unless that pushes the target's parent
/// cardinality above [`MAX_PARENT_CARDINALITY`]; such nodes are skipped,
/// since the opposite arc would close a cycle. Every other node outside the
/// blanket gets the target as a parent. Ancestry is computed once, before
/// any arc is added.
#[instrument(skip(network), fields(n_nodes = network.n_nodes()))]
pub fn markov_blanket_correction(network: &mut Network, target: usize) -> MarkovCorrection {
    let ancestor = ancestors(network, target);
    let mut correction = MarkovCorrection::default();

    for node in 0..network.n_nodes() {
        if in_markov_blanket(network, target, node) {
            continue;
        }
        if ancestor[node] {
            let after = network
                .parent_set(target)
                .cardinality_of_parents()
                .saturating_mul(network.cardinality(node));
            if after <= MAX_PARENT_CARDINALITY {
                network.add_parent(target, node);
                correction.added.push((node, target));
            } else {
                warn!(node, target, after, "parent cardinality cap reached, node left outside blanket");
                correction.skipped.push(node);
            }
        } else {
            network.add_parent(node, target);
            correction.added.push((target, node));
        }
    }

    debug!(
        added = correction.added.len(),
        skipped = correction.skipped.len(),
        "markov blanket correction done"
    );
    correction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestors_follow_parent_chains() {
        // 3 -> 1 -> 0, 2 -> 1, 4 isolated
        let mut net = Network::new(vec![2; 5]);
        net.add_arc(0, 1).unwrap();
        net.add_arc(1, 3).unwrap();
        net.add_arc(1, 2).unwrap();
        let anc = ancestors(&net, 0);
        assert_eq!(anc, vec![true, true, true, true, false]);
    }

    #[test]
    fn blanket_membership_rules() {
        // 0 -> T(1), T -> 2, 3 -> 2 (co-parent), 4 unrelated
        let mut net = Network::new(vec![2; 5]);
        net.add_arc(1, 0).unwrap();
        net.add_arc(2, 1).unwrap();
        net.add_arc(2, 3).unwrap();
        assert!(in_markov_blanket(&net, 1, 1));
        assert!(in_markov_blanket(&net, 1, 0));
        assert!(in_markov_blanket(&net, 1, 2));
        assert!(in_markov_blanket(&net, 1, 3));
        assert!(!in_markov_blanket(&net, 1, 4));
    }

    #[test]
    fn ancestor_becomes_parent_of_target() {
        // 0 -> 1 -> T(2): 0 is an ancestor outside the blanket.
        let mut net = Network::new(vec![2; 3]);
        net.add_arc(1, 0).unwrap();
        net.add_arc(2, 1).unwrap();
        let correction = markov_blanket_correction(&mut net, 2);
        assert_eq!(correction.added, vec![(0, 2)]);
        assert!(net.is_arc(2, 0));
        assert!(net.is_acyclic());
    }

    #[test]
    fn non_ancestor_gets_target_as_parent() {
        // T(0) -> 1 -> 2: 2 is a descendant outside the blanket.
        let mut net = Network::new(vec![2; 3]);
        net.add_arc(1, 0).unwrap();
        net.add_arc(2, 1).unwrap();
        let correction = markov_blanket_correction(&mut net, 0);
        assert_eq!(correction.added, vec![(0, 2)]);
        assert!(net.is_arc(2, 0));
        for node in 0..3 {
            assert!(in_markov_blanket(&net, 0, node));
        }
    }

    #[test]
    fn cap_skips_ancestor() {
        // Target 0 already has parents worth 32 * 32 = 1024 configurations;
        // the grandparent 3 cannot join.
        let mut net = Network::new(vec![2, 32, 32, 2]);
        net.add_arc(0, 1).unwrap();
        net.add_arc(0, 2).unwrap();
        net.add_arc(1, 3).unwrap();
        let correction = markov_blanket_correction(&mut net, 0);
        assert_eq!(correction.skipped, vec![3]);
        assert!(correction.added.is_empty());
        assert!(!in_markov_blanket(&net, 0, 3));
        assert!(net.is_acyclic());
    }

    #[test]
    fn isolated_nodes_attach_as_children() {
        let mut net = Network::new(vec![2; 4]);
        markov_blanket_correction(&mut net, 3);
        for node in 0..3 {
            assert!(net.is_arc(node, 3));
        }
        assert!(net.is_acyclic());
    }
}
