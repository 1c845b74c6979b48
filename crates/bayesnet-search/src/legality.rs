//! Arc legality checks.
//!
//! Every check runs a full topological-ordering attempt over the whole
//! network with the proposed edit applied virtually: the network itself is
//! only read. A cycle through any number of nodes makes the edit illegal.

use crate::network::Network;

/// The edit a legality check evaluates on top of the current network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VirtualEdit {
    None,
    /// `tail` becomes an extra parent of `head`.
    Add { head: usize, tail: usize },
    /// The arc `tail -> head` becomes `head -> tail`.
    Reverse { head: usize, tail: usize },
}

impl VirtualEdit {
    /// Parent added to `node` by the edit, if any.
    fn extra_parent(self, node: usize) -> Option<usize> {
        match self {
            VirtualEdit::None => None,
            VirtualEdit::Add { head, tail } => (node == head).then_some(tail),
            VirtualEdit::Reverse { head, tail } => (node == tail).then_some(head),
        }
    }

    /// Whether the existing arc `parent -> node` is removed by the edit.
    fn removes(self, node: usize, parent: usize) -> bool {
        matches!(self, VirtualEdit::Reverse { head, tail } if node == head && parent == tail)
    }
}

/// Return `true` when `tail` is a parent of `head`. Out-of-range nodes
/// are never connected.
#[must_use]
pub fn is_arc(network: &Network, head: usize, tail: usize) -> bool {
    head < network.n_nodes() && network.parents(head).contains(&tail)
}

fn in_range(network: &Network, head: usize, tail: usize) -> bool {
    head < network.n_nodes() && tail < network.n_nodes()
}

/// Return `true` when the arc `tail -> head` can be added: the endpoints
/// differ, the arc is not already present, and the resulting graph is
/// acyclic. Out-of-range endpoints are never legal.
#[must_use]
pub fn can_add_arc(network: &Network, head: usize, tail: usize) -> bool {
    if !in_range(network, head, tail) || head == tail || is_arc(network, head, tail) {
        return false;
    }
    ordering_succeeds(network, VirtualEdit::Add { head, tail })
}

/// Return `true` when the existing arc `tail -> head` can be turned into
/// `head -> tail` without creating a cycle. Returns `false` when there is no
/// such arc.
#[must_use]
pub fn can_reverse_arc(network: &Network, head: usize, tail: usize) -> bool {
    if !in_range(network, head, tail) || head == tail || !is_arc(network, head, tail) {
        return false;
    }
    ordering_succeeds(network, VirtualEdit::Reverse { head, tail })
}

/// Return a topological order of the network (parents before children), or
/// `None` when it contains a cycle.
#[must_use]
pub fn topological_order(network: &Network) -> Option<Vec<usize>> {
    order_with(network, VirtualEdit::None)
}

fn ordering_succeeds(network: &Network, edit: VirtualEdit) -> bool {
    order_with(network, edit).is_some()
}

/// Repeatedly order the first unordered node whose parents are all ordered.
/// A pass that orders nothing means the remaining nodes lie on or behind a
/// cycle.
fn order_with(network: &Network, edit: VirtualEdit) -> Option<Vec<usize>> {
    let n_nodes = network.n_nodes();
    let mut done = vec![false; n_nodes];
    let mut order = Vec::with_capacity(n_nodes);

    for _ in 0..n_nodes {
        let ready = (0..n_nodes).find(|&node| {
            !done[node]
                && network
                    .parents(node)
                    .iter()
                    .all(|&p| done[p] || edit.removes(node, p))
                && edit.extra_parent(node).is_none_or(|p| done[p])
        })?;
        done[ready] = true;
        order.push(ready);
    }
    Some(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: usize = 0;
    const B: usize = 1;
    const CLASS: usize = 2;

    /// A and B each with the class as sole parent.
    fn naive_bayes() -> Network {
        let mut net = Network::new(vec![2, 2, 2]);
        net.add_parent(A, CLASS);
        net.add_parent(B, CLASS);
        net
    }

    #[test]
    fn self_arc_never_legal() {
        let net = naive_bayes();
        for node in 0..3 {
            assert!(!can_add_arc(&net, node, node));
            assert!(!can_reverse_arc(&net, node, node));
        }
    }

    #[test]
    fn existing_arc_cannot_be_added_again() {
        let net = naive_bayes();
        assert!(is_arc(&net, A, CLASS));
        assert!(!can_add_arc(&net, A, CLASS));
    }

    #[test]
    fn naive_bayes_scenario() {
        let mut net = naive_bayes();

        // B -> A on top of Class -> A, Class -> B stays acyclic.
        assert!(can_add_arc(&net, A, B));
        net.add_parent(A, B);

        // A -> B would close A -> B -> A.
        assert!(!can_add_arc(&net, B, A));
        // B -> A reversed gives A -> B with Class -> {A, B}: acyclic.
        assert!(can_reverse_arc(&net, A, B));
        // A -> Class closes Class -> A -> Class.
        assert!(!can_add_arc(&net, CLASS, A));
        // B -> Class closes Class -> B -> Class.
        assert!(!can_add_arc(&net, CLASS, B));
        // Reversing Class -> A gives A -> Class, but Class -> B -> A remains.
        assert!(!can_reverse_arc(&net, A, CLASS));
        // Reversing Class -> B gives B -> Class with B -> A and Class -> A: acyclic.
        assert!(can_reverse_arc(&net, B, CLASS));
    }

    #[test]
    fn reverse_requires_existing_arc() {
        let net = naive_bayes();
        assert!(!is_arc(&net, A, B));
        assert!(!can_reverse_arc(&net, A, B));
        assert!(!can_reverse_arc(&net, CLASS, A));
    }

    #[test]
    fn checks_leave_network_untouched() {
        let mut net = naive_bayes();
        net.add_parent(A, B);
        let before = net.clone();
        for head in 0..3 {
            for tail in 0..3 {
                let _ = can_add_arc(&net, head, tail);
                let _ = can_reverse_arc(&net, head, tail);
            }
        }
        assert_eq!(net, before);
    }

    #[test]
    fn long_cycle_detected() {
        // 0 -> 1 -> 2 -> 3; adding 3 -> 0 closes a four-node cycle that no
        // endpoint-local check would see.
        let mut net = Network::new(vec![2; 4]);
        net.add_parent(1, 0);
        net.add_parent(2, 1);
        net.add_parent(3, 2);
        assert!(!can_add_arc(&net, 0, 3));
        assert!(can_add_arc(&net, 3, 0));
    }

    #[test]
    fn reversal_blocked_by_alternative_path() {
        // 0 -> 1 -> 2 and 0 -> 2: reversing 0 -> 2 gives 2 -> 0 -> 1 -> 2.
        let mut net = Network::new(vec![2; 3]);
        net.add_parent(1, 0);
        net.add_parent(2, 1);
        net.add_parent(2, 0);
        assert!(!can_reverse_arc(&net, 2, 0));
        // The other two reversals leave 0 -> 2 as the only long path.
        assert!(can_reverse_arc(&net, 1, 0));
        assert!(can_reverse_arc(&net, 2, 1));
    }

    #[test]
    fn topological_order_puts_parents_first() {
        let mut net = Network::new(vec![2; 4]);
        net.add_parent(0, 3);
        net.add_parent(1, 0);
        net.add_parent(2, 1);
        let order = topological_order(&net).unwrap();
        let position = |n: usize| order.iter().position(|&x| x == n).unwrap();
        assert!(position(3) < position(0));
        assert!(position(0) < position(1));
        assert!(position(1) < position(2));
    }

    #[test]
    fn empty_network_is_acyclic() {
        let net = Network::new(Vec::new());
        assert_eq!(topological_order(&net), Some(Vec::new()));
    }

    #[test]
    fn out_of_range_nodes_are_never_legal() {
        let net = naive_bayes();
        assert!(!is_arc(&net, 3, 0));
        assert!(!is_arc(&net, 0, 7));
        assert!(!can_add_arc(&net, 3, 0));
        assert!(!can_add_arc(&net, 0, 3));
        assert!(!can_reverse_arc(&net, 3, 2));
        assert!(!can_reverse_arc(&net, 0, usize::MAX));
    }
}
