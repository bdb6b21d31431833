//! Node iteration in canonical order.

use crate::api::Api;
use crate::compute::sort_by_rank;
use crate::Node;

/// The `N` namespace: walking and comparing nodes.
pub struct Nodes<'a> {
    api: &'a Api,
}

impl<'a> Nodes<'a> {
    pub(crate) fn new(api: &'a Api) -> Self {
        Self { api }
    }

    /// Fresh, restartable iterator over all nodes, rank-ascending:
    /// enclosing nodes before enclosed ones, earlier before later.
    pub fn walk(&self) -> impl Iterator<Item = Node> + 'a {
        self.api.c().order.as_slice().iter().copied()
    }

    /// Nodes of one type only, rank-ascending.
    pub fn walk_type(&self, type_name: &str) -> Vec<Node> {
        match self.api.otype().s_interval(type_name) {
            Some((min, max)) => {
                let mut nodes: Vec<Node> = (min..=max).collect();
                self.sort(&mut nodes);
                nodes
            }
            None => Vec::new(),
        }
    }

    /// Whether `a` comes strictly before `b` in canonical order. False
    /// when either node is out of range.
    pub fn before(&self, a: Node, b: Node) -> bool {
        match (self.api.rank_of(a), self.api.rank_of(b)) {
            (Some(ra), Some(rb)) => ra < rb,
            _ => false,
        }
    }

    /// Sorts nodes in place into canonical order. Out-of-range ids are
    /// not meaningful to sort and must not be passed.
    pub fn sort(&self, nodes: &mut [Node]) {
        sort_by_rank(nodes, self.api.c().rank.as_slice());
    }
}
