//! Locality: navigating the containment structure around a node.
//!
//! All results come back in canonical order and are empty when the
//! relation is undefined for the given node.

use crate::api::Api;
use crate::compute::sort_by_rank;
use crate::Node;

/// The `L` namespace.
pub struct Locality<'a> {
    api: &'a Api,
}

impl<'a> Locality<'a> {
    pub(crate) fn new(api: &'a Api) -> Self {
        Self { api }
    }

    fn filtered(&self, nodes: &[Node], otype: Option<&str>) -> Vec<Node> {
        match otype {
            None => nodes.to_vec(),
            Some(wanted) => nodes
                .iter()
                .copied()
                .filter(|&n| self.api.otype().v(n) == Some(wanted))
                .collect(),
        }
    }

    /// Embedders of `node`: every node whose slot set strictly contains
    /// `node`'s, optionally restricted to one type.
    pub fn u(&self, node: Node, otype: Option<&str>) -> Vec<Node> {
        if node == 0 {
            return Vec::new();
        }
        self.filtered(self.api.c().lev_up.row((node - 1) as usize), otype)
    }

    /// Embeddees of `node`: every node whose slot set is strictly
    /// contained in `node`'s.
    pub fn d(&self, node: Node, otype: Option<&str>) -> Vec<Node> {
        if node == 0 {
            return Vec::new();
        }
        self.filtered(self.api.c().lev_down.row((node - 1) as usize), otype)
    }

    /// Neighbors of `node`: every other node sharing at least one slot.
    pub fn n(&self, node: Node, otype: Option<&str>) -> Vec<Node> {
        let oslots = self.api.oslots();
        let mut out: Vec<Node> = Vec::new();
        for &slot in &*oslots.s(node) {
            if slot != node {
                out.push(slot);
            }
            for &m in oslots.t(slot) {
                if m != node {
                    out.push(m);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        sort_by_rank(&mut out, self.api.c().rank.as_slice());
        match otype {
            None => out,
            Some(_) => self.filtered(&out, otype),
        }
    }

    /// Nodes ending immediately before `node` starts, at the same type
    /// level unless another type is requested.
    pub fn p(&self, node: Node, otype: Option<&str>) -> Vec<Node> {
        let Some(first) = self.api.oslots().first_slot(node) else {
            return Vec::new();
        };
        if first <= 1 {
            return Vec::new();
        }
        let candidates = self.api.c().boundary_last.row((first - 2) as usize);
        let wanted = otype.or_else(|| self.api.otype().v(node));
        self.filtered(candidates, wanted)
    }

    /// Nodes starting immediately after `node` ends, at the same type
    /// level unless another type is requested.
    pub fn x(&self, node: Node, otype: Option<&str>) -> Vec<Node> {
        let Some(last) = self.api.oslots().last_slot(node) else {
            return Vec::new();
        };
        if last >= self.api.max_slot() {
            return Vec::new();
        }
        let candidates = self.api.c().boundary_first.row(last as usize);
        let wanted = otype.or_else(|| self.api.otype().v(node));
        self.filtered(candidates, wanted)
    }
}
