//! Edge feature views: forward and inverse adjacency with optional
//! per-edge values.

use crate::collections::{Csr, CsrValues, StringPool};
use crate::features::Value;
use crate::storage::FeatureMeta;
use crate::Node;

/// Value column slice of one adjacency row.
pub struct ValuesView<'a> {
    ints: Option<&'a [i64]>,
    str_ids: Option<&'a [u32]>,
    pool: Option<&'a StringPool>,
}

impl<'a> ValuesView<'a> {
    pub fn len(&self) -> usize {
        self.ints
            .map(<[i64]>::len)
            .or(self.str_ids.map(<[u32]>::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value<'a>> {
        if let Some(ints) = self.ints {
            return ints.get(index).map(|&i| Value::Int(i));
        }
        let id = *self.str_ids?.get(index)?;
        self.pool?.get(id).map(Value::Str)
    }

    pub fn iter(&self) -> impl Iterator<Item = Value<'a>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// A directed, optionally valued edge feature. Both directions are CSRs
/// with one row per node; the inverse is the exact transpose of the
/// forward direction, values included.
#[derive(Debug)]
pub struct EdgeFeature {
    name: String,
    meta: FeatureMeta,
    forward: Csr,
    inverse: Csr,
    pool: Option<StringPool>,
}

impl EdgeFeature {
    pub fn new(
        name: impl Into<String>,
        meta: FeatureMeta,
        forward: Csr,
        inverse: Csr,
        pool: Option<StringPool>,
    ) -> Self {
        Self {
            name: name.into(),
            meta,
            forward,
            inverse,
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta(&self) -> &FeatureMeta {
        &self.meta
    }

    pub fn has_values(&self) -> bool {
        self.forward.has_values()
    }

    fn row(csr: &Csr, node: Node) -> &[u32] {
        if node == 0 {
            &[]
        } else {
            csr.row((node - 1) as usize)
        }
    }

    fn row_with_values<'a>(
        &'a self,
        csr: &'a Csr,
        node: Node,
    ) -> (&'a [u32], ValuesView<'a>) {
        let empty = ValuesView {
            ints: None,
            str_ids: None,
            pool: None,
        };
        if node == 0 {
            return (&[], empty);
        }
        let row_index = (node - 1) as usize;
        match csr.values_ref() {
            Some(CsrValues::Int(_)) => match csr.row_with_int_values(row_index) {
                Some((row, ints)) => (
                    row,
                    ValuesView {
                        ints: Some(ints),
                        str_ids: None,
                        pool: None,
                    },
                ),
                None => (&[], empty),
            },
            Some(CsrValues::StrIds(_)) => match csr.row_with_str_ids(row_index) {
                Some((row, ids)) => (
                    row,
                    ValuesView {
                        ints: None,
                        str_ids: Some(ids),
                        pool: self.pool.as_ref(),
                    },
                ),
                None => (&[], empty),
            },
            None => (Self::row(csr, node), empty),
        }
    }

    /// Edges leaving `node`, targets sorted ascending.
    pub fn f(&self, node: Node) -> &[u32] {
        Self::row(&self.forward, node)
    }

    /// Edges arriving at `node`, sources sorted ascending.
    pub fn t(&self, node: Node) -> &[u32] {
        Self::row(&self.inverse, node)
    }

    pub fn f_with_values(&self, node: Node) -> (&[u32], ValuesView<'_>) {
        self.row_with_values(&self.forward, node)
    }

    pub fn t_with_values(&self, node: Node) -> (&[u32], ValuesView<'_>) {
        self.row_with_values(&self.inverse, node)
    }

    /// Symmetric neighborhood: union of `f` and `t`, sorted ascending.
    pub fn b(&self, node: Node) -> Vec<Node> {
        let (f, t) = (self.f(node), self.t(node));
        let mut out = Vec::with_capacity(f.len() + t.len());
        let (mut i, mut j) = (0, 0);
        while i < f.len() || j < t.len() {
            let next = match (f.get(i), t.get(j)) {
                (Some(&a), Some(&b)) if a == b => {
                    i += 1;
                    j += 1;
                    a
                }
                (Some(&a), Some(&b)) if a < b => {
                    i += 1;
                    a
                }
                (Some(_), Some(&b)) => {
                    j += 1;
                    b
                }
                (Some(&a), None) => {
                    i += 1;
                    a
                }
                (None, Some(&b)) => {
                    j += 1;
                    b
                }
                (None, None) => break,
            };
            if out.last() != Some(&next) {
                out.push(next);
            }
        }
        out
    }

    pub fn total_edges(&self) -> usize {
        self.forward.total_entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{CsrBuilder, StringPoolBuilder};
    use crate::storage::ValueKind;

    fn meta() -> FeatureMeta {
        FeatureMeta {
            name: "parent".into(),
            value_type: ValueKind::Str,
            is_edge: true,
            edge_values: true,
            meta: Default::default(),
        }
    }

    /// Edges (2,4,"head") and (3,4,"mod") over 4 nodes.
    fn sample() -> EdgeFeature {
        let mut pool = StringPoolBuilder::new();
        let head = pool.intern("head");
        let modifier = pool.intern("mod");

        let mut forward = CsrBuilder::with_str_ids();
        forward.push_row_with_str(&[], &[]);
        forward.push_row_with_str(&[4], &[head]);
        forward.push_row_with_str(&[4], &[modifier]);
        forward.push_row_with_str(&[], &[]);
        let forward = forward.finish();
        let inverse = forward.transpose(4, 1);
        EdgeFeature::new("parent", meta(), forward, inverse, Some(pool.finish()))
    }

    #[test]
    fn test_forward_and_inverse() {
        let edge = sample();
        assert_eq!(edge.f(2), &[4]);
        assert_eq!(edge.f(4), &[] as &[u32]);
        assert_eq!(edge.t(4), &[2, 3]);
        assert_eq!(edge.t(1), &[] as &[u32]);
    }

    #[test]
    fn test_values_travel_both_directions() {
        let edge = sample();
        let (targets, values) = edge.f_with_values(2);
        assert_eq!(targets, &[4]);
        assert_eq!(values.get(0), Some(Value::Str("head")));

        let (sources, values) = edge.t_with_values(4);
        assert_eq!(sources, &[2, 3]);
        let collected: Vec<_> = values.iter().collect();
        assert_eq!(collected, vec![Value::Str("head"), Value::Str("mod")]);
    }

    #[test]
    fn test_symmetric_neighborhood() {
        let edge = sample();
        assert_eq!(edge.b(4), vec![2, 3]);
        assert_eq!(edge.b(2), vec![4]);
        assert_eq!(edge.b(1), Vec::<u32>::new());
    }
}
