//! Node feature columns: a partial function from nodes to values.

use std::collections::HashMap;

use crate::collections::{Array, StringPool};
use crate::storage::FeatureMeta;
use crate::Node;

/// Sentinel in dense integer columns: no value recorded for the node.
pub const ABSENT_INT: i64 = i64::MIN;

/// A feature value. Absence is expressed by `Option`, not by a variant,
/// so an empty string stays a present value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value<'a> {
    Int(i64),
    Str(&'a str),
}

impl std::fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug)]
enum NodeData {
    Int(Array<i64>),
    Str { idx: Array<u32>, pool: StringPool },
}

/// A single node feature, integer- or string-valued. Columns are indexed
/// by `node - 1` over the full node range.
#[derive(Debug)]
pub struct NodeFeature {
    name: String,
    meta: FeatureMeta,
    data: NodeData,
}

impl NodeFeature {
    pub fn new_int(name: impl Into<String>, meta: FeatureMeta, values: Array<i64>) -> Self {
        Self {
            name: name.into(),
            meta,
            data: NodeData::Int(values),
        }
    }

    pub fn new_str(
        name: impl Into<String>,
        meta: FeatureMeta,
        idx: Array<u32>,
        pool: StringPool,
    ) -> Self {
        Self {
            name: name.into(),
            meta,
            data: NodeData::Str { idx, pool },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta(&self) -> &FeatureMeta {
        &self.meta
    }

    /// Value of a node, `None` when absent or out of range.
    pub fn v(&self, node: Node) -> Option<Value<'_>> {
        if node == 0 {
            return None;
        }
        match &self.data {
            NodeData::Int(values) => match values.get((node - 1) as usize)? {
                ABSENT_INT => None,
                value => Some(Value::Int(value)),
            },
            NodeData::Str { idx, pool } => match idx.get((node - 1) as usize)? {
                0 => None,
                id => pool.get(id).map(Value::Str),
            },
        }
    }

    pub fn v_str(&self, node: Node) -> Option<&str> {
        match self.v(node)? {
            Value::Str(s) => Some(s),
            Value::Int(_) => None,
        }
    }

    pub fn v_int(&self, node: Node) -> Option<i64> {
        match self.v(node)? {
            Value::Int(i) => Some(i),
            Value::Str(_) => None,
        }
    }

    fn node_count(&self) -> usize {
        match &self.data {
            NodeData::Int(values) => values.len(),
            NodeData::Str { idx, .. } => idx.len(),
        }
    }

    /// Fresh iterator over `(node, value)` pairs, node-ascending,
    /// skipping absent nodes.
    pub fn items(&self) -> impl Iterator<Item = (Node, Value<'_>)> {
        (1..=self.node_count() as u32).filter_map(move |node| Some((node, self.v(node)?)))
    }

    /// Value histogram, most frequent first, equal counts by value.
    pub fn freq_list(&self) -> Vec<(Value<'_>, usize)> {
        let mut list: Vec<(Value<'_>, usize)> = match &self.data {
            NodeData::Str { idx, pool } => {
                let mut counts = vec![0usize; pool.len()];
                for &id in idx.as_slice() {
                    if id != 0 {
                        if let Some(slot) = counts.get_mut(id as usize) {
                            *slot += 1;
                        }
                    }
                }
                counts
                    .iter()
                    .enumerate()
                    .filter(|&(_, &count)| count > 0)
                    .filter_map(|(id, &count)| {
                        pool.get(id as u32).map(|s| (Value::Str(s), count))
                    })
                    .collect()
            }
            NodeData::Int(values) => {
                let mut counts: HashMap<i64, usize> = HashMap::new();
                for &value in values.as_slice() {
                    if value != ABSENT_INT {
                        *counts.entry(value).or_default() += 1;
                    }
                }
                counts
                    .into_iter()
                    .map(|(value, count)| (Value::Int(value), count))
                    .collect()
            }
        };
        list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        list
    }
}
