//! The node-type feature.
//!
//! Slots all share the corpus slot type and need no storage; composite
//! nodes carry a small type code into the type-name table. Nodes of one
//! type occupy a contiguous id range, which a single construction scan
//! turns into per-type `(min_node, max_node)` support.

use std::collections::HashMap;

use crate::collections::Array;
use crate::errors::{FabricError, Result};
use crate::Node;

#[derive(Debug)]
pub struct OtypeFeature {
    types: Vec<String>,
    codes: Array<u16>,
    /// Per type code: inclusive node interval.
    intervals: Vec<(Node, Node)>,
    by_name: HashMap<String, u16>,
    max_slot: u32,
    max_node: u32,
    slot_type: String,
}

impl OtypeFeature {
    pub fn new(
        types: Vec<String>,
        codes: Array<u16>,
        max_slot: u32,
        max_node: u32,
        slot_type: String,
    ) -> Result<Self> {
        if codes.len() != (max_node - max_slot) as usize {
            return Err(FabricError::InvariantViolation(format!(
                "otype has {} entries for {} composite nodes",
                codes.len(),
                max_node - max_slot
            )));
        }

        let mut intervals: Vec<Option<(Node, Node)>> = vec![None; types.len()];
        for (i, &code) in codes.as_slice().iter().enumerate() {
            let node = max_slot + 1 + i as u32;
            let entry = intervals.get_mut(code as usize).ok_or_else(|| {
                FabricError::InvariantViolation(format!(
                    "otype code {code} out of range for {} types",
                    types.len()
                ))
            })?;
            match entry {
                None => *entry = Some((node, node)),
                Some((_, max)) => {
                    if *max != node - 1 {
                        return Err(FabricError::InvariantViolation(format!(
                            "type '{}' is not contiguous at node {node}",
                            types[code as usize]
                        )));
                    }
                    *max = node;
                }
            }
        }
        let intervals = intervals
            .into_iter()
            .map(|iv| iv.unwrap_or((0, 0)))
            .collect();

        let by_name = types
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code as u16))
            .collect();

        Ok(Self {
            types,
            codes,
            intervals,
            by_name,
            max_slot,
            max_node,
            slot_type,
        })
    }

    pub fn max_slot(&self) -> u32 {
        self.max_slot
    }

    pub fn max_node(&self) -> u32 {
        self.max_node
    }

    pub fn slot_type(&self) -> &str {
        &self.slot_type
    }

    /// Type name of a node; `None` outside `1..=max_node`.
    pub fn v(&self, node: Node) -> Option<&str> {
        if node == 0 || node > self.max_node {
            return None;
        }
        if node <= self.max_slot {
            return Some(&self.slot_type);
        }
        let code = self.codes.get((node - self.max_slot - 1) as usize)?;
        self.types.get(code as usize).map(String::as_str)
    }

    /// Type code of a composite node.
    pub(crate) fn code(&self, node: Node) -> Option<u16> {
        if node <= self.max_slot || node > self.max_node {
            return None;
        }
        self.codes.get((node - self.max_slot - 1) as usize)
    }

    /// Inclusive node interval of a type. The slot type spans
    /// `(1, max_slot)`.
    pub fn s_interval(&self, type_name: &str) -> Option<(Node, Node)> {
        if type_name == self.slot_type {
            return if self.max_slot == 0 {
                None
            } else {
                Some((1, self.max_slot))
            };
        }
        let code = *self.by_name.get(type_name)?;
        let (min, max) = self.intervals[code as usize];
        if min == 0 {
            None
        } else {
            Some((min, max))
        }
    }

    /// All composite type names with their intervals, in code order.
    pub fn all(&self) -> impl Iterator<Item = (&str, (Node, Node))> {
        self.types
            .iter()
            .zip(&self.intervals)
            .map(|(name, &iv)| (name.as_str(), iv))
    }

    pub fn type_names(&self) -> &[String] {
        &self.types
    }

    pub(crate) fn codes_slice(&self) -> &[u16] {
        self.codes.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OtypeFeature {
        OtypeFeature::new(
            vec!["sentence".into(), "phrase".into()],
            vec![0u16, 0, 1].into(),
            3,
            6,
            "word".into(),
        )
        .unwrap()
    }

    #[test]
    fn test_slot_and_composite_types() {
        let otype = sample();
        assert_eq!(otype.v(1), Some("word"));
        assert_eq!(otype.v(4), Some("sentence"));
        assert_eq!(otype.v(6), Some("phrase"));
        assert_eq!(otype.v(7), None);
        assert_eq!(otype.v(0), None);
    }

    #[test]
    fn test_intervals() {
        let otype = sample();
        assert_eq!(otype.s_interval("word"), Some((1, 3)));
        assert_eq!(otype.s_interval("sentence"), Some((4, 5)));
        assert_eq!(otype.s_interval("phrase"), Some((6, 6)));
        assert_eq!(otype.s_interval("clause"), None);
    }

    #[test]
    fn test_non_contiguous_type_is_rejected() {
        let result = OtypeFeature::new(
            vec!["a".into(), "b".into()],
            vec![0u16, 1, 0].into(),
            1,
            4,
            "word".into(),
        );
        assert!(matches!(
            result,
            Err(FabricError::InvariantViolation(_))
        ));
    }
}
