//! Per-type summary rows, largest containers first.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::collections::Csr;

/// One row of `computed/levels.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelInfo {
    #[serde(rename = "type")]
    pub otype: String,
    #[serde(rename = "avgSlots")]
    pub avg_slots: f64,
    #[serde(rename = "minNode")]
    pub min_node: u32,
    #[serde(rename = "maxNode")]
    pub max_node: u32,
}

/// Builds the per-type summary: average covered slots and node interval,
/// sorted by decreasing average. The slot type always sorts last; ties
/// among composite types break by first node.
pub fn build_levels(
    type_names: &[String],
    codes: &[u16],
    oslots: &Csr,
    slot_type: &str,
    max_slot: u32,
) -> Vec<LevelInfo> {
    struct Acc {
        count: u64,
        slot_sum: u64,
        min_node: u32,
        max_node: u32,
    }
    let mut accs: HashMap<u16, Acc> = HashMap::new();
    for (i, &code) in codes.iter().enumerate() {
        let node = max_slot + 1 + i as u32;
        let span = oslots.row(i).len() as u64;
        let acc = accs.entry(code).or_insert(Acc {
            count: 0,
            slot_sum: 0,
            min_node: node,
            max_node: node,
        });
        acc.count += 1;
        acc.slot_sum += span;
        acc.max_node = node;
    }

    let mut rows: Vec<LevelInfo> = accs
        .into_iter()
        .map(|(code, acc)| LevelInfo {
            otype: type_names[code as usize].clone(),
            avg_slots: acc.slot_sum as f64 / acc.count as f64,
            min_node: acc.min_node,
            max_node: acc.max_node,
        })
        .collect();
    if max_slot > 0 {
        rows.push(LevelInfo {
            otype: slot_type.to_owned(),
            avg_slots: 1.0,
            min_node: 1,
            max_node: max_slot,
        });
    }

    rows.sort_by(|a, b| {
        let a_is_slot = a.otype == slot_type;
        let b_is_slot = b.otype == slot_type;
        a_is_slot
            .cmp(&b_is_slot)
            .then_with(|| {
                b.avg_slots
                    .partial_cmp(&a.avg_slots)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.min_node.cmp(&b.min_node))
    });
    rows
}

/// Per-node container level, indexed by `node - 1`: the position of the
/// node's type in `levels`. Lower means a larger container.
pub fn node_levels(
    levels: &[LevelInfo],
    codes: &[u16],
    type_names: &[String],
    slot_type: &str,
    max_slot: u32,
    max_node: u32,
) -> Vec<u32> {
    let index: HashMap<&str, u32> = levels
        .iter()
        .enumerate()
        .map(|(i, level)| (level.otype.as_str(), i as u32))
        .collect();
    let slot_level = index.get(slot_type).copied().unwrap_or(levels.len() as u32);

    let mut out = vec![0u32; max_node as usize];
    for slot in 0..max_slot as usize {
        out[slot] = slot_level;
    }
    for (i, &code) in codes.iter().enumerate() {
        let level = index
            .get(type_names[code as usize].as_str())
            .copied()
            .unwrap_or(slot_level);
        out[max_slot as usize + i] = level;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::CsrBuilder;

    fn types(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_levels_largest_first_slot_type_last() {
        // Nodes 4..=6: one "sentence" over 3 slots, two "phrase" over 1-2.
        let mut oslots = CsrBuilder::new();
        oslots.push_row(&[1, 2, 3]);
        oslots.push_row(&[1]);
        oslots.push_row(&[2, 3]);
        let oslots = oslots.finish();

        let levels = build_levels(
            &types(&["sentence", "phrase"]),
            &[0, 1, 1],
            &oslots,
            "word",
            3,
        );
        let names: Vec<&str> = levels.iter().map(|l| l.otype.as_str()).collect();
        assert_eq!(names, ["sentence", "phrase", "word"]);
        assert_eq!(levels[0].avg_slots, 3.0);
        assert_eq!(levels[1].avg_slots, 1.5);
        assert_eq!((levels[1].min_node, levels[1].max_node), (5, 6));
        assert_eq!((levels[2].min_node, levels[2].max_node), (1, 3));
    }

    #[test]
    fn test_node_levels_assigns_slot_level() {
        let mut oslots = CsrBuilder::new();
        oslots.push_row(&[1, 2]);
        let oslots = oslots.finish();
        let names = types(&["sentence"]);
        let levels = build_levels(&names, &[0], &oslots, "word", 2);
        let node_levels = node_levels(&levels, &[0], &names, "word", 2, 3);
        assert_eq!(node_levels, vec![1, 1, 0]);
    }
}
