//! Containment indices: embedders (`levUp`) and embeddees (`levDown`).
//!
//! Node `m` embeds node `n` when the slot set of `m` is a strict superset
//! of the slot set of `n`. Candidates are enumerated through the slot
//! coverage index (the transpose of `oslots`): every embedder of `n` must
//! cover `n`'s first slot.

use crate::collections::{Csr, CsrBuilder};
use crate::compute::sort_by_rank;

/// `sub` and `sup` are sorted strictly increasing.
fn is_subset(sub: &[u32], sup: &[u32]) -> bool {
    let mut pos = 0;
    for &x in sub {
        loop {
            match sup.get(pos) {
                None => return false,
                Some(&y) if y == x => {
                    pos += 1;
                    break;
                }
                Some(&y) if y > x => return false,
                _ => pos += 1,
            }
        }
    }
    true
}

/// Returns `(lev_up, lev_down)`, both with one row per node (row
/// `node - 1`), every row rank-sorted.
pub fn build_embedding(
    oslots: &Csr,
    cover: &Csr,
    mins: &[u32],
    rank: &[u32],
    max_slot: u32,
    max_node: u32,
) -> (Csr, Csr) {
    let slot_set = |node: u32| -> &[u32] {
        debug_assert!(node > max_slot);
        oslots.row((node - max_slot - 1) as usize)
    };

    let mut up_rows: Vec<Vec<u32>> = vec![Vec::new(); max_node as usize];
    let mut down_rows: Vec<Vec<u32>> = vec![Vec::new(); max_node as usize];

    for node in 1..=max_node {
        let min = mins[(node - 1) as usize];
        if min == 0 {
            continue;
        }
        let candidates = cover.row((min - 1) as usize);
        let embedders = &mut up_rows[(node - 1) as usize];
        if node <= max_slot {
            // A slot's set is {node}; any covering node with more than one
            // slot is a strict superset.
            for &m in candidates {
                if slot_set(m).len() > 1 {
                    embedders.push(m);
                }
            }
        } else {
            let own = slot_set(node);
            for &m in candidates {
                if m == node {
                    continue;
                }
                let other = slot_set(m);
                if other.len() > own.len() && is_subset(own, other) {
                    embedders.push(m);
                }
            }
        }
        for &m in embedders.iter() {
            down_rows[(m - 1) as usize].push(node);
        }
    }

    let mut up = CsrBuilder::new();
    for row in &mut up_rows {
        sort_by_rank(row, rank);
        up.push_row(row);
    }
    let mut down = CsrBuilder::new();
    for row in &mut down_rows {
        sort_by_rank(row, rank);
        down.push_row(row);
    }
    (up.finish(), down.finish())
}
