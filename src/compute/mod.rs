//! Derived indices over the warp: canonical order, containment, slot
//! boundaries, per-type levels and section addressing.
//!
//! Everything here is a pure function of `otype`/`oslots` (plus heading
//! features for sections). The compiler runs these once and stores the
//! results; the loader re-runs them in memory when a store predates a
//! given index.

mod boundary;
mod embedding;
mod levels;
mod rank;
mod sections;

pub use boundary::build_boundary;
pub use embedding::build_embedding;
pub use levels::{build_levels, node_levels, LevelInfo};
pub use rank::build_rank;
pub use sections::{build_section_index, SectionIndex};

use crate::collections::Csr;
use crate::Node;

/// Per-node first and last covered slot, indexed by `node - 1`.
/// For slots both are the slot itself.
pub fn node_spans(oslots: &Csr, max_slot: u32, max_node: u32) -> (Vec<u32>, Vec<u32>) {
    let mut mins = vec![0u32; max_node as usize];
    let mut maxs = vec![0u32; max_node as usize];
    for slot in 1..=max_slot {
        mins[(slot - 1) as usize] = slot;
        maxs[(slot - 1) as usize] = slot;
    }
    for node in max_slot + 1..=max_node {
        let row = oslots.row((node - max_slot - 1) as usize);
        mins[(node - 1) as usize] = row.first().copied().unwrap_or(0);
        maxs[(node - 1) as usize] = row.last().copied().unwrap_or(0);
    }
    (mins, maxs)
}

/// Sorts nodes in place by canonical rank.
pub(crate) fn sort_by_rank(nodes: &mut [Node], rank: &[u32]) {
    nodes.sort_unstable_by_key(|&n| rank[(n - 1) as usize]);
}
