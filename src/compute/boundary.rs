//! Slot boundary indices: which nodes start or end at a given slot.

use crate::collections::{Csr, CsrBuilder};
use crate::compute::sort_by_rank;

/// Returns `(first, last)`: row `slot-1` of `first` holds every node
/// whose minimum covered slot is `slot`, rank-sorted; `last` is the
/// analogue for maximum covered slots. Slots themselves are included.
pub fn build_boundary(
    mins: &[u32],
    maxs: &[u32],
    rank: &[u32],
    max_slot: u32,
) -> (Csr, Csr) {
    let mut first_rows: Vec<Vec<u32>> = vec![Vec::new(); max_slot as usize];
    let mut last_rows: Vec<Vec<u32>> = vec![Vec::new(); max_slot as usize];
    for (i, (&min, &max)) in mins.iter().zip(maxs).enumerate() {
        let node = (i + 1) as u32;
        if min >= 1 && min <= max_slot {
            first_rows[(min - 1) as usize].push(node);
        }
        if max >= 1 && max <= max_slot {
            last_rows[(max - 1) as usize].push(node);
        }
    }

    let mut first = CsrBuilder::new();
    for row in &mut first_rows {
        sort_by_rank(row, rank);
        first.push_row(row);
    }
    let mut last = CsrBuilder::new();
    for row in &mut last_rows {
        sort_by_rank(row, rank);
        last.push_row(row);
    }
    (first.finish(), last.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::build_rank;

    #[test]
    fn test_boundary_rows_match_spans() {
        // Slots 1..=3; node 4 over [1,2], node 5 over [2,3].
        let mins = vec![1, 2, 3, 1, 2];
        let maxs = vec![1, 2, 3, 2, 3];
        let levels = vec![1, 1, 1, 0, 0];
        let (rank, _) = build_rank(&mins, &maxs, &levels);
        let (first, last) = build_boundary(&mins, &maxs, &rank, 3);

        assert_eq!(first.row(0), &[4, 1]);
        assert_eq!(first.row(1), &[5, 2]);
        assert_eq!(first.row(2), &[3]);
        assert_eq!(last.row(0), &[1]);
        assert_eq!(last.row(1), &[4, 2]);
        assert_eq!(last.row(2), &[5, 3]);
    }
}
