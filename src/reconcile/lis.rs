//! Longest increasing subsequence.
//!
//! Patience sorting: `tails[k]` holds the smallest value that ends an
//! increasing run of length `k + 1`; a binary search places each value and a
//! predecessor link per position rebuilds the run. O(n log n).

/// Positions of a longest strictly increasing subsequence of `seq`,
/// ascending. `None` entries are skipped.
///
/// ```
/// use spark_vdom::reconcile::longest_increasing_subsequence;
///
/// let seq = [Some(2), None, Some(0), Some(1), Some(3)];
/// assert_eq!(longest_increasing_subsequence(&seq), vec![2, 3, 4]);
/// ```
pub fn longest_increasing_subsequence(seq: &[Option<usize>]) -> Vec<usize> {
    let mut tail_values: Vec<usize> = Vec::new();
    let mut tail_positions: Vec<usize> = Vec::new();
    let mut predecessor: Vec<Option<usize>> = vec![None; seq.len()];

    for (pos, value) in seq.iter().enumerate() {
        let Some(value) = *value else {
            continue;
        };
        let slot = tail_values.partition_point(|&tail| tail < value);
        if slot > 0 {
            predecessor[pos] = Some(tail_positions[slot - 1]);
        }
        if slot == tail_values.len() {
            tail_values.push(value);
            tail_positions.push(pos);
        } else {
            tail_values[slot] = value;
            tail_positions[slot] = pos;
        }
    }

    let mut run = Vec::with_capacity(tail_positions.len());
    let mut cursor = tail_positions.last().copied();
    while let Some(pos) = cursor {
        run.push(pos);
        cursor = predecessor[pos];
    }
    run.reverse();
    run
}
