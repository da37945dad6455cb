//! Longest increasing subsequence for the keyed diff move pass.

/// Indices of a longest strictly increasing subsequence of `values`.
///
/// Entries equal to `0` mean "no old node" in the keyed diff and are never
/// part of the result. Runs in O(n log n).
///
/// ```
/// use spark_render::renderer::longest_increasing_subsequence;
///
/// // old positions (+1) of the new children; 0 = freshly mounted
/// let seq = longest_increasing_subsequence(&[3, 1, 0, 2, 5]);
/// assert_eq!(seq, vec![1, 3, 4]);
/// ```
pub fn longest_increasing_subsequence(values: &[usize]) -> Vec<usize> {
    let mut predecessors: Vec<Option<usize>> = vec![None; values.len()];
    // tails[k]: index of the smallest tail value of an increasing run of length k + 1
    let mut tails: Vec<usize> = Vec::new();

    for (index, &value) in values.iter().enumerate() {
        if value == 0 {
            continue;
        }

        match tails.last() {
            None => {
                tails.push(index);
                continue;
            }
            Some(&last) if values[last] < value => {
                predecessors[index] = Some(last);
                tails.push(index);
                continue;
            }
            Some(_) => {}
        }

        let pos = tails.partition_point(|&tail| values[tail] < value);
        if value < values[tails[pos]] {
            if pos > 0 {
                predecessors[index] = Some(tails[pos - 1]);
            }
            tails[pos] = index;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        result.push(index);
        cursor = predecessors[index];
    }
    result.reverse();
    result
}
