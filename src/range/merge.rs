use super::KeyRange;

/// Coalesces arcs that touch end-to-start. The input must be sorted in ring
/// order (by `end` ascending), which is the order `Ring` produces them in.
/// Arcs touching across the top of the ring are joined too.
pub fn merge_adjacent<P>(ranges: impl IntoIterator<Item = KeyRange<P>>) -> Vec<KeyRange<P>>
where
    P: Copy + Ord,
{
    let mut merged: Vec<KeyRange<P>> = Vec::new();

    for next in ranges {
        match merged.last_mut() {
            Some(last) if last.end == next.start => last.end = next.end,
            _ => merged.push(next),
        }
    }

    if merged.len() > 1 {
        let first = merged[0];
        let last = merged[merged.len() - 1];

        if last.end == first.start {
            merged[0].start = last.start;
            merged.pop();
        }
    }

    merged
}
