//! Run detection over integer series.

/// True if `values` contains an unbroken strictly-decreasing run spanning at
/// least `min_len` elements.
///
/// Single left-to-right pass: each strictly decreasing step extends the run,
/// any other step resets it. Series shorter than `min_len` never qualify.
pub fn has_descending_run(values: &[u64], min_len: usize) -> bool {
    if values.len() < min_len {
        return false;
    }

    let needed = min_len.saturating_sub(1);
    let mut run = 0usize;
    for pair in values.windows(2) {
        if pair[1] < pair[0] {
            run += 1;
            if run >= needed {
                return true;
            }
        } else {
            run = 0;
        }
    }

    false
}
