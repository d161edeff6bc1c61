/// Number of bits needed to distinguish `count` alternatives: `ceil(log2(count))`,
/// and zero when there is at most one alternative.
#[inline]
pub fn bit_width(count: usize) -> u8 {
    if count <= 1 {
        0
    } else {
        (usize::BITS - (count - 1).leading_zeros()) as u8
    }
}

/// Converts a collection index into a `u32` identifier.
#[inline]
pub fn index_u32(index: usize, what: &str) -> crate::error::Result<u32> {
    u32::try_from(index)
        .map_err(|_| crate::error::Error::invalid(format!("{what} index {index} exceeds u32")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_follow_ceil_log2() {
        let expected = [(0, 0), (1, 0), (2, 1), (3, 2), (4, 2), (5, 3), (8, 3), (9, 4), (256, 8)];
        for (count, width) in expected {
            assert_eq!(bit_width(count), width, "count {count}");
        }
    }
}
