use num_bigint::BigUint;
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Maximum number of octets that a u64 varint can occupy.
pub const VARINT_MAX_LEN: usize = 10;

/// Scratch buffer large enough for any u64 varint.
pub type VarintBuf = SmallVec<[u8; VARINT_MAX_LEN]>;

/// Encodes the value as 7-bit groups, least significant group first, and appends the
/// octets to `out`. The high bit of each octet flags that more octets follow.
pub fn encode_varint<E: Extend<u8>>(mut value: u64, out: &mut E) -> usize {
    let mut written = 0usize;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        written += 1;
        if value != 0 {
            out.extend(Some(byte | 0x80));
        } else {
            out.extend(Some(byte));
            break;
        }
    }
    written
}

/// Arbitrary-precision counterpart of [`encode_varint`].
pub fn encode_varint_big<E: Extend<u8>>(value: &BigUint, out: &mut E) -> usize {
    let groups = value.to_radix_le(128);
    let last = groups.len().saturating_sub(1);
    for (idx, group) in groups.iter().enumerate() {
        let byte = if idx < last { group | 0x80 } else { *group };
        out.extend(Some(byte));
    }
    groups.len().max(1)
}

/// Decodes a u64 varint by pulling octets from `next`.
pub fn decode_varint_with<F>(mut next: F) -> Result<u64>
where
    F: FnMut() -> Result<u8>,
{
    let mut value = 0u64;
    for i in 0..VARINT_MAX_LEN {
        let byte = next()?;
        let data = u64::from(byte & 0x7f);
        if i == VARINT_MAX_LEN - 1 && (data > 1 || byte & 0x80 != 0) {
            return Err(Error::invalid("unsigned integer exceeds 64-bit capacity"));
        }
        value |= data << (i * 7);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::invalid("unsigned integer exceeds 64-bit capacity"))
}

/// Decodes an arbitrary-precision varint by pulling octets from `next`.
pub fn decode_varint_big_with<F>(mut next: F) -> Result<BigUint>
where
    F: FnMut() -> Result<u8>,
{
    let mut groups: SmallVec<[u8; 16]> = SmallVec::new();
    loop {
        let byte = next()?;
        groups.push(byte & 0x7f);
        if byte & 0x80 == 0 {
            break;
        }
    }
    BigUint::from_radix_le(&groups, 128)
        .ok_or_else(|| Error::invalid("malformed arbitrary-precision integer"))
}

/// Decodes a u64 varint from the provided byte slice, advancing the slice on success.
pub fn decode_varint(input: &mut &[u8]) -> Result<u64> {
    decode_varint_with(|| {
        let Some((&byte, rest)) = input.split_first() else {
            return Err(Error::PrematureEnd);
        };
        *input = rest;
        Ok(byte)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_take_one_octet() {
        let mut out = Vec::new();
        assert_eq!(encode_varint(127, &mut out), 1);
        assert_eq!(out, [0x7f]);
    }

    #[test]
    fn groups_are_least_significant_first() {
        let mut out = Vec::new();
        encode_varint(128, &mut out);
        assert_eq!(out, [0x80, 0x01]);
        let mut slice = out.as_slice();
        assert_eq!(decode_varint(&mut slice).unwrap(), 128);
        assert!(slice.is_empty());
    }

    #[test]
    fn u64_max_round_trips() {
        let mut out = Vec::new();
        assert_eq!(encode_varint(u64::MAX, &mut out), VARINT_MAX_LEN);
        let mut slice = out.as_slice();
        assert_eq!(decode_varint(&mut slice).unwrap(), u64::MAX);
    }

    #[test]
    fn overlong_encoding_is_rejected() {
        let bytes = [0xffu8; 11];
        let mut slice = &bytes[..];
        assert!(matches!(
            decode_varint(&mut slice),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn truncated_encoding_is_premature_end() {
        let bytes = [0x80u8];
        let mut slice = &bytes[..];
        assert!(matches!(decode_varint(&mut slice), Err(Error::PrematureEnd)));
    }

    #[test]
    fn big_values_match_u64_encoding() {
        let mut small = Vec::new();
        encode_varint(300, &mut small);
        let mut big = Vec::new();
        encode_varint_big(&BigUint::from(300u32), &mut big);
        assert_eq!(small, big);

        let mut zero = Vec::new();
        encode_varint_big(&BigUint::default(), &mut zero);
        assert_eq!(zero, [0x00]);
    }

    #[test]
    fn big_values_beyond_u64_round_trip() {
        let value = BigUint::from(u64::MAX) * BigUint::from(1_000_000u32);
        let mut out = Vec::new();
        encode_varint_big(&value, &mut out);
        let mut iter = out.into_iter();
        let decoded = decode_varint_big_with(|| iter.next().ok_or(Error::PrematureEnd)).unwrap();
        assert_eq!(decoded, value);
    }
}
