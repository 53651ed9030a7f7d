//! Composite encodings built from the primitives: fixed-count lists,
//! count-prefixed lists and count-prefixed byte blobs.

use bytes::BufMut;

use crate::error::{CodecError, Result};
use crate::primitive::{take, Decode, Encode, IntWidth};

/// Prefix width of a "short" byte blob.
pub const SHORT_BYTES_PREFIX: IntWidth = IntWidth::One;

/// Prefix width of a "long" byte blob.
pub const LONG_BYTES_PREFIX: IntWidth = IntWidth::Two;

/// Default count prefix of a length-prefixed list.
pub const LIST_PREFIX: IntWidth = IntWidth::One;

/// Write an item count, rejecting counts the prefix cannot express.
pub fn encode_count<B: BufMut>(count: usize, prefix: IntWidth, dst: &mut B) -> Result<()> {
    if count as u64 > prefix.max_unsigned() {
        return Err(CodecError::ValueOutOfRange(format!(
            "{count} items exceed the {}-byte length prefix",
            prefix.bytes()
        )));
    }
    prefix.encode_unsigned(count as u64, dst)
}

pub fn decode_count(src: &[u8], prefix: IntWidth) -> Result<(usize, &[u8])> {
    let (count, rest) = prefix.decode_unsigned(src)?;
    let count = usize::try_from(count)
        .map_err(|_| CodecError::ValueOutOfRange(format!("count {count} exceeds usize")))?;
    Ok((count, rest))
}

/// Decode `count` consecutive items using `item`.
///
/// All-or-nothing: if any item fails, nothing decoded so far is returned.
pub fn decode_repeated<'a, T, F>(mut src: &'a [u8], count: usize, mut item: F) -> Result<(Vec<T>, &'a [u8])>
where
    F: FnMut(&'a [u8]) -> Result<(T, &'a [u8])>,
{
    let mut items = Vec::with_capacity(count.min(src.len()));
    for _ in 0..count {
        let (value, rest) = item(src)?;
        items.push(value);
        src = rest;
    }
    Ok((items, src))
}

/// Encode exactly `count` items with no prefix.
pub fn encode_fixed_list<T: Encode, B: BufMut>(items: &[T], count: usize, dst: &mut B) -> Result<()> {
    if items.len() != count {
        return Err(CodecError::ValueOutOfRange(format!(
            "fixed list expects {count} items, got {}",
            items.len()
        )));
    }
    for item in items {
        item.encode(dst)?;
    }
    Ok(())
}

pub fn decode_fixed_list<T: Decode>(src: &[u8], count: usize) -> Result<(Vec<T>, &[u8])> {
    decode_repeated(src, count, T::decode)
}

/// Encode a count prefix followed by the items.
pub fn encode_lv_list<T: Encode, B: BufMut>(items: &[T], prefix: IntWidth, dst: &mut B) -> Result<()> {
    encode_count(items.len(), prefix, dst)?;
    for item in items {
        item.encode(dst)?;
    }
    Ok(())
}

pub fn decode_lv_list<T: Decode>(src: &[u8], prefix: IntWidth) -> Result<(Vec<T>, &[u8])> {
    let (count, rest) = decode_count(src, prefix)?;
    decode_repeated(rest, count, T::decode)
}

/// Encode a length prefix followed by raw bytes.
pub fn encode_blob<B: BufMut>(data: &[u8], prefix: IntWidth, dst: &mut B) -> Result<()> {
    encode_count(data.len(), prefix, dst)?;
    dst.put_slice(data);
    Ok(())
}

/// Decode a length-prefixed byte blob, borrowing from `src`.
pub fn decode_blob(src: &[u8], prefix: IntWidth) -> Result<(&[u8], &[u8])> {
    let (len, rest) = decode_count(src, prefix)?;
    take(rest, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_list_has_no_prefix() {
        let mut buf = Vec::new();
        encode_fixed_list(&[0x0006u16, 0x0008], 2, &mut buf).unwrap();
        assert_eq!(buf, vec![0x06, 0x00, 0x08, 0x00]);

        let (items, rest) = decode_fixed_list::<u16>(&[0x06, 0x00, 0x08, 0x00, 0x99], 2).unwrap();
        assert_eq!(items, vec![0x0006, 0x0008]);
        assert_eq!(rest, &[0x99]);
    }

    #[test]
    fn fixed_list_rejects_wrong_count_and_short_input() {
        let mut buf = Vec::new();
        assert!(encode_fixed_list(&[1u8, 2, 3], 2, &mut buf).is_err());
        assert!(matches!(
            decode_fixed_list::<u16>(&[0x01, 0x00, 0x02], 2),
            Err(CodecError::InsufficientData { .. })
        ));
    }

    #[test]
    fn lv_list_roundtrip_with_trailing_bytes() {
        let mut buf = Vec::new();
        encode_lv_list(&[0x0000u16, 0x0006, 0x0300], LIST_PREFIX, &mut buf).unwrap();
        assert_eq!(buf, vec![0x03, 0x00, 0x00, 0x06, 0x00, 0x00, 0x03]);

        buf.extend_from_slice(b"tail");
        let (items, rest) = decode_lv_list::<u16>(&buf, LIST_PREFIX).unwrap();
        assert_eq!(items, vec![0x0000, 0x0006, 0x0300]);
        assert_eq!(rest, b"tail");
    }

    #[test]
    fn lv_list_rejects_overflowing_count() {
        let items = vec![0u8; 256];
        let mut buf = Vec::new();
        assert!(matches!(
            encode_lv_list(&items, IntWidth::One, &mut buf),
            Err(CodecError::ValueOutOfRange(_))
        ));
        assert!(encode_lv_list(&items, IntWidth::Two, &mut buf).is_ok());
    }

    #[test]
    fn lv_list_truncated_items() {
        // Claims three u16 items but only carries one.
        let err = decode_lv_list::<u16>(&[0x03, 0x01, 0x00], LIST_PREFIX).unwrap_err();
        assert!(matches!(err, CodecError::InsufficientData { .. }));
    }

    #[test]
    fn short_and_long_blobs() {
        let mut short = Vec::new();
        encode_blob(b"abc", SHORT_BYTES_PREFIX, &mut short).unwrap();
        assert_eq!(short, b"\x03abc");

        let mut long = Vec::new();
        encode_blob(b"abc", LONG_BYTES_PREFIX, &mut long).unwrap();
        assert_eq!(long, b"\x03\x00abc");

        let (data, rest) = decode_blob(b"\x03\x00abcdef", LONG_BYTES_PREFIX).unwrap();
        assert_eq!(data, b"abc");
        assert_eq!(rest, b"def");

        assert!(encode_blob(&[0u8; 300], SHORT_BYTES_PREFIX, &mut short).is_err());
        assert!(matches!(
            decode_blob(b"\x05ab", SHORT_BYTES_PREFIX),
            Err(CodecError::InsufficientData { needed: 5, available: 2 })
        ));
    }
}
