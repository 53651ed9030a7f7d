use bytes::BufMut;

use crate::error::{CodecError, Result};

/// A value with a defined wire representation.
pub trait Encode {
    /// Append the wire form of `self` to `dst`.
    fn encode<B: BufMut>(&self, dst: &mut B) -> Result<()>;

    /// Encode into a freshly allocated buffer.
    fn to_wire(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

/// A value that can be read from the front of a byte slice.
///
/// Returns the value together with the bytes that were not consumed.
pub trait Decode: Sized {
    fn decode(src: &[u8]) -> Result<(Self, &[u8])>;
}

/// Split exactly `n` bytes off the front of `src`.
pub fn take(src: &[u8], n: usize) -> Result<(&[u8], &[u8])> {
    if src.len() < n {
        return Err(CodecError::InsufficientData {
            needed: n,
            available: src.len(),
        });
    }
    Ok(src.split_at(n))
}

macro_rules! impl_le_integer {
    ($($ty:ty => $put:ident),* $(,)?) => {$(
        impl Encode for $ty {
            fn encode<B: BufMut>(&self, dst: &mut B) -> Result<()> {
                dst.$put(*self);
                Ok(())
            }
        }

        impl Decode for $ty {
            fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
                const WIDTH: usize = std::mem::size_of::<$ty>();
                let (head, rest) = take(src, WIDTH)?;
                let mut raw = [0u8; WIDTH];
                raw.copy_from_slice(head);
                Ok((<$ty>::from_le_bytes(raw), rest))
            }
        }
    )*};
}

impl_le_integer!(
    u8 => put_u8,
    u16 => put_u16_le,
    u32 => put_u32_le,
    u64 => put_u64_le,
    i8 => put_i8,
    i16 => put_i16_le,
    i32 => put_i32_le,
    i64 => put_i64_le,
);

impl Encode for bool {
    fn encode<B: BufMut>(&self, dst: &mut B) -> Result<()> {
        dst.put_u8(u8::from(*self));
        Ok(())
    }
}

impl Decode for bool {
    fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        let (raw, rest) = u8::decode(src)?;
        Ok((raw != 0, rest))
    }
}

/// Byte width of an integer field or count prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    One,
    Two,
    Four,
    Eight,
}

impl IntWidth {
    /// Map a byte count to a width.
    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    /// Number of bytes on the wire.
    pub fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    /// Largest unsigned value representable at this width.
    pub fn max_unsigned(self) -> u64 {
        match self {
            Self::Eight => u64::MAX,
            other => (1u64 << other.bits()) - 1,
        }
    }

    /// Inclusive signed range representable at this width.
    pub fn signed_range(self) -> (i64, i64) {
        match self {
            Self::Eight => (i64::MIN, i64::MAX),
            other => {
                let half = 1i64 << (other.bits() - 1);
                (-half, half - 1)
            }
        }
    }

    /// Encode an unsigned value, rejecting values that do not fit.
    pub fn encode_unsigned<B: BufMut>(self, value: u64, dst: &mut B) -> Result<()> {
        if value > self.max_unsigned() {
            return Err(CodecError::ValueOutOfRange(format!(
                "{value} does not fit in an unsigned {}-bit field",
                self.bits()
            )));
        }
        dst.put_uint_le(value, self.bytes());
        Ok(())
    }

    pub fn decode_unsigned(self, src: &[u8]) -> Result<(u64, &[u8])> {
        let (head, rest) = take(src, self.bytes())?;
        let value = head
            .iter()
            .rev()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
        Ok((value, rest))
    }

    /// Encode a signed value in two's complement, rejecting values that do not fit.
    pub fn encode_signed<B: BufMut>(self, value: i64, dst: &mut B) -> Result<()> {
        let (min, max) = self.signed_range();
        if value < min || value > max {
            return Err(CodecError::ValueOutOfRange(format!(
                "{value} does not fit in a signed {}-bit field",
                self.bits()
            )));
        }
        dst.put_int_le(value, self.bytes());
        Ok(())
    }

    pub fn decode_signed(self, src: &[u8]) -> Result<(i64, &[u8])> {
        let (raw, rest) = self.decode_unsigned(src)?;
        let shift = 64 - self.bits();
        // Sign-extend from the field width.
        let value = ((raw << shift) as i64) >> shift;
        Ok((value, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(0x0161u16.to_wire().unwrap(), vec![0x61, 0x01]);
        assert_eq!(0x1122_3344u32.to_wire().unwrap(), vec![0x44, 0x33, 0x22, 0x11]);
        assert_eq!((-2i16).to_wire().unwrap(), vec![0xFE, 0xFF]);

        let (value, rest) = u32::decode(&[0x44, 0x33, 0x22, 0x11, 0xAA]).unwrap();
        assert_eq!(value, 0x1122_3344);
        assert_eq!(rest, &[0xAA]);
    }

    #[test]
    fn short_input_is_insufficient_data() {
        let err = u64::decode(&[0x01, 0x02, 0x03]).unwrap_err();
        assert_eq!(
            err,
            CodecError::InsufficientData {
                needed: 8,
                available: 3
            }
        );
        assert!(u8::decode(&[]).is_err());
    }

    #[test]
    fn bool_reads_any_nonzero_as_true() {
        assert!(!bool::decode(&[0x00]).unwrap().0);
        assert!(bool::decode(&[0x01]).unwrap().0);
        assert!(bool::decode(&[0x7F]).unwrap().0);
        assert_eq!(true.to_wire().unwrap(), vec![0x01]);
        assert_eq!(false.to_wire().unwrap(), vec![0x00]);
    }

    #[test]
    fn width_encodes_unsigned_with_range_check() {
        let mut buf = Vec::new();
        IntWidth::Two.encode_unsigned(0xBEEF, &mut buf).unwrap();
        assert_eq!(buf, vec![0xEF, 0xBE]);

        assert!(matches!(
            IntWidth::One.encode_unsigned(256, &mut buf),
            Err(CodecError::ValueOutOfRange(_))
        ));
        assert_eq!(IntWidth::Eight.max_unsigned(), u64::MAX);
        assert_eq!(IntWidth::Four.max_unsigned(), u32::MAX as u64);
    }

    #[test]
    fn width_decodes_signed_with_sign_extension() {
        let (value, rest) = IntWidth::One.decode_signed(&[0xFF, 0x10]).unwrap();
        assert_eq!(value, -1);
        assert_eq!(rest, &[0x10]);

        let mut buf = Vec::new();
        IntWidth::Two.encode_signed(-300, &mut buf).unwrap();
        assert_eq!(IntWidth::Two.decode_signed(&buf).unwrap().0, -300);

        assert!(IntWidth::One.encode_signed(128, &mut buf).is_err());
        assert!(IntWidth::One.encode_signed(-129, &mut buf).is_err());
    }

    #[test]
    fn width_from_bytes() {
        assert_eq!(IntWidth::from_bytes(4), Some(IntWidth::Four));
        assert_eq!(IntWidth::from_bytes(3), None);
    }
}
