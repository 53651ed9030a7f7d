//! Named enumerations backed by an integer of declared width.

use bytes::BufMut;

use crate::error::{CodecError, Result};
use crate::primitive::IntWidth;

/// A closed set of named integer values.
///
/// Decoding a raw value that has no matching variant is an error; there is no
/// catch-all variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    name: String,
    width: IntWidth,
    variants: Vec<(String, u64)>,
}

impl EnumDef {
    /// Build an enumeration, checking that every value fits `width` and that
    /// variant names and values are unique.
    pub fn new<N, I, S>(name: N, width: IntWidth, variants: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut collected: Vec<(String, u64)> = Vec::new();

        for (variant, value) in variants {
            let variant = variant.into();
            if value > width.max_unsigned() {
                return Err(CodecError::ValueOutOfRange(format!(
                    "{name}::{variant} = {value} does not fit in {} bits",
                    width.bits()
                )));
            }
            if collected.iter().any(|(n, v)| *n == variant || *v == value) {
                return Err(CodecError::ValueOutOfRange(format!(
                    "{name}::{variant} duplicates an existing name or value"
                )));
            }
            collected.push((variant, value));
        }

        Ok(Self {
            name,
            width,
            variants: collected,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }

    /// Variants in declaration order.
    pub fn variants(&self) -> impl Iterator<Item = (&str, u64)> {
        self.variants.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn value_of(&self, variant: &str) -> Option<u64> {
        self.variants
            .iter()
            .find(|(n, _)| n == variant)
            .map(|(_, v)| *v)
    }

    pub fn name_of(&self, value: u64) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }

    /// Encode a variant by name.
    pub fn encode<B: BufMut>(&self, variant: &str, dst: &mut B) -> Result<()> {
        let value = self.value_of(variant).ok_or_else(|| {
            CodecError::ValueOutOfRange(format!("{variant} is not a variant of {}", self.name))
        })?;
        self.width.encode_unsigned(value, dst)
    }

    /// Decode a variant, returning its name.
    pub fn decode<'d, 's>(&'d self, src: &'s [u8]) -> Result<(&'d str, &'s [u8])> {
        let (raw, rest) = self.width.decode_unsigned(src)?;
        let variant = self
            .name_of(raw)
            .ok_or_else(|| CodecError::InvalidEnumValue {
                type_name: self.name.clone(),
                value: raw,
            })?;
        Ok((variant, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> EnumDef {
        EnumDef::new(
            "Status",
            IntWidth::One,
            [("SUCCESS", 0x00), ("FAILURE", 0x01), ("INVALID_PARAMETER", 0x02)],
        )
        .unwrap()
    }

    #[test]
    fn encode_and_decode_by_name() {
        let def = status();
        let mut buf = Vec::new();
        def.encode("FAILURE", &mut buf).unwrap();
        assert_eq!(buf, vec![0x01]);

        let (variant, rest) = def.decode(&[0x02, 0xFF]).unwrap();
        assert_eq!(variant, "INVALID_PARAMETER");
        assert_eq!(rest, &[0xFF]);
    }

    #[test]
    fn unknown_raw_value_is_rejected() {
        let err = status().decode(&[0x7F]).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidEnumValue {
                type_name: "Status".to_string(),
                value: 0x7F
            }
        );
    }

    #[test]
    fn unknown_variant_name_is_rejected() {
        let mut buf = Vec::new();
        assert!(matches!(
            status().encode("MAYBE", &mut buf),
            Err(CodecError::ValueOutOfRange(_))
        ));
    }

    #[test]
    fn construction_checks_width_and_uniqueness() {
        assert!(EnumDef::new("Wide", IntWidth::One, [("BIG", 0x100)]).is_err());
        assert!(EnumDef::new("Dup", IntWidth::One, [("A", 1), ("B", 1)]).is_err());
        assert!(EnumDef::new("Dup", IntWidth::One, [("A", 1), ("A", 2)]).is_err());
    }

    #[test]
    fn wider_enums_use_declared_width() {
        let def = EnumDef::new("Profile", IntWidth::Two, [("HA", 0x0104), ("ZLL", 0xC05E)])
            .unwrap();
        let mut buf = Vec::new();
        def.encode("ZLL", &mut buf).unwrap();
        assert_eq!(buf, vec![0x5E, 0xC0]);
        assert!(matches!(
            def.decode(&[0x5E]),
            Err(CodecError::InsufficientData { needed: 2, available: 1 })
        ));
    }
}
