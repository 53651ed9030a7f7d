//! Zigbee addressing: IEEE (EUI-64) addresses and mode-tagged addresses.

use std::fmt;
use std::str::FromStr;

use bytes::BufMut;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CodecError, Result};
use crate::primitive::{take, Decode, Encode};

/// A 64-bit IEEE address.
///
/// Stored in wire (little-endian) order; displayed most significant byte
/// first, e.g. `00:12:4b:00:1c:aa:bb:cc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Eui64(pub [u8; 8]);

impl Eui64 {
    /// Build from the conventional big-endian display order.
    pub fn from_be_bytes(mut bytes: [u8; 8]) -> Self {
        bytes.reverse();
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl Encode for Eui64 {
    fn encode<B: BufMut>(&self, dst: &mut B) -> Result<()> {
        dst.put_slice(&self.0);
        Ok(())
    }
}

impl Decode for Eui64 {
    fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        let (head, rest) = take(src, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(head);
        Ok((Self(raw), rest))
    }
}

impl fmt::Display for Eui64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().rev().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Eui64 {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CodecError::ValueOutOfRange(format!("invalid IEEE address: {s}"));
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 8 {
            return Err(invalid());
        }
        let mut bytes = [0u8; 8];
        for (slot, part) in bytes.iter_mut().zip(&parts) {
            if part.len() != 2 {
                return Err(invalid());
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        Ok(Self::from_be_bytes(bytes))
    }
}

impl Serialize for Eui64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Eui64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Addressing mode discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AddrMode {
    NotPresent = 0x00,
    Group = 0x01,
    Nwk = 0x02,
    Ieee = 0x03,
    Broadcast = 0x0F,
}

impl AddrMode {
    /// Width of the address that follows this discriminator.
    pub fn address_width(self) -> usize {
        match self {
            AddrMode::NotPresent => 0,
            AddrMode::Group | AddrMode::Nwk | AddrMode::Broadcast => 2,
            AddrMode::Ieee => 8,
        }
    }
}

impl TryFrom<u8> for AddrMode {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(AddrMode::NotPresent),
            0x01 => Ok(AddrMode::Group),
            0x02 => Ok(AddrMode::Nwk),
            0x03 => Ok(AddrMode::Ieee),
            0x0F => Ok(AddrMode::Broadcast),
            other => Err(CodecError::InvalidEnumValue {
                type_name: "AddrMode".to_string(),
                value: u64::from(other),
            }),
        }
    }
}

impl Encode for AddrMode {
    fn encode<B: BufMut>(&self, dst: &mut B) -> Result<()> {
        dst.put_u8(*self as u8);
        Ok(())
    }
}

impl Decode for AddrMode {
    fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        let (raw, rest) = u8::decode(src)?;
        Ok((AddrMode::try_from(raw)?, rest))
    }
}

/// An address tagged with its addressing mode.
///
/// Wire form is the mode byte followed by an address whose width depends on
/// the mode, so decoding is a two-stage parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", content = "address", rename_all = "snake_case")]
pub enum AddrModeAddress {
    NotPresent,
    Group(u16),
    Nwk(u16),
    Ieee(Eui64),
    Broadcast(u16),
}

impl AddrModeAddress {
    pub fn mode(&self) -> AddrMode {
        match self {
            AddrModeAddress::NotPresent => AddrMode::NotPresent,
            AddrModeAddress::Group(_) => AddrMode::Group,
            AddrModeAddress::Nwk(_) => AddrMode::Nwk,
            AddrModeAddress::Ieee(_) => AddrMode::Ieee,
            AddrModeAddress::Broadcast(_) => AddrMode::Broadcast,
        }
    }

    /// Total wire width including the mode byte.
    pub fn wire_width(&self) -> usize {
        1 + self.mode().address_width()
    }
}

impl Encode for AddrModeAddress {
    fn encode<B: BufMut>(&self, dst: &mut B) -> Result<()> {
        self.mode().encode(dst)?;
        match self {
            AddrModeAddress::NotPresent => Ok(()),
            AddrModeAddress::Group(addr)
            | AddrModeAddress::Nwk(addr)
            | AddrModeAddress::Broadcast(addr) => addr.encode(dst),
            AddrModeAddress::Ieee(ieee) => ieee.encode(dst),
        }
    }
}

impl Decode for AddrModeAddress {
    fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        let (mode, rest) = AddrMode::decode(src)?;
        match mode {
            AddrMode::NotPresent => Ok((AddrModeAddress::NotPresent, rest)),
            AddrMode::Group => u16::decode(rest).map(|(a, r)| (AddrModeAddress::Group(a), r)),
            AddrMode::Nwk => u16::decode(rest).map(|(a, r)| (AddrModeAddress::Nwk(a), r)),
            AddrMode::Broadcast => {
                u16::decode(rest).map(|(a, r)| (AddrModeAddress::Broadcast(a), r))
            }
            AddrMode::Ieee => Eui64::decode(rest).map(|(a, r)| (AddrModeAddress::Ieee(a), r)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eui64_display_is_reversed_wire_order() {
        let ieee = Eui64([0xCC, 0xBB, 0xAA, 0x1C, 0x00, 0x4B, 0x12, 0x00]);
        assert_eq!(ieee.to_string(), "00:12:4b:00:1c:aa:bb:cc");
        assert_eq!("00:12:4b:00:1c:aa:bb:cc".parse::<Eui64>().unwrap(), ieee);
        assert!("00:12:4b".parse::<Eui64>().is_err());
        assert!("zz:12:4b:00:1c:aa:bb:cc".parse::<Eui64>().is_err());
    }

    #[test]
    fn nwk_address_reads_two_bytes() {
        let (addr, rest) = AddrModeAddress::decode(&[0x02, 0x34, 0x12, 0xEE]).unwrap();
        assert_eq!(addr, AddrModeAddress::Nwk(0x1234));
        assert_eq!(rest, &[0xEE]);
        assert_eq!(addr.to_wire().unwrap(), vec![0x02, 0x34, 0x12]);
    }

    #[test]
    fn ieee_address_reads_eight_bytes() {
        let wire = [0x03, 1, 2, 3, 4, 5, 6, 7, 8];
        let (addr, rest) = AddrModeAddress::decode(&wire).unwrap();
        assert_eq!(addr, AddrModeAddress::Ieee(Eui64([1, 2, 3, 4, 5, 6, 7, 8])));
        assert!(rest.is_empty());
        assert_eq!(addr.wire_width(), 9);
        assert_eq!(addr.to_wire().unwrap(), wire.to_vec());
    }

    #[test]
    fn not_present_has_no_address_bytes() {
        let (addr, rest) = AddrModeAddress::decode(&[0x00, 0x55]).unwrap();
        assert_eq!(addr, AddrModeAddress::NotPresent);
        assert_eq!(rest, &[0x55]);
    }

    #[test]
    fn unknown_mode_and_truncated_address() {
        assert!(matches!(
            AddrModeAddress::decode(&[0x07, 0x00, 0x00]),
            Err(CodecError::InvalidEnumValue { value: 0x07, .. })
        ));
        assert!(matches!(
            AddrModeAddress::decode(&[0x03, 1, 2, 3]),
            Err(CodecError::InsufficientData { needed: 8, available: 3 })
        ));
    }

    #[test]
    fn serde_representation() {
        let addr = AddrModeAddress::Nwk(0x1234);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, r#"{"mode":"nwk","address":4660}"#);

        let ieee: AddrModeAddress =
            serde_json::from_str(r#"{"mode":"ieee","address":"00:12:4b:00:1c:aa:bb:cc"}"#)
                .unwrap();
        assert_eq!(ieee.mode(), AddrMode::Ieee);

        let absent: AddrModeAddress = serde_json::from_str(r#"{"mode":"not_present"}"#).unwrap();
        assert_eq!(absent, AddrModeAddress::NotPresent);
    }
}
