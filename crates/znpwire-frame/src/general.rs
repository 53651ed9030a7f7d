use bytes::{BufMut, Bytes, BytesMut};
use znpwire_types::Decode;

use crate::error::{FrameError, Result};
use crate::opcode::Opcode;

/// General frame header: length (1) + opcode (2) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Largest payload a single frame can carry.
pub const MAX_PAYLOAD: usize = 250;

/// An opcode and its payload.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────┬──────────┬────────────────────┐
/// │ Length (1B)│ Cmd0     │ Cmd1     │ Payload            │
/// │ ≤ 250      │ type|sub │ id       │ (Length bytes)     │
/// └────────────┴──────────┴──────────┴────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneralFrame {
    opcode: Opcode,
    payload: Bytes,
}

impl GeneralFrame {
    /// Create a frame, rejecting payloads larger than [`MAX_PAYLOAD`].
    pub fn new(opcode: impl Into<Opcode>, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        Ok(Self {
            opcode: opcode.into(),
            payload,
        })
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// The length byte as transmitted.
    pub fn length(&self) -> u8 {
        // Bounded by MAX_PAYLOAD at construction.
        self.payload.len() as u8
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Append the wire form to `dst`.
    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.length());
        dst.put_u16_le(self.opcode.raw());
        dst.put_slice(&self.payload);
    }

    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode one frame from the front of `data`, returning the unconsumed rest.
    pub fn deserialize(data: &[u8]) -> Result<(Self, &[u8])> {
        let Some(&length) = data.first() else {
            return Err(FrameError::InvalidFrame {
                needed: HEADER_SIZE,
                available: 0,
            });
        };

        if usize::from(length) > MAX_PAYLOAD {
            return Err(FrameError::LengthOutOfRange(length));
        }

        let total = HEADER_SIZE + usize::from(length);
        if data.len() < total {
            return Err(FrameError::InvalidFrame {
                needed: total,
                available: data.len(),
            });
        }

        let (opcode, body) = Opcode::decode(&data[1..total])?;
        let frame = Self {
            opcode,
            payload: Bytes::copy_from_slice(body),
        };

        Ok((frame, &data[total..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_length_opcode_payload() {
        let data = b"\xaa\x2d\xccdata goes in here\x00\x00";
        let frame = GeneralFrame::new(0x0161u16, data.to_vec()).unwrap();

        let mut expected = vec![data.len() as u8, 0x61, 0x01];
        expected.extend_from_slice(data);
        assert_eq!(frame.serialize().as_ref(), expected.as_slice());
        assert_eq!(frame.wire_size(), HEADER_SIZE + data.len());
    }

    #[test]
    fn deserialize_returns_trailing_bytes() {
        let data = b"\xaa\x2d\xccdata goes in here\x00\x00";
        let extra = b"the rest of the owl\x00\x00";

        let mut wire = vec![data.len() as u8, 0x23, 0x00];
        wire.extend_from_slice(data);
        wire.extend_from_slice(extra);

        let (frame, rest) = GeneralFrame::deserialize(&wire).unwrap();
        assert_eq!(frame.opcode().raw(), 0x0023);
        assert_eq!(frame.payload().as_ref(), data);
        assert_eq!(rest, extra);
    }

    #[test]
    fn payload_limit_is_enforced_at_construction() {
        assert!(GeneralFrame::new(0u16, vec![0u8; MAX_PAYLOAD]).is_ok());
        assert!(matches!(
            GeneralFrame::new(0u16, vec![0u8; MAX_PAYLOAD + 1]),
            Err(FrameError::PayloadTooLarge { size: 251, max: 250 })
        ));
    }

    #[test]
    fn oversized_length_byte_is_a_protocol_violation() {
        let mut wire = vec![0xFB];
        wire.extend_from_slice(&[0u8; 258]);
        assert!(matches!(
            GeneralFrame::deserialize(&wire),
            Err(FrameError::LengthOutOfRange(0xFB))
        ));

        // Checked before truncation.
        assert!(matches!(
            GeneralFrame::deserialize(&[0xFF, 0x00, 0x00]),
            Err(FrameError::LengthOutOfRange(0xFF))
        ));
    }

    #[test]
    fn truncated_frame_is_invalid_frame() {
        let err = GeneralFrame::deserialize(&[0x04, 0x00, 0x00]).unwrap_err();
        assert!(err.is_truncated());
        assert!(matches!(
            err,
            FrameError::InvalidFrame {
                needed: 7,
                available: 3
            }
        ));

        assert!(GeneralFrame::deserialize(&[]).unwrap_err().is_truncated());
        assert!(GeneralFrame::deserialize(&[0x00, 0x21]).unwrap_err().is_truncated());
    }

    #[test]
    fn roundtrip_across_payload_sizes() {
        for len in [0usize, 1, 2, 100, 248, 250] {
            let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let frame = GeneralFrame::new(0x1234u16, payload).unwrap();
            let wire = frame.serialize();
            let (decoded, rest) = GeneralFrame::deserialize(&wire).unwrap();
            assert_eq!(decoded, frame);
            assert!(rest.is_empty());
        }
    }

    #[test]
    fn empty_payload() {
        let frame = GeneralFrame::new(0x0121u16, Bytes::new()).unwrap();
        assert_eq!(frame.serialize().as_ref(), &[0x00, 0x21, 0x01]);
    }
}
