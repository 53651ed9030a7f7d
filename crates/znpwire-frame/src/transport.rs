use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::general::GeneralFrame;
use crate::opcode::Opcode;

/// Start-of-frame marker.
pub const SOF: u8 = 0xFE;

/// Bytes a transport frame adds around its general frame: SOF (1) + FCS (1).
pub const TRANSPORT_OVERHEAD: usize = 2;

/// XOR of the length byte, both opcode bytes and every payload byte.
pub fn checksum(frame: &GeneralFrame) -> u8 {
    let [lo, hi] = frame.opcode().to_le_bytes();
    frame
        .payload()
        .iter()
        .fold(frame.length() ^ lo ^ hi, |acc, byte| acc ^ byte)
}

/// A general frame wrapped for the serial link.
///
/// ```text
/// ┌──────┬────────────────────┬──────┐
/// │ 0xFE │ general frame      │ FCS  │
/// └──────┴────────────────────┴──────┘
/// ```
///
/// A frame read with a bad checksum still parses; [`TransportFrame::is_valid`]
/// reports the mismatch and leaves the policy to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportFrame {
    frame: GeneralFrame,
    fcs: u8,
}

impl TransportFrame {
    /// Wrap a frame, computing its checksum.
    pub fn new(frame: GeneralFrame) -> Self {
        let fcs = checksum(&frame);
        Self { frame, fcs }
    }

    /// Wrap a frame with an explicit checksum byte, valid or not.
    pub fn with_fcs(frame: GeneralFrame, fcs: u8) -> Self {
        Self { frame, fcs }
    }

    pub fn frame(&self) -> &GeneralFrame {
        &self.frame
    }

    pub fn into_frame(self) -> GeneralFrame {
        self.frame
    }

    pub fn opcode(&self) -> Opcode {
        self.frame.opcode()
    }

    pub fn payload(&self) -> &Bytes {
        self.frame.payload()
    }

    /// The checksum byte carried by this frame.
    pub fn fcs(&self) -> u8 {
        self.fcs
    }

    /// Recomputes the checksum and compares it to the carried one.
    pub fn is_valid(&self) -> bool {
        checksum(&self.frame) == self.fcs
    }

    pub fn wire_size(&self) -> usize {
        TRANSPORT_OVERHEAD + self.frame.wire_size()
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(SOF);
        self.frame.encode(dst);
        dst.put_u8(self.fcs);
    }

    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode one frame from the front of `data`, returning the unconsumed rest.
    ///
    /// `data` must start at a frame boundary. A different first byte is
    /// [`FrameError::BadStartOfFrame`]; this function never scans forward.
    pub fn deserialize(data: &[u8]) -> Result<(Self, &[u8])> {
        let Some((&first, body)) = data.split_first() else {
            return Err(FrameError::InvalidFrame {
                needed: 1,
                available: 0,
            });
        };
        if first != SOF {
            return Err(FrameError::BadStartOfFrame(first));
        }

        let (frame, rest) = match GeneralFrame::deserialize(body) {
            Ok(parsed) => parsed,
            // Report sizes relative to the whole transport frame.
            Err(FrameError::InvalidFrame { needed, available }) => {
                return Err(FrameError::InvalidFrame {
                    needed: needed + TRANSPORT_OVERHEAD,
                    available: available + 1,
                })
            }
            Err(err) => return Err(err),
        };

        let Some((&fcs, rest)) = rest.split_first() else {
            return Err(FrameError::InvalidFrame {
                needed: frame.wire_size() + TRANSPORT_OVERHEAD,
                available: data.len(),
            });
        };

        Ok((Self { frame, fcs }, rest))
    }
}

impl From<GeneralFrame> for TransportFrame {
    fn from(frame: GeneralFrame) -> Self {
        Self::new(frame)
    }
}
