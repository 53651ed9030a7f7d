use bytes::{Buf, BytesMut};

use crate::error::{FrameError, Result};
use crate::transport::{TransportFrame, SOF};

/// Configuration for the stream decoder.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Drop frames whose checksum does not match instead of yielding them.
    /// Default: true.
    pub discard_invalid_checksum: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            discard_invalid_checksum: true,
        }
    }
}

/// Append the wire form of `frame` to `dst`.
pub fn encode_frame(frame: &TransportFrame, dst: &mut BytesMut) {
    dst.reserve(frame.wire_size());
    frame.encode(dst);
}

/// Decode the next transport frame from a stream buffer.
///
/// Unlike [`TransportFrame::deserialize`], this scans forward: bytes before
/// the next start-of-frame marker are discarded, as is a marker followed by
/// an out-of-range length byte. Returns `Ok(None)` when the buffer holds no
/// complete frame yet; consumed bytes are removed from `src`.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<TransportFrame>> {
    loop {
        let Some(start) = src.iter().position(|&byte| byte == SOF) else {
            if !src.is_empty() {
                tracing::debug!(skipped = src.len(), "discarding bytes without start-of-frame");
                src.clear();
            }
            return Ok(None);
        };

        if start > 0 {
            tracing::debug!(skipped = start, "resynchronizing to start-of-frame");
            src.advance(start);
        }

        let parsed = TransportFrame::deserialize(src).map(|(frame, _)| frame);
        match parsed {
            Ok(frame) => {
                src.advance(frame.wire_size());
                if frame.is_valid() {
                    tracing::trace!(opcode = %frame.opcode(), len = frame.payload().len(), "decoded frame");
                    return Ok(Some(frame));
                }

                tracing::warn!(
                    opcode = %frame.opcode(),
                    fcs = frame.fcs(),
                    "frame checksum mismatch"
                );
                if !config.discard_invalid_checksum {
                    return Ok(Some(frame));
                }
            }
            Err(err) if err.is_truncated() => return Ok(None),
            Err(FrameError::LengthOutOfRange(length)) => {
                tracing::debug!(length, "skipping start-of-frame with out-of-range length");
                src.advance(1);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(feature = "async")]
mod tokio_codec {
    use bytes::BytesMut;
    use tokio_util::codec::{Decoder, Encoder};

    use super::{decode_frame, encode_frame, FrameConfig};
    use crate::error::FrameError;
    use crate::general::GeneralFrame;
    use crate::transport::TransportFrame;

    /// `tokio_util` codec yielding [`TransportFrame`]s from a byte stream.
    #[derive(Debug, Clone, Default)]
    pub struct ZnpCodec {
        config: FrameConfig,
    }

    impl ZnpCodec {
        pub fn new(config: FrameConfig) -> Self {
            Self { config }
        }

        pub fn config(&self) -> &FrameConfig {
            &self.config
        }
    }

    impl Decoder for ZnpCodec {
        type Item = TransportFrame;
        type Error = FrameError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            decode_frame(src, &self.config)
        }

        fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            match self.decode(src)? {
                Some(frame) => Ok(Some(frame)),
                None if src.is_empty() => Ok(None),
                None => Err(FrameError::ConnectionClosed),
            }
        }
    }

    impl Encoder<TransportFrame> for ZnpCodec {
        type Error = FrameError;

        fn encode(&mut self, item: TransportFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
            encode_frame(&item, dst);
            Ok(())
        }
    }

    impl Encoder<GeneralFrame> for ZnpCodec {
        type Error = FrameError;

        fn encode(&mut self, item: GeneralFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
            encode_frame(&TransportFrame::new(item), dst);
            Ok(())
        }
    }
}

#[cfg(feature = "async")]
pub use tokio_codec::ZnpCodec;

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;
    use crate::general::GeneralFrame;

    fn frame(opcode: u16, payload: &[u8]) -> TransportFrame {
        TransportFrame::new(GeneralFrame::new(opcode, payload.to_vec()).unwrap())
    }

    fn decode(buf: &mut BytesMut) -> Option<TransportFrame> {
        decode_frame(buf, &FrameConfig::default()).unwrap()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let sent = frame(0x0161, b"\x11\x00");
        let mut buf = BytesMut::new();
        encode_frame(&sent, &mut buf);
        assert_eq!(buf.as_ref(), b"\xfe\x02\x61\x01\x11\x00\x73");

        assert_eq!(decode(&mut buf), Some(sent));
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_frame_waits_for_more() {
        let mut wire = BytesMut::new();
        encode_frame(&frame(0x4180, b"reset"), &mut wire);

        let mut buf = BytesMut::new();
        for (i, byte) in wire.iter().enumerate() {
            buf.put_u8(*byte);
            let decoded = decode(&mut buf);
            if i + 1 < wire.len() {
                assert!(decoded.is_none());
            } else {
                assert_eq!(decoded.unwrap().payload().as_ref(), b"reset");
            }
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn skips_leading_garbage() {
        let mut buf = BytesMut::from(&b"\x00\x11\x22"[..]);
        encode_frame(&frame(0x0121, b""), &mut buf);

        let decoded = decode(&mut buf).unwrap();
        assert_eq!(decoded.opcode().raw(), 0x0121);
        assert!(buf.is_empty());
    }

    #[test]
    fn garbage_without_marker_is_dropped() {
        let mut buf = BytesMut::from(&b"\x01\x02\x03\x04"[..]);
        assert!(decode(&mut buf).is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn skips_marker_with_out_of_range_length() {
        let mut buf = BytesMut::from(&b"\xfe\xff\x00"[..]);
        encode_frame(&frame(0x0161, b"\x11\x00"), &mut buf);

        let decoded = decode(&mut buf).unwrap();
        assert_eq!(decoded.payload().as_ref(), b"\x11\x00");
        assert!(buf.is_empty());
    }

    #[test]
    fn invalid_checksum_dropped_by_default() {
        let mut buf = BytesMut::from(&b"\xfe\x02\x61\x01\x11\x00\x74"[..]);
        encode_frame(&frame(0x0121, b""), &mut buf);

        let decoded = decode(&mut buf).unwrap();
        assert_eq!(decoded.opcode().raw(), 0x0121);
        assert!(buf.is_empty());
    }

    #[test]
    fn invalid_checksum_kept_when_configured() {
        let config = FrameConfig {
            discard_invalid_checksum: false,
        };
        let mut buf = BytesMut::from(&b"\xfe\x02\x61\x01\x11\x00\x74"[..]);

        let decoded = decode_frame(&mut buf, &config).unwrap().unwrap();
        assert!(!decoded.is_valid());
        assert_eq!(decoded.fcs(), 0x74);
        assert_eq!(decoded.payload().as_ref(), b"\x11\x00");
    }

    #[test]
    fn multiple_frames_in_one_buffer() {
        let mut buf = BytesMut::new();
        encode_frame(&frame(0x0121, b""), &mut buf);
        encode_frame(&frame(0x0161, b"\x79\x01"), &mut buf);
        buf.put_slice(b"\xfe\x05");

        assert_eq!(decode(&mut buf).unwrap().opcode().raw(), 0x0121);
        assert_eq!(decode(&mut buf).unwrap().opcode().raw(), 0x0161);
        assert!(decode(&mut buf).is_none());
        assert_eq!(buf.as_ref(), b"\xfe\x05");
    }
}

#[cfg(all(test, feature = "async"))]
mod async_tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::general::GeneralFrame;

    #[tokio::test]
    async fn framed_write_then_read() {
        let mut sink = FramedWrite::new(Vec::new(), ZnpCodec::default());
        sink.send(GeneralFrame::new(0x0121u16, Vec::new()).unwrap())
            .await
            .unwrap();
        sink.send(TransportFrame::new(
            GeneralFrame::new(0x0161u16, b"\x11\x00".to_vec()).unwrap(),
        ))
        .await
        .unwrap();
        let wire = sink.into_inner();
        assert_eq!(&wire[..5], b"\xfe\x00\x21\x01\x20");

        let mut stream = FramedRead::new(wire.as_slice(), ZnpCodec::default());
        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.opcode().raw(), 0x0121);
        assert_eq!(second.payload().as_ref(), b"\x11\x00");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn eof_inside_frame_is_an_error() {
        let wire: &[u8] = b"\xfe\x02\x61\x01";
        let mut stream = FramedRead::new(wire, ZnpCodec::default());
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }
}
