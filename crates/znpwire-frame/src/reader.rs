use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::transport::TransportFrame;

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 512;

/// Reads complete transport frames from any `Read` stream.
///
/// Handles partial reads and resynchronization internally; callers always
/// get complete frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<TransportFrame> {
        self.try_read_frame()?.ok_or(FrameError::ConnectionClosed)
    }

    /// Read the next complete frame, or `Ok(None)` on a clean EOF.
    ///
    /// EOF in the middle of a frame is `Err(FrameError::ConnectionClosed)`.
    pub fn try_read_frame(&mut self) -> Result<Option<TransportFrame>> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, &self.config)? {
                return Ok(Some(frame));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                tracing::debug!(buffered = self.buf.len(), "stream closed inside a frame");
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes read from the stream but not yet part of a returned frame.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<TransportFrame>;

    /// Yields frames until a clean EOF.
    fn next(&mut self) -> Option<Self::Item> {
        self.try_read_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;
    use crate::general::GeneralFrame;

    fn wire(frames: &[(u16, &[u8])]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (opcode, payload) in frames {
            let frame = TransportFrame::new(GeneralFrame::new(*opcode, payload.to_vec()).unwrap());
            encode_frame(&frame, &mut buf);
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[(0x0161, b"\x11\x00")])));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.opcode().raw(), 0x0161);
        assert_eq!(frame.payload().as_ref(), b"\x11\x00");
        assert!(frame.is_valid());
    }

    #[test]
    fn read_multiple_frames() {
        let bytes = wire(&[(0x0121, b""), (0x0161, b"\x11\x00"), (0x8144, b"\x00\x01\x02")]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        let opcodes: Vec<u16> = reader
            .by_ref()
            .map(|frame| frame.unwrap().opcode().raw())
            .collect();
        assert_eq!(opcodes, vec![0x0121, 0x0161, 0x8144]);
        assert!(reader.buffered().is_empty());
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(&[(0x4180, b"\x00\x02\x01\x02\x07\x01")]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.opcode().raw(), 0x4180);
        assert_eq!(frame.payload().len(), 6);
    }

    #[test]
    fn resyncs_past_noise_in_stream() {
        let mut bytes = b"\x00\xff\xfe\xfd".to_vec();
        bytes.extend(wire(&[(0x0121, b"")]));
        bytes.extend_from_slice(b"\xfe\x02\x61\x01\x11\x00\x74");
        bytes.extend(wire(&[(0x0161, b"\x11\x00")]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_frame().unwrap().opcode().raw(), 0x0121);
        assert_eq!(reader.read_frame().unwrap().fcs(), 0x73);
        assert!(reader.try_read_frame().unwrap().is_none());
    }

    #[test]
    fn invalid_checksum_passed_through_when_configured() {
        let config = FrameConfig {
            discard_invalid_checksum: false,
        };
        let bytes = b"\xfe\x02\x61\x01\x11\x00\x74".to_vec();
        let mut reader = FrameReader::with_config(Cursor::new(bytes), config);

        let frame = reader.read_frame().unwrap();
        assert!(!frame.is_valid());
        assert!(!reader.config().discard_invalid_checksum);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.try_read_frame().unwrap().is_none());
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut reader = FrameReader::new(Cursor::new(b"\xfe\x05\x61\x01only".to_vec()));
        let err = reader.try_read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.buffered(), b"\xfe\x05\x61\x01only");
    }

    #[test]
    fn trailing_noise_is_a_clean_eof() {
        let mut bytes = wire(&[(0x0121, b"")]);
        bytes.extend_from_slice(b"\x01\x02\x03");

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert!(reader.read_frame().is_ok());
        assert!(reader.next().is_none());
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        let ping = GeneralFrame::new(0x0121u16, Vec::new()).unwrap();
        writer.send(ping.clone()).unwrap();
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.frame(), &ping);
    }

    #[test]
    #[cfg(unix)]
    fn concurrent_reader_writer_threads() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        let reader_thread = std::thread::spawn(move || {
            for expected in 0..64u8 {
                let frame = reader.read_frame().unwrap();
                assert_eq!(frame.opcode().id(), expected);
                assert_eq!(frame.payload().as_ref(), format!("msg-{expected}").as_bytes());
            }
        });

        for id in 0..64u8 {
            let payload = format!("msg-{id}").into_bytes();
            let frame = GeneralFrame::new(u16::from(id) << 8 | 0x0044, payload).unwrap();
            writer.send(frame).unwrap();
        }

        reader_thread.join().unwrap();
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    #[test]
    fn read_would_block_propagates_io_error() {
        let reader = FlakyReader {
            error: Some(ErrorKind::WouldBlock),
            bytes: wire(&[(0x0121, b"")]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = FlakyReader {
            error: Some(ErrorKind::Interrupted),
            bytes: wire(&[(0x0121, b"")]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.opcode().raw(), 0x0121);
    }

    /// Fails the first read with `error`, then serves `bytes`.
    struct FlakyReader {
        error: Option<ErrorKind>,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.error.take() {
                return Err(std::io::Error::from(kind));
            }
            let remaining = &self.bytes[self.pos..];
            let n = remaining.len().min(buf.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            self.pos += n;
            Ok(n)
        }
    }
}
