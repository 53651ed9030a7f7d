use znpwire_types::CodecError;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit in a single frame.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The length byte declares more than the protocol allows.
    #[error("declared frame length {0} exceeds protocol maximum")]
    LengthOutOfRange(u8),

    /// The buffer ends before the frame it declares.
    #[error("truncated frame: needed {needed} bytes, {available} available")]
    InvalidFrame { needed: usize, available: usize },

    /// The buffer does not start at a frame boundary.
    #[error("expected start-of-frame 0xFE, found 0x{0:02X}")]
    BadStartOfFrame(u8),

    /// A field inside the frame could not be decoded.
    #[error("frame field error: {0}")]
    Codec(#[from] CodecError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// True when the input was cut short and more bytes may complete it.
    pub fn is_truncated(&self) -> bool {
        matches!(self, FrameError::InvalidFrame { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
