//! General and transport framing for the Z-Stack ZNP serial protocol.
//!
//! A general frame is a length byte, a 16-bit opcode and up to 250 payload
//! bytes. On the serial link it travels inside a transport frame:
//! - a `0xFE` start-of-frame marker
//! - the general frame
//! - an XOR checksum over the general frame
//!
//! [`FrameReader`], [`FrameWriter`] and (feature `async`) `ZnpCodec` move
//! frames over caller-supplied byte streams, resynchronizing past noise.

pub mod codec;
pub mod error;
pub mod general;
pub mod opcode;
pub mod reader;
pub mod transport;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::ZnpCodec;
pub use codec::{decode_frame, encode_frame, FrameConfig};
pub use error::{FrameError, Result};
pub use general::{GeneralFrame, HEADER_SIZE, MAX_PAYLOAD};
pub use opcode::{CommandType, Opcode, Subsystem};
pub use reader::FrameReader;
pub use transport::{checksum, TransportFrame, SOF, TRANSPORT_OVERHEAD};
pub use writer::FrameWriter;
