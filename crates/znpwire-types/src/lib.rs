//! Primitive and container codecs for the Z-Stack ZNP wire protocol.
//!
//! This is the lowest layer of znpwire: the alphabet every frame and schema
//! is built from. All integers are little-endian. Every decoder takes a byte
//! slice and returns the decoded value together with the unconsumed rest.

pub mod address;
pub mod container;
pub mod enumeration;
pub mod error;
pub mod primitive;

pub use address::{AddrMode, AddrModeAddress, Eui64};
pub use container::{
    decode_blob, decode_count, decode_fixed_list, decode_lv_list, decode_repeated, encode_blob,
    encode_count, encode_fixed_list, encode_lv_list, LIST_PREFIX, LONG_BYTES_PREFIX,
    SHORT_BYTES_PREFIX,
};
pub use enumeration::EnumDef;
pub use error::{CodecError, Result};
pub use primitive::{take, Decode, Encode, IntWidth};
