/// Errors produced while encoding or decoding wire values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The input ended before a value could be fully read.
    #[error("insufficient data: needed {needed} bytes, {available} available")]
    InsufficientData { needed: usize, available: usize },

    /// An enumeration was decoded from a raw value with no matching variant.
    #[error("invalid {type_name} value: 0x{value:X}")]
    InvalidEnumValue { type_name: String, value: u64 },

    /// A value cannot be represented in its declared wire type.
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
