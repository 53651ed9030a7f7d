//! Codec for the Texas Instruments Z-Stack ZNP serial protocol.
//!
//! znpwire turns named command parameters into framed bytes for a ZNP
//! coprocessor and turns framed bytes back into named parameters.
//!
//! # Crate Structure
//!
//! - [`types`]: primitive and container field codecs
//! - [`frame`]: general and transport frames, opcodes, stream adapters
//! - [`schema`]: parameter schemas and the command catalog (behind `schema` feature)

/// Re-export field codec types.
pub mod types {
    pub use znpwire_types::*;
}

/// Re-export frame types.
pub mod frame {
    pub use znpwire_frame::*;
}

/// Re-export schema and catalog types (requires `schema` feature).
#[cfg(feature = "schema")]
pub mod schema {
    pub use znpwire_schema::*;
}
