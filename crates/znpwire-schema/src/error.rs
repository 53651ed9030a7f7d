use znpwire_frame::{FrameError, Opcode};
use znpwire_types::CodecError;

/// Errors raised while building schemas or encoding and decoding commands.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A field could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The encoded payload could not be framed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A parameter declared by the schema was not supplied.
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// A supplied parameter is not declared by the schema.
    #[error("unexpected parameter: {0}")]
    UnexpectedParameter(String),

    /// A supplied value does not have the shape the parameter type requires.
    #[error("parameter {param}: expected {expected}, found {found}")]
    TypeMismatch {
        param: String,
        expected: String,
        found: &'static str,
    },

    /// Two parameters in one schema share a name.
    #[error("duplicate parameter name: {0}")]
    DuplicateParameter(String),

    /// A command with the same opcode or name is already registered.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),

    /// No command is registered for the opcode.
    #[error("unknown command {0}")]
    UnknownCommand(Opcode),

    /// No command is registered under the name.
    #[error("unknown command name: {0}")]
    UnknownCommandName(String),

    /// The command has no schema for the requested direction.
    #[error("command {0} has no response schema")]
    NoResponseSchema(String),

    /// Payload bytes remained after every parameter was decoded.
    #[error("{count} trailing bytes after decoding {command}")]
    TrailingBytes { command: String, count: usize },

    /// A type descriptor or enum definition is malformed.
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// The catalog file could not be loaded.
    #[error("failed to load catalog: {0}")]
    LoadFailed(String),

    /// The catalog document is not valid JSON or does not match the format.
    #[error("invalid catalog JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
