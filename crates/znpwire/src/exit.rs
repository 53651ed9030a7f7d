use std::fmt;
use std::io;

use znpwire_frame::FrameError;
use znpwire_schema::SchemaError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => FAILURE,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::Frame(err) => frame_error(context, err),
        SchemaError::UnknownCommandName(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SchemaError::LoadFailed(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_map_to_exit_codes() {
        assert_eq!(
            schema_error("encode", SchemaError::UnknownCommandName("X.Y".into())).code,
            USAGE
        );
        assert_eq!(
            schema_error("encode", SchemaError::MissingParameter("Data".into())).code,
            DATA_INVALID
        );
        assert_eq!(
            schema_error("load", SchemaError::LoadFailed("gone".into())).code,
            FAILURE
        );
        assert_eq!(
            schema_error("encode", SchemaError::Frame(FrameError::PayloadTooLarge { size: 251, max: 250 })).code,
            DATA_INVALID
        );
    }

    #[test]
    fn io_errors_map_to_exit_codes() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "nope");
        assert_eq!(io_error("open", missing).code, FAILURE);
        let other = io::Error::other("boom");
        assert_eq!(io_error("read", other).code, INTERNAL);
    }
}
