use znpwire_frame::{GeneralFrame, TransportFrame};

use crate::cmd::{parse_hex, Context, DecodeArgs};
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::print_frame;

pub fn run(args: DecodeArgs, ctx: &Context) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;
    let frame = parse_frame(&bytes, args.general)?;

    if !args.general && !frame.is_valid() {
        tracing::warn!(
            fcs = frame.fcs(),
            expected = znpwire_frame::checksum(frame.frame()),
            "frame checksum mismatch"
        );
    }

    let catalog = ctx.catalog()?;
    let decoded = catalog.decode(frame.frame());
    print_frame(&frame, !args.general, decoded.as_ref(), ctx.format);

    match decoded {
        Ok(_) => Ok(SUCCESS),
        Err(err) => {
            tracing::debug!(error = %err, "frame did not decode against the catalog");
            Ok(DATA_INVALID)
        }
    }
}

/// Parse exactly one frame, rejecting bytes that follow it.
fn parse_frame(bytes: &[u8], general: bool) -> CliResult<TransportFrame> {
    let (frame, rest) = if general {
        GeneralFrame::deserialize(bytes).map(|(frame, rest)| (TransportFrame::from(frame), rest))
    } else {
        TransportFrame::deserialize(bytes)
    }
    .map_err(|err| frame_error("invalid frame", err))?;

    if !rest.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{} unexpected bytes after the frame", rest.len()),
        ));
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transport_and_general_frames() {
        let frame = parse_frame(&[0xFE, 0x02, 0x61, 0x01, 0x11, 0x00, 0x73], false).unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.opcode().raw(), 0x0161);

        let frame = parse_frame(&[0x02, 0x61, 0x01, 0x11, 0x00], true).unwrap();
        assert_eq!(frame.payload().as_ref(), &[0x11, 0x00]);
    }

    #[test]
    fn rejects_trailing_and_truncated_input() {
        let err = parse_frame(&[0xFE, 0x00, 0x21, 0x01, 0x20, 0xAA], false).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);

        let err = parse_frame(&[0xFE, 0x02, 0x61], false).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);

        let err = parse_frame(&[0x00, 0x21, 0x01, 0x20], false).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
