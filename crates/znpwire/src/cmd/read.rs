use std::io::{Cursor, Read};
use std::path::Path;

use znpwire_frame::{FrameConfig, FrameError, FrameReader};

use crate::cmd::{parse_hex, Context, ReadArgs};
use crate::exit::{frame_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::print_frame;

pub fn run(args: ReadArgs, ctx: &Context) -> CliResult<i32> {
    let catalog = ctx.catalog()?;
    let input = open_input(args.input.as_deref(), args.hex)?;
    let config = FrameConfig {
        discard_invalid_checksum: !args.keep_invalid,
    };
    let mut reader = FrameReader::with_config(input, config);

    let mut printed = 0usize;
    let mut undecoded = 0usize;
    loop {
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }

        let frame = match reader.try_read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(FrameError::ConnectionClosed) => {
                tracing::warn!(
                    buffered = reader.buffered().len(),
                    "input ended in the middle of a frame"
                );
                return Ok(DATA_INVALID);
            }
            Err(err) => return Err(frame_error("read failed", err)),
        };

        let decoded = catalog.decode(frame.frame());
        if let Err(err) = &decoded {
            undecoded = undecoded.saturating_add(1);
            tracing::debug!(opcode = %frame.opcode(), error = %err, "frame not decoded");
        }
        print_frame(&frame, true, decoded.as_ref(), ctx.format);
        printed = printed.saturating_add(1);
    }

    tracing::debug!(frames = printed, undecoded, "finished reading");
    Ok(SUCCESS)
}

fn open_input(path: Option<&Path>, hex: bool) -> CliResult<Box<dyn Read>> {
    let mut source: Box<dyn Read> = match path {
        Some(path) if path != Path::new("-") => Box::new(
            std::fs::File::open(path)
                .map_err(|err| io_error(&format!("opening {}", path.display()), err))?,
        ),
        _ => Box::new(std::io::stdin()),
    };
    if !hex {
        return Ok(source);
    }

    let mut text = String::new();
    source
        .read_to_string(&mut text)
        .map_err(|err| io_error("reading hex input", err))?;
    Ok(Box::new(Cursor::new(parse_hex(&text)?)))
}
