mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "znpwire", version, about = "Z-Stack ZNP frame codec")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    /// JSON command catalog to use instead of the builtin one.
    #[arg(long, value_name = "FILE", env = "ZNPWIRE_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// Accept payload bytes left over after the last parameter.
    #[arg(long, global = true)]
    allow_trailing_bytes: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let ctx = Context {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        catalog_path: cli.catalog,
        allow_trailing_bytes: cli.allow_trailing_bytes,
    };
    let result = cmd::run(cli.command, &ctx);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "znpwire",
            "encode",
            "AF.DataRequest",
            "-p",
            "DstAddr=0x1234",
            "-p",
            "Data=0102",
        ])
        .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.command, "AF.DataRequest");
                assert_eq!(args.param.len(), 2);
                assert!(!args.response);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_param_sources() {
        let err = Cli::try_parse_from([
            "znpwire",
            "encode",
            "SYS.Ping",
            "--json",
            "{}",
            "--param",
            "X=1",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "znpwire",
            "decode",
            "fe0021 0120",
            "--format",
            "json",
            "--catalog",
            "/tmp/catalog.json",
        ])
        .expect("decode args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert_eq!(cli.catalog, Some(PathBuf::from("/tmp/catalog.json")));
        assert!(matches!(cli.command, Command::Decode(_)));
    }
}
