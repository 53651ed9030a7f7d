use std::ops::Deref;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use znpwire_schema::{CatalogConfig, CommandCatalog};

use crate::exit::{schema_error, CliError, CliResult, DATA_INVALID};
use crate::output::OutputFormat;

pub mod catalog;
pub mod decode;
pub mod encode;
pub mod read;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a named command into a frame.
    Encode(EncodeArgs),
    /// Decode a single frame given as hex.
    Decode(DecodeArgs),
    /// Read and decode a stream of frames from a file or stdin.
    Read(ReadArgs),
    /// List or describe catalog commands.
    Catalog(CatalogArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every subcommand.
#[derive(Debug)]
pub struct Context {
    pub format: OutputFormat,
    pub catalog_path: Option<PathBuf>,
    pub allow_trailing_bytes: bool,
}

impl Context {
    /// Load the catalog named by `--catalog`, or the builtin one.
    pub fn catalog(&self) -> CliResult<LoadedCatalog> {
        let config = CatalogConfig {
            allow_trailing_bytes: self.allow_trailing_bytes,
            ..CatalogConfig::default()
        };

        let loaded = match &self.catalog_path {
            Some(path) => CommandCatalog::from_file_with_config(path, config)
                .map(|catalog| LoadedCatalog::Loaded(Box::new(catalog)))
                .map_err(|err| schema_error(&format!("loading {}", path.display()), err))?,
            None if config == CatalogConfig::default() => CommandCatalog::builtin()
                .map(LoadedCatalog::Builtin)
                .map_err(|err| schema_error("loading builtin catalog", err))?,
            None => CommandCatalog::builtin_with_config(config)
                .map(|catalog| LoadedCatalog::Loaded(Box::new(catalog)))
                .map_err(|err| schema_error("loading builtin catalog", err))?,
        };
        tracing::debug!(commands = loaded.len(), "catalog ready");
        Ok(loaded)
    }
}

/// The shared builtin catalog or one loaded for this run.
pub enum LoadedCatalog {
    Builtin(&'static CommandCatalog),
    Loaded(Box<CommandCatalog>),
}

impl Deref for LoadedCatalog {
    type Target = CommandCatalog;

    fn deref(&self) -> &CommandCatalog {
        match self {
            LoadedCatalog::Builtin(catalog) => catalog,
            LoadedCatalog::Loaded(catalog) => catalog,
        }
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, ctx),
        Command::Decode(args) => decode::run(args, ctx),
        Command::Read(args) => read::run(args, ctx),
        Command::Catalog(args) => catalog::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Qualified command name, e.g. SYS.Ping or AF.DataRequest.
    pub command: String,
    /// Encode the SRSP answering an SREQ instead of the request.
    #[arg(long)]
    pub response: bool,
    /// Parameters as a JSON object.
    #[arg(long, conflicts_with_all = ["params_file", "param"])]
    pub json: Option<String>,
    /// Read the parameter JSON object from a file.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["json", "param"])]
    pub params_file: Option<PathBuf>,
    /// A single parameter as NAME=VALUE (repeatable). VALUE is read as JSON
    /// when it parses, otherwise as a string.
    #[arg(long, short = 'p', value_name = "NAME=VALUE")]
    pub param: Vec<String>,
    /// Emit the general frame only, without start marker and checksum.
    #[arg(long)]
    pub general: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex. Whitespace and colons are ignored.
    pub hex: String,
    /// The input is a general frame, without start marker and checksum.
    #[arg(long)]
    pub general: bool,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// File to read frames from. Reads stdin when absent or `-`.
    pub input: Option<PathBuf>,
    /// The input is hex text rather than raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Stop after N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Report frames with a bad checksum instead of dropping them.
    #[arg(long)]
    pub keep_invalid: bool,
}

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Describe a single command instead of listing all of them.
    pub command: Option<String>,
    /// Only list commands of this subsystem (e.g. SYS, AF, UTIL).
    #[arg(long)]
    pub subsystem: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex text, ignoring whitespace, colons and a leading `0x`.
pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(&digits).map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex input: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_separators() {
        assert_eq!(parse_hex("fe 02 61 01\n11 00 73").unwrap(), vec![0xFE, 0x02, 0x61, 0x01, 0x11, 0x00, 0x73]);
        assert_eq!(parse_hex("0xFE:00:21").unwrap(), vec![0xFE, 0x00, 0x21]);
        assert!(parse_hex("").unwrap().is_empty());
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert_eq!(parse_hex("fe0").unwrap_err().code, DATA_INVALID);
        assert_eq!(parse_hex("zz").unwrap_err().code, DATA_INVALID);
    }
}
