use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use znpwire_frame::{CommandType, Opcode, Subsystem, TransportFrame};
use znpwire_schema::{Command, CommandDef, Direction, Params, Schema, SchemaError};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    opcode: String,
    command_type: Option<&'static str>,
    subsystem: Option<&'static str>,
    id: u8,
    length: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    fcs_valid: Option<bool>,
    command: Option<String>,
    direction: Option<Direction>,
    params: Option<&'a Params>,
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Print one frame and whatever the catalog made of it.
///
/// `checksummed` is false when the input was a bare general frame, in which
/// case the FCS is neither reported nor written in raw mode.
pub fn print_frame(
    frame: &TransportFrame,
    checksummed: bool,
    decoded: Result<&Command, &SchemaError>,
    format: OutputFormat,
) {
    let opcode = frame.opcode();
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                opcode: opcode_hex(opcode),
                command_type: opcode.command_type().ok().map(CommandType::name),
                subsystem: opcode.subsystem().ok().map(Subsystem::name),
                id: opcode.id(),
                length: frame.frame().length(),
                fcs_valid: checksummed.then_some(frame.is_valid()),
                command: decoded.ok().map(|cmd| cmd.def().qualified_name()),
                direction: decoded.ok().map(Command::direction),
                params: decoded.ok().map(Command::params),
                payload: hex::encode(frame.payload()),
                error: decoded.err().map(ToString::to_string),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let (command, params) = match decoded {
                Ok(cmd) => (
                    format!("{} {}", cmd.def().qualified_name(), cmd.direction()),
                    params_lines(cmd.params(), "\n"),
                ),
                Err(err) => (format!("<{err}>"), hex::encode(frame.payload())),
            };
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OPCODE", "COMMAND", "LEN", "PARAMS"])
                .add_row(vec![
                    opcode.to_string(),
                    command,
                    frame.frame().length().to_string(),
                    params,
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let fcs = if checksummed && !frame.is_valid() {
                " [bad fcs]"
            } else {
                ""
            };
            match decoded {
                Ok(cmd) => println!(
                    "{opcode}{fcs} {} {}({})",
                    cmd.def().qualified_name(),
                    cmd.direction(),
                    params_lines(cmd.params(), ", ")
                ),
                Err(err) => println!(
                    "{opcode}{fcs} payload={} ({err})",
                    hex::encode(frame.payload())
                ),
            }
        }
        OutputFormat::Raw => {
            if checksummed {
                print_raw(&frame.serialize());
            } else {
                print_raw(&frame.frame().serialize());
            }
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput {
    command: String,
    direction: Direction,
    opcode: String,
    length: u8,
    frame: String,
}

pub fn print_encoded(def: &CommandDef, direction: Direction, wire: &[u8], frame: &TransportFrame, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                command: def.qualified_name(),
                direction,
                opcode: opcode_hex(frame.opcode()),
                length: frame.frame().length(),
                frame: hex::encode(wire),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "DIRECTION", "OPCODE", "FRAME"])
                .add_row(vec![
                    def.qualified_name(),
                    direction.to_string(),
                    frame.opcode().to_string(),
                    hex::encode(wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", hex::encode(wire)),
        OutputFormat::Raw => print_raw(wire),
    }
}

#[derive(Serialize)]
struct ParamOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    ty: String,
    description: &'a str,
}

#[derive(Serialize)]
struct CommandDefOutput<'a> {
    name: String,
    #[serde(rename = "type")]
    command_type: &'static str,
    opcode: String,
    response_opcode: Option<String>,
    request: Vec<ParamOutput<'a>>,
    response: Option<Vec<ParamOutput<'a>>>,
}

impl<'a> CommandDefOutput<'a> {
    fn new(def: &'a CommandDef) -> Self {
        Self {
            name: def.qualified_name(),
            command_type: def.command_type().name(),
            opcode: opcode_hex(def.opcode()),
            response_opcode: def.response_opcode().map(opcode_hex),
            request: def.request().map(schema_output).unwrap_or_default(),
            response: def.response().map(schema_output),
        }
    }
}

/// List catalog commands, one row each.
pub fn print_catalog<'a>(defs: impl IntoIterator<Item = &'a CommandDef>, format: OutputFormat) {
    let defs: Vec<&CommandDef> = defs.into_iter().collect();
    match format {
        OutputFormat::Json => {
            let out: Vec<CommandDefOutput<'_>> = defs.iter().map(|def| CommandDefOutput::new(def)).collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "TYPE", "OPCODE", "REQUEST", "RESPONSE"]);
            for def in &defs {
                table.add_row(vec![
                    def.qualified_name(),
                    def.command_type().name().to_string(),
                    opcode_hex(def.opcode()),
                    def.request().map(param_names).unwrap_or_default(),
                    def.response().map(param_names).unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for def in &defs {
                println!(
                    "{:<32} {:<4} {}",
                    def.qualified_name(),
                    def.command_type().name(),
                    opcode_hex(def.opcode())
                );
            }
        }
        OutputFormat::Raw => {
            for def in &defs {
                println!("{}", def.qualified_name());
            }
        }
    }
}

/// Describe a single command with its full parameter layout.
pub fn print_command_def(def: &CommandDef, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&CommandDefOutput::new(def)).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{} ({}, {})", def.qualified_name(), def.command_type().name(), def.opcode());
            let mut halves = vec![("request", def.request())];
            if def.response_opcode().is_some() {
                halves.push(("response", def.response()));
            }
            for (label, schema) in halves {
                let Some(schema) = schema else {
                    println!("{label}: (no parameters)");
                    continue;
                };
                if matches!(format, OutputFormat::Pretty) {
                    println!("{label}:");
                    for param in schema.params() {
                        println!("  {:<24} {:<20} {}", param.name(), param.param_type().to_string(), param.description());
                    }
                    continue;
                }
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec![label.to_uppercase(), "TYPE".to_string(), "DESCRIPTION".to_string()]);
                for param in schema.params() {
                    table.add_row(vec![
                        param.name().to_string(),
                        param.param_type().to_string(),
                        param.description().to_string(),
                    ]);
                }
                println!("{table}");
            }
        }
        OutputFormat::Raw => println!("{}", def.qualified_name()),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn opcode_hex(opcode: Opcode) -> String {
    format!("0x{:04X}", opcode.raw())
}

fn params_lines(params: &Params, sep: &str) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(sep)
}

fn param_names(schema: &Schema) -> String {
    schema
        .params()
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn schema_output(schema: &Schema) -> Vec<ParamOutput<'_>> {
    schema
        .params()
        .iter()
        .map(|p| ParamOutput {
            name: p.name(),
            ty: p.param_type().to_string(),
            description: p.description(),
        })
        .collect()
}
