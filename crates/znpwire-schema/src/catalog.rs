use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;
use znpwire_frame::{CommandType, GeneralFrame, Opcode, Subsystem, TransportFrame};
use znpwire_types::{EnumDef, IntWidth};

use crate::command::{Command, CommandDef, Direction};
use crate::config::CatalogConfig;
use crate::error::{Result, SchemaError};
use crate::schema::{Param, Schema};
use crate::types::{parse_unsigned, EnumTable, ParamType};
use crate::value::Params;

const BUILTIN_CATALOG: &str = include_str!("../catalog/builtin.json");

/// Opcode- and name-indexed set of command definitions.
///
/// SREQ definitions are indexed under both their SREQ and SRSP opcodes, so a
/// lookup tells which half of the exchange a frame carries.
#[derive(Debug)]
pub struct CommandCatalog {
    by_opcode: HashMap<Opcode, (Arc<CommandDef>, Direction)>,
    by_name: HashMap<String, Arc<CommandDef>>,
    enums: EnumTable,
    config: CatalogConfig,
}

impl CommandCatalog {
    /// Create an empty catalog with default config.
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::default())
    }

    /// Create an empty catalog with explicit config.
    pub fn with_config(config: CatalogConfig) -> Self {
        Self {
            by_opcode: HashMap::new(),
            by_name: HashMap::new(),
            enums: EnumTable::new(),
            config,
        }
    }

    /// The catalog shipped with the crate, parsed on first use.
    pub fn builtin() -> Result<&'static CommandCatalog> {
        static BUILTIN: OnceLock<std::result::Result<CommandCatalog, String>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| Self::from_json(BUILTIN_CATALOG).map_err(|err| err.to_string()))
            .as_ref()
            .map_err(|err| SchemaError::LoadFailed(format!("builtin catalog: {err}")))
    }

    /// A fresh copy of the shipped catalog using `config`.
    pub fn builtin_with_config(config: CatalogConfig) -> Result<Self> {
        Self::from_json_with_config(BUILTIN_CATALOG, config)
    }

    /// Register a command definition.
    ///
    /// Fails if the qualified name (compared ignoring case) or any opcode the
    /// definition occupies is already taken.
    pub fn register(&mut self, def: CommandDef) -> Result<Arc<CommandDef>> {
        let name = def.qualified_name();
        if let Some(existing) = self.by_name.keys().find(|key| key.eq_ignore_ascii_case(&name)) {
            return Err(SchemaError::DuplicateCommand(if *existing == name {
                name
            } else {
                format!("{name}: conflicts with {existing}")
            }));
        }

        let slots: Vec<(Opcode, Direction)> = [Direction::Request, Direction::Response]
            .into_iter()
            .filter_map(|direction| def.opcode_for(direction).map(|opcode| (opcode, direction)))
            .collect();
        if let Some((opcode, _)) = slots.iter().find(|(op, _)| self.by_opcode.contains_key(op)) {
            let existing = self
                .by_opcode
                .get(opcode)
                .map(|(other, _)| other.qualified_name())
                .unwrap_or_default();
            return Err(SchemaError::DuplicateCommand(format!(
                "{name}: opcode {opcode} already used by {existing}"
            )));
        }

        let def = Arc::new(def);
        for (opcode, direction) in slots {
            self.by_opcode.insert(opcode, (Arc::clone(&def), direction));
        }
        self.by_name.insert(name, Arc::clone(&def));
        tracing::trace!(command = %def.qualified_name(), opcode = %def.opcode(), "registered command");
        Ok(def)
    }

    /// Make an enumeration available to later type descriptors.
    pub fn add_enum(&mut self, def: EnumDef) -> Result<()> {
        if self.enums.contains_key(def.name()) {
            return Err(SchemaError::InvalidType(format!(
                "enum {} is already defined",
                def.name()
            )));
        }
        self.enums.insert(def.name().to_string(), Arc::new(def));
        Ok(())
    }

    /// Load a catalog from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_config(json, CatalogConfig::default())
    }

    /// Load a catalog from a JSON document with explicit config.
    pub fn from_json_with_config(json: &str, config: CatalogConfig) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        let mut catalog = Self::with_config(config);

        for (name, doc) in document.enums {
            let def = doc.build(&name)?;
            catalog.add_enum(def)?;
        }
        for doc in document.commands {
            let def = doc.build(&catalog.enums)?;
            catalog.register(def)?;
        }

        tracing::debug!(
            commands = catalog.by_name.len(),
            enums = catalog.enums.len(),
            "loaded command catalog"
        );
        Ok(catalog)
    }

    /// Load a catalog file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_config(path, CatalogConfig::default())
    }

    /// Load a catalog file with explicit config.
    ///
    /// Symlinks are refused and the file may not exceed
    /// `max_catalog_file_size` bytes.
    pub fn from_file_with_config(path: &Path, config: CatalogConfig) -> Result<Self> {
        let display = path.display();
        let path_metadata = std::fs::symlink_metadata(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{display}: {err}")))?;
        if path_metadata.file_type().is_symlink() {
            return Err(SchemaError::LoadFailed(format!(
                "refusing to load catalog symlink: {display}"
            )));
        }
        if !path_metadata.is_file() {
            return Err(SchemaError::LoadFailed(format!("not a regular file: {display}")));
        }

        let file = std::fs::File::open(path)
            .map_err(|err| SchemaError::LoadFailed(format!("failed opening catalog {display}: {err}")))?;
        let opened_metadata = file
            .metadata()
            .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

        #[cfg(unix)]
        {
            if !same_file_identity(&path_metadata, &opened_metadata) {
                return Err(SchemaError::LoadFailed(format!(
                    "catalog file changed during load: {display}"
                )));
            }
        }

        let max_bytes = config.max_catalog_file_size;
        if opened_metadata.len() > max_bytes as u64 {
            return Err(SchemaError::LoadFailed(format!(
                "catalog file too large ({} bytes): {display}",
                opened_metadata.len()
            )));
        }

        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| SchemaError::LoadFailed(format!("failed reading catalog {display}: {err}")))?;
        if content.len() > max_bytes {
            return Err(SchemaError::LoadFailed(format!(
                "catalog file too large while reading: {display}"
            )));
        }

        Self::from_json_with_config(&content, config)
    }

    /// Find the definition for an opcode and which half of it the opcode
    /// carries.
    pub fn lookup(&self, opcode: Opcode) -> Option<(Arc<CommandDef>, Direction)> {
        self.by_opcode
            .get(&opcode)
            .map(|(def, direction)| (Arc::clone(def), *direction))
    }

    /// Find a definition by qualified name (`SYS.Ping`), ignoring case.
    pub fn by_name(&self, name: &str) -> Option<Arc<CommandDef>> {
        if let Some(def) = self.by_name.get(name) {
            return Some(Arc::clone(def));
        }
        self.by_name
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, def)| Arc::clone(def))
    }

    /// All definitions, ordered by subsystem then id.
    pub fn commands(&self) -> Vec<Arc<CommandDef>> {
        let mut commands: Vec<Arc<CommandDef>> = self.by_name.values().cloned().collect();
        commands.sort_by_key(|def| (def.subsystem(), def.id(), def.command_type() as u8));
        commands
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn enums(&self) -> &EnumTable {
        &self.enums
    }

    /// Get catalog configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Encode a named command into a transport frame ready for the wire.
    pub fn encode(&self, name: &str, direction: Direction, params: &Params) -> Result<TransportFrame> {
        let def = self
            .by_name(name)
            .ok_or_else(|| SchemaError::UnknownCommandName(name.to_string()))?;
        let frame = def.encode(direction, params)?;
        tracing::debug!(
            command = %def.qualified_name(),
            %direction,
            opcode = %frame.opcode(),
            length = frame.length(),
            "encoded command"
        );
        Ok(TransportFrame::from(frame))
    }

    /// Decode a general frame into a named command.
    pub fn decode(&self, frame: &GeneralFrame) -> Result<Command> {
        let opcode = frame.opcode();
        let (def, direction) = self
            .lookup(opcode)
            .ok_or(SchemaError::UnknownCommand(opcode))?;

        let (params, rest) = def.decode_payload(direction, frame.payload())?;
        if !rest.is_empty() {
            if !self.config.allow_trailing_bytes {
                return Err(SchemaError::TrailingBytes {
                    command: def.qualified_name(),
                    count: rest.len(),
                });
            }
            tracing::debug!(
                command = %def.qualified_name(),
                count = rest.len(),
                "ignoring trailing payload bytes"
            );
        }

        Ok(Command::new(def, direction, params))
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    #[serde(default)]
    enums: BTreeMap<String, EnumDocument>,
    #[serde(default)]
    commands: Vec<CommandDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumDocument {
    #[serde(rename = "type")]
    ty: String,
    values: Vec<(String, NumberOrText)>,
}

impl EnumDocument {
    fn build(self, name: &str) -> Result<EnumDef> {
        let width = match ParamType::parse(&self.ty, &EnumTable::new())? {
            ParamType::UInt(width) => width,
            _ => {
                return Err(SchemaError::InvalidType(format!(
                    "enum {name}: underlying type must be unsigned, got {}",
                    self.ty
                )))
            }
        };
        let variants = self
            .values
            .into_iter()
            .map(|(variant, value)| {
                value
                    .resolve()
                    .map(|value| (variant, value))
                    .ok_or_else(|| SchemaError::InvalidType(format!("enum {name}: bad value")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EnumDef::new(name, width, variants)?)
    }
}

/// Numbers may be written as JSON numbers or as `"0x.."` strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

impl NumberOrText {
    fn resolve(&self) -> Option<u64> {
        match self {
            NumberOrText::Number(value) => Some(*value),
            NumberOrText::Text(text) => parse_unsigned(text),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandDocument {
    subsystem: String,
    name: String,
    #[serde(rename = "type")]
    command_type: String,
    id: NumberOrText,
    #[serde(default, alias = "payload")]
    request: Option<Vec<ParamDocument>>,
    #[serde(default)]
    response: Option<Vec<ParamDocument>>,
}

impl CommandDocument {
    fn build(self, enums: &EnumTable) -> Result<CommandDef> {
        let qualified = format!("{}.{}", self.subsystem, self.name);
        let context = |err: SchemaError| SchemaError::LoadFailed(format!("{qualified}: {err}"));

        let subsystem: Subsystem = self
            .subsystem
            .parse()
            .map_err(|err: znpwire_types::CodecError| context(err.into()))?;
        let command_type: CommandType = self
            .command_type
            .parse()
            .map_err(|err: znpwire_types::CodecError| context(err.into()))?;
        let id = self
            .id
            .resolve()
            .filter(|id| *id <= IntWidth::One.max_unsigned())
            .ok_or_else(|| context(SchemaError::InvalidType("command id must fit in one byte".into())))?
            as u8;

        if self.response.is_some() && command_type.response_type().is_none() {
            return Err(context(SchemaError::InvalidType(format!(
                "{command_type} commands have no response"
            ))));
        }

        let mut def = CommandDef::new(self.name, command_type, subsystem, id);
        if let Some(params) = self.request {
            def = def.with_request(build_schema(params, enums).map_err(context)?);
        }
        if let Some(params) = self.response {
            def = def.with_response(build_schema(params, enums).map_err(context)?);
        }
        Ok(def)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParamDocument {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    description: String,
}

fn build_schema(params: Vec<ParamDocument>, enums: &EnumTable) -> Result<Schema> {
    let params = params
        .into_iter()
        .map(|doc| Ok(Param::new(doc.name, ParamType::parse(&doc.ty, enums)?, doc.description)))
        .collect::<Result<Vec<_>>>()?;
    Schema::new(params)
}

#[cfg(unix)]
fn same_file_identity(path_metadata: &std::fs::Metadata, opened_metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}
