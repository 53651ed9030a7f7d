use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use znpwire_frame::{CommandType, GeneralFrame, Opcode, Subsystem};

use crate::error::{Result, SchemaError};
use crate::schema::Schema;
use crate::value::Params;

/// Which half of a command a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The message travelling under the definition's own command type.
    Request,
    /// The SRSP answering an SREQ.
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => f.write_str("request"),
            Direction::Response => f.write_str("response"),
        }
    }
}

/// The static description of one command.
///
/// For an SREQ definition the request travels under the SREQ opcode and the
/// response under the SRSP opcode with the same subsystem and id. Other
/// command types describe a single message laid out by the request schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDef {
    name: String,
    command_type: CommandType,
    subsystem: Subsystem,
    id: u8,
    request: Option<Schema>,
    response: Option<Schema>,
}

impl CommandDef {
    pub fn new(name: impl Into<String>, command_type: CommandType, subsystem: Subsystem, id: u8) -> Self {
        Self {
            name: name.into(),
            command_type,
            subsystem,
            id,
            request: None,
            response: None,
        }
    }

    pub fn with_request(mut self, schema: Schema) -> Self {
        self.request = Some(schema);
        self
    }

    pub fn with_response(mut self, schema: Schema) -> Self {
        self.response = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `SUBSYSTEM.Name`, unique within a catalog.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.subsystem.name(), self.name)
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    pub fn subsystem(&self) -> Subsystem {
        self.subsystem
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::new(self.command_type, self.subsystem, self.id)
    }

    /// The SRSP opcode answering this command, if it has one.
    pub fn response_opcode(&self) -> Option<Opcode> {
        self.command_type
            .response_type()
            .map(|ty| self.opcode().with_type(ty))
    }

    pub fn opcode_for(&self, direction: Direction) -> Option<Opcode> {
        match direction {
            Direction::Request => Some(self.opcode()),
            Direction::Response => self.response_opcode(),
        }
    }

    pub fn request(&self) -> Option<&Schema> {
        self.request.as_ref()
    }

    pub fn response(&self) -> Option<&Schema> {
        self.response.as_ref()
    }

    /// Resolve the schema for `direction`.
    ///
    /// A missing request schema means the message carries no parameters.
    /// A missing response schema is an error.
    pub fn schema(&self, direction: Direction) -> Result<&Schema> {
        static EMPTY: Schema = Schema::EMPTY;
        match direction {
            Direction::Request => Ok(self.request.as_ref().unwrap_or(&EMPTY)),
            Direction::Response => {
                if self.response_opcode().is_none() {
                    return Err(SchemaError::NoResponseSchema(self.qualified_name()));
                }
                self.response
                    .as_ref()
                    .ok_or_else(|| SchemaError::NoResponseSchema(self.qualified_name()))
            }
        }
    }

    /// Encode `params` into a general frame for `direction`.
    pub fn encode(&self, direction: Direction, params: &Params) -> Result<GeneralFrame> {
        let schema = self.schema(direction)?;
        let opcode = self
            .opcode_for(direction)
            .ok_or_else(|| SchemaError::NoResponseSchema(self.qualified_name()))?;
        let payload = schema.serialize(params)?;
        Ok(GeneralFrame::new(opcode, payload)?)
    }

    /// Decode a payload for `direction`, returning the unconsumed rest.
    pub fn decode_payload<'a>(&self, direction: Direction, payload: &'a [u8]) -> Result<(Params, &'a [u8])> {
        self.schema(direction)?.deserialize(payload)
    }
}

/// A decoded message: its definition, direction and parameter values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    def: Arc<CommandDef>,
    direction: Direction,
    params: Params,
}

impl Command {
    pub fn new(def: Arc<CommandDef>, direction: Direction, params: Params) -> Self {
        Self {
            def,
            direction,
            params,
        }
    }

    pub fn def(&self) -> &CommandDef {
        &self.def
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }

    /// The opcode this message travels under.
    pub fn opcode(&self) -> Option<Opcode> {
        self.def.opcode_for(self.direction)
    }

    pub fn to_frame(&self) -> Result<GeneralFrame> {
        self.def.encode(self.direction, &self.params)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.def.qualified_name(), self.direction)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}
