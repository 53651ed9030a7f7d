//! Command identifiers.
//!
//! An opcode packs the command type, subsystem and command id into 16 bits.
//! It travels little-endian, so the low byte is the firmware's `Cmd0` and the
//! high byte is `Cmd1`:
//!
//! ```text
//!  15            8 7   5 4       0
//! +---------------+-----+---------+
//! |  command id   |type |subsystem|
//! +---------------+-----+---------+
//! ```
//!
//! The type field is three bits wide in firmware, but only values 0-3 are
//! defined; bit 7 is always clear for a well-formed opcode.

use std::fmt;
use std::str::FromStr;

use bytes::BufMut;
use znpwire_types::{CodecError, Decode, Encode};

const SUBSYSTEM_MASK: u16 = 0x001F;
const TYPE_SHIFT: u16 = 5;
const TYPE_MASK: u16 = 0x00E0;
const ID_SHIFT: u16 = 8;

/// The command type field of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CommandType {
    /// Poll for queued data.
    Poll = 0,
    /// Synchronous request; answered immediately by an SRSP.
    SReq = 1,
    /// Asynchronous message (requests and device callbacks).
    AReq = 2,
    /// Synchronous response to an SREQ.
    SRsp = 3,
}

impl CommandType {
    pub fn name(self) -> &'static str {
        match self {
            CommandType::Poll => "POLL",
            CommandType::SReq => "SREQ",
            CommandType::AReq => "AREQ",
            CommandType::SRsp => "SRSP",
        }
    }

    /// SREQ and SRSP form the synchronous request/response pair.
    pub fn is_synchronous(self) -> bool {
        matches!(self, CommandType::SReq | CommandType::SRsp)
    }

    /// The type a reply to this command travels under, if any.
    pub fn response_type(self) -> Option<CommandType> {
        match self {
            CommandType::SReq => Some(CommandType::SRsp),
            _ => None,
        }
    }
}

impl TryFrom<u8> for CommandType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, CodecError> {
        match value {
            0 => Ok(CommandType::Poll),
            1 => Ok(CommandType::SReq),
            2 => Ok(CommandType::AReq),
            3 => Ok(CommandType::SRsp),
            other => Err(CodecError::InvalidEnumValue {
                type_name: "CommandType".to_string(),
                value: u64::from(other),
            }),
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CommandType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, CodecError> {
        [
            CommandType::Poll,
            CommandType::SReq,
            CommandType::AReq,
            CommandType::SRsp,
        ]
        .into_iter()
        .find(|ty| ty.name().eq_ignore_ascii_case(s))
        .ok_or_else(|| CodecError::ValueOutOfRange(format!("unknown command type: {s}")))
    }
}

/// Functional area that owns a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Subsystem {
    RpcError = 0x00,
    Sys = 0x01,
    Mac = 0x02,
    Nwk = 0x03,
    Af = 0x04,
    Zdo = 0x05,
    Sapi = 0x06,
    Util = 0x07,
    Debug = 0x08,
    App = 0x09,
    Ota = 0x0A,
    Znp = 0x0B,
    Ubl = 0x0D,
    AppConfig = 0x0F,
    Zgp = 0x15,
}

impl Subsystem {
    pub const ALL: [Subsystem; 15] = [
        Subsystem::RpcError,
        Subsystem::Sys,
        Subsystem::Mac,
        Subsystem::Nwk,
        Subsystem::Af,
        Subsystem::Zdo,
        Subsystem::Sapi,
        Subsystem::Util,
        Subsystem::Debug,
        Subsystem::App,
        Subsystem::Ota,
        Subsystem::Znp,
        Subsystem::Ubl,
        Subsystem::AppConfig,
        Subsystem::Zgp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Subsystem::RpcError => "RPC_ERROR",
            Subsystem::Sys => "SYS",
            Subsystem::Mac => "MAC",
            Subsystem::Nwk => "NWK",
            Subsystem::Af => "AF",
            Subsystem::Zdo => "ZDO",
            Subsystem::Sapi => "SAPI",
            Subsystem::Util => "UTIL",
            Subsystem::Debug => "DEBUG",
            Subsystem::App => "APP",
            Subsystem::Ota => "OTA",
            Subsystem::Znp => "ZNP",
            Subsystem::Ubl => "UBL",
            Subsystem::AppConfig => "APP_CONFIG",
            Subsystem::Zgp => "ZGP",
        }
    }
}

impl TryFrom<u8> for Subsystem {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, CodecError> {
        Subsystem::ALL
            .into_iter()
            .find(|sub| *sub as u8 == value)
            .ok_or_else(|| CodecError::InvalidEnumValue {
                type_name: "Subsystem".to_string(),
                value: u64::from(value),
            })
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Subsystem {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, CodecError> {
        Subsystem::ALL
            .into_iter()
            .find(|sub| sub.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodecError::ValueOutOfRange(format!("unknown subsystem: {s}")))
    }
}

/// A packed 16-bit command identifier.
///
/// Any `u16` is accepted so that frames with unknown opcodes still parse;
/// [`Opcode::command_type`] and [`Opcode::subsystem`] validate on access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opcode(u16);

impl Opcode {
    /// Wrap a raw 16-bit opcode.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn new(command_type: CommandType, subsystem: Subsystem, id: u8) -> Self {
        Self(((id as u16) << ID_SHIFT) | ((command_type as u16) << TYPE_SHIFT) | subsystem as u16)
    }

    /// Build from raw field values, rejecting values outside their bit ranges.
    pub fn from_fields(command_type: u8, subsystem: u8, id: u8) -> Result<Self, CodecError> {
        let command_type = CommandType::try_from(command_type)
            .map_err(|_| CodecError::ValueOutOfRange(format!("command type {command_type} > 3")))?;
        if u16::from(subsystem) > SUBSYSTEM_MASK {
            return Err(CodecError::ValueOutOfRange(format!(
                "subsystem {subsystem} does not fit in 5 bits"
            )));
        }
        Ok(Self(
            (u16::from(id) << ID_SHIFT) | ((command_type as u16) << TYPE_SHIFT) | u16::from(subsystem),
        ))
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Low byte: type and subsystem.
    pub const fn cmd0(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// High byte: command id.
    pub const fn id(self) -> u8 {
        (self.0 >> ID_SHIFT) as u8
    }

    pub fn subsystem_bits(self) -> u8 {
        (self.0 & SUBSYSTEM_MASK) as u8
    }

    pub fn command_type(self) -> Result<CommandType, CodecError> {
        CommandType::try_from(((self.0 & TYPE_MASK) >> TYPE_SHIFT) as u8)
    }

    pub fn subsystem(self) -> Result<Subsystem, CodecError> {
        Subsystem::try_from(self.subsystem_bits())
    }

    /// The same subsystem and id under a different command type.
    pub const fn with_type(self, command_type: CommandType) -> Self {
        Self((self.0 & !TYPE_MASK) | ((command_type as u16) << TYPE_SHIFT))
    }

    pub fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}

impl From<u16> for Opcode {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Opcode> for u16 {
    fn from(opcode: Opcode) -> Self {
        opcode.0
    }
}

impl Encode for Opcode {
    fn encode<B: BufMut>(&self, dst: &mut B) -> znpwire_types::Result<()> {
        self.0.encode(dst)
    }
}

impl Decode for Opcode {
    fn decode(src: &[u8]) -> znpwire_types::Result<(Self, &[u8])> {
        let (raw, rest) = u16::decode(src)?;
        Ok((Self(raw), rest))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.command_type(), self.subsystem()) {
            (Ok(ty), Ok(sub)) => write!(f, "{ty} {sub} 0x{:02X}", self.id()),
            _ => write!(f, "0x{:04X}", self.0),
        }
    }
}
