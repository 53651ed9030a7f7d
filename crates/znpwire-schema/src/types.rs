//! Parameter types: the closed set of wire shapes a schema can declare.
//!
//! Types have a textual form used by JSON catalogs:
//!
//! | descriptor               | wire form                                  |
//! |--------------------------|--------------------------------------------|
//! | `uint8` .. `uint64`      | little-endian unsigned integer             |
//! | `int8` .. `int64`        | little-endian two's complement             |
//! | `bool`                   | one byte                                   |
//! | `enum:Name`              | integer of the enum's declared width       |
//! | `ieee`                   | 8-byte EUI-64                              |
//! | `addr_mode_address`      | mode byte, then a mode-dependent address   |
//! | `bytes[N]`               | exactly N raw bytes                        |
//! | `short_bytes`            | 1-byte length, then bytes                  |
//! | `long_bytes`             | 2-byte length, then bytes                  |
//! | `bytes`                  | everything left in the payload             |
//! | `list<T;N>`              | exactly N items, no prefix                 |
//! | `lvlist<T>`              | 1-byte count, then items                   |
//! | `lvlist<T,uint16>`       | count of the given width, then items       |
//!
//! `nwk`, `pan_id`, `cluster_id` and `group_id` are accepted as aliases for
//! `uint16`, `channels` for `uint32` and `key` for `bytes[16]`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::{BufMut, Bytes};
use znpwire_types::{
    decode_blob, decode_count, encode_blob, encode_count, take, AddrModeAddress, CodecError,
    Decode, Encode, EnumDef, Eui64, IntWidth, LIST_PREFIX, LONG_BYTES_PREFIX, SHORT_BYTES_PREFIX,
};
use znpwire_frame::MAX_PAYLOAD;

use crate::error::{Result, SchemaError};
use crate::value::Value;

/// Enumerations available to type descriptors, keyed by name.
pub type EnumTable = HashMap<String, Arc<EnumDef>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    UInt(IntWidth),
    Int(IntWidth),
    Bool,
    Enum(Arc<EnumDef>),
    Ieee,
    AddrModeAddress,
    FixedBytes(usize),
    ShortBytes,
    LongBytes,
    /// Consumes the remainder of the payload.
    RawBytes,
    FixedList {
        item: Box<ParamType>,
        count: usize,
    },
    LvList {
        item: Box<ParamType>,
        prefix: IntWidth,
    },
}

impl ParamType {
    pub fn list(item: ParamType, count: usize) -> Self {
        ParamType::FixedList {
            item: Box::new(item),
            count,
        }
    }

    pub fn lv_list(item: ParamType) -> Self {
        ParamType::LvList {
            item: Box::new(item),
            prefix: LIST_PREFIX,
        }
    }

    /// Byte width on the wire, when it does not depend on the value.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            ParamType::UInt(width) | ParamType::Int(width) => Some(width.bytes()),
            ParamType::Bool => Some(1),
            ParamType::Enum(def) => Some(def.width().bytes()),
            ParamType::Ieee => Some(8),
            ParamType::FixedBytes(len) => Some(*len),
            ParamType::FixedList { item, count } => {
                item.fixed_width().and_then(|w| w.checked_mul(*count))
            }
            ParamType::AddrModeAddress
            | ParamType::ShortBytes
            | ParamType::LongBytes
            | ParamType::RawBytes
            | ParamType::LvList { .. } => None,
        }
    }

    /// Smallest number of bytes any value of this type occupies.
    fn min_width(&self) -> usize {
        match self {
            ParamType::AddrModeAddress => 1,
            ParamType::ShortBytes => SHORT_BYTES_PREFIX.bytes(),
            ParamType::LongBytes => LONG_BYTES_PREFIX.bytes(),
            ParamType::RawBytes => 0,
            ParamType::LvList { prefix, .. } => prefix.bytes(),
            ParamType::FixedList { item, count } => item.min_width().saturating_mul(*count),
            fixed => fixed.fixed_width().unwrap_or(0),
        }
    }

    /// Whether this type, or any item type inside it, swallows the rest of
    /// the payload.
    pub fn consumes_rest(&self) -> bool {
        match self {
            ParamType::RawBytes => true,
            ParamType::FixedList { item, .. } | ParamType::LvList { item, .. } => {
                item.consumes_rest()
            }
            _ => false,
        }
    }

    /// Check that the type can be encoded within one frame payload and
    /// decodes unambiguously.
    ///
    /// Fixed sizes may not exceed [`MAX_PAYLOAD`], list items must occupy at
    /// least one byte and may not consume the rest of the payload.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(SchemaError::InvalidType(format!("{self}: {reason}")));
        match self {
            ParamType::FixedBytes(len) if *len > MAX_PAYLOAD => {
                invalid(format!("{len} bytes exceed the {MAX_PAYLOAD} byte payload limit"))
            }
            ParamType::FixedList { count, .. } if *count > MAX_PAYLOAD => {
                invalid(format!("{count} items exceed the {MAX_PAYLOAD} byte payload limit"))
            }
            ParamType::FixedList { .. } if self.min_width() > MAX_PAYLOAD => {
                invalid(format!("needs at least {} bytes, more than one payload", self.min_width()))
            }
            ParamType::FixedList { item, .. } | ParamType::LvList { item, .. } => {
                item.validate()?;
                if item.consumes_rest() {
                    return invalid("list items may not consume the rest of the payload".into());
                }
                if item.min_width() == 0 {
                    return invalid("list items must occupy at least one byte".into());
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Encode `value` for the parameter named `param`.
    pub fn encode<B: BufMut>(&self, param: &str, value: &Value, dst: &mut B) -> Result<()> {
        match (self, value) {
            (ParamType::UInt(width), Value::UInt(v)) => width.encode_unsigned(*v, dst)?,
            (ParamType::Int(width), Value::Int(v)) => width.encode_signed(*v, dst)?,
            (ParamType::Bool, Value::Bool(v)) => v.encode(dst)?,
            (ParamType::Enum(def), Value::Enum(variant)) => def.encode(variant, dst)?,
            (ParamType::Ieee, Value::Ieee(ieee)) => ieee.encode(dst)?,
            (ParamType::AddrModeAddress, Value::Address(addr)) => addr.encode(dst)?,
            (ParamType::FixedBytes(len), Value::Bytes(data)) => {
                if data.len() != *len {
                    return Err(CodecError::ValueOutOfRange(format!(
                        "{param}: expected exactly {len} bytes, got {}",
                        data.len()
                    ))
                    .into());
                }
                dst.put_slice(data);
            }
            (ParamType::ShortBytes, Value::Bytes(data)) => {
                encode_blob(data, SHORT_BYTES_PREFIX, dst)?
            }
            (ParamType::LongBytes, Value::Bytes(data)) => encode_blob(data, LONG_BYTES_PREFIX, dst)?,
            (ParamType::RawBytes, Value::Bytes(data)) => dst.put_slice(data),
            (ParamType::FixedList { item, count }, Value::List(items)) => {
                if items.len() != *count {
                    return Err(CodecError::ValueOutOfRange(format!(
                        "{param}: fixed list expects {count} items, got {}",
                        items.len()
                    ))
                    .into());
                }
                for value in items {
                    item.encode(param, value, dst)?;
                }
            }
            (ParamType::LvList { item, prefix }, Value::List(items)) => {
                encode_count(items.len(), *prefix, dst)?;
                for value in items {
                    item.encode(param, value, dst)?;
                }
            }
            (expected, found) => {
                return Err(SchemaError::TypeMismatch {
                    param: param.to_string(),
                    expected: expected.to_string(),
                    found: found.kind(),
                })
            }
        }
        Ok(())
    }

    /// Decode one value from the front of `src`, returning the unconsumed rest.
    pub fn decode<'a>(&self, src: &'a [u8]) -> Result<(Value, &'a [u8])> {
        let decoded = match self {
            ParamType::UInt(width) => {
                let (v, rest) = width.decode_unsigned(src)?;
                (Value::UInt(v), rest)
            }
            ParamType::Int(width) => {
                let (v, rest) = width.decode_signed(src)?;
                (Value::Int(v), rest)
            }
            ParamType::Bool => {
                let (v, rest) = bool::decode(src)?;
                (Value::Bool(v), rest)
            }
            ParamType::Enum(def) => {
                let (variant, rest) = def.decode(src)?;
                (Value::Enum(variant.to_string()), rest)
            }
            ParamType::Ieee => {
                let (ieee, rest) = Eui64::decode(src)?;
                (Value::Ieee(ieee), rest)
            }
            ParamType::AddrModeAddress => {
                let (addr, rest) = AddrModeAddress::decode(src)?;
                (Value::Address(addr), rest)
            }
            ParamType::FixedBytes(len) => {
                let (data, rest) = take(src, *len)?;
                (Value::Bytes(Bytes::copy_from_slice(data)), rest)
            }
            ParamType::ShortBytes | ParamType::LongBytes => {
                let prefix = if matches!(self, ParamType::ShortBytes) {
                    SHORT_BYTES_PREFIX
                } else {
                    LONG_BYTES_PREFIX
                };
                let (data, rest) = decode_blob(src, prefix)?;
                (Value::Bytes(Bytes::copy_from_slice(data)), rest)
            }
            ParamType::RawBytes => (Value::Bytes(Bytes::copy_from_slice(src)), &src[src.len()..]),
            ParamType::FixedList { item, count } => {
                let (items, rest) = decode_items(item, src, *count)?;
                (Value::List(items), rest)
            }
            ParamType::LvList { item, prefix } => {
                let (count, rest) = decode_count(src, *prefix)?;
                let (items, rest) = decode_items(item, rest, count)?;
                (Value::List(items), rest)
            }
        };
        Ok(decoded)
    }

    /// Convert a JSON value into a [`Value`] of this type.
    ///
    /// Integers may be JSON numbers or strings (decimal or `0x` hex), byte
    /// values are hex strings, enums are variant names or raw numbers.
    pub fn value_from_json(&self, param: &str, json: &serde_json::Value) -> Result<Value> {
        use serde_json::Value as Json;

        let mismatch = || SchemaError::TypeMismatch {
            param: param.to_string(),
            expected: self.to_string(),
            found: json_kind(json),
        };

        let value = match (self, json) {
            (ParamType::UInt(_), Json::Number(n)) => Value::UInt(n.as_u64().ok_or_else(mismatch)?),
            (ParamType::UInt(_), Json::String(s)) => {
                Value::UInt(parse_unsigned(s).ok_or_else(mismatch)?)
            }
            (ParamType::Int(_), Json::Number(n)) => Value::Int(n.as_i64().ok_or_else(mismatch)?),
            (ParamType::Int(_), Json::String(s)) => {
                Value::Int(parse_signed(s).ok_or_else(mismatch)?)
            }
            (ParamType::Bool, Json::Bool(b)) => Value::Bool(*b),
            (ParamType::Enum(_), Json::String(s)) => Value::Enum(s.clone()),
            (ParamType::Enum(def), Json::Number(n)) => {
                let raw = n.as_u64().ok_or_else(mismatch)?;
                let variant = def.name_of(raw).ok_or_else(|| CodecError::InvalidEnumValue {
                    type_name: def.name().to_string(),
                    value: raw,
                })?;
                Value::Enum(variant.to_string())
            }
            (ParamType::Ieee, Json::String(s)) => Value::Ieee(s.parse()?),
            (ParamType::AddrModeAddress, Json::Object(_)) => {
                Value::Address(serde_json::from_value(json.clone())?)
            }
            (
                ParamType::FixedBytes(_)
                | ParamType::ShortBytes
                | ParamType::LongBytes
                | ParamType::RawBytes,
                Json::String(s),
            ) => Value::Bytes(Bytes::from(hex::decode(s).map_err(|_| mismatch())?)),
            (
                ParamType::FixedList { item, .. } | ParamType::LvList { item, .. },
                Json::Array(items),
            ) => Value::List(
                items
                    .iter()
                    .map(|json| item.value_from_json(param, json))
                    .collect::<Result<Vec<_>>>()?,
            ),
            _ => return Err(mismatch()),
        };
        Ok(value)
    }

    /// Parse a type descriptor, resolving `enum:Name` against `enums`.
    pub fn parse(descriptor: &str, enums: &EnumTable) -> Result<Self> {
        let text = descriptor.trim();
        let invalid = |reason: &str| SchemaError::InvalidType(format!("{text}: {reason}"));

        if let Some(name) = text.strip_prefix("enum:") {
            let name = name.trim();
            return enums
                .get(name)
                .cloned()
                .map(ParamType::Enum)
                .ok_or_else(|| invalid("unknown enum"));
        }

        if let Some(inner) = generic_args(text, "list") {
            let (item, count) = split_top_level(inner, ';').ok_or_else(|| invalid("expected list<T;N>"))?;
            let count = count
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid("list count is not a number"))?;
            let list = ParamType::list(Self::parse(item, enums)?, count);
            list.validate()?;
            return Ok(list);
        }

        if let Some(inner) = generic_args(text, "lvlist") {
            let (item, prefix) = match split_top_level(inner, ',') {
                Some((item, prefix)) => match Self::parse(prefix, enums)? {
                    ParamType::UInt(width) => (item, width),
                    _ => return Err(invalid("count prefix must be an unsigned integer type")),
                },
                None => (inner, LIST_PREFIX),
            };
            let list = ParamType::LvList {
                item: Box::new(Self::parse(item, enums)?),
                prefix,
            };
            list.validate()?;
            return Ok(list);
        }

        if let Some(len) = text.strip_prefix("bytes[").and_then(|r| r.strip_suffix(']')) {
            let len = len
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid("byte count is not a number"))?;
            let bytes = ParamType::FixedBytes(len);
            bytes.validate()?;
            return Ok(bytes);
        }

        let parsed = match text {
            "uint8" => ParamType::UInt(IntWidth::One),
            "uint16" | "nwk" | "pan_id" | "cluster_id" | "group_id" => ParamType::UInt(IntWidth::Two),
            "uint32" | "channels" => ParamType::UInt(IntWidth::Four),
            "uint64" => ParamType::UInt(IntWidth::Eight),
            "int8" => ParamType::Int(IntWidth::One),
            "int16" => ParamType::Int(IntWidth::Two),
            "int32" => ParamType::Int(IntWidth::Four),
            "int64" => ParamType::Int(IntWidth::Eight),
            "bool" => ParamType::Bool,
            "ieee" | "eui64" => ParamType::Ieee,
            "addr_mode_address" => ParamType::AddrModeAddress,
            "short_bytes" => ParamType::ShortBytes,
            "long_bytes" => ParamType::LongBytes,
            "bytes" => ParamType::RawBytes,
            "key" => ParamType::FixedBytes(16),
            _ => return Err(invalid("unrecognized type")),
        };
        Ok(parsed)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::UInt(width) => write!(f, "uint{}", width.bits()),
            ParamType::Int(width) => write!(f, "int{}", width.bits()),
            ParamType::Bool => f.write_str("bool"),
            ParamType::Enum(def) => write!(f, "enum:{}", def.name()),
            ParamType::Ieee => f.write_str("ieee"),
            ParamType::AddrModeAddress => f.write_str("addr_mode_address"),
            ParamType::FixedBytes(len) => write!(f, "bytes[{len}]"),
            ParamType::ShortBytes => f.write_str("short_bytes"),
            ParamType::LongBytes => f.write_str("long_bytes"),
            ParamType::RawBytes => f.write_str("bytes"),
            ParamType::FixedList { item, count } => write!(f, "list<{item};{count}>"),
            ParamType::LvList { item, prefix } if *prefix == LIST_PREFIX => {
                write!(f, "lvlist<{item}>")
            }
            ParamType::LvList { item, prefix } => write!(f, "lvlist<{item},uint{}>", prefix.bits()),
        }
    }
}

fn decode_items<'a>(item: &ParamType, mut src: &'a [u8], count: usize) -> Result<(Vec<Value>, &'a [u8])> {
    let mut items = Vec::with_capacity(count.min(src.len()));
    for _ in 0..count {
        let (value, rest) = item.decode(src)?;
        items.push(value);
        src = rest;
    }
    Ok((items, src))
}

/// `name<inner>` -> `inner`
fn generic_args<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    text.strip_prefix(name)?.strip_prefix('<')?.strip_suffix('>')
}

/// Split at the last `sep` not nested inside angle brackets.
fn split_top_level(text: &str, sep: char) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    let mut split = None;
    for (i, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth -= 1,
            c if c == sep && depth == 0 => split = Some(i),
            _ => {}
        }
    }
    split.map(|i| (&text[..i], &text[i + sep.len_utf8()..]))
}

pub(crate) fn parse_unsigned(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn parse_signed(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = i64::try_from(parse_unsigned(magnitude)?).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
