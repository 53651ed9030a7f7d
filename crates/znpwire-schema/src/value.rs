//! Decoded parameter values and the ordered name-to-value mapping a schema
//! reads and writes.

use std::fmt;

use bytes::Bytes;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use znpwire_types::{AddrModeAddress, Eui64};

/// A single parameter value.
///
/// The variant set mirrors the shapes a [`ParamType`](crate::ParamType) can
/// take; which variant a parameter accepts is decided by its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    UInt(u64),
    Int(i64),
    /// An enumeration variant, by name.
    Enum(String),
    Bytes(Bytes),
    Ieee(Eui64),
    Address(AddrModeAddress),
    List(Vec<Value>),
}

impl Value {
    /// Short description of the variant, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::UInt(_) => "unsigned integer",
            Value::Int(_) => "signed integer",
            Value::Enum(_) => "enum variant",
            Value::Bytes(_) => "bytes",
            Value::Ieee(_) => "IEEE address",
            Value::Address(_) => "address",
            Value::List(_) => "list",
        }
    }

    pub fn enum_variant(name: impl Into<String>) -> Self {
        Value::Enum(name.into())
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The variant name of an enum value.
    pub fn as_variant(&self) -> Option<&str> {
        match self {
            Value::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Enum(name) => f.write_str(name),
            Value::Bytes(data) if data.is_empty() => f.write_str("(empty)"),
            Value::Bytes(data) => f.write_str(&hex::encode(data)),
            Value::Ieee(ieee) => write!(f, "{ieee}"),
            Value::Address(AddrModeAddress::NotPresent) => f.write_str("not present"),
            Value::Address(AddrModeAddress::Group(addr)) => write!(f, "group 0x{addr:04X}"),
            Value::Address(AddrModeAddress::Nwk(addr)) => write!(f, "nwk 0x{addr:04X}"),
            Value::Address(AddrModeAddress::Broadcast(addr)) => {
                write!(f, "broadcast 0x{addr:04X}")
            }
            Value::Address(AddrModeAddress::Ieee(ieee)) => write!(f, "ieee {ieee}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Byte values serialize as lowercase hex strings; everything else uses its
/// natural JSON shape.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::UInt(v) => serializer.serialize_u64(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Enum(name) => serializer.serialize_str(name),
            Value::Bytes(data) => serializer.serialize_str(&hex::encode(data)),
            Value::Ieee(ieee) => ieee.serialize(serializer),
            Value::Address(addr) => addr.serialize(serializer),
            Value::List(items) => serializer.collect_seq(items),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! value_from_int {
    ($variant:ident, $wide:ty: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(<$wide>::from(value))
                }
            }
        )+
    };
}

value_from_int!(UInt, u64: u8, u16, u32, u64);
value_from_int!(Int, i64: i8, i16, i32, i64);

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Eui64> for Value {
    fn from(value: Eui64) -> Self {
        Value::Ieee(value)
    }
}

impl From<AddrModeAddress> for Value {
    fn from(value: AddrModeAddress) -> Self {
        Value::Address(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// Named parameter values in insertion order.
///
/// Replacing an existing name keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_keep_insertion_order() {
        let mut params = Params::new()
            .with("Status", Value::enum_variant("SUCCESS"))
            .with("Endpoint", 1u8)
            .with("TSN", 7u8);
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["Status", "Endpoint", "TSN"]);

        let previous = params.insert("Endpoint", 2u8);
        assert_eq!(previous, Some(Value::UInt(1)));
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["Status", "Endpoint", "TSN"]);
        assert_eq!(params.get("Endpoint").and_then(Value::as_u64), Some(2));
        assert!(!params.contains("Data"));
    }

    #[test]
    fn json_shape() {
        let params: Params = [
            ("Ok", Value::Bool(true)),
            ("Power", Value::from(-3i8)),
            ("Data", Value::from(vec![0xDEu8, 0xAD])),
            ("Ieee", Value::from(Eui64([1, 0, 0, 0, 0, 0, 0, 0]))),
            ("Dst", Value::from(AddrModeAddress::Group(0x0010))),
            ("Clusters", Value::List(vec![Value::UInt(6), Value::UInt(8)])),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"Ok":true,"Power":-3,"Data":"dead","Ieee":"00:00:00:00:00:00:00:01","#,
                r#""Dst":{"mode":"group","address":16},"Clusters":[6,8]}"#
            )
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::from(vec![0x01u8, 0xAB]).to_string(), "01ab");
        assert_eq!(Value::from(Vec::<u8>::new()).to_string(), "(empty)");
        assert_eq!(Value::from(AddrModeAddress::Nwk(0x1234)).to_string(), "nwk 0x1234");
        assert_eq!(
            Value::List(vec![Value::UInt(1), Value::enum_variant("SUCCESS")]).to_string(),
            "[1, SUCCESS]"
        );
    }
}
