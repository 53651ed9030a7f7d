//! Declarative parameter schemas and the ZNP command catalog.
//!
//! A [`Schema`] is an ordered list of named, typed parameters. It turns
//! [`Params`] into payload bytes and back. A [`CommandCatalog`] maps
//! opcodes and `SUBSYSTEM.Name` strings to [`CommandDef`]s, each carrying a
//! request schema and, for SREQ commands, a response schema.
//!
//! The catalog shipped with the crate covers common SYS, AF, ZDO, UTIL and
//! ZNP commands; others can be loaded from JSON with
//! [`CommandCatalog::from_json`] or [`CommandCatalog::from_file`].

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod schema;
pub mod types;
pub mod value;

pub use catalog::CommandCatalog;
pub use command::{Command, CommandDef, Direction};
pub use config::CatalogConfig;
pub use error::{Result, SchemaError};
pub use schema::{Param, Schema};
pub use types::{EnumTable, ParamType};
pub use value::{Params, Value};
