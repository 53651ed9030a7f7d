use bytes::{BufMut, Bytes, BytesMut};

use znpwire_frame::MAX_PAYLOAD;

use crate::error::{Result, SchemaError};
use crate::types::ParamType;
use crate::value::Params;

/// One named, typed field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    ty: ParamType,
    description: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            description: description.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> &ParamType {
        &self.ty
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// An ordered parameter layout.
///
/// Serialization writes parameters in declaration order; deserialization
/// reads them back in the same order and returns whatever bytes follow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    params: Vec<Param>,
}

impl Schema {
    pub const EMPTY: Schema = Schema { params: Vec::new() };

    /// Build a schema, rejecting duplicate names, invalid types and a
    /// remainder-consuming parameter anywhere but last.
    pub fn new(params: impl IntoIterator<Item = Param>) -> Result<Self> {
        let params: Vec<Param> = params.into_iter().collect();

        for (i, param) in params.iter().enumerate() {
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(SchemaError::DuplicateParameter(param.name.clone()));
            }
            param.ty.validate()?;
            if param.ty.consumes_rest() && i + 1 != params.len() {
                return Err(SchemaError::InvalidType(format!(
                    "{}: `{}` consumes the rest of the payload and must be the last parameter",
                    param.name, param.ty
                )));
            }
        }

        Ok(Self { params })
    }

    /// A schema with no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Total payload size, when every parameter has a fixed width.
    pub fn fixed_width(&self) -> Option<usize> {
        self.params
            .iter()
            .try_fold(0usize, |total, p| p.ty.fixed_width().and_then(|w| total.checked_add(w)))
    }

    pub fn serialize(&self, values: &Params) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.fixed_width().unwrap_or(64).min(MAX_PAYLOAD));
        self.encode_all(values, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the encoded parameters to `dst`.
    ///
    /// Every declared parameter must be present and no others may be. On
    /// error nothing is written to `dst`.
    pub fn serialize_into<B: BufMut>(&self, values: &Params, dst: &mut B) -> Result<()> {
        let encoded = self.serialize(values)?;
        dst.put_slice(&encoded);
        Ok(())
    }

    fn encode_all(&self, values: &Params, dst: &mut BytesMut) -> Result<()> {
        if let Some(extra) = values.names().find(|name| self.get(name).is_none()) {
            return Err(SchemaError::UnexpectedParameter(extra.to_string()));
        }

        for param in &self.params {
            let value = values
                .get(&param.name)
                .ok_or_else(|| SchemaError::MissingParameter(param.name.clone()))?;
            param.ty.encode(&param.name, value, dst)?;
        }
        Ok(())
    }

    /// Decode every parameter from the front of `data`.
    ///
    /// Nothing is returned on failure; the unconsumed rest is returned on
    /// success.
    pub fn deserialize<'a>(&self, data: &'a [u8]) -> Result<(Params, &'a [u8])> {
        let mut values = Params::new();
        let mut rest = data;
        for param in &self.params {
            let (value, remaining) = param.ty.decode(rest)?;
            tracing::trace!(param = %param.name, %value, "decoded parameter");
            values.insert(param.name.clone(), value);
            rest = remaining;
        }
        Ok((values, rest))
    }

    /// Build [`Params`] from a JSON object, converting each value by its
    /// declared type. Keys not in the schema are rejected.
    pub fn params_from_json(&self, object: &serde_json::Map<String, serde_json::Value>) -> Result<Params> {
        if let Some(extra) = object.keys().find(|key| self.get(key).is_none()) {
            return Err(SchemaError::UnexpectedParameter(extra.clone()));
        }

        let mut values = Params::new();
        for param in &self.params {
            if let Some(json) = object.get(&param.name) {
                values.insert(param.name.clone(), param.ty.value_from_json(&param.name, json)?);
            }
        }
        Ok(values)
    }
}
