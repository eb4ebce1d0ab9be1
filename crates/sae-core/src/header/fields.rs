//! Typed access to string-keyed MessagePack maps.

use std::collections::HashMap;

use rmpv::Value;

use crate::ArchiveError;
use crate::Result;

/// Short name of a value's type tag, for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Boolean(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::F32(_) | Value::F64(_) => "float",
        Value::String(_) => "string",
        Value::Binary(_) => "binary",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Ext(..) => "ext",
    }
}

/// String-keyed view of a map value.
///
/// Keys must be UTF-8 strings and unique. Unknown keys are kept and ignored
/// by the typed accessors.
#[derive(Debug)]
pub(crate) struct Fields<'a> {
    context: String,
    by_name: HashMap<&'a str, &'a Value>,
}

impl<'a> Fields<'a> {
    /// Indexes `value`, which must be a map of at most `max_fields` pairs.
    pub(crate) fn new(value: &'a Value, context: impl Into<String>, max_fields: usize) -> Result<Self> {
        let context = context.into();
        let Value::Map(pairs) = value else {
            return Err(ArchiveError::InvalidHeader(format!(
                "{context}: expected map, found {}",
                type_name(value)
            )));
        };
        if pairs.len() > max_fields {
            return Err(ArchiveError::InvalidHeader(format!(
                "{context}: {} fields exceeds limit of {max_fields}",
                pairs.len()
            )));
        }

        let mut by_name = HashMap::with_capacity(pairs.len());
        for (key, field) in pairs {
            let Some(name) = key.as_str() else {
                return Err(ArchiveError::InvalidHeader(format!(
                    "{context}: map key is {}, expected string",
                    type_name(key)
                )));
            };
            if by_name.insert(name, field).is_some() {
                return Err(ArchiveError::InvalidHeader(format!(
                    "{context}: duplicate field `{name}`"
                )));
            }
        }
        Ok(Self { context, by_name })
    }

    pub(crate) fn get(&self, name: &str) -> Option<&'a Value> {
        self.by_name.get(name).copied()
    }

    fn missing(&self, name: &str) -> ArchiveError {
        ArchiveError::InvalidHeader(format!("{}: missing field `{name}`", self.context))
    }

    fn wrong_type(&self, name: &str, expected: &str, found: &Value) -> ArchiveError {
        ArchiveError::InvalidHeader(format!(
            "{}: field `{name}` is {}, expected {expected}",
            self.context,
            type_name(found)
        ))
    }

    fn required(&self, name: &str) -> Result<&'a Value> {
        self.get(name).ok_or_else(|| self.missing(name))
    }

    pub(crate) fn str(&self, name: &str) -> Result<&'a str> {
        let value = self.required(name)?;
        value
            .as_str()
            .ok_or_else(|| self.wrong_type(name, "string", value))
    }

    pub(crate) fn opt_str(&self, name: &str) -> Result<Option<&'a str>> {
        self.get(name)
            .map(|value| {
                value
                    .as_str()
                    .ok_or_else(|| self.wrong_type(name, "string", value))
            })
            .transpose()
    }

    pub(crate) fn opt_u64(&self, name: &str) -> Result<Option<u64>> {
        self.get(name)
            .map(|value| {
                value
                    .as_u64()
                    .ok_or_else(|| self.wrong_type(name, "unsigned integer", value))
            })
            .transpose()
    }

    pub(crate) fn opt_u32(&self, name: &str) -> Result<Option<u32>> {
        self.opt_u64(name)?
            .map(|v| {
                u32::try_from(v).map_err(|_| {
                    ArchiveError::InvalidHeader(format!(
                        "{}: field `{name}` value {v} does not fit in 32 bits",
                        self.context
                    ))
                })
            })
            .transpose()
    }

    pub(crate) fn opt_i64(&self, name: &str) -> Result<Option<i64>> {
        self.get(name)
            .map(|value| {
                value
                    .as_i64()
                    .ok_or_else(|| self.wrong_type(name, "signed 64-bit integer", value))
            })
            .transpose()
    }

    pub(crate) fn opt_bytes(&self, name: &str) -> Result<Option<&'a [u8]>> {
        self.get(name)
            .map(|value| {
                value
                    .as_slice()
                    .ok_or_else(|| self.wrong_type(name, "binary", value))
            })
            .transpose()
    }

    pub(crate) fn array(&self, name: &str) -> Result<&'a [Value]> {
        let value = self.required(name)?;
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.wrong_type(name, "array", value))
    }

    pub(crate) fn context(&self) -> &str {
        &self.context
    }
}
