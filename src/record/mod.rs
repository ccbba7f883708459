//! Generic record abstraction.
//!
//! Every entity the contracts manage is a flat JSON document keyed by its
//! `ID`. An entity only declares its field schema, names and sample data;
//! all store logic lives in [`crate::contract::RecordContract`].

use crate::contract::ContractError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;


/// JSON name of the identifier field shared by all records
pub const ID_FIELD: &str = "ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
}

/// One non-identifier field of a record schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// JSON name
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
        }
    }

    /// Converts a raw string argument to the field's JSON value
    pub fn coerce(&self, raw: &str) -> Result<Value, ContractError> {
        match self.kind {
            FieldKind::Text => Ok(Value::String(raw.to_string())),
            FieldKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| {
                    ContractError::InvalidArgument(format!(
                        "Field {} expects an integer, got '{}'",
                        self.name, raw
                    ))
                }),
        }
    }
}

/// A record type stored in the world state
pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    /// Lowercase name used in messages and as the chaincode name ("car")
    const KIND: &'static str;

    /// Name used in contract function names ("Car")
    const NAME: &'static str;

    /// Plural used in contract function names ("Cars")
    const PLURAL: &'static str;

    /// Fields after the identifier, in argument order
    const FIELDS: &'static [Field];

    /// JSON name of the integer count field
    const COUNT_FIELD: &'static str;

    /// JSON name of the owner field, if the record has one
    const OWNER_FIELD: Option<&'static str> = None;

    fn id(&self) -> &str;

    fn count(&self) -> i64;

    fn set_count(&mut self, count: i64);

    /// Records written by `InitLedger`
    fn samples() -> Vec<Self>;
}

/// Looks up a field by its JSON name
pub fn field<R: Record>(name: &str) -> Option<&'static Field> {
    R::FIELDS.iter().find(|f| f.name == name)
}

/// Builds a record from an id and positional string arguments in schema order
pub fn from_args<R: Record>(id: &str, args: &[String]) -> Result<R, ContractError> {
    if args.len() != R::FIELDS.len() {
        return Err(ContractError::InvalidArgument(format!(
            "Expected {} fields for {} ({}), got {}",
            R::FIELDS.len(),
            R::KIND,
            field_names::<R>(),
            args.len()
        )));
    }

    let mut doc = Map::new();
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    for (field, raw) in R::FIELDS.iter().zip(args) {
        doc.insert(field.name.to_string(), field.coerce(raw)?);
    }

    let record = decode_value(Value::Object(doc))?;
    validate(&record)?;
    Ok(record)
}

/// Returns a copy of `record` with `field` set from a raw string value
pub fn with_field<R: Record>(record: &R, field_name: &str, raw: &str) -> Result<R, ContractError> {
    if field_name == ID_FIELD {
        return Err(ContractError::InvalidArgument(format!(
            "Field {} of {} {} cannot be changed",
            ID_FIELD,
            R::KIND,
            record.id()
        )));
    }

    let field = field::<R>(field_name).ok_or_else(|| {
        ContractError::InvalidArgument(format!(
            "Unknown field {} for {} (expected one of {})",
            field_name,
            R::KIND,
            field_names::<R>()
        ))
    })?;
    let value = field.coerce(raw)?;

    let mut doc = serde_json::to_value(record).map_err(|e| ContractError::Serialization {
        kind: R::KIND,
        id: record.id().to_string(),
        reason: e.to_string(),
    })?;
    match doc.as_object_mut() {
        Some(map) => {
            map.insert(field.name.to_string(), value);
        }
        None => {
            return Err(ContractError::Serialization {
                kind: R::KIND,
                id: record.id().to_string(),
                reason: "record is not a JSON object".to_string(),
            })
        }
    }

    let updated = decode_value(doc)?;
    validate(&updated)?;
    Ok(updated)
}

/// Checks the invariants every stored record holds: a non-empty id and a
/// non-negative count
pub fn validate<R: Record>(record: &R) -> Result<(), ContractError> {
    if record.id().is_empty() {
        return Err(ContractError::InvalidArgument(format!(
            "The {} id must not be empty",
            R::KIND
        )));
    }
    if record.count() < 0 {
        return Err(ContractError::InvalidArgument(format!(
            "Field {} of {} {} must not be negative, got {}",
            R::COUNT_FIELD,
            R::KIND,
            record.id(),
            record.count()
        )));
    }
    Ok(())
}

/// Serializes a record to its stored JSON bytes
pub fn encode<R: Record>(record: &R) -> Result<Vec<u8>, ContractError> {
    serde_json::to_vec(record).map_err(|e| ContractError::Serialization {
        kind: R::KIND,
        id: record.id().to_string(),
        reason: e.to_string(),
    })
}

/// Deserializes stored JSON bytes
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R, ContractError> {
    serde_json::from_slice(bytes).map_err(|e| ContractError::Deserialization {
        kind: R::KIND,
        reason: e.to_string(),
    })
}

fn decode_value<R: Record>(doc: Value) -> Result<R, ContractError> {
    serde_json::from_value(doc).map_err(|e| ContractError::Deserialization {
        kind: R::KIND,
        reason: e.to_string(),
    })
}

fn field_names<R: Record>() -> String {
    R::FIELDS
        .iter()
        .map(|f| f.name)
        .collect::<Vec<_>>()
        .join(", ")
}
