#![doc = include_str!("../README.md")]

mod compile;
mod document;
mod error;
mod pointer;
mod raw;
mod remote;
mod schema;
mod uri;
mod validate;

pub use error::{Error, ValidateError};
pub use pointer::PointerError;
pub use remote::{NoRemote, Remote, RemoteError, RemoteResolver};
pub use schema::Schema;
pub use uri::UriError;

pub use caliper_json::{JsonComparator, JsonValue};
pub use caliper_value::{CompareError, Comparator, Kind, Number, Value, ValueError};
pub use caliper_yaml::{YamlComparator, YamlValue};

use crate::compile::Compiler;
use crate::document::collect_ids;
use crate::error::classify_json;
use crate::raw::RawSchema;

/// Compiles a JSON Schema document with the default remote resolver.
pub fn parse(data: &[u8]) -> Result<Schema, Error> {
    parse_with(data, Remote::default())
}

/// Compiles a JSON Schema document, fetching remote references through
/// `remote`.
pub fn parse_with<R: RemoteResolver>(data: &[u8], remote: R) -> Result<Schema, Error> {
    let text: &serde_json::value::RawValue =
        serde_json::from_slice(data).map_err(classify_json)?;
    let raw: RawSchema = serde_json::from_str(text.get()).map_err(classify_json)?;
    let doc = collect_ids(None, text.get())?;
    Compiler::new(doc, remote).compile(raw)
}

/// Validates a [`Value`] instance against a compiled schema.
pub fn validate<V, C>(schema: &Schema, value: &V, comparator: &C) -> Result<(), ValidateError>
where
    V: Value,
    C: Comparator<V>,
{
    schema.validate(value, comparator)
}

/// Validates raw JSON bytes against a compiled schema.
pub fn validate_json(schema: &Schema, data: &[u8]) -> Result<(), ValidateError> {
    schema.validate_json(data)
}

/// Validates YAML bytes against a compiled schema.
pub fn validate_yaml(schema: &Schema, data: &[u8]) -> Result<(), ValidateError> {
    schema.validate_yaml(data)
}

impl Schema {
    /// Validates raw JSON bytes with the bundled JSON backend.
    pub fn validate_json(&self, data: &[u8]) -> Result<(), ValidateError> {
        let value = JsonValue::from_slice(data).map_err(ValidateError::InvalidJson)?;
        self.validate(&value, &JsonComparator)
    }

    /// Validates YAML bytes with the bundled YAML backend.
    pub fn validate_yaml(&self, data: &[u8]) -> Result<(), ValidateError> {
        let node: serde_yaml::Value =
            serde_yaml::from_slice(data).map_err(ValidateError::InvalidYaml)?;
        self.validate(&YamlValue::new(&node), &YamlComparator)
    }
}
