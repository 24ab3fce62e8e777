use std::borrow::Cow;

use caliper_value::{CompareError, Comparator, Kind, Number, Value, ValueError};
use serde_json::value::RawValue;

use crate::equal::equal;
use crate::raw::{array_elements, decode_str, kind_of, object_entries};

/// A JSON instance value borrowing raw JSON text.
#[derive(Debug, Clone, Copy)]
pub struct JsonValue<'a> {
    raw: &'a RawValue,
}

impl<'a> JsonValue<'a> {
    /// Validates and wraps a JSON document.
    pub fn parse(text: &'a str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<&RawValue>(text).map(Self::from_raw)
    }

    /// Validates and wraps a JSON document given as bytes.
    pub fn from_slice(data: &'a [u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<&RawValue>(data).map(Self::from_raw)
    }

    pub fn from_raw(raw: &'a RawValue) -> Self {
        JsonValue { raw }
    }

    pub fn raw(&self) -> &'a RawValue {
        self.raw
    }
}

impl<'a> Value for JsonValue<'a> {
    fn kind(&self) -> Kind {
        kind_of(self.raw)
    }

    fn as_bool(&self) -> Option<bool> {
        match self.raw.get() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<Number> {
        match self.kind() {
            Kind::Number => Number::parse(self.raw.get()),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<Cow<'_, str>> {
        match self.kind() {
            Kind::String => decode_str(self.raw).ok(),
            _ => None,
        }
    }

    fn each_element<E, F>(&self, mut cb: F) -> Result<(), E>
    where
        E: From<ValueError>,
        F: FnMut(Self) -> Result<(), E>,
    {
        let elements =
            array_elements(self.raw).map_err(|e| ValueError::Invalid(e.to_string()))?;
        for raw in elements {
            cb(JsonValue { raw })?;
        }
        Ok(())
    }

    fn each_entry<E, F>(&self, mut cb: F) -> Result<(), E>
    where
        E: From<ValueError>,
        F: FnMut(&str, Self) -> Result<(), E>,
    {
        let entries = object_entries(self.raw).map_err(|e| ValueError::Invalid(e.to_string()))?;
        for (key, raw) in entries {
            cb(&key, JsonValue { raw })?;
        }
        Ok(())
    }
}

/// [`Comparator`] over [`JsonValue`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonComparator;

impl<'a> Comparator<JsonValue<'a>> for JsonComparator {
    fn equal(&self, a: &JsonValue<'a>, b: &JsonValue<'a>) -> Result<bool, CompareError> {
        equal(a.raw, b.raw)
    }

    fn contains(
        &self,
        variants: &[Box<RawValue>],
        value: &JsonValue<'a>,
    ) -> Result<bool, CompareError> {
        for variant in variants {
            if equal(variant, value.raw)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
