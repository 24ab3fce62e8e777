use std::borrow::Cow;
use std::fmt;

use serde_json::value::RawValue;
use thiserror::Error;

use crate::Number;

/// JSON data-model classification of an instance node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
    /// The node cannot be classified (e.g. an unresolvable alias).
    Invalid,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Invalid => "invalid",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors a backend may raise while walking an instance.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("mapping key is not a scalar string")]
    NonStringKey,
    #[error("invalid value: {0}")]
    Invalid(String),
}

/// Errors a [`Comparator`] may raise.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("mapping key {0:?} is not a scalar")]
    NonScalarKey(String),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("malformed enum value: {0}")]
    MalformedVariant(String),
}

/// An instance value to validate against.
///
/// Handles are cheap to clone; they borrow the underlying representation.
/// The scalar accessors return `None` when called on a node of another kind.
pub trait Value: Clone {
    fn kind(&self) -> Kind;

    /// Valid only when `kind()` is [`Kind::Bool`].
    fn as_bool(&self) -> Option<bool>;

    /// Valid only when `kind()` is [`Kind::Number`]; exact rational.
    fn as_number(&self) -> Option<Number>;

    /// Valid only when `kind()` is [`Kind::String`].
    ///
    /// The returned text may alias an internal buffer; treat it as borrowed
    /// for the duration of the call.
    fn as_str(&self) -> Option<Cow<'_, str>>;

    /// Calls `cb` for each element in source order, propagating the first
    /// error.
    fn each_element<E, F>(&self, cb: F) -> Result<(), E>
    where
        E: From<ValueError>,
        F: FnMut(Self) -> Result<(), E>;

    /// Calls `cb` for each key-value entry in source order.
    ///
    /// The key may alias an internal buffer.
    fn each_entry<E, F>(&self, cb: F) -> Result<(), E>
    where
        E: From<ValueError>,
        F: FnMut(&str, Self) -> Result<(), E>;
}

/// Deep structural equality over a backend's values.
///
/// Numbers compare as exact rationals, strings byte-for-byte after decoding,
/// arrays elementwise, and objects by key set with per-key recursion
/// (order-independent). Mapping keys must be scalar strings.
pub trait Comparator<V: Value> {
    fn equal(&self, a: &V, b: &V) -> Result<bool, CompareError>;

    /// True when `value` equals any of the raw JSON `variants`.
    fn contains(&self, variants: &[Box<RawValue>], value: &V) -> Result<bool, CompareError>;
}
