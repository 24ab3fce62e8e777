use std::fmt;

use caliper_value::{CompareError, Number, ValueError};
use thiserror::Error;

use crate::pointer::PointerError;
use crate::remote::RemoteError;
use crate::uri::UriError;

/// Schema compilation error.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema document is not syntactically valid JSON.
    #[error("invalid json: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// A keyword carries a value of the wrong shape.
    #[error("invalid schema: {0}")]
    InvalidStructure(#[source] serde_json::Error),

    #[error(transparent)]
    InvalidUri(#[from] UriError),

    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("\"required\" entries must be unique, duplicate {0:?}")]
    DuplicateRequired(String),

    /// The reference chain exceeded the resolve depth cap.
    #[error("resolve depth exceeded")]
    InfiniteRecursion,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Instance validation error.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid json: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("invalid yaml: {0}")]
    InvalidYaml(#[source] serde_yaml::Error),

    #[error("type is not allowed")]
    TypeNotAllowed,

    #[error("value is not present in enum")]
    EnumMismatch,

    #[error("must match exactly once")]
    ExactlyOnce,

    #[error("must match at least once")]
    MustMatch,

    #[error("must not match")]
    MustNotMatch,

    #[error("value {value} is smaller than {bound}")]
    Minimum { value: Number, bound: Number },

    #[error("value {value} is bigger than {bound}")]
    Maximum { value: Number, bound: Number },

    #[error("{value} is not multiple of {bound}")]
    MultipleOf { value: Number, bound: Number },

    #[error("length is smaller than {0}")]
    MinLength(u64),

    #[error("length is bigger than {0}")]
    MaxLength(u64),

    #[error("items {0} and {1} are equal")]
    NotUnique(usize, usize),

    #[error("does not match pattern {0:?}")]
    PatternMismatch(String),

    #[error("required property {0:?} is missing")]
    MissingRequired(String),

    #[error("additional properties are not allowed")]
    AdditionalProperties,

    #[error("schema does not allow additionalItems")]
    AdditionalItems,

    /// A cyclic composition kept revalidating the same value.
    #[error("validation depth exceeded")]
    DepthExceeded,

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ValidateError>,
    },
}

/// Splits decode failures into syntax (`InvalidJson`) and shape
/// (`InvalidStructure`) errors.
pub(crate) fn classify_json(err: serde_json::Error) -> Error {
    match err.classify() {
        serde_json::error::Category::Data => Error::InvalidStructure(err),
        _ => Error::InvalidJson(err),
    }
}

pub(crate) trait Wrap: Sized {
    fn wrap(self, context: String) -> Self;
}

impl Wrap for Error {
    fn wrap(self, context: String) -> Self {
        Error::Context {
            context,
            source: Box::new(self),
        }
    }
}

impl Wrap for ValidateError {
    fn wrap(self, context: String) -> Self {
        ValidateError::Context {
            context,
            source: Box::new(self),
        }
    }
}

/// Path-prefix error wrapping, the local analogue of wrapped error chains.
pub(crate) trait ResultExt<T, E> {
    fn context(self, context: impl fmt::Display) -> Result<T, E>;
    fn with_context(self, f: impl FnOnce() -> String) -> Result<T, E>;
}

impl<T, E: Wrap> ResultExt<T, E> for Result<T, E> {
    fn context(self, context: impl fmt::Display) -> Result<T, E> {
        self.map_err(|err| err.wrap(context.to_string()))
    }

    fn with_context(self, f: impl FnOnce() -> String) -> Result<T, E> {
        self.map_err(|err| err.wrap(f()))
    }
}
