//! JSON backend for caliper validation.
//!
//! Instances are handled as raw JSON text ([`serde_json::value::RawValue`])
//! so that numbers keep their original spelling until they are compared as
//! exact rationals. Nothing is converted into an owned tree; every handle
//! borrows the input buffer.

mod equal;
mod raw;
mod value;

pub use equal::equal;
pub use raw::{array_elements, decode_str, kind_of, object_entries};
pub use value::{JsonComparator, JsonValue};
