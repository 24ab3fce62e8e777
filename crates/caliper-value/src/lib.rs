//! Value capability for caliper validation backends.
//!
//! A compiled schema validates anything that implements [`Value`]: raw JSON
//! text, a parsed YAML tree, or any other representation of the JSON data
//! model. The [`Comparator`] capability supplies the deep-equality semantics
//! used by `enum` and `uniqueItems`, so number-equality rules can be swapped
//! without touching traversal.

mod number;
mod value;

pub use number::Number;
pub use value::{CompareError, Comparator, Kind, Value, ValueError};
