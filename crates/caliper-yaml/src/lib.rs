//! YAML backend for caliper validation.
//!
//! Instances are parsed [`serde_yaml::Value`] trees. Anchors and aliases are
//! expanded by the parser; tagged nodes are resolved transparently when
//! classifying and comparing. Integer and float scalars are compared as
//! exact rationals, so `1` and `1.0` are the same number.

mod equal;
mod value;

pub use equal::equal;
pub use value::{YamlComparator, YamlValue};
