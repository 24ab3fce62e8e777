use caliper_value::Number;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde_json::value::RawValue;

use crate::raw::TypeTag;

/// Index of a compiled node within its [`Schema`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SchemaId(pub u32);

/// A compiled schema.
///
/// Nodes live in an arena and link to each other by index, so reference
/// cycles are plain index cycles with single ownership. Immutable once
/// compiled; any number of validations may share it concurrently.
#[derive(Debug)]
pub struct Schema {
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) root: SchemaId,
}

impl Schema {
    pub(crate) fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0 as usize]
    }
}

#[derive(Debug)]
pub(crate) struct PatternProperty {
    pub regex: Regex,
    pub schema: SchemaId,
}

/// `additionalProperties` / `additionalItems` in compiled form.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Additional {
    Bool(bool),
    Schema(SchemaId),
}

/// `items` in compiled form; the source shape stays observable.
#[derive(Debug, Clone)]
pub(crate) enum Items {
    Single(SchemaId),
    Many(Vec<SchemaId>),
}

#[derive(Debug, Default)]
pub(crate) struct SchemaNode {
    pub types: TypeSet,
    pub format: Option<Box<str>>,
    pub enum_values: Vec<Box<RawValue>>,

    pub all_of: Vec<SchemaId>,
    pub any_of: Vec<SchemaId>,
    pub one_of: Vec<SchemaId>,
    pub not: Option<SchemaId>,

    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub required: IndexSet<String>,
    pub properties: IndexMap<String, SchemaId>,
    pub pattern_properties: Vec<PatternProperty>,
    pub additional_properties: Option<Additional>,
    pub dependent_required: IndexMap<String, Vec<String>>,
    pub dependent_schemas: IndexMap<String, SchemaId>,

    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub items: Option<Items>,
    pub additional_items: Option<Additional>,

    pub minimum: Option<Number>,
    pub exclusive_minimum: bool,
    pub maximum: Option<Number>,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<Number>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Regex>,
}

/// Bitset of admitted primitive types. Empty admits everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TypeSet(u8);

impl TypeSet {
    pub const NULL: TypeSet = TypeSet(1);
    pub const BOOL: TypeSet = TypeSet(1 << 1);
    pub const NUMBER: TypeSet = TypeSet(1 << 2);
    pub const INTEGER: TypeSet = TypeSet(1 << 3);
    pub const STRING: TypeSet = TypeSet(1 << 4);
    pub const ARRAY: TypeSet = TypeSet(1 << 5);
    pub const OBJECT: TypeSet = TypeSet(1 << 6);

    pub fn insert(&mut self, tag: TypeTag) {
        let bit = match tag {
            TypeTag::Array => TypeSet::ARRAY,
            TypeTag::Boolean => TypeSet::BOOL,
            TypeTag::Integer => TypeSet::INTEGER,
            TypeTag::Null => TypeSet::NULL,
            TypeTag::Number => TypeSet::NUMBER,
            TypeTag::Object => TypeSet::OBJECT,
            TypeTag::String => TypeSet::STRING,
        };
        self.0 |= bit.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether a value of type `t` passes the type keyword; an empty set
    /// admits everything.
    pub fn admits(self, t: TypeSet) -> bool {
        self.0 == 0 || self.0 & t.0 != 0
    }

    /// Strict membership, with no empty-set exemption.
    pub fn contains(self, t: TypeSet) -> bool {
        self.0 & t.0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_admits_everything() {
        let set = TypeSet::default();
        assert!(set.is_empty());
        assert!(set.admits(TypeSet::NULL));
        assert!(set.admits(TypeSet::OBJECT));
        assert!(!set.contains(TypeSet::NULL));
    }

    #[test]
    fn membership() {
        let mut set = TypeSet::default();
        set.insert(TypeTag::Integer);
        set.insert(TypeTag::String);
        assert!(set.admits(TypeSet::INTEGER));
        assert!(set.admits(TypeSet::STRING));
        assert!(!set.admits(TypeSet::NUMBER));
        assert!(!set.admits(TypeSet::ARRAY));
        assert!(set.contains(TypeSet::INTEGER));
    }
}
