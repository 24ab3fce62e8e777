use std::borrow::Cow;

use caliper_value::{CompareError, Comparator, Kind, Number, Value, ValueError};
use serde_json::value::RawValue;
use serde_yaml::Value as YamlNode;

use crate::equal::equal as yaml_equal;

/// A YAML instance value borrowing a parsed node tree.
#[derive(Debug, Clone, Copy)]
pub struct YamlValue<'a> {
    node: &'a YamlNode,
}

impl<'a> YamlValue<'a> {
    pub fn new(node: &'a YamlNode) -> Self {
        YamlValue { node }
    }

    pub fn node(&self) -> &'a YamlNode {
        self.node
    }
}

/// Unwraps tagged nodes down to the underlying value.
pub(crate) fn resolve(node: &YamlNode) -> &YamlNode {
    let mut node = node;
    while let YamlNode::Tagged(tagged) = node {
        node = &tagged.value;
    }
    node
}

pub(crate) fn number_of(number: &serde_yaml::Number) -> Option<Number> {
    if let Some(i) = number.as_i64() {
        Some(Number::from_i64(i))
    } else if let Some(u) = number.as_u64() {
        Some(Number::from_u64(u))
    } else {
        number.as_f64().and_then(Number::from_f64)
    }
}

/// String form of a scalar mapping key, mirroring the scalar's source text
/// model. Collections are not usable as keys.
pub(crate) fn key_str(key: &YamlNode) -> Option<Cow<'_, str>> {
    match resolve(key) {
        YamlNode::String(s) => Some(Cow::Borrowed(s.as_str())),
        YamlNode::Bool(true) => Some(Cow::Borrowed("true")),
        YamlNode::Bool(false) => Some(Cow::Borrowed("false")),
        YamlNode::Number(n) => Some(Cow::Owned(n.to_string())),
        YamlNode::Null => Some(Cow::Borrowed("null")),
        _ => None,
    }
}

impl<'a> Value for YamlValue<'a> {
    fn kind(&self) -> Kind {
        match resolve(self.node) {
            YamlNode::Null => Kind::Null,
            YamlNode::Bool(_) => Kind::Bool,
            YamlNode::Number(_) => Kind::Number,
            YamlNode::String(_) => Kind::String,
            YamlNode::Sequence(_) => Kind::Array,
            YamlNode::Mapping(_) => Kind::Object,
            YamlNode::Tagged(_) => Kind::Invalid,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match resolve(self.node) {
            YamlNode::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<Number> {
        match resolve(self.node) {
            YamlNode::Number(n) => number_of(n),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<Cow<'_, str>> {
        match resolve(self.node) {
            YamlNode::String(s) => Some(Cow::Borrowed(s.as_str())),
            _ => None,
        }
    }

    fn each_element<E, F>(&self, mut cb: F) -> Result<(), E>
    where
        E: From<ValueError>,
        F: FnMut(Self) -> Result<(), E>,
    {
        match resolve(self.node) {
            YamlNode::Sequence(elements) => {
                for node in elements {
                    cb(YamlValue { node })?;
                }
                Ok(())
            }
            _ => Err(ValueError::Invalid("node is not a sequence".to_owned()).into()),
        }
    }

    fn each_entry<E, F>(&self, mut cb: F) -> Result<(), E>
    where
        E: From<ValueError>,
        F: FnMut(&str, Self) -> Result<(), E>,
    {
        match resolve(self.node) {
            YamlNode::Mapping(mapping) => {
                for (key, node) in mapping {
                    let key = key_str(key).ok_or(ValueError::NonStringKey)?;
                    cb(&key, YamlValue { node })?;
                }
                Ok(())
            }
            _ => Err(ValueError::Invalid("node is not a mapping".to_owned()).into()),
        }
    }
}

/// [`Comparator`] over [`YamlValue`] handles.
///
/// Enum variants arrive as raw JSON, which YAML supersets, so they are
/// parsed with the YAML reader and compared under YAML equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlComparator;

impl<'a> Comparator<YamlValue<'a>> for YamlComparator {
    fn equal(&self, a: &YamlValue<'a>, b: &YamlValue<'a>) -> Result<bool, CompareError> {
        yaml_equal(a.node, b.node)
    }

    fn contains(
        &self,
        variants: &[Box<RawValue>],
        value: &YamlValue<'a>,
    ) -> Result<bool, CompareError> {
        for variant in variants {
            let parsed: YamlNode = serde_yaml::from_str(variant.get())
                .map_err(|e| CompareError::MalformedVariant(e.to_string()))?;
            if yaml_equal(&parsed, value.node)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(text: &str) -> YamlNode {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn classification() {
        assert_eq!(YamlValue::new(&node("~")).kind(), Kind::Null);
        assert_eq!(YamlValue::new(&node("true")).kind(), Kind::Bool);
        assert_eq!(YamlValue::new(&node("1.5")).kind(), Kind::Number);
        assert_eq!(YamlValue::new(&node("hello")).kind(), Kind::String);
        assert_eq!(YamlValue::new(&node("[1, 2]")).kind(), Kind::Array);
        assert_eq!(YamlValue::new(&node("a: 1")).kind(), Kind::Object);
    }

    #[test]
    fn scalars() {
        let n = node("2.5");
        assert_eq!(YamlValue::new(&n).as_number(), Number::parse("2.5"));
        let n = node("text");
        assert_eq!(YamlValue::new(&n).as_str().unwrap(), "text");
        let n = node("false");
        assert_eq!(YamlValue::new(&n).as_bool(), Some(false));
    }

    #[test]
    fn alias_nodes_are_expanded() {
        let n = node("base: &b [1, 2]\nother: *b\n");
        let value = YamlValue::new(&n);
        let mut kinds = Vec::new();
        value
            .each_entry::<ValueError, _>(|key, child| {
                kinds.push((key.to_owned(), child.kind()));
                Ok(())
            })
            .unwrap();
        assert_eq!(
            kinds,
            [
                ("base".to_owned(), Kind::Array),
                ("other".to_owned(), Kind::Array)
            ]
        );
    }

    #[test]
    fn non_string_scalar_keys_are_stringified() {
        let n = node("1: a\ntrue: b\n");
        let mut keys = Vec::new();
        YamlValue::new(&n)
            .each_entry::<ValueError, _>(|key, _| {
                keys.push(key.to_owned());
                Ok(())
            })
            .unwrap();
        assert_eq!(keys, ["1", "true"]);
    }

    #[test]
    fn collection_keys_are_rejected() {
        let n = node("[1]: a\n");
        let err = YamlValue::new(&n)
            .each_entry::<ValueError, _>(|_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ValueError::NonStringKey));
    }

    #[test]
    fn comparator_contains_parses_json_variants() {
        let variants: Vec<Box<RawValue>> = [r#""Avenue""#, "10"]
            .iter()
            .map(|text| RawValue::from_string((*text).to_owned()).unwrap())
            .collect();
        let cmp = YamlComparator;
        let n = node("Avenue");
        assert!(cmp.contains(&variants, &YamlValue::new(&n)).unwrap());
        // !!float 10.0 equals the JSON integer 10 in rationals.
        let n = node("10.0");
        assert!(cmp.contains(&variants, &YamlValue::new(&n)).unwrap());
        let n = node("Lane");
        assert!(!cmp.contains(&variants, &YamlValue::new(&n)).unwrap());
    }
}
