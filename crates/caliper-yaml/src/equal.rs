use std::borrow::Cow;
use std::collections::HashMap;

use caliper_value::CompareError;
use serde_yaml::Value as YamlNode;

use crate::value::{key_str, number_of, resolve};

/// Deep structural equality of two YAML nodes.
///
/// Number scalars compare as exact rationals regardless of integer or float
/// spelling. Mappings compare by key set with per-key recursion; keys must
/// be scalars.
pub fn equal(a: &YamlNode, b: &YamlNode) -> Result<bool, CompareError> {
    let a = resolve(a);
    let b = resolve(b);
    match (a, b) {
        (YamlNode::Null, YamlNode::Null) => Ok(true),
        (YamlNode::Bool(x), YamlNode::Bool(y)) => Ok(x == y),
        (YamlNode::Number(x), YamlNode::Number(y)) => {
            let x = number_of(x).ok_or_else(|| CompareError::InvalidNumber(x.to_string()))?;
            let y = number_of(y).ok_or_else(|| CompareError::InvalidNumber(y.to_string()))?;
            Ok(x == y)
        }
        (YamlNode::String(x), YamlNode::String(y)) => Ok(x == y),
        (YamlNode::Sequence(x), YamlNode::Sequence(y)) => {
            if x.len() != y.len() {
                return Ok(false);
            }
            for (left, right) in x.iter().zip(y) {
                if !equal(left, right)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (YamlNode::Mapping(x), YamlNode::Mapping(y)) => {
            if x.len() != y.len() {
                return Ok(false);
            }
            let mut left: HashMap<Cow<'_, str>, &YamlNode> = HashMap::with_capacity(x.len());
            for (key, value) in x {
                let key = scalar_key(key)?;
                left.insert(key, value);
            }
            for (key, right) in y {
                let key = scalar_key(key)?;
                match left.get(&key) {
                    Some(value) if equal(value, right)? => {}
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn scalar_key(key: &YamlNode) -> Result<Cow<'_, str>, CompareError> {
    key_str(key).ok_or_else(|| CompareError::NonScalarKey(format!("{key:?}")))
}
