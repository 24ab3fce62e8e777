use std::borrow::Cow;
use std::collections::HashMap;

use caliper_value::{CompareError, Kind, Number};
use serde_json::value::RawValue;

use crate::raw::{array_elements, decode_str, kind_of, object_entries};

/// Deep structural equality of two raw JSON values.
///
/// Numbers are equal when their exact rational values are equal, so `10`,
/// `1e1` and `1.0e1` all compare equal. Objects compare by key set with
/// per-key recursion; entry order is irrelevant and a duplicated key keeps
/// its last value, as in JSON object semantics.
pub fn equal(a: &RawValue, b: &RawValue) -> Result<bool, CompareError> {
    let kind = kind_of(a);
    if kind != kind_of(b) {
        return Ok(false);
    }
    match kind {
        Kind::Null => Ok(true),
        Kind::Bool => Ok(a.get() == b.get()),
        Kind::Number => Ok(parse_number(a)? == parse_number(b)?),
        Kind::String => Ok(decode(a)? == decode(b)?),
        Kind::Array => {
            let left = array_elements(a).map_err(malformed)?;
            let right = array_elements(b).map_err(malformed)?;
            if left.len() != right.len() {
                return Ok(false);
            }
            for (x, y) in left.iter().zip(&right) {
                if !equal(x, y)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Kind::Object => {
            let left = entry_map(a)?;
            let right = entry_map(b)?;
            if left.len() != right.len() {
                return Ok(false);
            }
            for (key, y) in &right {
                match left.get(key) {
                    Some(x) if equal(x, y)? => {}
                    _ => return Ok(false),
                }
            }
            Ok(true)
        }
        Kind::Invalid => Ok(false),
    }
}

fn parse_number(raw: &RawValue) -> Result<Number, CompareError> {
    Number::parse(raw.get()).ok_or_else(|| CompareError::InvalidNumber(raw.get().to_owned()))
}

fn decode(raw: &RawValue) -> Result<Cow<'_, str>, CompareError> {
    decode_str(raw).map_err(malformed)
}

fn entry_map(raw: &RawValue) -> Result<HashMap<Cow<'_, str>, &'_ RawValue>, CompareError> {
    let entries = object_entries(raw).map_err(malformed)?;
    Ok(entries.into_iter().collect())
}

fn malformed(err: serde_json::Error) -> CompareError {
    CompareError::MalformedVariant(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(a: &str, b: &str) -> bool {
        let a: &RawValue = serde_json::from_str(a).unwrap();
        let b: &RawValue = serde_json::from_str(b).unwrap();
        equal(a, b).unwrap()
    }

    #[test]
    fn scalars() {
        assert!(eq("null", "null"));
        assert!(eq("true", "true"));
        assert!(!eq("true", "false"));
        assert!(!eq("null", "false"));
        assert!(eq(r#""a""#, r#""a""#));
        assert!(!eq(r#""a""#, r#""b""#));
        assert!(eq(r#""A""#, r#""A""#));
    }

    #[test]
    fn numbers_compare_as_rationals() {
        assert!(eq("10", "1e1"));
        assert!(eq("1", "1.0"));
        assert!(eq("-0.5", "-5e-1"));
        assert!(!eq("1", "1.0000000000000001"));
        // Distinguishable past f64 precision.
        assert!(!eq(
            "123456789012345678901234567890",
            "123456789012345678901234567891"
        ));
    }

    #[test]
    fn string_never_equals_number() {
        assert!(!eq(r#""1""#, "1"));
    }

    #[test]
    fn arrays_elementwise() {
        assert!(eq("[1, 2]", "[1.0, 2]"));
        assert!(!eq("[1, 2]", "[2, 1]"));
        assert!(!eq("[1]", "[1, 1]"));
    }

    #[test]
    fn objects_ignore_entry_order() {
        assert!(eq(r#"{"a":1,"b":[2]}"#, r#"{"b":[2],"a":1}"#));
        assert!(!eq(r#"{"a":1}"#, r#"{"a":2}"#));
        assert!(!eq(r#"{"a":1}"#, r#"{"a":1,"b":2}"#));
    }

    #[test]
    fn nested() {
        assert!(eq(
            r#"{"a":{"b":[1,{"c":10}]}}"#,
            r#"{"a":{"b":[1.0,{"c":1e1}]}}"#
        ));
    }
}
