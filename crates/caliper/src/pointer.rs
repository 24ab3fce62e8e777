use std::borrow::Cow;

use caliper_json::{array_elements, decode_str, kind_of, object_entries};
use caliper_value::Kind;
use serde_json::value::RawValue;
use thiserror::Error;
use url::Url;

use crate::error::{Error, ResultExt};
use crate::uri::parse_reference;

#[derive(Debug, Error)]
pub enum PointerError {
    #[error("invalid pointer {0:?}: pointer must start with '/'")]
    Invalid(String),

    #[error("pointer {0:?} not found")]
    NotFound(String),

    #[error("invalid index {0:?}")]
    Index(String),

    #[error("unexpected type {0:?}")]
    UnexpectedType(&'static str),

    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Resolves a JSON-pointer `fragment` inside `buf`, returning the matched
/// slice together with the base URI in force there.
///
/// While scanning an object for a pointer part, an `"id"` sibling updates
/// the base even when it appears after the part; both are observed in one
/// pass. This is what lets a reference target inherit an enclosing `id`
/// scope.
pub(crate) fn find<'a>(
    base: Option<&Url>,
    buf: &'a str,
    fragment: &str,
) -> Result<(Option<Url>, &'a str), Error> {
    if fragment.is_empty() {
        return Ok((base.cloned(), buf));
    }
    let Some(pointer) = fragment.strip_prefix('/') else {
        return Err(PointerError::Invalid(fragment.to_owned()).into());
    };

    let mut current: &RawValue =
        serde_json::from_str(buf).map_err(|e| PointerError::Malformed(e.to_string()))?;
    let mut base = base.cloned();

    for part in pointer.split('/') {
        let part = unescape(part);
        let found = match kind_of(current) {
            Kind::Object => {
                let (new_base, found) = find_key(base.as_ref(), current, &part)
                    .with_context(|| format!("find key {part:?}"))?;
                base = new_base;
                found
            }
            Kind::Array => find_index(current, &part)
                .with_context(|| format!("find index {part:?}"))?,
            other => return Err(PointerError::UnexpectedType(other.name()).into()),
        };
        current = found.ok_or_else(|| PointerError::NotFound(pointer.to_owned()))?;
    }
    Ok((base, current.get()))
}

fn find_key<'a>(
    base: Option<&Url>,
    raw: &'a RawValue,
    part: &str,
) -> Result<(Option<Url>, Option<&'a RawValue>), Error> {
    let entries = object_entries(raw).map_err(|e| PointerError::Malformed(e.to_string()))?;
    let mut found: Option<&RawValue> = None;
    let mut id: Option<Url> = None;
    for (key, value) in entries {
        if found.is_some() && id.is_some() {
            break;
        }
        if key == part {
            if found.is_none() {
                found = Some(value);
            }
        } else if key == "id" && kind_of(value) == Kind::String {
            let text = decode_str(value).map_err(|e| PointerError::Malformed(e.to_string()))?;
            let reference = parse_reference(base, &text)
                .map_err(Error::from)
                .context("parse id")?;
            if let Some(uri) = reference.uri {
                id = Some(uri);
            }
        }
    }
    Ok((id.or_else(|| base.cloned()), found))
}

fn find_index<'a>(raw: &'a RawValue, part: &str) -> Result<Option<&'a RawValue>, Error> {
    let index = part
        .parse::<u64>()
        .map_err(|_| PointerError::Index(part.to_owned()))?;
    let elements = array_elements(raw).map_err(|e| PointerError::Malformed(e.to_string()))?;
    Ok(elements.get(index as usize).copied())
}

/// JSON-pointer unescape: `~1` is `/`, `~0` is `~`.
fn unescape(part: &str) -> Cow<'_, str> {
    if !part.contains('~') {
        return Cow::Borrowed(part);
    }
    let mut out = String::with_capacity(part.len());
    let mut chars = part.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            Some(other) => {
                out.push('~');
                out.push(other);
            }
            None => out.push('~'),
        }
    }
    Cow::Owned(out)
}
