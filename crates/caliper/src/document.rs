use caliper_json::{array_elements, decode_str, kind_of, object_entries};
use caliper_value::Kind;
use indexmap::IndexMap;
use serde_json::value::RawValue;
use url::Url;

use crate::error::{classify_json, Error, ResultExt};
use crate::uri::parse_reference;

/// A schema document with every embedded `id` collected.
#[derive(Debug)]
pub(crate) struct Document {
    /// Absolute root id, when the document declares one.
    pub id: Option<Url>,
    /// The document text.
    pub data: String,
    /// Absolute id → embedded subschema text, the root included.
    pub ids: IndexMap<String, String>,
}

impl Document {
    pub fn resolve_id(&self, uri: &str) -> Option<&str> {
        self.ids.get(uri).map(String::as_str)
    }
}

/// Builds a [`Document`] by walking `data` once, harvesting the `id` of
/// every subschema reachable through a schema-bearing keyword position.
/// Child bases compose with the parent's; `id` strings buried in `enum` or
/// unknown keywords are not harvested.
pub(crate) fn collect_ids(base: Option<&Url>, data: &str) -> Result<Document, Error> {
    let root: &RawValue = serde_json::from_str(data).map_err(classify_json)?;
    let entries = object_entries(root).map_err(classify_json).context("find id")?;

    let mut doc = Document {
        id: None,
        data: data.to_owned(),
        ids: IndexMap::new(),
    };

    let mut raw_id = None;
    for (key, value) in &entries {
        if key.as_ref() == "id" {
            let text = decode_str(value).map_err(classify_json).context("find id")?;
            let reference = parse_reference(base, &text)
                .map_err(Error::from)
                .context("find id")?;
            doc.id = reference.uri;
            raw_id = Some(reference.full);
        }
    }
    match (&doc.id, raw_id) {
        (Some(id), _) => {
            doc.ids.insert(id.to_string(), doc.data.clone());
        }
        // Unresolvable relative id: registered verbatim, usable only by the
        // identical reference text.
        (None, Some(raw)) => {
            doc.ids.insert(raw, doc.data.clone());
        }
        (None, None) => {}
    }

    let child_base = doc.id.clone().or_else(|| base.cloned());
    for (key, value) in &entries {
        match key.as_ref() {
            "definitions" | "properties" | "patternProperties" | "dependencies" => {
                if kind_of(value) == Kind::Object {
                    let children = object_entries(value).map_err(classify_json)?;
                    for (_, child) in children {
                        visit(&mut doc, child_base.as_ref(), child)?;
                    }
                }
            }
            "additionalItems" | "additionalProperties" | "not" => {
                visit(&mut doc, child_base.as_ref(), value)?;
            }
            "allOf" | "anyOf" | "oneOf" => {
                if kind_of(value) == Kind::Array {
                    for child in array_elements(value).map_err(classify_json)? {
                        visit(&mut doc, child_base.as_ref(), child)?;
                    }
                }
            }
            "items" => match kind_of(value) {
                Kind::Object => visit(&mut doc, child_base.as_ref(), value)?,
                Kind::Array => {
                    for child in array_elements(value).map_err(classify_json)? {
                        visit(&mut doc, child_base.as_ref(), child)?;
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(doc)
}

fn visit(doc: &mut Document, base: Option<&Url>, raw: &RawValue) -> Result<(), Error> {
    if kind_of(raw) != Kind::Object {
        return Ok(());
    }
    let sub = collect_ids(base, raw.get())?;
    doc.ids.extend(sub.ids);
    Ok(())
}
