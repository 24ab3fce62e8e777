use std::collections::hash_map::Entry;
use std::collections::HashMap;

use caliper_value::Number;
use regex::Regex;
use serde_json::value::RawValue;
use url::Url;

use crate::document::{collect_ids, Document};
use crate::error::{classify_json, Error, ResultExt};
use crate::pointer::find;
use crate::raw::{Num, RawAdditional, RawItems, RawSchema, SchemaType};
use crate::remote::RemoteResolver;
use crate::schema::{Additional, Items, PatternProperty, Schema, SchemaId, SchemaNode, TypeSet};
use crate::uri::{strip_fragment, Reference, UriError};

const MAX_RESOLVE_DEPTH: usize = 1000;

/// The base URI in force for the subtree being compiled. A subschema
/// declaring its own `id` derives a child scope; everything else inherits.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolveCtx {
    base: Option<Url>,
}

impl ResolveCtx {
    fn new(base: Option<Url>) -> Self {
        ResolveCtx { base }
    }

    fn reference(&self, text: &str) -> Result<Reference, UriError> {
        crate::uri::parse_reference(self.base.as_ref(), text)
    }
}

/// Compiles raw schemas into the immutable arena form.
///
/// Owns one compile session: the node arena, the ref cache, the remote
/// document cache and the shared resolve-depth counter. Not shareable; a
/// concurrent compile needs its own compiler.
pub(crate) struct Compiler<R> {
    doc: Document,
    root_locator: Option<String>,
    remote: R,
    remotes: HashMap<String, Document>,
    refcache: HashMap<String, SchemaId>,
    nodes: Vec<SchemaNode>,
    depth: usize,
}

impl<R: RemoteResolver> Compiler<R> {
    pub fn new(doc: Document, remote: R) -> Self {
        let root_locator = doc.id.as_ref().map(|id| strip_fragment(id).to_string());
        Compiler {
            doc,
            root_locator,
            remote,
            remotes: HashMap::new(),
            refcache: HashMap::new(),
            nodes: Vec::new(),
            depth: 0,
        }
    }

    pub fn compile(mut self, raw: RawSchema) -> Result<Schema, Error> {
        let base = self.doc.id.clone();
        let root = self.compile_schema(raw, ResolveCtx::new(base), None)?;
        Ok(Schema {
            nodes: self.nodes,
            root,
        })
    }

    fn alloc(&mut self) -> SchemaId {
        let id = SchemaId(self.nodes.len() as u32);
        self.nodes.push(SchemaNode::default());
        id
    }

    /// Compiles one raw schema into a fresh node.
    ///
    /// The node id is published under `publish` before any child compiles,
    /// so a reference back into this schema resolves to the node while it
    /// is still being filled. That is what breaks reference cycles.
    fn compile_schema(
        &mut self,
        raw: RawSchema,
        ctx: ResolveCtx,
        publish: Option<String>,
    ) -> Result<SchemaId, Error> {
        // A $ref replaces every sibling keyword.
        if let Some(reference) = raw.reference {
            return self
                .resolve(&reference, &ctx)
                .with_context(|| format!("resolve {reference:?}"));
        }

        let mut ctx = ctx;
        if let Some(id) = &raw.id {
            let parsed = ctx.reference(id).map_err(Error::from).context("parse id")?;
            if let Some(uri) = parsed.uri {
                ctx = ResolveCtx::new(Some(uri));
            }
        }

        // `format` is accepted and dropped; the compiled slot stays empty.

        let id = self.alloc();
        if let Some(key) = publish {
            self.refcache.insert(key, id);
        }

        let mut node = SchemaNode {
            types: type_set(raw.types),
            enum_values: raw.enum_values.unwrap_or_default(),
            min_properties: raw.min_properties,
            max_properties: raw.max_properties,
            min_items: raw.min_items,
            max_items: raw.max_items,
            unique_items: raw.unique_items,
            exclusive_minimum: raw.exclusive_minimum,
            exclusive_maximum: raw.exclusive_maximum,
            min_length: raw.min_length,
            max_length: raw.max_length,
            ..SchemaNode::default()
        };

        for field in raw.required {
            // Entries must be strings and must be unique.
            if node.required.contains(&field) {
                return Err(Error::DuplicateRequired(field));
            }
            node.required.insert(field);
        }

        for property in raw.properties.0 {
            let child = self
                .compile_schema(property.schema, ctx.clone(), None)
                .with_context(|| format!("property {:?}", property.name))?;
            node.properties.insert(property.name, child);
        }

        for property in raw.pattern_properties.0 {
            let compiled = self
                .compile_pattern_property(&property.pattern, property.schema, &ctx)
                .with_context(|| format!("patternProperty {:?}", property.pattern))?;
            node.pattern_properties.push(compiled);
        }

        if let Some(items) = raw.items {
            node.items = Some(match items {
                RawItems::Single(schema) => Items::Single(
                    self.compile_schema(*schema, ctx.clone(), None)
                        .context("items")?,
                ),
                RawItems::Many(schemas) => {
                    Items::Many(self.compile_many(schemas, &ctx).context("items")?)
                }
            });
        }

        if let Some(additional) = raw.additional_properties {
            node.additional_properties = Some(
                self.compile_additional(additional, &ctx)
                    .context("additionalProperties")?,
            );
        }

        for (field, schema) in raw.dependencies.schemas {
            let child = self
                .compile_schema(schema, ctx.clone(), None)
                .with_context(|| format!("dependent schema {field:?}"))?;
            node.dependent_schemas.insert(field, child);
        }
        node.dependent_required = raw.dependencies.required;

        if let Some(additional) = raw.additional_items {
            node.additional_items = Some(
                self.compile_additional(additional, &ctx)
                    .context("additionalItems")?,
            );
        }

        if let Some(pattern) = raw.pattern {
            node.pattern = Some(compile_regex(&pattern).context("pattern")?);
        }

        node.all_of = self.compile_many(raw.all_of, &ctx).context("allOf")?;
        node.any_of = self.compile_many(raw.any_of, &ctx).context("anyOf")?;
        node.one_of = self.compile_many(raw.one_of, &ctx).context("oneOf")?;
        if let Some(not) = raw.not {
            node.not = Some(self.compile_schema(*not, ctx.clone(), None).context("not")?);
        }

        node.minimum = parse_number_keyword(raw.minimum, "minimum")?;
        node.maximum = parse_number_keyword(raw.maximum, "maximum")?;
        node.multiple_of = parse_number_keyword(raw.multiple_of, "multipleOf")?;

        self.nodes[id.0 as usize] = node;
        Ok(id)
    }

    fn compile_pattern_property(
        &mut self,
        pattern: &str,
        schema: RawSchema,
        ctx: &ResolveCtx,
    ) -> Result<PatternProperty, Error> {
        let regex = compile_regex(pattern)?;
        let schema = self.compile_schema(schema, ctx.clone(), None)?;
        Ok(PatternProperty { regex, schema })
    }

    fn compile_many(
        &mut self,
        schemas: Vec<RawSchema>,
        ctx: &ResolveCtx,
    ) -> Result<Vec<SchemaId>, Error> {
        let mut compiled = Vec::with_capacity(schemas.len());
        for (index, schema) in schemas.into_iter().enumerate() {
            compiled.push(
                self.compile_schema(schema, ctx.clone(), None)
                    .with_context(|| format!("[{index}]"))?,
            );
        }
        Ok(compiled)
    }

    fn compile_additional(
        &mut self,
        raw: RawAdditional,
        ctx: &ResolveCtx,
    ) -> Result<Additional, Error> {
        Ok(match raw {
            RawAdditional::Bool(allow) => Additional::Bool(allow),
            RawAdditional::Schema(schema) => {
                Additional::Schema(self.compile_schema(*schema, ctx.clone(), None)?)
            }
        })
    }

    /// Maps a `$ref` to a compiled node: ref-cache hit, or resolve the
    /// target document and compile it under a context based at the resolved
    /// locator. The depth counter is shared across the whole session, so
    /// reference chains that pre-caching cannot break still terminate.
    fn resolve(&mut self, reference: &str, ctx: &ResolveCtx) -> Result<SchemaId, Error> {
        let parsed = ctx
            .reference(reference)
            .map_err(Error::from)
            .context("parse ref")?;
        if let Some(&cached) = self.refcache.get(&parsed.full) {
            return Ok(cached);
        }
        if self.depth + 1 >= MAX_RESOLVE_DEPTH {
            return Err(Error::InfiniteRecursion);
        }
        self.depth += 1;
        let result = match self.resolve_url(&parsed).context("resolve URL") {
            Ok((base, raw)) => self.compile_schema(raw, ResolveCtx::new(base), Some(parsed.full)),
            Err(err) => Err(err),
        };
        self.depth -= 1;
        result
    }

    /// Locates the reference target: an embedded id matching the full URI
    /// wins, then the root document by locator, then the remote cache with
    /// a fetch on miss. The fragment is applied inside the chosen document.
    fn resolve_url(&mut self, parsed: &Reference) -> Result<(Option<Url>, RawSchema), Error> {
        if let Some(slice) = self.doc.resolve_id(&parsed.full) {
            let raw = serde_json::from_str(slice).map_err(classify_json)?;
            return Ok((parsed.uri.as_ref().map(strip_fragment), raw));
        }

        let doc: &Document = if parsed.locator.is_empty()
            || Some(&parsed.locator) == self.root_locator.as_ref()
        {
            &self.doc
        } else {
            match self.remotes.entry(parsed.locator.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let data = self
                        .remote
                        .fetch(&parsed.locator)
                        .map_err(Error::from)
                        .with_context(|| format!("remote {:?}", parsed.locator))?;
                    let text: &RawValue =
                        serde_json::from_slice(&data).map_err(classify_json)?;
                    let document = collect_ids(None, text.get())?;
                    entry.insert(document)
                }
            }
        };

        let (new_base, slice) = find(parsed.uri.as_ref(), &doc.data, &parsed.fragment)?;
        let raw = serde_json::from_str(slice).map_err(classify_json)?;
        Ok((new_base.map(|uri| strip_fragment(&uri)), raw))
    }
}

fn compile_regex(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_owned(),
        source: Box::new(source),
    })
}

fn type_set(types: Option<SchemaType>) -> TypeSet {
    let mut set = TypeSet::default();
    if let Some(SchemaType(tags)) = types {
        for tag in tags {
            set.insert(tag);
        }
    }
    set
}

fn parse_number_keyword(num: Option<Num>, name: &'static str) -> Result<Option<Number>, Error> {
    let Some(num) = num else { return Ok(None) };
    match Number::parse(&num.0) {
        Some(value) => Ok(Some(value)),
        None => Err(Error::InvalidNumber(num.0.into_string())).context(name),
    }
}
