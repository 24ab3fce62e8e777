use std::fmt;

use indexmap::IndexMap;
use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::value::RawValue;

/// Unparsed schema record: one level of the schema DSL, keywords kept in
/// their source shape. Unknown keywords are dropped by the decoder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawSchema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub types: Option<SchemaType>,
    pub format: Option<String>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Box<RawValue>>>,

    pub all_of: Vec<RawSchema>,
    pub any_of: Vec<RawSchema>,
    pub one_of: Vec<RawSchema>,
    pub not: Option<Box<RawSchema>>,

    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub required: Vec<String>,
    pub properties: RawProperties,
    pub pattern_properties: RawPatternProperties,
    pub additional_properties: Option<RawAdditional>,
    pub dependencies: RawDependencies,

    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub items: Option<RawItems>,
    pub additional_items: Option<RawAdditional>,

    pub minimum: Option<Num>,
    pub exclusive_minimum: bool,
    pub maximum: Option<Num>,
    pub exclusive_maximum: bool,
    pub multiple_of: Option<Num>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
}

/// A recognized `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeTag {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl TypeTag {
    fn parse<E: de::Error>(value: &str) -> Result<TypeTag, E> {
        Ok(match value {
            "array" => TypeTag::Array,
            "boolean" => TypeTag::Boolean,
            "integer" => TypeTag::Integer,
            "null" => TypeTag::Null,
            "number" => TypeTag::Number,
            "object" => TypeTag::Object,
            "string" => TypeTag::String,
            _ => return Err(E::custom(format_args!("unexpected type {value:?}"))),
        })
    }
}

/// The `type` keyword: a single tag or an array of tags.
#[derive(Debug, Clone)]
pub(crate) struct SchemaType(pub Vec<TypeTag>);

impl<'de> Deserialize<'de> for SchemaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TypeVisitor;

        impl<'de> Visitor<'de> for TypeVisitor {
            type Value = SchemaType;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a type name or an array of type names")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<SchemaType, E> {
                Ok(SchemaType(vec![TypeTag::parse(value)?]))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<SchemaType, A::Error> {
                let mut tags = Vec::new();
                while let Some(value) = seq.next_element::<String>()? {
                    tags.push(TypeTag::parse(&value)?);
                }
                Ok(SchemaType(tags))
            }
        }

        deserializer.deserialize_any(TypeVisitor)
    }
}

/// A numeric keyword kept as its source text; converted to an exact
/// rational at compile time.
#[derive(Debug, Clone)]
pub(crate) struct Num(pub Box<str>);

impl<'de> Deserialize<'de> for Num {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Box<RawValue> = Deserialize::deserialize(deserializer)?;
        let text = raw.get();
        match text.as_bytes().first() {
            Some(b'-' | b'0'..=b'9') => Ok(Num(text.into())),
            _ => Err(de::Error::custom(format_args!("invalid number {text}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawProperty {
    pub name: String,
    pub schema: RawSchema,
}

/// `properties`, with source ordering preserved.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawProperties(pub Vec<RawProperty>);

impl<'de> Deserialize<'de> for RawProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = RawProperties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of schemas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawProperties, A::Error> {
                let mut properties = Vec::new();
                while let Some((name, schema)) = map.next_entry::<String, RawSchema>()? {
                    properties.push(RawProperty { name, schema });
                }
                Ok(RawProperties(properties))
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawPatternProperty {
    pub pattern: String,
    pub schema: RawSchema,
}

/// `patternProperties`, with source ordering preserved; match order is
/// observable.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawPatternProperties(pub Vec<RawPatternProperty>);

impl<'de> Deserialize<'de> for RawPatternProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PatternPropertiesVisitor;

        impl<'de> Visitor<'de> for PatternPropertiesVisitor {
            type Value = RawPatternProperties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of schemas")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> Result<RawPatternProperties, A::Error> {
                let mut properties = Vec::new();
                while let Some((pattern, schema)) = map.next_entry::<String, RawSchema>()? {
                    properties.push(RawPatternProperty { pattern, schema });
                }
                Ok(RawPatternProperties(properties))
            }
        }

        deserializer.deserialize_map(PatternPropertiesVisitor)
    }
}

/// `additionalProperties` / `additionalItems`: a boolean or a schema.
#[derive(Debug, Clone)]
pub(crate) enum RawAdditional {
    Bool(bool),
    Schema(Box<RawSchema>),
}

impl<'de> Deserialize<'de> for RawAdditional {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AdditionalVisitor;

        impl<'de> Visitor<'de> for AdditionalVisitor {
            type Value = RawAdditional;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a boolean or a schema object")
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<RawAdditional, E> {
                Ok(RawAdditional::Bool(value))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<RawAdditional, A::Error> {
                RawSchema::deserialize(MapAccessDeserializer::new(map))
                    .map(|schema| RawAdditional::Schema(Box::new(schema)))
            }
        }

        deserializer.deserialize_any(AdditionalVisitor)
    }
}

/// `items`: a single schema or an array of schemas; the form used is
/// remembered.
#[derive(Debug, Clone)]
pub(crate) enum RawItems {
    Single(Box<RawSchema>),
    Many(Vec<RawSchema>),
}

impl<'de> Deserialize<'de> for RawItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemsVisitor;

        impl<'de> Visitor<'de> for ItemsVisitor {
            type Value = RawItems;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a schema object or an array of schemas")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<RawItems, A::Error> {
                RawSchema::deserialize(MapAccessDeserializer::new(map))
                    .map(|schema| RawItems::Single(Box::new(schema)))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<RawItems, A::Error> {
                Vec::<RawSchema>::deserialize(SeqAccessDeserializer::new(seq)).map(RawItems::Many)
            }
        }

        deserializer.deserialize_any(ItemsVisitor)
    }
}

/// `dependencies`: each value is either a list of required names or a
/// dependent schema.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawDependencies {
    pub required: IndexMap<String, Vec<String>>,
    pub schemas: IndexMap<String, RawSchema>,
}

enum DependencyValue {
    Required(Vec<String>),
    Schema(RawSchema),
}

impl<'de> Deserialize<'de> for DependencyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DependencyVisitor;

        impl<'de> Visitor<'de> for DependencyVisitor {
            type Value = DependencyValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an array of property names or a schema object")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<DependencyValue, A::Error> {
                Vec::<String>::deserialize(SeqAccessDeserializer::new(seq))
                    .map(DependencyValue::Required)
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<DependencyValue, A::Error> {
                RawSchema::deserialize(MapAccessDeserializer::new(map)).map(DependencyValue::Schema)
            }
        }

        deserializer.deserialize_any(DependencyVisitor)
    }
}

impl<'de> Deserialize<'de> for RawDependencies {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DependenciesVisitor;

        impl<'de> Visitor<'de> for DependenciesVisitor {
            type Value = RawDependencies;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of dependency entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawDependencies, A::Error> {
                let mut dependencies = RawDependencies::default();
                while let Some(key) = map.next_key::<String>()? {
                    match map.next_value::<DependencyValue>()? {
                        DependencyValue::Required(names) => {
                            dependencies.required.insert(key, names);
                        }
                        DependencyValue::Schema(schema) => {
                            dependencies.schemas.insert(key, schema);
                        }
                    }
                }
                Ok(dependencies)
            }
        }

        deserializer.deserialize_map(DependenciesVisitor)
    }
}
