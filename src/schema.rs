//! Structural schemas inferred from example JSON.
//!
//! [`infer_schema`] describes one sample; [`merge_schemas`] folds the
//! descriptions of several samples for the same slot into one. The result
//! renders to a JSON Schema document with [`Schema::to_value`].

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::SchemaError;

/// JSON primitive kinds distinguished by inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl PrimitiveKind {
    /// Name of the kind as written in a JSON Schema `type` keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// Structural description of JSON-shaped data.
#[derive(Clone, Debug, PartialEq)]
pub enum Schema {
    /// No constraint at all (`{}`).
    Unconstrained,
    /// Any value; inferred from `null`.
    Any,
    Primitive(PrimitiveKind),
    Array { items: Option<Box<Schema>> },
    /// Properties keep the order they were first seen in.
    /// `additional_properties` is set only when `properties` is empty.
    Object {
        properties: IndexMap<String, Schema>,
        additional_properties: bool,
    },
    /// Alternatives whose kinds disagree.
    Union(Vec<Schema>),
}

/// Top-level tag of a [`Schema`], used to decide how samples merge.
///
/// Unconstrained schemas and unions carry no `type` keyword, so they share
/// [`SchemaKind::Untyped`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Untyped,
    Any,
    Primitive(PrimitiveKind),
    Array,
    Object,
}

impl Schema {
    /// Returns the tag that decides how this schema merges with others.
    pub fn kind(&self) -> SchemaKind {
        match self {
            Self::Unconstrained | Self::Union(_) => SchemaKind::Untyped,
            Self::Any => SchemaKind::Any,
            Self::Primitive(kind) => SchemaKind::Primitive(*kind),
            Self::Array { .. } => SchemaKind::Array,
            Self::Object { .. } => SchemaKind::Object,
        }
    }

    /// Builds an object schema, deriving `additional_properties` from
    /// whether any property is known.
    pub fn object(properties: IndexMap<String, Schema>) -> Self {
        let additional_properties = properties.is_empty();
        Self::Object {
            properties,
            additional_properties,
        }
    }

    /// Builds an array schema with the given item schema.
    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Some(Box::new(items)),
        }
    }

    /// Renders the schema as a JSON Schema document.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Unconstrained => Value::Object(Map::new()),
            Self::Any => typed("any"),
            Self::Primitive(kind) => typed(kind.as_str()),
            Self::Array { items } => {
                let mut map = Map::new();
                map.insert("type".to_owned(), Value::from("array"));
                if let Some(items) = items {
                    map.insert("items".to_owned(), items.to_value());
                }
                Value::Object(map)
            }
            Self::Object {
                properties,
                additional_properties,
            } => {
                let mut map = Map::new();
                map.insert("type".to_owned(), Value::from("object"));
                map.insert(
                    "properties".to_owned(),
                    Value::Object(
                        properties
                            .iter()
                            .map(|(name, schema)| (name.clone(), schema.to_value()))
                            .collect(),
                    ),
                );
                map.insert(
                    "additionalProperties".to_owned(),
                    Value::Bool(*additional_properties),
                );
                Value::Object(map)
            }
            Self::Union(variants) => {
                let mut map = Map::new();
                map.insert(
                    "anyOf".to_owned(),
                    Value::Array(variants.iter().map(Schema::to_value).collect()),
                );
                Value::Object(map)
            }
        }
    }

    /// Reads a JSON Schema document produced by [`Self::to_value`] or written
    /// by hand in the same subset.
    ///
    /// `integer` is read as a number and `null` as any. Keywords outside the
    /// subset are ignored.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        read_schema(value, "")
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn typed(name: &str) -> Value {
    let mut map = Map::new();
    map.insert("type".to_owned(), Value::from(name));
    Value::Object(map)
}

fn read_schema(value: &Value, pointer: &str) -> Result<Schema, SchemaError> {
    let malformed = |reason: &str| SchemaError::Malformed {
        pointer: if pointer.is_empty() { "/".to_owned() } else { pointer.to_owned() },
        reason: reason.to_owned(),
    };

    let Value::Object(map) = value else {
        return match value {
            Value::Bool(true) => Ok(Schema::Unconstrained),
            _ => Err(malformed("expected a schema object")),
        };
    };

    if let Some(variants) = map.get("anyOf") {
        let Value::Array(variants) = variants else {
            return Err(malformed("anyOf must be an array"));
        };
        return variants
            .iter()
            .enumerate()
            .map(|(index, variant)| read_schema(variant, &format!("{pointer}/anyOf/{index}")))
            .collect::<Result<Vec<_>, _>>()
            .map(Schema::Union);
    }

    let Some(kind) = map.get("type") else {
        return Ok(Schema::Unconstrained);
    };
    let Value::String(kind) = kind else {
        return Err(malformed("type must be a string"));
    };

    match kind.as_str() {
        "any" | "null" => Ok(Schema::Any),
        "string" => Ok(Schema::Primitive(PrimitiveKind::String)),
        "number" | "integer" => Ok(Schema::Primitive(PrimitiveKind::Number)),
        "boolean" => Ok(Schema::Primitive(PrimitiveKind::Boolean)),
        "array" => {
            let items = map
                .get("items")
                .map(|items| read_schema(items, &format!("{pointer}/items")))
                .transpose()?;
            Ok(Schema::Array {
                items: items.map(Box::new),
            })
        }
        "object" => {
            let properties: IndexMap<String, Schema> = match map.get("properties") {
                None => IndexMap::new(),
                Some(Value::Object(properties)) => properties
                    .iter()
                    .map(|(name, schema)| {
                        read_schema(schema, &format!("{pointer}/properties/{name}"))
                            .map(|schema| (name.clone(), schema))
                    })
                    .collect::<Result<_, _>>()?,
                Some(_) => return Err(malformed("properties must be an object")),
            };
            let additional_properties = match map.get("additionalProperties") {
                None => properties.is_empty(),
                Some(Value::Bool(allowed)) => *allowed,
                Some(_) => return Err(malformed("additionalProperties must be a boolean")),
            };
            Ok(Schema::Object {
                properties,
                additional_properties,
            })
        }
        other => Err(malformed(&format!("unsupported type '{other}'"))),
    }
}

/// Infers the schema of one JSON value.
pub fn infer_schema(value: &Value) -> Schema {
    match value {
        Value::Null => Schema::Any,
        Value::Bool(_) => Schema::Primitive(PrimitiveKind::Boolean),
        Value::Number(_) => Schema::Primitive(PrimitiveKind::Number),
        Value::String(_) => Schema::Primitive(PrimitiveKind::String),
        Value::Array(elements) if elements.is_empty() => Schema::array(Schema::Unconstrained),
        Value::Array(elements) => {
            let items: Vec<Schema> = elements.iter().map(infer_schema).collect();
            Schema::array(merge_schemas(items))
        }
        Value::Object(entries) => Schema::object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), infer_schema(value)))
                .collect(),
        ),
    }
}

/// Merges schemas describing samples of the same slot.
///
/// Inputs of mixed kinds become a [`Schema::Union`] of all inputs in order.
/// Objects merge property by property in first-seen order, arrays merge their
/// item schemas, and anything else keeps the first input.
pub fn merge_schemas(mut schemas: Vec<Schema>) -> Schema {
    match schemas.len() {
        0 => return Schema::Unconstrained,
        1 => return schemas.remove(0),
        _ => {}
    }

    let kind = schemas[0].kind();
    if schemas.iter().any(|schema| schema.kind() != kind) {
        return Schema::Union(schemas);
    }

    match kind {
        SchemaKind::Object => {
            let mut grouped: IndexMap<String, Vec<Schema>> = IndexMap::new();
            for schema in schemas {
                if let Schema::Object { properties, .. } = schema {
                    for (name, property) in properties {
                        grouped.entry(name).or_default().push(property);
                    }
                }
            }
            Schema::object(
                grouped
                    .into_iter()
                    .map(|(name, samples)| (name, merge_schemas(samples)))
                    .collect(),
            )
        }
        SchemaKind::Array => {
            let items = schemas
                .into_iter()
                .filter_map(|schema| match schema {
                    Schema::Array { items } => items.map(|items| *items),
                    _ => None,
                })
                .collect();
            Schema::array(merge_schemas(items))
        }
        _ => schemas.remove(0),
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use super::{PrimitiveKind, Schema, infer_schema, merge_schemas};
    use crate::SchemaError;

    fn string() -> Schema {
        Schema::Primitive(PrimitiveKind::String)
    }

    fn number() -> Schema {
        Schema::Primitive(PrimitiveKind::Number)
    }

    #[test]
    fn infers_primitives_and_null() {
        assert_eq!(infer_schema(&json!(null)), Schema::Any);
        assert_eq!(infer_schema(&json!("a")), string());
        assert_eq!(infer_schema(&json!(1.5)), number());
        assert_eq!(
            infer_schema(&json!(true)),
            Schema::Primitive(PrimitiveKind::Boolean)
        );
    }

    #[test]
    fn empty_array_has_unconstrained_items() {
        assert_eq!(infer_schema(&json!([])), Schema::array(Schema::Unconstrained));
        assert_eq!(
            infer_schema(&json!([])).to_value(),
            json!({ "type": "array", "items": {} })
        );
    }

    #[test]
    fn empty_object_allows_additional_properties() {
        assert_eq!(
            infer_schema(&json!({})).to_value(),
            json!({ "type": "object", "properties": {}, "additionalProperties": true })
        );
        assert_eq!(
            infer_schema(&json!({ "a": 1 })).to_value(),
            json!({
                "type": "object",
                "properties": { "a": { "type": "number" } },
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn array_items_merge_object_samples() {
        let schema = infer_schema(&json!([{ "id": 1 }, { "id": 2, "name": "rex" }]));
        let expected = Schema::array(Schema::object(IndexMap::from([
            ("id".to_owned(), number()),
            ("name".to_owned(), string()),
        ])));
        assert_eq!(schema, expected);
    }

    #[test]
    fn mixed_array_becomes_union_in_order() {
        let schema = infer_schema(&json!([1, "a", null]));
        assert_eq!(
            schema,
            Schema::array(Schema::Union(vec![number(), string(), Schema::Any]))
        );
    }

    #[test]
    fn properties_keep_sample_order() {
        let schema = infer_schema(&json!({ "name": "rex", "id": 1, "age": 3 }));
        let Schema::Object { properties, .. } = &schema else {
            panic!("expected an object schema");
        };
        assert_eq!(
            properties.keys().collect::<Vec<_>>(),
            vec!["name", "id", "age"]
        );

        let merged = merge_schemas(vec![
            infer_schema(&json!({ "name": "rex" })),
            infer_schema(&json!({ "id": 2, "name": "ada" })),
        ]);
        let Schema::Object { properties, .. } = &merged else {
            panic!("expected an object schema");
        };
        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["name", "id"]);

        let rendered = schema.to_value();
        let keys: Vec<&String> = rendered["properties"]
            .as_object()
            .expect("properties object")
            .keys()
            .collect();
        assert_eq!(keys, vec!["name", "id", "age"]);
    }

    #[test]
    fn empty_and_mixed_nested_arrays_keep_first_untyped_items() {
        assert_eq!(
            infer_schema(&json!([[[]], [[1, "a"]]])),
            Schema::array(Schema::array(Schema::array(Schema::Unconstrained)))
        );
        assert_eq!(
            merge_schemas(vec![
                Schema::Union(vec![number(), string()]),
                Schema::Unconstrained,
            ]),
            Schema::Union(vec![number(), string()])
        );
    }

    #[test]
    fn single_merge_is_identity() {
        for value in [
            json!(null),
            json!([1, { "a": [] }]),
            json!({ "nested": { "x": [true, false] } }),
        ] {
            let schema = infer_schema(&value);
            assert_eq!(merge_schemas(vec![schema.clone()]), schema);
        }
    }

    #[test]
    fn empty_merge_is_unconstrained() {
        assert_eq!(merge_schemas(Vec::new()), Schema::Unconstrained);
    }

    #[test]
    fn object_merge_is_order_independent() {
        let a = infer_schema(&json!({ "id": 1, "tags": ["x"] }));
        let b = infer_schema(&json!({ "id": 2, "tags": [], "owner": null }));
        assert_eq!(
            merge_schemas(vec![a.clone(), b.clone()]),
            merge_schemas(vec![b, a])
        );
    }

    #[test]
    fn disjoint_objects_take_union_of_properties() {
        let a = infer_schema(&json!({ "id": 1 }));
        let b = infer_schema(&json!({ "name": "rex" }));
        let merged = merge_schemas(vec![a, b]);
        assert_eq!(
            merged,
            Schema::object(IndexMap::from([
                ("id".to_owned(), number()),
                ("name".to_owned(), string()),
            ]))
        );
    }

    #[test]
    fn different_kinds_become_union_verbatim() {
        let object = infer_schema(&json!({ "id": 1 }));
        let merged = merge_schemas(vec![object.clone(), string()]);
        assert_eq!(merged, Schema::Union(vec![object, string()]));
    }

    #[test]
    fn merging_empty_objects_stays_permissive() {
        let merged = merge_schemas(vec![infer_schema(&json!({})), infer_schema(&json!({}))]);
        assert_eq!(
            merged,
            Schema::Object {
                properties: IndexMap::new(),
                additional_properties: true,
            }
        );
    }

    #[test]
    fn arrays_without_items_are_skipped() {
        let merged = merge_schemas(vec![
            Schema::Array { items: None },
            Schema::array(number()),
        ]);
        assert_eq!(merged, Schema::array(number()));
    }

    #[test]
    fn same_primitive_keeps_first() {
        assert_eq!(merge_schemas(vec![number(), number()]), number());
    }

    #[test]
    fn reads_back_rendered_schema() {
        let schema = infer_schema(&json!([{ "id": 1, "tags": ["a", 2], "meta": {} }]));
        let parsed = Schema::from_value(&schema.to_value()).expect("readable");
        assert_eq!(parsed, schema);
    }

    #[test]
    fn rejects_unsupported_type() {
        let document = json!({ "type": "object", "properties": { "a": { "type": 3 } } });
        let error = Schema::from_value(&document).expect_err("type must be a string");
        match error {
            SchemaError::Malformed { pointer, .. } => assert_eq!(pointer, "/properties/a"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
