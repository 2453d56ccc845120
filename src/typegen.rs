//! Type declarations generated from schemas.

use serde_json::Value;

use crate::SchemaError;
use crate::schema::{Schema, infer_schema};

/// Turns a schema into source-level type declarations.
pub trait TypeCompiler {
    /// Compiles `schema` into a declaration named `type_name`.
    fn compile(&self, schema: &Schema, type_name: &str) -> Result<String, SchemaError>;
}

impl<F> TypeCompiler for F
where
    F: Fn(&Schema, &str) -> Result<String, SchemaError>,
{
    fn compile(&self, schema: &Schema, type_name: &str) -> Result<String, SchemaError> {
        self(schema, type_name)
    }
}

/// Emits TypeScript declarations without a banner comment.
///
/// Objects become interfaces with optional members; permissive objects get
/// an `[k: string]: unknown` index signature. Other schemas become type
/// aliases.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeScriptCompiler;

impl TypeCompiler for TypeScriptCompiler {
    fn compile(&self, schema: &Schema, type_name: &str) -> Result<String, SchemaError> {
        if !is_identifier(type_name) {
            return Err(SchemaError::InvalidTypeName(type_name.to_owned()));
        }

        let body = render(schema, 0);
        Ok(match schema {
            Schema::Object { .. } => format!("export interface {type_name} {body}\n"),
            _ => format!("export type {type_name} = {body};\n"),
        })
    }
}

/// Generates declarations for `schema` under `type_name`.
///
/// A top-level array with an item schema is emitted as an item declaration
/// named `{type_name}Item` followed by an array alias.
pub fn generate_type_from_schema<C>(
    compiler: &C,
    schema: &Schema,
    type_name: &str,
) -> Result<String, SchemaError>
where
    C: TypeCompiler + ?Sized,
{
    if let Schema::Array { items: Some(items) } = schema {
        let item_name = format!("{type_name}Item");
        let item_type = compiler.compile(items, &item_name)?;
        return Ok(format!(
            "{item_type}\nexport type {type_name} = {item_name}[];\n"
        ));
    }

    compiler.compile(schema, type_name)
}

/// Infers a schema from `data` and emits TypeScript for it.
///
/// An empty `type_name` falls back to `Root`.
pub fn generate_type_from_json(data: &Value, type_name: &str) -> Result<String, SchemaError> {
    let schema = infer_schema(data);
    let type_name = if type_name.is_empty() { "Root" } else { type_name };
    generate_type_from_schema(&TypeScriptCompiler, &schema, type_name)
}

fn render(schema: &Schema, depth: usize) -> String {
    match schema {
        Schema::Unconstrained => "unknown".to_owned(),
        Schema::Any => "any".to_owned(),
        Schema::Primitive(kind) => kind.as_str().to_owned(),
        Schema::Array { items: None } => "unknown[]".to_owned(),
        Schema::Array { items: Some(items) } => match items.as_ref() {
            Schema::Union(_) => format!("({})[]", render(items, depth)),
            other => format!("{}[]", render(other, depth)),
        },
        Schema::Union(variants) => variants
            .iter()
            .map(|variant| render(variant, depth))
            .collect::<Vec<_>>()
            .join(" | "),
        Schema::Object {
            properties,
            additional_properties,
        } => {
            if properties.is_empty() && !additional_properties {
                return "{}".to_owned();
            }

            let indent = "  ".repeat(depth + 1);
            let mut out = String::from("{\n");
            for (name, property) in properties {
                out.push_str(&format!(
                    "{indent}{}?: {};\n",
                    property_key(name),
                    render(property, depth + 1)
                ));
            }
            if *additional_properties {
                out.push_str(&format!("{indent}[k: string]: unknown;\n"));
            }
            out.push_str(&"  ".repeat(depth));
            out.push('}');
            out
        }
    }
}

fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_owned()
    } else {
        Value::String(name.to_owned()).to_string()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
