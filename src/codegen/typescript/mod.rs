//! TypeScript type declarations for JSON Schema definitions.

use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::{Map, Value};
use swc_common::DUMMY_SP;
use swc_ecma_ast::{Decl, ModuleItem, TsKeywordTypeKind, TsType, TsTypeElement};

use crate::parse::SchemaRef;

use super::naming::{UniqueNames, ts_type_name};

mod emit;

pub(crate) use self::emit::{TsComments, emit_module, export_names, import_namespace_decl};

use self::emit::{
    array, export_decl, interface_decl, intersection, kw, lit_bool, lit_num, lit_str, nullable,
    property_sig, record, type_alias_decl, type_lit, type_ref, union,
};

const HEADER: &str = indoc::indoc! {"
    /* eslint-disable */
    /**
     * This file was automatically generated by refpack.
     * DO NOT MODIFY IT BY HAND. Instead, modify the source OpenAPI documents,
     * and rerun the build to regenerate this file.
     */
"};

/// Generates type declarations from named schema definitions.
pub trait TypeEmitter: Sync {
    /// Returns the declarations for all `definitions`, plus a root type
    /// named after `root`.
    ///
    /// A reference to a name that `definitions` doesn't contain is an
    /// [`EmitError::UnknownRef`] if `strict` is set. Otherwise, the
    /// reference becomes an `unknown` type.
    fn emit(
        &self,
        definitions: &IndexMap<String, Value>,
        root: &str,
        strict: bool,
    ) -> Result<String, EmitError>;
}

/// Emits TypeScript type declarations.
///
/// Every definition becomes an exported declaration: objects become
/// interfaces, and everything else becomes a type alias. References to
/// other definitions, as either `#/definitions/<Name>` or
/// `#/components/schemas/<Name>`, become references to their types.
#[derive(Clone, Copy, Debug, Default)]
pub struct TsEmitter;

impl TypeEmitter for TsEmitter {
    fn emit(
        &self,
        definitions: &IndexMap<String, Value>,
        root: &str,
        strict: bool,
    ) -> Result<String, EmitError> {
        let mut unique = UniqueNames::new();
        let root_name = unique.uniquify(ts_type_name(root));
        let names: IndexMap<&str, String> = definitions
            .keys()
            .map(|name| (name.as_str(), unique.uniquify(ts_type_name(name))))
            .collect();

        let comments = TsComments::new();
        let cx = TsContext {
            names: &names,
            comments: &comments,
            strict,
        };
        let mut items: Vec<ModuleItem> =
            vec![export_decl(interface_decl(&root_name, vec![]), DUMMY_SP)];
        for (name, schema) in definitions {
            let span = comments.span_with_jsdoc(description(schema));
            items.push(export_decl(cx.decl(&names[name.as_str()], schema)?, span));
        }

        let body = emit_module(items, &comments)?;
        Ok(format!("{HEADER}{body}"))
    }
}

/// Maps definition names to their unique TypeScript type names.
struct TsContext<'a> {
    names: &'a IndexMap<&'a str, String>,
    comments: &'a TsComments,
    strict: bool,
}

impl TsContext<'_> {
    fn decl(&self, name: &str, schema: &Value) -> Result<Decl, EmitError> {
        if let Some(object) = schema.as_object().filter(|object| is_interface(object)) {
            return Ok(interface_decl(name, self.members(object)?));
        }
        Ok(type_alias_decl(name, self.ty(schema)?))
    }

    fn ty(&self, schema: &Value) -> Result<Box<TsType>, EmitError> {
        let object = match schema {
            Value::Object(object) => object,
            Value::Bool(false) => return Ok(kw(TsKeywordTypeKind::TsNeverKeyword)),
            _ => return Ok(kw(TsKeywordTypeKind::TsUnknownKeyword)),
        };

        let ty = if let Some(r) = object.get("$ref") {
            self.ref_(r)?
        } else if let Some(value) = object.get("const") {
            literal(value)
        } else if let Some(Value::Array(variants)) = object.get("enum") {
            union(variants.iter().map(literal))
        } else if let Some(Value::Array(parents)) = object.get("allOf") {
            let mut parts: Vec<_> = parents.iter().map(|p| self.ty(p)).try_collect()?;
            if has_object_shape(object) {
                parts.push(self.object(object)?);
            }
            intersection(parts)
        } else if let Some(Value::Array(variants)) =
            object.get("oneOf").or_else(|| object.get("anyOf"))
        {
            union(variants.iter().map(|v| self.ty(v)).try_collect::<_, Vec<_>, _>()?)
        } else {
            match object.get("type") {
                Some(Value::String(ty)) => self.typed(ty, object)?,
                Some(Value::Array(types)) => union(
                    types
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|ty| self.typed(ty, object))
                        .try_collect::<_, Vec<_>, _>()?,
                ),
                _ if has_object_shape(object) => self.object(object)?,
                _ => kw(TsKeywordTypeKind::TsUnknownKeyword),
            }
        };

        Ok(match object.get("nullable") {
            Some(Value::Bool(true)) => nullable(ty),
            _ => ty,
        })
    }

    /// Returns the type for a schema with an explicit `type`.
    fn typed(&self, ty: &str, object: &Map<String, Value>) -> Result<Box<TsType>, EmitError> {
        Ok(match ty {
            "string" => kw(TsKeywordTypeKind::TsStringKeyword),
            "integer" | "number" => kw(TsKeywordTypeKind::TsNumberKeyword),
            "boolean" => kw(TsKeywordTypeKind::TsBooleanKeyword),
            "null" => kw(TsKeywordTypeKind::TsNullKeyword),
            "array" => match object.get("items") {
                // Tuple-style `items`.
                Some(Value::Array(items)) => array(union(
                    items.iter().map(|item| self.ty(item)).try_collect::<_, Vec<_>, _>()?,
                )),
                Some(items) => array(self.ty(items)?),
                None => array(kw(TsKeywordTypeKind::TsUnknownKeyword)),
            },
            "object" => self.object(object)?,
            _ => kw(TsKeywordTypeKind::TsUnknownKeyword),
        })
    }

    fn ref_(&self, r: &Value) -> Result<Box<TsType>, EmitError> {
        let Some(s) = r.as_str() else {
            return Err(EmitError::UnsupportedRef(r.to_string()));
        };
        let r = SchemaRef::parse_definition(s)
            .or_else(|_| SchemaRef::parse(s))
            .map_err(|_| EmitError::UnsupportedRef(s.to_owned()))?;
        match self.names.get(r.name()) {
            Some(name) => Ok(type_ref(name)),
            None if self.strict => Err(EmitError::UnknownRef(r.name().to_owned())),
            None => {
                tracing::debug!(name = r.name(), "emitting `unknown` for undefined schema");
                Ok(kw(TsKeywordTypeKind::TsUnknownKeyword))
            }
        }
    }

    /// Returns an anonymous object type: a type literal of the declared
    /// properties, a `Record` for additional properties, or both.
    fn object(&self, object: &Map<String, Value>) -> Result<Box<TsType>, EmitError> {
        let members = self.members(object)?;
        Ok(match self.additional(object)? {
            None => type_lit(members),
            Some(values) if members.is_empty() => record(values),
            Some(values) => intersection(vec![type_lit(members), record(values)]),
        })
    }

    /// Returns the property signatures for an object schema.
    fn members(&self, object: &Map<String, Value>) -> Result<Vec<TsTypeElement>, EmitError> {
        let required = match object.get("required") {
            Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect_vec(),
            _ => vec![],
        };
        let Some(Value::Object(properties)) = object.get("properties") else {
            return Ok(vec![]);
        };
        properties
            .iter()
            .map(|(name, schema)| -> Result<_, EmitError> {
                let span = self.comments.span_with_jsdoc(description(schema));
                let optional = !required.contains(&name.as_str());
                Ok(property_sig(name, optional, self.ty(schema)?, span))
            })
            .collect()
    }

    /// Returns the value type for `additionalProperties`, if the object
    /// allows them.
    fn additional(&self, object: &Map<String, Value>) -> Result<Option<Box<TsType>>, EmitError> {
        Ok(match object.get("additionalProperties") {
            Some(Value::Bool(true)) => Some(kw(TsKeywordTypeKind::TsUnknownKeyword)),
            Some(schema @ Value::Object(_)) => Some(self.ty(schema)?),
            _ => None,
        })
    }
}

/// Returns `true` if an object schema can be declared as an interface.
fn is_interface(object: &Map<String, Value>) -> bool {
    let composite = ["$ref", "const", "enum", "allOf", "oneOf", "anyOf"]
        .iter()
        .any(|key| object.contains_key(*key));
    let nullable = matches!(object.get("nullable"), Some(Value::Bool(true)));
    let typed_object = match object.get("type") {
        Some(Value::String(ty)) => ty == "object",
        Some(_) => false,
        None => has_object_shape(object),
    };
    !composite && !nullable && typed_object && !allows_additional(object)
}

fn allows_additional(object: &Map<String, Value>) -> bool {
    matches!(
        object.get("additionalProperties"),
        Some(Value::Bool(true) | Value::Object(_))
    )
}

fn has_object_shape(object: &Map<String, Value>) -> bool {
    object.contains_key("properties") || object.contains_key("additionalProperties")
}

fn description(schema: &Value) -> Option<&str> {
    schema.get("description").and_then(Value::as_str)
}

fn literal(value: &Value) -> Box<TsType> {
    match value {
        Value::String(s) => lit_str(s),
        Value::Number(n) => lit_num(n),
        Value::Bool(b) => lit_bool(*b),
        Value::Null => kw(TsKeywordTypeKind::TsNullKeyword),
        Value::Array(_) | Value::Object(_) => kw(TsKeywordTypeKind::TsUnknownKeyword),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("reference to undefined schema `{0}`")]
    UnknownRef(String),
    #[error("unsupported reference `{0}`")]
    UnsupportedRef(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
