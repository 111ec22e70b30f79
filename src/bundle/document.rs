use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{error::SerdeError, parse};

use super::{Bundle, visitor::rewrite_refs_to_definitions};

/// An API document whose schemas have been replaced with
/// a resolved [`Bundle`].
#[derive(Clone, Debug, PartialEq)]
pub struct BundledDocument {
    doc: Value,
}

impl BundledDocument {
    /// Replaces the `components.schemas` section of `doc` with `bundle`,
    /// keeping the document's other components. If `security_schemes`
    /// is given, it replaces `components.securitySchemes`.
    pub fn new(
        mut doc: Value,
        bundle: &Bundle,
        security_schemes: Option<&Value>,
    ) -> Result<Self, DocumentError> {
        let Value::Object(root) = &mut doc else {
            return Err(DocumentError::NotAMapping);
        };
        let components = root
            .entry("components")
            .or_insert_with(|| Value::Object(Map::new()));
        if components.is_null() {
            *components = Value::Object(Map::new());
        }
        let Value::Object(components) = components else {
            return Err(DocumentError::BadComponents);
        };
        components.insert("schemas".to_owned(), bundle.clone().into_value());
        if let Some(schemes) = security_schemes {
            components.insert("securitySchemes".to_owned(), schemes.clone());
        }
        Ok(Self { doc })
    }

    /// Returns the bundled document tree.
    #[inline]
    pub fn as_value(&self) -> &Value {
        &self.doc
    }

    /// Renders the bundled document as YAML.
    pub fn to_yaml(&self) -> Result<String, SerdeError> {
        Ok(serde_yaml::to_string(&self.doc)?)
    }
}

/// A JSON Schema document with the schemas of one API as
/// `definitions`, and references rewritten to point at them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JsonSchemaDocument {
    #[serde(rename = "$id")]
    id: String,
    definitions: IndexMap<String, Value>,
}

impl JsonSchemaDocument {
    /// Builds a JSON Schema document from a resolved bundle.
    pub fn from_bundle(id: impl Into<String>, bundle: &Bundle) -> Self {
        Self::from_schemas(
            id,
            bundle
                .iter()
                .map(|(name, schema)| (name.to_owned(), schema.clone())),
        )
    }

    /// Builds a JSON Schema document from the `components.schemas`
    /// section of an OpenAPI document.
    pub fn from_document(id: impl Into<String>, doc: &Value) -> Result<Self, DocumentError> {
        let Some(Value::Object(schemas)) = parse::get_path(doc, "components.schemas") else {
            return Err(DocumentError::MissingSchemas);
        };
        Ok(Self::from_schemas(
            id,
            schemas
                .iter()
                .map(|(name, schema)| (name.clone(), schema.clone())),
        ))
    }

    fn from_schemas(id: impl Into<String>, schemas: impl Iterator<Item = (String, Value)>) -> Self {
        let definitions = schemas
            .map(|(name, mut schema)| {
                rewrite_refs_to_definitions(&mut schema);
                (name, schema)
            })
            .collect();
        Self {
            id: id.into(),
            definitions,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the named schema definitions.
    #[inline]
    pub fn definitions(&self) -> &IndexMap<String, Value> {
        &self.definitions
    }

    /// Renders this document as JSON, indented with two spaces.
    pub fn to_json_pretty(&self) -> Result<String, SerdeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("API document must be a mapping")]
    NotAMapping,
    #[error("`components` must be a mapping")]
    BadComponents,
    #[error("document must have a `components.schemas` mapping")]
    MissingSchemas,
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::{bundle::Resolver, registry::Registry, tests::assert_matches};

    fn pet_bundle() -> Bundle {
        let registry = Registry::from_schemas([
            (
                "Pet".to_owned(),
                json!({
                    "type": "object",
                    "properties": {"owner": {"$ref": "#/components/schemas/Owner"}},
                }),
            ),
            ("Owner".to_owned(), json!({"type": "string"})),
        ]);
        Resolver::new(&registry).resolve_names(["Pet"]).bundle
    }

    #[test]
    fn test_bundled_document_replaces_schemas() {
        let doc: Value = parse::from_yaml(indoc::indoc! {"
            openapi: 3.0.0
            info:
              title: Pets
              version: 1.0.0
            paths: {}
            components:
              responses:
                NotFound:
                  description: Not found
              schemas:
                Local:
                  type: string
        "})
        .unwrap();

        let bundled = BundledDocument::new(doc, &pet_bundle(), None).unwrap();
        assert_eq!(
            bundled.to_yaml().unwrap(),
            indoc::indoc! {"
                openapi: 3.0.0
                info:
                  title: Pets
                  version: 1.0.0
                paths: {}
                components:
                  responses:
                    NotFound:
                      description: Not found
                  schemas:
                    Pet:
                      type: object
                      properties:
                        owner:
                          $ref: '#/components/schemas/Owner'
                    Owner:
                      type: string
            "}
        );
    }

    #[test]
    fn test_bundled_document_adds_components() {
        let doc = json!({"openapi": "3.0.0", "paths": {}});
        let schemes = json!({"ApiKey": {"type": "apiKey", "in": "header", "name": "X-Key"}});
        let bundled = BundledDocument::new(doc, &Bundle::default(), Some(&schemes)).unwrap();
        assert_eq!(
            bundled.as_value(),
            &json!({
                "openapi": "3.0.0",
                "paths": {},
                "components": {
                    "schemas": {},
                    "securitySchemes": {
                        "ApiKey": {"type": "apiKey", "in": "header", "name": "X-Key"},
                    },
                },
            })
        );
    }

    #[test]
    fn test_bundled_document_rejects_non_mappings() {
        assert_matches!(
            BundledDocument::new(json!(["openapi"]), &Bundle::default(), None),
            Err(DocumentError::NotAMapping)
        );
        assert_matches!(
            BundledDocument::new(json!({"components": 1}), &Bundle::default(), None),
            Err(DocumentError::BadComponents)
        );
    }

    #[test]
    fn test_json_schema_from_bundle() {
        let schema = JsonSchemaDocument::from_bundle("pets", &pet_bundle());
        assert_eq!(
            schema.to_json_pretty().unwrap(),
            indoc::indoc! {r##"
                {
                  "$id": "pets",
                  "definitions": {
                    "Pet": {
                      "type": "object",
                      "properties": {
                        "owner": {
                          "$ref": "#/definitions/Owner"
                        }
                      }
                    },
                    "Owner": {
                      "type": "string"
                    }
                  }
                }"##}
        );
    }

    #[test]
    fn test_json_schema_from_document() {
        let doc = json!({
            "components": {
                "schemas": {
                    "Win": {"items": {"$ref": "#/components/schemas/Round"}},
                    "Round": {"type": "integer"},
                },
            },
        });
        let schema = JsonSchemaDocument::from_document("Win", &doc).unwrap();
        assert_eq!(schema.id(), "Win");
        assert_eq!(
            schema.definitions()["Win"],
            json!({"items": {"$ref": "#/definitions/Round"}})
        );

        assert_matches!(
            JsonSchemaDocument::from_document("Win", &json!({"paths": {}})),
            Err(DocumentError::MissingSchemas)
        );
    }
}
