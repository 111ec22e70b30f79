//! The shared definitions registry.

use indexmap::IndexMap;
use serde_json::Value;

use crate::{error::SerdeError, parse};

/// All named schemas that API documents can reference, loaded once
/// from the shared definitions document.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    schemas: IndexMap<String, Value>,
    security_schemes: Option<Value>,
}

impl Registry {
    /// Parses a shared definitions document, which must have a
    /// `components.schemas` mapping.
    pub fn from_yaml(yaml: &str) -> Result<Self, RegistryError> {
        let doc: Value = parse::from_yaml(yaml)?;
        Self::from_doc(doc)
    }

    pub fn from_doc(mut doc: Value) -> Result<Self, RegistryError> {
        let Some(components) = doc.get_mut("components").and_then(Value::as_object_mut) else {
            return Err(RegistryError::MissingSchemas);
        };
        let schemas = match components.remove("schemas") {
            Some(Value::Object(schemas)) => schemas.into_iter().collect(),
            _ => return Err(RegistryError::MissingSchemas),
        };
        let security_schemes = match components.remove("securitySchemes") {
            None | Some(Value::Null) => None,
            Some(schemes @ Value::Object(_)) => Some(schemes),
            Some(_) => return Err(RegistryError::BadSecuritySchemes),
        };
        Ok(Self {
            schemas,
            security_schemes,
        })
    }

    /// Builds a registry directly from named schemas.
    pub fn from_schemas(schemas: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            schemas: schemas.into_iter().collect(),
            security_schemes: None,
        }
    }

    /// Returns the schema with the given name, if it exists.
    #[inline]
    pub fn schema(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Returns an iterator over all schema names, in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Returns the shared `components.securitySchemes` mapping, if present.
    #[inline]
    pub fn security_schemes(&self) -> Option<&Value> {
        self.security_schemes.as_ref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("shared definitions must have a `components.schemas` mapping")]
    MissingSchemas,
    #[error("`components.securitySchemes` must be a mapping")]
    BadSecuritySchemes,
    #[error("failed to parse shared definitions")]
    Parse(#[from] SerdeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    use itertools::Itertools;
    use serde_json::json;

    use crate::tests::assert_matches;

    #[test]
    fn test_registry_from_yaml() {
        let registry = Registry::from_yaml(indoc::indoc! {"
            components:
              schemas:
                Pet:
                  type: object
                Owner:
                  type: string
              securitySchemes:
                ApiKey:
                  type: apiKey
                  in: header
                  name: X-Api-Key
        "})
        .unwrap();

        assert_eq!(registry.names().collect_vec(), ["Pet", "Owner"]);
        assert_eq!(registry.schema("Owner"), Some(&json!({"type": "string"})));
        assert_eq!(registry.schema("Ghost"), None);
        assert_matches!(registry.security_schemes(), Some(Value::Object(schemes)) if schemes.contains_key("ApiKey"));
    }

    #[test]
    fn test_registry_without_security_schemes() {
        let registry = Registry::from_yaml(indoc::indoc! {"
            components:
              schemas: {}
        "})
        .unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.security_schemes(), None);
    }

    #[test]
    fn test_registry_missing_schemas() {
        assert_matches!(
            Registry::from_yaml("openapi: 3.0.0\n"),
            Err(RegistryError::MissingSchemas)
        );
        assert_matches!(
            Registry::from_yaml("components:\n  responses: {}\n"),
            Err(RegistryError::MissingSchemas)
        );
        assert_matches!(
            Registry::from_yaml("components:\n  schemas: [Pet]\n"),
            Err(RegistryError::MissingSchemas)
        );
    }

    #[test]
    fn test_registry_bad_security_schemes() {
        assert_matches!(
            Registry::from_yaml(indoc::indoc! {"
                components:
                  schemas: {}
                  securitySchemes: oops
            "}),
            Err(RegistryError::BadSecuritySchemes)
        );
    }

    #[test]
    fn test_registry_unparseable() {
        assert_matches!(
            Registry::from_yaml("components: [unclosed"),
            Err(RegistryError::Parse(_))
        );
    }
}
