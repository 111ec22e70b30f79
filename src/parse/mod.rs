//! Loading OpenAPI and shared definitions documents.
//!
//! Documents are loaded as generic [`serde_json::Value`] trees, with
//! insertion order preserved, so that bundled output keeps the author's
//! key order.

use serde::de::DeserializeOwned;

use crate::error::SerdeError;

mod refs;

pub use refs::*;

/// Parses a YAML (or JSON) string, reporting the path to any
/// value that fails to deserialize.
pub fn from_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T, SerdeError> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml);
    let result = serde_path_to_error::deserialize(deserializer)?;
    Ok(result)
}

/// Parses a JSON string, reporting the path to any
/// value that fails to deserialize.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, SerdeError> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let result = serde_path_to_error::deserialize(&mut deserializer)?;
    Ok(result)
}

/// Returns the value at a dotted path of object keys,
/// like `components.schemas`.
pub fn get_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(value, |value, key| value.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    use crate::tests::assert_matches;

    #[test]
    fn test_from_yaml_preserves_key_order() {
        let value: Value = from_yaml(indoc::indoc! {"
            zebra: 1
            apple: 2
            mango: 3
        "})
        .unwrap();
        let keys = value.as_object().unwrap().keys().collect::<Vec<_>>();
        assert_eq!(keys, ["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_from_yaml_stringifies_status_code_keys() {
        let value: Value = from_yaml(indoc::indoc! {"
            responses:
              200:
                description: OK
        "})
        .unwrap();
        assert_eq!(
            get_path(&value, "responses.200.description"),
            Some(&json!("OK"))
        );
    }

    #[test]
    fn test_from_yaml_reports_syntax_errors() {
        let result = from_yaml::<Value>("key: [unclosed");
        assert_matches!(result, Err(SerdeError::YamlWithPath(_)));
    }

    #[test]
    fn test_from_json() {
        let value: Value = from_json(r#"{"a": {"b": true}}"#).unwrap();
        assert_eq!(get_path(&value, "a.b"), Some(&json!(true)));
        assert_eq!(get_path(&value, "a.c"), None);
    }
}
