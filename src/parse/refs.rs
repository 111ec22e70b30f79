use std::{fmt::Display, sync::LazyLock};

use indexmap::IndexSet;
use regex::Regex;

/// The pointer prefix for named schema components.
pub const SCHEMAS_PREFIX: &str = "#/components/schemas/";

/// The pointer prefix for JSON Schema definitions.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Matches quoted schema references. The `regex` crate doesn't support
/// backreferences, so each quote style gets its own alternative.
static QUOTED_SCHEMA_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##""#/components/schemas/([A-Za-z0-9_]+)"|'#/components/schemas/([A-Za-z0-9_]+)'"##)
        .unwrap()
});

/// A reference to a named schema, like `#/components/schemas/Pet`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SchemaRef<'a>(&'a str);

impl<'a> SchemaRef<'a> {
    /// Parses a `#/components/schemas/<Name>` reference.
    pub fn parse(s: &'a str) -> Result<Self, BadSchemaRef> {
        Self::parse_with_prefix(s, SCHEMAS_PREFIX)
    }

    /// Parses a `#/definitions/<Name>` reference, as used in
    /// JSON Schema documents.
    pub fn parse_definition(s: &'a str) -> Result<Self, BadSchemaRef> {
        Self::parse_with_prefix(s, DEFINITIONS_PREFIX)
    }

    fn parse_with_prefix(s: &'a str, prefix: &str) -> Result<Self, BadSchemaRef> {
        let name = s.strip_prefix(prefix).ok_or(BadSchemaRef::NotSchemaRef)?;
        if is_schema_name(name) {
            Ok(Self(name))
        } else {
            Err(BadSchemaRef::BadName(name.to_owned()))
        }
    }

    /// Returns the referenced schema name.
    #[inline]
    pub fn name(self) -> &'a str {
        self.0
    }
}

impl Display for SchemaRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{SCHEMAS_PREFIX}{}", self.0)
    }
}

/// Returns `true` if `name` is a non-empty run of ASCII letters,
/// digits, and underscores.
pub fn is_schema_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Scans raw document text for quoted schema references, and returns
/// the referenced names in order of first appearance, without duplicates.
///
/// The text doesn't need to be a valid document: only the textual shape
/// `"#/components/schemas/<Name>"` (or the single-quoted form) matters.
pub fn scan_refs(text: &str) -> Vec<SchemaRef<'_>> {
    let refs: IndexSet<SchemaRef<'_>> = QUOTED_SCHEMA_REF
        .captures_iter(text)
        .filter_map(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map(|name| SchemaRef(name.as_str()))
        .collect();
    refs.into_iter().collect()
}

#[derive(Debug, thiserror::Error)]
pub enum BadSchemaRef {
    #[error("only `#/components/schemas/<Name>` references are supported")]
    NotSchemaRef,
    #[error("invalid schema name `{0}`")]
    BadName(String),
}
