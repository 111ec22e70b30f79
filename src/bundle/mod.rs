//! Reference closure resolution.
//!
//! An API document references shared schemas by name. Resolving the document
//! computes the smallest self-contained [`Bundle`] of shared schemas that it
//! needs: every schema it references directly, plus every schema that those
//! schemas reference, transitively.
//!
//! The document's own references are found by scanning its raw text, so the
//! document doesn't need to parse on its own. References nested in shared
//! schemas are found by walking the schema trees.

use std::collections::{BTreeSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;

use crate::{parse::scan_refs, registry::Registry};

mod document;
mod visitor;


pub use document::*;
pub use visitor::*;

/// Resolves the schema bundle for `source` against `registry`, skipping
/// references to schemas that the registry doesn't define.
pub fn resolve(source: &str, registry: &Registry) -> Bundle {
    Resolver::new(registry).resolve(source).bundle
}

/// Computes schema bundles from a shared registry.
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'a> {
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    #[inline]
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Resolves all schemas that the source text references,
    /// directly or transitively.
    pub fn resolve(&self, source: &str) -> Resolution {
        let seeds = scan_refs(source).into_iter().map(|r| r.name());
        self.resolve_names(seeds)
    }

    /// Resolves the closure of the given schema names.
    pub fn resolve_names<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Resolution {
        let mut bundle = IndexMap::new();
        let mut unresolved = IndexSet::new();

        // Every name enters the queue at most once, so each schema is
        // fetched at most once, even when schemas reference each other.
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for name in names {
            if seen.insert(name.to_owned()) {
                queue.push_back(name.to_owned());
            }
        }

        while let Some(name) = queue.pop_front() {
            let Some(schema) = self.registry.schema(&name) else {
                tracing::debug!(schema = %name, "skipping reference to undefined schema");
                unresolved.insert(name);
                continue;
            };
            for r in RefVisitor::new(schema) {
                if seen.insert(r.name().to_owned()) {
                    queue.push_back(r.name().to_owned());
                }
            }
            bundle.insert(name, schema.clone());
        }

        Resolution {
            bundle: Bundle(bundle),
            unresolved,
        }
    }
}

/// The result of resolving a document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    /// All referenced schemas that the registry defines.
    pub bundle: Bundle,
    /// The names of referenced schemas that the registry doesn't define,
    /// in the order they were discovered.
    pub unresolved: IndexSet<String>,
}

impl Resolution {
    /// Returns the bundle if every reference was resolved, or an error
    /// listing the undefined schemas.
    pub fn into_strict(self) -> Result<Bundle, UnresolvedRefs> {
        if self.unresolved.is_empty() {
            Ok(self.bundle)
        } else {
            Err(UnresolvedRefs(self.unresolved.into_iter().collect()))
        }
    }
}

/// A minimal, self-contained set of named schemas.
///
/// Schemas are ordered by discovery: the document's own references in the
/// order they first appear, followed by nested references, breadth-first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Bundle(IndexMap<String, Value>);

impl Bundle {
    /// Returns the schema with the given name, if it's in this bundle.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns an iterator over the names in this bundle.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns an iterator over the named schemas in this bundle.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts this bundle into a JSON object of named schemas.
    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }
}

/// References to schemas that the shared definitions don't define.
#[derive(Debug, thiserror::Error)]
#[error("references to undefined schemas: {}", .0.iter().map(|name| format!("`{name}`")).join(", "))]
pub struct UnresolvedRefs(pub Vec<String>);
