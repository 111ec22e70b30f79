//! Bundles OpenAPI documents against a registry of shared schema definitions.
//!
//! Every API document references shared schemas by name. [`bundle`] computes
//! the closure of schemas that a document needs, and [`build`] turns each
//! closure into a self-contained OpenAPI document, a JSON Schema document,
//! and TypeScript type declarations.

pub mod build;
pub mod bundle;
pub mod codegen;
pub mod error;
pub mod parse;
pub mod registry;
pub mod site;
