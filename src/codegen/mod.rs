use std::path::{Path, PathBuf};

use itertools::Itertools;
use miette::{Context, IntoDiagnostic};

mod naming;
pub mod typescript;

pub use naming::*;

use self::typescript::{TsComments, emit_module, export_names, import_namespace_decl};

/// Writes a generated artifact to `output`, creating parent directories
/// as needed, and returns the written path.
pub fn write_to_disk(output: &Path, code: impl IntoCode) -> miette::Result<PathBuf> {
    let code = code.into_code();
    let path = output.join(code.path());
    let string = code.into_string()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .with_context(|| format!("Failed to create directory `{}`", parent.display()))?;
    }
    std::fs::write(&path, string)
        .into_diagnostic()
        .with_context(|| format!("Failed to write `{}`", path.display()))?;
    Ok(path)
}

/// A generated artifact, with a path relative to the output directory.
pub trait Code {
    fn path(&self) -> &str;
    fn into_string(self) -> miette::Result<String>;
}

/// An already-rendered artifact.
impl<T: AsRef<str>> Code for (T, String) {
    fn path(&self) -> &str {
        self.0.as_ref()
    }

    fn into_string(self) -> miette::Result<String> {
        Ok(self.1)
    }
}

pub trait IntoCode {
    type Code: Code;

    fn into_code(self) -> Self::Code;
}

impl<T: Code> IntoCode for T {
    type Code = T;

    fn into_code(self) -> Self::Code {
        self
    }
}

/// Generates `index.d.ts`, which re-exports the type declarations
/// of every API under its normalized name.
pub struct CodegenTypesIndex<'a> {
    names: &'a [String],
}

impl<'a> CodegenTypesIndex<'a> {
    pub fn new(names: &'a [String]) -> Self {
        Self { names }
    }
}

impl Code for CodegenTypesIndex<'_> {
    fn path(&self) -> &str {
        "index.d.ts"
    }

    fn into_string(self) -> miette::Result<String> {
        let comments = TsComments::new();
        let items = self
            .names
            .iter()
            .map(|name| import_namespace_decl(name, &format!("./{name}.d.ts")))
            .chain(std::iter::once(export_names(self.names)))
            .collect();
        emit_module(items, &comments).into_diagnostic()
    }
}

/// Generates `index.js`, which re-exports the JSON Schema documents
/// of every API under its normalized name.
pub struct CodegenSchemasIndex<'a> {
    names: &'a [String],
}

impl<'a> CodegenSchemasIndex<'a> {
    pub fn new(names: &'a [String]) -> Self {
        Self { names }
    }
}

impl Code for CodegenSchemasIndex<'_> {
    fn path(&self) -> &str {
        "index.js"
    }

    fn into_string(self) -> miette::Result<String> {
        let requires = self
            .names
            .iter()
            .map(|name| format!("const {name} = require('./{name}.json');\n"))
            .join("");
        Ok(format!(
            "{requires}module.exports = {{ {} }};\n",
            self.names.iter().join(", ")
        ))
    }
}
