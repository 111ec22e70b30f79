//! The build entry point.
//!
//! A build loads the shared registry once, then bundles every configured API
//! in parallel. Each API gets its own worker, which resolves the API's schema
//! closure and writes three artifacts named after the API:
//!
//! * `<name>.yaml`, the bundled OpenAPI document;
//! * `<name>.json`, a JSON Schema document with the bundle as `definitions`;
//! * `<name>.d.ts`, type declarations for the bundle.
//!
//! When every worker has finished, the build writes index artifacts that
//! re-export all APIs, and stages the documentation site if one is configured.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use miette::{Context, IntoDiagnostic};
use serde_json::Value;

use crate::{
    bundle::{BundledDocument, JsonSchemaDocument, Resolver},
    codegen::{
        CodegenSchemasIndex, CodegenTypesIndex, normalize_name, typescript::TypeEmitter,
        write_to_disk,
    },
    parse,
    registry::Registry,
    site::{self, SiteApi},
};

mod config;

pub use config::*;

/// A summary of a successful build.
#[derive(Clone, Debug, Default)]
pub struct BuildReport {
    /// The built APIs, in configuration order.
    pub apis: Vec<ApiReport>,
    /// Every file that the build wrote.
    pub files: Vec<PathBuf>,
}

/// A summary of one built API.
#[derive(Clone, Debug)]
pub struct ApiReport {
    /// The normalized API name.
    pub name: String,
    /// The number of schemas in the API's bundle.
    pub schemas: usize,
    /// Referenced schemas that the registry doesn't define.
    pub unresolved: Vec<String>,
}

/// Runs a build.
pub fn run(config: &BuildConfig, emitter: &dyn TypeEmitter) -> miette::Result<BuildReport> {
    let names = config
        .apis
        .iter()
        .map(|api| normalize_name(&api.name))
        .collect_vec();
    if let Some(name) = names.iter().duplicates().next() {
        let apis = config
            .apis
            .iter()
            .zip(&names)
            .filter(|&(_, n)| n == name)
            .map(|(api, _)| format!("`{}`", api.name))
            .join(", ");
        miette::bail!("APIs {apis} would all be written as `{name}`");
    }

    let source = read(&config.shared_definitions)?;
    let registry = Registry::from_yaml(&source)
        .into_diagnostic()
        .with_context(|| {
            format!(
                "Failed to load shared definitions from `{}`",
                config.shared_definitions.display()
            )
        })?;
    tracing::info!(
        "Loaded {} shared schemas from `{}`",
        registry.len(),
        config.shared_definitions.display()
    );

    let registry = &registry;
    let results = std::thread::scope(|scope| {
        let workers = config
            .apis
            .iter()
            .zip(&names)
            .map(|(api, name)| {
                scope.spawn(move || {
                    let builder = ApiBuilder {
                        config,
                        registry,
                        emitter,
                    };
                    builder.build(api, name)
                })
            })
            .collect_vec();
        workers
            .into_iter()
            .map(|worker| {
                worker
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect_vec()
    });

    let mut report = BuildReport::default();
    let mut bundled = vec![];
    let mut failed = 0;
    for (api, result) in config.apis.iter().zip(results) {
        match result {
            Ok(built) => {
                report.files.extend(built.files);
                report.apis.push(built.report);
                bundled.push(built.yaml);
            }
            Err(err) => {
                tracing::error!(api = %api.name, "{err:?}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        miette::bail!("{failed} of {} APIs failed to build", config.apis.len());
    }

    report
        .files
        .push(write_to_disk(&config.output, CodegenTypesIndex::new(&names))?);
    report
        .files
        .push(write_to_disk(&config.output, CodegenSchemasIndex::new(&names))?);

    if let Some(site) = &config.site {
        let apis = names
            .iter()
            .zip(&bundled)
            .map(|(name, yaml)| SiteApi { name, yaml })
            .collect_vec();
        report.files.extend(site::stage(site, &apis)?);
    }

    tracing::info!(
        output = %config.output.display(),
        "Built {} APIs",
        report.apis.len()
    );
    Ok(report)
}

/// The shared state for building one API.
struct ApiBuilder<'a> {
    config: &'a BuildConfig,
    registry: &'a Registry,
    emitter: &'a dyn TypeEmitter,
}

/// The result of building one API.
struct BuiltApi {
    report: ApiReport,
    yaml: String,
    files: Vec<PathBuf>,
}

impl ApiBuilder<'_> {
    fn build(&self, api: &ApiConfig, name: &str) -> miette::Result<BuiltApi> {
        let source = read(&api.path)?;

        let resolution = Resolver::new(self.registry).resolve(&source);
        let unresolved = resolution.unresolved.iter().cloned().collect_vec();
        let bundle = if self.config.strict {
            resolution
                .into_strict()
                .into_diagnostic()
                .with_context(|| format!("Failed to resolve `{}`", api.path.display()))?
        } else {
            resolution.bundle
        };
        tracing::info!(api = %api.name, "Resolved {} schemas", bundle.len());

        let doc: Value = parse::from_yaml(&source)
            .into_diagnostic()
            .with_context(|| format!("Failed to parse `{}`", api.path.display()))?;
        let security_schemes = if api.security_schemes {
            self.registry.security_schemes()
        } else {
            None
        };
        let yaml = BundledDocument::new(doc, &bundle, security_schemes)
            .into_diagnostic()
            .with_context(|| format!("Failed to bundle `{}`", api.path.display()))?
            .to_yaml()
            .into_diagnostic()?;

        let schema = JsonSchemaDocument::from_bundle(name, &bundle);
        let json = schema.to_json_pretty().into_diagnostic()?;
        let types = self
            .emitter
            .emit(schema.definitions(), name, self.config.strict)
            .into_diagnostic()
            .with_context(|| format!("Failed to generate types for `{}`", api.name))?;

        let output = &self.config.output;
        let files = vec![
            write_to_disk(output, (format!("{name}.yaml"), yaml.clone()))?,
            write_to_disk(output, (format!("{name}.json"), json))?,
            write_to_disk(output, (format!("{name}.d.ts"), types))?,
        ];

        Ok(BuiltApi {
            report: ApiReport {
                name: name.to_owned(),
                schemas: bundle.len(),
                unresolved,
            },
            yaml,
            files,
        })
    }
}

fn read(path: &Path) -> miette::Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .with_context(|| format!("Failed to read `{}`", path.display()))
}
