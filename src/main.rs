use std::path::Path;

use miette::{Context, IntoDiagnostic, Result};
use refpack::{
    build,
    bundle::{JsonSchemaDocument, Resolver},
    codegen::typescript::TsEmitter,
    parse,
    registry::Registry,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

mod cli;

use self::cli::{Command, Main, Resolve, Schema};

fn main() -> Result<()> {
    let Ok(main) = Main::parse().map_err(|err| err.exit());
    init_logging(main.verbose);

    match main.command {
        Command::Build(config) => {
            println!("Building {} APIs...", config.apis.len());
            let report = build::run(&config, &TsEmitter)?;
            for api in &report.apis {
                println!("{}: {} schemas", api.name, api.schemas);
                if !api.unresolved.is_empty() {
                    println!(
                        "{}: skipped references to undefined schemas: {}",
                        api.name,
                        api.unresolved.join(", ")
                    );
                }
            }
            println!(
                "Wrote {} files to `{}`",
                report.files.len(),
                config.output.display()
            );
        }

        Command::Resolve(Resolve {
            shared,
            input,
            strict,
        }) => {
            let registry = Registry::from_yaml(&read(&shared)?)
                .into_diagnostic()
                .with_context(|| {
                    format!("Failed to load shared definitions from `{}`", shared.display())
                })?;
            let resolution = Resolver::new(&registry).resolve(&read(&input)?);
            let bundle = if strict {
                resolution.into_strict().into_diagnostic()?
            } else {
                for name in &resolution.unresolved {
                    tracing::warn!(schema = %name, "skipped reference to undefined schema");
                }
                resolution.bundle
            };
            print!("{}", serde_yaml::to_string(&bundle).into_diagnostic()?);
        }

        Command::Schema(Schema { input, id, output }) => {
            let doc: Value = parse::from_yaml(&read(&input)?)
                .into_diagnostic()
                .with_context(|| format!("Failed to parse `{}`", input.display()))?;
            let json = JsonSchemaDocument::from_document(id, &doc)
                .into_diagnostic()
                .with_context(|| format!("Failed to extract schemas from `{}`", input.display()))?
                .to_json_pretty()
                .into_diagnostic()?;
            match output {
                Some(path) => std::fs::write(&path, json + "\n")
                    .into_diagnostic()
                    .with_context(|| format!("Failed to write `{}`", path.display()))?,
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}

/// Installs a log subscriber that writes to standard error, so that
/// logs don't mix with documents printed to standard output.
fn init_logging(verbose: bool) {
    let default = if verbose { "refpack=debug" } else { "refpack=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .with_context(|| format!("Failed to read `{}`", path.display()))
}
