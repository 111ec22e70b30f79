//! Static documentation site staging.

use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::codegen::write_to_disk;

/// The `[site]` table of a build configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SiteConfig {
    /// The site output directory.
    pub output: PathBuf,

    /// Files copied as-is into the site root.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// A Tera template for the site's `index.html`.
    pub template: PathBuf,

    /// Files copied into every API's directory.
    #[serde(default)]
    pub project_static_dir: Option<PathBuf>,
}

impl SiteConfig {
    pub fn resolve_paths(&mut self, base: &Path) {
        self.output = base.join(&self.output);
        self.template = base.join(&self.template);
        if let Some(dir) = &mut self.static_dir {
            *dir = base.join(&*dir);
        }
        if let Some(dir) = &mut self.project_static_dir {
            *dir = base.join(&*dir);
        }
    }
}

/// A bundled API to publish on the site.
#[derive(Clone, Copy, Debug)]
pub struct SiteApi<'a> {
    /// The normalized API name.
    pub name: &'a str,
    /// The bundled OpenAPI document, as YAML.
    pub yaml: &'a str,
}

/// Stages the site for `apis`, and returns the paths of the written files.
pub fn stage(config: &SiteConfig, apis: &[SiteApi<'_>]) -> miette::Result<Vec<PathBuf>> {
    let mut written = vec![];

    if let Some(dir) = &config.static_dir {
        written.extend(copy_tree(dir, &config.output)?);
    }

    let template = std::fs::read_to_string(&config.template)
        .into_diagnostic()
        .with_context(|| format!("Failed to read `{}`", config.template.display()))?;
    let names: Vec<&str> = apis.iter().map(|api| api.name).collect();
    let html = render_index(&template, &names)
        .with_context(|| format!("Failed to render `{}`", config.template.display()))?;
    written.push(write_to_disk(&config.output, ("index.html", html))?);

    for api in apis {
        let dir = config.output.join(api.name);
        if let Some(project) = &config.project_static_dir {
            written.extend(copy_tree(project, &dir)?);
        }
        written.push(write_to_disk(
            &dir,
            (format!("{}.yaml", api.name), api.yaml.to_owned()),
        )?);
    }

    tracing::info!(
        output = %config.output.display(),
        "Staged site for {} APIs",
        apis.len()
    );
    Ok(written)
}

/// Renders the site index template. The template sees the normalized
/// API names as `apis`.
pub fn render_index(template: &str, apis: &[&str]) -> miette::Result<String> {
    let mut context = tera::Context::new();
    context.insert("apis", apis);
    tera::Tera::one_off(template, &context, true).into_diagnostic()
}

/// Copies every file under `from` to the same relative path under `to`.
fn copy_tree(from: &Path, to: &Path) -> miette::Result<Vec<PathBuf>> {
    let mut copied = vec![];
    for entry in WalkDir::new(from).follow_links(true).sort_by_file_name() {
        let entry = entry
            .into_diagnostic()
            .with_context(|| format!("Failed to walk `{}`", from.display()))?;
        let relative = entry.path().strip_prefix(from).into_diagnostic()?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .into_diagnostic()
                .with_context(|| format!("Failed to create directory `{}`", target.display()))?;
        } else {
            std::fs::copy(entry.path(), &target)
                .into_diagnostic()
                .with_context(|| {
                    format!(
                        "Failed to copy `{}` to `{}`",
                        entry.path().display(),
                        target.display()
                    )
                })?;
            tracing::debug!(file = %target.display(), "copied static file");
            copied.push(target);
        }
    }
    Ok(copied)
}
