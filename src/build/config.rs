use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{error::SerdeError, site::SiteConfig};

/// The default configuration file name.
pub const CONFIG_FILE: &str = "refpack.toml";

/// Configuration for one build, usually read from `refpack.toml`.
///
/// ```toml
/// shared-definitions = "src/shared-definitions.yaml"
/// output = "dist"
///
/// [[api]]
/// name = "derbysoft-proxy"
/// path = "src/derbysoft-proxy.yaml"
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildConfig {
    /// The shared definitions document, with a `components.schemas` mapping.
    pub shared_definitions: PathBuf,

    /// The directory for generated artifacts.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Fail the build on references to undefined schemas,
    /// instead of skipping them.
    #[serde(default)]
    pub strict: bool,

    #[serde(default, rename = "api")]
    pub apis: Vec<ApiConfig>,

    #[serde(default)]
    pub site: Option<SiteConfig>,
}

impl BuildConfig {
    /// Parses a configuration file. Paths are left as written.
    pub fn from_toml(toml: &str) -> Result<Self, SerdeError> {
        Ok(toml::from_str(toml)?)
    }

    /// Resolves all relative paths in this configuration against `base`,
    /// usually the directory that contains the configuration file.
    pub fn resolve_paths(&mut self, base: &Path) {
        self.shared_definitions = base.join(&self.shared_definitions);
        self.output = base.join(&self.output);
        for api in &mut self.apis {
            api.path = base.join(&api.path);
        }
        if let Some(site) = &mut self.site {
            site.resolve_paths(base);
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

/// An API document to bundle.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ApiConfig {
    /// The API name. Generated files use the normalized form
    /// of this name.
    pub name: String,

    /// The API document.
    pub path: PathBuf,

    /// Copy the shared `components.securitySchemes` into the bundled document.
    #[serde(default = "default_security_schemes")]
    pub security_schemes: bool,
}

fn default_security_schemes() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::tests::assert_matches;

    #[test]
    fn test_config_defaults() {
        let config = BuildConfig::from_toml(indoc::indoc! {r#"
            shared-definitions = "src/shared-definitions.yaml"

            [[api]]
            name = "derbysoft-proxy"
            path = "src/derbysoft-proxy.yaml"
        "#})
        .unwrap();

        assert_eq!(config.output, Path::new("dist"));
        assert!(!config.strict);
        assert!(config.site.is_none());
        assert_matches!(
            &*config.apis,
            [ApiConfig { name, security_schemes: true, .. }] if name == "derbysoft-proxy"
        );
    }

    #[test]
    fn test_config_resolve_paths() {
        let mut config = BuildConfig::from_toml(indoc::indoc! {r#"
            shared-definitions = "shared.yaml"
            output = "/tmp/out"
            strict = true

            [[api]]
            name = "simard"
            path = "apis/simard.yaml"
            security-schemes = false

            [site]
            output = "docs"
            template = "site/index.html"
        "#})
        .unwrap();
        config.resolve_paths(Path::new("/work"));

        assert_eq!(config.shared_definitions, Path::new("/work/shared.yaml"));
        assert_eq!(config.output, Path::new("/tmp/out"));
        assert_eq!(config.apis[0].path, Path::new("/work/apis/simard.yaml"));
        assert!(!config.apis[0].security_schemes);
        let site = config.site.unwrap();
        assert_eq!(site.output, Path::new("/work/docs"));
        assert_eq!(site.template, Path::new("/work/site/index.html"));
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let result = BuildConfig::from_toml(indoc::indoc! {r#"
            shared-definitions = "shared.yaml"
            outptu = "dist"
        "#});
        assert_matches!(result, Err(SerdeError::Toml(_)));
    }

    #[test]
    fn test_config_requires_shared_definitions() {
        let result = BuildConfig::from_toml("output = \"dist\"\n");
        assert_matches!(result, Err(SerdeError::Toml(_)));
    }
}
