/// `load_config` module: loads the YAML run configuration and layers environment
/// overrides on top of it.
///
/// This is the only place where user-supplied YAML is parsed. Everything it
/// produces is a typed `docdeco-core` config.
///
/// # Responsibilities
/// - Parse the optional `site`, `console` and `termy` sections; anything
///   missing takes its default
/// - Apply `DOCDECO_SITE_DIR` and `DOCDECO_OUTPUT_DIR` from the environment
/// - Resolve the final [`SiteConfig`] once CLI flags are known
///   (flag > environment > file)
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{anyhow, Result};
use docdeco_core::config::DecorateConfig;
use docdeco_core::site::SiteConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const SITE_DIR_ENV: &str = "DOCDECO_SITE_DIR";
pub const OUTPUT_DIR_ENV: &str = "DOCDECO_OUTPUT_DIR";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliConfig {
    pub site: SiteSection,
    pub decorate: DecorateConfig,
}

/// The `site` section. Every key is optional here because the site directory
/// may come from the environment or a flag instead.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    #[serde(default)]
    pub site_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Directory overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct SiteOverrides {
    pub site_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Merge flags into the loaded config and produce the site the run works on.
    pub fn site_config(&self, overrides: &SiteOverrides) -> Result<SiteConfig> {
        let Some(site_dir) = overrides
            .site_dir
            .clone()
            .or_else(|| self.site.site_dir.clone())
        else {
            error!("No site directory configured");
            return Err(anyhow!(
                "No site directory given: pass --site-dir, set {SITE_DIR_ENV}, or set site.site_dir in the config file"
            ));
        };

        let mut site = SiteConfig::new(site_dir);
        site.output_dir = overrides
            .output_dir
            .clone()
            .or_else(|| self.site.output_dir.clone());
        if let Some(extensions) = &self.site.extensions {
            site.extensions = extensions.clone();
        }
        site.exclude = self.site.exclude.clone();
        site.trace_loaded();
        Ok(site)
    }

    /// Environment values win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Some(site_dir) = env_path(SITE_DIR_ENV) {
            info!(site_dir = %site_dir.display(), "Site directory taken from environment");
            self.site.site_dir = Some(site_dir);
        }
        if let Some(output_dir) = env_path(OUTPUT_DIR_ENV) {
            info!(output_dir = %output_dir.display(), "Output directory taken from environment");
            self.site.output_dir = Some(output_dir);
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Loads the YAML config at `path`, or the defaults when no path is given,
/// then applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<CliConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path.as_ref())?,
        None => {
            info!("No config file given, using defaults");
            CliConfig::default()
        }
    };
    config.apply_env_overrides();
    config.decorate.trace_loaded();
    Ok(config)
}

fn read_config_file(path_ref: &Path) -> Result<CliConfig> {
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    #[derive(Debug, Default, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct RawConfig {
        site: SiteSection,
        console: docdeco_core::config::ConsoleConfig,
        termy: docdeco_core::config::TermyConfig,
    }

    // An empty file parses as YAML null.
    let raw: RawConfig = match serde_yaml::from_str::<Option<RawConfig>>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf.unwrap_or_default()
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow!("Failed to parse config YAML: {e}"));
        }
    };
    debug!(?raw, "Raw config");

    Ok(CliConfig {
        site: raw.site,
        decorate: DecorateConfig {
            console: raw.console,
            termy: raw.termy,
        },
    })
}
