/// `load_config` module: loads the optional static YAML config and merges it with CLI flags.
///
/// This module is the only place where user-supplied YAML is parsed into the
/// typed settings the CLI hands to `webotron-core`.
///
/// # Responsibilities
/// - Parse the YAML file into [`CliConfig`] (profile, region, website and sync sections)
/// - Fill unset sections with defaults so an empty or absent file is valid
/// - Produce clear diagnostics for unreadable or malformed files
///
/// # Precedence
/// Command-line flags override the file; anything left unset falls through to
/// the standard AWS environment (`AWS_PROFILE`, `AWS_REGION`, shared config).
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};
use webotron_core::config::{SyncOptions, WebsiteConfig};

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub website: WebsiteConfig,
    pub sync: SyncOptions,
}

impl CliConfig {
    /// Apply command-line overrides on top of the file settings.
    pub fn with_overrides(mut self, profile: Option<String>, region: Option<String>) -> Self {
        if profile.is_some() {
            self.profile = profile;
        }
        if region.is_some() {
            self.region = region;
        }
        self
    }
}

/// Loads the YAML config at `path`. An empty file yields all defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(CliConfig::default());
    }

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.website.trace_loaded();
    config.sync.trace_loaded();
    Ok(config)
}

/// Loads `path` when given, otherwise returns defaults.
pub fn load_optional_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(CliConfig::default()),
    }
}
