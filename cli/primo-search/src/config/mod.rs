use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment, File, FileFormat};
use primo_catalog::{FilterCatalog, PrimoConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of primo-search managed directories
pub const PRIMO_SEARCH_DIR_NAME: &str = "primo-search";
pub const PRIMO_SEARCH_CONFIG_FILE: &str = "primo-search.toml";
const PRIMO_SEARCH_CONFIG_DIR_VAR: &str = "PRIMO_SEARCH_CONFIG_DIR";
/// Prefix of environment variables overriding config values,
/// e.g. `PRIMO_CATALOG__API_KEY`.
const ENV_PREFIX: &str = "PRIMO_";

pub const DEFAULT_API_URL: &str = "https://api-na.hosted.exlibrisgroup.com/primo";
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Primo deployment parameters
    pub catalog: PrimoConfig,

    /// YAML or JSON file with the filter definitions of the deployment
    #[serde(default)]
    pub filters_file: Option<PathBuf>,

    /// How many results `primo-search search` shows by default
    #[serde(default)]
    pub search_limit: Option<u32>,
}

impl Config {
    /// Creates a [Config] from the config files and the environment
    pub fn parse() -> Result<Config> {
        let files = config_files(env::var_os(PRIMO_SEARCH_CONFIG_DIR_VAR).map(PathBuf::from));
        let env_vars = env::vars()
            .filter_map(|(k, v)| k.strip_prefix(ENV_PREFIX).map(|k| (k.to_owned(), v)))
            .collect();

        read_raw_config(&files, env_vars)?
            .try_deserialize()
            .context("Could not parse config")
    }

    /// Load the filter catalog named by `filters_file`.
    ///
    /// Without a file every filter is unknown, which makes all of them no-ops.
    pub fn filter_catalog(&self) -> Result<FilterCatalog> {
        let Some(path) = &self.filters_file else {
            debug!("no filters file configured");
            return Ok(FilterCatalog::default());
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read filters file '{}'", path.display()))?;
        FilterCatalog::from_yaml_str(&contents)
            .with_context(|| format!("Could not parse filters file '{}'", path.display()))
    }

    pub fn search_limit(&self) -> u32 {
        self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }
}

/// Config files in increasing precedence.
///
/// Missing files are skipped when reading.
fn config_files(config_dir: Option<PathBuf>) -> Vec<PathBuf> {
    let mut files = vec![
        Path::new("/etc")
            .join(PRIMO_SEARCH_DIR_NAME)
            .join(PRIMO_SEARCH_CONFIG_FILE),
    ];

    let dirs = BaseDirectories::with_prefix(PRIMO_SEARCH_DIR_NAME);
    files.extend(dirs.find_config_files(PRIMO_SEARCH_CONFIG_FILE));

    if let Some(config_dir) = config_dir {
        debug!("`${PRIMO_SEARCH_CONFIG_DIR_VAR}` set: {}", config_dir.display());
        files.push(config_dir.join(PRIMO_SEARCH_CONFIG_FILE));
    }

    files
}

/// Layer defaults, `files` and `env_vars` (stripped of [ENV_PREFIX]).
fn read_raw_config(
    files: &[PathBuf],
    env_vars: HashMap<String, String>,
) -> Result<HierarchicalConfig> {
    let mut builder =
        HierarchicalConfig::builder().set_default("catalog.api_url", DEFAULT_API_URL)?;

    for file in files {
        debug!(file = %file.display(), "adding config source");
        builder = builder.add_source(
            File::from(file.as_path())
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    let builder = builder.add_source(
        Environment::default()
            .separator("__")
            .source(Some(env_vars)),
    );

    Ok(builder.build()?)
}
