use anyhow::{Context, Result};
use primo_catalog::PrimoClient;
use tracing::debug;

use crate::config::Config;

/// Initialize the Primo client from the resolved configuration.
pub fn init_catalog_client(config: &Config) -> Result<PrimoClient> {
    let filter_catalog = config.filter_catalog()?;

    debug!(
        api_url = %config.catalog.api_url,
        n_filters = filter_catalog.len(),
        "using primo client"
    );

    PrimoClient::new(config.catalog.clone(), filter_catalog)
        .context("Could not create catalog client")
}
