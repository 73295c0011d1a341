//! Primo client, the HTTP side of a search call.

use std::fmt::Debug;
use std::str::FromStr;

use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{self, HeaderMap};
use tracing::{debug, instrument};
use url::Url;

use crate::config::PrimoConfig;
use crate::error::{PrimoClientError, SearchError, UpstreamError};
use crate::filters::{FilterCatalog, Filters};
use crate::normalize::normalize;
use crate::request::{SearchQuery, redact_api_key};
use crate::types::{RawSearchResponse, SearchResults};

/// The search interface shared by all catalog backends.
///
/// This trait enables alternate implementations:
/// - **Primo** (current): the Primo REST search API via [`PrimoClient`]
/// - **Mock** (orchestrator tests): canned results without HTTP
pub trait CatalogBackend {
    /// Search the catalog.
    ///
    /// `limit` and `offset` select a single page, the backend doesn't page
    /// further on its own.
    fn search(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
        filters: &Filters,
    ) -> Result<SearchResults, SearchError>;
}

/// A client for the Primo search API.
///
/// Holds the deployment configuration and filter catalog, both read-only.
/// Calls share nothing but the connection pool, so a client can be used from
/// several threads at once.
pub struct PrimoClient {
    http: HttpClient,
    config: PrimoConfig,
    filter_catalog: FilterCatalog,
}

impl Debug for PrimoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimoClient")
            .field("api_url", &self.config.api_url)
            .field("view_id", &self.config.view_id)
            .finish_non_exhaustive()
    }
}

impl PrimoClient {
    /// Create a new client from configuration.
    pub fn new(
        config: PrimoConfig,
        filter_catalog: FilterCatalog,
    ) -> Result<Self, PrimoClientError> {
        Url::parse(&config.api_url).map_err(|source| PrimoClientError::InvalidUrl {
            url: config.api_url.clone(),
            source,
        })?;

        let http = build_http_client(&config)?;

        Ok(Self {
            http,
            config,
            filter_catalog,
        })
    }

    pub fn config(&self) -> &PrimoConfig {
        &self.config
    }

    pub fn filter_catalog(&self) -> &FilterCatalog {
        &self.filter_catalog
    }

    /// Send a search request and decode the response.
    fn fetch(&self, url: &str) -> Result<RawSearchResponse, SearchError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%status, "catalog responded with an error");
            return Err(UpstreamError::Status(status).into());
        }

        let body = response.text().map_err(UpstreamError::Transport)?;
        RawSearchResponse::from_body(&body)
    }
}

impl CatalogBackend for PrimoClient {
    #[instrument(skip_all, fields(query = %query, limit = limit, offset = offset))]
    fn search(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
        filters: &Filters,
    ) -> Result<SearchResults, SearchError> {
        let query = SearchQuery::new(query, limit, offset, filters);
        let url = query.url(&self.config, &self.filter_catalog);
        debug!(
            url = %redact_api_key(&url, &self.config),
            n_filters = filters.len(),
            "sending search request"
        );

        let response = self.fetch(&url)?;
        let n_docs = response.docs.len();

        let results = response
            .docs
            .iter()
            .filter_map(|doc| normalize(doc, &self.config))
            .collect::<Vec<_>>();

        debug!(
            num_results = response.total,
            n_docs,
            n_records = results.len(),
            "received search results"
        );

        Ok(SearchResults {
            num_results: response.total,
            results,
        })
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build the blocking HTTP client, bounded by the configured deadline.
fn build_http_client(config: &PrimoConfig) -> Result<HttpClient, PrimoClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| PrimoClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| PrimoClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        api_url = %config.api_url,
        timeout = ?config.timeout(),
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout());

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| PrimoClientError::Other(e.to_string()))
}
