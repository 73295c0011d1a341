//! Error handling for catalog API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors constructing a [crate::PrimoClient].
#[derive(Debug, Error)]
pub enum PrimoClientError {
    #[error("invalid catalog API url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{}", .0)]
    Other(String),
}

/// Why the request to the vendor didn't produce a response we can read.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request could not be completed")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected response status {0}")]
    Status(StatusCode),
}

/// Errors from a single search call.
///
/// Any of these fails the whole call, there are no partial results.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("catalog search request failed")]
    UpstreamRequest(#[from] UpstreamError),
    #[error("catalog response is not valid JSON")]
    InvalidResponse(#[source] serde_json::Error),
    #[error("catalog response is missing '{0}'")]
    MalformedResponse(&'static str),
}

impl SearchError {
    /// The status returned by the vendor, if the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SearchError::UpstreamRequest(UpstreamError::Status(status)) => Some(*status),
            SearchError::UpstreamRequest(UpstreamError::Transport(err)) => err.status(),
            _ => None,
        }
    }
}
