//! Search response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SearchError;
use crate::normalize::{NormalizedRecord, RawDocument};

/// The result of a single search call.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SearchResults {
    /// Total number of hits reported by the vendor, not the page size.
    pub num_results: u64,
    pub results: Vec<NormalizedRecord>,
}

/// The parts of a Primo search response we consume.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSearchResponse {
    pub total: u64,
    pub docs: Vec<RawDocument>,
}

impl RawSearchResponse {
    /// Decode a response body.
    ///
    /// `info.total` and `docs` must both be present, everything below `docs`
    /// is left to normalization.
    pub fn from_body(body: &str) -> Result<Self, SearchError> {
        let mut value: Value = serde_json::from_str(body).map_err(SearchError::InvalidResponse)?;

        let total = value
            .pointer("/info/total")
            .and_then(Value::as_u64)
            .ok_or(SearchError::MalformedResponse("info.total"))?;

        let docs = match value.get_mut("docs").map(Value::take) {
            Some(Value::Array(docs)) => docs.into_iter().map(RawDocument::from).collect(),
            _ => return Err(SearchError::MalformedResponse("docs")),
        };

        Ok(Self { total, docs })
    }
}
