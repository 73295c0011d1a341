//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Static per-deployment parameters for the Primo search API.
///
/// Resolved once, before any search is made, and passed by reference into
/// request building and result normalization.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PrimoConfig {
    /// Base URL of the Primo API, e.g. `https://api-eu.hosted.exlibrisgroup.com/primo`.
    // Kept as a String, a parsed Url would add a trailing slash.
    pub api_url: String,
    /// Institution code (`inst`).
    pub institution: String,
    /// Discovery view id (`vid`).
    pub view_id: String,
    /// Search profile tab.
    pub tab: String,
    /// Search profile scope.
    pub scope: String,
    pub api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Root of the discovery UI that record deep links are built on,
    /// e.g. `https://example.primo.exlibrisgroup.com/discovery/`.
    pub catalog_url: String,
    /// Whether newspaper search is active when a request doesn't say.
    #[serde(default)]
    pub newspapers_search: bool,
    /// Deadline for the whole search request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Additional headers to include in requests.
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
}

impl PrimoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    pub(crate) fn test_config(api_url: &str) -> PrimoConfig {
        PrimoConfig {
            api_url: api_url.to_string(),
            institution: "44INST".to_string(),
            view_id: "44INST_VU1".to_string(),
            tab: "Everything".to_string(),
            scope: "MyInst_and_CI".to_string(),
            api_key: "l7xx-secret".to_string(),
            language: "en".to_string(),
            catalog_url: "https://example.primo.exlibrisgroup.com/discovery/".to_string(),
            newspapers_search: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let config: PrimoConfig = serde_json::from_value(json!({
            "api_url": "https://api.example.com/primo",
            "institution": "44INST",
            "view_id": "44INST_VU1",
            "tab": "Everything",
            "scope": "MyInst_and_CI",
            "api_key": "l7xx-secret",
            "catalog_url": "https://example.primo.exlibrisgroup.com/discovery/",
        }))
        .unwrap();

        assert_eq!(config.language, "en");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert!(!config.newspapers_search);
        assert!(config.extra_headers.is_empty());
    }
}
