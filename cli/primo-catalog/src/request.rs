//! Construction of Primo search URLs.

use itertools::Itertools;

use crate::config::PrimoConfig;
use crate::filters::{FilterCatalog, Filters, ITEM_TYPE_KEY, NEWSPAPERS_ITEM_TYPE};

pub const SEARCH_PATH: &str = "/v1/search";
/// Separator between fragments of a multi-filter `qInclude`.
pub const MULTI_FILTER_DELIMITER: &str = "|,|";
pub const DEFAULT_SEARCH_FIELD: &str = "any";

/// Request key selecting the sort order.
pub const SORT_KEY: &str = "sort_by";
/// Request key selecting the field the query text is matched against.
pub const SEARCH_FIELD_KEY: &str = "search_field";

/// Everything a single search request varies in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery<'a> {
    pub text: &'a str,
    pub limit: u32,
    pub offset: u32,
    pub filters: &'a Filters,
    pub sort_by: Option<&'a str>,
}

impl<'a> SearchQuery<'a> {
    /// Build a query from the inbound search contract.
    ///
    /// Sort order is passed as the `sort_by` filter.
    pub fn new(text: &'a str, limit: u32, offset: u32, filters: &'a Filters) -> Self {
        Self {
            text,
            limit,
            offset,
            filters,
            sort_by: filters.get(SORT_KEY).map(String::as_str),
        }
    }

    fn search_field(&self) -> &'a str {
        self.filters
            .get(SEARCH_FIELD_KEY)
            .map(String::as_str)
            .filter(|field| !field.is_empty())
            .unwrap_or(DEFAULT_SEARCH_FIELD)
    }

    /// Whether this request searches newspapers.
    ///
    /// An `item_type` filter decides, the configured default only applies
    /// without one.
    pub fn newspapers_search(&self, config: &PrimoConfig) -> bool {
        match self.filters.get(ITEM_TYPE_KEY) {
            Some(item_type) => item_type == NEWSPAPERS_ITEM_TYPE,
            None => config.newspapers_search,
        }
    }

    /// The `qInclude` value for this request's filters.
    pub fn q_include(&self, catalog: &FilterCatalog) -> Option<String> {
        let fragments = catalog.translate(self.filters);
        (!fragments.is_empty()).then(|| fragments.join(MULTI_FILTER_DELIMITER))
    }

    /// The full search URL.
    ///
    /// Filter fragments are passed verbatim, they are already in the
    /// vendor's encoding.
    pub fn url(&self, config: &PrimoConfig, catalog: &FilterCatalog) -> String {
        let text = url_escape::encode_component(self.text.trim());
        let newspapers = self.newspapers_search(config).to_string();

        let mut params = vec![
            ("inst", encode(&config.institution)),
            ("vid", encode(&config.view_id)),
            ("tab", encode(&config.tab)),
            ("scope", encode(&config.scope)),
            ("q", format!("{},contains,{text}", encode(self.search_field()))),
            ("apikey", encode(&config.api_key)),
            ("lang", encode(&config.language)),
            ("pcAvailability", "false".to_string()),
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
        ];

        if let Some(q_include) = self.q_include(catalog) {
            params.push(("qInclude", q_include));
        }

        if let Some(sort_by) = self.sort_by.filter(|sort_by| !sort_by.is_empty()) {
            params.push(("sort", encode(sort_by)));
        }

        params.extend([
            ("newspapersActive", newspapers.clone()),
            ("newspapersSearch", newspapers),
            ("blendFacetsSeparately", "true".to_string()),
        ]);

        format!(
            "{}{SEARCH_PATH}?{}",
            config.api_url.trim_end_matches('/'),
            params
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .join("&")
        )
    }
}

fn encode(value: &str) -> String {
    url_escape::encode_component(value).into_owned()
}

/// Hide the API key of a search URL, for logging.
pub fn redact_api_key(url: &str, config: &PrimoConfig) -> String {
    if config.api_key.is_empty() {
        return url.to_string();
    }
    url.replace(
        &format!("apikey={}", encode(&config.api_key)),
        "apikey=<redacted>",
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::tests::test_config;
    use crate::filters::tests::test_catalog;

    const API_URL: &str = "https://api.example.com/primo";

    fn filters(pairs: &[(&str, &str)]) -> Filters {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn url_without_filters() {
        let filters = Filters::new();
        let url = SearchQuery::new("Proust", 10, 20, &filters)
            .url(&test_config(API_URL), &test_catalog());

        assert_eq!(
            url,
            "https://api.example.com/primo/v1/search?inst=44INST&vid=44INST_VU1&tab=Everything&scope=MyInst_and_CI&q=any,contains,Proust&apikey=l7xx-secret&lang=en&pcAvailability=false&offset=20&limit=10&newspapersActive=false&newspapersSearch=false&blendFacetsSeparately=true"
        );
    }

    #[test]
    fn url_with_filters_sort_and_field() {
        let filters = filters(&[
            ("peer_reviewed", "true"),
            ("publish_date", "1990,2000"),
            ("sort_by", "date"),
            ("search_field", "title"),
        ]);
        let url = SearchQuery::new("  À la recherche ", 5, 0, &filters)
            .url(&test_config(&format!("{API_URL}/")), &test_catalog());

        assert_eq!(
            url,
            "https://api.example.com/primo/v1/search?inst=44INST&vid=44INST_VU1&tab=Everything&scope=MyInst_and_CI&q=title,contains,%C3%80%20la%20recherche&apikey=l7xx-secret&lang=en&pcAvailability=false&offset=0&limit=5&qInclude=facet_tlevel,include,peer_reviewed|,|facet_searchcreationdate,include,%5B1990%20TO%202000%5D&sort=date&newspapersActive=false&newspapersSearch=false&blendFacetsSeparately=true"
        );
    }

    #[test]
    fn empty_sort_is_omitted() {
        let filters = filters(&[("sort_by", "")]);
        let url = SearchQuery::new("Proust", 10, 0, &filters)
            .url(&test_config(API_URL), &test_catalog());

        assert!(!url.contains("sort="), "{url}");
    }

    #[test]
    fn item_type_takes_precedence_over_configured_newspapers_default() {
        let mut config = test_config(API_URL);
        config.newspapers_search = true;

        let no_filters = Filters::new();
        assert!(SearchQuery::new("Proust", 10, 0, &no_filters).newspapers_search(&config));

        let books = filters(&[("item_type", "books")]);
        assert!(!SearchQuery::new("Proust", 10, 0, &books).newspapers_search(&config));

        config.newspapers_search = false;
        let newspapers = filters(&[("item_type", "newspapers")]);
        assert!(SearchQuery::new("Proust", 10, 0, &newspapers).newspapers_search(&config));
    }

    #[test]
    fn api_key_is_redacted() {
        let config = test_config(API_URL);
        let filters = Filters::new();
        let url = SearchQuery::new("Proust", 10, 0, &filters).url(&config, &test_catalog());
        let redacted = redact_api_key(&url, &config);

        assert!(!redacted.contains("l7xx-secret"));
        assert!(redacted.contains("apikey=<redacted>&lang=en"));
    }
}
