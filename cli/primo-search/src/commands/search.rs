use anyhow::{Context, Result};
use bpaf::Bpaf;
use primo_catalog::request::SORT_KEY;
use primo_catalog::{CatalogBackend, NormalizedRecord, SearchResults};
use tracing::{debug, instrument};

use super::{FilterArg, collect_filters};
use crate::config::Config;
use crate::utils::init::init_catalog_client;
use crate::utils::message;

#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Display search results as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Number of results to fetch
    #[bpaf(short, long, argument("N"))]
    pub limit: Option<u32>,

    /// Number of results to skip
    #[bpaf(long, argument("N"), fallback(0))]
    pub offset: u32,

    /// Sort order, e.g. 'rank' or 'date'
    #[bpaf(long, argument("ORDER"))]
    pub sort: Option<String>,

    /// Filter to apply, may be given multiple times
    #[bpaf(short('f'), long("filter"), argument("KEY=VALUE"), many)]
    pub filters: Vec<FilterArg>,

    /// The text to search for
    #[bpaf(positional("query"))]
    pub query: String,
}

impl Search {
    #[instrument(name = "search", fields(json = self.json, query = %self.query), skip_all)]
    pub fn handle(self, config: Config) -> Result<()> {
        let client = init_catalog_client(&config)?;
        let json = self.json;
        let results = self.run(&client, config.search_limit())?;

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&results).context("Could not serialize results")?
            );
            return Ok(());
        }

        if results.results.is_empty() {
            message::warning("No matching records found");
            return Ok(());
        }

        print!("{}", render_results(&results.results));
        message::plain(format!(
            "Showing {} of {} results",
            results.results.len(),
            results.num_results
        ));
        Ok(())
    }

    /// Send the search to `backend`.
    fn run(self, backend: &impl CatalogBackend, default_limit: u32) -> Result<SearchResults> {
        let limit = self.limit.unwrap_or(default_limit);
        let mut filters = collect_filters(self.filters);
        if let Some(sort) = self.sort {
            filters.insert(SORT_KEY.to_string(), sort);
        }

        debug!(limit, offset = self.offset, ?filters, "performing search");

        backend
            .search(&self.query, limit, self.offset, &filters)
            .context("Search failed")
    }
}

/// One block per record, with the fields a reader scans for.
fn render_results(records: &[NormalizedRecord]) -> String {
    records
        .iter()
        .enumerate()
        .flat_map(|(n, record)| record_lines(n + 1, record))
        .map(|line| line + "\n")
        .collect()
}

fn record_lines(n: usize, record: &NormalizedRecord) -> Vec<String> {
    let title = record.title.as_deref().unwrap_or("[untitled]");
    let mut lines = vec![format!("{n}. {title}")];

    if let Some(creator) = &record.creator {
        lines.push(format!("   by {}", creator.join("; ")));
    }

    let details = [
        record.resource_type.as_deref(),
        record.date.as_deref(),
        record.publisher.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();
    if !details.is_empty() {
        lines.push(format!("   {}", details.join(", ")));
    }

    if let Some(availability) = &record.availability_status {
        lines.push(match &record.call_number {
            Some(call_number) => format!("   {availability}: {call_number}"),
            None => format!("   {availability}"),
        });
    }

    if let Some(url) = &record.catalog_url {
        lines.push(format!("   {url}"));
    }

    lines
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use httpmock::prelude::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use primo_catalog::{Filters, PrimoConfig, SearchError};
    use serde_json::json;

    use super::*;

    /// Records the arguments of the last search.
    #[derive(Default)]
    struct RecordingBackend {
        calls: RefCell<Vec<(String, u32, u32, Filters)>>,
    }

    impl CatalogBackend for RecordingBackend {
        fn search(
            &self,
            query: &str,
            limit: u32,
            offset: u32,
            filters: &Filters,
        ) -> Result<SearchResults, SearchError> {
            self.calls
                .borrow_mut()
                .push((query.to_string(), limit, offset, filters.clone()));
            Ok(SearchResults::default())
        }
    }

    fn search_args(query: &str) -> Search {
        Search {
            json: false,
            limit: None,
            offset: 0,
            sort: None,
            filters: vec![],
            query: query.to_string(),
        }
    }

    #[test]
    fn default_limit_and_sort_filter() {
        let backend = RecordingBackend::default();
        let mut args = search_args("Proust");
        args.offset = 20;
        args.sort = Some("date".to_string());
        args.filters = vec!["peer_reviewed=true".parse().unwrap()];

        args.run(&backend, 10).unwrap();

        assert_eq!(backend.calls.borrow()[0], (
            "Proust".to_string(),
            10,
            20,
            Filters::from([
                ("peer_reviewed".to_string(), "true".to_string()),
                ("sort_by".to_string(), "date".to_string()),
            ])
        ));
    }

    #[test]
    fn explicit_limit_overrides_default() {
        let backend = RecordingBackend::default();
        let mut args = search_args("Proust");
        args.limit = Some(3);

        args.run(&backend, 10).unwrap();

        assert_eq!(backend.calls.borrow()[0].1, 3);
    }

    #[test]
    fn runs_against_primo_client() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/search")
                .query_param("q", "any,contains,Proust")
                .query_param("limit", "10");
            then.status(200).json_body(json!({
                "info": { "total": 1 },
                "docs": [{
                    "pnx": {
                        "control": { "recordid": ["alma991"] },
                        "display": { "title": ["Du côté de chez Swann"], "type": ["book"] },
                    },
                    "context": "L",
                }],
            }));
        });

        let config = Config {
            catalog: PrimoConfig {
                api_url: server.base_url(),
                institution: "44INST".to_string(),
                view_id: "44INST_VU1".to_string(),
                tab: "Everything".to_string(),
                scope: "MyInst_and_CI".to_string(),
                api_key: "secret".to_string(),
                language: "en".to_string(),
                catalog_url: "https://example.primo.exlibrisgroup.com/discovery/".to_string(),
                newspapers_search: false,
                timeout_secs: 5,
                user_agent: None,
                extra_headers: Default::default(),
            },
            filters_file: None,
            search_limit: None,
        };
        let client = init_catalog_client(&config).unwrap();

        let results = search_args("Proust")
            .run(&client, config.search_limit())
            .unwrap();
        mock.assert();

        assert_eq!(results.num_results, 1);
        assert_eq!(
            results.results[0].title.as_deref(),
            Some("Du côté de chez Swann")
        );
    }

    #[test]
    fn upstream_failure_has_context() {
        let server = MockServer::start();
        server.mock(|_, then| {
            then.status(500);
        });

        let mut config: Config = serde_json::from_value(json!({
            "catalog": {
                "api_url": "",
                "institution": "44INST",
                "view_id": "44INST_VU1",
                "tab": "Everything",
                "scope": "MyInst_and_CI",
                "api_key": "secret",
                "catalog_url": "https://example.primo.exlibrisgroup.com/discovery/",
            },
        }))
        .unwrap();
        config.catalog.api_url = server.base_url();
        let client = init_catalog_client(&config).unwrap();

        let err = search_args("Proust").run(&client, 10).unwrap_err();
        assert_eq!(err.to_string(), "Search failed");
        assert!(err.downcast_ref::<SearchError>().is_some());
    }

    #[test]
    fn renders_records() {
        let records = vec![
            NormalizedRecord {
                title: Some("Du côté de chez Swann".to_string()),
                creator: Some(vec!["Proust, Marcel".to_string()]),
                resource_type: Some("book".to_string()),
                date: Some("1913".to_string()),
                availability_status: Some("available".to_string()),
                call_number: Some("PQ2631 .R63".to_string()),
                catalog_url: Some("https://example.org/record".to_string()),
                ..Default::default()
            },
            NormalizedRecord::default(),
        ];

        assert_eq!(render_results(&records), indoc! {"
            1. Du côté de chez Swann
               by Proust, Marcel
               book, 1913
               available: PQ2631 .R63
               https://example.org/record
            2. [untitled]
        "});
    }
}
