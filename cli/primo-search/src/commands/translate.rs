use anyhow::{Context, Result};
use bpaf::Bpaf;
use primo_catalog::request::SearchQuery;
use primo_catalog::{FilterCatalog, Filters, PrimoConfig};
use serde::Serialize;
use tracing::instrument;

use super::{FilterArg, collect_filters};
use crate::config::Config;
use crate::utils::message;

#[derive(Debug, Bpaf, Clone)]
pub struct Translate {
    /// Print the translation as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Filter to translate, may be given multiple times
    #[bpaf(short('f'), long("filter"), argument("KEY=VALUE"), many)]
    pub filters: Vec<FilterArg>,
}

/// What a set of filters contributes to a search request.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct Translation {
    fragments: Vec<String>,
    q_include: Option<String>,
    newspapers_search: bool,
}

impl Translation {
    fn new(filters: &Filters, catalog: &FilterCatalog, config: &PrimoConfig) -> Self {
        let query = SearchQuery::new("", 0, 0, filters);
        Translation {
            fragments: catalog.translate(filters),
            q_include: query.q_include(catalog),
            newspapers_search: query.newspapers_search(config),
        }
    }
}

impl Translate {
    #[instrument(name = "translate", fields(json = self.json), skip_all)]
    pub fn handle(self, config: Config) -> Result<()> {
        let catalog = config.filter_catalog()?;
        let filters = collect_filters(self.filters);
        let translation = Translation::new(&filters, &catalog, &config.catalog);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&translation)
                    .context("Could not serialize translation")?
            );
            return Ok(());
        }

        match &translation.q_include {
            Some(q_include) => {
                for fragment in &translation.fragments {
                    println!("{fragment}");
                }
                message::plain(format!("qInclude={q_include}"));
            },
            None => message::warning("None of the filters translate to a Primo facet"),
        }
        message::plain(format!(
            "newspapersSearch={}",
            translation.newspapers_search
        ));
        Ok(())
    }
}
