mod search;
mod translate;

use std::str::FromStr;

use anyhow::{Result, anyhow};
use bpaf::Bpaf;
use indoc::indoc;
use primo_catalog::Filters;

use crate::config::Config;

static PRIMO_SEARCH_DESCRIPTION: &'_ str = indoc! {"
    Search a library catalog through the Ex Libris Primo search API.\n\n

    Filters are given as KEY=VALUE pairs and translated into Primo facets
    using the filter definitions of the configured deployment."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, version, descr(PRIMO_SEARCH_DESCRIPTION))]
pub struct PrimoSearchCli(#[bpaf(external(primo_search_args))] pub PrimoSearchArgs);

/// Main primo-search args parser
///
/// To parse the whole CLI, use [`PrimoSearchCli`] via [`primo_search_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct PrimoSearchArgs {
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl PrimoSearchArgs {
    pub fn handle(self, config: Config) -> Result<()> {
        match self.command {
            Commands::Search(args) => args.handle(config),
            Commands::Translate(args) => args.handle(config),
        }
    }
}

#[derive(Debug, Bpaf, Clone)]
enum Commands {
    /// Search the catalog
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Show the Primo facets a set of filters translates to
    #[bpaf(command)]
    Translate(#[bpaf(external(translate::translate))] translate::Translate),
}

/// A single `KEY=VALUE` filter argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    pub key: String,
    pub value: String,
}

impl FromStr for FilterArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("Filter '{s}' must have the form KEY=VALUE"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("Filter '{s}' is missing a key"));
        }

        Ok(FilterArg {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// Collect filter arguments into request filters.
///
/// A key given more than once keeps its last value.
fn collect_filters(args: impl IntoIterator<Item = FilterArg>) -> Filters {
    args.into_iter()
        .map(|FilterArg { key, value }| (key, value))
        .collect()
}
