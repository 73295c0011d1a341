//! Translation of application filters into Primo `qInclude` fragments.
//!
//! The UI layer sends filters as flat `key=value` pairs. What a key means is
//! decided by the filter catalog: a key can name a whole filter group
//! (e.g. `item_type=books`) or a single option of a group
//! (e.g. `open_access=true`). Keys the catalog doesn't know are ignored, so an
//! unknown UI filter never breaks a search.

use std::collections::BTreeMap;

use derive_more::{Deref, From};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{DefaultOnNull, DisplayFromStr, PickFirst, serde_as};
use tracing::trace;

/// Filters of a single search request, keyed by application filter name.
pub type Filters = BTreeMap<String, String>;

/// Placeholder in an `api_parameter` template replaced by the filter value.
pub const VALUE_PLACEHOLDER: &str = "$VALUE";

pub const ITEM_TYPE_KEY: &str = "item_type";
pub const NEWSPAPERS_ITEM_TYPE: &str = "newspapers";
pub const PUBLISH_DATE_KEY: &str = "publish_date";
const PUBLISH_DATE_FACET: &str = "facet_searchcreationdate";

/// One application-level filter and the options it offers.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FilterDefinition {
    pub variable: String,
    #[serde(default)]
    pub entries: Vec<FilterEntry>,
}

impl FilterDefinition {
    /// The entry of this definition a value selects.
    ///
    /// Toggle entries are matched on their `variable`. A definition made only
    /// of range entries selects its first range for any value.
    fn matching_entry(&self, value: &str) -> Option<&FilterEntry> {
        let has_toggles = self
            .entries
            .iter()
            .any(|entry| matches!(entry, FilterEntry::Toggle { .. }));

        if has_toggles {
            self.entries.iter().find(
                |entry| matches!(entry, FilterEntry::Toggle { variable, .. } if variable == value),
            )
        } else {
            self.entries
                .iter()
                .find(|entry| matches!(entry, FilterEntry::Range { .. }))
        }
    }
}

/// An option of a [FilterDefinition].
///
/// Range entries are listed first so that deserialization doesn't take a
/// range for a toggle.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FilterEntry {
    Range {
        min_variable: String,
        max_variable: String,
        #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
        min_value: i64,
        #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
        max_value: i64,
        #[serde_as(as = "DefaultOnNull")]
        #[serde(default)]
        api_parameter: String,
    },
    Toggle {
        #[serde(deserialize_with = "scalar_string")]
        variable: String,
        #[serde_as(as = "DefaultOnNull")]
        #[serde(default)]
        api_parameter: String,
    },
}

/// Toggle names may be written as bare YAML scalars, e.g. `variable: true`.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        String(String),
        Bool(bool),
        Int(i64),
        Float(f64),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::String(s) => s,
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
    })
}

impl FilterEntry {
    pub fn api_parameter(&self) -> &str {
        match self {
            FilterEntry::Range { api_parameter, .. } => api_parameter,
            FilterEntry::Toggle { api_parameter, .. } => api_parameter,
        }
    }
}

/// How a filter key was found in the [FilterCatalog].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The key names a definition, the value selected one of its entries.
    TopLevel {
        definition: &'a FilterDefinition,
        entry: &'a FilterEntry,
    },
    /// The key names an entry of some definition.
    EntryLevel { entry: &'a FilterEntry },
    NotFound,
}

impl<'a> Resolution<'a> {
    pub fn entry(&self) -> Option<&'a FilterEntry> {
        match *self {
            Resolution::TopLevel { entry, .. } | Resolution::EntryLevel { entry } => Some(entry),
            Resolution::NotFound => None,
        }
    }

    /// The filter variable a toggle was resolved through.
    ///
    /// Range entries have none.
    pub fn resolved_variable(&self) -> Option<&'a str> {
        match *self {
            Resolution::TopLevel {
                definition,
                entry: FilterEntry::Toggle { .. },
            } => Some(definition.variable.as_str()),
            Resolution::EntryLevel {
                entry: FilterEntry::Toggle { variable, .. },
            } => Some(variable.as_str()),
            _ => None,
        }
    }
}

/// The ordered list of filter definitions of a deployment.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq, Deref, From)]
#[serde(transparent)]
pub struct FilterCatalog(Vec<FilterDefinition>);

impl FilterCatalog {
    pub fn new(definitions: Vec<FilterDefinition>) -> Self {
        Self(definitions)
    }

    /// Parse a catalog from YAML, which includes JSON documents.
    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Find the entry a `key=value` filter refers to.
    ///
    /// A definition named `key` takes precedence. Only if there is none, the
    /// first toggle entry named `key` with a non-empty `api_parameter` is used.
    pub fn resolve(&self, key: &str, value: &str) -> Resolution<'_> {
        if let Some(definition) = self.iter().find(|definition| definition.variable == key) {
            return match definition.matching_entry(value) {
                Some(entry) => Resolution::TopLevel { definition, entry },
                None => Resolution::NotFound,
            };
        }

        self.iter()
            .flat_map(|definition| definition.entries.iter())
            .find(|entry| {
                matches!(
                    entry,
                    FilterEntry::Toggle { variable, api_parameter }
                        if variable == key && !api_parameter.is_empty()
                )
            })
            .map_or(Resolution::NotFound, |entry| Resolution::EntryLevel {
                entry,
            })
    }

    /// Translate request filters into `qInclude` fragments, in key order.
    ///
    /// Filters that are unset, at their default or unknown produce nothing.
    pub fn translate(&self, filters: &Filters) -> Vec<String> {
        filters
            .iter()
            .filter_map(|(key, value)| {
                let resolution = self.resolve(key, value);
                let fragment = fragment(key, value, &resolution);
                trace!(key, value, ?fragment, "translated filter");
                fragment
            })
            .collect()
    }
}

fn fragment(key: &str, value: &str, resolution: &Resolution<'_>) -> Option<String> {
    let entry = resolution.entry()?;
    let api_parameter = entry.api_parameter();
    let resolved = resolution.resolved_variable() == Some(key);

    let fragment = if value == "true" && resolved {
        api_parameter.to_string()
    } else if key == ITEM_TYPE_KEY {
        // Newspapers have a dedicated fragment rather than a templated one.
        if value == NEWSPAPERS_ITEM_TYPE {
            api_parameter.to_string()
        } else {
            substitute(api_parameter, value)
        }
    } else if resolved && !value.is_empty() && value != "false" {
        substitute(api_parameter, value)
    } else if key == PUBLISH_DATE_KEY {
        publish_date_fragment(entry, value)?
    } else {
        return None;
    };

    (!fragment.is_empty()).then_some(fragment)
}

/// Fill the `$VALUE` slot of a template, encoded for the query string.
fn substitute(api_parameter: &str, value: &str) -> String {
    api_parameter.replace(VALUE_PLACEHOLDER, &url_escape::encode_component(value))
}

/// `value` is `"<min>,<max>"`. The configured default range means the filter
/// is unset.
fn publish_date_fragment(entry: &FilterEntry, value: &str) -> Option<String> {
    let FilterEntry::Range {
        min_value,
        max_value,
        ..
    } = entry
    else {
        return None;
    };

    let (min, max) = value.split_once(',')?;
    let min: i64 = min.trim().parse().ok()?;
    let max: i64 = max.trim().parse().ok()?;

    if (min, max) == (*min_value, *max_value) {
        return None;
    }

    let range = format!("[{min} TO {max}]");
    Some(format!(
        "{PUBLISH_DATE_FACET},include,{}",
        url_escape::encode_component(&range)
    ))
}
