//! Mapping of Primo PNX documents into [NormalizedRecord]s.

use derive_more::From;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::config::PrimoConfig;

/// Display type of newspaper articles, which link to the newspaper view.
pub const NEWSPAPER_DISPLAY_TYPE: &str = "newspaper_article";
/// Prefix that turns a source record id into a newspaper view docid.
pub const NEWSPAPER_DOCID_PREFIX: &str = "cdi_";

const FULL_DISPLAY_PATH: &str = "fulldisplay";
const NEWSPAPER_FULL_DISPLAY_PATH: &str = "npfulldisplay";

/// The record shape shared by all catalog backends.
///
/// Every field is always serialized, data the vendor doesn't have is `null`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub creator: Option<Vec<String>>,
    pub contributor: Option<Vec<String>>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub doi: Option<String>,
    pub format: Option<String>,
    pub is_part_of: Option<String>,
    pub issue: Option<String>,
    pub journal: Option<String>,
    pub language: Option<String>,
    pub page_start: Option<String>,
    pub page_end: Option<String>,
    pub pages: Option<String>,
    pub publisher: Option<String>,
    pub series: Option<String>,
    pub source: Option<String>,
    pub subject: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub volume: Option<String>,
    pub catalog_url: Option<String>,
    pub availability_status: Option<String>,
    pub call_number: Option<String>,
    pub sublocation: Option<String>,
    pub ext_collection: Option<String>,

    // Not provided by Primo
    pub coverage: Option<String>,
    pub relation: Option<String>,
    pub direct_url: Option<String>,
    pub rights: Option<String>,
}

/// A single entry of the `docs` array of a search response.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, From)]
#[serde(transparent)]
pub struct RawDocument(Value);

impl RawDocument {
    /// The last element of the array at `pointer`.
    ///
    /// Primo puts the authoritative value last. A scalar at `pointer` is
    /// taken as is.
    pub fn extract_last(&self, pointer: &str) -> Option<String> {
        match self.0.pointer(pointer)? {
            Value::Array(values) => values.last().and_then(scalar_to_string),
            other => scalar_to_string(other),
        }
    }

    /// The first element of the array at `pointer`, split into its
    /// `;`-separated parts.
    pub fn extract_first_split(&self, pointer: &str) -> Option<Vec<String>> {
        let first = match self.0.pointer(pointer)? {
            Value::Array(values) => values.first().and_then(scalar_to_string)?,
            other => scalar_to_string(other)?,
        };

        let parts = first
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        (!parts.is_empty()).then_some(parts)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalize a raw document.
///
/// Returns [None] for newspaper articles without the source record id their
/// deep link needs.
pub fn normalize(doc: &RawDocument, config: &PrimoConfig) -> Option<NormalizedRecord> {
    let resource_type = doc.extract_last("/pnx/display/type");

    let (identifier, display_path) = if resource_type.as_deref() == Some(NEWSPAPER_DISPLAY_TYPE) {
        let Some(source_record_id) = doc.extract_last("/pnx/control/addsrcrecordid") else {
            debug!(
                record_id = ?doc.extract_last("/pnx/control/recordid"),
                "skipping newspaper article without source record id"
            );
            return None;
        };
        (
            Some(format!("{NEWSPAPER_DOCID_PREFIX}{source_record_id}")),
            NEWSPAPER_FULL_DISPLAY_PATH,
        )
    } else {
        (doc.extract_last("/pnx/control/recordid"), FULL_DISPLAY_PATH)
    };

    let catalog_url = identifier.as_deref().map(|docid| {
        deep_link(
            config,
            display_path,
            docid,
            doc.extract_last("/context").as_deref(),
        )
    });

    Some(NormalizedRecord {
        identifier,
        title: doc.extract_last("/pnx/display/title"),
        creator: doc.extract_first_split("/pnx/display/creator"),
        contributor: doc.extract_first_split("/pnx/display/contributor"),
        date: doc.extract_last("/pnx/addata/date"),
        description: doc.extract_last("/pnx/display/description"),
        doi: doc.extract_last("/pnx/addata/doi"),
        format: doc.extract_last("/pnx/display/format"),
        is_part_of: doc.extract_last("/pnx/display/ispartof"),
        issue: doc.extract_last("/pnx/addata/issue"),
        journal: doc.extract_last("/pnx/addata/jtitle"),
        language: doc.extract_last("/pnx/display/language"),
        page_start: doc.extract_last("/pnx/addata/spage"),
        page_end: doc.extract_last("/pnx/addata/epage"),
        pages: doc.extract_last("/pnx/addata/pages"),
        publisher: doc.extract_last("/pnx/addata/pub"),
        series: doc.extract_last("/pnx/addata/seriestitle"),
        source: doc.extract_last("/pnx/display/source"),
        subject: doc.extract_first_split("/pnx/display/subject"),
        resource_type,
        volume: doc.extract_last("/pnx/addata/volume"),
        catalog_url,
        availability_status: doc.extract_last("/delivery/bestlocation/availabilityStatus"),
        call_number: doc.extract_last("/delivery/bestlocation/callNumber"),
        sublocation: doc.extract_last("/delivery/bestlocation/subLocation"),
        ext_collection: doc.extract_last("/pnx/facets/collection"),
        coverage: None,
        relation: None,
        direct_url: None,
        rights: None,
    })
}

/// Link to the record in the discovery UI.
fn deep_link(
    config: &PrimoConfig,
    display_path: &str,
    docid: &str,
    context: Option<&str>,
) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("docid", docid);
    if let Some(context) = context {
        query.append_pair("context", context);
    }
    query.append_pair("vid", &config.view_id);
    query.append_pair("lang", &config.language);

    format!("{}{display_path}?{}", config.catalog_url, query.finish())
}
