//! Catalog search adapter for the Ex Libris Primo search API.
//!
//! This crate provides:
//! - Translation of application filters into Primo `qInclude` fragments
//! - Construction and execution of a single search request
//! - Normalization of Primo documents into the record shape shared by all
//!   catalog backends
//!
//! ## Usage
//!
//! ```ignore
//! use primo_catalog::{CatalogBackend, FilterCatalog, Filters, PrimoClient, PrimoConfig};
//!
//! let client = PrimoClient::new(config, FilterCatalog::from_yaml_str(&filters_yaml)?)?;
//! let results = client.search("Proust", 10, 0, &Filters::new())?;
//! println!("{} hits", results.num_results);
//! ```

mod client;
mod config;
mod error;
pub mod filters;
pub mod normalize;
pub mod request;
mod types;

// Public exports
pub use client::{CatalogBackend, PrimoClient};
pub use config::{DEFAULT_LANGUAGE, DEFAULT_TIMEOUT_SECS, PrimoConfig};
pub use error::{PrimoClientError, SearchError, UpstreamError};
pub use filters::{FilterCatalog, FilterDefinition, FilterEntry, Filters};
pub use normalize::{NormalizedRecord, RawDocument};
pub use types::{RawSearchResponse, SearchResults};
